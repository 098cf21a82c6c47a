//! Text sources and their decoding into bounded chunks.

use encoding_rs::{Decoder, DecoderResult, EncoderResult, Encoding, UTF_8};
use log::debug;
use samfellu_traits::{ErrorKind, SmfError, SmfResult};
use std::fmt::{Debug, Formatter};
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;

/// Where the text comes from.
pub enum TextSource {
    /// A file decoded with the configured encoding.
    File(PathBuf),
    /// Any byte stream (stdin for instance), decoded with the configured encoding.
    Stream(Box<dyn Read>),
    /// Already decoded text, the configured encoding is ignored.
    Text(String),
}

impl Debug for TextSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TextSource::File(path) => write!(f, "File({})", path.display()),
            TextSource::Stream(_) => write!(f, "Stream"),
            TextSource::Text(text) => write!(f, "Text({} bytes)", text.len()),
        }
    }
}

impl From<&str> for TextSource {
    fn from(text: &str) -> Self {
        TextSource::Text(text.to_string())
    }
}

/// Resolves an encoding label (`utf-8`, `cp1251`, `koi8-r`...).
pub fn resolve_encoding(label: &str) -> SmfResult<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| SmfError::configuration(format!("Unknown encoding \"{}\"", label)))
}

impl TextSource {
    /// Opens the source. Fails on unknown encodings and unreadable files before
    /// any text is decoded.
    pub fn open(self, encoding_label: &str, chunk_size: usize) -> SmfResult<TextChunks> {
        if chunk_size == 0 {
            return Err("text_chunk_size must be at least 1.".into());
        }
        let encoding = resolve_encoding(encoding_label)?;
        let (reader, encoding): (Box<dyn Read>, &'static Encoding) = match self {
            TextSource::File(path) => {
                let file = File::open(&path).map_err(|e| {
                    SmfError::new_with_cause(
                        ErrorKind::Input,
                        &format!("Unable to open \"{}\"", path.display()),
                        e,
                    )
                })?;
                (Box::new(file), encoding)
            }
            TextSource::Stream(reader) => (reader, encoding),
            TextSource::Text(text) => (Box::new(Cursor::new(text.into_bytes())), UTF_8),
        };
        debug!("Decoding input as {} in chunks of {} bytes", encoding.name(), chunk_size);
        Ok(TextChunks {
            reader,
            decoder: encoding.new_decoder_with_bom_removal(),
            encoding,
            block: vec![0; chunk_size],
            position: 0,
            finished: false,
        })
    }
}

/// Iterator over decoded chunks of about `chunk_size` bytes of input.
///
/// Characters cut between two reads are carried over by the decoder, only words
/// can be split at chunk boundaries.
pub struct TextChunks {
    reader: Box<dyn Read>,
    decoder: Decoder,
    encoding: &'static Encoding,
    block: Vec<u8>,
    position: u64,
    finished: bool,
}

impl Debug for TextChunks {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextChunks")
            .field("encoding", &self.encoding.name())
            .field("position", &self.position)
            .field("finished", &self.finished)
            .finish()
    }
}

impl TextChunks {
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Bytes consumed from the source so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    fn read_block(&mut self) -> io::Result<usize> {
        loop {
            match self.reader.read(&mut self.block) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }
}

fn decode_block(
    decoder: &mut Decoder,
    encoding: &'static Encoding,
    mut input: &[u8],
    last: bool,
    position: u64,
) -> SmfResult<String> {
    let capacity = decoder
        .max_utf8_buffer_length_without_replacement(input.len())
        .unwrap_or(input.len() * 3 + 16);
    let mut out = String::with_capacity(capacity);
    loop {
        let (result, read) = decoder.decode_to_string_without_replacement(input, &mut out, last);
        input = &input[read..];
        match result {
            DecoderResult::InputEmpty => return Ok(out),
            DecoderResult::OutputFull => out.reserve(input.len() * 3 + 16),
            DecoderResult::Malformed(_, _) => {
                return Err(SmfError::input(format!(
                    "Malformed {} input near byte {}",
                    encoding.name(),
                    position
                )))
            }
        }
    }
}

impl Iterator for TextChunks {
    type Item = SmfResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let nb_read = match self.read_block() {
                Ok(n) => n,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(SmfError::new_with_cause(
                        ErrorKind::Input,
                        "Failed to read input",
                        e,
                    )));
                }
            };
            let last = nb_read == 0;
            let decoded = decode_block(
                &mut self.decoder,
                self.encoding,
                &self.block[..nb_read],
                last,
                self.position,
            );
            self.position += nb_read as u64;
            match decoded {
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                Ok(text) => {
                    self.finished = last;
                    if !text.is_empty() {
                        return Some(Ok(text));
                    }
                }
            }
        }
        None
    }
}

/// Encodes text into a declared encoding, failing on unmappable characters.
pub fn encode_text(text: &str, encoding_label: &str) -> SmfResult<Vec<u8>> {
    let encoding = resolve_encoding(encoding_label)?;
    let mut encoder = encoding.new_encoder();
    let mut out = Vec::with_capacity(text.len());
    let mut input = text;
    loop {
        out.reserve(
            encoder
                .max_buffer_length_from_utf8_without_replacement(input.len())
                .unwrap_or(input.len() * 4 + 16),
        );
        let (result, read) = encoder.encode_from_utf8_to_vec_without_replacement(input, &mut out, true);
        input = &input[read..];
        match result {
            EncoderResult::InputEmpty => return Ok(out),
            EncoderResult::OutputFull => continue,
            EncoderResult::Unmappable(c) => {
                return Err(SmfError::input(format!(
                    "Character '{}' cannot be encoded as {}",
                    c,
                    encoding.name()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn collect(chunks: TextChunks) -> SmfResult<Vec<String>> {
        chunks.collect()
    }

    #[test]
    fn test_text_source_is_chunked() {
        let source = TextSource::from("кот бежит быстро");
        let chunks = collect(source.open("utf-8", 5).unwrap()).unwrap();
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), "кот бежит быстро");
    }

    #[test]
    fn test_multibyte_split_across_reads() {
        // 7 byte blocks cut the two-byte Cyrillic letters in half.
        let bytes = "абвгдежз".as_bytes().to_vec();
        let source = TextSource::Stream(Box::new(Cursor::new(bytes)));
        let chunks = collect(source.open("utf-8", 7).unwrap()).unwrap();
        assert_eq!(chunks.concat(), "абвгдежз");
    }

    #[test]
    fn test_declared_encoding() {
        let bytes = encode_text("Съешь же ещё этих булок", "windows-1251").unwrap();
        assert_eq!(bytes.len(), "Съешь же ещё этих булок".chars().count());
        let source = TextSource::Stream(Box::new(Cursor::new(bytes)));
        let chunks = collect(source.open("cp1251", 4096).unwrap()).unwrap();
        assert_eq!(chunks.concat(), "Съешь же ещё этих булок");
    }

    #[test]
    fn test_file_source_and_bom() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\xEF\xBB\xBFhello").unwrap();
        let source = TextSource::File(file.path().to_path_buf());
        let opened = source.open("utf-8", 4096).unwrap();
        assert!(format!("{:?}", opened).contains("UTF-8"));
        let chunks = collect(opened).unwrap();
        assert_eq!(chunks.concat(), "hello");
    }

    #[test]
    fn test_errors() {
        let err = TextSource::from("x").open("klingon", 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = TextSource::File(PathBuf::from("/nonexistent/samfellu.txt"))
            .open("utf-8", 10)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);

        let source = TextSource::Stream(Box::new(Cursor::new(vec![b'o', b'k', 0xFF, 0xFE])));
        let result = collect(source.open("utf-8", 10).unwrap());
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Input);
    }
}
