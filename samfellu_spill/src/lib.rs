//! Sequential spill storage for the intermediate sequences of a samfellu run.
//!
//! A [`SpillWriter`] accepts bincode encoded entries in append order, then is turned
//! into a [`SpillReader`] that replays them exactly once, in the same order.
//! The bytes live either in an anonymous temporary file (removed when the reader is
//! dropped) or in a growable memory buffer for inputs known to be small.

use std::fmt::{Debug, Formatter};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use bincode::config::standard;
use bincode::error::DecodeError;
use bincode::{decode_from_std_read, encode_into_std_write, Decode, Encode};
use samfellu_traits::{ErrorKind, SmfError, SmfResult, WriteStream};

/// Where the spilled bytes are kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpillBacking {
    /// A growable in-memory buffer.
    Memory,
    /// An anonymous temporary file, optionally created in a given directory.
    #[default]
    TempFile,
}

/// Use this builder to create a new spill stream.
pub struct SpillBuilder {
    backing: SpillBacking,
    temp_dir: Option<PathBuf>,
    buffer_size: usize,
}

impl Default for SpillBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SpillBuilder {
    pub fn new() -> Self {
        Self {
            backing: SpillBacking::TempFile,
            temp_dir: None,
            buffer_size: 64 * 1024,
        }
    }

    pub fn backing(mut self, backing: SpillBacking) -> Self {
        self.backing = backing;
        self
    }

    /// Directory for the temporary file, the system default is used otherwise.
    pub fn temp_dir(mut self, dir: &Path) -> Self {
        self.temp_dir = Some(dir.to_path_buf());
        self
    }

    /// Size of the I/O buffer between the encoder and the file.
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn build<E: Encode>(self) -> SmfResult<SpillWriter<E>> {
        let sink = match self.backing {
            SpillBacking::Memory => Sink::Memory(Vec::new()),
            SpillBacking::TempFile => {
                let file = match &self.temp_dir {
                    Some(dir) => tempfile::tempfile_in(dir),
                    None => tempfile::tempfile(),
                }
                .map_err(|e| {
                    SmfError::new_with_cause(
                        ErrorKind::Output,
                        "Unable to create a temporary spill file",
                        e,
                    )
                })?;
                Sink::File(BufWriter::with_capacity(self.buffer_size, file))
            }
        };
        Ok(SpillWriter {
            sink,
            entries: 0,
            bytes_written: 0,
            buffer_size: self.buffer_size,
            _marker: PhantomData,
        })
    }
}

enum Sink {
    Memory(Vec<u8>),
    File(BufWriter<File>),
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Memory(v) => v.write(buf),
            Sink::File(f) => f.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Memory(_) => Ok(()),
            Sink::File(f) => f.flush(),
        }
    }
}

enum Source {
    Memory(Cursor<Vec<u8>>),
    File(BufReader<File>),
}

impl Read for Source {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Source::Memory(c) => c.read(buf),
            Source::File(f) => f.read(buf),
        }
    }
}

/// Append only side of a spill stream.
pub struct SpillWriter<E> {
    sink: Sink,
    entries: u64,
    bytes_written: usize,
    buffer_size: usize,
    _marker: PhantomData<fn(&E)>,
}

impl<E> Debug for SpillWriter<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let backing = match self.sink {
            Sink::Memory(_) => "memory",
            Sink::File(_) => "tempfile",
        };
        write!(
            f,
            "SpillWriter {{ backing: {}, entries: {}, bytes_written: {} }}",
            backing, self.entries, self.bytes_written
        )
    }
}

impl<E: Encode> WriteStream<E> for SpillWriter<E> {
    fn log(&mut self, obj: &E) -> SmfResult<()> {
        let nb_bytes = encode_into_std_write(obj, &mut self.sink, standard()).map_err(|e| {
            SmfError::new_with_cause(ErrorKind::Output, "Failed to write to spill stream", e)
        })?;
        self.bytes_written += nb_bytes;
        self.entries += 1;
        Ok(())
    }

    fn flush(&mut self) -> SmfResult<()> {
        self.sink.flush().map_err(|e| {
            SmfError::new_with_cause(ErrorKind::Output, "Failed to flush spill stream", e)
        })
    }
}

impl<E> SpillWriter<E> {
    /// Number of entries appended so far.
    pub fn len(&self) -> u64 {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Closes the write side and rewinds the storage for a single sequential read.
    pub fn into_reader(self) -> SmfResult<SpillReader<E>> {
        let source = match self.sink {
            Sink::Memory(v) => Source::Memory(Cursor::new(v)),
            Sink::File(writer) => {
                let mut file = writer.into_inner().map_err(|e| {
                    SmfError::new_with_cause(
                        ErrorKind::Output,
                        "Failed to flush spill file",
                        e.into_error(),
                    )
                })?;
                file.seek(SeekFrom::Start(0)).map_err(|e| {
                    SmfError::new_with_cause(ErrorKind::Output, "Failed to rewind spill file", e)
                })?;
                Source::File(BufReader::with_capacity(self.buffer_size, file))
            }
        };
        Ok(SpillReader {
            source,
            remaining: self.entries,
            _marker: PhantomData,
        })
    }
}

/// Read side of a spill stream: a finite, single pass iterator over the entries.
pub struct SpillReader<E> {
    source: Source,
    remaining: u64,
    _marker: PhantomData<fn() -> E>,
}

impl<E> SpillReader<E> {
    /// Number of entries not read yet.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

/// True when the decoder simply ran out of bytes.
pub fn is_end_of_stream(e: &DecodeError) -> bool {
    match e {
        DecodeError::UnexpectedEnd { .. } => true,
        DecodeError::Io { inner, .. } => inner.kind() == io::ErrorKind::UnexpectedEof,
        _ => false,
    }
}

impl<E: Decode<()>> Iterator for SpillReader<E> {
    type Item = SmfResult<E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        match decode_from_std_read::<E, _, _>(&mut self.source, standard()) {
            Ok(entry) => {
                self.remaining -= 1;
                Some(Ok(entry))
            }
            Err(e) => {
                let message = if is_end_of_stream(&e) {
                    format!("Spill stream truncated, {} entries missing", self.remaining)
                } else {
                    "Failed to decode spill entry".to_string()
                };
                self.remaining = 0;
                Some(Err(SmfError::output(message).add_cause(&e.to_string())))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}
