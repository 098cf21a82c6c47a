//! Morphological analysis capability.
//!
//! The pipeline only needs the grammemes of the most probable interpretation of a word.
//! [`MorphAnalyzer`] is the seam analyzers plug into:
//! - `OpenCorporaAnalyzer` (feature `opencorpora`, on by default): the OpenCorpora
//!   Russian dictionary through `rsmorphy`, with probability ranked parses and
//!   predictions for unknown words. This is what [`default_analyzer`] returns.
//! - [`SuffixAnalyzer`]: closed word classes plus ending rules. It needs no data files
//!   and always returns at least one parse, so it backs the others up.
//! - [`DictionaryAnalyzer`]: a tab separated lexicon with a fallback analyzer for
//!   words it does not know.

use compact_str::CompactString;
use log::debug;
use samfellu_traits::{ErrorKind, SmfError, SmfResult};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// The grammemes of one interpretation, part of speech first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tag {
    grammemes: SmallVec<[CompactString; 4]>,
}

impl Tag {
    pub fn from_grammemes(grammemes: &[&str]) -> Self {
        Tag {
            grammemes: grammemes.iter().map(|g| CompactString::from(*g)).collect(),
        }
    }

    /// Parses the OpenCorpora notation: `NOUN,anim,masc sing,nomn`.
    pub fn parse(text: &str) -> Self {
        Tag {
            grammemes: text
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|g| !g.is_empty())
                .map(CompactString::from)
                .collect(),
        }
    }

    pub fn contains(&self, grammeme: &str) -> bool {
        self.grammemes.iter().any(|g| g == grammeme)
    }

    pub fn pos(&self) -> Option<&str> {
        self.grammemes.first().map(|g| g.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.grammemes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.grammemes.iter().map(|g| g.as_str())
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for g in self.grammemes.iter() {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{}", g)?;
            first = false;
        }
        Ok(())
    }
}

/// One interpretation of a word.
#[derive(Debug, Clone, PartialEq)]
pub struct Parse {
    pub tag: Tag,
    pub score: f32,
}

impl Parse {
    pub fn new(tag: Tag, score: f32) -> Self {
        Parse { tag, score }
    }
}

/// Given a word, returns its interpretations ranked from the most to the least probable.
pub trait MorphAnalyzer {
    fn parse(&self, word: &str) -> Vec<Parse>;

    /// The top ranked interpretation.
    fn best(&self, word: &str) -> Option<Parse> {
        self.parse(word).into_iter().next()
    }
}

impl<A: MorphAnalyzer + ?Sized> MorphAnalyzer for Box<A> {
    fn parse(&self, word: &str) -> Vec<Parse> {
        (**self).parse(word)
    }
}

/// Lower case with `ё` folded into `е`, the key form used by the analyzers.
pub fn normalize_word(word: &str) -> String {
    word.to_lowercase().replace('ё', "е")
}

fn is_cyrillic(c: char) -> bool {
    matches!(c, '\u{0400}'..='\u{04FF}')
}

const PREPOSITIONS: &[&str] = &[
    "в", "во", "на", "с", "со", "к", "ко", "по", "за", "из", "изо", "от", "ото", "до", "о", "об",
    "обо", "у", "при", "про", "для", "без", "безо", "над", "надо", "под", "подо", "перед",
    "передо", "через", "между", "после", "около", "вокруг", "среди", "сквозь", "ради", "возле",
    "вдоль", "кроме", "мимо", "против", "вместо", "из-за", "из-под", "насчет", "внутри",
];

const CONJUNCTIONS: &[&str] = &[
    "и", "а", "но", "или", "да", "что", "чтобы", "если", "когда", "хотя", "либо", "ни", "зато",
    "однако", "потому", "поэтому", "также", "будто", "словно", "ибо", "причем", "пока", "раз",
    "как", "чем", "тоже", "иначе",
];

const PARTICLES: &[&str] = &[
    "не", "ли", "же", "ж", "бы", "б", "вот", "вон", "лишь", "только", "даже", "ведь", "разве",
    "неужели", "пусть", "пускай", "именно", "ль", "ка", "нет", "ну", "уж", "вовсе", "неужто",
];

const INTERJECTIONS: &[&str] = &[
    "ах", "ох", "эх", "ой", "увы", "ура", "эй", "ага", "ого", "ух", "ай", "тсс", "браво",
];

const PRONOUNS: &[&str] = &[
    "я", "ты", "он", "она", "оно", "мы", "вы", "они", "меня", "тебя", "его", "ее", "нас", "вас",
    "их", "мне", "тебе", "ему", "ей", "нам", "вам", "им", "мной", "мною", "тобой", "тобою", "ним",
    "ней", "ними", "нем", "него", "нее", "нему", "нею", "себя", "себе", "собой", "собою", "кто",
    "никто", "ничто", "кого", "чего", "кому", "чему", "кем", "ком", "нечто", "некто", "ничего",
    "никого", "никому", "ничему", "нечего", "некого",
];

const PREDICATIVES: &[&str] = &[
    "можно", "нельзя", "надо", "нужно", "пора", "жаль", "некогда", "лень", "видно", "слышно",
];

const ADVERBS: &[&str] = &[
    "очень", "тут", "там", "здесь", "где", "куда", "откуда", "всегда", "никогда", "уже", "еще",
    "теперь", "сейчас", "потом", "тогда", "так", "почти", "совсем", "вдруг", "снова", "опять",
    "туда", "сюда", "оттуда", "везде", "иногда", "давно", "зачем", "почему", "вновь", "вместе",
    "вперед", "назад", "домой", "утром", "вечером", "ночью", "днем", "сразу", "весьма",
];

const COMPARATIVES: &[&str] = &[
    "больше", "меньше", "лучше", "хуже", "раньше", "позже", "дальше", "ближе", "выше", "ниже",
    "дольше", "чаще", "реже", "легче", "проще", "сильнее", "быстрее", "медленнее",
];

const ADJECTIVES: &[&str] = &[
    "большой", "молодой", "другой", "какой", "такой", "никакой", "простой", "плохой", "родной",
    "живой", "злой", "густой", "пустой", "золотой", "весь", "вся", "все", "свой", "свою",
    "свои", "мой", "моя", "мое", "мои", "твой", "твоя", "наш", "ваш", "этот", "эта", "эти",
    "тот", "та", "те", "каждый", "сам", "сама", "самый",
];

/// Endings checked in order, the first hit wins. Noun derivation suffixes come first
/// so that `-ние` nouns are not read as plural adjectives.
const NOUN_ENDINGS: &[&str] = &[
    "ость", "ости", "ство", "ства", "ние", "ния", "нию", "нием", "тие", "тия", "ция",
    "ции", "цию", "изм", "тель", "теля", "телю", "ник", "ника", "щик", "чик", "ист",
];

const PARTICIPLE_STEMS: &[&str] = &["ющ", "ащ", "ящ", "ущ", "вш", "емы", "имы"];

const ADJECTIVE_ENDINGS: &[&str] = &[
    "ого", "его", "ому", "ему", "ый", "ий", "ая", "яя", "ое", "ее", "ые", "ие", "ых", "их",
    "ую", "юю", "ым", "ыми", "ими",
];

const INFINITIVE_ENDINGS: &[&str] = &["ться", "тись", "ть", "ти", "чь"];

const GERUND_ENDINGS: &[&str] = &["вшись", "ясь", "учи", "ючи"];

const VERB_ENDINGS: &[&str] = &[
    "ется", "ится", "ются", "ятся", "утся", "атся", "лся", "лась", "лось", "лись", "ешь",
    "ишь", "ете", "ите", "ет", "ит", "ут", "ют", "ат", "ят", "ал", "ала", "ало", "али", "ил",
    "ила", "ило", "или", "ел", "ела", "ело", "ели", "ял", "яла", "яло", "яли", "ул", "ула",
    "ули",
];

/// Built-in Russian analyzer.
///
/// Closed word classes are looked up in fixed lists, open classes are guessed from
/// their endings. Words it cannot guess are read as nouns, digits as `NUMB`, Latin
/// words as `LATN` and anything else as `UNKN`.
pub struct SuffixAnalyzer {
    closed: HashMap<&'static str, &'static str>,
}

impl Default for SuffixAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SuffixAnalyzer {
    pub fn new() -> Self {
        let mut closed = HashMap::new();
        // Later tables do not override earlier ones: "что" stays a conjunction.
        let tables: [(&[&str], &str); 9] = [
            (PREPOSITIONS, "PREP"),
            (CONJUNCTIONS, "CONJ"),
            (PARTICLES, "PRCL"),
            (INTERJECTIONS, "INTJ"),
            (PRONOUNS, "NPRO"),
            (PREDICATIVES, "PRED"),
            (COMPARATIVES, "COMP"),
            (ADVERBS, "ADVB"),
            (ADJECTIVES, "ADJF"),
        ];
        for (words, pos) in tables {
            for w in words {
                closed.entry(*w).or_insert(pos);
            }
        }
        SuffixAnalyzer { closed }
    }

    fn guess(word: &str) -> Option<&'static str> {
        let ends = |endings: &[&str]| endings.iter().any(|e| word.ends_with(e));
        let nb_chars = word.chars().count();

        if ends(NOUN_ENDINGS) {
            return Some("NOUN");
        }
        if nb_chars > 3 {
            if let Some(ending) = ADJECTIVE_ENDINGS.iter().find(|e| word.ends_with(*e)) {
                let stem = &word[..word.len() - ending.len()];
                if PARTICIPLE_STEMS.iter().any(|s| stem.ends_with(s)) {
                    return Some("PRTF");
                }
                return Some("ADJF");
            }
        }
        if ends(GERUND_ENDINGS) && nb_chars > 4 {
            return Some("GRND");
        }
        if ends(INFINITIVE_ENDINGS) && nb_chars > 3 {
            return Some("INFN");
        }
        if ends(VERB_ENDINGS) && nb_chars > 3 {
            return Some("VERB");
        }
        if word.ends_with("ски") || (word.ends_with('о') && nb_chars > 4) {
            return Some("ADVB");
        }
        None
    }
}

impl MorphAnalyzer for SuffixAnalyzer {
    fn parse(&self, word: &str) -> Vec<Parse> {
        let word = normalize_word(word);
        if word.is_empty() {
            return vec![Parse::new(Tag::from_grammemes(&["UNKN"]), 1.0)];
        }
        if word.chars().all(|c| c.is_numeric()) {
            return vec![Parse::new(Tag::from_grammemes(&["NUMB", "intg"]), 1.0)];
        }
        if word.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return vec![Parse::new(Tag::from_grammemes(&["LATN"]), 1.0)];
        }
        if !word.chars().all(|c| is_cyrillic(c) || c == '-') {
            return vec![Parse::new(Tag::from_grammemes(&["UNKN"]), 1.0)];
        }
        if let Some(pos) = self.closed.get(word.as_str()) {
            return vec![Parse::new(Tag::from_grammemes(&[*pos]), 1.0)];
        }
        match SuffixAnalyzer::guess(&word) {
            Some("NOUN") | None => vec![Parse::new(Tag::from_grammemes(&["NOUN"]), 0.5)],
            Some(pos) => vec![
                Parse::new(Tag::from_grammemes(&[pos]), 0.5),
                Parse::new(Tag::from_grammemes(&["NOUN"]), 0.25),
            ],
        }
    }
}

#[cfg(feature = "opencorpora")]
pub use self::opencorpora::OpenCorporaAnalyzer;

#[cfg(feature = "opencorpora")]
mod opencorpora {
    use super::{MorphAnalyzer, Parse, SuffixAnalyzer, Tag};
    use log::info;
    use rsmorphy::rsmorphy_dict_ru::DICT_PATH;
    use rsmorphy::Source;
    use samfellu_traits::{SmfError, SmfResult};
    use std::path::Path;
    use std::sync::OnceLock;

    // rsmorphy panics on missing files, check them first.
    const DICTIONARY_FILES: &[&str] = &[
        "meta.json.gz",
        "grammemes.json.gz",
        "gramtab-opencorpora-int.json.gz",
        "paradigms.array.gz",
        "suffixes.json.gz",
        "words.dawg.gz",
        "p_t_given_w.intdawg.gz",
    ];

    static DICTIONARY: OnceLock<rsmorphy::MorphAnalyzer> = OnceLock::new();

    fn dictionary() -> SmfResult<&'static rsmorphy::MorphAnalyzer> {
        if let Some(morph) = DICTIONARY.get() {
            return Ok(morph);
        }
        let dir = Path::new(DICT_PATH);
        if let Some(missing) = DICTIONARY_FILES.iter().find(|f| !dir.join(f).is_file()) {
            return Err(SmfError::input(format!(
                "OpenCorpora dictionary is incomplete: {} not found in {}",
                missing,
                dir.display()
            )));
        }
        Ok(DICTIONARY.get_or_init(|| {
            info!("Loading the OpenCorpora dictionary from {}", dir.display());
            rsmorphy::MorphAnalyzer::from_file(dir)
        }))
    }

    /// Russian analyzer backed by the OpenCorpora dictionary.
    ///
    /// The dictionary is loaded once per process and shared by every instance.
    /// Words that yield no tagged parse go to a [`SuffixAnalyzer`].
    pub struct OpenCorporaAnalyzer {
        morph: &'static rsmorphy::MorphAnalyzer,
        fallback: SuffixAnalyzer,
    }

    impl OpenCorporaAnalyzer {
        pub fn new() -> SmfResult<Self> {
            Ok(OpenCorporaAnalyzer {
                morph: dictionary()?,
                fallback: SuffixAnalyzer::new(),
            })
        }
    }

    impl MorphAnalyzer for OpenCorporaAnalyzer {
        fn parse(&self, word: &str) -> Vec<Parse> {
            let mut parses: Vec<Parse> = self
                .morph
                .parse(word)
                .iter()
                .map(|p| {
                    let tag = Tag::parse(&p.lex.get_tag(self.morph).string);
                    Parse::new(tag, p.score.value() as f32)
                })
                .filter(|p| !p.tag.is_empty())
                .collect();
            // Predicted parses come in analyzer order, ties keep it.
            parses.sort_by(|a, b| b.score.total_cmp(&a.score));
            if parses.is_empty() {
                self.fallback.parse(word)
            } else {
                parses
            }
        }
    }
}

/// The analyzer used when the caller does not bring one.
#[cfg(feature = "opencorpora")]
pub fn default_analyzer() -> SmfResult<Box<dyn MorphAnalyzer>> {
    Ok(Box::new(OpenCorporaAnalyzer::new()?))
}

/// The analyzer used when the caller does not bring one.
#[cfg(not(feature = "opencorpora"))]
pub fn default_analyzer() -> SmfResult<Box<dyn MorphAnalyzer>> {
    Ok(Box::new(SuffixAnalyzer::new()))
}

/// Lexicon backed analyzer.
///
/// Each line reads `word<TAB>GRAMMEMES[<TAB>score]`, a word may appear on several lines.
/// Empty lines and lines starting with `#` are skipped. Words are matched in their
/// normalized form (see [`normalize_word`]).
pub struct DictionaryAnalyzer {
    entries: HashMap<CompactString, Vec<Parse>>,
    fallback: Box<dyn MorphAnalyzer>,
}

impl DictionaryAnalyzer {
    /// Builds the lexicon from `(word, grammemes)` pairs, all scored 1.0.
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
        fallback: Box<dyn MorphAnalyzer>,
    ) -> Self {
        let mut analyzer = DictionaryAnalyzer {
            entries: HashMap::new(),
            fallback,
        };
        for (word, tag) in entries {
            analyzer.insert(word, Parse::new(Tag::parse(tag), 1.0));
        }
        analyzer.sort();
        analyzer
    }

    pub fn from_reader(reader: impl BufRead, fallback: Box<dyn MorphAnalyzer>) -> SmfResult<Self> {
        let mut analyzer = DictionaryAnalyzer {
            entries: HashMap::new(),
            fallback,
        };
        for (lineno, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                SmfError::new_with_cause(ErrorKind::Input, "Unable to read the dictionary", e)
            })?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split('\t');
            let (word, tag) = match (fields.next(), fields.next()) {
                (Some(w), Some(t)) if !w.is_empty() && !t.trim().is_empty() => (w, t),
                _ => {
                    return Err(SmfError::configuration(format!(
                        "Malformed dictionary line {}: \"{}\"",
                        lineno + 1,
                        line
                    )))
                }
            };
            let score = match fields.next() {
                Some(s) => s.trim().parse::<f32>().map_err(|_| {
                    SmfError::configuration(format!(
                        "Wrong score \"{}\" on dictionary line {}",
                        s,
                        lineno + 1
                    ))
                })?,
                None => 1.0,
            };
            analyzer.insert(word, Parse::new(Tag::parse(tag), score));
        }
        analyzer.sort();
        debug!("Dictionary loaded with {} words.", analyzer.len());
        Ok(analyzer)
    }

    pub fn from_path(path: &Path, fallback: Box<dyn MorphAnalyzer>) -> SmfResult<Self> {
        let file = File::open(path).map_err(|e| {
            SmfError::new_with_cause(
                ErrorKind::Input,
                &format!("Unable to open dictionary \"{}\"", path.display()),
                e,
            )
        })?;
        DictionaryAnalyzer::from_reader(BufReader::new(file), fallback)
    }

    fn insert(&mut self, word: &str, parse: Parse) {
        self.entries
            .entry(normalize_word(word).into())
            .or_default()
            .push(parse);
    }

    // Stable: equal scores keep their lexicon order.
    fn sort(&mut self) {
        for parses in self.entries.values_mut() {
            parses.sort_by(|a, b| b.score.total_cmp(&a.score));
        }
    }

    /// Number of distinct words in the lexicon.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MorphAnalyzer for DictionaryAnalyzer {
    fn parse(&self, word: &str) -> Vec<Parse> {
        match self.entries.get(normalize_word(word).as_str()) {
            Some(parses) => parses.clone(),
            None => self.fallback.parse(word),
        }
    }
}
