//! Direction sets: the ordered grammatical buckets a word can be sorted into.
//! The index of a direction in its set fixes its drawing angle (`360 * index / N`),
//! so a set is immutable once built.

use crate::morph::Tag;
use compact_str::CompactString;
use samfellu_traits::{SmfError, SmfResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Upper bound on the number of directions, an index is spilled as one byte.
pub const MAX_DIRECTIONS: usize = u8::MAX as usize;

/// One bucket: a legend label and the grammemes that select it, in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Direction {
    pub label: CompactString,
    pub tags: Vec<CompactString>,
}

impl Direction {
    pub fn new(label: &str, tags: &[&str]) -> Self {
        Direction {
            label: label.into(),
            tags: tags.iter().map(|t| CompactString::from(*t)).collect(),
        }
    }

    /// True if any of the grammemes of this direction is in the tag.
    pub fn matches(&self, tag: &Tag) -> bool {
        self.tags.iter().any(|t| tag.contains(t))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionSet {
    directions: Vec<Direction>,
}

impl DirectionSet {
    pub fn new(directions: Vec<Direction>) -> SmfResult<Self> {
        if directions.is_empty() {
            return Err("A direction set needs at least one direction.".into());
        }
        if directions.len() > MAX_DIRECTIONS {
            return Err(format!(
                "Too many directions: {} (maximum is {}).",
                directions.len(),
                MAX_DIRECTIONS
            )
            .into());
        }
        if let Some(d) = directions.iter().find(|d| d.tags.is_empty()) {
            return Err(SmfError::configuration(format!(
                "Direction \"{}\" has no grammemes.",
                d.label
            )));
        }
        Ok(DirectionSet { directions })
    }

    pub fn len(&self) -> usize {
        self.directions.len()
    }

    /// Never true for a constructed set, kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Direction> {
        self.directions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Direction> {
        self.directions.iter()
    }

    /// Drawing angle of a direction in degrees.
    pub fn angle(&self, index: usize) -> f64 {
        360.0 * index as f64 / self.directions.len() as f64
    }

    /// Index of the first direction matching the tag, scanning in set order.
    pub fn find(&self, tag: &Tag) -> Option<usize> {
        self.directions.iter().position(|d| d.matches(tag))
    }
}

/// The built-in direction sets, spelled by their key (`"4"`, `"3less"`...) in
/// configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DirectionChoice {
    Six,
    Five,
    #[default]
    Four,
    FourLess,
    Three,
    ThreeLess,
}

const NOUNS: &str = "Существительные";
const NOUNS_PRONOUNS: &str = "Существительные и местоимения";
const VERBS_GERUNDS: &str = "Глаголы и деепричастия";
const VERBS: &str = "Глаголы";
const ADJECTIVES: &str = "Прилагательные";
const ADJECTIVES_PARTICIPLES: &str = "Прилагательные и причастия";
const ADJECTIVES_PARTICIPLES_ADVERBS: &str = "Прилагательные, причастия и наречия";
const ADVERBS: &str = "Наречия";
const FUNCTION_WORDS: &str = "Союзы, предлоги и частицы";
const FUNCTION_WORDS_OTHER: &str = "Союзы, предлоги и пр.";
const PRONOUNS: &str = "Местоимения";

impl DirectionChoice {
    pub const ALL: [DirectionChoice; 6] = [
        DirectionChoice::Six,
        DirectionChoice::Five,
        DirectionChoice::Four,
        DirectionChoice::FourLess,
        DirectionChoice::Three,
        DirectionChoice::ThreeLess,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            DirectionChoice::Six => "6",
            DirectionChoice::Five => "5",
            DirectionChoice::Four => "4",
            DirectionChoice::FourLess => "4less",
            DirectionChoice::Three => "3",
            DirectionChoice::ThreeLess => "3less",
        }
    }

    pub fn directions(&self) -> Vec<Direction> {
        match self {
            DirectionChoice::Six => vec![
                Direction::new(NOUNS, &["NOUN"]),
                Direction::new(VERBS_GERUNDS, &["VERB", "INFN", "GRND"]),
                Direction::new(ADJECTIVES_PARTICIPLES, &["ADJF", "ADJS", "PRTF", "PRTS"]),
                Direction::new(ADVERBS, &["ADVB", "COMP"]),
                Direction::new(FUNCTION_WORDS, &["PREP", "CONJ", "PRCL"]),
                Direction::new(PRONOUNS, &["NPRO"]),
            ],
            DirectionChoice::Five => vec![
                Direction::new(NOUNS, &["NOUN"]),
                Direction::new(VERBS_GERUNDS, &["VERB", "INFN", "GRND"]),
                Direction::new(
                    ADJECTIVES_PARTICIPLES_ADVERBS,
                    &["ADJF", "ADJS", "PRTF", "PRTS", "ADVB", "COMP"],
                ),
                Direction::new(
                    FUNCTION_WORDS_OTHER,
                    &["PRED", "PREP", "CONJ", "PRCL", "INTJ"],
                ),
                Direction::new(PRONOUNS, &["NPRO"]),
            ],
            DirectionChoice::Four => vec![
                Direction::new(NOUNS_PRONOUNS, &["NOUN", "NPRO"]),
                Direction::new(VERBS_GERUNDS, &["VERB", "INFN", "GRND"]),
                Direction::new(
                    ADJECTIVES_PARTICIPLES_ADVERBS,
                    &["ADJF", "ADJS", "PRTF", "PRTS", "ADVB", "COMP"],
                ),
                Direction::new(
                    FUNCTION_WORDS_OTHER,
                    &["PRED", "PREP", "CONJ", "PRCL", "INTJ"],
                ),
            ],
            DirectionChoice::FourLess => vec![
                Direction::new(NOUNS, &["NOUN"]),
                Direction::new(VERBS, &["VERB", "INFN"]),
                Direction::new(ADJECTIVES, &["ADJF", "ADJS"]),
                Direction::new(FUNCTION_WORDS, &["PREP", "CONJ", "PRCL"]),
            ],
            DirectionChoice::Three => vec![
                Direction::new(NOUNS_PRONOUNS, &["NOUN", "NPRO"]),
                Direction::new(VERBS_GERUNDS, &["VERB", "INFN", "GRND"]),
                Direction::new(
                    ADJECTIVES_PARTICIPLES_ADVERBS,
                    &["ADJF", "ADJS", "PRTF", "PRTS", "ADVB", "COMP"],
                ),
            ],
            DirectionChoice::ThreeLess => vec![
                Direction::new(NOUNS, &["NOUN"]),
                Direction::new(VERBS, &["VERB", "INFN"]),
                Direction::new(ADJECTIVES, &["ADJF", "ADJS"]),
            ],
        }
    }

    pub fn direction_set(&self) -> DirectionSet {
        DirectionSet {
            directions: self.directions(),
        }
    }
}

impl Display for DirectionChoice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for DirectionChoice {
    type Err = SmfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DirectionChoice::ALL
            .iter()
            .find(|c| c.key() == s)
            .copied()
            .ok_or_else(|| SmfError::configuration(format!("Unknown direction set \"{}\"", s)))
    }
}

impl TryFrom<String> for DirectionChoice {
    type Error = SmfError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DirectionChoice> for String {
    fn from(choice: DirectionChoice) -> Self {
        choice.key().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sets_are_valid() {
        for choice in DirectionChoice::ALL {
            let set = DirectionSet::new(choice.directions()).unwrap();
            assert_eq!(set, choice.direction_set());
            assert_eq!(choice.key().parse::<DirectionChoice>().unwrap(), choice);
        }
        assert_eq!(DirectionChoice::Six.direction_set().len(), 6);
        assert_eq!(DirectionChoice::FourLess.direction_set().len(), 4);
        assert_eq!(DirectionChoice::ThreeLess.direction_set().len(), 3);
    }

    #[test]
    fn test_unknown_choice() {
        assert!("7".parse::<DirectionChoice>().is_err());
    }

    #[test]
    fn test_angles() {
        let set = DirectionChoice::Three.direction_set();
        assert_eq!(set.angle(0), 0.0);
        assert!((set.angle(1) - 120.0).abs() < 1e-12);
        assert!((set.angle(2) - 240.0).abs() < 1e-12);
    }

    #[test]
    fn test_first_matching_direction_wins() {
        let set = DirectionSet::new(vec![
            Direction::new("adverbs", &["ADVB"]),
            Direction::new("adjectives and adverbs", &["ADJF", "ADVB"]),
        ])
        .unwrap();
        assert_eq!(set.find(&Tag::from_grammemes(&["ADVB"])), Some(0));
        assert_eq!(set.find(&Tag::from_grammemes(&["ADJF", "masc"])), Some(1));
        assert_eq!(set.find(&Tag::from_grammemes(&["NOUN"])), None);
    }

    #[test]
    fn test_invalid_sets() {
        assert!(DirectionSet::new(vec![]).is_err());
        assert!(DirectionSet::new(vec![Direction::new("empty", &[])]).is_err());
        let too_many = (0..256).map(|_| Direction::new("n", &["NOUN"])).collect();
        assert!(DirectionSet::new(too_many).is_err());
    }
}
