use crate::directions::DirectionSet;
use crate::morph::MorphAnalyzer;

/// Sorts words into the directions of a set using the top interpretation of a
/// morphological analyzer.
pub struct Classifier<'a> {
    directions: &'a DirectionSet,
    analyzer: &'a dyn MorphAnalyzer,
}

impl<'a> Classifier<'a> {
    pub fn new(directions: &'a DirectionSet, analyzer: &'a dyn MorphAnalyzer) -> Self {
        Classifier {
            directions,
            analyzer,
        }
    }

    /// Index of the first direction whose grammemes intersect the word's best tag.
    /// `None` when the word does not belong to any direction.
    pub fn classify(&self, word: &str) -> Option<usize> {
        let best = self.analyzer.best(word)?;
        self.directions.find(&best.tag)
    }

    pub fn directions(&self) -> &DirectionSet {
        self.directions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directions::{Direction, DirectionChoice};
    use crate::morph::{DictionaryAnalyzer, SuffixAnalyzer};

    #[test]
    fn test_builtin_four_directions() {
        let set = DirectionChoice::Four.direction_set();
        let analyzer = SuffixAnalyzer::new();
        let c = Classifier::new(&set, &analyzer);
        assert_eq!(c.classify("кот"), Some(0));
        assert_eq!(c.classify("она"), Some(0));
        assert_eq!(c.classify("бежит"), Some(1));
        assert_eq!(c.classify("быстро"), Some(2));
        assert_eq!(c.classify("в"), Some(3));
        assert_eq!(c.classify("42"), None);
        assert_eq!(c.classify("hello"), None);
    }

    #[test]
    fn test_only_top_interpretation_counts() {
        let set = DirectionChoice::ThreeLess.direction_set();
        let analyzer = DictionaryAnalyzer::from_entries(
            [("стали", "VERB,perf"), ("стали", "NOUN,femn")],
            Box::new(SuffixAnalyzer::new()),
        );
        let c = Classifier::new(&set, &analyzer);
        assert_eq!(c.classify("стали"), Some(1));
    }

    #[test]
    fn test_overlapping_sets_pick_first_entry() {
        let set = DirectionSet::new(vec![
            Direction::new("adverbs", &["ADVB", "COMP"]),
            Direction::new("modifiers", &["ADJF", "ADVB"]),
        ])
        .unwrap();
        let analyzer = DictionaryAnalyzer::from_entries(
            [("быстро", "ADVB"), ("быстрый", "ADJF,masc")],
            Box::new(SuffixAnalyzer::new()),
        );
        let c = Classifier::new(&set, &analyzer);
        assert_eq!(c.classify("быстро"), Some(0));
        assert_eq!(c.classify("быстрый"), Some(1));
        assert_eq!(c.classify("кот"), None);
    }
}
