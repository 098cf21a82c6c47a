//! Direction accumulation: the first pass over the text.
//!
//! The accumulator starts idle, moves to accumulating on the first token and is
//! finalized by [`DirectionAccumulator::finalize`], which consumes it. The finalized
//! [`AccumulatedDirections`] is read-only, so nothing can be appended afterwards.

use crate::classifier::Classifier;
use samfellu_spill::{SpillBuilder, SpillReader, SpillWriter};
use samfellu_traits::{SmfResult, WriteStream};
use std::fmt::{Display, Formatter};

/// Occurrences per direction index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionCounter {
    counts: Vec<u64>,
}

impl DirectionCounter {
    pub fn new(nb_directions: usize) -> Self {
        DirectionCounter {
            counts: vec![0; nb_directions],
        }
    }

    pub fn from_counts(counts: Vec<u64>) -> Self {
        DirectionCounter { counts }
    }

    fn increment(&mut self, direction: usize) {
        self.counts[direction] += 1;
    }

    /// Count for a direction, 0 for indices outside the set.
    pub fn get(&self, direction: usize) -> u64 {
        self.counts.get(direction).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.counts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorState {
    Idle,
    Accumulating,
}

impl Display for AccumulatorState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AccumulatorState::Idle => write!(f, "idle"),
            AccumulatorState::Accumulating => write!(f, "accumulating"),
        }
    }
}

pub struct DirectionAccumulator<'a> {
    classifier: Classifier<'a>,
    sequence: SpillWriter<u8>,
    counter: DirectionCounter,
    total_words: u64,
    state: AccumulatorState,
}

/// Result of a finished accumulation.
pub struct AccumulatedDirections {
    /// Direction indices in document order, readable once.
    pub sequence: SpillReader<u8>,
    pub counter: DirectionCounter,
    pub total_words: u64,
}

impl<'a> DirectionAccumulator<'a> {
    pub fn new(classifier: Classifier<'a>, spill: SpillBuilder) -> SmfResult<Self> {
        let nb_directions = classifier.directions().len();
        Ok(DirectionAccumulator {
            classifier,
            sequence: spill.build()?,
            counter: DirectionCounter::new(nb_directions),
            total_words: 0,
            state: AccumulatorState::Idle,
        })
    }

    pub fn state(&self) -> AccumulatorState {
        self.state
    }

    /// Classifies one token. Unclassified tokens are skipped and return `None`.
    pub fn push(&mut self, token: &str) -> SmfResult<Option<usize>> {
        self.state = AccumulatorState::Accumulating;
        let Some(direction) = self.classifier.classify(token) else {
            return Ok(None);
        };
        self.sequence.log(&(direction as u8))?;
        self.counter.increment(direction);
        self.total_words += 1;
        Ok(Some(direction))
    }

    /// Pushes every token of a chunk, returns the number of classified ones.
    pub fn push_all<'t>(&mut self, tokens: impl IntoIterator<Item = &'t str>) -> SmfResult<u64> {
        let before = self.total_words;
        for token in tokens {
            self.push(token)?;
        }
        Ok(self.total_words - before)
    }

    /// Classified words so far.
    pub fn total_words(&self) -> u64 {
        self.total_words
    }

    pub fn finalize(mut self) -> SmfResult<AccumulatedDirections> {
        self.sequence.flush()?;
        Ok(AccumulatedDirections {
            sequence: self.sequence.into_reader()?,
            counter: self.counter,
            total_words: self.total_words,
        })
    }
}

/// Runs a whole token stream through a fresh accumulator.
pub fn accumulate<'t>(
    classifier: Classifier<'_>,
    tokens: impl IntoIterator<Item = &'t str>,
    spill: SpillBuilder,
) -> SmfResult<AccumulatedDirections> {
    let mut accumulator = DirectionAccumulator::new(classifier, spill)?;
    accumulator.push_all(tokens)?;
    accumulator.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directions::DirectionChoice;
    use crate::morph::SuffixAnalyzer;
    use crate::tokenizer::Tokenizer;
    use samfellu_spill::SpillBacking;

    #[test]
    fn test_counts_and_sequence() {
        let set = DirectionChoice::Four.direction_set();
        let analyzer = SuffixAnalyzer::new();
        let tokenizer = Tokenizer::new(50).unwrap();
        let text = "Кот бежит быстро, и 42 hello собака лает.";

        let result = accumulate(
            Classifier::new(&set, &analyzer),
            tokenizer.tokenize(text),
            SpillBuilder::new().backing(SpillBacking::Memory),
        )
        .unwrap();

        assert_eq!(result.total_words, 6);
        assert_eq!(result.counter.as_slice(), &[2, 2, 1, 1]);
        assert_eq!(result.counter.total(), result.total_words);
        let sequence: Vec<u8> = result.sequence.map(|d| d.unwrap()).collect();
        assert_eq!(sequence, vec![0, 1, 2, 3, 0, 1]);
        assert!(sequence.iter().all(|d| (*d as usize) < set.len()));
    }

    #[test]
    fn test_state_transitions() {
        let set = DirectionChoice::Three.direction_set();
        let analyzer = SuffixAnalyzer::new();
        let mut acc =
            DirectionAccumulator::new(Classifier::new(&set, &analyzer), SpillBuilder::new())
                .unwrap();
        assert_eq!(acc.state(), AccumulatorState::Idle);
        assert_eq!(acc.push("2024").unwrap(), None);
        assert_eq!(acc.state(), AccumulatorState::Accumulating);
        assert_eq!(acc.push("кот").unwrap(), Some(0));
        assert_eq!(acc.push_all(["в", "лес"]).unwrap(), 1);
        assert_eq!(acc.total_words(), 2);

        let done = acc.finalize().unwrap();
        assert_eq!(done.total_words, 2);
        assert_eq!(done.counter.get(0), 2);
        assert_eq!(done.counter.get(7), 0);
        assert_eq!(done.sequence.remaining(), 2);
    }
}
