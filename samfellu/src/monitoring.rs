//! Progress reporting hooks for the pipeline stages.

use std::fmt::{Display, Formatter};

/// The stages of a run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Parse,
    Construct,
    Draw,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Parse => write!(f, "parsing words"),
            Stage::Construct => write!(f, "constructing line"),
            Stage::Draw => write!(f, "drawing"),
        }
    }
}

/// Trait to implement a progress monitor.
///
/// Totals only ever count classified words, tokens the classifier skipped are
/// not part of any denominator.
pub trait ProgressMonitor {
    fn stage_started(&mut self, _stage: Stage) {}

    /// Called after each decoded chunk with the classified words so far.
    fn words(&mut self, _classified: u64) {}

    /// Called while the path is built, `done` out of `total` points.
    fn line_points(&mut self, _done: u64, _total: u64) {}

    /// Called while segments are stroked, `done` out of `total` points.
    fn drawn_points(&mut self, _done: u64, _total: u64) {}

    fn stage_finished(&mut self, _stage: Stage) {}
}

/// A do nothing monitor if no monitor is provided.
#[derive(Debug, Default)]
pub struct NoMonitor {}

impl ProgressMonitor for NoMonitor {}
