#![doc = include_str!("../README.md")]

pub mod accumulator;
pub mod classifier;
pub mod color;
pub mod config;
pub mod directions;
pub mod input;
pub mod monitoring;
pub mod morph;
pub mod normalization;
pub mod path;
pub mod render;
pub mod runtime;
pub mod tokenizer;
pub mod viewport;

pub use config::read_configuration;
pub use samfellu_traits::*;

pub mod prelude {
    pub use crate::accumulator::*;
    pub use crate::classifier::*;
    pub use crate::color::*;
    pub use crate::config::*;
    pub use crate::directions::*;
    pub use crate::input::*;
    pub use crate::monitoring::*;
    pub use crate::morph::*;
    pub use crate::normalization::*;
    pub use crate::path::*;
    pub use crate::render::*;
    pub use crate::runtime::*;
    pub use crate::tokenizer::*;
    pub use crate::viewport::*;
    pub use samfellu_spill::*;
    pub use samfellu_traits::*;
}
