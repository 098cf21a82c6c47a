//! Run configuration: one explicit struct, loadable from a RON file.

use crate::color::{Gradient, PaletteChoice, Rgb};
use crate::directions::{Direction, DirectionChoice, DirectionSet};
use crate::normalization::Normalization;
use crate::viewport::check_padding;
use ron::extensions::Extensions;
use ron::Options;
use samfellu_spill::{SpillBacking, SpillBuilder};
use samfellu_traits::{SmfError, SmfResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output image size in pixels, written `WxH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ImageSize {
    fn default() -> Self {
        ImageSize {
            width: 640,
            height: 640,
        }
    }
}

impl Display for ImageSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for ImageSize {
    type Err = SmfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wrong = || SmfError::configuration(format!("Wrong image size \"{}\", use WxH", s));
        let (w, h) = s.split_once(|c: char| c == 'x' || c == 'X').ok_or_else(wrong)?;
        let width: u32 = w.trim().parse().map_err(|_| wrong())?;
        let height: u32 = h.trim().parse().map_err(|_| wrong())?;
        if width == 0 || height == 0 {
            return Err(wrong());
        }
        Ok(ImageSize { width, height })
    }
}

/// Where intermediate sequences are kept between stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpillStorage {
    Memory,
    #[default]
    TempFile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SamfelluConfig {
    /// Encoding label of the input text.
    pub encoding: String,
    /// Bytes read and decoded at once.
    pub text_chunk_size: usize,
    /// Longer words are cut into several tokens.
    pub max_word_size: usize,
    /// I/O buffer of the spilled sequences.
    pub points_chunk_size: usize,
    pub image_size: ImageSize,
    pub line_width: f64,
    /// Built-in direction set, ignored when `custom_directions` is set.
    pub directions: DirectionChoice,
    pub custom_directions: Option<Vec<Direction>>,
    pub normalization: Normalization,
    /// Built-in palette, ignored when `colors` is set.
    pub palette: PaletteChoice,
    pub colors: Option<Vec<String>>,
    /// Fraction of the image kept free on each side, in `[0, 0.5)`.
    pub padding: f64,
    /// Keep the starting point in the middle of the image.
    pub from_center: bool,
    pub draw_legend: bool,
    pub spill: SpillStorage,
    pub spill_dir: Option<PathBuf>,
}

impl Default for SamfelluConfig {
    fn default() -> Self {
        SamfelluConfig {
            encoding: "utf-8".to_string(),
            text_chunk_size: 4096,
            max_word_size: 50,
            points_chunk_size: 4096,
            image_size: ImageSize::default(),
            line_width: 1.0,
            directions: DirectionChoice::default(),
            custom_directions: None,
            normalization: Normalization::default(),
            palette: PaletteChoice::default(),
            colors: None,
            padding: 0.05,
            from_center: false,
            draw_legend: true,
            spill: SpillStorage::default(),
            spill_dir: None,
        }
    }
}

impl SamfelluConfig {
    fn get_options() -> Options {
        Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .with_default_extension(Extensions::UNWRAP_NEWTYPES)
    }

    pub fn serialize_ron(&self) -> SmfResult<String> {
        let pretty = ron::ser::PrettyConfig::default();
        Self::get_options()
            .to_string_pretty(self, pretty)
            .map_err(|e| SmfError::from("Failed to serialize configuration").add_cause(&e.to_string()))
    }

    pub fn deserialize_ron(ron: &str) -> SmfResult<Self> {
        Self::get_options()
            .from_str(ron)
            .map_err(|e| SmfError::from("Syntax error in configuration").add_cause(&e.to_string()))
    }

    /// The direction set this run sorts words into.
    pub fn direction_set(&self) -> SmfResult<DirectionSet> {
        match &self.custom_directions {
            Some(directions) => DirectionSet::new(directions.clone()),
            None => Ok(self.directions.direction_set()),
        }
    }

    pub fn gradient(&self) -> SmfResult<Gradient> {
        match &self.colors {
            Some(colors) => Gradient::new(
                colors
                    .iter()
                    .map(|c| Rgb::parse(c))
                    .collect::<SmfResult<Vec<_>>>()?,
            ),
            None => Ok(Gradient::from(self.palette)),
        }
    }

    pub fn spill_builder(&self) -> SpillBuilder {
        let backing = match self.spill {
            SpillStorage::Memory => SpillBacking::Memory,
            SpillStorage::TempFile => SpillBacking::TempFile,
        };
        let builder = SpillBuilder::new()
            .backing(backing)
            .buffer_size(self.points_chunk_size);
        match &self.spill_dir {
            Some(dir) => builder.temp_dir(dir),
            None => builder,
        }
    }

    /// Checks every option that can be checked before reading any text.
    pub fn validate(&self) -> SmfResult<()> {
        if self.text_chunk_size == 0 {
            return Err("text_chunk_size must be at least 1.".into());
        }
        if self.max_word_size == 0 {
            return Err("max_word_size must be at least 1.".into());
        }
        if self.points_chunk_size == 0 {
            return Err("points_chunk_size must be at least 1.".into());
        }
        if self.image_size.width == 0 || self.image_size.height == 0 {
            return Err(SmfError::configuration(format!(
                "Wrong image size {}",
                self.image_size
            )));
        }
        if !self.line_width.is_finite() || self.line_width <= 0.0 {
            return Err(SmfError::configuration(format!(
                "Wrong line width {}",
                self.line_width
            )));
        }
        check_padding(self.padding)?;
        crate::input::resolve_encoding(&self.encoding)?;
        let set = self.direction_set()?;
        self.normalization.validate(set.len())?;
        self.gradient()?;
        Ok(())
    }
}

/// Reads a configuration from a RON file.
pub fn read_configuration(config_filename: &Path) -> SmfResult<SamfelluConfig> {
    let config_content = read_to_string(config_filename).map_err(|e| {
        SmfError::input(format!(
            "Failed to read configuration file: {:?}",
            config_filename
        ))
        .add_cause(e.to_string().as_str())
    })?;
    read_configuration_str(&config_content)
}

/// Reads a configuration from a RON string.
pub fn read_configuration_str(config_content: &str) -> SmfResult<SamfelluConfig> {
    SamfelluConfig::deserialize_ron(config_content)
}
