//! The staged pipeline: parse words, construct the line, draw it, write the image.
//!
//! Each stage consumes what the previous one produced, so stages run once and in
//! order. Calling one too early is a sequence error.

use crate::accumulator::{DirectionAccumulator, DirectionCounter};
use crate::classifier::Classifier;
use crate::color::Gradient;
use crate::config::SamfelluConfig;
use crate::directions::DirectionSet;
use crate::input::TextSource;
use crate::monitoring::{NoMonitor, ProgressMonitor, Stage};
use crate::morph::{default_analyzer, MorphAnalyzer};
use crate::path::{BoundingBox, PathBuilder, Point};
use crate::render::{draw_legend, draw_path, PixmapSurface, Surface};
use crate::tokenizer::Tokenizer;
use crate::viewport::ViewportTransform;
use log::{debug, info};
use samfellu_spill::SpillReader;
use samfellu_traits::{SmfError, SmfResult};
use std::path::Path;

pub struct Samfellu {
    config: SamfelluConfig,
    directions: DirectionSet,
    gradient: Gradient,
    tokenizer: Tokenizer,
    analyzer: Box<dyn MorphAnalyzer>,
    monitor: Box<dyn ProgressMonitor>,
    source: Option<TextSource>,
    completed: Option<Stage>,

    counter: Option<DirectionCounter>,
    total_words: u64,
    normals: Option<Vec<f64>>,
    sequence: Option<SpillReader<u8>>,
    points: Option<SpillReader<Point>>,
    bounding_box: Option<BoundingBox>,
    surface: Option<Box<dyn Surface>>,
    legend_drawn: bool,
}

impl Samfellu {
    /// Validates the configuration and sets the run up. Nothing is read yet.
    pub fn new(
        source: TextSource,
        config: SamfelluConfig,
        analyzer: Box<dyn MorphAnalyzer>,
    ) -> SmfResult<Self> {
        config.validate()?;
        let directions = config.direction_set()?;
        let gradient = config.gradient()?;
        let tokenizer = Tokenizer::new(config.max_word_size)?;
        debug!(
            "Configured {} directions, {} normalization, {} colors",
            directions.len(),
            config.normalization,
            gradient.colors().len()
        );
        Ok(Samfellu {
            config,
            directions,
            gradient,
            tokenizer,
            analyzer,
            monitor: Box::new(NoMonitor::default()),
            source: Some(source),
            completed: None,
            counter: None,
            total_words: 0,
            normals: None,
            sequence: None,
            points: None,
            bounding_box: None,
            surface: None,
            legend_drawn: false,
        })
    }

    /// Same as [`Samfellu::new`] with [`default_analyzer`]. The configuration is
    /// checked before the analyzer loads its data.
    pub fn with_default_analyzer(source: TextSource, config: SamfelluConfig) -> SmfResult<Self> {
        config.validate()?;
        Self::new(source, config, default_analyzer()?)
    }

    pub fn with_monitor(mut self, monitor: Box<dyn ProgressMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn config(&self) -> &SamfelluConfig {
        &self.config
    }

    pub fn directions(&self) -> &DirectionSet {
        &self.directions
    }

    fn expect_completed(&self, previous: Option<Stage>, what: &str) -> SmfResult<()> {
        if self.completed == previous {
            return Ok(());
        }
        let message = match (self.completed, previous) {
            (Some(done), Some(needed)) if done > needed => format!("{}: already done", what),
            (_, Some(needed)) => format!("{}: {} has not been done yet", what, needed),
            (Some(_), None) => format!("{}: already done", what),
            (None, None) => what.to_string(),
        };
        Err(SmfError::sequence(message))
    }

    /// Reads the whole text once, sorting words into directions.
    pub fn parse_words(&mut self) -> SmfResult<()> {
        self.expect_completed(None, "parse words")?;
        let source = self
            .source
            .take()
            .ok_or_else(|| SmfError::sequence("parse words: the text was already consumed"))?;
        self.monitor.stage_started(Stage::Parse);

        let chunks = source.open(&self.config.encoding, self.config.text_chunk_size)?;
        let classifier = Classifier::new(&self.directions, &*self.analyzer);
        let mut accumulator = DirectionAccumulator::new(classifier, self.config.spill_builder())?;
        for chunk in chunks {
            let chunk = chunk?;
            accumulator.push_all(self.tokenizer.tokenize(&chunk))?;
            self.monitor.words(accumulator.total_words());
        }
        let accumulated = accumulator.finalize()?;

        let normals = self
            .config
            .normalization
            .normals(&accumulated.counter, accumulated.total_words);
        info!(
            "Parsed {} words: {:?}, normals {:?}",
            accumulated.total_words,
            accumulated.counter.as_slice(),
            normals
        );
        self.total_words = accumulated.total_words;
        self.counter = Some(accumulated.counter);
        self.sequence = Some(accumulated.sequence);
        self.normals = Some(normals);
        self.completed = Some(Stage::Parse);
        self.monitor.stage_finished(Stage::Parse);
        Ok(())
    }

    /// Turns the direction sequence into points and their bounding box.
    pub fn construct_line(&mut self) -> SmfResult<()> {
        self.expect_completed(Some(Stage::Parse), "construct line")?;
        let (Some(sequence), Some(normals)) = (self.sequence.take(), self.normals.as_ref()) else {
            return Err(SmfError::sequence("construct line: parse words has not been done yet"));
        };
        self.monitor.stage_started(Stage::Construct);

        let builder = PathBuilder::new(self.directions.len(), normals)?;
        let total = self.total_words;
        let monitor = &mut self.monitor;
        let mut done = 0u64;
        let path = builder.build(
            sequence.inspect(|_| {
                done += 1;
                monitor.line_points(done, total);
            }),
            self.config.spill_builder(),
        )?;

        let bbox = if self.config.from_center {
            path.bbox.symmetrized()
        } else {
            path.bbox
        };
        debug!("Line of {} points, end {:?}, bounds {:?}", path.len, path.end, bbox);
        self.points = Some(path.points);
        self.bounding_box = Some(bbox);
        self.completed = Some(Stage::Construct);
        self.monitor.stage_finished(Stage::Construct);
        Ok(())
    }

    /// Draws the line on a new raster surface of the configured size.
    pub fn draw(&mut self) -> SmfResult<()> {
        self.expect_completed(Some(Stage::Construct), "draw")?;
        let size = self.config.image_size;
        let mut surface = PixmapSurface::new(size.width, size.height)?;
        self.draw_on(&mut surface)?;
        self.surface = Some(Box::new(surface));
        Ok(())
    }

    /// Draws the line on a caller supplied surface, returns the segments drawn.
    /// The caller keeps the surface, so [`Samfellu::write_output`] is not available.
    pub fn draw_on(&mut self, surface: &mut dyn Surface) -> SmfResult<u64> {
        self.expect_completed(Some(Stage::Construct), "draw")?;
        let (Some(points), Some(bbox)) = (self.points.take(), self.bounding_box) else {
            return Err(SmfError::sequence("draw: construct line has not been done yet"));
        };
        self.monitor.stage_started(Stage::Draw);

        let (width, height) = surface.size();
        let transform = ViewportTransform::compute(&bbox, width, height, self.config.padding)?;
        debug!("Viewport {:?}", transform);
        let total = self.total_words;
        let monitor = &mut self.monitor;
        let drawn = draw_path(
            surface,
            points,
            &transform,
            &self.gradient,
            total,
            self.config.line_width,
            &mut |done| monitor.drawn_points(done, total),
        )?;

        self.completed = Some(Stage::Draw);
        self.monitor.stage_finished(Stage::Draw);
        Ok(drawn)
    }

    /// Adds the direction legend to the surface created by [`Samfellu::draw`], once.
    pub fn draw_legend(&mut self) -> SmfResult<()> {
        self.expect_completed(Some(Stage::Draw), "draw legend")?;
        if self.legend_drawn {
            return Err(SmfError::sequence("draw legend: already done"));
        }
        let (Some(surface), Some(counter)) = (self.surface.as_mut(), self.counter.as_ref()) else {
            return Err(SmfError::sequence("draw legend: draw has not been done yet"));
        };
        draw_legend(&mut **surface, &self.directions, counter)?;
        self.legend_drawn = true;
        Ok(())
    }

    /// Adds the direction legend to any surface once words are parsed.
    pub fn draw_legend_on(&self, surface: &mut dyn Surface) -> SmfResult<()> {
        let counter = self
            .counter
            .as_ref()
            .ok_or_else(|| SmfError::sequence("draw legend: parse words has not been done yet"))?;
        draw_legend(surface, &self.directions, counter)
    }

    /// Runs every stage, with the legend when configured.
    pub fn process(&mut self) -> SmfResult<()> {
        self.parse_words()?;
        self.construct_line()?;
        self.draw()?;
        if self.config.draw_legend {
            self.draw_legend()?;
        }
        Ok(())
    }

    /// Writes the drawn image as PNG.
    pub fn write_output(&self, path: &Path) -> SmfResult<()> {
        let surface = self
            .surface
            .as_ref()
            .ok_or_else(|| SmfError::sequence("write output: draw has not been done yet"))?;
        surface.write_png(path)?;
        info!("Image written to {}", path.display());
        Ok(())
    }

    /// Occurrences per direction, once words are parsed.
    pub fn counter(&self) -> Option<&DirectionCounter> {
        self.counter.as_ref()
    }

    /// Classified words, 0 before parsing.
    pub fn total_words(&self) -> u64 {
        self.total_words
    }

    pub fn normals(&self) -> Option<&[f64]> {
        self.normals.as_deref()
    }

    /// Bounds of the line, already symmetrized when drawing from the center.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_box
    }

    /// `(label, count)` per direction in set order, once words are parsed.
    pub fn legend_entries(&self) -> Option<Vec<(&str, u64)>> {
        let counter = self.counter.as_ref()?;
        Some(
            self.directions
                .iter()
                .enumerate()
                .map(|(i, d)| (d.label.as_str(), counter.get(i)))
                .collect(),
        )
    }
}
