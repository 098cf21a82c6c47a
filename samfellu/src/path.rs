//! Turns a direction sequence into a polyline.
//!
//! Every direction index becomes one step: the vector `(normals[d], 0)` rotated
//! counter-clockwise by the direction's angle. Steps are added to a running
//! position starting at the origin; each position is spilled and widens the
//! bounding box.

use samfellu_spill::{SpillBuilder, SpillReader, SpillWriter};
use samfellu_traits::{SmfError, SmfResult, WriteStream};

pub type Point = (f64, f64);

/// Rotates `(x, y)` counter-clockwise by `angle` degrees.
pub fn rotate_vector(x: f64, y: f64, angle: f64) -> Point {
    let (sin, cos) = angle.to_radians().sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

/// Axis aligned box `(x0, y0)..(x1, y1)`. Starts degenerate at the origin so the
/// path start is always inside it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    pub fn include(&mut self, (x, y): Point) {
        self.x0 = self.x0.min(x);
        self.y0 = self.y0.min(y);
        self.x1 = self.x1.max(x);
        self.y1 = self.y1.max(y);
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() == 0.0 && self.height() == 0.0
    }

    /// Smallest box containing this one and its reflection through the origin,
    /// so the origin lands in the middle of the picture.
    pub fn symmetrized(&self) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(-self.x1),
            y0: self.y0.min(-self.y1),
            x1: (-self.x0).max(self.x1),
            y1: (-self.y0).max(self.y1),
        }
    }

    pub fn contains(&self, (x, y): Point) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }
}

/// Step vectors of a direction set, precomputed once per run.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    steps: Vec<Point>,
}

/// A finished path: the spilled points (origin excluded) and their bounds.
pub struct BuiltPath {
    pub points: SpillReader<Point>,
    pub bbox: BoundingBox,
    pub len: u64,
    pub end: Point,
}

impl PathBuilder {
    pub fn new(nb_directions: usize, normals: &[f64]) -> SmfResult<Self> {
        if nb_directions == 0 {
            return Err("A path needs at least one direction.".into());
        }
        if normals.len() < nb_directions {
            return Err(SmfError::configuration(format!(
                "Expected {} normals, got {}.",
                nb_directions,
                normals.len()
            )));
        }
        let steps = (0..nb_directions)
            .map(|d| rotate_vector(normals[d], 0.0, 360.0 * d as f64 / nb_directions as f64))
            .collect();
        Ok(PathBuilder { steps })
    }

    pub fn step(&self, direction: usize) -> Option<Point> {
        self.steps.get(direction).copied()
    }

    /// Consumes a direction sequence and spills the resulting points.
    pub fn build(
        &self,
        directions: impl IntoIterator<Item = SmfResult<u8>>,
        spill: SpillBuilder,
    ) -> SmfResult<BuiltPath> {
        let mut points: SpillWriter<Point> = spill.build()?;
        let mut bbox = BoundingBox::default();
        let mut position = (0.0, 0.0);
        for direction in directions {
            let direction = direction?;
            let (dx, dy) = self.step(direction as usize).ok_or_else(|| {
                SmfError::input(format!(
                    "Direction index {} out of range for {} directions.",
                    direction,
                    self.steps.len()
                ))
            })?;
            position = (position.0 + dx, position.1 + dy);
            points.log(&position)?;
            bbox.include(position);
        }
        points.flush()?;
        let len = points.len();
        Ok(BuiltPath {
            points: points.into_reader()?,
            bbox,
            len,
            end: position,
        })
    }
}
