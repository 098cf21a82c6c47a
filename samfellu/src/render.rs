//! Drawing surfaces and the painters that put a path and its legend on them.

use crate::accumulator::DirectionCounter;
use crate::color::{Gradient, Rgb};
use crate::directions::DirectionSet;
use crate::path::{rotate_vector, Point};
use crate::viewport::ViewportTransform;
use log::debug;
use samfellu_traits::{ErrorKind, SmfError, SmfResult};
use std::path::Path;
use resvg::usvg;
use std::fmt::Write as _;
use tiny_skia::{Color, LineCap, LineJoin, Paint, Pixmap, Stroke, Transform};

/// A 2D vector canvas: stroke colored polylines, write text, then save the result as PNG.
pub trait Surface {
    fn size(&self) -> (u32, u32);
    fn set_color(&mut self, color: Rgb);
    fn set_line_width(&mut self, width: f64);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    /// Strokes the current path with the current color and width, then clears it.
    fn stroke(&mut self) -> SmfResult<()>;
    /// Writes `text` in the current color, `(x, y)` being the start of its baseline.
    fn text(&mut self, x: f64, y: f64, text: &str, size: f64) -> SmfResult<()>;
    fn write_png(&self, path: &Path) -> SmfResult<()>;
}

const FONT_FAMILY: &str = "sans-serif";

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Raster surface on a white canvas.
///
/// Text goes through resvg with the system fonts, loaded on the first text call.
/// Without any usable font, text is silently left out.
pub struct PixmapSurface {
    pixmap: Pixmap,
    color: Rgb,
    line_width: f64,
    current: Option<tiny_skia::PathBuilder>,
    text_options: Option<usvg::Options<'static>>,
}

impl PixmapSurface {
    pub fn new(width: u32, height: u32) -> SmfResult<Self> {
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            SmfError::configuration(format!(
                "Failed to allocate a {}x{} surface",
                width, height
            ))
        })?;
        pixmap.fill(Color::WHITE);
        Ok(PixmapSurface {
            pixmap,
            color: Rgb::new(0.0, 0.0, 0.0),
            line_width: 1.0,
            current: None,
            text_options: None,
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn encode_png(&self) -> SmfResult<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| SmfError::new_with_cause(ErrorKind::Output, "Failed to encode PNG output", e))
    }

    /// RGB of a pixel, `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        let p = self.pixmap.pixel(x, y)?.demultiply();
        Some([p.red(), p.green(), p.blue()])
    }
}

impl Surface for PixmapSurface {
    fn size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn set_color(&mut self, color: Rgb) {
        self.color = color;
    }

    fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.current
            .get_or_insert_with(tiny_skia::PathBuilder::new)
            .move_to(x as f32, y as f32);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.current
            .get_or_insert_with(tiny_skia::PathBuilder::new)
            .line_to(x as f32, y as f32);
    }

    fn stroke(&mut self) -> SmfResult<()> {
        // Empty or single point paths have nothing to stroke.
        let Some(path) = self.current.take().and_then(|b| b.finish()) else {
            return Ok(());
        };
        let [r, g, b] = self.color.to_u8();
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, 255);
        paint.anti_alias = true;
        let stroke = Stroke {
            width: self.line_width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        Ok(())
    }

    fn text(&mut self, x: f64, y: f64, text: &str, size: f64) -> SmfResult<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let options = self.text_options.get_or_insert_with(|| {
            let mut options = usvg::Options::default();
            options.font_family = FONT_FAMILY.to_string();
            options.fontdb_mut().load_system_fonts();
            debug!("Loaded {} font faces", options.fontdb.len());
            options
        });
        let mut svg = String::new();
        // Writing into a String cannot fail.
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}"><text x="{}" y="{}" font-family="{}" font-size="{}" fill="{}">{}</text></svg>"#,
            self.pixmap.width(),
            self.pixmap.height(),
            x,
            y,
            FONT_FAMILY,
            size,
            self.color,
            escape_xml(text)
        );
        let tree = usvg::Tree::from_str(&svg, options).map_err(|e| {
            SmfError::output(format!("Failed to lay out text \"{}\"", text))
                .add_cause(&e.to_string())
        })?;
        resvg::render(&tree, Transform::identity(), &mut self.pixmap.as_mut());
        Ok(())
    }

    fn write_png(&self, path: &Path) -> SmfResult<()> {
        debug!("Writing PNG to {}", path.display());
        self.pixmap.save_png(path).map_err(|e| {
            SmfError::new_with_cause(
                ErrorKind::Output,
                &format!("Failed to write \"{}\"", path.display()),
                e,
            )
        })
    }
}

/// One recorded surface operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    SetColor(Rgb),
    SetLineWidth(f64),
    MoveTo(Point),
    LineTo(Point),
    Stroke,
    Text {
        at: Point,
        text: String,
        size: f64,
    },
}

/// A surface that only records what is drawn on it.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    calls: Vec<DrawCall>,
}

/// A stroked segment as seen on a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    pub color: Rgb,
    pub width: f64,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        RecordingSurface {
            width,
            height,
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Stroked straight segments in drawing order.
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut color = Rgb::new(0.0, 0.0, 0.0);
        let mut width = 1.0;
        let mut pending: Vec<Segment> = Vec::new();
        let mut cursor: Option<Point> = None;
        for call in &self.calls {
            match call {
                DrawCall::SetColor(c) => color = *c,
                DrawCall::SetLineWidth(w) => width = *w,
                DrawCall::MoveTo(p) => cursor = Some(*p),
                DrawCall::LineTo(p) => {
                    if let Some(from) = cursor {
                        pending.push(Segment {
                            from,
                            to: *p,
                            color,
                            width,
                        });
                    }
                    cursor = Some(*p);
                }
                DrawCall::Stroke => {
                    // Color and width apply at stroke time.
                    segments.extend(pending.drain(..).map(|s| Segment { color, width, ..s }));
                    cursor = None;
                }
                DrawCall::Text { .. } => {}
            }
        }
        segments
    }

    /// Texts written, with their color, in drawing order.
    pub fn texts(&self) -> Vec<(String, Rgb)> {
        let mut color = Rgb::new(0.0, 0.0, 0.0);
        let mut texts = Vec::new();
        for call in &self.calls {
            match call {
                DrawCall::SetColor(c) => color = *c,
                DrawCall::Text { text, .. } => texts.push((text.clone(), color)),
                _ => {}
            }
        }
        texts
    }

    /// Plays the recorded calls onto another surface.
    pub fn replay(&self, target: &mut dyn Surface) -> SmfResult<()> {
        for call in &self.calls {
            match call {
                DrawCall::SetColor(c) => target.set_color(*c),
                DrawCall::SetLineWidth(w) => target.set_line_width(*w),
                DrawCall::MoveTo((x, y)) => target.move_to(*x, *y),
                DrawCall::LineTo((x, y)) => target.line_to(*x, *y),
                DrawCall::Stroke => target.stroke()?,
                DrawCall::Text { at, text, size } => target.text(at.0, at.1, text, *size)?,
            }
        }
        Ok(())
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_color(&mut self, color: Rgb) {
        self.calls.push(DrawCall::SetColor(color));
    }

    fn set_line_width(&mut self, width: f64) {
        self.calls.push(DrawCall::SetLineWidth(width));
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.calls.push(DrawCall::MoveTo((x, y)));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.calls.push(DrawCall::LineTo((x, y)));
    }

    fn stroke(&mut self) -> SmfResult<()> {
        self.calls.push(DrawCall::Stroke);
        Ok(())
    }

    fn text(&mut self, x: f64, y: f64, text: &str, size: f64) -> SmfResult<()> {
        self.calls.push(DrawCall::Text {
            at: (x, y),
            text: text.to_string(),
            size,
        });
        Ok(())
    }

    /// Rasterizes the recording, then writes it.
    fn write_png(&self, path: &Path) -> SmfResult<()> {
        let mut raster = PixmapSurface::new(self.width, self.height)?;
        self.replay(&mut raster)?;
        raster.write_png(path)
    }
}

/// Strokes the path from the origin through every point, segment `k` colored
/// with `gradient.color_at(k, total)`. Returns the number of segments drawn.
pub fn draw_path(
    surface: &mut dyn Surface,
    points: impl IntoIterator<Item = SmfResult<Point>>,
    transform: &ViewportTransform,
    gradient: &Gradient,
    total: u64,
    line_width: f64,
    progress: &mut dyn FnMut(u64),
) -> SmfResult<u64> {
    surface.set_line_width(line_width);
    let mut previous = transform.apply((0.0, 0.0));
    let mut drawn = 0u64;
    for point in points {
        let current = transform.apply(point?);
        drawn += 1;
        surface.set_color(gradient.color_at(drawn, total));
        surface.move_to(previous.0, previous.1);
        surface.line_to(current.0, current.1);
        surface.stroke()?;
        previous = current;
        progress(drawn);
    }
    Ok(drawn)
}

const LEGEND_MARGIN: f64 = 10.0;
const LEGEND_VECTOR_LENGTH: f64 = 20.0;
const LEGEND_BAR_LENGTH: f64 = 100.0;
const ARROW_HEAD_LENGTH: f64 = 8.0;
const ARROW_HEAD_ANGLE: f64 = 20.0;
const LEGEND_GREY: Rgb = Rgb::new(0.4, 0.4, 0.4);
const LEGEND_TEXT: Rgb = Rgb::new(0.0, 0.0, 0.0);
const LEGEND_FONT_SIZE: f64 = 12.0;

/// Line from `from` to `to` with a two stroke head at `to`.
pub fn draw_arrow(surface: &mut dyn Surface, from: Point, to: Point) -> SmfResult<()> {
    surface.move_to(from.0, from.1);
    surface.line_to(to.0, to.1);
    let (dx, dy) = (from.0 - to.0, from.1 - to.1);
    let length = dx.hypot(dy);
    if length > 0.0 {
        let back = (dx / length * ARROW_HEAD_LENGTH, dy / length * ARROW_HEAD_LENGTH);
        for angle in [ARROW_HEAD_ANGLE, -ARROW_HEAD_ANGLE] {
            let (hx, hy) = rotate_vector(back.0, back.1, angle);
            surface.move_to(to.0, to.1);
            surface.line_to(to.0 + hx, to.1 + hy);
        }
    }
    surface.stroke()
}

/// Draws one row per direction in the lower left corner, bottom row first: an
/// arrow pointing like the direction's steps, a bar proportional to its share
/// of the classified words and a `label (count)` caption.
pub fn draw_legend(
    surface: &mut dyn Surface,
    directions: &DirectionSet,
    counter: &DirectionCounter,
) -> SmfResult<()> {
    let (width, height) = surface.size();
    let origin = (0.05 * width as f64, 0.95 * height as f64);
    let total = counter.total().max(1) as f64;
    let row_height = LEGEND_VECTOR_LENGTH + LEGEND_MARGIN;

    surface.set_line_width(1.0);
    for (index, direction) in directions.iter().enumerate() {
        surface.set_color(LEGEND_GREY);
        let y = origin.1 - index as f64 * row_height - LEGEND_VECTOR_LENGTH / 2.0;
        let center = (origin.0 + LEGEND_VECTOR_LENGTH / 2.0, y);
        let (vx, vy) = rotate_vector(LEGEND_VECTOR_LENGTH / 2.0, 0.0, directions.angle(index));
        draw_arrow(
            surface,
            (center.0 - vx, center.1 - vy),
            (center.0 + vx, center.1 + vy),
        )?;

        let share = counter.get(index) as f64 / total;
        if share > 0.0 {
            let bar_x = origin.0 + LEGEND_VECTOR_LENGTH + LEGEND_MARGIN;
            surface.move_to(bar_x, y);
            surface.line_to(bar_x + share * LEGEND_BAR_LENGTH, y);
            surface.stroke()?;
        }

        let caption_x = origin.0 + LEGEND_VECTOR_LENGTH + 2.0 * LEGEND_MARGIN + LEGEND_BAR_LENGTH;
        surface.set_color(LEGEND_TEXT);
        surface.text(
            caption_x,
            y + LEGEND_FONT_SIZE / 3.0,
            &format!("{} ({})", direction.label, counter.get(index)),
            LEGEND_FONT_SIZE,
        )?;
    }
    Ok(())
}
