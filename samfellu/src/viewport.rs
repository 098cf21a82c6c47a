use crate::path::{BoundingBox, Point};
use samfellu_traits::{SmfError, SmfResult};

/// Maps path coordinates onto an image: `screen = (p + tr) / ratio`.
///
/// The box is scaled uniformly so its dominant side fills the image minus the
/// padding on both ends, and the other side is centered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub ratio: f64,
    pub tr_x: f64,
    pub tr_y: f64,
}

pub fn check_padding(padding: f64) -> SmfResult<()> {
    if !(0.0..0.5).contains(&padding) {
        return Err(SmfError::configuration(format!(
            "Padding must be in [0, 0.5), got {}.",
            padding
        )));
    }
    Ok(())
}

impl ViewportTransform {
    pub fn compute(bbox: &BoundingBox, width: u32, height: u32, padding: f64) -> SmfResult<Self> {
        check_padding(padding)?;
        if width == 0 || height == 0 {
            return Err("Image size must be positive.".into());
        }
        let (w, h) = (width as f64, height as f64);
        let (bw, bh) = (bbox.width(), bbox.height());

        // Nothing to scale, keep the origin in the middle.
        if bbox.is_degenerate() {
            return Ok(ViewportTransform {
                ratio: 1.0,
                tr_x: w / 2.0 - bbox.x0,
                tr_y: h / 2.0 - bbox.y0,
            });
        }

        let transform = if bw * h > bh * w {
            let ratio = bw / w / (1.0 - 2.0 * padding);
            ViewportTransform {
                ratio,
                tr_x: ratio * w * padding - bbox.x0,
                tr_y: ratio * h / 2.0 - (bbox.y0 + bbox.y1) / 2.0,
            }
        } else {
            let ratio = bh / h / (1.0 - 2.0 * padding);
            ViewportTransform {
                ratio,
                tr_x: ratio * w / 2.0 - (bbox.x0 + bbox.x1) / 2.0,
                tr_y: ratio * h * padding - bbox.y0,
            }
        };
        Ok(transform)
    }

    pub fn apply(&self, (x, y): Point) -> Point {
        ((x + self.tr_x) / self.ratio, (y + self.tr_y) / self.ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_wide_box_fits_width() {
        let bbox = BoundingBox {
            x0: -2.0,
            y0: -1.0,
            x1: 8.0,
            y1: 1.0,
        };
        let t = ViewportTransform::compute(&bbox, 640, 480, 0.05).unwrap();
        let (left, mid_y) = t.apply((bbox.x0, 0.0));
        let (right, _) = t.apply((bbox.x1, 0.0));
        assert!(close(left, 640.0 * 0.05));
        assert!(close(right, 640.0 * 0.95));
        assert!(close(mid_y, 240.0));
    }

    #[test]
    fn test_tall_box_fits_height() {
        let bbox = BoundingBox {
            x0: 0.0,
            y0: 0.0,
            x1: 1.0,
            y1: 10.0,
        };
        let t = ViewportTransform::compute(&bbox, 640, 640, 0.1).unwrap();
        let (x0, top) = t.apply((bbox.x0, bbox.y0));
        let (x1, bottom) = t.apply((bbox.x1, bbox.y1));
        assert!(close(top, 64.0));
        assert!(close(bottom, 576.0));
        assert!(close((x0 + x1) / 2.0, 320.0));
    }

    #[test]
    fn test_corners_stay_within_padding() {
        let bbox = BoundingBox {
            x0: -3.5,
            y0: -7.25,
            x1: 12.0,
            y1: 4.0,
        };
        let (w, h, p) = (800u32, 600u32, 0.05);
        let t = ViewportTransform::compute(&bbox, w, h, p).unwrap();
        for corner in [
            (bbox.x0, bbox.y0),
            (bbox.x0, bbox.y1),
            (bbox.x1, bbox.y0),
            (bbox.x1, bbox.y1),
        ] {
            let (sx, sy) = t.apply(corner);
            assert!(sx >= w as f64 * p - 1e-9 && sx <= w as f64 * (1.0 - p) + 1e-9);
            assert!(sy >= h as f64 * p - 1e-9 && sy <= h as f64 * (1.0 - p) + 1e-9);
        }
    }

    #[test]
    fn test_degenerate_box_is_centered() {
        let t = ViewportTransform::compute(&BoundingBox::default(), 640, 480, 0.05).unwrap();
        assert_eq!(t.ratio, 1.0);
        let (x, y) = t.apply((0.0, 0.0));
        assert!(close(x, 320.0) && close(y, 240.0));
    }

    #[test]
    fn test_flat_box_has_finite_transform() {
        let bbox = BoundingBox {
            x0: 0.0,
            y0: 0.0,
            x1: 5.0,
            y1: 0.0,
        };
        let t = ViewportTransform::compute(&bbox, 100, 100, 0.0).unwrap();
        assert!(t.ratio.is_finite() && t.tr_x.is_finite() && t.tr_y.is_finite());
        assert!(close(t.apply((5.0, 0.0)).0, 100.0));
    }

    #[test]
    fn test_invalid_padding() {
        let bbox = BoundingBox::default();
        assert!(ViewportTransform::compute(&bbox, 10, 10, 0.5).is_err());
        assert!(ViewportTransform::compute(&bbox, 10, 10, -0.1).is_err());
        assert!(ViewportTransform::compute(&bbox, 0, 10, 0.1).is_err());
    }
}
