//! Colors, built-in palettes and the gradient applied along the path.

use samfellu_traits::{SmfError, SmfResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// An RGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Rgb { r, g, b }
    }

    /// Parses `#RGB` or `#RRGGBB`, the leading `#` being optional.
    pub fn parse(text: &str) -> SmfResult<Self> {
        let wrong = || SmfError::configuration(format!("Wrong color \"{}\"", text));
        let hex = text.strip_prefix('#').unwrap_or(text);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(wrong());
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| wrong());
        let (r, g, b) = match hex.len() {
            3 => {
                let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                (expand(0)?, expand(1)?, expand(2)?)
            }
            6 => (channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?),
            _ => return Err(wrong()),
        };
        Ok(Rgb::from_u8(r, g, b))
    }

    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Rgb::new(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
    }

    pub fn to_u8(&self) -> [u8; 3] {
        let c = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [c(self.r), c(self.g), c(self.b)]
    }

    pub fn lerp(&self, other: &Rgb, t: f64) -> Rgb {
        Rgb::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let [r, g, b] = self.to_u8();
        write!(f, "#{:02X}{:02X}{:02X}", r, g, b)
    }
}

impl FromStr for Rgb {
    type Err = SmfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgb::parse(s)
    }
}

/// Built-in palettes, spelled by their key in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PaletteChoice {
    #[default]
    Default,
    Rgb,
    Five,
    Three,
}

impl PaletteChoice {
    pub const ALL: [PaletteChoice; 4] = [
        PaletteChoice::Default,
        PaletteChoice::Rgb,
        PaletteChoice::Five,
        PaletteChoice::Three,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            PaletteChoice::Default => "default",
            PaletteChoice::Rgb => "rgb",
            PaletteChoice::Five => "5",
            PaletteChoice::Three => "3",
        }
    }

    fn hex(&self) -> &'static [&'static str] {
        match self {
            PaletteChoice::Default => &["#0CC", "#C0C", "#CC0"],
            PaletteChoice::Rgb => &["#f00", "#0f0", "#00f"],
            PaletteChoice::Five => &["#FC0347", "#6A03D9", "#0365F0", "#02B27B", "#54FF03"],
            PaletteChoice::Three => &["#F27B00", "#4B00F0", "#00A316"],
        }
    }

    pub fn colors(&self) -> Vec<Rgb> {
        // The tables are constants, every entry parses.
        self.hex().iter().filter_map(|h| Rgb::parse(h).ok()).collect()
    }
}

impl Display for PaletteChoice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for PaletteChoice {
    type Err = SmfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaletteChoice::ALL
            .iter()
            .find(|p| p.key() == s)
            .copied()
            .ok_or_else(|| SmfError::configuration(format!("Unknown palette \"{}\"", s)))
    }
}

impl TryFrom<String> for PaletteChoice {
    type Error = SmfError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PaletteChoice> for String {
    fn from(palette: PaletteChoice) -> Self {
        palette.key().to_string()
    }
}

/// Piecewise linear gradient through an ordered list of colors.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    colors: Vec<Rgb>,
}

impl Gradient {
    pub fn new(colors: Vec<Rgb>) -> SmfResult<Self> {
        if colors.is_empty() {
            return Err("A gradient needs at least one color.".into());
        }
        Ok(Gradient { colors })
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Color of step `index` out of `total`.
    pub fn color_at(&self, index: u64, total: u64) -> Rgb {
        let last = self.colors[self.colors.len() - 1];
        if self.colors.len() == 1 {
            return last;
        }
        let t = index as f64 / total.max(1) as f64;
        if t >= 1.0 {
            return last;
        }
        let scaled = t.max(0.0) * (self.colors.len() - 1) as f64;
        let n = scaled.floor() as usize;
        self.colors[n].lerp(&self.colors[n + 1], scaled - n as f64)
    }
}

impl From<PaletteChoice> for Gradient {
    fn from(palette: PaletteChoice) -> Self {
        Gradient {
            colors: palette.colors(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgb, b: Rgb) -> bool {
        (a.r - b.r).abs() < 1e-9 && (a.g - b.g).abs() < 1e-9 && (a.b - b.b).abs() < 1e-9
    }

    #[test]
    fn test_parse_colors() {
        assert_eq!(Rgb::parse("#0CC").unwrap(), Rgb::new(0.0, 0.8, 0.8));
        assert_eq!(Rgb::parse("ff0000").unwrap(), Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(Rgb::parse("#6A03D9").unwrap().to_u8(), [0x6A, 0x03, 0xD9]);
        assert_eq!(Rgb::parse("#f0a").unwrap().to_string(), "#FF00AA");
    }

    #[test]
    fn test_wrong_colors() {
        for bad in ["", "#", "#12", "#1234", "#GGGGGG", "#ффф", "red"] {
            let err = Rgb::parse(bad).unwrap_err();
            assert_eq!(err.to_string(), format!("Wrong color \"{}\"", bad));
        }
    }

    #[test]
    fn test_palettes() {
        for p in PaletteChoice::ALL {
            assert_eq!(p.colors().len(), p.hex().len());
            assert_eq!(p.key().parse::<PaletteChoice>().unwrap(), p);
        }
        assert_eq!(PaletteChoice::Five.colors().len(), 5);
        assert!("7".parse::<PaletteChoice>().is_err());
    }

    #[test]
    fn test_gradient_endpoints() {
        let g = Gradient::from(PaletteChoice::Rgb);
        assert!(close(g.color_at(0, 10), Rgb::new(1.0, 0.0, 0.0)));
        assert!(close(g.color_at(5, 10), Rgb::new(0.0, 1.0, 0.0)));
        assert!(close(g.color_at(10, 10), Rgb::new(0.0, 0.0, 1.0)));
        assert!(close(g.color_at(12, 10), Rgb::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_gradient_interpolates() {
        let g = Gradient::new(vec![Rgb::new(0.0, 0.0, 0.0), Rgb::new(1.0, 1.0, 1.0)]).unwrap();
        assert!(close(g.color_at(1, 4), Rgb::new(0.25, 0.25, 0.25)));
        assert!(close(g.color_at(0, 0), Rgb::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_single_color_gradient() {
        let c = Rgb::new(0.2, 0.4, 0.6);
        let g = Gradient::new(vec![c]).unwrap();
        assert_eq!(g.color_at(0, 100), c);
        assert_eq!(g.color_at(77, 100), c);
        assert!(Gradient::new(vec![]).is_err());
    }
}
