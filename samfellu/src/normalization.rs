//! Per-direction step lengths.
//!
//! - `general`: each direction contributes the same total length to the path,
//!   `total / (N * count[d])`. A direction that never occurs gets 0.0, it has no
//!   step to scale and no division by zero is attempted.
//! - `none`: every step has length 1.
//! - `manual`: caller supplied factors, at least one per direction.

use crate::accumulator::DirectionCounter;
use samfellu_traits::{SmfError, SmfResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    #[default]
    General,
    None,
    Manual(Vec<f64>),
}

impl Normalization {
    /// Fails fast on manual factors that cannot cover the direction set.
    pub fn validate(&self, nb_directions: usize) -> SmfResult<()> {
        if let Normalization::Manual(normals) = self {
            if normals.len() < nb_directions {
                return Err(SmfError::configuration(format!(
                    "Not enough normals set for manual normalization: {} for {} directions.",
                    normals.len(),
                    nb_directions
                )));
            }
            if let Some(n) = normals.iter().find(|n| !n.is_finite() || **n < 0.0) {
                return Err(SmfError::configuration(format!(
                    "Wrong normal value {} for manual normalization.",
                    n
                )));
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Normalization::General => "general",
            Normalization::None => "none",
            Normalization::Manual(_) => "manual",
        }
    }

    /// Computes the factors once the direction totals are final.
    pub fn normals(&self, counter: &DirectionCounter, total_words: u64) -> Vec<f64> {
        let nb_directions = counter.len();
        match self {
            Normalization::General => (0..nb_directions)
                .map(|d| match counter.get(d) {
                    0 => 0.0,
                    count => total_words as f64 / nb_directions as f64 / count as f64,
                })
                .collect(),
            Normalization::None => vec![1.0; nb_directions],
            Normalization::Manual(normals) => normals[..nb_directions.min(normals.len())].to_vec(),
        }
    }
}

impl Display for Normalization {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Normalization::Manual(normals) => write!(f, "manual {:?}", normals),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Parses a mode name, `manual` starts with no factors and must be completed.
impl FromStr for Normalization {
    type Err = SmfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(Normalization::General),
            "none" => Ok(Normalization::None),
            "manual" => Ok(Normalization::Manual(Vec::new())),
            _ => Err(SmfError::configuration(format!(
                "Wrong normalization value: \"{}\". Use \"general\", \"none\" or \"manual\".",
                s
            ))),
        }
    }
}
