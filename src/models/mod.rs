//! Correlation models for viral recombination inference.
//!
//! The recombination model predicts the correlation profile `P2(lag) / ds`
//! from sample-level parameters via a fragment-size kernel `r1`; the zero
//! recombination model predicts a flat profile.

use serde::{Deserialize, Serialize};

pub mod derived;
pub mod kernels;
pub mod null;
pub mod p2;
pub mod recombination;

// Re-export the models
pub use derived::DerivedParameters;
pub use kernels::FragmentKernel;
pub use null::ZeroRecombinationModel;
pub use p2::{calc_p2, calc_p2_clonal};
pub use recombination::{InitialGuess, RecombinationModel};

/// Fixed constants of the coalescent model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConstants {
    /// Fraction of recombined sites that carry a difference, `2/3`
    pub w: f64,
    /// Jukes-Cantor constant, `4/3`
    pub a: f64,
}

impl Default for ModelConstants {
    fn default() -> Self {
        Self {
            w: 2.0 / 3.0,
            a: 4.0 / 3.0,
        }
    }
}
