//! Fragment-size kernels `r1(x; fbar, phiC, w)`.
//!
//! `r1` is the expected number of recombined sites shared by two loci at
//! distance `x`, for a given distribution of incorporated fragment sizes with
//! mean `fbar`.

use crate::error::McorrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Distribution of recombined fragment sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKernel {
    /// Every fragment has length `fbar`.
    #[default]
    Constant,

    /// Exponentially distributed fragment sizes.
    Exponential,

    /// Geometrically distributed fragment sizes.
    Geometric,

    /// No recombination at all.
    Zero,
}

impl FragmentKernel {
    /// Evaluate `r1` at lag `x`.
    ///
    /// ```
    /// use mcorr_fit::models::FragmentKernel;
    ///
    /// let w = 2.0 / 3.0;
    /// assert_eq!(FragmentKernel::Constant.r1(0.0, 100.0, 0.01, w), 0.0);
    /// assert_eq!(FragmentKernel::Constant.r1(500.0, 100.0, 0.01, w), w * 0.01 * 100.0);
    /// ```
    pub fn r1(&self, x: f64, fbar: f64, phi_c: f64, w: f64) -> f64 {
        match self {
            FragmentKernel::Constant => {
                if x < fbar {
                    w * phi_c * x
                } else {
                    w * phi_c * fbar
                }
            }
            FragmentKernel::Exponential => w * phi_c * fbar * (1.0 - (-x / fbar).exp()),
            FragmentKernel::Geometric => {
                let prob = 1.0 / fbar;
                w * phi_c * fbar * (1.0 - (1.0 - prob).powf(x))
            }
            FragmentKernel::Zero => 0.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FragmentKernel::Constant => "constant",
            FragmentKernel::Exponential => "exponential",
            FragmentKernel::Geometric => "geometric",
            FragmentKernel::Zero => "zero",
        }
    }
}

impl fmt::Display for FragmentKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FragmentKernel {
    type Err = McorrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "const" | "constant" => Ok(FragmentKernel::Constant),
            "exp" | "exponential" => Ok(FragmentKernel::Exponential),
            "geom" | "geometric" => Ok(FragmentKernel::Geometric),
            "zero" => Ok(FragmentKernel::Zero),
            _ => Err(McorrError::UnknownKernel(s.to_string())),
        }
    }
}
