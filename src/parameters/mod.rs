//! # Parameter System
//!
//! Named model parameters with bounds and a vary flag, in the spirit of lmfit's
//! `Parameters`. Free parameters are handed to the optimizer as a vector (either
//! in external coordinates or through the Minuit bounds transform); fixed ones
//! stay in the collection so models can read them by name.
//!
//! ```rust
//! use mcorr_fit::parameters::Parameters;
//!
//! let mut params = Parameters::new();
//! params.add_fixed("ds", 0.05).unwrap();
//! params.add_param_with_bounds("thetaS", 1e-5, 0.0, f64::INFINITY).unwrap();
//! params.add_param_with_bounds("f", 1000.0, 3.0, 30000.0).unwrap();
//!
//! assert_eq!(params.varying_count(), 2);
//! assert_eq!(params.value("ds").unwrap(), 0.05);
//! ```

pub mod bounds;
pub mod parameter;
pub mod parameters;

// Re-export key types
pub use bounds::{Bounds, BoundsError, BoundsTransform};
pub use parameter::{Parameter, ParameterError};
pub use parameters::Parameters;
