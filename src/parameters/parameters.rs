//! Parameters collection implementation
//!
//! An ordered collection of [`Parameter`]s. The order of insertion is the order
//! in which varying parameters are laid out in the optimizer's vector, so the
//! mapping between names and vector slots is stable across clones.

use crate::parameters::bounds::Bounds;
use crate::parameters::parameter::{Parameter, ParameterError};
use serde::{Deserialize, Serialize};

/// An ordered collection of named parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    params: Vec<Parameter>,
}

impl Parameters {
    /// Create a new empty parameters collection
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter to the collection
    ///
    /// # Examples
    ///
    /// ```
    /// use mcorr_fit::parameters::{Parameter, Parameters};
    ///
    /// let mut params = Parameters::new();
    /// params.add(Parameter::new("thetaS", 1e-5)).unwrap();
    /// assert!(params.add(Parameter::new("thetaS", 2e-5)).is_err());
    /// assert_eq!(params.len(), 1);
    /// ```
    pub fn add(&mut self, param: Parameter) -> Result<(), ParameterError> {
        if self.contains(param.name()) {
            return Err(ParameterError::DuplicateParameter {
                name: param.name().to_string(),
            });
        }
        self.params.push(param);
        Ok(())
    }

    /// Add a new free parameter with the given name and value
    pub fn add_param(&mut self, name: &str, value: f64) -> Result<(), ParameterError> {
        self.add(Parameter::new(name, value))
    }

    /// Add a new free parameter with bounds
    pub fn add_param_with_bounds(
        &mut self,
        name: &str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<(), ParameterError> {
        self.add(Parameter::with_bounds(name, value, min, max)?)
    }

    /// Add a parameter that the optimizer never varies
    pub fn add_fixed(&mut self, name: &str, value: f64) -> Result<(), ParameterError> {
        self.add(Parameter::fixed(name, value))
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.params.iter_mut().find(|p| p.name() == name)
    }

    /// Current value of a named parameter
    pub fn value(&self, name: &str) -> Result<f64, ParameterError> {
        self.get(name)
            .map(Parameter::value)
            .ok_or_else(|| ParameterError::ParameterNotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    /// (name, value) pairs in insertion order
    pub fn values(&self) -> Vec<(String, f64)> {
        self.params
            .iter()
            .map(|p| (p.name().to_string(), p.value()))
            .collect()
    }

    /// The parameters the optimizer varies, in insertion order
    pub fn varying(&self) -> Vec<&Parameter> {
        self.params.iter().filter(|p| p.vary()).collect()
    }

    /// Number of varying parameters (the AIC degrees of freedom)
    pub fn varying_count(&self) -> usize {
        self.params.iter().filter(|p| p.vary()).count()
    }

    /// External values of the varying parameters
    pub fn varying_values(&self) -> Vec<f64> {
        self.params
            .iter()
            .filter(|p| p.vary())
            .map(Parameter::value)
            .collect()
    }

    /// Bounds of the varying parameters
    pub fn varying_bounds(&self) -> Vec<Bounds> {
        self.params
            .iter()
            .filter(|p| p.vary())
            .map(|p| *p.bounds())
            .collect()
    }

    /// Internal (Minuit-transformed) values of the varying parameters
    pub fn varying_internal_values(&self) -> Result<Vec<f64>, ParameterError> {
        self.params
            .iter()
            .filter(|p| p.vary())
            .map(Parameter::to_internal)
            .collect()
    }

    /// Update the varying parameters from internal values
    pub fn update_from_internal(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        self.check_varying_len(values.len())?;

        for (param, &internal) in self.params.iter_mut().filter(|p| p.vary()).zip(values) {
            let external = param.from_internal(internal);
            // sin/sqrt rounding can land a hair outside a closed bound
            param.set_value(param.bounds().clamp(external))?;
        }
        Ok(())
    }

    /// Update the varying parameters from external values
    pub fn update_from_external(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        self.check_varying_len(values.len())?;

        for (param, &value) in self.params.iter_mut().filter(|p| p.vary()).zip(values) {
            param.set_value(value)?;
        }
        Ok(())
    }

    /// Reset all parameters to their initial values
    pub fn reset(&mut self) {
        for param in self.params.iter_mut() {
            param.reset();
        }
    }

    fn check_varying_len(&self, actual: usize) -> Result<(), ParameterError> {
        let expected = self.varying_count();
        if actual != expected {
            return Err(ParameterError::LengthMismatch { expected, actual });
        }
        Ok(())
    }
}
