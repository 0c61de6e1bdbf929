use thiserror::Error;

/// Error types for the mcorr-fit library.
#[derive(Error, Debug)]
pub enum McorrError {
    /// Malformed input record or configuration value.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A group's data cannot be fitted (empty series, duplicated lag, ...).
    #[error("Data error in group '{group}': {message}")]
    DataError { group: String, message: String },

    /// The requested group is not present in the dataset.
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    /// Error indicating a mismatch in vector or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// An algebraic denominator vanished or a value became non-finite.
    #[error("Numeric singularity: {0}")]
    NumericSingularity(String),

    /// Error during function evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// Error for parameter-related problems.
    #[error("Parameter error: {0}")]
    ParameterError(String),

    /// Parameter not found.
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// Unknown solver method name.
    #[error("Unknown fit method: {0}")]
    UnknownMethod(String),

    /// Unknown fragment kernel name.
    #[error("Unknown fragment kernel: {0}")]
    UnknownKernel(String),

    /// Error during matrix conversion operations.
    #[error("Matrix conversion error: {0}")]
    ConversionError(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV reading/writing error.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl McorrError {
    /// Build a [`McorrError::DataError`] scoped to a group.
    pub fn data(group: &str, message: impl Into<String>) -> Self {
        McorrError::DataError {
            group: group.to_string(),
            message: message.into(),
        }
    }
}

impl From<crate::parameters::parameter::ParameterError> for McorrError {
    fn from(err: crate::parameters::parameter::ParameterError) -> Self {
        match err {
            crate::parameters::parameter::ParameterError::ParameterNotFound { name } => {
                McorrError::ParameterNotFound(name)
            }
            other => McorrError::ParameterError(format!("{}", other)),
        }
    }
}

/// Result type alias for mcorr-fit operations.
pub type Result<T> = std::result::Result<T, McorrError>;
