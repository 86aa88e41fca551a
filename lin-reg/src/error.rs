use thiserror::Error;

/// Errors raised while accumulating or solving a linear regression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinRegError {
    /// Nothing has been accumulated since the last solve
    #[error("no samples have been accumulated")]
    NoSamples,

    /// The regularized correlation matrix can not be inverted
    #[error("regularized correlation matrix of size {size}x{size} is singular")]
    Singular {
        /// Number of rows and columns of the system
        size: usize,
    },

    /// The solve succeeded but produced NaN or infinite weights
    #[error("the fitted readout contains non finite values")]
    NonFinite,

    /// Design or targets do not match the accumulator
    #[error("{what} has {got} entries, expected {expected}")]
    Dimensions {
        /// The mismatching quantity
        what: &'static str,
        /// What the accumulator was built for
        expected: usize,
        /// What was passed in
        got: usize,
    },
}
