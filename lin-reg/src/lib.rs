#[macro_use]
extern crate log;

use nalgebra::{Const, DMatrix, Dyn, MatrixView};

mod correlations;
mod error;
mod tikhonov_regularization;

pub use correlations::Correlations;
pub use error::LinRegError;
pub use tikhonov_regularization::{SolveMethod, TikhonovRegularization};

/// Generic way of performing linear regression and fitting the readout matrix
pub trait LinReg: Clone {
    /// Fit a readout matrix from the correlations of a design and its targets
    ///
    /// # Parameters
    /// xtx: The correlation matrix of the design, `XᵀX`
    /// xty: The cross correlation of design and targets, `XᵀY`
    ///
    /// # Returns
    /// A matrix with one row per design column and one column per target
    fn fit_readout(
        &self,
        xtx: &DMatrix<f64>,
        xty: &DMatrix<f64>,
    ) -> Result<DMatrix<f64>, LinRegError>;

    /// Fit a readout matrix from accumulated statistics.
    /// Fails if nothing has been accumulated yet.
    fn fit_correlations(&self, correlations: &Correlations) -> Result<DMatrix<f64>, LinRegError> {
        if correlations.num_samples() == 0 {
            return Err(LinRegError::NoSamples);
        }
        self.fit_readout(correlations.xtx(), correlations.xty())
    }

    /// Fit a readout matrix, mapping inputs to targets
    ///
    /// # Parameters
    /// design: Input data, where the first column should be just 1s if an intercept is wanted
    /// targets: Target data having as many columns as the output dimensionality
    fn fit_design<'a>(
        &self,
        design: &'a MatrixView<'a, f64, Dyn, Dyn, Const<1>, Dyn>,
        targets: &'a MatrixView<'a, f64, Dyn, Dyn, Const<1>, Dyn>,
    ) -> Result<DMatrix<f64>, LinRegError> {
        let mut correlations = Correlations::new(design.ncols(), targets.ncols());
        correlations.accumulate(design, targets)?;
        self.fit_correlations(&correlations)
    }
}
