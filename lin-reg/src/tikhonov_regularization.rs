use nalgebra::{DMatrix, Dim, Matrix};

use super::{LinReg, LinRegError};

/// How the regularized normal equations are solved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolveMethod {
    /// Explicitly invert the regularized correlation matrix
    #[default]
    Inverse,
    /// Solve through an LU decomposition with partial pivoting
    Lu,
}

/// Tikhonov regularization aka ridge regression
/// It is particularly useful to mitigate the problem of multicollinearity in
/// linear regression
#[derive(Debug, Clone)]
pub struct TikhonovRegularization {
    /// Ridge parameter
    pub regularization_coeff: f64,
    /// Method used to solve the normal equations
    pub solve_method: SolveMethod,
}

impl LinReg for TikhonovRegularization {
    fn fit_readout(
        &self,
        xtx: &DMatrix<f64>,
        xty: &DMatrix<f64>,
    ) -> Result<DMatrix<f64>, LinRegError> {
        let size = xtx.ncols();
        let reg_m: DMatrix<f64> = Matrix::from_diagonal_element_generic(
            Dim::from_usize(size),
            Dim::from_usize(size),
            self.regularization_coeff,
        );
        let regularized = xtx + reg_m;

        let readout = match self.solve_method {
            SolveMethod::Inverse => {
                let inv = regularized.try_inverse().ok_or(LinRegError::Singular { size })?;
                inv * xty
            }
            SolveMethod::Lu => {
                regularized.lu().solve(xty).ok_or(LinRegError::Singular { size })?
            }
        };
        if readout.iter().any(|v| !v.is_finite()) {
            return Err(LinRegError::NonFinite);
        }
        debug!(
            "fitted readout of dims ({}, {}) with {:?}",
            readout.nrows(),
            readout.ncols(),
            self.solve_method
        );

        Ok(readout)
    }
}
