use nalgebra::{Const, DMatrix, Dyn, MatrixView};

use crate::LinRegError;

/// Running sufficient statistics of a least squares problem.
/// Keeps `XᵀX` and `XᵀY` so designs can be fed in chunks without keeping them around.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlations {
    xtx: DMatrix<f64>,
    xty: DMatrix<f64>,
    num_samples: usize,
}

impl Correlations {
    /// Create empty statistics for `num_features` design columns and `num_targets` target columns
    pub fn new(num_features: usize, num_targets: usize) -> Self {
        Self {
            xtx: DMatrix::zeros(num_features, num_features),
            xty: DMatrix::zeros(num_features, num_targets),
            num_samples: 0,
        }
    }

    /// Add the rows of `design` and their `targets` to the statistics.
    /// Nothing is modified if the dimensions do not match.
    pub fn accumulate<'a>(
        &mut self,
        design: &'a MatrixView<'a, f64, Dyn, Dyn, Const<1>, Dyn>,
        targets: &'a MatrixView<'a, f64, Dyn, Dyn, Const<1>, Dyn>,
    ) -> Result<(), LinRegError> {
        if design.ncols() != self.num_features() {
            return Err(LinRegError::Dimensions {
                what: "design columns",
                expected: self.num_features(),
                got: design.ncols(),
            });
        }
        if targets.ncols() != self.num_targets() {
            return Err(LinRegError::Dimensions {
                what: "target columns",
                expected: self.num_targets(),
                got: targets.ncols(),
            });
        }
        if targets.nrows() != design.nrows() {
            return Err(LinRegError::Dimensions {
                what: "target rows",
                expected: design.nrows(),
                got: targets.nrows(),
            });
        }

        self.xtx += design.tr_mul(design);
        self.xty += design.tr_mul(targets);
        self.num_samples += design.nrows();

        Ok(())
    }

    /// Forget everything accumulated so far
    pub fn clear(&mut self) {
        self.xtx.fill(0.0);
        self.xty.fill(0.0);
        self.num_samples = 0;
    }

    /// The correlation matrix of the design, `XᵀX`
    #[inline(always)]
    pub fn xtx(&self) -> &DMatrix<f64> {
        &self.xtx
    }

    /// The cross correlation of design and targets, `XᵀY`
    #[inline(always)]
    pub fn xty(&self) -> &DMatrix<f64> {
        &self.xty
    }

    /// Number of design rows seen since creation or the last `clear`
    #[inline(always)]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    #[inline(always)]
    pub fn num_features(&self) -> usize {
        self.xtx.nrows()
    }

    #[inline(always)]
    pub fn num_targets(&self) -> usize {
        self.xty.ncols()
    }
}
