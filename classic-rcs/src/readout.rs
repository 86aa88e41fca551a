use common::{Error, Readout, Result, Sequence};
use lin_reg::{Correlations, LinReg, SolveMethod, TikhonovRegularization};
use nalgebra::DMatrix;

/// Linear readout trained by regression on accumulated state correlations.
/// With a bias, a column of 1s is prepended to the states, so column 0 of the weights is the bias.
#[derive(Debug, Clone)]
pub struct RidgeReadout<R> {
    input_dim: usize,
    output_dim: usize,
    with_bias: bool,
    correlations: Correlations,
    weights: Option<DMatrix<f64>>,
    regressor: R,
}

impl<R> RidgeReadout<R> {
    /// Create an untrained readout
    ///
    /// # Arguments
    /// input_dim: Number of state features per time step
    /// output_dim: Number of outputs per time step
    /// with_bias: Whether to fit an intercept
    /// regressor: The linear regression used when finalizing
    pub fn new(input_dim: usize, output_dim: usize, with_bias: bool, regressor: R) -> Self {
        let design_cols = if with_bias { input_dim + 1 } else { input_dim };

        Self {
            input_dim,
            output_dim,
            with_bias,
            correlations: Correlations::new(design_cols, output_dim),
            weights: None,
            regressor,
        }
    }

    #[inline(always)]
    pub fn with_bias(&self) -> bool {
        self.with_bias
    }

    #[inline(always)]
    pub fn regressor(&self) -> &R {
        &self.regressor
    }

    /// The statistics accumulated since the last finalize or reset
    #[inline(always)]
    pub fn correlations(&self) -> &Correlations {
        &self.correlations
    }

    /// Number of time steps accumulated since the last finalize or reset
    #[inline(always)]
    pub fn num_samples(&self) -> usize {
        self.correlations.num_samples()
    }

    fn design(&self, states: &Sequence<'_>) -> DMatrix<f64> {
        if self.with_bias {
            states.clone_owned().insert_column(0, 1.0)
        } else {
            states.clone_owned()
        }
    }
}

impl RidgeReadout<TikhonovRegularization> {
    /// A readout fitted by ridge regression
    pub fn ridge(
        input_dim: usize,
        output_dim: usize,
        ridge_param: f64,
        with_bias: bool,
        solve_method: SolveMethod,
    ) -> Self {
        let regressor = TikhonovRegularization { regularization_coeff: ridge_param, solve_method };
        Self::new(input_dim, output_dim, with_bias, regressor)
    }
}

impl<R> Readout for RidgeReadout<R>
where
    R: LinReg,
{
    #[inline(always)]
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[inline(always)]
    fn output_dim(&self) -> usize {
        self.output_dim
    }

    fn accumulate(&mut self, states: &Sequence<'_>, targets: &Sequence<'_>) -> Result<()> {
        if self.weights.is_some() {
            return Err(Error::state("readout is finalized, reset it before accumulating again"));
        }
        if states.ncols() != self.input_dim {
            return Err(Error::shape("readout input columns", self.input_dim, states.ncols()));
        }
        if targets.ncols() != self.output_dim {
            return Err(Error::shape("target columns", self.output_dim, targets.ncols()));
        }
        if targets.nrows() != states.nrows() {
            return Err(Error::shape("target rows", states.nrows(), targets.nrows()));
        }

        let design = self.design(states);
        self.correlations.accumulate(&design.rows(0, design.nrows()), targets)?;

        Ok(())
    }

    fn finalize(&mut self) -> Result<&DMatrix<f64>> {
        let readout = self.regressor.fit_correlations(&self.correlations)?;
        info!(
            "finalized readout on {} samples, weights dims: ({}, {})",
            self.correlations.num_samples(),
            readout.ncols(),
            readout.nrows()
        );
        self.correlations.clear();

        Ok(&*self.weights.insert(readout.transpose()))
    }

    fn reset(&mut self) {
        self.correlations.clear();
        self.weights = None;
    }

    fn forward(&self, states: &Sequence<'_>) -> Result<DMatrix<f64>> {
        let weights = self
            .weights
            .as_ref()
            .ok_or_else(|| Error::state("readout has not been finalized"))?;
        if states.ncols() != self.input_dim {
            return Err(Error::shape("readout input columns", self.input_dim, states.ncols()));
        }

        Ok(self.design(states) * weights.transpose())
    }

    #[inline(always)]
    fn weights(&self) -> Option<&DMatrix<f64>> {
        self.weights.as_ref()
    }
}
