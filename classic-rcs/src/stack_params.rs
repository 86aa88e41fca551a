use common::{Activation, Error, Result};
use lin_reg::SolveMethod;
use nalgebra::{DMatrix, DVector};

use crate::{CellParams, LayerParam};

/// How the number of features fed into the readout is counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureWidth {
    /// Sum of the reservoir widths, which is the width of the concatenated states
    #[default]
    HiddenWidths,
    /// Sum of the input widths of all layers.
    /// Only consistent with the concatenated states when both sums happen to be equal.
    InputWidths,
}

/// The parameters of a stack of Echo State Networks sharing one readout.
/// Hyperparameters of type `LayerParam` may be given once for all layers or once per layer.
#[derive(Debug, Clone)]
pub struct StackParams {
    /// Number of input features per time step
    pub input_dim: usize,
    /// Number of nodes of each reservoir, one entry per layer
    pub hidden_dims: Vec<usize>,
    /// Number of outputs per time step
    pub output_dim: usize,

    /// Spectral radius of each generated reservoir, 0.9 if unset
    pub spectral_radius: LayerParam<f64>,
    /// Scales the generated biases, 0.0 if unset
    pub bias_scaling: LayerParam<f64>,
    /// Scales the generated input weights, 1.0 if unset
    pub input_scaling: LayerParam<f64>,
    /// Leaking rate of each reservoir, 1.0 if unset
    pub leaking_rate: LayerParam<f64>,
    /// Recurrent weights replacing the generated ones
    pub recurrence_weights: LayerParam<DMatrix<f64>>,
    /// Input weights replacing the generated ones
    pub input_weights: LayerParam<DMatrix<f64>>,
    /// Biases replacing the generated ones
    pub bias_weights: LayerParam<DVector<f64>>,

    /// Probability of inputs connecting to state, shared by all layers
    pub sparsity: Option<f64>,
    /// Values the generated input weights are drawn from
    pub input_set: Vec<f64>,
    /// Connection probability within each reservoir, shared by all layers
    pub w_sparsity: Option<f64>,
    /// Activation function of the reservoirs
    pub activation: Activation,

    /// Feed the output of the previous time step back into every reservoir
    pub feedbacks: bool,
    /// Connection probability of the fed back outputs
    pub feedback_sparsity: Option<f64>,
    /// Scale the fed back outputs to unit length
    pub normalize_feedbacks: bool,

    /// Ridge regression regularization applied when finalizing the readout
    pub ridge_param: f64,
    /// Fit an intercept in the readout
    pub with_bias: bool,
    /// How the readout solves the regression
    pub solve_method: SolveMethod,
    /// How the readout input width is counted
    pub feature_width: FeatureWidth,

    /// Optional seed for Rng, layer `i` is seeded with `seed + i`
    pub seed: Option<u64>,
}

impl StackParams {
    /// Parameters with default hyperparameters for the given dimensions
    pub fn new(input_dim: usize, hidden_dims: Vec<usize>, output_dim: usize) -> Self {
        Self {
            input_dim,
            hidden_dims,
            output_dim,
            spectral_radius: LayerParam::Unset,
            bias_scaling: LayerParam::Unset,
            input_scaling: LayerParam::Unset,
            leaking_rate: LayerParam::Unset,
            recurrence_weights: LayerParam::Unset,
            input_weights: LayerParam::Unset,
            bias_weights: LayerParam::Unset,
            sparsity: None,
            input_set: vec![1.0, -1.0],
            w_sparsity: None,
            activation: Activation::Tanh,
            feedbacks: false,
            feedback_sparsity: None,
            normalize_feedbacks: false,
            ridge_param: 0.0,
            with_bias: true,
            solve_method: SolveMethod::Inverse,
            feature_width: FeatureWidth::HiddenWidths,
            seed: None,
        }
    }

    /// Number of layers, one per entry of `hidden_dims`
    #[inline(always)]
    pub fn n_layers(&self) -> usize {
        self.hidden_dims.len()
    }

    /// Check the dimensions of the stack
    pub fn validate(&self) -> Result<()> {
        if self.hidden_dims.is_empty() {
            return Err(Error::configuration("hidden_dims must contain at least one layer"));
        }
        if self.input_dim == 0 || self.output_dim == 0 {
            return Err(Error::configuration(format!(
                "input_dim and output_dim must be positive, got {} and {}",
                self.input_dim, self.output_dim
            )));
        }
        if let Some(layer) = self.hidden_dims.iter().position(|h| *h == 0) {
            return Err(Error::configuration(format!("hidden_dims[{layer}] is zero")));
        }
        Ok(())
    }

    /// Input width of a layer, which is the width of the layer before it.
    /// `None` for a layer outside the stack.
    pub fn layer_input_dim(&self, layer: usize) -> Option<usize> {
        if layer >= self.n_layers() {
            return None;
        }
        if layer == 0 {
            Some(self.input_dim)
        } else {
            Some(self.hidden_dims[layer - 1])
        }
    }

    /// Resolve the parameters of a single layer
    pub fn layer_params(&self, layer: usize) -> Result<CellParams> {
        let n_layers = self.n_layers();
        let input_dim = self.layer_input_dim(layer).ok_or_else(|| {
            Error::configuration(format!("layer index {layer} out of range for {n_layers} layers"))
        })?;
        let mut params = CellParams::new(input_dim, self.hidden_dims[layer]);

        if let Some(v) = self.spectral_radius.resolve("spectral_radius", layer, n_layers)? {
            params.spectral_radius = v;
        }
        if let Some(v) = self.bias_scaling.resolve("bias_scaling", layer, n_layers)? {
            params.bias_scaling = v;
        }
        if let Some(v) = self.input_scaling.resolve("input_scaling", layer, n_layers)? {
            params.input_scaling = v;
        }
        if let Some(v) = self.leaking_rate.resolve("leaking_rate", layer, n_layers)? {
            params.leaking_rate = v;
        }
        params.recurrence_weights =
            self.recurrence_weights.resolve("recurrence_weights", layer, n_layers)?;
        params.input_weights = self.input_weights.resolve("input_weights", layer, n_layers)?;
        params.bias_weights = self.bias_weights.resolve("bias_weights", layer, n_layers)?;

        params.sparsity = self.sparsity;
        params.input_set = self.input_set.clone();
        params.w_sparsity = self.w_sparsity;
        params.activation = self.activation;
        params.feedbacks = self.feedbacks;
        params.feedback_dim = if self.feedbacks { self.output_dim } else { 0 };
        params.feedback_sparsity = self.feedback_sparsity;
        params.normalize_feedbacks = self.normalize_feedbacks;
        params.seed = self.seed.map(|s| s.wrapping_add(layer as u64));

        Ok(params)
    }
}
