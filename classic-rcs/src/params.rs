use common::Activation;
use nalgebra::{DMatrix, DVector};

/// The resolved parameters of a single reservoir layer
#[derive(Debug, Clone)]
pub struct CellParams {
    /// Number of input features per time step
    pub input_dim: usize,
    /// Number of nodes in the reservoir
    pub hidden_dim: usize,

    /// Controls the retention of information from previous time steps.
    /// The spectral radius determines how fast the influence of an input
    /// dies out in a reservoir with time, and how stable the reservoir
    /// activations are. The spectral radius should be greater in tasks
    /// requiring longer memory of the input.
    pub spectral_radius: f64,
    /// Scales the randomly generated reservoir biases
    pub bias_scaling: f64,
    /// Scales the randomly generated input weights
    pub input_scaling: f64,
    /// Tunes the decay time of internal activity of the network.
    /// 1.0 disables leaky integration
    pub leaking_rate: f64,

    /// Recurrent weights to use instead of generated ones, (hidden_dim, hidden_dim)
    pub recurrence_weights: Option<DMatrix<f64>>,
    /// Input weights to use instead of generated ones, (hidden_dim, input_dim)
    pub input_weights: Option<DMatrix<f64>>,
    /// Biases to use instead of generated ones, (hidden_dim)
    pub bias_weights: Option<DVector<f64>>,

    /// Probability of inputs connecting to state, fully connected if `None`
    pub sparsity: Option<f64>,
    /// Values the generated input weights are drawn from
    pub input_set: Vec<f64>,
    /// Connection probability within the reservoir, fully connected if `None`
    pub w_sparsity: Option<f64>,
    /// Activation function of reservoir state transition
    pub activation: Activation,

    /// Whether the output of the previous time step is fed back into the reservoir
    pub feedbacks: bool,
    /// Number of values fed back per time step
    pub feedback_dim: usize,
    /// Probability of the fed back outputs connecting to state, fully connected if `None`
    pub feedback_sparsity: Option<f64>,
    /// Scale the fed back outputs to unit length
    pub normalize_feedbacks: bool,

    /// Optional seed for Rng
    pub seed: Option<u64>,
}

impl CellParams {
    /// Parameters of a fully connected tanh reservoir without feedback
    pub fn new(input_dim: usize, hidden_dim: usize) -> Self {
        Self {
            input_dim,
            hidden_dim,
            spectral_radius: 0.9,
            bias_scaling: 0.0,
            input_scaling: 1.0,
            leaking_rate: 1.0,
            recurrence_weights: None,
            input_weights: None,
            bias_weights: None,
            sparsity: None,
            input_set: vec![1.0, -1.0],
            w_sparsity: None,
            activation: Activation::Tanh,
            feedbacks: false,
            feedback_dim: 0,
            feedback_sparsity: None,
            normalize_feedbacks: false,
            seed: None,
        }
    }
}
