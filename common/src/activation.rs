/// The possible activation functions applied to the reservoir state update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    /// The identity function
    Identity,
    /// The hyperbolic tangent
    #[default]
    Tanh,
    /// The logistic sigmoid
    Sigmoid,
    /// The rectified linear unit
    Relu,
}

impl Activation {
    /// Perform the activation function over all elements
    pub fn activate(&self, vals: &mut [f64]) {
        match self {
            Activation::Identity => {}
            Activation::Tanh => {
                for v in vals {
                    *v = v.tanh();
                }
            }
            Activation::Sigmoid => {
                for v in vals {
                    *v = 1.0 / (1.0 + (-*v).exp());
                }
            }
            Activation::Relu => {
                for v in vals {
                    if *v < 0.0 {
                        *v = 0.0;
                    }
                }
            }
        }
    }
}
