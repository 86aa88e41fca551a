//! Classic reservoir computers: leaky Echo State Network reservoirs,
//! stacked into a deep network with a single ridge regression readout

#[macro_use]
extern crate log;

mod esn;
mod esn_constructor;
mod layer_param;
mod layer_stack;
mod params;
mod readout;
mod reservoir_constructor;
mod stack_params;
mod stacked_esn;

pub use common::{Activation, Error, Readout, ReservoirCell, Result, Sequence};
pub use esn::EsnCell;
pub use esn_constructor::{spectral_radius, EsnConstructor};
pub use layer_param::LayerParam;
pub use layer_stack::LayerStack;
pub use lin_reg::{LinRegError, SolveMethod, TikhonovRegularization};
pub use params::CellParams;
pub use readout::RidgeReadout;
pub use reservoir_constructor::ReservoirConstructor;
pub use stack_params::{FeatureWidth, StackParams};
pub use stacked_esn::{Phase, StackedEsn};
