//! This crate provides the funcionality shared by reservoirs and readouts

#![deny(unused_imports, unused_crate_dependencies)]
#![warn(missing_docs)]

mod activation;
mod error;
mod rc_trait;

pub use activation::Activation;
pub use error::{Error, Result};
pub use rc_trait::{Readout, ReservoirCell, Sequence};
