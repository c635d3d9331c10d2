//! JSON configuration for the library parameters and the driver binary.

pub mod params;
pub mod runtime;

pub use params::{DensifyConfig, LatticeParams};
pub use runtime::{load_config, OutputConfig, RuntimeConfig};
