//! Agent directories for external tools and peer agents.

mod configured;

pub use configured::ConfiguredDirectory;
