// Keyrotator - Library root
//
// Cloud key discovery, filtering and rotation, with propagation of the new
// key to CI, VCS and cluster secret stores.

pub mod cli;
pub mod config;
pub mod error;
pub mod journal;
pub mod keys;
pub mod location;
pub mod metrics;
pub mod rotate;

pub use error::RotatorError;
