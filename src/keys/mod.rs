// Keyrotator - Keys Module
//
// Discovered cloud keys, the freshly minted credential that replaces them,
// and the provider seam used to list, create and delete keys.

mod error;
pub mod gcp;
mod models;
pub mod provider;

pub use error::KeyError;
pub use gcp::GcpKeyProvider;
pub use models::{Key, NewCredential, ProviderRef};
pub use provider::{KeyProvider, ProviderSet};
