// Keyrotator - Rotation Module
//
// The rotation decision-and-execution engine: which discovered keys are
// eligible, which of those are due, and the create -> propagate -> revoke
// protocol that replaces them.

mod candidates;
mod error;
mod executor;
mod filter;
mod phase;
mod run;

pub use candidates::{rotation_candidates, RotationCandidate};
pub use error::RotationError;
pub use executor::{Executor, RotationOutcome};
pub use filter::filter_keys;
pub use phase::RotationPhase;
pub use run::{key_providers, validate_flags, RunOptions, RunSummary, Rotator};
