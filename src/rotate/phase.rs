// Keyrotator - Rotation phase state machine
//
// Pending -> Created -> Propagated -> Revoked, with Failed reachable from any
// non-terminal phase. There are no backward transitions: a failed rotation
// is never rolled back, it is left for an operator or the next run.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationPhase {
    Pending,
    Created,
    Propagated,
    Revoked,
    Failed,
}

impl RotationPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            RotationPhase::Pending => "pending",
            RotationPhase::Created => "created",
            RotationPhase::Propagated => "propagated",
            RotationPhase::Revoked => "revoked",
            RotationPhase::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RotationPhase::Revoked | RotationPhase::Failed)
    }

    /// Whether the protocol allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: RotationPhase) -> bool {
        use RotationPhase::*;
        match (self, next) {
            (Pending, Created) | (Created, Propagated) | (Propagated, Revoked) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for RotationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RotationPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RotationPhase::Pending),
            "created" => Ok(RotationPhase::Created),
            "propagated" => Ok(RotationPhase::Propagated),
            "revoked" => Ok(RotationPhase::Revoked),
            "failed" => Ok(RotationPhase::Failed),
            other => Err(format!("unknown rotation phase '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RotationPhase::*;
    use super::*;

    #[test]
    fn test_forward_transitions_only() {
        assert!(Pending.can_transition_to(Created));
        assert!(Created.can_transition_to(Propagated));
        assert!(Propagated.can_transition_to(Revoked));

        assert!(!Pending.can_transition_to(Propagated), "cannot skip creation");
        assert!(!Created.can_transition_to(Revoked), "cannot revoke before propagation");
        assert!(!Propagated.can_transition_to(Created), "no backward transitions");
    }

    #[test]
    fn test_failure_from_non_terminal_phases() {
        for phase in [Pending, Created, Propagated] {
            assert!(phase.can_transition_to(Failed), "{phase} -> failed");
        }
        assert!(!Revoked.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Failed));
    }

    #[test]
    fn test_phase_string_roundtrip() {
        for phase in [Pending, Created, Propagated, Revoked, Failed] {
            assert_eq!(phase.as_str().parse::<RotationPhase>().unwrap(), phase);
        }
        assert!("exploded".parse::<RotationPhase>().is_err());
    }
}
