//! Field mapping status lifecycle.
//!
//! ```text
//! draft -> approved -> active -> deprecated
//!              \__________________^
//! ```
//!
//! Status only moves forward. Nothing returns to `draft`, and `deprecated`
//! is terminal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingStatus {
    Draft,
    Approved,
    Active,
    Deprecated,
}

/// Field mapping errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error("cannot move mapping from {from} to {to}")]
    InvalidTransition {
        from: MappingStatus,
        to: MappingStatus,
    },

    #[error("mapping is {0}; only draft mappings can be edited")]
    NotEditable(MappingStatus),

    #[error("mapping status changed from {expected} while updating")]
    StatusChanged { expected: MappingStatus },

    #[error("unknown mapping status '{0}'")]
    UnknownStatus(String),
}

impl MappingError {
    pub fn error_type(&self) -> &'static str {
        match self {
            MappingError::InvalidTransition { .. } => "invalid_transition",
            MappingError::NotEditable(_) => "not_editable",
            MappingError::StatusChanged { .. } => "status_changed",
            MappingError::UnknownStatus(_) => "unknown_status",
        }
    }
}

impl MappingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingStatus::Draft => "draft",
            MappingStatus::Approved => "approved",
            MappingStatus::Active => "active",
            MappingStatus::Deprecated => "deprecated",
        }
    }

    pub fn can_transition_to(&self, next: MappingStatus) -> bool {
        use MappingStatus::*;
        matches!(
            (self, next),
            (Draft, Approved) | (Approved, Active) | (Approved, Deprecated) | (Active, Deprecated)
        )
    }

    /// Validate a move to `next`
    pub fn transition(self, next: MappingStatus) -> Result<MappingStatus, MappingError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(MappingError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn is_editable(&self) -> bool {
        *self == MappingStatus::Draft
    }
}

impl fmt::Display for MappingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MappingStatus {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(MappingStatus::Draft),
            "approved" => Ok(MappingStatus::Approved),
            "active" => Ok(MappingStatus::Active),
            "deprecated" => Ok(MappingStatus::Deprecated),
            other => Err(MappingError::UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MappingStatus::*;

    const ALL: [MappingStatus; 4] = [Draft, Approved, Active, Deprecated];

    #[test]
    fn test_forward_path() {
        let status = Draft.transition(Approved).unwrap();
        let status = status.transition(Active).unwrap();
        let status = status.transition(Deprecated).unwrap();
        assert_eq!(status, Deprecated);
    }

    #[test]
    fn test_approved_can_be_deprecated_directly() {
        assert_eq!(Approved.transition(Deprecated), Ok(Deprecated));
    }

    #[test]
    fn test_nothing_returns_to_draft() {
        for from in ALL {
            assert!(!from.can_transition_to(Draft), "{} -> draft", from);
        }
    }

    #[test]
    fn test_deprecated_is_terminal() {
        for to in ALL {
            assert!(!Deprecated.can_transition_to(to));
        }
    }

    #[test]
    fn test_no_skipping_approval_or_going_back() {
        assert_eq!(
            Draft.transition(Active),
            Err(MappingError::InvalidTransition {
                from: Draft,
                to: Active
            })
        );
        assert!(!Draft.can_transition_to(Deprecated));
        assert!(!Active.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Approved));
    }

    #[test]
    fn test_only_drafts_are_editable() {
        assert!(Draft.is_editable());
        assert!(!Approved.is_editable());
        assert!(!Active.is_editable());
    }

    #[test]
    fn test_status_names() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<MappingStatus>(), Ok(status));
        }
        assert_eq!(
            "retired".parse::<MappingStatus>(),
            Err(MappingError::UnknownStatus("retired".to_string()))
        );
        assert_eq!(
            MappingError::InvalidTransition {
                from: Active,
                to: Draft
            }
            .to_string(),
            "cannot move mapping from active to draft"
        );
    }
}
