//! Per-extension activation state within one boot.

use std::fmt;

use serde::Serialize;

/// Why an extension was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectionReason {
    InvalidId,
    DeclarationFailed,
    PreActivationFailed,
    ActivationFailed,
    RegistrationFailed,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "invalid id"),
            Self::DeclarationFailed => write!(f, "declaration could not be read"),
            Self::PreActivationFailed => write!(f, "pre-activation check failed"),
            Self::ActivationFailed => write!(f, "activation failed"),
            Self::RegistrationFailed => write!(f, "registration failed"),
        }
    }
}

/// Where an extension stands in the activation pipeline.
///
/// ```text
/// Discovered -> IdValidated -> DependencyEligible -> PreActivationChecked
///            -> Activated -> Registered -> Postprocessed
/// ```
///
/// Every extension enters as `Discovered` (the default) before its id is
/// checked. `Parked` extensions are known but not loaded. `Rejected` is
/// terminal and reachable from any step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "kebab-case")]
pub enum ExtensionState {
    #[default]
    Discovered,
    IdValidated,
    DependencyEligible,
    PreActivationChecked,
    Activated,
    Registered,
    Postprocessed,
    Parked,
    Rejected(RejectionReason),
}

impl ExtensionState {
    /// Whether the extension contributed to the catalog.
    pub fn is_registered(self) -> bool {
        matches!(self, Self::Registered | Self::Postprocessed)
    }

    pub fn is_rejected(self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

impl fmt::Display for ExtensionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovered => write!(f, "discovered"),
            Self::IdValidated => write!(f, "id validated"),
            Self::DependencyEligible => write!(f, "dependency eligible"),
            Self::PreActivationChecked => write!(f, "pre-activation checked"),
            Self::Activated => write!(f, "activated"),
            Self::Registered => write!(f, "registered"),
            Self::Postprocessed => write!(f, "postprocessed"),
            Self::Parked => write!(f, "parked"),
            Self::Rejected(reason) => write!(f, "rejected ({reason})"),
        }
    }
}
