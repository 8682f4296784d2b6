//! Authentication outcomes and the denial taxonomy.
//!
//! Every request ends in exactly one [`Outcome`]. Denials are ordinary
//! values, not errors; the only fault that is caught and converted is an
//! identity-provider failure, which becomes [`DenyReason::InternalError`].

use uuid::Uuid;

use super::identity::Principal;
use super::token_store::SessionToken;

/// Why a request was denied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenyReason {
    /// Secondary-factor verification rejected the credential.
    InvalidCredential,
    /// Wrong method on the login or logout endpoint; a protocol-shape error,
    /// not a credential error.
    NotASubmission,
    /// No usable credentials on a protected path.
    Unauthenticated,
    /// Explicit end of session; not an error to the caller.
    LoggedOut,
    /// A collaborator faulted; logged, never propagated past the gateway.
    InternalError,
}

impl DenyReason {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::InvalidCredential => "invalid_credential",
            Self::NotASubmission => "not_a_submission",
            Self::Unauthenticated => "unauthenticated",
            Self::LoggedOut => "logged_out",
            Self::InternalError => "internal_error",
        }
    }
}

/// Terminal result of the per-request state machine.
#[derive(Clone, Debug)]
pub enum Outcome {
    Authenticated {
        principal: Principal,
        token: SessionToken,
    },
    RequiresSecondaryFactor {
        challenge_id: Uuid,
    },
    Denied {
        reason: DenyReason,
    },
}

impl Outcome {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Authenticated { .. } => "authenticated",
            Self::RequiresSecondaryFactor { .. } => "requires_secondary_factor",
            Self::Denied { reason } => reason.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deny_reasons_have_distinct_labels() {
        let reasons = [
            DenyReason::InvalidCredential,
            DenyReason::NotASubmission,
            DenyReason::Unauthenticated,
            DenyReason::LoggedOut,
            DenyReason::InternalError,
        ];
        for (i, a) in reasons.iter().enumerate() {
            for b in reasons.iter().skip(i + 1) {
                assert_ne!(a.as_str(), b.as_str());
            }
        }
    }

    #[test]
    fn outcome_labels_follow_reason() {
        let denied = Outcome::Denied {
            reason: DenyReason::LoggedOut,
        };
        assert_eq!(denied.label(), "logged_out");
        let challenge = Outcome::RequiresSecondaryFactor {
            challenge_id: Uuid::new_v4(),
        };
        assert_eq!(challenge.label(), "requires_secondary_factor");
    }
}
