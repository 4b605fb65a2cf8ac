//! Error taxonomy for the ripple workspace.
//!
//! Every failure the core can surface is one of three kinds: a bad
//! argument rejected at construction, an operation issued in the wrong
//! lifecycle state, or a supplier that never produced an initial image.
//! A supplier that misses a single frame after sizing is recovered
//! inside the engine and never reaches this type.

use std::error::Error;
use std::fmt;

/// Errors surfaced by ripple components.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RippleError {
    /// A parameter was outside its valid domain (touch strength outside
    /// `[0, 1]`, non-positive shape radius, out-of-bounds touch point).
    InvalidArgument {
        /// Description of the rejected argument.
        reason: String,
    },
    /// An operation was issued in a lifecycle state that does not permit
    /// it (stepping before sizing, sizing twice, using a disposed source).
    IllegalState {
        /// Description of the state violation.
        reason: String,
    },
    /// The image supplier produced no buffer before the engine size
    /// could be established.
    SupplierUnavailable,
}

impl RippleError {
    /// Shorthand for [`RippleError::InvalidArgument`].
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`RippleError::IllegalState`].
    pub fn illegal_state(reason: impl Into<String>) -> Self {
        Self::IllegalState {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RippleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
            Self::IllegalState { reason } => write!(f, "illegal state: {reason}"),
            Self::SupplierUnavailable => {
                write!(f, "image supplier produced no initial buffer")
            }
        }
    }
}

impl Error for RippleError {}
