//! Typed failures raised by test bodies, checkpoint bodies and input
//! computations.
//!
//! A `Failure` is the only error type that crosses the boundary between
//! user code and the kernel. The kernel never swallows one: a failure
//! returned by a selected checkpoint, a test body, or an input computation
//! is propagated unmodified to the caller.

use crate::checkpoint::registry::CheckpointKey;

/// A failure surfaced by user code or by the kernel on its behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// A verification step did not hold.
    Assertion { detail: String },
    /// An input computation could not produce its value.
    Input { name: String, detail: String },
    /// The selected checkpoint call referenced a key this registry never
    /// wrapped. Discovery and replay saw different control flow.
    UnknownCheckpoint { key: CheckpointKey },
    /// A wrapped checkpoint was called after its registry was dropped.
    RegistryDropped { key: CheckpointKey },
    /// Input resolution recursed deeper than the configured bound.
    ResolutionDepthExceeded { name: String, max_depth: usize },
}

impl Failure {
    /// Shorthand for [`Failure::Assertion`].
    #[must_use]
    pub fn assertion(detail: impl Into<String>) -> Self {
        Self::Assertion {
            detail: detail.into(),
        }
    }

    /// Shorthand for [`Failure::Input`].
    #[must_use]
    pub fn input(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Input {
            name: name.into(),
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assertion { detail } => write!(f, "assertion failed: {detail}"),
            Self::Input { name, detail } => write!(f, "input `{name}` failed: {detail}"),
            Self::UnknownCheckpoint { key } => {
                write!(f, "selected call refers to unregistered {key}")
            }
            Self::RegistryDropped { key } => {
                write!(f, "{key} called after its registry was dropped")
            }
            Self::ResolutionDepthExceeded { name, max_depth } => {
                write!(
                    f,
                    "resolving `{name}` exceeded the maximum input depth of {max_depth}"
                )
            }
        }
    }
}

impl std::error::Error for Failure {}

/// Fail with `detail` unless `condition` holds.
///
/// # Errors
///
/// Returns [`Failure::Assertion`] when `condition` is false.
pub fn ensure(condition: bool, detail: impl FnOnce() -> String) -> Result<(), Failure> {
    if condition {
        Ok(())
    } else {
        Err(Failure::assertion(detail()))
    }
}

/// Fail unless `left == right`, describing both sides.
///
/// # Errors
///
/// Returns [`Failure::Assertion`] naming `what` when the values differ.
pub fn ensure_eq<T>(left: &T, right: &T, what: &str) -> Result<(), Failure>
where
    T: PartialEq + std::fmt::Debug + ?Sized,
{
    if left == right {
        Ok(())
    } else {
        Err(Failure::assertion(format!(
            "{what}: left={left:?} right={right:?}"
        )))
    }
}
