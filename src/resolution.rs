//! Distinguishing authoritative values from fail-open fallbacks.

use crate::Error;

/// Outcome of a high-level configuration lookup.
///
/// The client never raises resolution failures to callers; when the backend
/// is unreachable it hands back a conservative default so feature code keeps
/// working. `Resolution` keeps the two cases distinguishable: callers that
/// care whether a value is authoritative can match on the variant, callers
/// that don't can collapse with [`Resolution::into_value`].
///
/// # Examples
/// ```
/// # use edflags::{Resolution, ChatConfig};
/// # fn handle(resolution: Resolution<ChatConfig>) {
/// if resolution.is_fallback() {
///     // backend unreachable; running on defaults
/// }
/// let config = resolution.into_value();
/// # }
/// ```
#[derive(Debug, Clone)]
pub enum Resolution<T> {
    /// Value resolved by the backend, or served from a fresh cache entry.
    Resolved(T),
    /// The backend could not be reached; carries the safe default along with
    /// the terminal error.
    Fallback(T, Error),
}

impl<T> Resolution<T> {
    /// The carried value, authoritative or not.
    pub fn value(&self) -> &T {
        match self {
            Resolution::Resolved(value) | Resolution::Fallback(value, _) => value,
        }
    }

    /// Consumes the resolution, returning the carried value.
    pub fn into_value(self) -> T {
        match self {
            Resolution::Resolved(value) | Resolution::Fallback(value, _) => value,
        }
    }

    /// Whether the value is a fail-open default rather than a backend answer.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolution::Fallback(..))
    }

    /// The error that forced the fallback, if any.
    pub fn error(&self) -> Option<&Error> {
        match self {
            Resolution::Resolved(_) => None,
            Resolution::Fallback(_, error) => Some(error),
        }
    }

    /// Maps the carried value, preserving the variant.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Resolved(value) => Resolution::Resolved(f(value)),
            Resolution::Fallback(value, error) => Resolution::Fallback(f(value), error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Resolution;
    use crate::Error;

    #[test]
    fn resolved_carries_value() {
        let resolution = Resolution::Resolved(7);
        assert!(!resolution.is_fallback());
        assert!(resolution.error().is_none());
        assert_eq!(*resolution.value(), 7);
        assert_eq!(resolution.into_value(), 7);
    }

    #[test]
    fn fallback_carries_value_and_error() {
        let resolution = Resolution::Fallback(0, Error::Uninitialized);
        assert!(resolution.is_fallback());
        assert!(matches!(resolution.error(), Some(Error::Uninitialized)));
        assert_eq!(resolution.into_value(), 0);
    }

    #[test]
    fn map_preserves_variant() {
        let resolved = Resolution::Resolved(2).map(|n| n * 10);
        assert!(matches!(resolved, Resolution::Resolved(20)));

        let fallback = Resolution::Fallback(2, Error::Uninitialized).map(|n| n * 10);
        assert!(fallback.is_fallback());
        assert_eq!(fallback.into_value(), 20);
    }
}
