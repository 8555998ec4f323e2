//! The graceful-degradation outcome shared by every retrieval entry point.
//!
//! Scripture grounding improves a reply but is never required to produce
//! one. Operations that can lose their data source or embedding backend
//! therefore return an [`Outcome`]: either the real value, or a fallback value
//! together with the reason it is a fallback. Callers that only want the
//! value call [`Outcome::into_inner`]; callers that want to surface or count
//! degradation inspect [`Outcome::reason`].

use std::fmt;

/// Why an operation fell back to its degraded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    /// The embedding backend failed for the query.
    EmbeddingUnavailable(String),
    /// The index holds no entries, so nothing can be retrieved.
    IndexEmpty,
    /// The verse data could not be loaded.
    DataUnavailable(String),
    /// The index rejected the query (for example a dimension mismatch).
    IndexUnavailable(String),
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmbeddingUnavailable(msg) => write!(f, "embedding unavailable: {msg}"),
            Self::IndexEmpty => write!(f, "index is empty"),
            Self::DataUnavailable(msg) => write!(f, "verse data unavailable: {msg}"),
            Self::IndexUnavailable(msg) => write!(f, "index unavailable: {msg}"),
        }
    }
}

/// A value that is either authoritative or a degraded fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The operation succeeded.
    Ok(T),
    /// The operation fell back to `value` because of `reason`.
    Degraded {
        /// The fallback value, e.g. an empty passage list.
        value: T,
        /// Why the fallback was used.
        reason: DegradeReason,
    },
}

impl<T> Outcome<T> {
    pub fn degraded(value: T, reason: DegradeReason) -> Self {
        Self::Degraded { value, reason }
    }

    /// The value, whether authoritative or fallback.
    pub fn value(&self) -> &T {
        match self {
            Self::Ok(value) | Self::Degraded { value, .. } => value,
        }
    }

    /// Consume the outcome and return its value.
    pub fn into_inner(self) -> T {
        match self {
            Self::Ok(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&DegradeReason> {
        match self {
            Self::Ok(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }

    /// Transform the value, keeping the degradation state.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Ok(value) => Outcome::Ok(f(value)),
            Self::Degraded { value, reason } => Outcome::Degraded { value: f(value), reason },
        }
    }
}

impl<T: Default> Outcome<T> {
    /// A degraded outcome carrying `T::default()`.
    pub fn fallback(reason: DegradeReason) -> Self {
        Self::degraded(T::default(), reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_carries_fallback_value() {
        let outcome: Outcome<Vec<u32>> = Outcome::fallback(DegradeReason::IndexEmpty);
        assert!(outcome.is_degraded());
        assert_eq!(outcome.reason(), Some(&DegradeReason::IndexEmpty));
        assert!(outcome.into_inner().is_empty());
    }

    #[test]
    fn map_keeps_state() {
        let ok = Outcome::Ok(vec![1, 2]).map(|v| v.len());
        assert_eq!(ok, Outcome::Ok(2));

        let degraded = Outcome::degraded(vec![0u8; 0], DegradeReason::IndexEmpty).map(|v| v.len());
        assert_eq!(*degraded.value(), 0);
        assert!(degraded.is_degraded());
    }
}
