// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for chordlab.
//!
//! The generative engine is lenient by default: unknown selectors are
//! replaced by a safe default and logged. Callers that want hard failures
//! select [`SelectorPolicy::Strict`] and receive an [`InvalidSelectorError`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A selector string (key, mode, chord type, pattern id...) that could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSelectorError {
    #[error("unknown key: {0}")]
    Key(String),
    #[error("unknown mode: {0}")]
    Mode(String),
    #[error("unknown chord type: {0}")]
    ChordType(String),
    #[error("unknown rhythm pattern: {0}")]
    RhythmPattern(String),
    #[error("unknown arpeggio pattern: {0}")]
    ArpeggioPattern(String),
    #[error("unknown quantize option: {0}")]
    Quantize(String),
    #[error("no chord types enabled")]
    NoChordTypes,
    #[error("unsupported chord count: {0}")]
    ChordCount(usize),
}

/// How unresolvable selectors are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorPolicy {
    /// Substitute the documented default and keep going
    #[default]
    Lenient,
    /// Surface an [`InvalidSelectorError`]
    Strict,
}

impl SelectorPolicy {
    /// Resolve a parse result under this policy.
    ///
    /// In lenient mode `fallback` is returned (and a warning logged) when
    /// `parsed` is `None`; in strict mode `error` is returned instead.
    pub fn resolve<T: std::fmt::Debug>(
        self,
        parsed: Option<T>,
        fallback: T,
        error: InvalidSelectorError,
    ) -> Result<T, InvalidSelectorError> {
        match (parsed, self) {
            (Some(value), _) => Ok(value),
            (None, SelectorPolicy::Strict) => Err(error),
            (None, SelectorPolicy::Lenient) => {
                tracing::warn!("{}; using {:?}", error, fallback);
                Ok(fallback)
            }
        }
    }

    pub fn is_strict(self) -> bool {
        self == SelectorPolicy::Strict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_falls_back() {
        let value = SelectorPolicy::Lenient
            .resolve(None, 4u8, InvalidSelectorError::Quantize("whole".into()))
            .unwrap();
        assert_eq!(value, 4);
    }

    #[test]
    fn test_strict_surfaces_error() {
        let err = SelectorPolicy::Strict
            .resolve(None, 4u8, InvalidSelectorError::Quantize("whole".into()))
            .unwrap_err();
        assert_eq!(err, InvalidSelectorError::Quantize("whole".into()));
        assert_eq!(err.to_string(), "unknown quantize option: whole");
    }

    #[test]
    fn test_parsed_value_wins() {
        let value = SelectorPolicy::Strict
            .resolve(Some(2u8), 4, InvalidSelectorError::Quantize("eighth".into()))
            .unwrap();
        assert_eq!(value, 2);
    }
}
