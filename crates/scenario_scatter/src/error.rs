//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! rejected placement requests, invalid ranges, collision-profile restore mismatches,
//! malformed JSON and generic errors.
use thiserror::Error;

use crate::scene::ClassId;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no candidate classes were supplied")]
    EmptyCandidates,

    #[error("unknown object class '{id}'")]
    UnknownClass { id: ClassId },

    #[error("{name}: minimum {min} is greater than maximum {max}")]
    InvalidRange { name: String, min: f32, max: f32 },

    #[error(
        "collision profile mismatch for '{class}': snapshot holds {expected} components, found {found}"
    )]
    ProfileMismatch {
        class: ClassId,
        expected: usize,
        found: usize,
    },

    #[cfg(feature = "serde")]
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Builds an [`Error::InvalidRange`] when `min > max`.
    pub fn check_range(name: &str, min: f32, max: f32) -> Result<()> {
        if min > max {
            return Err(Error::InvalidRange {
                name: name.to_owned(),
                min,
                max,
            });
        }
        Ok(())
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_uses_other_variant() {
        let err: Error = String::from("boom").into();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn check_range_rejects_inverted_bounds() {
        assert!(Error::check_range("density", 0.5, 1.0).is_ok());
        assert!(Error::check_range("density", 1.0, 1.0).is_ok());
        let err = Error::check_range("rotation", 90.0, 10.0).unwrap_err();
        assert!(matches!(err, Error::InvalidRange { ref name, .. } if name == "rotation"));
        assert_eq!(
            err.to_string(),
            "rotation: minimum 90 is greater than maximum 10"
        );
    }

    #[test]
    fn profile_mismatch_message_names_class() {
        let err = Error::ProfileMismatch {
            class: "/Game/Props/Cone".into(),
            expected: 2,
            found: 3,
        };
        assert!(err.to_string().contains("/Game/Props/Cone"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn malformed_json_converts_transparently() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let message = source.to_string();
        let err: Error = source.into();
        assert!(matches!(err, Error::Json(_)));
        assert_eq!(err.to_string(), message);
    }
}
