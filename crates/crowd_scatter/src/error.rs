//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! missing scene resources, structural graph defects, invalid configuration,
//! cycles, and operations the host contract does not support yet.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("missing scene resource '{name}'")]
    MissingResource { name: String },

    #[error("structural error: {0}")]
    Structural(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cycle detected at node '{node}'")]
    Cycle { node: String },

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("{0}")]
    Other(String),
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
        matches!(err, Error::Other(_))
            .then_some(())
            .expect("expected Other variant");
    }

    #[test]
    fn missing_resource_names_the_resource() {
        let err = Error::MissingResource {
            name: "Guard".into(),
        };
        assert_eq!(err.to_string(), "missing scene resource 'Guard'");
    }
}
