//! Error types for the public surface of this crate.
//!
//! Internally, functions return `Res<T>` (an `anyhow::Result`) and attach context as they go. At
//! the public boundary, errors are tagged with an `ErrorType` so that callers can tell a failed
//! fetch (which aborts the run) from a failed delivery (which does not).

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

pub(crate) type Res<T> = anyhow::Result<T>;

/// The `Result` type returned by the public functions of this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies an `Error` by the stage of the pipeline where it occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The configuration was missing or invalid.
    Config,
    /// The upstream transactions API could not be queried.
    Api,
    /// A message could not be delivered to the webhook.
    Delivery,
    /// Anything else.
    Internal,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// An error with an `ErrorType` attached.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub(crate) fn new(error_type: ErrorType, inner: anyhow::Error) -> Self {
        Self { error_type, inner }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // The alternate form prints the whole context chain on one line.
        write!(f, "{} error: {:#}", self.error_type, self.inner)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Error")
            .field("error_type", &self.error_type)
            .field("inner", &self.inner)
            .finish()
    }
}

impl std::error::Error for Error {}

impl From<anyhow::Error> for Error {
    fn from(inner: anyhow::Error) -> Self {
        Self::new(ErrorType::Internal, inner)
    }
}

/// Converts an internal `Res<T>` into a public `Result<T>` tagged with `error_type`.
pub trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T> IntoResult<T> for Res<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|inner| Error::new(error_type, inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[test]
    fn test_pub_result_tags_error() {
        let res: Res<()> = Err(anyhow!("connection refused")).context("Unable to query account");
        let err = res.pub_result(ErrorType::Api).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Api);
        let message = err.to_string();
        assert!(message.starts_with("api error: "), "{message}");
        assert!(message.contains("Unable to query account"));
        assert!(message.contains("connection refused"));
    }

    #[test]
    fn test_pub_result_passes_ok_through() {
        let res: Res<u8> = Ok(7);
        assert_eq!(res.pub_result(ErrorType::Delivery).unwrap(), 7);
    }

    #[test]
    fn test_from_anyhow_is_internal() {
        let err: Error = anyhow!("boom").into();
        assert_eq!(err.error_type(), ErrorType::Internal);
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::Delivery.to_string(), "delivery");
        assert_eq!(ErrorType::Config.to_string(), "config");
    }
}
