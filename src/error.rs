use thiserror::Error;

/// The category of an export failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HalaExportErrorKind {
  /// The background worker could not be created.
  Device,
  /// A directory or file operation failed.
  FileSystem,
  /// The mesh could not be encoded to the target format.
  Serialization,
  /// An image could not be converted or encoded.
  Image,
  /// The output directory could not be archived.
  Archive,
  /// A fragment buffer does not match its declared layout.
  Geometry,
  /// The export description could not be read.
  Config,
  /// The background worker went away before reporting a result.
  Worker,
}

/// The error type of the hala-scan-export crate.
#[derive(Error, Debug)]
pub struct HalaExportError {
  kind: HalaExportErrorKind,
  msg: String,
  #[source]
  source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// The implementation of the error type of the hala-scan-export crate.
impl HalaExportError {
  /// Create a new error.
  /// param kind: The category of the error.
  /// param msg: The message of the error.
  /// param source: The source of the error.
  /// return: The error.
  pub fn new(kind: HalaExportErrorKind, msg: &str, source: Option<Box<dyn std::error::Error + Send + Sync>>) -> Self {
    Self {
      kind,
      msg: msg.to_string(),
      source,
    }
  }

  pub fn kind(&self) -> HalaExportErrorKind {
    self.kind
  }

  pub fn message(&self) -> &str {
    &self.msg
  }
}

/// The implementation Display trait for the error type of the hala-scan-export crate.
impl std::fmt::Display for HalaExportError {
  /// Format the error.
  /// param f: The formatter.
  /// return: The result.
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.msg)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::error::Error;

  #[test]
  fn test_error_keeps_kind_and_source() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err = HalaExportError::new(HalaExportErrorKind::FileSystem, "Create directory \"out\" failed.", Some(Box::new(io)));
    assert_eq!(err.kind(), HalaExportErrorKind::FileSystem);
    assert_eq!(err.to_string(), "Create directory \"out\" failed.");
    assert!(err.source().is_some());
  }
}
