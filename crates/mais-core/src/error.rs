//! Error types for `mais-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed {field}: {reason}")]
  MalformedInput { field: &'static str, reason: String },

  #[error("not found: {0}")]
  NotFound(String),

  #[error("already exists: {0}")]
  AlreadyExists(String),

  #[error("{0} exists upstream but has been deactivated")]
  SoftDeleted(String),

  #[error("workgroup {0} has been deleted")]
  Deleted(String),

  #[error("permission denied: {0}")]
  PermissionDenied(String),

  #[error("upstream failure: {0}")]
  UpstreamFailure(String),

  #[error("unrecognized response (HTTP {status}): {body}")]
  UnrecognizedResponse { status: u16, body: String },

  #[error("request timed out: {0}")]
  Timeout(String),

  #[error("the owning workgroup is no longer alive")]
  OwnerGone,

  #[error("unexpected response shape: {0}")]
  Decode(String),

  #[error("invalid url: {0}")]
  Url(#[from] url::ParseError),

  #[error("serialization error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),

  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("transport error: {0}")]
  Transport(#[source] reqwest::Error),
}

impl Error {
  pub fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
    Self::MalformedInput { field, reason: reason.into() }
  }

  /// True for every kind a caller should treat as "no such resource".
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::NotFound(_) | Self::SoftDeleted(_))
  }

  pub fn is_malformed(&self) -> bool { matches!(self, Self::MalformedInput { .. }) }
}

impl From<reqwest::Error> for Error {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      Self::Timeout(err.to_string())
    } else {
      Self::Transport(err)
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
