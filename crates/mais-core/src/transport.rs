//! The transport seam shared by every resource family.
//!
//! Resource clients never talk to reqwest directly. They hand a fully built
//! [`Url`] to a [`Transport`] and run the reply through [`check_status`],
//! which owns the one status-code-to-error mapping for the whole service.

use std::{fs, path::Path, time::Duration};

use reqwest::{
  Identity,
  blocking::Client,
  header::{ACCEPT, HeaderMap, HeaderValue},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

use crate::error::{Error, Result};

/// Substring the service puts in a 400 body when the addressed resource
/// exists but has been deactivated.
pub const INACTIVE_MARKER: &str = "is inactive";

// ─── Requests and responses ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
  Get,
  Post,
  Put,
  Delete,
}

impl From<Method> for reqwest::Method {
  fn from(method: Method) -> Self {
    match method {
      Method::Get => reqwest::Method::GET,
      Method::Post => reqwest::Method::POST,
      Method::Put => reqwest::Method::PUT,
      Method::Delete => reqwest::Method::DELETE,
    }
  }
}

/// A fully buffered reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
  pub status: u16,
  pub body:   String,
}

impl Response {
  pub fn new(status: u16, body: impl Into<String>) -> Self {
    Self { status, body: body.into() }
  }

  pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }

  pub fn text(&self) -> &str { &self.body }

  pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
    Ok(serde_json::from_str(&self.body)?)
  }

  pub fn json_value(&self) -> Result<Value> { self.json() }

  /// The service's own error text: the `message` field of a JSON body when
  /// there is one, otherwise the raw body.
  pub fn message(&self) -> String {
    serde_json::from_str::<Value>(&self.body)
      .ok()
      .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
      .unwrap_or_else(|| self.body.trim().to_owned())
  }
}

// ─── Transport trait ──────────────────────────────────────────────────────────

/// Something that can carry one JSON request to the directory service.
///
/// Implementations report only transport-level failures. Non-2xx replies are
/// returned as ordinary [`Response`]s and classified by [`check_status`].
pub trait Transport {
  fn execute(&self, method: Method, url: &Url, body: Option<&Value>) -> Result<Response>;

  fn get(&self, url: &Url) -> Result<Response> { self.execute(Method::Get, url, None) }

  fn post(&self, url: &Url, body: &Value) -> Result<Response> {
    self.execute(Method::Post, url, Some(body))
  }

  fn put(&self, url: &Url, body: &Value) -> Result<Response> {
    self.execute(Method::Put, url, Some(body))
  }

  fn delete(&self, url: &Url, body: Option<&Value>) -> Result<Response> {
    self.execute(Method::Delete, url, body)
  }
}

/// Map a reply onto the shared error vocabulary. `subject` names the
/// resource the request was about and ends up in the error.
pub fn check_status(response: Response, subject: &str) -> Result<Response> {
  match response.status {
    200..=299 => Ok(response),
    400 if is_inactive_signal(&response) => {
      warn!(subject, "upstream reports the resource as inactive");
      Err(Error::SoftDeleted(subject.to_owned()))
    }
    400 | 500 => {
      let message = response.message();
      error!(subject, status = response.status, %message, "upstream API error");
      Err(Error::UpstreamFailure(message))
    }
    401 | 403 => {
      warn!(subject, status = response.status, "permission denied by upstream");
      Err(Error::PermissionDenied(subject.to_owned()))
    }
    404 => Err(Error::NotFound(subject.to_owned())),
    409 => Err(Error::AlreadyExists(subject.to_owned())),
    status => {
      error!(subject, status, "unrecognized response from upstream");
      Err(Error::UnrecognizedResponse { status, body: response.body })
    }
  }
}

fn is_inactive_signal(response: &Response) -> bool {
  response.body.to_ascii_lowercase().contains(INACTIVE_MARKER)
}

// ─── reqwest implementation ───────────────────────────────────────────────────

/// Connect and read timeouts, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Timeout {
  pub connect: f64,
  pub read:    f64,
}

impl Timeout {
  pub fn uniform(seconds: f64) -> Self { Self { connect: seconds, read: seconds } }
}

/// Client-certificate authenticated HTTPS transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
  client: Client,
}

impl HttpTransport {
  /// `cert` is a PEM file holding the client certificate, and also the
  /// private key unless a separate `key` file is given.
  pub fn new(cert: &Path, key: Option<&Path>, timeout: Option<Timeout>) -> Result<Self> {
    let mut pem = fs::read(cert)?;
    if let Some(key) = key {
      pem.push(b'\n');
      pem.extend(fs::read(key)?);
    }
    let identity = Identity::from_pem(&pem)?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let mut builder = Client::builder().identity(identity).default_headers(headers);
    if let Some(timeout) = timeout {
      builder = builder
        .connect_timeout(Duration::from_secs_f64(timeout.connect))
        .timeout(Duration::from_secs_f64(timeout.connect + timeout.read));
    }

    Ok(Self { client: builder.build()? })
  }
}

impl Transport for HttpTransport {
  fn execute(&self, method: Method, url: &Url, body: Option<&Value>) -> Result<Response> {
    debug!(%method, %url, "sending request");
    let mut request = self.client.request(method.into(), url.clone());
    if let Some(body) = body {
      request = request.json(body);
    }
    let response = request.send()?;
    let status = response.status().as_u16();
    let body = response.text()?;
    debug!(%method, %url, status, "received response");
    Ok(Response { status, body })
  }
}
