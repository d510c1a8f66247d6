//! [`MaisClient`]: base URLs per API family plus a shared transport.

use std::{collections::BTreeMap, fmt, path::Path, rc::Rc};

use serde::Deserialize;
use url::Url;

use crate::{
  config::{Environment, MaisConfig},
  error::{Error, Result},
  transport::{HttpTransport, Timeout, Transport},
};

/// The MaIS API families a client can hold a base URL for.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApiFamily {
  Account,
  Course,
  Person,
  Privilege,
  Student,
  Workgroup,
}

/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct MaisClient {
  urls:      Rc<BTreeMap<ApiFamily, Url>>,
  transport: Rc<dyn Transport>,
}

impl MaisClient {
  pub fn new(urls: BTreeMap<ApiFamily, Url>, transport: Rc<dyn Transport>) -> Self {
    Self { urls: Rc::new(urls), transport }
  }

  pub fn prod(cert: &Path, key: Option<&Path>, timeout: Option<Timeout>) -> Result<Self> {
    Self::for_environment(Environment::Prod, cert, key, timeout)
  }

  pub fn uat(cert: &Path, key: Option<&Path>, timeout: Option<Timeout>) -> Result<Self> {
    Self::for_environment(Environment::Uat, cert, key, timeout)
  }

  /// UAT1 only serves the account, person and privilege families.
  pub fn uat1(cert: &Path, key: Option<&Path>, timeout: Option<Timeout>) -> Result<Self> {
    Self::for_environment(Environment::Uat1, cert, key, timeout)
  }

  fn for_environment(
    environment: Environment,
    cert: &Path,
    key: Option<&Path>,
    timeout: Option<Timeout>,
  ) -> Result<Self> {
    let transport = HttpTransport::new(cert, key, timeout)?;
    Ok(Self::new(environment.urls()?, Rc::new(transport)))
  }

  pub fn from_config(config: &MaisConfig) -> Result<Self> {
    let transport = HttpTransport::new(&config.cert, config.key.as_deref(), config.timeout)?;
    Ok(Self::new(config.resolved_urls()?, Rc::new(transport)))
  }

  pub fn transport(&self) -> &dyn Transport { self.transport.as_ref() }

  pub fn base_url(&self, family: ApiFamily) -> Result<&Url> {
    self
      .urls
      .get(&family)
      .ok_or_else(|| Error::malformed("api family", format!("no base URL configured for {family}")))
  }

  /// Append `segments` to the family's base URL and encode `query`.
  pub fn url(&self, family: ApiFamily, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
    let mut url = self.base_url(family)?.clone();
    {
      let mut path = url
        .path_segments_mut()
        .map_err(|()| Error::malformed("base url", format!("{family} URL cannot take a path")))?;
      path.pop_if_empty();
      path.extend(segments);
    }
    if !query.is_empty() {
      url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
  }
}

impl fmt::Debug for MaisClient {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MaisClient").field("urls", &self.urls).finish_non_exhaustive()
  }
}
