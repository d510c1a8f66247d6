//! Client configuration, loaded from an optional TOML file and `MAIS__*`
//! environment variables.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use serde::Deserialize;
use url::Url;

use crate::{
  client::ApiFamily,
  error::{Error, Result},
  logging::LogConfig,
  transport::Timeout,
};

/// Which built-in URL table to start from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
  #[default]
  Prod,
  Uat,
  Uat1,
  /// No built-in URLs; everything comes from `urls`.
  Custom,
}

const PROD: &[(ApiFamily, &str)] = &[
  (ApiFamily::Account, "https://accountws.stanford.edu/accounts/"),
  (ApiFamily::Course, "https://registry.stanford.edu/doc/courseclass/"),
  (ApiFamily::Person, "https://registry.stanford.edu/doc/person/"),
  (ApiFamily::Privilege, "https://registry.stanford.edu/doc/privileges/"),
  (ApiFamily::Student, "https://studentws.stanford.edu/v1/person/"),
  (ApiFamily::Workgroup, "https://aswsweb.stanford.edu/mais/workgroupsvc/workgroups/2.0"),
];

const UAT: &[(ApiFamily, &str)] = &[
  (ApiFamily::Account, "https://accountws-uat.stanford.edu/accounts/"),
  (ApiFamily::Course, "https://registry-uat.stanford.edu/doc/courseclass/"),
  (ApiFamily::Person, "https://registry-uat.stanford.edu/doc/person/"),
  (ApiFamily::Privilege, "https://registry-uat.stanford.edu/doc/privileges/"),
  (ApiFamily::Student, "https://studentws-uat.stanford.edu/v1/person/"),
  (ApiFamily::Workgroup, "https://aswsuat.stanford.edu/mais/workgroupsvc/workgroups/2.0/"),
];

const UAT1: &[(ApiFamily, &str)] = &[
  (ApiFamily::Account, "https://accountws-uat.stanford.edu/accounts/"),
  (ApiFamily::Person, "https://registry-uat.stanford.edu/doc/person/"),
  (ApiFamily::Privilege, "https://registry-uat.stanford.edu/doc/privileges/"),
];

impl Environment {
  pub fn urls(self) -> Result<BTreeMap<ApiFamily, Url>> {
    let table = match self {
      Self::Prod => PROD,
      Self::Uat => UAT,
      Self::Uat1 => UAT1,
      Self::Custom => &[],
    };
    table
      .iter()
      .map(|(family, url)| Ok::<_, Error>((*family, Url::parse(url)?)))
      .collect()
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaisConfig {
  #[serde(default)]
  pub environment: Environment,
  /// Per-family overrides applied on top of the environment's table.
  #[serde(default)]
  pub urls:        BTreeMap<ApiFamily, String>,
  pub cert:        PathBuf,
  #[serde(default)]
  pub key:         Option<PathBuf>,
  #[serde(default)]
  pub timeout:     Option<Timeout>,
  #[serde(default)]
  pub log:         LogConfig,
}

impl MaisConfig {
  /// Layer `path` (when given) under `MAIS__*` environment variables.
  pub fn load(path: Option<&Path>) -> Result<Self> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
      builder = builder.add_source(config::File::from(path).required(true));
    }
    let settings = builder
      .add_source(config::Environment::with_prefix("MAIS").separator("__"))
      .build()?;
    Ok(settings.try_deserialize()?)
  }

  pub fn resolved_urls(&self) -> Result<BTreeMap<ApiFamily, Url>> {
    let mut urls = self.environment.urls()?;
    for (family, url) in &self.urls {
      urls.insert(*family, Url::parse(url)?);
    }
    Ok(urls)
  }
}
