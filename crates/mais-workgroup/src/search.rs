//! Server-side workgroup searches and the lightweight results they return.

use chrono::{DateTime, NaiveDate, Utc};
use mais_core::{Error, Result, check_status};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{client::WorkgroupClient, date::parse_date, workgroup::Workgroup};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartialJson {
  name:        String,
  #[serde(default)]
  description: String,
  last_update: String,
}

#[derive(Debug, Deserialize)]
struct NameSearchJson {
  #[serde(default)]
  results: Vec<PartialJson>,
}

#[derive(Debug, Deserialize)]
struct RelatedSearchJson {
  #[serde(default)]
  members:        Vec<PartialJson>,
  #[serde(default)]
  administrators: Vec<PartialJson>,
}

/// A search hit: just enough to identify a workgroup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialWorkgroup {
  pub name:        String,
  pub description: String,
  pub last_update: NaiveDate,
  /// When the search ran.
  pub as_of:       DateTime<Utc>,
}

impl PartialWorkgroup {
  fn from_json(json: PartialJson, as_of: DateTime<Utc>) -> Result<Self> {
    Ok(Self {
      last_update: parse_date(&json.last_update)?,
      name: json.name,
      description: json.description,
      as_of,
    })
  }

  /// Fetch the full workgroup (from cache if it is live).
  pub fn workgroup(&self, client: &WorkgroupClient) -> Result<Workgroup> { client.get(&self.name) }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchByResults {
  pub is_member:        Vec<PartialWorkgroup>,
  pub is_administrator: Vec<PartialWorkgroup>,
}

/// What a member-of search looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SearchTarget {
  User,
  Certificate,
  Workgroup,
}

fn collect(entries: Vec<PartialJson>, as_of: DateTime<Utc>) -> Result<Vec<PartialWorkgroup>> {
  let mut found = entries
    .into_iter()
    .map(|json| PartialWorkgroup::from_json(json, as_of))
    .collect::<Result<Vec<_>>>()?;
  found.sort_by(|a, b| a.name.cmp(&b.name));
  found.dedup_by(|a, b| a.name == b.name);
  Ok(found)
}

impl WorkgroupClient {
  /// Workgroups whose names match `pattern`, where `*` is a wildcard. The
  /// pattern may not start with `*`.
  pub fn search_by_name(&self, pattern: &str) -> Result<Vec<PartialWorkgroup>> {
    if pattern.is_empty() {
      return Err(Error::malformed("search pattern", "empty"));
    }
    if pattern.starts_with('*') {
      return Err(Error::malformed("search pattern", "may not begin with '*'"));
    }
    info!(pattern, "searching workgroups by name");
    let url = self.url(&["search", pattern], &[])?;
    let as_of = Utc::now();
    let response = match check_status(self.transport().get(&url)?, pattern) {
      Ok(response) => response,
      Err(Error::NotFound(_)) => return Ok(Vec::new()),
      Err(e) => return Err(e),
    };
    let found = collect(response.json::<NameSearchJson>()?.results, as_of)?;
    debug!(pattern, hits = found.len(), "name search finished");
    Ok(found)
  }

  pub fn search_by_user(&self, id: &str) -> Result<SearchByResults> {
    self.search_by(SearchTarget::User, id)
  }

  pub fn search_by_certificate(&self, id: &str) -> Result<SearchByResults> {
    self.search_by(SearchTarget::Certificate, id)
  }

  pub fn search_by_workgroup(&self, name: &str) -> Result<SearchByResults> {
    self.search_by(SearchTarget::Workgroup, name)
  }

  /// Workgroups that `id` is directly a member or administrator of.
  pub fn search_by(&self, target: SearchTarget, id: &str) -> Result<SearchByResults> {
    if id.is_empty() {
      return Err(Error::malformed("search target", "empty"));
    }
    info!(%target, id, "searching workgroups by related entity");
    let url = self.url(&[], &[("type", target.as_ref()), ("id", id)])?;
    let as_of = Utc::now();
    let subject = format!("{target} {id}");
    let response = match check_status(self.transport().get(&url)?, &subject) {
      Ok(response) => response,
      Err(Error::NotFound(_)) => return Ok(SearchByResults::default()),
      Err(e) => return Err(e),
    };
    let json = response.json::<RelatedSearchJson>()?;
    Ok(SearchByResults {
      is_member: collect(json.members, as_of)?,
      is_administrator: collect(json.administrators, as_of)?,
    })
  }
}
