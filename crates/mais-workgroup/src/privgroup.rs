//! Privilege-group projection: the people a workgroup resolves to once
//! nesting and filters have been applied.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use mais_core::Result;
use serde::{Deserialize, Serialize};

use crate::date::parse_date;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PrivgroupEntryJson {
  id:          String,
  name:        String,
  last_update: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PrivgroupJson {
  #[serde(default)]
  members:        Vec<PrivgroupEntryJson>,
  #[serde(default)]
  administrators: Vec<PrivgroupEntryJson>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PrivgroupEntry {
  pub id:          String,
  /// `Last, First`.
  pub name:        String,
  /// When the person joined the privilege group.
  pub last_update: NaiveDate,
}

impl PrivgroupEntry {
  fn from_json(json: PrivgroupEntryJson) -> Result<Self> {
    Ok(Self {
      last_update: parse_date(&json.last_update)?,
      name: json.name.trim_end().to_owned(),
      id: json.id,
    })
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrivilegeProjection {
  pub members:        BTreeSet<PrivgroupEntry>,
  pub administrators: BTreeSet<PrivgroupEntry>,
}

impl PrivilegeProjection {
  pub(crate) fn from_json(json: PrivgroupJson) -> Result<Self> {
    Ok(Self {
      members: json.members.into_iter().map(PrivgroupEntry::from_json).collect::<Result<_>>()?,
      administrators: json
        .administrators
        .into_iter()
        .map(PrivgroupEntry::from_json)
        .collect::<Result<_>>()?,
    })
  }

  pub fn contains_member(&self, id: &str) -> bool { self.members.iter().any(|e| e.id == id) }
}
