//! The [`Account`] snapshot and the identifier rules for looking one up.

use chrono::{DateTime, NaiveDateTime, Utc};
use mais_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::service::{ServiceKind, Services};

pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Accounts may be addressed by their `@stanford.edu` alias form.
pub const ALIAS_SUFFIX: &str = "@stanford.edu";

const STATUS_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Check an identifier before any I/O and strip the alias suffix.
pub fn normalize_identifier(id: &str) -> Result<&str> {
  if !id.is_ascii() {
    return Err(Error::malformed("identifier", format!("{id:?} is not ASCII")));
  }
  let id = id.strip_suffix(ALIAS_SUFFIX).unwrap_or(id);
  if id.is_empty() {
    return Err(Error::malformed("identifier", "empty"));
  }
  if id.len() > MAX_IDENTIFIER_LEN {
    return Err(Error::malformed(
      "identifier",
      format!("{id:?} is longer than {MAX_IDENTIFIER_LEN} characters"),
    ));
  }
  Ok(id)
}

pub(crate) fn parse_status_date(raw: &str) -> Result<DateTime<Utc>> {
  NaiveDateTime::parse_from_str(raw, STATUS_DATE_FORMAT)
    .map(|naive| naive.and_utc())
    .map_err(|e| Error::Decode(format!("bad statusDateStr {raw:?}: {e}")))
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
pub enum AccountKind {
  /// An account belonging to a person.
  #[serde(rename = "self")]
  #[strum(serialize = "self")]
  Person,
  #[serde(rename = "functional")]
  #[strum(serialize = "functional")]
  Functional,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountJson {
  id:              String,
  name:            String,
  #[serde(default)]
  description:     String,
  status:          String,
  status_date_str: String,
  #[serde(rename = "type")]
  kind:            String,
  #[serde(default)]
  services:        Vec<Value>,
}

/// An immutable account snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
  /// Canonical identifier, as returned by the service.
  pub id:          String,
  pub name:        String,
  pub description: String,
  pub kind:        AccountKind,
  pub is_active:   bool,
  /// Has an active `leland` service.
  pub is_full:     bool,
  pub services:    Services,
  pub last_update: DateTime<Utc>,
  #[serde(skip)]
  pub raw:         Value,
}

impl Account {
  pub fn from_json(raw: Value) -> Result<Self> {
    let json = AccountJson::deserialize(&raw)
      .map_err(|e| Error::Decode(format!("malformed account: {e}")))?;

    let kind = json
      .kind
      .parse::<AccountKind>()
      .map_err(|_| Error::Decode(format!("unexpected account type {:?}", json.kind)))?;
    let services = Services::from_json(&json.services)?;
    let is_full = services
      .get(ServiceKind::Leland)
      .is_some_and(|leland| leland.is_active());

    Ok(Self {
      id: json.id,
      name: json.name,
      description: json.description,
      kind,
      is_active: json.status == "active",
      is_full,
      services,
      last_update: parse_status_date(&json.status_date_str)?,
      raw,
    })
  }

  pub fn is_person(&self) -> bool { self.kind == AccountKind::Person }
}
