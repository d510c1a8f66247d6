//! Account services: the typed sub-records hanging off an account.
//!
//! Each service arrives as `{name, status, settings: [{name, value}]}`.
//! Settings are untyped name/value pairs, a name may repeat to carry
//! several values, and values are strings or numbers depending on the
//! setting. Settings a service normally requires may be missing once the
//! service is no longer active.

use std::collections::BTreeMap;

use mais_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

// ─── Status and kind ──────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ServiceStatus {
  Active,
  /// Present but temporarily disabled.
  Frozen,
  Inactive,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ServiceKind {
  Kerberos,
  Library,
  Seas,
  Email,
  Autoreply,
  Leland,
  Pts,
  Afs,
  Dialin,
}

// ─── Sub-records ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Kerberos {
  pub status:    ServiceStatus,
  /// Un-scoped principal name, normally the account identifier.
  pub principal: Option<String>,
  pub uid:       Option<u32>,
}

/// Library e-resources. Carries no settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Library {
  pub status: ServiceStatus,
}

/// Stanford Electronic Alias Service: mail routing for the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Seas {
  pub status:           ServiceStatus,
  pub local:            Option<String>,
  pub sunetid:          Vec<String>,
  pub sunetidpreferred: Option<String>,
  pub forward:          Vec<String>,
  pub urirouteto:       Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
  pub status:      ServiceStatus,
  pub accounttype: Option<String>,
  pub quota:       Option<u64>,
  pub admin:       Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Autoreply {
  pub status:  ServiceStatus,
  pub forward: Option<String>,
  pub subj:    Option<String>,
  pub msg:     Option<String>,
}

/// Shared computing access. Active `leland` is what makes an account full.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leland {
  pub status: ServiceStatus,
  pub shell:  Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pts {
  pub status: ServiceStatus,
  pub uid:    Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Afs {
  pub status:        ServiceStatus,
  pub homedirectory: Option<String>,
}

/// Dial-up modem pool. Carries no settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dialin {
  pub status: ServiceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Service {
  Kerberos(Kerberos),
  Library(Library),
  Seas(Seas),
  Email(Email),
  Autoreply(Autoreply),
  Leland(Leland),
  Pts(Pts),
  Afs(Afs),
  Dialin(Dialin),
}

impl Service {
  pub fn kind(&self) -> ServiceKind {
    match self {
      Self::Kerberos(_) => ServiceKind::Kerberos,
      Self::Library(_) => ServiceKind::Library,
      Self::Seas(_) => ServiceKind::Seas,
      Self::Email(_) => ServiceKind::Email,
      Self::Autoreply(_) => ServiceKind::Autoreply,
      Self::Leland(_) => ServiceKind::Leland,
      Self::Pts(_) => ServiceKind::Pts,
      Self::Afs(_) => ServiceKind::Afs,
      Self::Dialin(_) => ServiceKind::Dialin,
    }
  }

  pub fn status(&self) -> ServiceStatus {
    match self {
      Self::Kerberos(s) => s.status,
      Self::Library(s) => s.status,
      Self::Seas(s) => s.status,
      Self::Email(s) => s.status,
      Self::Autoreply(s) => s.status,
      Self::Leland(s) => s.status,
      Self::Pts(s) => s.status,
      Self::Afs(s) => s.status,
      Self::Dialin(s) => s.status,
    }
  }

  pub fn is_active(&self) -> bool { self.status() == ServiceStatus::Active }

  /// Active or frozen.
  pub fn not_inactive(&self) -> bool { self.status() != ServiceStatus::Inactive }
}

// ─── Service map ──────────────────────────────────────────────────────────────

/// The services present on an account, at most one per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Services(BTreeMap<ServiceKind, Service>);

macro_rules! typed_accessor {
  ($name:ident, $variant:ident, $ty:ty) => {
    pub fn $name(&self) -> Option<&$ty> {
      match self.0.get(&ServiceKind::$variant) {
        Some(Service::$variant(s)) => Some(s),
        _ => None,
      }
    }
  };
}

impl Services {
  pub fn get(&self, kind: ServiceKind) -> Option<&Service> { self.0.get(&kind) }

  pub fn contains(&self, kind: ServiceKind) -> bool { self.0.contains_key(&kind) }

  pub fn iter(&self) -> impl Iterator<Item = &Service> { self.0.values() }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  typed_accessor!(kerberos, Kerberos, Kerberos);
  typed_accessor!(library, Library, Library);
  typed_accessor!(seas, Seas, Seas);
  typed_accessor!(email, Email, Email);
  typed_accessor!(autoreply, Autoreply, Autoreply);
  typed_accessor!(leland, Leland, Leland);
  typed_accessor!(pts, Pts, Pts);
  typed_accessor!(afs, Afs, Afs);
  typed_accessor!(dialin, Dialin, Dialin);

  /// Decode the `services` array of an account. Unknown kinds are skipped.
  pub fn from_json(fragments: &[Value]) -> Result<Self> {
    let mut services = BTreeMap::new();
    for fragment in fragments {
      if let Some(service) = decode_service(fragment)? {
        services.insert(service.kind(), service);
      }
    }
    Ok(Self(services))
  }
}

// ─── Decoder ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ServiceJson {
  name:     String,
  status:   ServiceStatus,
  #[serde(default)]
  settings: Vec<SettingJson>,
}

#[derive(Deserialize)]
struct SettingJson {
  name:  String,
  value: Value,
}

/// The settings of one service, with the service's status deciding whether
/// "required" really means required.
struct Settings {
  service: ServiceKind,
  active:  bool,
  values:  BTreeMap<String, Vec<String>>,
}

impl Settings {
  fn new(service: ServiceKind, status: ServiceStatus, raw: Vec<SettingJson>) -> Result<Self> {
    let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for setting in raw {
      let value = match setting.value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        other => {
          return Err(Error::Decode(format!(
            "service {service} setting {} has a non-scalar value: {other}",
            setting.name
          )));
        }
      };
      values.entry(setting.name).or_default().push(value);
    }
    Ok(Self { service, active: status == ServiceStatus::Active, values })
  }

  fn optional(&self, key: &str) -> Option<String> {
    self.values.get(key).and_then(|v| v.first()).cloned()
  }

  fn multiple(&self, key: &str) -> Vec<String> {
    self.values.get(key).cloned().unwrap_or_default()
  }

  fn required(&self, key: &str) -> Result<Option<String>> {
    match self.optional(key) {
      None if self.active => Err(Error::Decode(format!(
        "service {} missing required setting {key}",
        self.service
      ))),
      value => Ok(value),
    }
  }

  fn required_multiple(&self, key: &str) -> Result<Vec<String>> {
    let values = self.multiple(key);
    if values.is_empty() && self.active {
      return Err(Error::Decode(format!(
        "service {} missing required setting {key}",
        self.service
      )));
    }
    Ok(values)
  }

  fn number<T: std::str::FromStr>(&self, key: &str, value: Option<String>) -> Result<Option<T>> {
    value
      .map(|v| {
        v.parse::<T>().map_err(|_| {
          Error::Decode(format!("service {} setting {key} is not a number: {v:?}", self.service))
        })
      })
      .transpose()
  }
}

/// Decode one service fragment. `Ok(None)` means the kind is unknown.
pub fn decode_service(fragment: &Value) -> Result<Option<Service>> {
  let raw = ServiceJson::deserialize(fragment)
    .map_err(|e| Error::Decode(format!("malformed service entry: {e}")))?;
  let Ok(kind) = raw.name.parse::<ServiceKind>() else {
    warn!(service = %raw.name, "ignoring unknown account service");
    return Ok(None);
  };
  let status = raw.status;
  let s = Settings::new(kind, status, raw.settings)?;

  let service = match kind {
    ServiceKind::Kerberos => Service::Kerberos(Kerberos {
      status,
      principal: s.required("principal")?,
      uid: s.number("uid", s.optional("uid"))?,
    }),
    ServiceKind::Library => Service::Library(Library { status }),
    ServiceKind::Seas => Service::Seas(Seas {
      status,
      local: s.optional("local"),
      sunetid: s.required_multiple("sunetid")?,
      sunetidpreferred: s.required("sunetidpreferred")?,
      forward: s.multiple("forward"),
      urirouteto: s.optional("urirouteto"),
    }),
    ServiceKind::Email => Service::Email(Email {
      status,
      accounttype: s.required("accounttype")?,
      quota: s.number("quota", s.optional("quota"))?,
      admin: s.optional("admin"),
    }),
    ServiceKind::Autoreply => Service::Autoreply(Autoreply {
      status,
      forward: s.required("forward")?,
      subj: s.required("subj")?,
      msg: s.required("msg")?,
    }),
    ServiceKind::Leland => Service::Leland(Leland { status, shell: s.optional("shell") }),
    ServiceKind::Pts => Service::Pts(Pts {
      status,
      uid: s.number("uid", s.required("uid")?)?,
    }),
    ServiceKind::Afs => Service::Afs(Afs {
      status,
      homedirectory: s.required("homedirectory")?,
    }),
    ServiceKind::Dialin => Service::Dialin(Dialin { status }),
  };
  Ok(Some(service))
}
