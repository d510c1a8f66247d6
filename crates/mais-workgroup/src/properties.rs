//! Workgroup policy enums and the input rules for creating workgroups.

use std::sync::LazyLock;

use mais_core::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

/// Which subset of the affiliates added to a workgroup actually count as
/// members.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkgroupFilter {
  #[default]
  None,
  AcademicAdministrative,
  Student,
  Faculty,
  Staff,
  FacultyStaff,
  FacultyStudent,
  StaffStudent,
  FacultyStaffStudent,
}

/// Who may see a workgroup's membership.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkgroupVisibility {
  /// Anyone with a Stanford identity.
  #[default]
  Stanford,
  /// Only the workgroup's administrators.
  Private,
}

pub fn parse_filter(raw: &str) -> Result<WorkgroupFilter> {
  raw
    .parse()
    .map_err(|_| Error::malformed("filter", format!("unknown filter {raw:?}")))
}

pub fn parse_visibility(raw: &str) -> Result<WorkgroupVisibility> {
  raw
    .parse()
    .map_err(|_| Error::malformed("visibility", format!("unknown visibility {raw:?}")))
}

// ─── Boolean flags ────────────────────────────────────────────────────────────

/// Boolean as the Workgroup API writes it: `"TRUE"` / `"FALSE"`.
pub(crate) fn flag_str(value: bool) -> &'static str { if value { "TRUE" } else { "FALSE" } }

/// Accept a JSON boolean or a `"TRUE"`/`"FALSE"` string.
pub(crate) fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Flag {
    Bool(bool),
    Text(String),
  }
  Ok(match Flag::deserialize(deserializer)? {
    Flag::Bool(b) => b,
    Flag::Text(s) => s.eq_ignore_ascii_case("true"),
  })
}

// ─── Input rules ──────────────────────────────────────────────────────────────

pub const MAX_NAME_LEN: usize = 81;
pub const MAX_DESCRIPTION_LEN: usize = 255;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[a-z0-9][a-z0-9_-]*:[a-z0-9][a-z0-9_-]*$").expect("workgroup name pattern")
});

/// `stem:name`, lowercase, at most 81 characters.
pub fn validate_name(name: &str) -> Result<()> {
  if name.len() > MAX_NAME_LEN {
    return Err(Error::malformed("name", format!("longer than {MAX_NAME_LEN} characters")));
  }
  if !NAME_PATTERN.is_match(name) {
    return Err(Error::malformed("name", format!("{name:?} is not of the form stem:name")));
  }
  Ok(())
}

/// Non-empty, at most 255 characters, printable Latin-1.
pub fn validate_description(description: &str) -> Result<()> {
  if description.is_empty() {
    return Err(Error::malformed("description", "empty"));
  }
  if description.chars().count() > MAX_DESCRIPTION_LEN {
    return Err(Error::malformed(
      "description",
      format!("longer than {MAX_DESCRIPTION_LEN} characters"),
    ));
  }
  if let Some(c) = description.chars().find(|&c| u32::from(c) > 0xFF) {
    return Err(Error::malformed("description", format!("{c:?} is not Latin-1")));
  }
  if let Some(c) = description.chars().find(|&c| !is_printable(c)) {
    return Err(Error::malformed("description", format!("{c:?} is not printable")));
  }
  Ok(())
}

// Within Latin-1: controls, NBSP and the soft hyphen are not printable.
fn is_printable(c: char) -> bool { c == ' ' || !(c.is_control() || c == '\u{a0}' || c == '\u{ad}') }
