//! Batch classification of account identifiers.

use std::collections::BTreeSet;

use mais_core::Result;
use serde::Serialize;
use tracing::debug;

use crate::client::AccountClient;

/// Outcome of [`validate`]. The four output sets never overlap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
  /// The original string, when the input was one.
  pub raw:      Option<String>,
  /// The de-duplicated candidates.
  pub raw_set:  BTreeSet<String>,
  /// Active accounts with full (leland) service.
  pub full:     BTreeSet<String>,
  /// Active accounts without it.
  pub base:     BTreeSet<String>,
  pub inactive: BTreeSet<String>,
  /// Malformed, unknown (soft-deleted included), or functional.
  pub unknown:  BTreeSet<String>,
}

/// Classify identifiers given as one string, separated by commas and/or
/// whitespace.
pub fn validate_str(raw: &str, client: &AccountClient) -> Result<ValidationResult> {
  let candidates: BTreeSet<String> = raw
    .split(|c: char| c == ',' || c.is_whitespace())
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
    .collect();
  debug!(candidates = candidates.len(), "validating identifiers from a string");
  Ok(ValidationResult { raw: Some(raw.to_owned()), ..classify(candidates, client)? })
}

/// Classify identifiers given as any collection of strings.
pub fn validate<I>(candidates: I, client: &AccountClient) -> Result<ValidationResult>
where
  I: IntoIterator,
  I::Item: Into<String>,
{
  let candidates: BTreeSet<String> = candidates.into_iter().map(Into::into).collect();
  debug!(candidates = candidates.len(), "validating identifiers from a collection");
  classify(candidates, client)
}

fn classify(candidates: BTreeSet<String>, client: &AccountClient) -> Result<ValidationResult> {
  let people = client.only_people();
  let mut result = ValidationResult::default();

  for candidate in &candidates {
    let account = match people.get(candidate) {
      Ok(account) => account,
      Err(e) if e.is_not_found() || e.is_malformed() => {
        debug!(candidate, error = %e, "unknown account");
        result.unknown.insert(candidate.clone());
        continue;
      }
      Err(e) => return Err(e),
    };

    let id = account.id.clone();
    if !account.is_active {
      result.inactive.insert(id);
    } else if account.is_full {
      result.full.insert(id);
    } else {
      result.base.insert(id);
    }
  }

  debug!(
    full = result.full.len(),
    base = result.base.len(),
    inactive = result.inactive.len(),
    unknown = result.unknown.len(),
    "validation finished"
  );
  result.raw_set = candidates;
  Ok(result)
}
