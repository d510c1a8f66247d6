//! "Which accounts changed status recently" search.

use std::rc::Rc;

use chrono::{DateTime, Utc};
use mais_core::{ApiFamily, Error, Result, check_status};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
  account::{Account, AccountKind, parse_status_date},
  client::AccountClient,
};

pub const MAX_CHANGED_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum AccountStatus {
  Active,
  Inactive,
  Pending,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartialAccountJson {
  id:              String,
  #[serde(rename = "type")]
  kind:            AccountKind,
  status:          String,
  status_date_str: String,
}

/// The few fields a changed-status search returns per account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialAccount {
  pub id:          String,
  pub is_person:   bool,
  pub is_active:   bool,
  pub last_update: DateTime<Utc>,
}

impl PartialAccount {
  /// Fetch the full account. Nothing guarantees the two agree: the
  /// account may have changed again since the search ran.
  pub fn account(&self, client: &AccountClient) -> Result<Rc<Account>> { client.get(&self.id) }
}

impl AccountClient {
  /// Accounts of one kind whose status became `status` within the last
  /// `days` days (1 to 30).
  pub fn get_changed_status(
    &self,
    days: u32,
    status: AccountStatus,
    get_people: bool,
  ) -> Result<Vec<PartialAccount>> {
    if !(1..=MAX_CHANGED_DAYS).contains(&days) {
      return Err(Error::malformed("days", format!("{days} is outside 1..={MAX_CHANGED_DAYS}")));
    }
    let kind = if get_people { AccountKind::Person } else { AccountKind::Functional };
    let kind = kind.to_string();
    let status = status.to_string();
    let days = days.to_string();

    info!(%kind, %status, %days, "searching for accounts with changed status");
    let url = self.client().url(
      ApiFamily::Account,
      &[],
      &[("type", kind.as_str()), ("status", status.as_str()), ("statusdays", days.as_str())],
    )?;
    let response = check_status(self.client().transport().get(&url)?, "changed-status search")?;

    response
      .json::<Vec<PartialAccountJson>>()?
      .into_iter()
      .map(|entry| {
        Ok::<_, Error>(PartialAccount {
          last_update: parse_status_date(&entry.status_date_str)?,
          is_person: entry.kind == AccountKind::Person,
          is_active: entry.status == "active",
          id: entry.id,
        })
      })
      .collect()
  }
}
