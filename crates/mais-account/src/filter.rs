//! Read filters for account views.

use crate::account::Account;

/// A predicate an account must pass to be visible through a view. An
/// account that fails one is reported exactly as if it did not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AccountFilter {
  Active,
  Inactive,
  People,
  Functional,
}

impl AccountFilter {
  pub fn accept(self, account: &Account) -> bool {
    match self {
      Self::Active => account.is_active,
      Self::Inactive => !account.is_active,
      Self::People => account.is_person(),
      Self::Functional => !account.is_person(),
    }
  }
}
