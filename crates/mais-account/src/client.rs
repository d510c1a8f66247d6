//! [`AccountClient`]: cached account lookups and filtered views.

use std::{
  cell::RefCell,
  collections::{BTreeSet, HashMap},
  fmt,
  rc::Rc,
};

use mais_core::{ApiFamily, Error, MaisClient, Result, check_status};
use tracing::{debug, info};

use crate::{
  account::{Account, normalize_identifier},
  filter::AccountFilter,
};

type Cache = Rc<RefCell<HashMap<String, Rc<Account>>>>;

/// Entry point for the Account API.
///
/// Cloning, and every `only_*` view, shares the same cache. Entries live
/// until [`clear_cache`](Self::clear_cache); references already handed out
/// stay valid after that.
#[derive(Clone)]
pub struct AccountClient {
  client:  MaisClient,
  cache:   Cache,
  filters: BTreeSet<AccountFilter>,
}

impl AccountClient {
  pub fn new(client: MaisClient) -> Self {
    Self {
      client,
      cache: Rc::default(),
      filters: BTreeSet::new(),
    }
  }

  pub fn client(&self) -> &MaisClient { &self.client }

  pub fn filters(&self) -> impl Iterator<Item = AccountFilter> + '_ {
    self.filters.iter().copied()
  }

  /// Look up an account. Accounts rejected by this view's filters are
  /// reported as [`Error::NotFound`].
  pub fn get(&self, id: &str) -> Result<Rc<Account>> {
    let account = self.fetch(id)?;
    if let Some(filter) = self.filters.iter().find(|f| !f.accept(&account)) {
      debug!(id, %filter, "account rejected by view filter");
      return Err(Error::NotFound(id.to_owned()));
    }
    Ok(account)
  }

  /// `Ok(false)` for accounts that are missing or filtered out. Malformed
  /// identifiers and remote failures are still errors.
  pub fn contains(&self, id: &str) -> Result<bool> {
    match self.get(id) {
      Ok(_) => Ok(true),
      Err(e) if e.is_not_found() => Ok(false),
      Err(e) => Err(e),
    }
  }

  pub fn clear_cache(&self) {
    debug!("clearing account cache");
    self.cache.borrow_mut().clear();
  }

  pub fn only_active(&self) -> Self { self.with_filter(AccountFilter::Active) }

  pub fn only_inactive(&self) -> Self { self.with_filter(AccountFilter::Inactive) }

  pub fn only_people(&self) -> Self { self.with_filter(AccountFilter::People) }

  pub fn only_functional(&self) -> Self { self.with_filter(AccountFilter::Functional) }

  fn with_filter(&self, filter: AccountFilter) -> Self {
    let mut filters = self.filters.clone();
    filters.insert(filter);
    Self {
      client: self.client.clone(),
      cache: Rc::clone(&self.cache),
      filters,
    }
  }

  fn fetch(&self, id: &str) -> Result<Rc<Account>> {
    let id = normalize_identifier(id)?;
    if let Some(hit) = self.cache.borrow().get(id).cloned() {
      debug!(id, "account cache hit");
      return Ok(hit);
    }

    info!(id, "fetching from the Account API");
    let url = self.client.url(ApiFamily::Account, &[id], &[])?;
    let response = check_status(self.client.transport().get(&url)?, id)?;
    let account = Rc::new(Account::from_json(response.json_value()?)?);

    self.cache.borrow_mut().insert(id.to_owned(), Rc::clone(&account));
    Ok(account)
  }
}

impl fmt::Debug for AccountClient {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AccountClient")
      .field("client", &self.client)
      .field("cached", &self.cache.borrow().len())
      .field("filters", &self.filters)
      .finish()
  }
}
