//! [`WorkgroupClient`]: lookup, creation and the instance cache.

use std::{
  cell::RefCell,
  collections::HashMap,
  fmt,
  rc::{Rc, Weak},
};

use mais_core::{ApiFamily, Error, MaisClient, Result, Transport, check_status};
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use crate::{
  properties::{
    WorkgroupFilter, WorkgroupVisibility, flag_str, validate_description, validate_name,
  },
  workgroup::{Workgroup, WorkgroupInner, WorkgroupJson},
};

/// Parameters for [`WorkgroupClient::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkgroup {
  pub name:        String,
  pub description: String,
  pub filter:      WorkgroupFilter,
  pub privgroup:   bool,
  pub reusable:    bool,
  pub visibility:  WorkgroupVisibility,
}

impl NewWorkgroup {
  /// Unfiltered, projected into a privilege group, reusable across stems,
  /// and visible campus-wide.
  pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
    Self {
      name:        name.into(),
      description: description.into(),
      filter:      WorkgroupFilter::None,
      privgroup:   true,
      reusable:    true,
      visibility:  WorkgroupVisibility::Stanford,
    }
  }
}

struct ClientInner {
  client: MaisClient,
  cache:  RefCell<HashMap<String, Weak<WorkgroupInner>>>,
}

/// Entry point for the Workgroup API.
///
/// The cache only holds weak references: a workgroup stays cached while
/// some caller holds a handle to it, and is fetched again afterwards.
#[derive(Clone)]
pub struct WorkgroupClient {
  inner: Rc<ClientInner>,
}

impl WorkgroupClient {
  pub fn new(client: MaisClient) -> Self {
    Self {
      inner: Rc::new(ClientInner { client, cache: RefCell::default() }),
    }
  }

  pub fn client(&self) -> &MaisClient { &self.inner.client }

  pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.inner, &other.inner) }

  pub(crate) fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
    self.inner.client.url(ApiFamily::Workgroup, segments, query)
  }

  pub(crate) fn transport(&self) -> &dyn Transport { self.inner.client.transport() }

  pub fn get(&self, name: &str) -> Result<Workgroup> {
    if name.is_empty() {
      return Err(Error::malformed("name", "empty"));
    }
    if let Some(hit) = self.cached(name) {
      debug!(name, "workgroup cache hit");
      return Ok(hit);
    }

    info!(name, "fetching from the Workgroup API");
    let url = self.url(&[name], &[])?;
    let response = check_status(self.transport().get(&url)?, name)?;
    let workgroup = Workgroup::from_json(self.clone(), response.json::<WorkgroupJson>()?)?;
    self.remember(&workgroup);
    Ok(workgroup)
  }

  /// `Ok(false)` for unknown and soft-deleted workgroups.
  pub fn contains(&self, name: &str) -> Result<bool> {
    match self.get(name) {
      Ok(_) => Ok(true),
      Err(e) if e.is_not_found() => Ok(false),
      Err(e) => Err(e),
    }
  }

  /// Create a workgroup. Inputs are checked before anything is sent.
  pub fn create(&self, new: &NewWorkgroup) -> Result<Workgroup> {
    validate_name(&new.name)?;
    validate_description(&new.description)?;

    info!(name = %new.name, "creating workgroup");
    let url = self.url(&[new.name.as_str()], &[])?;
    let body = json!({
      "description": new.description,
      "filter": new.filter.as_ref(),
      "privgroup": flag_str(new.privgroup),
      "reusable": flag_str(new.reusable),
      "visibility": new.visibility.as_ref(),
    });
    let response = check_status(self.transport().post(&url, &body)?, &new.name)?;
    let workgroup = Workgroup::from_json(self.clone(), response.json::<WorkgroupJson>()?)?;
    self.remember(&workgroup);
    Ok(workgroup)
  }

  pub fn clear_cache(&self) {
    debug!("clearing workgroup cache");
    self.inner.cache.borrow_mut().clear();
  }

  /// Whether a live instance for `name` is cached.
  pub fn is_cached(&self, name: &str) -> bool { self.cached(name).is_some() }

  fn cached(&self, name: &str) -> Option<Workgroup> {
    let mut cache = self.inner.cache.borrow_mut();
    let inner = cache.get(name)?.upgrade();
    if inner.is_none() {
      debug!(name, "dropping expired cache entry");
      cache.remove(name);
    }
    inner.map(Workgroup::from_inner)
  }

  fn remember(&self, workgroup: &Workgroup) {
    self
      .inner
      .cache
      .borrow_mut()
      .insert(workgroup.name().to_owned(), workgroup.downgrade());
  }

  /// Drop the cache entry for a deleted instance, unless the name already
  /// maps to a different one.
  pub(crate) fn forget(&self, workgroup: &Workgroup) {
    let mut cache = self.inner.cache.borrow_mut();
    if cache
      .get(workgroup.name())
      .is_some_and(|cached| Weak::ptr_eq(cached, &workgroup.downgrade()))
    {
      cache.remove(workgroup.name());
    }
  }
}

impl fmt::Debug for WorkgroupClient {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("WorkgroupClient")
      .field("client", &self.inner.client)
      .field("cached", &self.inner.cache.borrow().len())
      .finish()
  }
}
