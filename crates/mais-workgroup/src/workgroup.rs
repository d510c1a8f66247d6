//! The [`Workgroup`] entity and its lifecycle.
//!
//! A workgroup handle is a shared reference to one live instance. All
//! handles obtained for the same name from the same client, while any of
//! them is alive, point at the same instance, so a change made through one
//! is visible through all. Every mutation goes to the server first; the
//! local state is then rebuilt from what the server sends back.
//!
//! Once the server reports the workgroup gone (explicit delete, a refresh
//! that finds nothing, or a soft-delete reply to any request) the instance
//! is marked deleted, its memberships are emptied and every accessor other
//! than [`name`](Workgroup::name) and [`client`](Workgroup::client) returns
//! [`Error::Deleted`].

use std::{
  cell::{Cell, Ref, RefCell},
  fmt,
  rc::Rc,
};

use chrono::{DateTime, NaiveDate, Utc};
use mais_core::{Error, Method, Response, Result, check_status};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::{
  client::WorkgroupClient,
  date::{pacific_today, parse_date},
  member::{MemberJson, MembershipSet, Partition, Role},
  privgroup::{PrivgroupJson, PrivilegeProjection},
  properties::{
    WorkgroupFilter, WorkgroupVisibility, deserialize_flag, flag_str, validate_description,
  },
};

// ─── Upstream shape ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WorkgroupJson {
  pub(crate) name: String,
  #[serde(default)]
  description:     String,
  filter:          WorkgroupFilter,
  visibility:      WorkgroupVisibility,
  #[serde(deserialize_with = "deserialize_flag")]
  privgroup:       bool,
  #[serde(deserialize_with = "deserialize_flag")]
  reusable:        bool,
  last_update:     String,
  #[serde(default)]
  members:         Vec<MemberJson>,
  #[serde(default)]
  administrators:  Vec<MemberJson>,
}

#[derive(Debug, Clone)]
struct State {
  description:        String,
  filter:             WorkgroupFilter,
  visibility:         WorkgroupVisibility,
  privgroup:          bool,
  reusable:           bool,
  last_update:        NaiveDate,
  can_see_membership: bool,
  last_refresh:       DateTime<Utc>,
}

/// Everything a server reply says about a workgroup, checked and decoded
/// before any of it is applied.
struct Snapshot {
  state:          State,
  members:        Partition,
  administrators: Partition,
}

impl Snapshot {
  fn from_json(json: WorkgroupJson) -> Result<Self> {
    let members = Partition::from_json(&json.members)?;
    let administrators = Partition::from_json(&json.administrators)?;
    // Private workgroups come back with an empty administrator list when
    // the caller may not see membership.
    let can_see_membership =
      json.visibility == WorkgroupVisibility::Stanford || !administrators.is_empty();
    debug!(
      name = %json.name,
      members = members.len(),
      administrators = administrators.len(),
      can_see_membership,
      "decoded workgroup"
    );
    Ok(Self {
      state: State {
        description: json.description,
        filter: json.filter,
        visibility: json.visibility,
        privgroup: json.privgroup,
        reusable: json.reusable,
        last_update: parse_date(&json.last_update)?,
        can_see_membership,
        last_refresh: Utc::now(),
      },
      members,
      administrators,
    })
  }
}

// ─── Entity ───────────────────────────────────────────────────────────────────

pub(crate) struct WorkgroupInner {
  client:         WorkgroupClient,
  name:           String,
  deleted:        Cell<bool>,
  state:          RefCell<State>,
  members:        MembershipSet,
  administrators: MembershipSet,
}

#[derive(Clone)]
pub struct Workgroup {
  inner: Rc<WorkgroupInner>,
}

impl Workgroup {
  pub(crate) fn from_json(client: WorkgroupClient, json: WorkgroupJson) -> Result<Self> {
    let name = json.name.clone();
    let snapshot = Snapshot::from_json(json)?;
    let inner = Rc::new_cyclic(|weak| WorkgroupInner {
      client,
      name,
      deleted: Cell::new(false),
      state: RefCell::new(snapshot.state),
      members: MembershipSet::new(Role::Members, weak.clone()),
      administrators: MembershipSet::new(Role::Administrators, weak.clone()),
    });
    inner.members.assign(snapshot.members);
    inner.administrators.assign(snapshot.administrators);
    Ok(Self { inner })
  }

  pub(crate) fn from_inner(inner: Rc<WorkgroupInner>) -> Self { Self { inner } }

  pub(crate) fn downgrade(&self) -> std::rc::Weak<WorkgroupInner> { Rc::downgrade(&self.inner) }

  /// True when both handles refer to the same instance.
  pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.inner, &other.inner) }

  pub fn name(&self) -> &str { &self.inner.name }

  pub fn client(&self) -> &WorkgroupClient { &self.inner.client }

  pub fn is_deleted(&self) -> bool { self.inner.deleted.get() }

  /// When the local state was last rebuilt from a server reply.
  pub fn last_refresh(&self) -> DateTime<Utc> { self.inner.state.borrow().last_refresh }

  pub(crate) fn ensure_live(&self) -> Result<()> {
    if self.is_deleted() {
      return Err(Error::Deleted(self.inner.name.clone()));
    }
    Ok(())
  }

  fn state(&self) -> Result<Ref<'_, State>> {
    self.ensure_live()?;
    Ok(self.inner.state.borrow())
  }

  // ─── Read accessors ───────────────────────────────────────────────────────

  pub fn description(&self) -> Result<String> { Ok(self.state()?.description.clone()) }

  pub fn filter_policy(&self) -> Result<WorkgroupFilter> { Ok(self.state()?.filter) }

  pub fn visibility(&self) -> Result<WorkgroupVisibility> { Ok(self.state()?.visibility) }

  /// Whether the effective membership is projected into a privilege group.
  pub fn has_privilege_projection(&self) -> Result<bool> { Ok(self.state()?.privgroup) }

  /// Whether workgroups in other stems may nest this one.
  pub fn is_cross_stem_reusable(&self) -> Result<bool> { Ok(self.state()?.reusable) }

  pub fn last_update(&self) -> Result<NaiveDate> { Ok(self.state()?.last_update) }

  pub fn can_see_membership(&self) -> Result<bool> { Ok(self.state()?.can_see_membership) }

  pub fn members(&self) -> Result<MembershipSet> {
    self.ensure_live()?;
    Ok(self.inner.members.clone())
  }

  pub fn administrators(&self) -> Result<MembershipSet> {
    self.ensure_live()?;
    Ok(self.inner.administrators.clone())
  }

  // ─── Setters ──────────────────────────────────────────────────────────────

  pub fn set_description(&self, description: &str) -> Result<()> {
    self.ensure_live()?;
    validate_description(description)?;
    self.update(json!({ "description": description }))
  }

  pub fn set_filter_policy(&self, filter: WorkgroupFilter) -> Result<()> {
    self.update(json!({ "filter": filter.as_ref() }))
  }

  pub fn set_visibility(&self, visibility: WorkgroupVisibility) -> Result<()> {
    self.update(json!({ "visibility": visibility.as_ref() }))
  }

  pub fn set_has_privilege_projection(&self, privgroup: bool) -> Result<()> {
    self.update(json!({ "privgroup": flag_str(privgroup) }))
  }

  pub fn set_is_cross_stem_reusable(&self, reusable: bool) -> Result<()> {
    self.update(json!({ "reusable": flag_str(reusable) }))
  }

  fn update(&self, change: Value) -> Result<()> {
    self.ensure_live()?;
    debug!(name = self.name(), %change, "updating workgroup");
    let url = self.client().url(&[self.name()], &[])?;
    match self.round_trip(self.client().transport().put(&url, &change), self.name()) {
      Ok(response) => self.apply(response.json()?),
      Err(Error::NotFound(missing)) => {
        warn!(name = self.name(), "workgroup disappeared upstream during update");
        self.mark_deleted();
        Err(Error::NotFound(missing))
      }
      Err(e) => Err(e),
    }
  }

  // ─── Lifecycle ────────────────────────────────────────────────────────────

  /// Re-fetch and rebuild. A workgroup the server no longer knows is
  /// marked deleted, which is not an error.
  pub fn refresh(&self) -> Result<()> {
    self.ensure_live()?;
    info!(name = self.name(), "refreshing workgroup");
    let url = self.client().url(&[self.name()], &[])?;
    match self.round_trip(self.client().transport().get(&url), self.name()) {
      Ok(response) => self.apply(response.json()?),
      Err(Error::NotFound(_)) => {
        warn!(name = self.name(), "workgroup has disappeared upstream");
        self.mark_deleted();
        Ok(())
      }
      Err(e) => Err(e),
    }
  }

  pub fn delete(&self) -> Result<()> {
    self.ensure_live()?;
    info!(name = self.name(), "deleting workgroup");
    let url = self.client().url(&[self.name()], &[])?;
    self.round_trip(self.client().transport().delete(&url, None), self.name())?;
    self.mark_deleted();
    Ok(())
  }

  /// The effective membership as projected into the privilege group. Fails
  /// without a request when the caller cannot see membership.
  pub fn privilege_projection(&self) -> Result<PrivilegeProjection> {
    if !self.state()?.can_see_membership {
      return Err(Error::PermissionDenied(self.name().to_owned()));
    }
    let url = self.client().url(&[self.name(), "privgroup"], &[])?;
    let response = self.round_trip(self.client().transport().get(&url), self.name())?;
    PrivilegeProjection::from_json(response.json::<PrivgroupJson>()?)
  }

  /// PUT or DELETE one membership entry. Errors are attributed to `id`,
  /// except a soft delete, which is about the workgroup itself.
  pub(crate) fn change_membership(&self, method: Method, role: Role, id: &str, tag: &str) -> Result<()> {
    self.ensure_live()?;
    let url = self.client().url(&[self.name(), role.as_ref(), id], &[])?;
    let body = json!({ "type": tag });
    self.round_trip(self.client().transport().execute(method, &url, Some(&body)), id)?;
    self.inner.state.borrow_mut().last_update = pacific_today();
    Ok(())
  }

  /// Classify a reply; a soft delete marks this instance deleted on the way
  /// out.
  fn round_trip(&self, sent: Result<Response>, subject: &str) -> Result<Response> {
    match check_status(sent?, subject) {
      Err(Error::SoftDeleted(_)) => {
        self.mark_deleted();
        Err(Error::SoftDeleted(self.name().to_owned()))
      }
      other => other,
    }
  }

  fn apply(&self, json: WorkgroupJson) -> Result<()> {
    let snapshot = Snapshot::from_json(json)?;
    *self.inner.state.borrow_mut() = snapshot.state;
    self.inner.members.assign(snapshot.members);
    self.inner.administrators.assign(snapshot.administrators);
    Ok(())
  }

  fn mark_deleted(&self) {
    debug!(name = self.name(), "marking workgroup deleted");
    self.inner.deleted.set(true);
    self.inner.members.clear();
    self.inner.administrators.clear();
    self.inner.state.borrow_mut().last_refresh = Utc::now();
    self.client().forget(self);
  }
}

impl fmt::Debug for Workgroup {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Workgroup")
      .field("name", &self.inner.name)
      .field("deleted", &self.inner.deleted.get())
      .field("state", &self.inner.state.borrow())
      .field("members", &self.inner.members)
      .field("administrators", &self.inner.administrators)
      .finish()
  }
}

impl fmt::Display for Workgroup {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_deleted() {
      return write!(f, "Workgroup(deleted)");
    }
    let state = self.inner.state.borrow();
    write!(
      f,
      "Workgroup(name={:?}, description={:?}, filter={}, visibility={}, privgroup={}, \
       reusable={}, last_update={}, members=[{}], administrators=[{}])",
      self.inner.name,
      state.description,
      state.filter,
      state.visibility,
      state.privgroup,
      state.reusable,
      state.last_update,
      self.inner.members,
      self.inner.administrators,
    )
  }
}
