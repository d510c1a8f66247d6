//! Live membership views.
//!
//! A workgroup has two [`MembershipSet`]s, `members` and `administrators`.
//! Each holds three [`MembershipCollection`]s, one per kind of member. A
//! collection mirrors the identifiers the server last reported and writes
//! every change through to the server before applying it locally.
//!
//! Collections only hold a weak reference to their workgroup. Once every
//! [`Workgroup`] handle is gone, mutating a collection fails with
//! [`Error::OwnerGone`].

use std::{
  cell::RefCell,
  collections::BTreeSet,
  fmt,
  marker::PhantomData,
  rc::{Rc, Weak},
};

use mais_core::{Error, Method, Result};
use serde::Deserialize;
use tracing::{debug, error};

use crate::{
  search::PartialWorkgroup,
  workgroup::{Workgroup, WorkgroupInner},
};

// ─── Kinds and roles ──────────────────────────────────────────────────────────

/// A kind of member. `TAG` is what mutation requests send as `type`.
pub trait MemberKind {
  const TAG: &'static str;
  const LABEL: &'static str;
}

/// People, by account identifier.
#[derive(Debug)]
pub enum Person {}

/// Nested workgroups, by name.
#[derive(Debug)]
pub enum Group {}

/// Client certificates, by certificate name.
#[derive(Debug)]
pub enum Certificate {}

impl MemberKind for Person {
  const LABEL: &'static str = "people";
  const TAG: &'static str = "USER";
}

impl MemberKind for Group {
  const LABEL: &'static str = "workgroups";
  const TAG: &'static str = "WORKGROUP";
}

impl MemberKind for Certificate {
  const LABEL: &'static str = "certificates";
  const TAG: &'static str = "CERTIFICATE";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Members,
  Administrators,
}

/// Anything that names a member of kind `K`. Strings work for every kind;
/// workgroups (full or partial) also work for nested-workgroup collections.
pub trait MemberId<K: MemberKind> {
  fn member_id(&self) -> &str;
}

impl<K: MemberKind> MemberId<K> for str {
  fn member_id(&self) -> &str { self }
}

impl<K: MemberKind> MemberId<K> for String {
  fn member_id(&self) -> &str { self.as_str() }
}

impl MemberId<Group> for Workgroup {
  fn member_id(&self) -> &str { self.name() }
}

impl MemberId<Group> for PartialWorkgroup {
  fn member_id(&self) -> &str { &self.name }
}

// ─── Upstream shape ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MemberJson {
  #[serde(rename = "type")]
  kind: String,
  id:   String,
}

/// One role's membership as reported by the server, split by kind.
#[derive(Debug, Default)]
pub(crate) struct Partition {
  people:       BTreeSet<String>,
  workgroups:   BTreeSet<String>,
  certificates: BTreeSet<String>,
}

impl Partition {
  pub(crate) fn from_json(entries: &[MemberJson]) -> Result<Self> {
    let mut partition = Self::default();
    for entry in entries {
      let set = match entry.kind.as_str() {
        "PERSON" => &mut partition.people,
        "WORKGROUP" => &mut partition.workgroups,
        "CERTIFICATE" => &mut partition.certificates,
        other => {
          error!(kind = other, id = %entry.id, "member of unknown type");
          return Err(Error::Decode(format!("member {} has unknown type {other:?}", entry.id)));
        }
      };
      set.insert(entry.id.clone());
    }
    Ok(partition)
  }

  pub(crate) fn len(&self) -> usize {
    self.people.len() + self.workgroups.len() + self.certificates.len()
  }
  pub(crate) fn is_empty(&self) -> bool { self.len() == 0 }
}

// ─── Collections ──────────────────────────────────────────────────────────────

pub(crate) struct CollectionInner {
  role:  Role,
  owner: Weak<WorkgroupInner>,
  ids:   RefCell<BTreeSet<String>>,
}

/// A live set of one kind of member in one role of a workgroup.
pub struct MembershipCollection<K: MemberKind> {
  inner: Rc<CollectionInner>,
  kind:  PhantomData<fn() -> K>,
}

impl<K: MemberKind> Clone for MembershipCollection<K> {
  fn clone(&self) -> Self { Self { inner: Rc::clone(&self.inner), kind: PhantomData } }
}

impl<K: MemberKind> MembershipCollection<K> {
  fn new(role: Role, owner: Weak<WorkgroupInner>) -> Self {
    Self {
      inner: Rc::new(CollectionInner { role, owner, ids: RefCell::default() }),
      kind:  PhantomData,
    }
  }

  pub fn role(&self) -> Role { self.inner.role }

  pub fn tag(&self) -> &'static str { K::TAG }

  /// The owning workgroup, if any handle to it is still alive.
  pub fn owner(&self) -> Option<Workgroup> {
    self.inner.owner.upgrade().map(Workgroup::from_inner)
  }

  pub fn contains<V: MemberId<K> + ?Sized>(&self, value: &V) -> bool {
    self.inner.ids.borrow().contains(value.member_id())
  }

  pub fn len(&self) -> usize { self.inner.ids.borrow().len() }

  pub fn is_empty(&self) -> bool { self.inner.ids.borrow().is_empty() }

  /// A snapshot of the identifiers, in sorted order.
  pub fn iter(&self) -> impl Iterator<Item = String> + use<K> {
    self.inner.ids.borrow().clone().into_iter()
  }

  pub fn to_set(&self) -> BTreeSet<String> { self.inner.ids.borrow().clone() }

  /// Add `value` upstream, then locally.
  pub fn add<V: MemberId<K> + ?Sized>(&self, value: &V) -> Result<()> {
    let id = value.member_id();
    let owner = self.live_owner()?;
    if self.contains(value) {
      return Err(Error::AlreadyExists(id.to_owned()));
    }
    debug!(workgroup = owner.name(), role = %self.role(), kind = K::LABEL, id, "adding");
    owner.change_membership(Method::Put, self.role(), id, K::TAG)?;
    self.inner.ids.borrow_mut().insert(id.to_owned());
    Ok(())
  }

  /// Remove `value` upstream, then locally. A value not known locally fails
  /// with [`Error::NotFound`] before any request; one already gone upstream
  /// is dropped locally and also reported as [`Error::NotFound`].
  pub fn discard<V: MemberId<K> + ?Sized>(&self, value: &V) -> Result<()> {
    let id = value.member_id();
    let owner = self.live_owner()?;
    if !self.contains(value) {
      return Err(Error::NotFound(id.to_owned()));
    }
    debug!(workgroup = owner.name(), role = %self.role(), kind = K::LABEL, id, "removing");
    match owner.change_membership(Method::Delete, self.role(), id, K::TAG) {
      Ok(()) => {
        self.inner.ids.borrow_mut().remove(id);
        Ok(())
      }
      Err(Error::NotFound(missing)) => {
        // Already gone upstream.
        self.inner.ids.borrow_mut().remove(id);
        Err(Error::NotFound(missing))
      }
      Err(e) => Err(e),
    }
  }

  /// Same as [`discard`](Self::discard).
  pub fn remove<V: MemberId<K> + ?Sized>(&self, value: &V) -> Result<()> { self.discard(value) }

  fn live_owner(&self) -> Result<Workgroup> {
    let owner = self.owner().ok_or(Error::OwnerGone)?;
    owner.ensure_live()?;
    Ok(owner)
  }

  fn assign(&self, ids: BTreeSet<String>) { *self.inner.ids.borrow_mut() = ids; }

  fn clear(&self) { self.inner.ids.borrow_mut().clear(); }
}

impl<K: MemberKind> fmt::Debug for MembershipCollection<K> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MembershipCollection")
      .field("role", &self.inner.role)
      .field("kind", &K::LABEL)
      .field("ids", &self.inner.ids.borrow())
      .finish()
  }
}

// ─── Sets ─────────────────────────────────────────────────────────────────────

/// One role's membership: people, nested workgroups and certificates.
#[derive(Clone)]
pub struct MembershipSet {
  role:         Role,
  people:       MembershipCollection<Person>,
  workgroups:   MembershipCollection<Group>,
  certificates: MembershipCollection<Certificate>,
}

impl MembershipSet {
  pub(crate) fn new(role: Role, owner: Weak<WorkgroupInner>) -> Self {
    Self {
      role,
      people: MembershipCollection::new(role, owner.clone()),
      workgroups: MembershipCollection::new(role, owner.clone()),
      certificates: MembershipCollection::new(role, owner),
    }
  }

  pub fn role(&self) -> Role { self.role }

  pub fn people(&self) -> &MembershipCollection<Person> { &self.people }

  pub fn workgroups(&self) -> &MembershipCollection<Group> { &self.workgroups }

  pub fn certificates(&self) -> &MembershipCollection<Certificate> { &self.certificates }

  pub fn len(&self) -> usize {
    self.people.len() + self.workgroups.len() + self.certificates.len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  pub(crate) fn assign(&self, partition: Partition) {
    self.people.assign(partition.people);
    self.workgroups.assign(partition.workgroups);
    self.certificates.assign(partition.certificates);
  }

  pub(crate) fn clear(&self) {
    self.people.clear();
    self.workgroups.clear();
    self.certificates.clear();
  }
}

impl fmt::Debug for MembershipSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MembershipSet")
      .field("role", &self.role)
      .field("people", &self.people.inner.ids.borrow())
      .field("workgroups", &self.workgroups.inner.ids.borrow())
      .field("certificates", &self.certificates.inner.ids.borrow())
      .finish()
  }
}

impl fmt::Display for MembershipSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "people={:?} workgroups={:?} certificates={:?}",
      self.people.inner.ids.borrow(),
      self.workgroups.inner.ids.borrow(),
      self.certificates.inner.ids.borrow(),
    )
  }
}
