//! Access to the MaIS Workgroup API.
//!
//! [`WorkgroupClient`] looks up, creates and searches workgroups. A
//! [`Workgroup`] is a live, mutable entity: setters, deletion and
//! membership changes are sent to the server immediately and the local
//! state follows the server's reply.

pub mod client;
pub mod date;
pub mod member;
pub mod privgroup;
pub mod properties;
pub mod search;
pub mod workgroup;

pub use client::{NewWorkgroup, WorkgroupClient};
pub use member::{
  Certificate, Group, MemberId, MemberKind, MembershipCollection, MembershipSet, Person, Role,
};
pub use privgroup::{PrivgroupEntry, PrivilegeProjection};
pub use properties::{WorkgroupFilter, WorkgroupVisibility};
pub use search::{PartialWorkgroup, SearchByResults, SearchTarget};
pub use workgroup::Workgroup;

#[cfg(test)]
mod tests;
