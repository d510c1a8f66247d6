//! Workgroup client tests against the stateful fake in `fake`.


use chrono::NaiveDate;
use mais_core::{Error, Method};
use serde_json::json;

use crate::{
  NewWorkgroup, Role, WorkgroupClient, WorkgroupFilter, WorkgroupVisibility, date::pacific_today,
};

fn setup() -> (WorkgroupClient, fake::Fake) {
  let fake = fake::fake();
  (WorkgroupClient::new(fake.mock.client()), fake)
}

fn path(rest: &str) -> String { format!("{}/{rest}", fake::BASE_PATH) }

// ─── Lookup ──────────────────────────────────────────────────────────────────

#[test]
fn get_decodes_everything() {
  let (client, _) = setup();
  let wg = client.get("test:1").unwrap();
  assert_eq!(wg.name(), "test:1");
  assert_eq!(wg.description().unwrap(), "Test 1");
  assert_eq!(wg.filter_policy().unwrap(), WorkgroupFilter::None);
  assert_eq!(wg.visibility().unwrap(), WorkgroupVisibility::Stanford);
  assert!(wg.has_privilege_projection().unwrap());
  assert!(wg.is_cross_stem_reusable().unwrap());
  assert_eq!(wg.last_update().unwrap(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
  assert!(wg.can_see_membership().unwrap());
  assert!(!wg.is_deleted());
  assert!(wg.client().ptr_eq(&client));

  let members = wg.members().unwrap();
  assert_eq!(members.role(), Role::Members);
  assert_eq!(members.len(), 4);
  assert!(members.people().contains("leland"));
  assert!(members.people().contains("jane"));
  assert!(members.workgroups().contains("test:2"));
  assert!(members.certificates().contains("client-cert-1"));
  assert!(!members.people().contains("test:2"));

  let admins = wg.administrators().unwrap();
  assert_eq!(admins.people().iter().collect::<Vec<_>>(), ["akkornel"]);
  assert!(admins.workgroups().contains("workgroup:test-owners"));
}

#[test]
fn missing_description_and_boolean_flags() {
  let (client, _) = setup();
  let wg = client.get("test:2").unwrap();
  assert_eq!(wg.description().unwrap(), "");
  assert_eq!(wg.filter_policy().unwrap(), WorkgroupFilter::FacultyStaff);
  assert!(!wg.has_privilege_projection().unwrap());
  assert!(!wg.is_cross_stem_reusable().unwrap());
  assert_eq!(wg.last_update().unwrap(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
}

#[test]
fn membership_visibility() {
  let (client, _) = setup();
  assert!(!client.get("private:1").unwrap().can_see_membership().unwrap());
  assert!(client.get("private:2").unwrap().can_see_membership().unwrap());
}

#[test]
fn live_instances_are_shared() {
  let (client, fake) = setup();
  let first = client.get("test:1").unwrap();
  let second = client.get("test:1").unwrap();
  assert!(first.ptr_eq(&second));
  assert_eq!(fake.mock.request_count(), 1);
  assert!(client.is_cached("test:1"));

  drop(first);
  drop(second);
  assert!(!client.is_cached("test:1"));
  let third = client.get("test:1").unwrap();
  assert_eq!(fake.mock.request_count(), 2);

  client.clear_cache();
  let fourth = client.get("test:1").unwrap();
  assert!(!third.ptr_eq(&fourth));
}

#[test]
fn get_error_statuses() {
  let (client, _) = setup();
  assert!(matches!(client.get("bad:w1"), Err(Error::UpstreamFailure(_))));
  assert!(matches!(client.get("bad:w2"), Err(Error::UpstreamFailure(_))));
  assert!(matches!(client.get("bad:w3"), Err(Error::PermissionDenied(_))));
  assert!(matches!(client.get("bad:w4"), Err(Error::PermissionDenied(_))));
  assert!(matches!(client.get("bad:w5"), Err(Error::NotFound(_))));
  assert!(matches!(
    client.get("bad:w6"),
    Err(Error::UnrecognizedResponse { status: 521, .. })
  ));
  assert!(matches!(client.get("test:inactive"), Err(Error::SoftDeleted(_))));
  assert!(matches!(client.get("bad:robot"), Err(Error::Decode(_))));
  assert!(client.get("").unwrap_err().is_malformed());
}

#[test]
fn contains() {
  let (client, _) = setup();
  assert!(client.contains("test:1").unwrap());
  assert!(!client.contains("nope:nope").unwrap());
  assert!(!client.contains("test:inactive").unwrap());
  assert!(client.contains("bad:w3").is_err());
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[test]
fn create_with_defaults() {
  let (client, fake) = setup();
  let wg = client.create(&NewWorkgroup::new("create:1", "Create Test 1")).unwrap();
  assert_eq!(wg.filter_policy().unwrap(), WorkgroupFilter::None);
  assert!(wg.has_privilege_projection().unwrap());
  assert!(wg.is_cross_stem_reusable().unwrap());
  assert_eq!(wg.visibility().unwrap(), WorkgroupVisibility::Stanford);
  assert_eq!(wg.description().unwrap(), "Create Test 1");
  assert!(wg.administrators().unwrap().certificates().contains("mais-test-cert"));

  let post = fake.mock.requests().pop().unwrap();
  assert_eq!(post.method, Method::Post);
  assert_eq!(post.target, path("create:1"));
  assert_eq!(
    post.body.unwrap(),
    json!({
      "description": "Create Test 1",
      "filter": "NONE",
      "privgroup": "TRUE",
      "reusable": "TRUE",
      "visibility": "STANFORD",
    })
  );

  let again = client.get("create:1").unwrap();
  assert!(again.ptr_eq(&wg));
  assert_eq!(fake.mock.request_count(), 1);
}

#[test]
fn create_with_options() {
  let (client, _) = setup();
  let mut new = NewWorkgroup::new("create:2", "Create Test 2");
  new.filter = WorkgroupFilter::Student;
  new.privgroup = false;
  new.visibility = WorkgroupVisibility::Private;
  let wg = client.create(&new).unwrap();
  assert_eq!(wg.filter_policy().unwrap(), WorkgroupFilter::Student);
  assert!(!wg.has_privilege_projection().unwrap());
  assert_eq!(wg.visibility().unwrap(), WorkgroupVisibility::Private);
  assert!(wg.can_see_membership().unwrap());
}

#[test]
fn create_validates_before_sending() {
  let (client, fake) = setup();
  for (name, description) in [
    ("create", "no stem"),
    ("Create:1", "uppercase"),
    ("create:1:2", "two colons"),
    ("create:1", ""),
    ("create:1", "snowman ☃"),
    ("create:1", "tab\t"),
  ] {
    let err = client.create(&NewWorkgroup::new(name, description)).unwrap_err();
    assert!(err.is_malformed(), "{name} {description:?}");
  }
  let long_name = format!("create:{}", "x".repeat(75));
  assert!(client.create(&NewWorkgroup::new(long_name, "Too long")).is_err());
  assert!(client.create(&NewWorkgroup::new("create:1", "d".repeat(256))).is_err());
  assert_eq!(fake.mock.request_count(), 0);
}

#[test]
fn create_collisions() {
  let (client, _) = setup();
  assert!(matches!(
    client.create(&NewWorkgroup::new("test:1", "Exists")),
    Err(Error::AlreadyExists(_))
  ));
  assert!(matches!(
    client.create(&NewWorkgroup::new("create:gone", "Soft deleted")),
    Err(Error::SoftDeleted(_))
  ));
  assert!(matches!(
    client.create(&NewWorkgroup::new("create:forbidden", "Nope")),
    Err(Error::PermissionDenied(_))
  ));
}

// ─── Setters ─────────────────────────────────────────────────────────────────

#[test]
fn setters_send_one_field_and_rederive() {
  let (client, fake) = setup();
  let wg = client.get("test:1").unwrap();
  let other = client.get("test:1").unwrap();

  wg.set_description("A new description").unwrap();
  assert_eq!(other.description().unwrap(), "A new description");
  assert_eq!(wg.last_update().unwrap(), pacific_today());
  let put = fake.mock.requests().pop().unwrap();
  assert_eq!(put.method, Method::Put);
  assert_eq!(put.target, path("test:1"));
  assert_eq!(put.body.unwrap(), json!({"description": "A new description"}));

  wg.set_filter_policy(WorkgroupFilter::FacultyStaffStudent).unwrap();
  assert_eq!(wg.filter_policy().unwrap(), WorkgroupFilter::FacultyStaffStudent);

  wg.set_visibility(WorkgroupVisibility::Private).unwrap();
  assert_eq!(wg.visibility().unwrap(), WorkgroupVisibility::Private);

  wg.set_has_privilege_projection(false).unwrap();
  assert!(!wg.has_privilege_projection().unwrap());
  assert_eq!(fake.mock.requests().pop().unwrap().body.unwrap(), json!({"privgroup": "FALSE"}));

  wg.set_is_cross_stem_reusable(false).unwrap();
  assert!(!wg.is_cross_stem_reusable().unwrap());

  let upstream = fake.state.borrow();
  let group = &upstream["test:1"];
  assert_eq!(group.filter, "FACULTY_STAFF_STUDENT");
  assert_eq!(group.visibility, "PRIVATE");
  assert!(!group.reusable);
}

#[test]
fn invalid_description_is_rejected_locally() {
  let (client, fake) = setup();
  let wg = client.get("test:1").unwrap();
  assert!(wg.set_description("").unwrap_err().is_malformed());
  assert!(wg.set_description("ÿ is fine but Ā is not").unwrap_err().is_malformed());
  assert_eq!(fake.mock.request_count(), 1);
}

#[test]
fn soft_delete_reply_marks_the_instance_deleted() {
  let (client, _) = setup();
  let wg = client.get("test:1").unwrap();
  let members = wg.members().unwrap();

  assert!(matches!(wg.set_description("delete"), Err(Error::SoftDeleted(ref n)) if n == "test:1"));
  assert!(wg.is_deleted());
  assert!(matches!(wg.description(), Err(Error::Deleted(_))));
  assert!(matches!(wg.members(), Err(Error::Deleted(_))));
  assert!(members.is_empty());
  assert_eq!(wg.name(), "test:1");
  assert_eq!(wg.to_string(), "Workgroup(deleted)");
  assert!(!client.is_cached("test:1"));
}

#[test]
fn setter_failures_leave_the_instance_alone() {
  let (client, _) = setup();
  let wg = client.get("test:1").unwrap();
  assert!(matches!(wg.set_description("bad1"), Err(Error::UpstreamFailure(_))));
  assert!(matches!(wg.set_description("bad2"), Err(Error::UpstreamFailure(_))));
  assert!(matches!(wg.set_description("bad3"), Err(Error::PermissionDenied(_))));
  assert!(matches!(wg.set_description("bad4"), Err(Error::PermissionDenied(_))));
  assert!(matches!(
    wg.set_description("bad5"),
    Err(Error::UnrecognizedResponse { status: 521, .. })
  ));
  assert!(!wg.is_deleted());
  assert_eq!(wg.description().unwrap(), "Test 1");
}

// ─── Refresh and delete ──────────────────────────────────────────────────────

#[test]
fn refresh_picks_up_upstream_changes() {
  let (client, fake) = setup();
  let wg = client.get("test:1").unwrap();
  let before = wg.last_refresh();
  {
    let mut upstream = fake.state.borrow_mut();
    let group = upstream.get_mut("test:1").unwrap();
    group.description = Some("Changed elsewhere".into());
    group.members.retain(|(_, id)| id != "jane");
  }
  wg.refresh().unwrap();
  assert_eq!(wg.description().unwrap(), "Changed elsewhere");
  assert!(!wg.members().unwrap().people().contains("jane"));
  assert!(wg.last_refresh() >= before);
}

#[test]
fn refresh_of_vanished_workgroup_marks_it_deleted() {
  let (client, fake) = setup();
  let wg = client.get("test:1").unwrap();
  fake.state.borrow_mut().remove("test:1");
  wg.refresh().unwrap();
  assert!(wg.is_deleted());
  assert!(matches!(wg.refresh(), Err(Error::Deleted(_))));
}

#[test]
fn setter_on_vanished_workgroup_marks_it_deleted() {
  let (client, fake) = setup();
  let wg = client.get("test:1").unwrap();
  let members = wg.members().unwrap();
  fake.state.borrow_mut().remove("test:1");

  assert!(matches!(
    wg.set_visibility(WorkgroupVisibility::Private),
    Err(Error::NotFound(ref n)) if n == "test:1"
  ));
  assert!(wg.is_deleted());
  assert!(members.is_empty());
  assert!(!client.is_cached("test:1"));

  let requests = fake.mock.request_count();
  assert!(matches!(wg.set_description("Again"), Err(Error::Deleted(_))));
  assert!(matches!(wg.refresh(), Err(Error::Deleted(_))));
  assert_eq!(fake.mock.request_count(), requests);
}

#[test]
fn delete_is_terminal() {
  let (client, fake) = setup();
  let wg = client.get("test:2").unwrap();
  let admins = wg.administrators().unwrap();
  wg.delete().unwrap();
  assert!(wg.is_deleted());
  assert!(admins.is_empty());
  assert!(matches!(wg.delete(), Err(Error::Deleted(_))));
  assert!(matches!(wg.last_update(), Err(Error::Deleted(_))));

  let requests = fake.mock.request_count();
  assert!(matches!(wg.set_visibility(WorkgroupVisibility::Private), Err(Error::Deleted(_))));
  assert_eq!(fake.mock.request_count(), requests);
  assert!(matches!(client.get("test:2"), Err(Error::NotFound(_))));
}

#[test]
fn delete_failures() {
  let (client, _) = setup();
  let owners = client.get("workgroup:test-owners").unwrap();
  assert!(matches!(owners.delete(), Err(Error::UpstreamFailure(_))));
  assert!(!owners.is_deleted());
  let private = client.get("private:1").unwrap();
  assert!(matches!(private.delete(), Err(Error::PermissionDenied(_))));
}

// ─── Membership ──────────────────────────────────────────────────────────────

#[test]
fn add_and_discard_people() {
  let (client, fake) = setup();
  let wg = client.get("test:1").unwrap();
  let people = wg.members().unwrap().people().clone();

  people.add("newperson").unwrap();
  assert!(people.contains("newperson"));
  assert_eq!(wg.last_update().unwrap(), pacific_today());
  let put = fake.mock.requests().pop().unwrap();
  assert_eq!(put.method, Method::Put);
  assert_eq!(put.target, path("test:1/members/newperson"));
  assert_eq!(put.body.unwrap(), json!({"type": "USER"}));

  let requests = fake.mock.request_count();
  assert!(matches!(people.add("newperson"), Err(Error::AlreadyExists(_))));
  assert_eq!(fake.mock.request_count(), requests);

  people.discard(&"newperson".to_string()).unwrap();
  assert!(!people.contains("newperson"));
  assert!(matches!(people.discard("newperson"), Err(Error::NotFound(_))));
  assert!(matches!(people.remove("newperson"), Err(Error::NotFound(_))));
  assert_eq!(fake.mock.request_count(), requests + 1);
}

#[test]
fn discarding_an_unknown_member_fails_without_a_request() {
  let (client, fake) = setup();
  let wg = client.get("test:1").unwrap();
  let people = wg.members().unwrap().people().clone();
  let requests = fake.mock.request_count();

  assert!(matches!(
    people.discard("never-a-member"),
    Err(Error::NotFound(ref id)) if id == "never-a-member"
  ));
  assert!(matches!(
    wg.administrators().unwrap().workgroups().discard("test:2"),
    Err(Error::NotFound(_))
  ));
  assert_eq!(fake.mock.request_count(), requests);
  assert_eq!(people.len(), 2);
}

#[test]
fn administrators_and_certificates_use_their_own_paths() {
  let (client, fake) = setup();
  let wg = client.get("test:1").unwrap();
  wg.administrators().unwrap().certificates().add("new-cert").unwrap();
  let put = fake.mock.requests().pop().unwrap();
  assert_eq!(put.target, path("test:1/administrators/new-cert"));
  assert_eq!(put.body.unwrap(), json!({"type": "CERTIFICATE"}));

  wg.members().unwrap().certificates().remove("client-cert-1").unwrap();
  let delete = fake.mock.requests().pop().unwrap();
  assert_eq!(delete.method, Method::Delete);
  assert_eq!(delete.target, path("test:1/members/client-cert-1"));

  wg.refresh().unwrap();
  assert!(wg.administrators().unwrap().certificates().contains("new-cert"));
  assert!(!wg.members().unwrap().certificates().contains("client-cert-1"));
}

#[test]
fn nested_workgroups_accept_workgroup_values() {
  let (client, _) = setup();
  let wg = client.get("test:1").unwrap();
  let nested = wg.members().unwrap().workgroups().clone();
  let test2 = client.get("test:2").unwrap();

  assert!(nested.contains(&test2));
  nested.remove(&test2).unwrap();
  assert!(!nested.contains("test:2"));

  let partial = client.search_by_name("private:*").unwrap().remove(0);
  nested.add(&partial).unwrap();
  assert!(nested.contains("private:1"));
  assert!(nested.iter().all(|name| name.contains(':')));
}

#[test]
fn failed_add_leaves_local_state_untouched() {
  let (client, _) = setup();
  let wg = client.get("test:1").unwrap();
  let people = wg.members().unwrap().people().clone();
  assert!(matches!(people.add("bad400"), Err(Error::UpstreamFailure(_))));
  assert!(matches!(people.add("bad401"), Err(Error::PermissionDenied(_))));
  assert!(!people.contains("bad400"));
  assert_eq!(wg.last_update().unwrap(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
}

#[test]
fn soft_delete_during_membership_change() {
  let (client, _) = setup();
  let wg = client.get("test:1").unwrap();
  let people = wg.members().unwrap().people().clone();
  assert!(matches!(people.add("inactive"), Err(Error::SoftDeleted(ref n)) if n == "test:1"));
  assert!(wg.is_deleted());
  assert!(people.is_empty());
  assert!(matches!(people.add("someone"), Err(Error::Deleted(_))));
}

#[test]
fn upstream_divergence_is_tolerated() {
  let (client, fake) = setup();
  let wg = client.get("test:1").unwrap();
  let people = wg.members().unwrap().people().clone();

  // Someone else removed jane and added sam.
  {
    let mut upstream = fake.state.borrow_mut();
    let group = upstream.get_mut("test:1").unwrap();
    group.members.retain(|(_, id)| id != "jane");
    group.members.push(("PERSON".into(), "sam".into()));
  }
  assert!(matches!(people.discard("jane"), Err(Error::NotFound(_))));
  assert!(!people.contains("jane"));
  assert!(matches!(people.add("sam"), Err(Error::AlreadyExists(_))));
  assert!(!people.contains("sam"));
}

#[test]
fn collections_outliving_their_workgroup() {
  let (client, fake) = setup();
  let wg = client.get("test:1").unwrap();
  let members = wg.members().unwrap();
  assert!(members.people().owner().unwrap().ptr_eq(&wg));

  drop(wg);
  client.clear_cache();
  let requests = fake.mock.request_count();
  assert!(members.people().owner().is_none());
  assert!(matches!(members.people().add("leland2"), Err(Error::OwnerGone)));
  assert!(matches!(members.workgroups().discard("test:2"), Err(Error::OwnerGone)));
  assert_eq!(fake.mock.request_count(), requests);
}

// ─── Privilege projection ────────────────────────────────────────────────────

#[test]
fn privilege_projection() {
  let (client, fake) = setup();
  let projection = client.get("test:1").unwrap().privilege_projection().unwrap();
  let ids: Vec<&str> = projection.members.iter().map(|e| e.id.as_str()).collect();
  assert_eq!(ids, ["jane", "leland"]);
  assert!(projection.members.iter().all(|e| !e.name.ends_with(' ')));
  assert!(projection.administrators.iter().any(|e| e.id == "akkornel"));

  let private = client.get("private:1").unwrap();
  let requests = fake.mock.request_count();
  assert!(matches!(private.privilege_projection(), Err(Error::PermissionDenied(_))));
  assert_eq!(fake.mock.request_count(), requests);

  assert!(client.get("private:2").unwrap().privilege_projection().is_ok());
}

#[test]
fn privilege_projection_errors() {
  let (client, fake) = setup();
  let wg = client.get("test:1").unwrap();
  fake.mock.route_text(Method::Get, &path("test:1/privgroup"), 500, "kaboom");
  assert!(matches!(wg.privilege_projection(), Err(Error::UpstreamFailure(_))));
  fake.mock.route_text(Method::Get, &path("test:1/privgroup"), 403, "");
  assert!(matches!(wg.privilege_projection(), Err(Error::PermissionDenied(_))));
  fake.mock.route_text(Method::Get, &path("test:1/privgroup"), 400, "Workgroup test:1 is inactive");
  assert!(matches!(wg.privilege_projection(), Err(Error::SoftDeleted(_))));
  assert!(wg.is_deleted());
}

// ─── Searches ────────────────────────────────────────────────────────────────

#[test]
fn search_by_name() {
  let (client, _) = setup();
  let found = client.search_by_name("test:*").unwrap();
  let names: Vec<&str> = found.iter().map(|p| p.name.as_str()).collect();
  assert_eq!(names, ["test:1", "test:2"]);
  assert_eq!(found[0].description, "Test 1");
  assert_eq!(found[1].description, "");

  let full = found[0].workgroup(&client).unwrap();
  assert!(full.ptr_eq(&client.get("test:1").unwrap()));

  assert!(client.search_by_name("nomatch:*").unwrap().is_empty());
  assert!(client.search_by_name("").unwrap_err().is_malformed());
  assert!(client.search_by_name("*:1").unwrap_err().is_malformed());
  assert!(matches!(client.search_by_name("bad:w1"), Err(Error::UpstreamFailure(_))));
  assert!(matches!(client.search_by_name("bad:w3"), Err(Error::PermissionDenied(_))));
}

#[test]
fn search_by_related_entities() {
  let (client, fake) = setup();
  let leland = client.search_by_user("leland").unwrap();
  let names = |list: &[crate::PartialWorkgroup]| list.iter().map(|p| p.name.clone()).collect::<Vec<_>>();
  assert_eq!(names(&leland.is_member), ["test:1", "test:2"]);
  assert!(leland.is_administrator.is_empty());
  assert_eq!(fake.mock.requests().pop().unwrap().target, format!("{}?type=USER&id=leland", fake::BASE_PATH));

  let akkornel = client.search_by_user("akkornel").unwrap();
  assert_eq!(names(&akkornel.is_member), ["workgroup:test-owners"]);
  assert_eq!(names(&akkornel.is_administrator), ["private:2", "test:1"]);

  let owners = client.search_by_workgroup("workgroup:test-owners").unwrap();
  assert_eq!(names(&owners.is_administrator), ["test:1", "test:2"]);

  let cert = client.search_by_certificate("client-cert-1").unwrap();
  assert_eq!(names(&cert.is_member), ["test:1"]);

  assert!(client.search_by_user("").unwrap_err().is_malformed());
  assert!(matches!(client.search_by_user("bad400"), Err(Error::UpstreamFailure(_))));
  assert!(matches!(client.search_by_certificate("bad401"), Err(Error::PermissionDenied(_))));
}

// ─── Display ─────────────────────────────────────────────────────────────────

#[test]
fn display_summarises_the_workgroup() {
  let (client, _) = setup();
  let wg = client.get("test:2").unwrap();
  let shown = wg.to_string();
  assert!(shown.starts_with("Workgroup(name=\"test:2\""));
  assert!(shown.contains("filter=FACULTY_STAFF"));
  assert!(shown.contains("\"leland\""));

  wg.delete().unwrap();
  assert_eq!(wg.to_string(), "Workgroup(deleted)");
}
