//! Account client tests against the canned Account API in `fixtures`.


use std::{collections::BTreeSet, rc::Rc};

use mais_core::{Error, mock::MockTransport};

use crate::{
  AccountClient, AccountStatus, ServiceKind, ServiceStatus, ValidationResult, validate,
  validate_str,
};

fn client() -> (AccountClient, Rc<MockTransport>) {
  let mock = fixtures::transport();
  (AccountClient::new(mock.client()), mock)
}

fn set(ids: &[&str]) -> BTreeSet<String> { ids.iter().map(|s| s.to_string()).collect() }

// ─── Lookups ─────────────────────────────────────────────────────────────────

#[test]
fn full_person() {
  let (accounts, _) = client();
  let account = accounts.get("fullprsn").unwrap();
  assert_eq!(account.id, "fullprsn");
  assert_eq!(account.name, "Full Person");
  assert!(account.is_person());
  assert!(account.is_active);
  assert!(account.is_full);
  assert_eq!(account.last_update.to_rfc3339(), "2020-01-03T15:14:13+00:00");
  assert_eq!(account.raw["id"], "fullprsn");

  let kerberos = account.services.kerberos().unwrap();
  assert_eq!(kerberos.principal.as_deref(), Some("fullprsn"));
  assert_eq!(kerberos.uid, Some(12345));
  assert_eq!(account.services.afs().unwrap().homedirectory.as_deref(), Some("/afs/te/users/f/u/fullprsn"));
  assert!(account.services.autoreply().is_none());
}

#[test]
fn former_person_is_inactive_and_not_full() {
  let (accounts, _) = client();
  let account = accounts.get("formerpsn").unwrap();
  assert!(!account.is_active);
  assert!(!account.is_full);
  assert!(account.services.is_empty());
}

#[test]
fn frozen_kerberos_does_not_affect_fullness() {
  let (accounts, _) = client();
  let account = accounts.get("frozprsn").unwrap();
  assert!(account.is_full);
  let kerberos = account.services.get(ServiceKind::Kerberos).unwrap();
  assert_eq!(kerberos.status(), ServiceStatus::Frozen);
  assert_eq!(account.services.seas().unwrap().sunetid, ["frozprsn", "frozen.person"]);
}

#[test]
fn base_and_functional_accounts() {
  let (accounts, _) = client();
  let base = accounts.get("afilbase").unwrap();
  assert!(base.is_active && !base.is_full);

  let functional = accounts.get("functional").unwrap();
  assert!(!functional.is_person());
  assert!(!functional.is_full);

  let mailbox = accounts.get("sharedmailbox").unwrap();
  assert_eq!(mailbox.services.len(), 1, "unknown services are skipped");
}

#[test]
fn get_is_identity_preserving_until_cleared() {
  let (accounts, mock) = client();
  let first = accounts.get("fullprsn").unwrap();
  let second = accounts.get("fullprsn").unwrap();
  assert!(Rc::ptr_eq(&first, &second));
  assert_eq!(mock.request_count(), 1);

  accounts.clear_cache();
  let third = accounts.get("fullprsn").unwrap();
  assert!(!Rc::ptr_eq(&first, &third));
  assert_eq!(*first, *third);
  assert_eq!(mock.request_count(), 2);
}

#[test]
fn alias_suffix_is_stripped() {
  let (accounts, mock) = client();
  let aliased = accounts.get("fullprsn@stanford.edu").unwrap();
  assert_eq!(aliased.id, "fullprsn");
  let plain = accounts.get("fullprsn").unwrap();
  assert!(Rc::ptr_eq(&aliased, &plain));
  assert_eq!(mock.request_count(), 1);
}

#[test]
fn malformed_identifiers_never_reach_the_network() {
  let (accounts, mock) = client();
  for id in ["", "ßeta", &"x".repeat(65)] {
    assert!(accounts.get(id).unwrap_err().is_malformed(), "{id:?}");
  }
  assert_eq!(mock.request_count(), 0);
}

#[test]
fn error_statuses() {
  let (accounts, _) = client();
  assert!(matches!(accounts.get("nobody"), Err(Error::NotFound(_))));
  assert!(matches!(accounts.get("hidden1"), Err(Error::PermissionDenied(_))));
  assert!(matches!(accounts.get("hidden3"), Err(Error::PermissionDenied(_))));
  assert!(matches!(accounts.get("broken4"), Err(Error::UpstreamFailure(_))));
  assert!(matches!(accounts.get("broken5"), Err(Error::UpstreamFailure(_))));
  assert!(matches!(
    accounts.get("weird6"),
    Err(Error::UnrecognizedResponse { status: 418, .. })
  ));
  assert!(matches!(accounts.get("retired7"), Err(Error::SoftDeleted(_))));
  assert!(!accounts.contains("retired7").unwrap());
}

#[test]
fn contains() {
  let (accounts, _) = client();
  assert!(accounts.contains("fullprsn").unwrap());
  assert!(!accounts.contains("nobody").unwrap());
  assert!(!accounts.only_functional().contains("fullprsn").unwrap());
  assert!(accounts.contains("hidden1").is_err());
}

// ─── Views ───────────────────────────────────────────────────────────────────

#[test]
fn filtered_views_hide_rejected_accounts() {
  let (accounts, _) = client();
  assert!(matches!(accounts.only_active().get("formerpsn"), Err(Error::NotFound(_))));
  assert!(accounts.only_inactive().get("formerpsn").is_ok());
  assert!(matches!(accounts.only_people().get("functional"), Err(Error::NotFound(_))));
  assert!(accounts.only_functional().get("functional").is_ok());
  assert!(matches!(accounts.only_functional().get("fullprsn"), Err(Error::NotFound(_))));
}

#[test]
fn filter_stacking_is_commutative() {
  let (accounts, _) = client();
  let a = accounts.only_active().only_people();
  let b = accounts.only_people().only_active();
  assert_eq!(a.filters().collect::<Vec<_>>(), b.filters().collect::<Vec<_>>());

  for id in fixtures::accounts().iter().map(|a| a["id"].as_str().unwrap()) {
    assert_eq!(a.contains(id).unwrap(), b.contains(id).unwrap(), "{id}");
  }
  assert!(a.contains("fullprsn").unwrap());
  assert!(!a.contains("formerpsn").unwrap());
  assert!(!a.contains("functional").unwrap());
}

#[test]
fn views_share_the_cache() {
  let (accounts, mock) = client();
  let people = accounts.only_people();
  let via_view = people.get("fullprsn").unwrap();
  let via_base = accounts.get("fullprsn").unwrap();
  assert!(Rc::ptr_eq(&via_view, &via_base));
  assert_eq!(mock.request_count(), 1);

  // A rejected lookup still populates the shared cache.
  assert!(people.get("functional").is_err());
  accounts.get("functional").unwrap();
  assert_eq!(mock.request_count(), 2);

  people.clear_cache();
  accounts.get("fullprsn").unwrap();
  assert_eq!(mock.request_count(), 3);
}

// ─── Changed status ──────────────────────────────────────────────────────────

#[test]
fn changed_status_rejects_out_of_range_days() {
  let (accounts, mock) = client();
  for days in [0, 31] {
    let err = accounts.get_changed_status(days, AccountStatus::Active, true).unwrap_err();
    assert!(err.is_malformed());
  }
  assert_eq!(mock.request_count(), 0);
}

#[test]
fn changed_status_results_match_full_accounts() {
  let (accounts, _) = client();
  for (status, people, expected) in [
    (AccountStatus::Active, true, 4),
    (AccountStatus::Inactive, true, 1),
    (AccountStatus::Active, false, 2),
    (AccountStatus::Inactive, false, 1),
    (AccountStatus::Pending, true, 0),
  ] {
    let results = accounts.get_changed_status(30, status, people).unwrap();
    assert_eq!(results.len(), expected, "{status} people={people}");
    for partial in results {
      let full = partial.account(&accounts).unwrap();
      assert_eq!(partial.id, full.id);
      assert_eq!(partial.is_person, full.is_person());
      assert_eq!(partial.is_active, full.is_active);
      assert_eq!(partial.last_update, full.last_update);
    }
  }
}

#[test]
fn changed_status_errors() {
  let (accounts, _) = client();
  assert!(matches!(
    accounts.get_changed_status(2, AccountStatus::Pending, true),
    Err(Error::UpstreamFailure(_))
  ));
  assert!(matches!(
    accounts.get_changed_status(2, AccountStatus::Pending, false),
    Err(Error::PermissionDenied(_))
  ));
}

// ─── Validation ──────────────────────────────────────────────────────────────

fn assert_expected(result: &ValidationResult) {
  assert_eq!(result.full, set(&["fullprsn", "affilite"]));
  assert_eq!(result.base, set(&["afilbase"]));
  assert_eq!(result.inactive, set(&["formerpsn"]));
  assert_eq!(result.unknown, set(&["functional", "nobody", "x@y"]));

  let union: BTreeSet<String> = [&result.full, &result.base, &result.inactive, &result.unknown]
    .into_iter()
    .flatten()
    .cloned()
    .collect();
  assert_eq!(union, result.raw_set);
}

#[test]
fn validate_is_shape_invariant() {
  let (accounts, _) = client();
  let ids = ["fullprsn", "affilite", "afilbase", "formerpsn", "functional", "nobody", "x@y"];

  let from_str = validate_str(
    "fullprsn, affilite,afilbase\n formerpsn\tfunctional nobody,,x@y fullprsn",
    &accounts,
  )
  .unwrap();
  assert_expected(&from_str);
  assert!(from_str.raw.is_some());

  let from_slice = validate(ids, &accounts).unwrap();
  let from_vec = validate(ids.iter().map(|s| s.to_string()).collect::<Vec<_>>(), &accounts).unwrap();
  let from_set = validate(set(&ids), &accounts).unwrap();
  let from_dupes = validate(ids.iter().chain(ids.iter()).copied(), &accounts).unwrap();

  for result in [&from_slice, &from_vec, &from_set, &from_dupes] {
    assert_expected(result);
    assert_eq!(result.raw, None);
    assert_eq!(result.raw_set, from_str.raw_set);
  }
}

#[test]
fn validate_records_canonical_identifiers() {
  let (accounts, _) = client();
  let result = validate_str("fullprsn@stanford.edu", &accounts).unwrap();
  assert_eq!(result.raw_set, set(&["fullprsn@stanford.edu"]));
  assert_eq!(result.full, set(&["fullprsn"]));
}

#[test]
fn validate_counts_soft_deleted_as_unknown() {
  let (accounts, _) = client();
  let result = validate(["retired7", "fullprsn"], &accounts).unwrap();
  assert_eq!(result.unknown, set(&["retired7"]));
  assert_eq!(result.full, set(&["fullprsn"]));
}

#[test]
fn validate_propagates_other_errors() {
  let (accounts, _) = client();
  assert!(matches!(
    validate(["fullprsn", "hidden1"], &accounts),
    Err(Error::PermissionDenied(_))
  ));
  assert!(matches!(validate_str("broken5", &accounts), Err(Error::UpstreamFailure(_))));
}

#[test]
fn validate_empty_input() {
  let (accounts, mock) = client();
  let result = validate_str(" , \n", &accounts).unwrap();
  assert!(result.raw_set.is_empty());
  assert!(result.full.is_empty() && result.unknown.is_empty());
  assert_eq!(mock.request_count(), 0);
}
