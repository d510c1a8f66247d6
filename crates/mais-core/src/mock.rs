//! In-memory [`Transport`] for tests.
//!
//! Requests are answered from canned routes keyed by method and
//! `path?query`, then by an optional handler closure (for fakes that keep
//! state), and otherwise with a 404. Every request is logged so tests can
//! assert that a code path made no network call.

use std::{
  cell::RefCell,
  collections::{BTreeMap, HashMap},
  rc::Rc,
};

use serde_json::Value;
use url::Url;

use crate::{
  client::{ApiFamily, MaisClient},
  error::Result,
  transport::{Method, Response, Transport},
};

pub const ACCOUNT_BASE: &str = "http://mais.test/accounts/";
pub const WORKGROUP_BASE: &str = "http://mais.test/workgroups/2.0";

type Handler = Box<dyn Fn(Method, &str, Option<&Value>) -> Option<Response>>;

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
  pub method: Method,
  pub target: String,
  pub body:   Option<Value>,
}

#[derive(Default)]
pub struct MockTransport {
  routes:  RefCell<HashMap<(Method, String), Response>>,
  handler: RefCell<Option<Handler>>,
  log:     RefCell<Vec<Recorded>>,
}

impl MockTransport {
  pub fn new() -> Rc<Self> { Rc::new(Self::default()) }

  /// A client whose account and workgroup families point at this mock.
  pub fn client(self: &Rc<Self>) -> MaisClient {
    let urls = BTreeMap::from([
      (ApiFamily::Account, Url::parse(ACCOUNT_BASE).expect("valid test url")),
      (ApiFamily::Workgroup, Url::parse(WORKGROUP_BASE).expect("valid test url")),
    ]);
    MaisClient::new(urls, self.clone())
  }

  pub fn route(&self, method: Method, target: &str, status: u16, body: &Value) {
    self.route_text(method, target, status, body.to_string());
  }

  pub fn route_text(&self, method: Method, target: &str, status: u16, body: impl Into<String>) {
    self
      .routes
      .borrow_mut()
      .insert((method, target.to_owned()), Response::new(status, body));
  }

  pub fn handler(&self, f: impl Fn(Method, &str, Option<&Value>) -> Option<Response> + 'static) {
    *self.handler.borrow_mut() = Some(Box::new(f));
  }

  pub fn requests(&self) -> Vec<Recorded> { self.log.borrow().clone() }

  pub fn request_count(&self) -> usize { self.log.borrow().len() }

  pub fn clear_log(&self) { self.log.borrow_mut().clear() }
}

/// `path?query` as the mock keys it.
pub fn target(url: &Url) -> String {
  match url.query() {
    Some(query) => format!("{}?{query}", url.path()),
    None => url.path().to_owned(),
  }
}

impl Transport for MockTransport {
  fn execute(&self, method: Method, url: &Url, body: Option<&Value>) -> Result<Response> {
    let target = target(url);
    self.log.borrow_mut().push(Recorded {
      method,
      target: target.clone(),
      body: body.cloned(),
    });

    if let Some(response) = self.routes.borrow().get(&(method, target.clone())) {
      return Ok(response.clone());
    }
    let handled = self
      .handler
      .borrow()
      .as_ref()
      .and_then(|handler| handler(method, &target, body));
    Ok(handled.unwrap_or_else(|| Response::new(404, r#"{"message":"no such route"}"#)))
  }
}
