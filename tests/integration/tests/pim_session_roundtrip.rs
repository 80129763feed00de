use std::cell::RefCell;
use std::rc::Rc;

use httpmock::prelude::*;
use pim_client::{authenticate, Client, ClientError, SessionTokenCache};
use pim_jsonrpc::{BatchStateError, JsonRpcTransport, ProtocolError, RpcError};
use pim_pipeline::{Middleware, PipelineError, Request, Response};
use serde_json::json;
use tempfile::tempdir;

const LOGIN_METHOD: &str = "Actindo.Modules.Actindo.UserManager.Login.login";
const LIST_METHOD: &str = "Actindo.Modules.Actindo.DataHub.AttributeSets.get";

type Journal = Rc<RefCell<Vec<String>>>;

struct Audit {
    label: &'static str,
    journal: Journal,
}

impl Middleware for Audit {
    fn prepare(&mut self, request: Box<dyn Request>) -> Box<dyn Request> {
        self.journal
            .borrow_mut()
            .push(format!("{} -> {}", self.label, request.method()));
        request
    }

    fn respond(&mut self, response: Box<dyn Response>) -> Box<dyn Response> {
        self.journal.borrow_mut().push(format!("{} <- ok", self.label));
        response
    }

    fn recover(&mut self, error: PipelineError) -> Result<Box<dyn Response>, PipelineError> {
        self.journal.borrow_mut().push(format!("{} <- err", self.label));
        Err(error)
    }
}

#[test]
fn integration_login_cache_pipeline_and_batch_share_one_session() {
    let server = MockServer::start();
    let login = server.mock(|when, then| {
        when.method(POST)
            .path("/jsonrpc")
            .json_body_includes(json!({"method": LOGIN_METHOD}).to_string());
        then.status(200).json_body(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {"sessionId": "s-e2e"}
        }));
    });
    let list = server.mock(|when, then| {
        when.method(POST)
            .path("/jsonrpc")
            .json_body_includes(json!({"method": LIST_METHOD, "auth": "s-e2e"}).to_string());
        then.status(200).json_body(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "result": {"success": true, "total": 1, "data": [{"id": 4, "key": "pim_base_set"}]}
        }));
    });
    let batch = server.mock(|when, then| {
        when.method(POST).path("/jsonrpc").json_body(json!([
            {"jsonrpc": "2.0", "method": "stock.get", "params": [{"sku": "A"}], "id": 3, "auth": "s-e2e"},
            {"jsonrpc": "2.0", "method": "stock.get", "params": [{"sku": "B"}], "id": 4, "auth": "s-e2e"}
        ]));
        then.status(200).json_body(json!([
            {"jsonrpc": "2.0", "id": 4, "error": {"code": -32602, "message": "unknown sku"}},
            {"jsonrpc": "2.0", "id": 3, "result": {"sku": "A", "qty": 9}}
        ]));
    });

    let temp = tempdir().expect("tempdir");
    let cache = SessionTokenCache::new(temp.path().join(".auth-token"));
    let journal = Journal::default();

    let mut client = Client::from_transport(JsonRpcTransport::new(server.url("/jsonrpc")));
    client.stack_mut().push_middleware_keyed(
        "audit",
        Audit {
            label: "stale",
            journal: Rc::clone(&journal),
        },
    );
    client.stack_mut().push_middleware_keyed(
        "audit",
        Audit {
            label: "audit",
            journal: Rc::clone(&journal),
        },
    );

    let token = authenticate(&mut client, &cache, "api", "secret").expect("authenticate");
    assert_eq!(token, "s-e2e");
    assert_eq!(client.base_attribute_set_id().expect("base set"), 4);

    let transport = client.transport_mut();
    transport.start_batch().expect("start batch");
    transport
        .call("stock.get", Some(json!({"sku": "A"})), false)
        .expect("queue A");
    transport
        .call("stock.get", Some(json!({"sku": "B"})), false)
        .expect("queue B");

    let blocked = client.call("system.ping", None).expect_err("batch blocks pipeline");
    assert!(matches!(
        blocked.as_rpc(),
        Some(RpcError::BatchState(BatchStateError::ActiveDuringDispatch))
    ));

    let slots = client.transport_mut().execute_batch().expect("execute batch");

    login.assert();
    list.assert();
    batch.assert();
    assert_eq!(cache.load().expect("load"), Some("s-e2e".to_string()));
    assert_eq!(slots.len(), 2);
    assert_eq!(
        slots[0].as_ref().ok(),
        Some(&Some(json!({"sku": "A", "qty": 9})))
    );
    assert!(matches!(
        slots[1],
        Err(RpcError::Protocol(ProtocolError::InvalidParams { .. }))
    ));
    assert_eq!(
        *journal.borrow(),
        vec![
            format!("audit -> {LOGIN_METHOD}"),
            "audit <- ok".to_string(),
            format!("audit -> {LIST_METHOD}"),
            "audit <- ok".to_string(),
            "audit -> system.ping".to_string(),
            "audit <- err".to_string(),
        ]
    );
}

#[test]
fn integration_fresh_cache_skips_login_entirely() {
    let server = MockServer::start();
    let any = server.mock(|when, then| {
        when.method(POST)
            .path("/jsonrpc")
            .json_body_includes(json!({"method": LOGIN_METHOD}).to_string());
        then.status(500);
    });

    let temp = tempdir().expect("tempdir");
    let cache = SessionTokenCache::new(temp.path().join(".auth-token"));
    cache.store("s-cached").expect("seed");

    let mut client = Client::from_transport(JsonRpcTransport::new(server.url("/jsonrpc")));
    let token = authenticate(&mut client, &cache, "api", "secret").expect("authenticate");
    assert_eq!(token, "s-cached");
    any.assert_calls(0);
}

#[test]
fn regression_failed_login_leaves_cache_untouched() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/jsonrpc");
        then.status(200).json_body(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32000, "message": "bad credentials"}
        }));
    });

    let temp = tempdir().expect("tempdir");
    let cache = SessionTokenCache::new(temp.path().join(".auth-token"));
    let mut client = Client::from_transport(JsonRpcTransport::new(server.url("/jsonrpc")));

    let error = authenticate(&mut client, &cache, "api", "wrong").expect_err("login fails");
    assert!(format!("{error:#}").contains("bad credentials"));
    assert!(error
        .downcast_ref::<ClientError>()
        .and_then(ClientError::as_rpc)
        .is_some());
    assert_eq!(cache.load().expect("load"), None);
    assert_eq!(client.transport().auth(), None);
}
