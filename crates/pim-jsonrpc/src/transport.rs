use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::{
    decode_batch_response, decode_single_response, BatchSlot, BatchState, BatchStateError,
    PendingCall, RequestEnvelope, RpcError, TransportConfig, TransportError,
};

#[derive(Debug)]
/// Blocking JSON-RPC 2.0 client bound to one endpoint.
///
/// Holds the session token and batch state as plain instance fields: use one
/// transport per execution context, or synchronize externally.
pub struct JsonRpcTransport {
    config: TransportConfig,
    auth: Option<String>,
    batch: BatchState,
    next_id: u64,
    client: Option<reqwest::blocking::Client>,
    last_response_headers: BTreeMap<String, String>,
}

impl JsonRpcTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_config(TransportConfig::new(endpoint))
    }

    pub fn with_config(config: TransportConfig) -> Self {
        Self {
            config,
            auth: None,
            batch: BatchState::default(),
            next_id: 1,
            client: None,
            last_response_headers: BTreeMap::new(),
        }
    }

    /// Calls `method` with a single positional argument.
    ///
    /// In batch mode the call is queued and `Ok(None)` is returned right away.
    /// Otherwise the call is sent immediately; notifications never parse a
    /// result.
    pub fn call(
        &mut self,
        method: &str,
        arg: Option<Value>,
        notify: bool,
    ) -> Result<Option<Value>, RpcError> {
        let envelope = self.build_envelope(method, arg, notify);
        self.dispatch(envelope, None)
    }

    /// Like `call`, but sends the immediate exchange with `http_method`.
    ///
    /// Queued calls keep the override on their pending entry; the batch itself
    /// is always sent with the configured default verb.
    pub fn call_with_http_method(
        &mut self,
        method: &str,
        arg: Option<Value>,
        http_method: Method,
    ) -> Result<Option<Value>, RpcError> {
        let envelope = self.build_envelope(method, arg, false);
        self.dispatch(envelope, Some(http_method))
    }

    /// Builds an envelope with the auth token as it is set right now.
    pub fn build_envelope(
        &mut self,
        method: &str,
        arg: Option<Value>,
        notify: bool,
    ) -> RequestEnvelope {
        let id = if notify { None } else { Some(self.allocate_id()) };
        RequestEnvelope::new(method, arg, id, self.auth.as_deref())
    }

    pub fn start_batch(&mut self) -> Result<(), BatchStateError> {
        self.batch.start()?;
        tracing::debug!(endpoint = self.config.endpoint.as_str(), "json-rpc batch started");
        Ok(())
    }

    /// Leaves batch mode and returns the envelopes that were never sent.
    pub fn discard_batch(&mut self) -> Result<Vec<RequestEnvelope>, BatchStateError> {
        let discarded = self.batch.discard()?;
        tracing::debug!(
            endpoint = self.config.endpoint.as_str(),
            batch_len = discarded.len(),
            "json-rpc batch discarded"
        );
        Ok(discarded)
    }

    /// Sends every queued call in one exchange and resolves each position.
    ///
    /// A transport failure fails the whole batch. Protocol errors are captured
    /// in their own slot and never abort sibling results.
    pub fn execute_batch(&mut self) -> Result<Vec<BatchSlot>, RpcError> {
        let calls = self.batch.take_for_execution()?;
        let expected_ids = calls
            .iter()
            .map(|call| call.envelope.id)
            .collect::<Vec<_>>();
        let envelopes = calls
            .iter()
            .map(|call| &call.envelope)
            .collect::<Vec<_>>();
        let http_method = self.config.http_method.clone();
        let body = self.perform_exchange(&envelopes, &http_method)?;
        let slots = decode_batch_response(&body, &expected_ids)?;
        tracing::debug!(
            endpoint = self.config.endpoint.as_str(),
            batch_len = slots.len(),
            failed = slots.iter().filter(|slot| slot.is_err()).count(),
            "json-rpc batch resolved"
        );
        Ok(slots)
    }

    pub fn in_batch_mode(&self) -> bool {
        self.batch.is_active()
    }

    pub fn pending_batch_len(&self) -> usize {
        self.batch.len()
    }

    pub fn pending_batch(&self) -> &[PendingCall] {
        self.batch.pending()
    }

    /// Applies to envelopes built after this call; queued envelopes keep their token.
    pub fn set_auth(&mut self, token: impl Into<String>) -> &mut Self {
        self.auth = Some(token.into());
        self
    }

    pub fn clear_auth(&mut self) -> &mut Self {
        self.auth = None;
        self
    }

    pub fn auth(&self) -> Option<&str> {
        self.auth.as_deref()
    }

    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.config.set_header(name, value);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.config.header(name)
    }

    /// Sets both the connect and the total timeout.
    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.config.timeout_ms = millis;
        self.config.connect_timeout_ms = millis;
        self.client = None;
        self
    }

    pub fn set_connect_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.config.connect_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.client = None;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }

    pub fn set_verify_tls(&mut self, verify: bool) -> &mut Self {
        self.config.verify_tls = verify;
        self.client = None;
        self
    }

    pub fn verify_tls(&self) -> bool {
        self.config.verify_tls
    }

    pub fn set_http_method(&mut self, http_method: Method) -> &mut Self {
        self.config.http_method = http_method;
        self
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Headers of the most recent HTTP exchange, keyed by lowercase name.
    pub fn last_response_headers(&self) -> &BTreeMap<String, String> {
        &self.last_response_headers
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    fn dispatch(
        &mut self,
        envelope: RequestEnvelope,
        http_method: Option<Method>,
    ) -> Result<Option<Value>, RpcError> {
        if self.batch.is_active() {
            self.batch.enqueue(PendingCall {
                envelope,
                http_method,
            });
            return Ok(None);
        }

        let http_method = http_method.unwrap_or_else(|| self.config.http_method.clone());
        let body = self.perform_exchange(&envelope, &http_method)?;
        decode_single_response(&body, envelope.id)
    }

    fn http_client(&mut self) -> Result<reqwest::blocking::Client, TransportError> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(self.config.timeout_ms.max(1)))
            .connect_timeout(Duration::from_millis(self.config.connect_timeout_ms.max(1)))
            .redirect(reqwest::redirect::Policy::limited(self.config.max_redirects))
            .danger_accept_invalid_certs(!self.config.verify_tls)
            .build()
            .map_err(TransportError::ClientBuild)?;
        self.client = Some(client.clone());
        Ok(client)
    }

    fn perform_exchange<T: Serialize + ?Sized>(
        &mut self,
        payload: &T,
        http_method: &Method,
    ) -> Result<Vec<u8>, TransportError> {
        self.last_response_headers.clear();

        let endpoint = self.config.endpoint.trim().to_string();
        let url = reqwest::Url::parse(&endpoint).map_err(|error| TransportError::InvalidEndpoint {
            endpoint: endpoint.clone(),
            message: error.to_string(),
        })?;
        let body = serde_json::to_vec(payload).map_err(TransportError::Encode)?;
        let headers = self.config.header_map()?;
        let client = self.http_client()?;

        tracing::debug!(
            endpoint = endpoint.as_str(),
            http_method = http_method.as_str(),
            body_bytes = body.len(),
            "sending json-rpc request"
        );
        let response = client
            .request(http_method.clone(), url)
            .headers(headers)
            .body(body)
            .send()
            .map_err(|error| {
                tracing::warn!(
                    endpoint = endpoint.as_str(),
                    error = %error,
                    "json-rpc http exchange failed"
                );
                TransportError::Network(error)
            })?;

        let status = response.status().as_u16();
        self.last_response_headers = collect_headers(response.headers());
        let raw = response.bytes().map_err(TransportError::Network)?;
        tracing::debug!(
            endpoint = endpoint.as_str(),
            status,
            body_bytes = raw.len(),
            "received json-rpc response"
        );

        if status != 200 && status != 204 {
            tracing::warn!(
                endpoint = endpoint.as_str(),
                status,
                "json-rpc endpoint returned unexpected status"
            );
            return Err(TransportError::HttpStatus {
                status,
                body: String::from_utf8_lossy(&raw).into_owned(),
            });
        }
        Ok(raw.to_vec())
    }
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.trim().to_string()))
        })
        .collect()
}
