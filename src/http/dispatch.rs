//! Request dispatch.
//!
//! Two-level selection: the HTTP method picks a coarse action, then exactly
//! one selector field picks the sub-action.
//!
//! ```text
//! GET  → lookup  ┐
//! PUT  → command ┴→ list | info | catalog | set | resp
//! POST → add      (unimplemented)
//! DELETE → delete (unimplemented)
//! other → no output
//! ```
//!
//! Authorization runs before any sub-action touches the filesystem.

use std::time::Instant;

use axum::http::Method;

use crate::config::RelayConfig;
use crate::envelope::params::collect_parameters;
use crate::error::{RelayError, RelayResult};
use crate::http::request::RequestFields;
use crate::observability::metrics;
use crate::queue::{ActionKey, ActionQueue, ResponseDelivery};
use crate::routing::{DocumentKind, FileRouter};
use crate::security::AuthGate;

/// Selector field names, mutually exclusive.
pub const SELECTORS: [&str; 5] = ["list", "info", "catalog", "set", "resp"];

/// Fields that never become `<parameter>` elements.
pub const RESERVED_FIELDS: [&str; 2] = ["set", "act"];

/// Field carrying `<actionID>,<uniqRequestID>`.
pub const ACT_FIELD: &str = "act";

/// Optional field carrying the key for catalog lookups.
pub const KEY_FIELD: &str = "key";

/// Coarse action chosen by the HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Lookup,
    Add,
    Command,
    Delete,
}

impl Action {
    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Action::Lookup),
            Method::POST => Some(Action::Add),
            Method::PUT => Some(Action::Command),
            Method::DELETE => Some(Action::Delete),
            _ => None,
        }
    }
}

/// Sub-action plus the key it presents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    List { key: String },
    Info { key: String },
    Catalog { device_id: String, key: String },
    Set { key: String },
    Resp { key: String },
}

impl Selector {
    pub fn parse(fields: &RequestFields) -> RelayResult<Self> {
        let present: Vec<&str> = SELECTORS
            .iter()
            .copied()
            .filter(|name| fields.contains(name))
            .collect();

        let name = match present.as_slice() {
            [] => {
                return Err(RelayError::bad_request(
                    "SUB-ACTION != [list|info|catalog|set|resp]",
                ))
            }
            [one] => *one,
            _ => {
                return Err(RelayError::bad_request(format!(
                    "ERROR- only one of [list|info|catalog|set|resp] allowed, got [{}]",
                    present.join("|")
                )))
            }
        };

        let value = fields.get(name).unwrap_or_default().to_string();
        Ok(match name {
            "list" => Selector::List { key: value },
            "info" => Selector::Info { key: value },
            // an explicit `key` field wins; otherwise the selector value is the key
            "catalog" => Selector::Catalog {
                key: fields.get(KEY_FIELD).unwrap_or(value.as_str()).to_string(),
                device_id: value,
            },
            "set" => Selector::Set { key: value },
            _ => Selector::Resp { key: value },
        })
    }

    pub fn key(&self) -> &str {
        match self {
            Selector::List { key }
            | Selector::Info { key }
            | Selector::Catalog { key, .. }
            | Selector::Set { key }
            | Selector::Resp { key } => key,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Selector::List { .. } => "list",
            Selector::Info { .. } => "info",
            Selector::Catalog { .. } => "catalog",
            Selector::Set { .. } => "set",
            Selector::Resp { .. } => "resp",
        }
    }
}

/// What the transport should send back.
#[derive(Debug)]
pub enum Reply {
    /// `text/plain` status or diagnostic line.
    Text(String),
    /// `text/xml` document.
    Xml(Vec<u8>),
    /// `text/xml` response envelope, consumed once sent.
    Delivery(ResponseDelivery),
    /// Nothing at all.
    Empty,
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Text("OK\n".to_string())
    }
}

impl From<RelayError> for Reply {
    fn from(err: RelayError) -> Self {
        Reply::Text(err.diagnostic())
    }
}

/// Maps method + fields to the auth gate, router and queue.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    gate: AuthGate,
    router: FileRouter,
    queue: ActionQueue,
}

impl Dispatcher {
    pub fn new(gate: AuthGate, router: FileRouter, queue: ActionQueue) -> Self {
        Self {
            gate,
            router,
            queue,
        }
    }

    pub fn from_config(config: &RelayConfig, gate: AuthGate) -> Self {
        Self::new(
            gate,
            FileRouter::from_config(config),
            ActionQueue::from_config(config),
        )
    }

    /// Handle one request.
    pub async fn dispatch(&self, method: &Method, fields: &RequestFields) -> Reply {
        let start = Instant::now();

        let Some(action) = Action::from_method(method) else {
            tracing::debug!(method = %method, "Unsupported method, no output");
            metrics::record_request("none", "bad_request", start);
            return Reply::Empty;
        };

        match action {
            Action::Add | Action::Delete => {
                tracing::debug!(?action, "Unimplemented action");
                metrics::record_request("none", "bad_request", start);
                RelayError::bad_request("ACTION != lookup").into()
            }
            Action::Lookup | Action::Command => {
                let (sub_action, result) = self.lookup(fields).await;
                match result {
                    Ok(reply) => {
                        metrics::record_request(sub_action, "ok", start);
                        reply
                    }
                    Err(err) => {
                        tracing::warn!(sub_action, error = %err, "Request rejected");
                        metrics::record_request(sub_action, err.outcome(), start);
                        err.into()
                    }
                }
            }
        }
    }

    async fn lookup(&self, fields: &RequestFields) -> (&'static str, RelayResult<Reply>) {
        let selector = match Selector::parse(fields) {
            Ok(selector) => selector,
            Err(err) => return ("none", Err(err)),
        };
        let sub_action = selector.name();

        if !self.gate.validate(selector.key()) {
            return (sub_action, Err(RelayError::Unauthorized));
        }

        let result = match selector {
            Selector::List { .. } => self.document(DocumentKind::List).await,
            Selector::Info { .. } => self.document(DocumentKind::Info).await,
            Selector::Catalog { device_id, .. } => {
                self.document(DocumentKind::Catalog(device_id)).await
            }
            Selector::Set { .. } => self.set(fields).await,
            Selector::Resp { .. } => self.resp(fields).await,
        };
        (sub_action, result)
    }

    async fn document(&self, kind: DocumentKind) -> RelayResult<Reply> {
        let doc = self.router.fetch(&kind).await?;
        tracing::debug!(document = %doc.name, bytes = doc.bytes.len(), "Serving document");
        Ok(Reply::Xml(doc.bytes))
    }

    async fn set(&self, fields: &RequestFields) -> RelayResult<Reply> {
        let key = action_key(fields)?;
        let parameters = collect_parameters(fields.iter(), &RESERVED_FIELDS);
        self.queue.write_request(key, &parameters).await?;
        Ok(Reply::ok())
    }

    async fn resp(&self, fields: &RequestFields) -> RelayResult<Reply> {
        let key = action_key(fields)?;
        Ok(Reply::Delivery(self.queue.read_response(key).await?))
    }
}

fn action_key(fields: &RequestFields) -> RelayResult<ActionKey> {
    let raw = fields
        .get(ACT_FIELD)
        .ok_or_else(|| RelayError::bad_request("ERROR- missing act=<actionID>,<uniqRequestID>"))?;
    ActionKey::parse(raw)
        .ok_or_else(|| RelayError::bad_request(format!("ERROR- invalid act [{}]", raw)))
}
