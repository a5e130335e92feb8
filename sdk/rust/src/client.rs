//! Async client for the device relay.
//!
//! The relay answers every request with `200 OK`; this client sorts the body
//! into an acknowledgement, a document or a diagnostic line.

use std::time::Duration;

use reqwest::{header::CONTENT_TYPE, Client, Response};

/// Diagnostic prefix the relay uses while a response is not yet available.
pub const NOT_READY_PREFIX: &str = "ERROR- File NOT found!";

/// Classified relay reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `set` was accepted.
    Ok,
    /// An XML document (list, info, catalog or action response).
    Document(String),
    /// A plain-text diagnostic, trailing newline removed.
    Diagnostic(String),
}

impl Reply {
    /// Classify a body by its content type.
    pub fn classify(content_type: Option<&str>, body: String) -> Self {
        let is_xml = content_type
            .map(|ct| ct.starts_with("text/xml"))
            .unwrap_or(false);
        if is_xml {
            return Reply::Document(body);
        }
        match body.trim_end() {
            "OK" => Reply::Ok,
            text => Reply::Diagnostic(text.to_string()),
        }
    }

    /// True while the controller has not written the response yet.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Reply::Diagnostic(text) if text.starts_with(NOT_READY_PREFIX))
    }
}

pub struct RelayClient {
    client: Client,
    relay_url: String,
    key: String,
}

impl RelayClient {
    pub fn new(relay_url: &str, key: &str) -> Self {
        Self {
            client: Client::new(),
            relay_url: relay_url.trim_end_matches('/').to_string(),
            key: key.to_string(),
        }
    }

    /// Fetch the node list document.
    pub async fn list(&self) -> Result<Reply, reqwest::Error> {
        self.get(&[("list", self.key.clone())]).await
    }

    /// Fetch the info document.
    pub async fn info(&self) -> Result<Reply, reqwest::Error> {
        self.get(&[("info", self.key.clone())]).await
    }

    /// Fetch the catalog document of one device.
    pub async fn catalog(&self, device_id: &str) -> Result<Reply, reqwest::Error> {
        self.get(&[("catalog", device_id.to_string()), ("key", self.key.clone())])
            .await
    }

    /// Queue an action request. `params` are `(id, value)` pairs.
    pub async fn set_action(
        &self,
        action_id: u32,
        request_id: u32,
        params: &[(&str, &str)],
    ) -> Result<Reply, reqwest::Error> {
        let mut query = vec![
            ("set".to_string(), self.key.clone()),
            ("act".to_string(), format!("{},{}", action_id, request_id)),
        ];
        for (i, (id, value)) in params.iter().enumerate() {
            query.push((format!("p{}", i), format!("{},{}", id, value)));
        }
        let res = self.client.get(&self.relay_url).query(&query).send().await?;
        read_reply(res).await
    }

    /// Fetch (and thereby consume) an action response once.
    pub async fn resp(&self, action_id: u32, request_id: u32) -> Result<Reply, reqwest::Error> {
        self.get(&[
            ("resp", self.key.clone()),
            ("act", format!("{},{}", action_id, request_id)),
        ])
        .await
    }

    /// Re-poll `resp` until the response shows up or `attempts` run out.
    ///
    /// Returns the last reply either way.
    pub async fn poll_response(
        &self,
        action_id: u32,
        request_id: u32,
        interval: Duration,
        attempts: u32,
    ) -> Result<Reply, reqwest::Error> {
        let mut reply = self.resp(action_id, request_id).await?;
        for _ in 1..attempts {
            if !reply.is_not_ready() {
                break;
            }
            tokio::time::sleep(interval).await;
            reply = self.resp(action_id, request_id).await?;
        }
        Ok(reply)
    }

    async fn get(&self, query: &[(&str, String)]) -> Result<Reply, reqwest::Error> {
        let res = self.client.get(&self.relay_url).query(query).send().await?;
        read_reply(res).await
    }
}

async fn read_reply(res: Response) -> Result<Reply, reqwest::Error> {
    let content_type = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = res.error_for_status()?.text().await?;
    Ok(Reply::classify(content_type.as_deref(), body))
}
