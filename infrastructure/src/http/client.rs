//! reqwest-backed [`DebateApi`] adapter.
//!
//! Every request carries `Authorization: Bearer <token>` when a token is
//! configured. Non-success responses become [`ApiError::Status`] with the
//! server's `message`, or "API error" when the body has none.

use super::error::HttpError;
use async_trait::async_trait;
use debate_application::{ApiError, DebateApi};
use debate_domain::{Argument, DebateDraft, DebateId, DebateSession, OpenDebate, Results};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

/// Keys under which the server may wrap a record.
const SESSION_KEYS: [&str; 2] = ["debate", "session"];
const ARGUMENT_KEYS: [&str; 1] = ["argument"];
const RESULTS_KEYS: [&str; 1] = ["results"];

/// HTTP client for the debate server
#[derive(Clone)]
pub struct HttpDebateApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpDebateApi {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(HttpError::Client)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Makes an authenticated request.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send and return the JSON body, or `Value::Null` for an empty or
    /// non-JSON success body.
    async fn send(&self, path: &str, request: RequestBuilder) -> Result<Value, HttpError> {
        let response = request.send().await?;
        let status = response.status();
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        let body = response.text().await?;
        debug!(path, status = status.as_u16(), bytes = body.len(), "HTTP response");

        if !status.is_success() {
            return Err(HttpError::from_status(status.as_u16(), &body));
        }
        if !is_json || body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|source| HttpError::Decode {
            path: path.to_string(),
            source,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.send(path, self.request(Method::GET, path)).await?;
        Ok(decode(path, body)?)
    }

    async fn post(&self, path: &str, payload: Option<Value>) -> Result<Value, ApiError> {
        let mut request = self.request(Method::POST, path);
        if let Some(payload) = payload {
            request = request.json(&payload);
        }
        Ok(self.send(path, request).await?)
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: Value) -> Result<T, HttpError> {
    serde_json::from_value(body).map_err(|source| HttpError::Decode {
        path: path.to_string(),
        source,
    })
}

/// Unwrap `{"<key>": record}` envelopes; anything else is returned as is.
fn unwrap_envelope(body: Value, keys: &[&str]) -> Value {
    if let Value::Object(mut map) = body {
        for key in keys {
            if let Some(inner) = map.remove(*key)
                && inner.is_object()
            {
                return inner;
            }
        }
        Value::Object(map)
    } else {
        body
    }
}

/// Decode a record the server may or may not echo back.
fn decode_optional<T: DeserializeOwned>(path: &str, body: Value, keys: &[&str]) -> Option<T> {
    if body.is_null() {
        return None;
    }
    match serde_json::from_value(unwrap_envelope(body, keys)) {
        Ok(record) => Some(record),
        Err(e) => {
            debug!(path, error = %e, "Response carried no usable record");
            None
        }
    }
}

fn debate_path(debate_id: &DebateId, tail: &str) -> String {
    format!("/debates/{}/{}", debate_id, tail)
}

#[async_trait]
impl DebateApi for HttpDebateApi {
    async fn status(&self, debate_id: &DebateId) -> Result<DebateSession, ApiError> {
        let path = debate_path(debate_id, "status");
        let body = self.send(&path, self.request(Method::GET, &path)).await?;
        Ok(decode(&path, unwrap_envelope(body, &SESSION_KEYS))?)
    }

    async fn arguments(&self, debate_id: &DebateId) -> Result<Vec<Argument>, ApiError> {
        let path = debate_path(debate_id, "arguments");
        let body = self.send(&path, self.request(Method::GET, &path)).await?;
        let list = match body {
            Value::Object(mut map) => map.remove("arguments").unwrap_or(Value::Null),
            other => other,
        };
        if list.is_null() {
            return Ok(Vec::new());
        }
        Ok(decode(&path, list)?)
    }

    async fn post_argument(
        &self,
        debate_id: &DebateId,
        content: &str,
    ) -> Result<Option<Argument>, ApiError> {
        let path = debate_path(debate_id, "arguments");
        let body = self.post(&path, Some(json!({ "content": content }))).await?;
        Ok(decode_optional(&path, body, &ARGUMENT_KEYS))
    }

    async fn finalize(&self, debate_id: &DebateId) -> Result<Option<Results>, ApiError> {
        let path = debate_path(debate_id, "finalize");
        let body = self.post(&path, None).await?;
        Ok(decode_optional(&path, body, &RESULTS_KEYS))
    }

    async fn results(&self, debate_id: &DebateId) -> Result<Results, ApiError> {
        let path = debate_path(debate_id, "results");
        let body = self.send(&path, self.request(Method::GET, &path)).await?;
        Ok(decode(&path, unwrap_envelope(body, &RESULTS_KEYS))?)
    }

    async fn open_debates(&self) -> Result<Vec<OpenDebate>, ApiError> {
        let list: Option<Vec<OpenDebate>> = self.get("/debates/open").await?;
        Ok(list.unwrap_or_default())
    }

    async fn create(&self, draft: &DebateDraft) -> Result<DebateSession, ApiError> {
        let path = if draft.is_private {
            "/debates/private"
        } else {
            "/debates"
        };
        let payload = serde_json::to_value(draft)
            .map_err(|e| ApiError::InvalidResponse(format!("draft: {}", e)))?;
        let body = self.post(path, Some(payload)).await?;
        Ok(decode(path, unwrap_envelope(body, &SESSION_KEYS))?)
    }

    async fn join(&self, debate_id: &DebateId) -> Result<DebateSession, ApiError> {
        let path = debate_path(debate_id, "join");
        let body = self.post(&path, None).await?;
        let mut session: DebateSession = decode(&path, unwrap_envelope(body, &SESSION_KEYS))?;
        if session.id.as_str().is_empty() {
            session.id = debate_id.clone();
        }
        Ok(session)
    }

    async fn join_private(&self, invite_code: &str) -> Result<DebateSession, ApiError> {
        let path = "/debates/join-private";
        let body = self
            .post(path, Some(json!({ "inviteCode": invite_code })))
            .await?;
        Ok(decode(path, unwrap_envelope(body, &SESSION_KEYS))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve exactly one canned response; the handle yields the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text
                        .lines()
                        .find_map(|l| {
                            l.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });
        (url, handle)
    }

    fn api(url: &str) -> HttpDebateApi {
        HttpDebateApi::new(url, Some("tok-123".to_string()), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_unwrap_envelope() {
        let wrapped = json!({"debate": {"_id": "d1"}});
        assert_eq!(unwrap_envelope(wrapped, &SESSION_KEYS), json!({"_id": "d1"}));
        let bare = json!({"_id": "d1", "debate": "not-an-object"});
        assert_eq!(unwrap_envelope(bare.clone(), &SESSION_KEYS), bare);
    }

    #[test]
    fn test_decode_optional_is_lenient() {
        let none: Option<Argument> = decode_optional("/x", Value::Null, &ARGUMENT_KEYS);
        assert!(none.is_none());
        let none: Option<Argument> =
            decode_optional("/x", json!({"message": "ok"}), &ARGUMENT_KEYS);
        assert!(none.is_none());
        let some: Option<Argument> = decode_optional(
            "/x",
            json!({"argument": {"_id": "a1", "userId": "u1", "content": "hi", "createdAt": "2024-05-01T10:00:00Z"}}),
            &ARGUMENT_KEYS,
        );
        assert_eq!(some.unwrap().content, "hi");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let api = HttpDebateApi::new("http://localhost:5000/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(api.url("/debates/open"), "http://localhost:5000/debates/open");
    }

    #[tokio::test]
    async fn test_status_sends_bearer_and_decodes_session() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"_id":"d1","topic":"AI vs Humans","isFinalized":false,"joinedUsers":[{"_id":"u1","username":"ada"}]}"#,
        )
        .await;
        let session = api(&url).status(&DebateId::new("d1")).await.unwrap();
        assert_eq!(session.topic, "AI vs Humans");
        assert_eq!(session.participants.len(), 1);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /debates/d1/status "));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer tok-123"));
    }

    #[tokio::test]
    async fn test_error_status_uses_body_message() {
        let (url, server) = serve_once(
            "400 Bad Request",
            r#"{"message":"Cannot finalize: Not enough arguments"}"#,
        )
        .await;
        let err = api(&url).finalize(&DebateId::new("d1")).await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Status {
                status: 400,
                message: "Cannot finalize: Not enough arguments".to_string()
            }
        );
        assert!(server.await.unwrap().starts_with("POST /debates/d1/finalize "));
    }

    #[tokio::test]
    async fn test_join_private_sends_invite_code() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"debate":{"_id":"d9","topic":"Tabs or spaces","isPrivate":true,"inviteCode":"QX7P"}}"#,
        )
        .await;
        let session = api(&url).join_private("QX7P").await.unwrap();
        assert_eq!(session.id, DebateId::new("d9"));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /debates/join-private "));
        assert!(request.contains(r#""inviteCode":"QX7P""#));
    }

    #[tokio::test]
    async fn test_private_draft_routes_to_private_endpoint() {
        let (url, server) = serve_once("201 Created", r#"{"_id":"d2","topic":"Cats or dogs"}"#).await;
        let draft = DebateDraft::new("Cats or dogs").private();
        let session = api(&url).create(&draft).await.unwrap();
        assert_eq!(session.id, DebateId::new("d2"));
        assert!(server.await.unwrap().starts_with("POST /debates/private "));
    }
}
