//! SAP Business One Service Layer client.
//!
//! The Service Layer exposes the business-object API as OData over HTTPS:
//! a `Login` call yields a session id that is sent back as the `B1SESSION`
//! cookie, entities are addressed as `Items('<code>')`, updates are `PATCH`
//! requests and the session ends with `Logout`.

use crate::domain::model::{ConnectionParams, ObjectKind};
use crate::domain::ports::{BusinessObject, Company};
use crate::utils::error::{Result, UpdaterError};
use crate::utils::validation::validate_url;
use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex, PoisonError};
use url::Url;

const DEFAULT_PORT: u16 = 50000;
const DEFAULT_PATH: &str = "/b1s/v1";
/// Status used when the remote error body carries no usable code.
const UNKNOWN_ERROR_CODE: i32 = -1;

/// Turns a server argument into the Service Layer base URL.
///
/// A bare host (`sap01`, `sap01:50001`) becomes `https://sap01:50000/b1s/v1`;
/// anything with a scheme is taken as the full base URL.
pub fn service_layer_url(server: &str) -> Result<Url> {
    let server = server.trim().trim_end_matches('/');
    let has_scheme = server.contains("://");
    let raw = if has_scheme {
        server.to_string()
    } else {
        format!("https://{}", server)
    };

    validate_url("server", &raw)?;
    let mut url = Url::parse(&raw).map_err(|e| UpdaterError::InvalidConfigValueError {
        field: "server".to_string(),
        value: raw.clone(),
        reason: e.to_string(),
    })?;

    if !has_scheme && url.port().is_none() {
        url.set_port(Some(DEFAULT_PORT))
            .map_err(|_| UpdaterError::InvalidConfigValueError {
                field: "server".to_string(),
                value: raw.clone(),
                reason: "cannot set a port on this address".to_string(),
            })?;
    }
    if url.path().is_empty() || url.path() == "/" {
        url.set_path(DEFAULT_PATH);
    }

    Ok(url)
}

fn endpoint(base: &Url, segment: &str) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| UpdaterError::ConfigError {
            message: format!("'{}' cannot be used as a base URL", base),
        })?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

/// OData key literal: single quotes are doubled.
fn entity_segment(kind: ObjectKind, key: &str) -> String {
    format!("{}('{}')", kind.entity_set(), key.replace('\'', "''"))
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(rename = "SessionId")]
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<ErrorCode>,
    message: ErrorMessage,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorCode {
    Number(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorMessage {
    Text(String),
    Localized { value: String },
}

impl ErrorBody {
    fn status(&self) -> i32 {
        let code = match &self.code {
            Some(ErrorCode::Number(n)) => i32::try_from(*n).ok(),
            Some(ErrorCode::Text(s)) => s.trim().parse().ok(),
            None => None,
        };
        match code {
            Some(0) | None => UNKNOWN_ERROR_CODE,
            Some(code) => code,
        }
    }

    fn text(self) -> String {
        match self.message {
            ErrorMessage::Text(text) => text,
            ErrorMessage::Localized { value } => value,
        }
    }
}

/// Reads a failed response into the remote status code and message.
async fn read_error(response: Response) -> (i32, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => {
            let code = envelope.error.status();
            (code, envelope.error.text())
        }
        Err(_) => {
            let detail = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("no details").to_string()
            } else {
                body.trim().to_string()
            };
            (UNKNOWN_ERROR_CODE, format!("HTTP {}: {}", status.as_u16(), detail))
        }
    }
}

fn store_error(slot: &Mutex<String>, message: String) {
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = message;
}

#[derive(Debug)]
struct Session {
    client: Client,
    base_url: Url,
    session_id: String,
    last_error: Arc<Mutex<String>>,
}

impl Session {
    fn cookie(&self) -> String {
        format!("B1SESSION={}", self.session_id)
    }
}

#[derive(Debug)]
pub struct ServiceLayerCompany {
    client: Client,
    session: Option<Arc<Session>>,
    last_error: Arc<Mutex<String>>,
}

impl ServiceLayerCompany {
    /// `accept_invalid_certs` allows the self-signed certificate most
    /// Service Layer installations ship with.
    pub fn new(accept_invalid_certs: bool) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            session: None,
            last_error: Arc::new(Mutex::new(String::new())),
        }
    }
}

#[async_trait]
impl Company for ServiceLayerCompany {
    type Object = ServiceLayerObject;

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    async fn connect(&mut self, params: &ConnectionParams) -> Result<i32> {
        let base_url = service_layer_url(&params.server)?;
        tracing::debug!(
            "Service Layer at {} (database server kind {}, db user {})",
            base_url,
            params.server_kind,
            params.db_user
        );

        let response = self
            .client
            .post(endpoint(&base_url, "Login")?)
            .json(&json!({
                "CompanyDB": params.company_db,
                "UserName": params.api_user,
                "Password": params.api_password,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let (code, message) = read_error(response).await;
            store_error(&self.last_error, message);
            return Ok(code);
        }

        let login: LoginResponse = response.json().await?;
        self.session = Some(Arc::new(Session {
            client: self.client.clone(),
            base_url,
            session_id: login.session_id,
            last_error: Arc::clone(&self.last_error),
        }));
        Ok(0)
    }

    fn business_object(&self, kind: ObjectKind) -> Result<ServiceLayerObject> {
        let session = self.session.as_ref().ok_or(UpdaterError::NotConnected)?;
        Ok(ServiceLayerObject {
            session: Arc::clone(session),
            kind,
            key: None,
            pending: Map::new(),
        })
    }

    fn last_error_description(&self) -> String {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn disconnect(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };

        let response = session
            .client
            .post(endpoint(&session.base_url, "Logout")?)
            .header(COOKIE, session.cookie())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let (_, message) = read_error(response).await;
            return Err(UpdaterError::RemoteError {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

impl Drop for ServiceLayerCompany {
    fn drop(&mut self) {
        if self.session.is_some() {
            tracing::warn!("Service Layer session dropped without logout; it will expire on the server");
        }
    }
}

/// One entity on the Service Layer. Field changes are staged locally and
/// sent as a single `PATCH` on commit.
#[derive(Debug)]
pub struct ServiceLayerObject {
    session: Arc<Session>,
    kind: ObjectKind,
    key: Option<String>,
    pending: Map<String, Value>,
}

impl ServiceLayerObject {
    fn entity_url(&self, key: &str) -> Result<Url> {
        endpoint(&self.session.base_url, &entity_segment(self.kind, key))
    }

    fn loaded_key(&self) -> Result<&str> {
        self.key.as_deref().ok_or_else(|| UpdaterError::ProcessingError {
            message: format!("no {} entity loaded", self.kind.entity_set()),
        })
    }
}

#[async_trait]
impl BusinessObject for ServiceLayerObject {
    async fn load_by_key(&mut self, key: &str) -> Result<bool> {
        self.key = None;
        self.pending.clear();

        let response = self
            .session
            .client
            .get(self.entity_url(key)?)
            .query(&[("$select", self.kind.key_field())])
            .header(COOKIE, self.session.cookie())
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                self.key = Some(key.to_string());
                Ok(true)
            }
            StatusCode::NOT_FOUND => {
                let (_, message) = read_error(response).await;
                store_error(&self.session.last_error, message);
                Ok(false)
            }
            status => {
                let (_, message) = read_error(response).await;
                Err(UpdaterError::RemoteError {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        self.loaded_key()?;
        self.pending.insert(name.to_string(), value);
        Ok(())
    }

    async fn commit(&mut self) -> Result<i32> {
        let url = self.entity_url(self.loaded_key()?)?;
        if self.pending.is_empty() {
            return Ok(0);
        }

        let response = self
            .session
            .client
            .patch(url)
            .header(COOKIE, self.session.cookie())
            .json(&self.pending)
            .send()
            .await?;

        if !response.status().is_success() {
            let (code, message) = read_error(response).await;
            store_error(&self.session.last_error, message);
            return Ok(code);
        }

        self.pending.clear();
        Ok(0)
    }
}
