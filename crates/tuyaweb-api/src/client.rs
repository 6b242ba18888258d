// Tuya Web HTTP client
//
// Wraps `reqwest::Client` with Tuya-specific URL construction, skill
// envelope unwrapping, and session token management. The cloud exposes
// two endpoints: `auth.do` (form-encoded login) and `skill` (a single
// JSON POST endpoint multiplexing discovery, query, and control through
// a `{ header, payload }` envelope).

use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{CommandPayload, DeviceDescriptor, DeviceSnapshot, SkillResponse};

const SUCCESS_CODE: &str = "SUCCESS";

/// Raw HTTP client for the Tuya Web API.
///
/// Handles the `{ header: { code, msg }, payload: ... }` envelope and
/// injects the session token into every skill request -- callers only
/// see unwrapped payloads. Holds no per-device state; the caching and
/// value transformation layers live in `tuyaweb-core`.
pub struct TuyaClient {
    http: reqwest::Client,
    base_url: Url,
    /// Session token from `login`, injected into every skill payload.
    access_token: RwLock<Option<String>>,
}

impl TuyaClient {
    /// Create a new client for the given regional endpoint
    /// (e.g. `https://px1.tuyaeu.com`).
    pub fn new(base_url: Url) -> Result<Self, Error> {
        let http = reqwest::Client::builder().build().map_err(Error::Transport)?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            access_token: RwLock::new(None),
        }
    }

    /// Seed the client with a previously obtained session token
    /// (e.g. restored from the platform's session store).
    pub fn with_access_token(self, token: impl Into<String>) -> Self {
        *self.access_token.write().expect("token lock poisoned") = Some(token.into());
        self
    }

    /// The cloud endpoint base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether a session token is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.access_token
            .read()
            .expect("token lock poisoned")
            .is_some()
    }

    // ── Authentication ────────────────────────────────────────────────

    /// Authenticate with a Tuya account.
    ///
    /// On success the session token is stored and injected into all
    /// subsequent skill requests. `country_code` is the phone country
    /// code the account was registered with (e.g. `"49"`).
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
        country_code: &str,
    ) -> Result<(), Error> {
        let url = self
            .base_url
            .join("homeassistant/auth.do")
            .map_err(Error::InvalidUrl)?;

        debug!("logging in at {}", url);

        let form = [
            ("userName", username),
            ("password", password.expose_secret()),
            ("countryCode", country_code),
            ("bizType", "smart_life"),
            ("from", "tuya"),
        ];

        let resp = self
            .http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        let text = resp.text().await.map_err(Error::Transport)?;
        let auth: AuthResponse =
            serde_json::from_str(&text).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: text.clone(),
            })?;

        // The cloud reports login failures with HTTP 200 and an
        // `{ "responseStatus": "error", "errorMsg": ... }` body.
        if auth.response_status.as_deref() == Some("error") {
            return Err(Error::Authentication {
                message: auth
                    .error_msg
                    .unwrap_or_else(|| "login rejected".into()),
            });
        }

        let token = auth.access_token.ok_or_else(|| Error::Deserialization {
            message: "login response missing access_token".into(),
            body: text,
        })?;

        *self.access_token.write().expect("token lock poisoned") = Some(token);
        debug!("login successful");
        Ok(())
    }

    fn token(&self) -> Result<String, Error> {
        self.access_token
            .read()
            .expect("token lock poisoned")
            .clone()
            .ok_or(Error::SessionExpired)
    }

    // ── Skill endpoint ────────────────────────────────────────────────

    /// Fetch the current state snapshot of one device.
    pub async fn get_device_state(&self, device_id: &str) -> Result<DeviceSnapshot, Error> {
        debug!(device = device_id, "querying device state");

        let payload: Option<QueryPayload> = self
            .skill("query", "QueryDevice", json!({ "devId": device_id }))
            .await?;

        payload
            .map(|p| p.data)
            .ok_or_else(|| Error::Deserialization {
                message: "query response missing payload".into(),
                body: String::new(),
            })
    }

    /// Send a control command (`turnOnOff`, `brightnessSet`, `colorSet`,
    /// `colorTemperatureSet`, `startStop`) to one device.
    pub async fn set_device_state(
        &self,
        device_id: &str,
        action: &str,
        payload: &CommandPayload,
    ) -> Result<(), Error> {
        debug!(device = device_id, action, "sending control command");

        let mut body = serde_json::to_value(payload).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: String::new(),
        })?;
        body["devId"] = device_id.into();

        let _ignored: Option<Value> = self.skill("control", action, body).await?;
        Ok(())
    }

    /// List all devices registered to the account.
    pub async fn discover_devices(&self) -> Result<Vec<DeviceDescriptor>, Error> {
        debug!("discovering devices");

        let payload: Option<DiscoveryPayload> =
            self.skill("discovery", "Discovery", json!({})).await?;

        Ok(payload.map(|p| p.devices).unwrap_or_default())
    }

    /// POST one skill request and unwrap the envelope.
    async fn skill<T: DeserializeOwned>(
        &self,
        namespace: &str,
        name: &str,
        mut payload: Value,
    ) -> Result<Option<T>, Error> {
        let token = self.token()?;
        let url = self
            .base_url
            .join("homeassistant/skill")
            .map_err(Error::InvalidUrl)?;

        payload["accessToken"] = token.into();
        let body = json!({
            "header": {
                "name": name,
                "namespace": namespace,
                "payloadVersion": 1,
            },
            "payload": payload,
        });

        trace!(namespace, name, "skill request");

        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Api {
                message: format!("skill request failed (HTTP {status})"),
                code: None,
            });
        }

        let text = resp.text().await.map_err(Error::Transport)?;
        let parsed: SkillResponse<T> =
            serde_json::from_str(&text).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: text,
            })?;

        if parsed.header.code != SUCCESS_CODE {
            return Err(Error::Api {
                message: parsed
                    .header
                    .msg
                    .unwrap_or_else(|| parsed.header.code.clone()),
                code: Some(parsed.header.code),
            });
        }

        Ok(parsed.payload)
    }
}

// ── Private payload shapes ───────────────────────────────────────────

#[derive(Deserialize)]
struct AuthResponse {
    #[serde(default)]
    access_token: Option<String>,

    #[serde(default, rename = "responseStatus")]
    response_status: Option<String>,

    #[serde(default, rename = "errorMsg")]
    error_msg: Option<String>,
}

#[derive(Deserialize)]
struct QueryPayload {
    data: DeviceSnapshot,
}

#[derive(Deserialize)]
struct DiscoveryPayload {
    #[serde(default)]
    devices: Vec<DeviceDescriptor>,
}
