// Hand-crafted async HTTP client for the controller's Intent API.
//
// Base path: /dna/
// Auth: X-Auth-Token header, issued by POST /dna/system/api/v1/auth/token

use std::future::Future;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{Envelope, TokenResponse};
use crate::transport::TransportConfig;

/// Fixed page size for offset-paginated endpoints.
pub const PAGE_SIZE: usize = 500;

// ── Error response shape from the Intent API ─────────────────────────

#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default, rename = "errorCode")]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    response: Option<ErrorBody>,
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the controller's Intent API.
///
/// Uses token authentication and communicates via JSON REST endpoints
/// under `/dna/`. Endpoint groups (devices, interfaces, hardware) are
/// implemented as inherent methods in separate files to keep this module
/// focused on transport mechanics.
#[derive(Debug)]
pub struct IntentClient {
    http: reqwest::Client,
    base_url: Url,
}

impl IntentClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Authenticate with username/password and build a client.
    ///
    /// Issues `POST dna/system/api/v1/auth/token` with HTTP basic auth,
    /// then injects the returned token as a default `X-Auth-Token` header
    /// on every subsequent request.
    pub async fn login(
        base_url: &str,
        username: &str,
        password: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        let login_url = base_url
            .join("system/api/v1/auth/token")
            .map_err(Error::InvalidUrl)?;

        let http = transport.build_client()?;
        debug!("POST {login_url}");
        let resp = http
            .post(login_url)
            .basic_auth(username, Some(password.expose_secret()))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("token request rejected with HTTP {status}"),
            });
        }

        let body = resp.text().await?;
        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            let preview = &body[..body.len().min(200)];
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })?;

        Self::from_token(
            base_url.as_str(),
            &SecretString::from(token.token),
            transport,
        )
    }

    /// Build from a pre-issued auth token and transport config.
    ///
    /// Injects `X-Auth-Token` as a default header on every request.
    pub fn from_token(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut token_value =
            HeaderValue::from_str(token.expose_secret()).map_err(|e| Error::Authentication {
                message: format!("invalid auth token header value: {e}"),
            })?;
        token_value.set_sensitive(true);
        headers.insert("X-Auth-Token", token_value);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Build the base URL, ensuring it ends with `/dna/`.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;

        // Strip trailing slash for uniform handling
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/dna") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/dna/"));
        }

        Ok(url)
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"intent/api/v1/network-device"`) onto
    /// the base URL.
    fn url(&self, path: &str) -> Url {
        // base_url always ends with `/dna/`, so joining `intent/…` works.
        self.base_url
            .join(path)
            .expect("path should be valid relative URL")
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path);
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview = &body[..body.len().min(200)];
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::InvalidToken;
        }

        let raw = resp.text().await.unwrap_or_default();

        if let Ok(err) = serde_json::from_str::<ErrorResponse>(&raw) {
            let body = err.response.unwrap_or(ErrorBody {
                error_code: None,
                message: err.message,
                detail: None,
            });
            Error::Api {
                status: status.as_u16(),
                message: body
                    .detail
                    .or(body.message)
                    .unwrap_or_else(|| status.to_string()),
                code: body.error_code,
            }
        } else {
            Error::Api {
                status: status.as_u16(),
                message: if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                },
                code: None,
            }
        }
    }

    // ── Fetch helpers ────────────────────────────────────────────────

    /// Collect all pages of an offset-paginated endpoint into one `Vec<T>`.
    ///
    /// Offsets are 1-based and advance by [`PAGE_SIZE`]; iteration stops
    /// on an empty page or a page shorter than [`PAGE_SIZE`].
    pub async fn fetch_all<T, F, Fut>(&self, fetch: F) -> Result<Vec<T>, Error>
    where
        F: Fn(usize) -> Fut,
        Fut: Future<Output = Result<Vec<T>, Error>>,
    {
        let mut all = Vec::new();
        let mut offset: usize = 1;

        loop {
            let page = fetch(offset).await?;
            if page.is_empty() {
                break;
            }
            let received = page.len();
            all.extend(page);
            if received < PAGE_SIZE {
                break;
            }
            offset += PAGE_SIZE;
        }

        Ok(all)
    }

    /// GET an enveloped list, mapping "not found" and `"response": null`
    /// to an empty list.
    ///
    /// Scoped queries (interfaces of one device, stack detail, cards)
    /// answer "no data" as HTTP 404; callers treat that as an empty
    /// result, not an error.
    pub(crate) async fn get_list_or_empty<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, Error> {
        let result: Result<Envelope<Vec<T>>, Error> = if params.is_empty() {
            self.get(path).await
        } else {
            self.get_with_params(path, params).await
        };

        match result {
            Ok(envelope) => Ok(envelope.response.unwrap_or_default()),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}
