// Catalyst Center HTTP client
//
// Wraps `reqwest::Client` with URL construction, response decoding and
// error framing. Endpoint families (sites, sda, event_management, ...) are
// implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use std::future::Future;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::types::task::{TaskHandle, error_text};

/// Query parameters as sent on the wire.
pub(crate) type Params<'a> = &'a [(&'a str, String)];

/// Async client for the Catalyst Center intent API.
///
/// Every call carries a `family.operation` name that ends up in errors, so
/// a failed reconciliation step can be traced back to the exact endpoint.
/// The client never retries; retry policy belongs to the caller.
pub struct CatalystClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CatalystClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base URL ends with `/` so relative joins keep its path.
    pub(crate) fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"dna/intent/api/v1/sites"`) onto the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        params: Params<'_>,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!(operation, "GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        self.handle_response(operation, params, resp).await
    }

    pub(crate) async fn send_json<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        params: Params<'_>,
        body: Option<&B>,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!(operation, "{method} {url} params={params:?}");

        let mut request = self.http.request(method, url).query(params);
        if let Some(body) = body {
            request = request.json(body);
        }
        let resp = request.send().await?;
        self.handle_response(operation, params, resp).await
    }

    /// Issue a mutation and classify its response into a [`TaskHandle`].
    pub(crate) async fn mutate<B: Serialize + Sync + ?Sized>(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        params: Params<'_>,
        body: Option<&B>,
    ) -> Result<TaskHandle, Error> {
        let value: Value = self
            .send_json(operation, method, path, params, body)
            .await?;
        Ok(TaskHandle::classify(&value))
    }

    /// Issue a multipart POST and classify its response.
    pub(crate) async fn upload(
        &self,
        operation: &'static str,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<TaskHandle, Error> {
        let url = self.url(path)?;
        debug!(operation, "POST (multipart) {url}");

        let resp = self.http.post(url).multipart(form).send().await?;
        let value: Value = self.handle_response(operation, &[], resp).await?;
        Ok(TaskHandle::classify(&value))
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        params: Params<'_>,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(self.parse_error(operation, params, status, resp).await);
        }

        let body = resp.text().await?;
        // Some mutations answer 202/204 with an empty body.
        let text = if body.trim().is_empty() { "{}" } else { &body };
        serde_json::from_str(text).map_err(|e| {
            let preview = body.chars().take(200).collect::<String>();
            Error::Deserialization {
                operation,
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    async fn parse_error(
        &self,
        operation: &'static str,
        params: Params<'_>,
        status: reqwest::StatusCode,
        resp: reqwest::Response,
    ) -> Error {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::TokenExpired;
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Error::NotFound { operation };
        }

        let raw = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&raw)
            .ok()
            .and_then(|v| controller_message(&v))
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                }
            });

        Error::Api {
            operation,
            params: format!("{params:?}"),
            status: status.as_u16(),
            message,
        }
    }

    // ── Pagination helper ────────────────────────────────────────────

    /// Page through a listing and stop at the first record matching `pred`.
    pub async fn find_paged<T, F, Fut, P>(
        &self,
        limit: usize,
        fetch: F,
        pred: P,
    ) -> Result<Option<T>, Error>
    where
        F: Fn(usize, usize) -> Fut,
        Fut: Future<Output = Result<Vec<T>, Error>>,
        P: Fn(&T) -> bool,
    {
        let mut offset = 0;

        loop {
            let page = fetch(offset, limit).await?;
            let received = page.len();
            if let Some(found) = page.into_iter().find(|item| pred(item)) {
                return Ok(Some(found));
            }
            if received < limit || received == 0 {
                return Ok(None);
            }
            offset += received;
        }
    }
}

/// Pull the human-readable reason out of the controller's error bodies.
///
/// Seen in the wild: `{response: {message|detail|errorCode}}`,
/// `{message}`, `{error}`, `{errorMessage: {errors: [...]}}`.
fn controller_message(body: &Value) -> Option<String> {
    let response = body.get("response");
    let candidates = [
        response.and_then(|r| r.get("detail")),
        response.and_then(|r| r.get("message")),
        response.and_then(|r| r.get("errorCode")),
        body.get("message"),
        body.get("detail"),
        body.get("error"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().filter(|s| !s.is_empty()).map(str::to_owned))
        .or_else(|| error_text(body.get("errorMessage")))
}
