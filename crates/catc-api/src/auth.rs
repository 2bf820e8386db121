// Token authentication
//
// `POST /dna/system/api/v1/auth/token` with HTTP basic credentials returns
// `{"Token": "..."}`; the token rides on every later request as
// `X-Auth-Token`.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::client::CatalystClient;
use crate::error::Error;
use crate::transport::TransportConfig;

const TOKEN_PATH: &str = "dna/system/api/v1/auth/token";

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(rename = "Token")]
    token: String,
}

impl CatalystClient {
    /// Authenticate with username/password and build a token-bearing client.
    ///
    /// The token request and the resulting client share the TLS and
    /// timeout settings from `transport`.
    pub async fn login(
        base_url: &str,
        username: &str,
        password: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let base = Self::normalize_base_url(base_url)?;
        let token_url = base.join(TOKEN_PATH)?;
        debug!("requesting token at {token_url}");

        let bootstrap = transport.build_client()?;
        let resp = bootstrap
            .post(token_url)
            .basic_auth(username, Some(password.expose_secret()))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("token request failed (HTTP {status}): {body}"),
            });
        }

        let token: TokenResponse = resp.json().await.map_err(|e| Error::Authentication {
            message: format!("unexpected token response: {e}"),
        })?;

        let mut headers = HeaderMap::new();
        let mut value = HeaderValue::from_str(&token.token).map_err(|e| Error::Authentication {
            message: format!("invalid token header value: {e}"),
        })?;
        value.set_sensitive(true);
        headers.insert("X-Auth-Token", value);

        let http = transport.build_client_with_headers(headers)?;
        debug!("authentication successful");
        Self::from_reqwest(base.as_str(), http)
    }
}
