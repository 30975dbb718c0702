//! Request authentication strategies
//!
//! A closed set of variants. Each one may ask for an auxiliary exchange
//! (`prepare`) and then decorates the main request's headers (`apply`).
//!
//! Persisted as `{"Type": "...", "Data": {...}}`. An unknown `Type`
//! loads as [`Authentication::None`].

use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

const TYPE_NONE: &str = "none";
const TYPE_BASIC: &str = "basic";
const TYPE_OAUTH2: &str = "oauth2";

/// HTTP basic auth credentials
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

/// OAuth2 client credentials used against a token endpoint
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Auth {
    #[serde(rename = "TokenURL")]
    pub token_url: String,
    #[serde(rename = "ClientID")]
    pub client_id: String,
    #[serde(rename = "ClientSecret")]
    pub client_secret: String,
    #[serde(rename = "GrantType")]
    pub grant_type: String,
    #[serde(rename = "Scope")]
    pub scope: String,
}

/// Authentication attached to a request
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RawAuthentication", try_from = "RawAuthentication")]
pub enum Authentication {
    #[default]
    None,
    Basic(BasicAuth),
    OAuth2(OAuth2Auth),
}

/// The auxiliary exchange's response, fully read
#[derive(Clone, Debug)]
pub struct AuthResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl Authentication {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Authentication::Basic(BasicAuth {
            username: username.into(),
            password: password.into(),
        })
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Authentication::None)
    }

    /// Discriminator used in the persisted form
    pub fn type_name(&self) -> &'static str {
        match self {
            Authentication::None => TYPE_NONE,
            Authentication::Basic(_) => TYPE_BASIC,
            Authentication::OAuth2(_) => TYPE_OAUTH2,
        }
    }

    /// Builds the auxiliary request needed before the main exchange, if any
    pub fn prepare(&self, client: &reqwest::Client) -> Option<reqwest::RequestBuilder> {
        match self {
            Authentication::None | Authentication::Basic(_) => None,
            Authentication::OAuth2(oauth2) => {
                let form = [
                    ("client_id", oauth2.client_id.as_str()),
                    ("client_secret", oauth2.client_secret.as_str()),
                    ("grant_type", oauth2.grant_type.as_str()),
                    ("scope", oauth2.scope.as_str()),
                ];
                Some(client.post(&oauth2.token_url).form(&form))
            }
        }
    }

    /// Decorates the main request's headers. Headers are left untouched on error.
    pub fn apply(
        &self,
        headers: &mut HeaderMap,
        response: Option<&AuthResponse>,
    ) -> Result<(), AuthError> {
        match self {
            Authentication::None => Ok(()),
            Authentication::Basic(basic) => {
                let credentials = format!("{}:{}", basic.username, basic.password);
                let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
                let value = HeaderValue::from_str(&format!("Basic {}", encoded))
                    .map_err(|e| AuthError::InvalidHeader(e.to_string()))?;
                headers.insert(AUTHORIZATION, value);
                Ok(())
            }
            Authentication::OAuth2(_) => {
                let response = response.ok_or(AuthError::MissingTokenResponse)?;
                if !response.status.is_success() {
                    return Err(AuthError::TokenStatus(response.status.as_u16()));
                }

                let token: TokenResponse = serde_json::from_slice(&response.body)
                    .map_err(|e| AuthError::MalformedToken(e.to_string()))?;
                let value = HeaderValue::from_str(&format!("Bearer {}", token.access_token))
                    .map_err(|e| AuthError::InvalidHeader(e.to_string()))?;
                headers.insert(AUTHORIZATION, value);
                Ok(())
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawAuthentication {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Data", default, skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

impl From<Authentication> for RawAuthentication {
    fn from(auth: Authentication) -> Self {
        let kind = auth.type_name().to_string();
        let data = match auth {
            Authentication::None => None,
            Authentication::Basic(basic) => serde_json::to_value(basic).ok(),
            Authentication::OAuth2(oauth2) => serde_json::to_value(oauth2).ok(),
        };
        RawAuthentication { kind, data }
    }
}

impl TryFrom<RawAuthentication> for Authentication {
    type Error = serde_json::Error;

    fn try_from(raw: RawAuthentication) -> Result<Self, Self::Error> {
        let data = raw.data.unwrap_or(serde_json::Value::Null);
        match raw.kind.as_str() {
            TYPE_BASIC => Ok(Authentication::Basic(serde_json::from_value(data)?)),
            TYPE_OAUTH2 => Ok(Authentication::OAuth2(serde_json::from_value(data)?)),
            _ => Ok(Authentication::None),
        }
    }
}
