//! Body formatting chosen by content type

use crate::constants::JSON_CONTENT_TYPE;
use crate::error::ParseError;

/// Formatter for request and response bodies
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyParser {
    /// Re-indents JSON with two spaces
    Json,
    /// Returns the body text unchanged
    Passthrough,
}

impl BodyParser {
    /// Picks the formatter for a content type such as `application/json; charset=utf-8`
    pub fn for_content_type(content_type: &str) -> BodyParser {
        if content_type.to_ascii_lowercase().contains(JSON_CONTENT_TYPE) {
            BodyParser::Json
        } else {
            BodyParser::Passthrough
        }
    }

    /// Picks the formatter from a response's `Content-Type` header
    pub fn for_response(response: &reqwest::Response) -> BodyParser {
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        BodyParser::for_content_type(content_type)
    }

    /// Reads the whole response body and formats it
    pub async fn parse(self, response: reqwest::Response) -> Result<String, ParseError> {
        let body = response.bytes().await?;
        self.parse_bytes(&body)
    }

    pub fn parse_bytes(self, body: &[u8]) -> Result<String, ParseError> {
        match self {
            BodyParser::Json => {
                let value: serde_json::Value = serde_json::from_slice(body)?;
                Ok(serde_json::to_string_pretty(&value)?)
            }
            BodyParser::Passthrough => Ok(String::from_utf8_lossy(body).into_owned()),
        }
    }
}
