//! Render state - data structure sent from App layer to the presentation layer

use uuid::Uuid;

use crate::auth::Authentication;
use crate::models::{Headers, HttpMethod, RequestBody};

/// One visible line of the collection tree
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow {
    pub id: Uuid,
    pub depth: usize,
    pub name: String,
    /// `None` for groups
    pub method: Option<HttpMethod>,
    pub selected: bool,
    pub active: bool,
}

/// The request loaded for editing
#[derive(Debug, Clone)]
pub struct ActiveRequestView {
    pub id: Uuid,
    pub path: String,
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub body: Option<RequestBody>,
    pub authentication: Authentication,
}

/// Last outcome of the active request
#[derive(Debug, Clone, Default)]
pub struct ResponseView {
    pub status: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub elapsed: String,
    pub payload_error: Option<String>,
}

/// Complete state needed by the presentation layer to render
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    pub tree: Vec<TreeRow>,
    pub active: Option<ActiveRequestView>,
    pub response: Option<ResponseView>,
    pub is_loading: bool,
    /// A real failure, e.g. an exchange error
    pub error: Option<String>,
    /// User double-action such as sending while a request is pending
    pub notice: Option<String>,
}
