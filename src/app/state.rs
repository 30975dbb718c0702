//! App state - the collection plus selection pointers, no I/O logic

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::collection::{Collection, Item};
use crate::constants::{DEFAULT_GROUP_NAME, DEFAULT_REQUEST_NAME, DEFAULT_REQUEST_URL};
use crate::error::StorageError;
use crate::messages::render::{ActiveRequestView, ResponseView, TreeRow};
use crate::messages::RenderState;
use crate::models::{format_duration, status_line, HttpMethod, HttpResult};
use crate::parsers::BodyParser;

/// Main application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub collection: Collection,
    /// Tree cursor, any item
    pub selected_item: Option<Uuid>,
    /// Request loaded for editing and sending, never a group
    pub active_item: Option<Uuid>,
    pub last_error: Option<String>,
    pub notice: Option<String>,
}

#[derive(Serialize)]
struct PersistedStateRef<'a> {
    #[serde(rename = "Collection")]
    collection: &'a Collection,
    #[serde(rename = "SelectedItem")]
    selected_item: Option<Uuid>,
    #[serde(rename = "ActiveItem")]
    active_item: Option<Uuid>,
}

#[derive(Deserialize)]
struct PersistedState {
    #[serde(rename = "Collection")]
    collection: Collection,
    #[serde(rename = "SelectedItem", default)]
    selected_item: Option<serde_json::Value>,
    #[serde(rename = "ActiveItem", default)]
    active_item: Option<serde_json::Value>,
}

/// A pointer that is not a valid UUID is treated as absent
fn parse_pointer(value: Option<serde_json::Value>) -> Option<Uuid> {
    let id = value.as_ref().and_then(serde_json::Value::as_str)?;
    match Uuid::parse_str(id) {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!(value = id, error = %e, "Ignoring corrupt item pointer");
            None
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// A fresh state: one "Default" group holding one "Unnamed" GET request
    pub fn new() -> Self {
        let mut collection = Collection::new(DEFAULT_GROUP_NAME);
        let root = collection.root();
        let request = collection.add_child(
            root,
            Item::new_request(DEFAULT_REQUEST_NAME, HttpMethod::GET, DEFAULT_REQUEST_URL, Some(root)),
        );

        AppState {
            collection,
            selected_item: request,
            active_item: request,
            last_error: None,
            notice: None,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, StorageError> {
        let persisted = PersistedStateRef {
            collection: &self.collection,
            selected_item: self.selected_item,
            active_item: self.active_item,
        };
        Ok(serde_json::to_vec_pretty(&persisted)?)
    }

    /// Loads a persisted state. Pointers that no longer resolve are replaced
    /// by defaults.
    pub fn from_json(data: &[u8]) -> Result<Self, StorageError> {
        let persisted: PersistedState = serde_json::from_slice(data)?;
        let mut state = AppState {
            collection: persisted.collection,
            selected_item: parse_pointer(persisted.selected_item),
            active_item: parse_pointer(persisted.active_item),
            last_error: None,
            notice: None,
        };
        state.ensure_default_items();
        Ok(state)
    }

    /// Points `active_item` at a request and `selected_item` at an existing
    /// item. Returns true if a request had to be created for that.
    pub fn ensure_default_items(&mut self) -> bool {
        if self
            .active_item
            .is_some_and(|id| self.collection.request(id).is_none())
        {
            self.active_item = None;
        }
        if self
            .selected_item
            .is_some_and(|id| !self.collection.contains(id))
        {
            self.selected_item = None;
        }

        let mut created = false;
        if self.active_item.is_none() {
            self.active_item = self.collection.first_request();
        }
        if self.active_item.is_none() {
            let root = self.collection.root();
            self.active_item = self.collection.add_child(
                root,
                Item::new_request(DEFAULT_REQUEST_NAME, HttpMethod::GET, DEFAULT_REQUEST_URL, Some(root)),
            );
            created = true;
        }
        if self.selected_item.is_none() {
            self.selected_item = self.active_item;
        }
        created
    }

    /// Convert state to RenderState for the presentation layer
    pub fn to_render_state(&self, is_loading: bool) -> RenderState {
        let tree = self
            .collection
            .preorder()
            .map(|item| TreeRow {
                id: item.uuid(),
                depth: self.collection.ancestors(item.uuid()).len(),
                name: item.name().to_string(),
                method: item.request().map(|r| r.method),
                selected: self.selected_item == Some(item.uuid()),
                active: self.active_item == Some(item.uuid()),
            })
            .collect();

        let active = self
            .active_item
            .and_then(|id| self.collection.request(id).map(|r| (id, r)));

        RenderState {
            tree,
            active: active.map(|(id, request)| ActiveRequestView {
                id,
                path: self.collection.path_label(id),
                method: request.method,
                url: request.url.clone(),
                headers: request.headers.clone(),
                body: request.body.clone(),
                authentication: request.authentication.clone(),
            }),
            response: active
                .and_then(|(_, request)| request.result.as_ref())
                .map(response_view),
            is_loading,
            error: self.last_error.clone(),
            notice: self.notice.clone(),
        }
    }
}

fn response_view(result: &HttpResult) -> ResponseView {
    let parser = BodyParser::for_content_type(result.content_type());
    let body = match parser.parse_bytes(&result.payload) {
        Ok(body) => body,
        Err(_) => String::from_utf8_lossy(&result.payload).into_owned(),
    };

    ResponseView {
        status: result.status.map(status_line),
        headers: result
            .headers
            .iter()
            .map(|(k, v)| (k.to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect(),
        body,
        elapsed: format_duration(result.elapsed()),
        payload_error: result.payload_error.as_ref().map(|e| e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_state() {
        let state = AppState::new();
        let root = state.collection.get(state.collection.root()).unwrap();
        assert_eq!(root.name(), "Default");
        assert_eq!(root.children().len(), 1);

        let id = root.children()[0];
        let request = state.collection.request(id).unwrap();
        assert_eq!(state.collection.get(id).unwrap().name(), "Unnamed");
        assert_eq!(request.method, HttpMethod::GET);
        assert_eq!(request.url, "");
        assert_eq!(state.active_item, Some(id));
        assert_eq!(state.selected_item, Some(id));
    }

    #[test]
    fn test_ensure_defaults_picks_first_request() {
        let mut state = AppState::new();
        let expected = state.active_item;
        state.active_item = None;
        state.selected_item = None;

        assert!(!state.ensure_default_items());
        assert_eq!(state.active_item, expected);
        assert_eq!(state.selected_item, expected);
    }

    #[test]
    fn test_ensure_defaults_rejects_group_as_active() {
        let mut state = AppState::new();
        let expected = state.active_item;
        state.active_item = Some(state.collection.root());
        state.selected_item = Some(Uuid::new_v4());

        state.ensure_default_items();
        assert_eq!(state.active_item, expected);
        assert_eq!(state.selected_item, expected);
    }

    #[test]
    fn test_ensure_defaults_creates_request_in_empty_collection() {
        let mut state = AppState::new();
        let only = state.active_item.unwrap();
        state.collection.remove_item(only).unwrap();
        state.active_item = None;

        assert!(state.ensure_default_items());
        let active = state.active_item.unwrap();
        assert!(state.collection.request(active).is_some());
        assert_eq!(state.collection.parent(active), Some(state.collection.root()));
    }

    #[test]
    fn test_json_round_trip_restores_pointers() {
        let mut state = AppState::new();
        let root = state.collection.root();
        let group = state
            .collection
            .add_child(root, Item::new_group("group", Some(root)))
            .unwrap();
        let second = state
            .collection
            .add_child(group, Item::new_request("second", HttpMethod::POST, "http://x", Some(group)))
            .unwrap();
        state.active_item = Some(second);
        state.selected_item = Some(group);
        state.last_error = Some("boom".into());

        let loaded = AppState::from_json(&state.to_json().unwrap()).unwrap();

        assert_eq!(loaded.active_item, Some(second));
        assert_eq!(loaded.selected_item, Some(group));
        assert_eq!(loaded.collection.parent(second), Some(group));
        assert!(loaded.last_error.is_none());
    }

    #[test]
    fn test_unresolvable_pointers_fall_back_to_defaults() {
        let state = AppState::new();
        let first = state.active_item;
        let mut json: serde_json::Value = serde_json::from_slice(&state.to_json().unwrap()).unwrap();
        json["ActiveItem"] = serde_json::json!(Uuid::new_v4());
        json["SelectedItem"] = serde_json::Value::Null;

        let loaded = AppState::from_json(json.to_string().as_bytes()).unwrap();
        assert_eq!(loaded.active_item, first);
        assert_eq!(loaded.selected_item, first);
    }

    #[test]
    fn test_corrupt_pointers_keep_the_collection() {
        let mut state = AppState::new();
        let root = state.collection.root();
        let extra = state
            .collection
            .add_child(root, Item::new_group("extra", Some(root)))
            .unwrap();
        let first = state.active_item;
        let mut json: serde_json::Value = serde_json::from_slice(&state.to_json().unwrap()).unwrap();
        json["ActiveItem"] = serde_json::json!("not-a-uuid");
        json["SelectedItem"] = serde_json::json!(42);

        let loaded = AppState::from_json(json.to_string().as_bytes()).unwrap();
        assert!(loaded.collection.contains(extra));
        assert_eq!(loaded.collection.len(), 3);
        assert_eq!(loaded.active_item, first);
        assert_eq!(loaded.selected_item, first);
    }

    #[test]
    fn test_persisted_document_omits_last_error() {
        let mut state = AppState::new();
        state.last_error = Some("boom".into());
        let json: serde_json::Value = serde_json::from_slice(&state.to_json().unwrap()).unwrap();
        assert!(json.get("LastError").is_none());
        assert!(json.get("Collection").is_some());
        assert_eq!(json["ActiveItem"], serde_json::json!(state.active_item.unwrap()));
    }

    #[test]
    fn test_render_state_marks_selection() {
        let state = AppState::new();
        let render = state.to_render_state(false);
        assert_eq!(render.tree.len(), 2);
        assert_eq!(render.tree[1].depth, 1);
        assert!(render.tree[1].selected && render.tree[1].active);
        assert_eq!(render.tree[0].method, None);
        assert_eq!(render.active.unwrap().path, "Default > Unnamed");
        assert!(render.response.is_none());
    }
}
