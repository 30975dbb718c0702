//! Command handlers - business logic for processing UI events

use uuid::Uuid;

use crate::app::AppState;
use crate::auth::Authentication;
use crate::collection::{Item, RequestItem};
use crate::error::{ExecutionError, ParseError, TreeError};
use crate::messages::{Completion, ExchangeRequest};
use crate::models::HttpMethod;
use crate::parsers::BodyParser;

impl AppState {
    // ========================
    // Tree navigation
    // ========================

    pub fn select(&mut self, id: Uuid) -> bool {
        if !self.collection.contains(id) {
            return false;
        }
        self.selected_item = Some(id);
        true
    }

    /// Selects the n-th row of the pre-order listing
    pub fn select_row(&mut self, row: usize) -> bool {
        match self.collection.preorder().nth(row).map(Item::uuid) {
            Some(id) => self.select(id),
            None => false,
        }
    }

    pub fn select_next(&mut self) {
        self.move_selection(1);
    }

    pub fn select_prev(&mut self) {
        self.move_selection(-1);
    }

    fn move_selection(&mut self, delta: isize) {
        let rows: Vec<Uuid> = self.collection.preorder().map(Item::uuid).collect();
        let current = self
            .selected_item
            .and_then(|id| rows.iter().position(|r| *r == id))
            .unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(rows.len().saturating_sub(1));
        if let Some(id) = rows.get(next) {
            self.selected_item = Some(*id);
        }
    }

    /// Loads the selected request for editing. Groups only keep the selection.
    pub fn activate_selected(&mut self) -> bool {
        match self.selected_item {
            Some(id) if self.collection.request(id).is_some() => {
                self.active_item = Some(id);
                true
            }
            _ => false,
        }
    }

    // ========================
    // Collection editing
    // ========================

    fn target_group(&self) -> Uuid {
        match self.selected_item {
            Some(id) => self.collection.nearest_group(id),
            None => self.collection.root(),
        }
    }

    pub fn new_group(&mut self, name: impl Into<String>) -> Option<Uuid> {
        let parent = self.target_group();
        let id = self
            .collection
            .add_child(parent, Item::new_group(name, Some(parent)))?;
        self.selected_item = Some(id);
        Some(id)
    }

    pub fn new_request(&mut self, name: impl Into<String>) -> Option<Uuid> {
        self.promote_request(name, RequestItem::new(HttpMethod::GET, ""))
    }

    /// Saves a request that is not part of the tree yet under the selection's
    /// group, and loads it
    pub fn promote_request(&mut self, name: impl Into<String>, request: RequestItem) -> Option<Uuid> {
        let parent = self.target_group();
        let id = self
            .collection
            .add_child(parent, Item::from_request(name, request, Some(parent)))?;
        self.selected_item = Some(id);
        self.active_item = Some(id);
        Some(id)
    }

    /// Path shown when asking where a new request will be saved
    pub fn save_location(&self) -> String {
        self.collection.path_label(self.target_group())
    }

    pub fn clone_selected(&mut self, name: impl Into<String>) -> Result<Uuid, TreeError> {
        let id = self.selected_item.ok_or(TreeError::RootItem)?;
        let copy = self.collection.clone_item(id, name)?;
        self.selected_item = Some(copy);
        Ok(copy)
    }

    pub fn rename_selected(&mut self, name: impl Into<String>) -> Result<(), TreeError> {
        let id = self.selected_item.ok_or(TreeError::RootItem)?;
        self.collection.rename(id, name)
    }

    /// Deletes the selected item and its subtree. Pointers into the deleted
    /// subtree are cleared and re-established from defaults.
    pub fn delete_selected(&mut self) -> Result<bool, TreeError> {
        let Some(id) = self.selected_item else {
            return Ok(false);
        };
        if id == self.collection.root() {
            return Ok(false);
        }

        let parent = self.collection.parent(id);
        let doomed = |item: Option<Uuid>| {
            item.is_some_and(|i| i == id || self.collection.is_descendant_of(i, id))
        };
        let clear_active = doomed(self.active_item);
        let clear_selected = doomed(self.selected_item);

        if !self.collection.remove_item(id)? {
            return Ok(false);
        }
        if clear_active {
            self.active_item = None;
        }
        if clear_selected {
            self.selected_item = parent;
        }
        self.ensure_default_items();
        Ok(true)
    }

    // ========================
    // Active request editing
    // ========================

    pub fn active_request(&self) -> Option<&RequestItem> {
        self.active_item.and_then(|id| self.collection.request(id))
    }

    pub fn active_request_mut(&mut self) -> Option<&mut RequestItem> {
        let id = self.active_item?;
        self.collection.request_mut(id)
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        if let Some(request) = self.active_request_mut() {
            request.url = url.into();
        }
    }

    pub fn cycle_method(&mut self) {
        if let Some(request) = self.active_request_mut() {
            request.method = request.method.next();
        }
    }

    pub fn set_authentication(&mut self, authentication: Authentication) {
        if let Some(request) = self.active_request_mut() {
            request.authentication = authentication;
        }
    }

    /// Pretty-prints the active request's payload. On failure the payload is
    /// left as it was. Returns false if there is no body to format.
    pub fn format_body(&mut self) -> Result<bool, ParseError> {
        let Some(request) = self.active_request_mut() else {
            return Ok(false);
        };
        let parser = BodyParser::for_content_type(request.content_type().unwrap_or(""));
        let Some(body) = &mut request.body else {
            return Ok(false);
        };

        body.payload = parser.parse_bytes(body.payload.as_bytes())?;
        Ok(true)
    }

    // ========================
    // Exchange
    // ========================

    /// Snapshot of the active request for the execution manager
    pub fn prepare_exchange(&self) -> Option<ExchangeRequest> {
        let id = self.active_item?;
        let request = self.collection.request(id)?;
        Some(ExchangeRequest::new(id, request))
    }

    pub fn handle_send_result(&mut self, result: Result<u64, ExecutionError>) {
        match result {
            Ok(_) => {
                self.last_error = None;
                self.notice = None;
            }
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    /// Attaches a completed exchange to its item. Cancellations show nothing.
    pub fn handle_completion(&mut self, completion: Completion) {
        if completion.result.is_cancelled() {
            return;
        }
        let Some(request) = self.collection.request_mut(completion.item) else {
            tracing::debug!(id = %completion.item, "Completed item no longer exists");
            return;
        };

        self.last_error = completion.result.error.as_ref().map(|e| e.to_string());
        request.result = Some(completion.result);
    }
}
