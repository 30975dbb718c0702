//! App actor - message loop processing UI events and exchange completions

use tokio::sync::mpsc;

use crate::collection::RequestItem;
use crate::error::StorageError;
use crate::messages::{Completion, RenderState, UiEvent};
use crate::network::ExecutionManager;
use crate::storage::StateStore;

/// App actor that owns the state store and the execution manager
pub struct AppActor {
    store: StateStore,
    manager: ExecutionManager,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    render_tx: mpsc::UnboundedSender<RenderState>,
}

impl AppActor {
    pub fn new(
        store: StateStore,
        client: reqwest::Client,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let manager = ExecutionManager::new(client, move |completion| {
            let _ = completion_tx.send(completion);
        });

        AppActor {
            store,
            manager,
            completion_rx,
            render_tx,
        }
    }

    fn render(&self) {
        let _ = self
            .render_tx
            .send(self.store.get().to_render_state(self.manager.pending()));
    }

    /// Run the actor message loop. The state is flushed when the loop ends.
    pub async fn run(mut self, mut ui_rx: mpsc::UnboundedReceiver<UiEvent>) -> Result<(), StorageError> {
        self.store.ensure_default_items();
        self.render();

        loop {
            tokio::select! {
                event = ui_rx.recv() => {
                    let Some(event) = event else { break };
                    if self.handle_ui_event(event) {
                        break;
                    }
                    self.render();
                }
                Some(completion) = self.completion_rx.recv() => {
                    self.store.get_mut().handle_completion(completion);
                    self.render();
                }
            }
        }

        self.manager.cancel_current();
        self.store.shutdown()
    }

    /// Handle a UI event, returns true if quit was requested
    fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        if event.mutates_collection() {
            self.store.set_dirty();
        }
        let state = self.store.get_mut();
        state.notice = None;

        match event {
            // Tree navigation
            UiEvent::SelectRow(row) => {
                state.select_row(row);
            }
            UiEvent::SelectNext => state.select_next(),
            UiEvent::SelectPrev => state.select_prev(),
            UiEvent::ActivateSelected => {
                state.activate_selected();
            }

            // Collection editing
            UiEvent::NewGroup(name) => {
                state.new_group(name);
            }
            UiEvent::NewRequest(name) => {
                state.new_request(name);
            }
            UiEvent::SaveRequest { name, method, url } => {
                state.promote_request(name, RequestItem::new(method, url));
            }
            UiEvent::CloneSelected(name) => {
                if let Err(e) = state.clone_selected(name) {
                    state.notice = Some(e.to_string());
                }
            }
            UiEvent::RenameSelected(name) => {
                if let Err(e) = state.rename_selected(name) {
                    state.notice = Some(e.to_string());
                }
            }
            UiEvent::DeleteSelected => {
                if let Err(e) = state.delete_selected() {
                    state.notice = Some(e.to_string());
                }
            }

            // Active request editing
            UiEvent::SetUrl(url) => state.set_url(url),
            UiEvent::CycleMethod => state.cycle_method(),
            UiEvent::AddHeader(key, value) => {
                if let Some(request) = state.active_request_mut() {
                    request.add_header(key, value);
                }
            }
            UiEvent::RemoveHeader(key) => {
                if let Some(request) = state.active_request_mut() {
                    request.remove_header(&key);
                }
            }
            UiEvent::SetHeaderLine(key, line) => {
                if let Some(request) = state.active_request_mut() {
                    request.set_header_line(key, &line);
                }
            }
            UiEvent::SetContentType(content_type) => {
                if let Some(request) = state.active_request_mut() {
                    request.set_content_type(content_type.as_deref());
                }
            }
            UiEvent::SetPayload(payload) => {
                if let Some(request) = state.active_request_mut() {
                    request.set_payload(payload);
                }
            }
            UiEvent::FormatBody => {
                if let Err(e) = state.format_body() {
                    state.notice = Some(e.to_string());
                }
            }
            UiEvent::SetAuthentication(authentication) => state.set_authentication(authentication),

            // Exchange
            UiEvent::SendRequest => {
                if let Some(exchange) = state.prepare_exchange() {
                    state.handle_send_result(self.manager.send_request(exchange));
                }
            }
            UiEvent::CancelRequest => self.manager.cancel_current(),

            // System
            UiEvent::Refresh => {}
            UiEvent::Quit => return true,
        }

        false
    }
}
