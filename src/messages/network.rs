//! Network messages - communication between App and Network layers

use uuid::Uuid;

use crate::collection::RequestItem;
use crate::models::HttpResult;

/// Snapshot of a saved request handed to the execution manager
#[derive(Debug, Clone)]
pub struct ExchangeRequest {
    pub id: Uuid,
    pub request: RequestItem,
}

impl ExchangeRequest {
    pub fn new(id: Uuid, request: &RequestItem) -> Self {
        let mut request = request.clone();
        request.result = None;
        ExchangeRequest { id, request }
    }
}

/// Delivered exactly once for each accepted send that was not superseded
#[derive(Debug, Clone)]
pub struct Completion {
    /// Generation token the exchange ran under
    pub generation: u64,
    pub item: Uuid,
    pub result: HttpResult,
}
