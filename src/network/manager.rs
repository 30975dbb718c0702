//! Execution manager - single-flight request execution with cancellation
//!
//! At most one exchange is pending. Each accepted send gets a generation
//! number; a result is only handed to the completion handler while its
//! generation is still the latest one, so output of a cancelled or
//! superseded exchange never reaches the caller after a newer send began.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{ExchangeError, ExecutionError};
use crate::messages::{Completion, ExchangeRequest};
use crate::models::HttpResult;
use crate::network::client::execute_exchange;

/// Receives completions. Runs while the manager's bookkeeping lock is held,
/// so it must only hand the completion off (e.g. over a channel) and never
/// call back into the manager.
pub type CompletionHandler = Arc<dyn Fn(Completion) + Send + Sync>;

struct PendingExchange {
    generation: u64,
    item: Uuid,
    token: CancellationToken,
}

#[derive(Default)]
struct Inflight {
    generation: u64,
    pending: Option<PendingExchange>,
}

pub struct ExecutionManager {
    client: reqwest::Client,
    inflight: Arc<Mutex<Inflight>>,
    handler: CompletionHandler,
}

impl ExecutionManager {
    pub fn new(client: reqwest::Client, handler: impl Fn(Completion) + Send + Sync + 'static) -> Self {
        ExecutionManager {
            client,
            inflight: Arc::new(Mutex::new(Inflight::default())),
            handler: Arc::new(handler),
        }
    }

    /// Whether an exchange is outstanding
    pub fn pending(&self) -> bool {
        lock(&self.inflight).pending.is_some()
    }

    /// Item of the outstanding exchange, if any
    pub fn current_item(&self) -> Option<Uuid> {
        lock(&self.inflight).pending.as_ref().map(|p| p.item)
    }

    /// Starts an exchange in the background and returns its generation.
    /// Must be called from within a Tokio runtime.
    pub fn send_request(&self, exchange: ExchangeRequest) -> Result<u64, ExecutionError> {
        let (generation, token) = {
            let mut inflight = lock(&self.inflight);
            if inflight.pending.is_some() {
                return Err(ExecutionError::AlreadyInProgress);
            }

            inflight.generation += 1;
            let token = CancellationToken::new();
            inflight.pending = Some(PendingExchange {
                generation: inflight.generation,
                item: exchange.id,
                token: token.clone(),
            });
            (inflight.generation, token)
        };

        let started_at = Utc::now();
        let client = self.client.clone();
        let inflight = Arc::clone(&self.inflight);
        let handler = Arc::clone(&self.handler);

        tracing::info!(
            generation,
            id = %exchange.id,
            method = exchange.request.method.as_str(),
            url = %exchange.request.url,
            "Sending request"
        );

        tokio::spawn(async move {
            let result = tokio::select! {
                biased;

                _ = token.cancelled() => HttpResult::failed(started_at, ExchangeError::Cancelled),
                result = execute_exchange(&client, &exchange.request, started_at) => result,
            };

            let mut inflight = lock(&inflight);
            if inflight.generation != generation {
                tracing::debug!(generation, "Discarding stale result");
                return;
            }
            // checked under the lock cancel_current takes
            let result = late_cancel(result, &token, started_at);
            if inflight.pending.as_ref().is_some_and(|p| p.generation == generation) {
                inflight.pending = None;
            }

            tracing::info!(
                generation,
                status = ?result.status,
                error = ?result.error,
                elapsed_ms = result.elapsed().as_millis() as u64,
                "Request completed"
            );
            handler(Completion {
                generation,
                item: exchange.id,
                result,
            });
        });

        Ok(generation)
    }

    /// Aborts the outstanding exchange. `pending()` is false once this returns.
    pub fn cancel_current(&self) {
        let mut inflight = lock(&self.inflight);
        if let Some(pending) = inflight.pending.take() {
            tracing::info!(generation = pending.generation, id = %pending.item, "Cancelling request");
            pending.token.cancel();
        }
    }
}

fn late_cancel(result: HttpResult, token: &CancellationToken, started_at: DateTime<Utc>) -> HttpResult {
    if token.is_cancelled() && !result.is_cancelled() {
        HttpResult::failed(started_at, ExchangeError::Cancelled)
    } else {
        result
    }
}

fn lock(inflight: &Mutex<Inflight>) -> MutexGuard<'_, Inflight> {
    inflight.lock().unwrap_or_else(PoisonError::into_inner)
}
