//! Request/response correlation.
//!
//! Outbound two-way requests register a pending slot keyed by request id;
//! the decoded response settles the slot and wakes the caller. Responses and
//! requests interleave arbitrarily on the wire; correlation is solely by
//! id. The store also keeps the original request around so the codec can
//! decode responses with knowledge of what was asked (method-aware
//! decoding).

use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::warn;

use super::Body;
use super::Request;
use super::Response;
use crate::constants::DEFAULT_TIMEOUT_MS;
use crate::error::{self, CodecError};

/// A registered pending response: the original request plus the slot the
/// caller is waiting on.
pub struct PendingResponse {
    request: Request,
    sender: oneshot::Sender<Response>,
    deadline: Instant,
}

impl PendingResponse {
    /// The request this slot is waiting to answer.
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Settle the slot. `false` when the caller already gave up.
    pub fn complete(self, response: Response) -> bool {
        self.sender.send(response).is_ok()
    }
}

/// Caller-side handle for one correlated response.
pub struct ResponseFuture {
    id: u64,
    receiver: oneshot::Receiver<Response>,
}

impl ResponseFuture {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait until the slot is settled by a response, a timeout sweep, or
    /// cancellation.
    pub async fn wait(self) -> Result<Response, CodecError> {
        let id = self.id;
        self.receiver
            .await
            .map_err(|_| error::CancelledSnafu { id }.build())
    }
}

/// Thread-safe map from request id to pending slot.
#[derive(Default)]
pub struct CorrelationStore {
    pending: DashMap<u64, PendingResponse>,
}

impl CorrelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide store the default codec decodes against.
    pub fn global() -> Arc<CorrelationStore> {
        static GLOBAL: OnceLock<Arc<CorrelationStore>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(CorrelationStore::new())).clone()
    }

    /// Register a pending slot for `request` and hand back the caller-side
    /// future. The slot expires `timeout` from now unless settled first.
    pub fn register(&self, request: &Request, timeout: Duration) -> ResponseFuture {
        let (sender, receiver) = oneshot::channel();
        let id = request.id();
        self.pending.insert(
            id,
            PendingResponse {
                request: request.clone(),
                sender,
                deadline: Instant::now() + timeout,
            },
        );
        ResponseFuture { id, receiver }
    }

    /// [`CorrelationStore::register`] with the default timeout.
    pub fn register_default(&self, request: &Request) -> ResponseFuture {
        self.register(request, Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }

    /// Remove and return the pending slot for `id`, if any.
    pub fn take(&self, id: u64) -> Option<PendingResponse> {
        self.pending.remove(&id).map(|(_, pending)| pending)
    }

    /// Drop the pending slot for `id`; the waiting caller observes
    /// cancellation.
    pub fn cancel(&self, id: u64) {
        self.pending.remove(&id);
    }

    /// Settle the slot correlated with `response`. Responses with no pending
    /// slot (the caller timed out or never registered) are dropped; the
    /// store keeps no record of them, so late or duplicate responses cannot
    /// accumulate.
    pub fn complete(&self, response: Response) {
        let id = response.id();
        match self.take(id) {
            Some(pending) => {
                if !pending.complete(response) {
                    warn!(id, "caller abandoned the pending slot before the response arrived");
                }
            }
            None => {
                warn!(id, "dropping response with no pending request");
            }
        }
    }

    /// Body of the request pending under `id`, for method-aware response
    /// decoding. Leaves the slot registered.
    pub fn request_data(&self, id: u64) -> Option<Body> {
        self.pending.get(&id).map(|pending| pending.request().data().clone())
    }

    /// Expire every slot whose deadline has passed, settling each with a
    /// timeout response. Returns how many expired.
    pub fn sweep(&self, now: Instant) -> usize {
        let expired: Vec<u64> = self
            .pending
            .iter()
            .filter(|entry| entry.value().deadline <= now)
            .map(|entry| *entry.key())
            .collect();
        let mut swept = 0;
        for id in expired {
            if let Some(pending) = self.take(id) {
                let mut timeout = Response::new(id);
                timeout.set_status(Response::CLIENT_TIMEOUT);
                timeout.set_error_message(format!("waiting response timeout, request id {id}"));
                pending.complete(timeout);
                swept += 1;
            }
        }
        swept
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
