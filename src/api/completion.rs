//! The capability to finish a request.
//!
//! Whoever processes a request receives a [`RequestCompletion`] and must use
//! it exactly once, either to resolve the request with a result or to reject
//! it with a [`KeyguardError`]. Both consume the completion, so a request can
//! never be completed twice.

use tokio::sync::oneshot;
use tracing::debug;

use super::error::KeyguardError;

pub type RequestResult<T> = Result<T, KeyguardError>;

#[derive(Debug)]
pub struct RequestCompletion<T> {
    sender: oneshot::Sender<RequestResult<T>>,
}

/// The receiving end, held by the orchestrator.
pub type PendingResult<T> = oneshot::Receiver<RequestResult<T>>;

impl<T> RequestCompletion<T> {
    pub fn new() -> (Self, PendingResult<T>) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }

    pub fn resolve(self, result: T) {
        self.complete(Ok(result));
    }

    pub fn reject(self, error: KeyguardError) {
        self.complete(Err(error));
    }

    /// Whether the orchestrator still waits for a result. It stops waiting
    /// once the request was canceled.
    pub fn is_awaited(&self) -> bool {
        !self.sender.is_closed()
    }

    fn complete(self, result: RequestResult<T>) {
        if self.sender.send(result).is_err() {
            debug!("request was abandoned before completion; dropping result");
        }
    }
}
