//! Single-resolution asynchronous requests.
//!
//! # Invariants
//! - Every request resolves exactly once, to `Success` or `Failure`.
//! - Submission and execution failures arrive through the same channel.
//! - A worker that disappears resolves the request as `Abandoned`, and so
//!   does a completion callback whose runtime shuts down first.

use super::envelope::{AccessResult, Envelope, SubmissionError};
use crate::store::Context;
use log::{debug, warn};
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use tokio::runtime::Handle;
use tokio::sync::oneshot;

/// Future resolving to the [`Envelope`] of one submitted operation.
///
/// Completion runs on the runtime's blocking pool, not on the submitting
/// task; independent requests may complete in any order.
#[must_use = "requests resolve only when awaited or given a completion"]
pub struct Request<T> {
    state: RequestState<T>,
    handle: Option<Handle>,
}

enum RequestState<T> {
    Pending(oneshot::Receiver<Envelope<T>>),
    Ready(Option<Envelope<T>>),
}

impl<T> Unpin for Request<T> {}

impl<T> Request<T> {
    fn resolved(envelope: Envelope<T>) -> Self {
        Self {
            state: RequestState::Ready(Some(envelope)),
            handle: None,
        }
    }
}

impl<T: Send + 'static> Request<T> {
    /// Delivers the outcome to `completion` instead of awaiting it.
    ///
    /// Requests that failed at submission call `completion` immediately on
    /// the calling thread. If the runtime shuts down before the delivery
    /// task runs, `completion` receives `Abandoned` as the task is dropped.
    pub fn on_complete<F>(self, completion: F)
    where
        F: FnOnce(Envelope<T>) + Send + 'static,
    {
        match self.handle.clone() {
            Some(handle) => {
                let completion = Completion::new(completion);
                handle.spawn(async move {
                    completion.deliver(self.await);
                });
            }
            None => match self.state {
                RequestState::Ready(Some(envelope)) => completion(envelope),
                _ => completion(Envelope::Failure(SubmissionError::Abandoned.into())),
            },
        }
    }
}

/// Calls its callback exactly once: with the delivered envelope, or with
/// `Abandoned` when dropped undelivered.
struct Completion<T, F>
where
    F: FnOnce(Envelope<T>),
{
    callback: Option<F>,
    _envelope: PhantomData<fn(Envelope<T>)>,
}

impl<T, F> Completion<T, F>
where
    F: FnOnce(Envelope<T>),
{
    fn new(callback: F) -> Self {
        Self {
            callback: Some(callback),
            _envelope: PhantomData,
        }
    }

    fn deliver(mut self, envelope: Envelope<T>) {
        if let Some(callback) = self.callback.take() {
            callback(envelope);
        }
    }
}

impl<T, F> Drop for Completion<T, F>
where
    F: FnOnce(Envelope<T>),
{
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            debug!("event=request_complete module=exec status=error error_code=abandoned");
            callback(Envelope::Failure(SubmissionError::Abandoned.into()));
        }
    }
}

impl<T> Future for Request<T> {
    type Output = Envelope<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.state {
            RequestState::Pending(receiver) => match Pin::new(receiver).poll(cx) {
                Poll::Ready(Ok(envelope)) => Poll::Ready(envelope),
                Poll::Ready(Err(_)) => {
                    Poll::Ready(Envelope::Failure(SubmissionError::Abandoned.into()))
                }
                Poll::Pending => Poll::Pending,
            },
            RequestState::Ready(slot) => Poll::Ready(
                slot.take()
                    .unwrap_or(Envelope::Failure(SubmissionError::Abandoned.into())),
            ),
        }
    }
}

/// Runs `job` against `context` on the blocking pool of the current runtime.
pub(crate) fn submit<T, F>(operation: &'static str, context: &Context, job: F) -> Request<T>
where
    T: Send + 'static,
    F: FnOnce(Context) -> AccessResult<T> + Send + 'static,
{
    if context.is_discarded() {
        warn!(
            "event=request_submit module=exec status=error operation={operation} error_code=context_discarded"
        );
        return Request::resolved(Envelope::Failure(SubmissionError::ContextDiscarded.into()));
    }

    let handle = match Handle::try_current() {
        Ok(handle) => handle,
        Err(_) => {
            warn!(
                "event=request_submit module=exec status=error operation={operation} error_code=no_runtime"
            );
            return Request::resolved(Envelope::Failure(SubmissionError::NoRuntime.into()));
        }
    };

    let (sender, receiver) = oneshot::channel();
    let context = context.clone();
    handle.spawn_blocking(move || {
        let envelope = Envelope::from(job(context));
        // The receiver may already be gone; the outcome is then unobserved.
        let _ = sender.send(envelope);
    });
    debug!("event=request_submit module=exec status=ok operation={operation}");

    Request {
        state: RequestState::Pending(receiver),
        handle: Some(handle),
    }
}
