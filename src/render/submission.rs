use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Sender, bounded, unbounded};

use crate::foundation::error::{BridgeError, BridgeResult};

/// A unit of work handed to the submission context.
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Where render submission and deferred initialization run.
pub trait SubmissionContext: Send + Sync {
    /// Queue `work`. Work items run in the order they were enqueued.
    fn enqueue(&self, work: Work);

    /// Block until everything enqueued so far has run.
    fn flush(&self);

    /// `true` when `enqueue` runs work immediately on the caller.
    fn is_inline(&self) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, Default)]
/// Runs work immediately on the calling thread.
pub struct InlineSubmission;

impl SubmissionContext for InlineSubmission {
    fn enqueue(&self, work: Work) {
        work();
    }

    fn flush(&self) {}

    fn is_inline(&self) -> bool {
        true
    }
}

enum Message {
    Run(Work),
    Fence(Sender<()>),
}

/// Dedicated, named worker thread fed by an unbounded channel.
///
/// Dropping it drains the queue and joins the thread.
pub struct RenderThread {
    tx: Option<Sender<Message>>,
    handle: Option<JoinHandle<()>>,
    thread_id: ThreadId,
}

impl RenderThread {
    /// Start the worker thread.
    pub fn spawn(name: impl Into<String>) -> BridgeResult<Self> {
        let (tx, rx) = unbounded::<Message>();
        let handle = thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                while let Ok(msg) = rx.recv() {
                    match msg {
                        Message::Run(work) => {
                            if catch_unwind(AssertUnwindSafe(work)).is_err() {
                                tracing::error!("render-thread work panicked");
                            }
                        }
                        Message::Fence(done) => {
                            let _ = done.send(());
                        }
                    }
                }
            })
            .map_err(|e| BridgeError::Other(anyhow::Error::new(e).context("spawn render thread")))?;
        let thread_id = handle.thread().id();
        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
            thread_id,
        })
    }

    /// `true` when called from the worker thread.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }
}

impl SubmissionContext for RenderThread {
    fn enqueue(&self, work: Work) {
        let Some(tx) = self.tx.as_ref() else {
            return;
        };
        if tx.send(Message::Run(work)).is_err() {
            tracing::error!("render thread is gone, work dropped");
        }
    }

    fn flush(&self) {
        if self.is_current() {
            return;
        }
        let Some(tx) = self.tx.as_ref() else {
            return;
        };
        let (done_tx, done_rx) = bounded(1);
        if tx.send(Message::Fence(done_tx)).is_ok() {
            let _ = done_rx.recv();
        }
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        drop(self.tx.take());
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::error!("render thread panicked on shutdown");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/submission.rs"]
mod tests;
