//! Fixed delivery context for completion callbacks.
//!
//! Every completion runs on one dedicated thread, in the order it was
//! submitted, regardless of which runtime worker produced the result.
//! Callers consuming results never need their own synchronization.

use crossbeam_channel::{unbounded, Sender};
use std::panic::AssertUnwindSafe;
use std::thread::{self, ThreadId};

/// Name of the delivery thread.
pub const DELIVERY_THREAD_NAME: &str = "mindful-delivery";

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Errors that can occur when dispatching to the delivery thread.
#[derive(Debug)]
pub enum DeliveryError {
    /// The delivery thread could not be spawned
    Spawn(std::io::Error),
    /// The delivery thread has exited
    Closed,
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::Spawn(e) => write!(f, "Failed to spawn delivery thread: {e}"),
            DeliveryError::Closed => write!(f, "Delivery thread has exited"),
        }
    }
}

impl std::error::Error for DeliveryError {}

/// Handle to the delivery thread. Cheap to clone.
///
/// The thread exits once every handle has been dropped and queued jobs
/// have run.
#[derive(Debug, Clone)]
pub struct DeliveryQueue {
    sender: Sender<Job>,
    thread_id: ThreadId,
}

impl DeliveryQueue {
    /// Spawn the delivery thread.
    pub fn spawn() -> Result<Self, DeliveryError> {
        let (sender, receiver) = unbounded::<Job>();

        let handle = thread::Builder::new()
            .name(DELIVERY_THREAD_NAME.to_string())
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    if std::panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                        tracing::warn!("completion callback panicked");
                    }
                }
                tracing::debug!("delivery thread exiting");
            })
            .map_err(DeliveryError::Spawn)?;

        Ok(Self {
            sender,
            thread_id: handle.thread().id(),
        })
    }

    /// Queue `job` to run on the delivery thread.
    pub fn dispatch<F>(&self, job: F) -> Result<(), DeliveryError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender
            .send(Box::new(job))
            .map_err(|_| DeliveryError::Closed)
    }

    /// Check whether the caller is running on the delivery thread.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }
}
