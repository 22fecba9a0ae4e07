use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use super::PersistenceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Every submitted job is written in order.
    EveryJob,
    /// Queued jobs are coalesced; only the newest pending one is written.
    LatestOnly,
}

/// Runs writes on a dedicated thread so submitters never wait for I/O.
///
/// Write failures are logged on the writer thread. Dropping the writer
/// drains the queue and joins the thread.
pub struct BackgroundWriter<T: Send + 'static> {
    name: &'static str,
    sender: Option<Sender<T>>,
    handle: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> BackgroundWriter<T> {
    pub fn spawn<F>(
        name: &'static str,
        policy: WritePolicy,
        sink: F,
    ) -> Result<Self, PersistenceError>
    where
        F: FnMut(T) -> Result<(), PersistenceError> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel::<T>();
        let handle = thread::Builder::new()
            .name(format!("{name}-writer"))
            .spawn(move || drain_jobs(name, policy, receiver, sink))
            .map_err(|source| PersistenceError::SpawnWriter { name, source })?;

        Ok(Self {
            name,
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    pub fn submit(&self, job: T) -> Result<(), PersistenceError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or(PersistenceError::WriterClosed { name: self.name })?;
        sender
            .send(job)
            .map_err(|_| PersistenceError::WriterClosed { name: self.name })
    }
}

impl<T: Send + 'static> Drop for BackgroundWriter<T> {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(writer = self.name, "background_writer_panicked");
            }
        }
    }
}

fn drain_jobs<T, F>(name: &'static str, policy: WritePolicy, receiver: Receiver<T>, mut sink: F)
where
    F: FnMut(T) -> Result<(), PersistenceError>,
{
    while let Ok(mut job) = receiver.recv() {
        if policy == WritePolicy::LatestOnly {
            let mut skipped = 0u32;
            while let Ok(newer) = receiver.try_recv() {
                job = newer;
                skipped = skipped.saturating_add(1);
            }
            if skipped > 0 {
                debug!(writer = name, skipped, "background_jobs_coalesced");
            }
        }
        if let Err(error) = sink(job) {
            warn!(writer = name, error = %error, "background_write_failed");
        }
    }
}
