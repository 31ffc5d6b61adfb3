//! Debounced auto-save
//!
//! Each `schedule` call replaces the pending save; the save runs once the
//! delay passes without another change. `cancel` drops a pending save.
//! Only the waiting phase is cancellable: once the delay has elapsed the
//! save runs to completion.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tracing::trace;

#[derive(Default)]
struct Slot {
    /// Task still waiting out the delay
    waiting: Option<AbortHandle>,

    /// Bumped by every schedule and cancel; a woken task with an older
    /// generation does nothing
    generation: u64,
}

pub struct AutoSaveTimer {
    delay: Duration,
    slot: Arc<Mutex<Slot>>,
}

impl AutoSaveTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `save` after the delay, replacing any pending save
    pub async fn schedule<F>(&self, save: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.slot.lock().await;
        if let Some(handle) = slot.waiting.take() {
            handle.abort();
            trace!("Auto-save rescheduled");
        }
        slot.generation += 1;
        let generation = slot.generation;

        let delay = self.delay;
        let shared = self.slot.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut slot = shared.lock().await;
                if slot.generation != generation {
                    return;
                }
                // Detach: the save below is no longer abortable
                slot.waiting = None;
            }
            save.await;
        });
        slot.waiting = Some(task.abort_handle());
    }

    pub async fn cancel(&self) {
        let mut slot = self.slot.lock().await;
        slot.generation += 1;
        if let Some(handle) = slot.waiting.take() {
            handle.abort();
            trace!("Auto-save cancelled");
        }
    }

    /// True while a scheduled save is still waiting out its delay
    pub async fn is_pending(&self) -> bool {
        self.slot
            .lock()
            .await
            .waiting
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}
