//! Bounded FIFO queue with an outstanding-work counter.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{Notify, Semaphore, TryAcquireError, watch};

use super::{QueueItem, Queued};
use crate::domain::{Record, Ticket};
use crate::error::PoolError;

struct State {
    items: VecDeque<Queued>,
    closed: bool,
}

/// The queue shared by the pool and its workers.
///
/// Design:
/// - `items` + `closed` live behind one std mutex. It is never held across an
///   `.await`, every critical section is a few pointer moves.
/// - Capacity is a fair semaphore (one permit per free slot). Waiting
///   producers get slots in the order they started waiting, and a permit is
///   handed back the moment an item is *dequeued*.
/// - `unfinished` counts accepted items that are not yet marked done. It goes
///   up on accept and down on `task_done`, and `join` waits for it to hit 0.
/// - Closing wakes everybody: blocked producers get `Closed`, idle consumers
///   get `None` once the backlog is empty.
pub(crate) struct TaskQueue {
    state: Mutex<State>,
    slots: Option<Semaphore>,
    available: Notify,
    unfinished: watch::Sender<usize>,
}

impl TaskQueue {
    /// `capacity == 0` means unbounded.
    pub fn new(capacity: usize) -> Self {
        let (unfinished, _) = watch::channel(0);
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                closed: false,
            }),
            slots: (capacity > 0).then(|| Semaphore::new(capacity)),
            available: Notify::new(),
            unfinished,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Nothing in a critical section can panic half-way; a poisoned lock
        // still holds a consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release_slot(&self) {
        if let Some(slots) = &self.slots {
            slots.add_permits(1);
        }
    }

    /// Enqueue, waiting for a free slot when the queue is full.
    pub async fn put(&self, item: QueueItem) -> Result<Ticket, PoolError> {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }
        if let Some(slots) = &self.slots {
            let permit = slots.acquire().await.map_err(|_| PoolError::Closed)?;
            permit.forget();
        }
        self.push(item)
    }

    /// Enqueue without waiting.
    pub fn try_put(&self, item: QueueItem) -> Result<Ticket, PoolError> {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }
        if let Some(slots) = &self.slots {
            match slots.try_acquire() {
                Ok(permit) => permit.forget(),
                Err(TryAcquireError::NoPermits) => return Err(PoolError::QueueFull),
                Err(TryAcquireError::Closed) => return Err(PoolError::Closed),
            }
        }
        self.push(item)
    }

    /// Caller already holds a slot.
    fn push(&self, item: QueueItem) -> Result<Ticket, PoolError> {
        let mut state = self.lock();
        if state.closed {
            drop(state);
            self.release_slot();
            return Err(PoolError::Closed);
        }

        let (identifier, params) = item.into_parts();
        let record = Record::pending(identifier);
        let ticket = record.ticket();

        // count before the item becomes visible, a fast worker may finish it
        // before we return
        self.unfinished.send_modify(|n| *n += 1);
        state.items.push_back(Queued { record, params });
        drop(state);

        self.available.notify_one();
        Ok(ticket)
    }

    /// Dequeue the oldest item, waiting while the queue is empty.
    ///
    /// Returns `None` once the queue is closed *and* empty.
    pub async fn pop(&self) -> Option<Queued> {
        loop {
            // register interest before looking, so a push between the check
            // and the await isn't missed
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(entry) = state.items.pop_front() {
                    let more = !state.items.is_empty();
                    drop(state);
                    self.release_slot();
                    if more {
                        // pass the baton, another idle worker may be parked
                        self.available.notify_one();
                    }
                    return Some(entry);
                }
                if state.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Mark one dequeued item as finished.
    pub fn task_done(&self) {
        self.unfinished.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Wait until every accepted item has been marked done.
    pub async fn join(&self) {
        let mut rx = self.unfinished.subscribe();
        // the sender lives in `self`, so this can't observe a closed channel
        let _ = rx.wait_for(|n| *n == 0).await.map(|_| ());
    }

    /// Stop accepting items. Already queued items stay poppable.
    pub fn close(&self) {
        self.lock().closed = true;
        if let Some(slots) = &self.slots {
            slots.close();
        }
        self.available.notify_waiters();
    }

    /// Close, drop the backlog and zero the counter.
    ///
    /// Returns how many queued items were thrown away. Items a worker already
    /// holds are the caller's business.
    pub fn abandon(&self) -> usize {
        let dropped = {
            let mut state = self.lock();
            state.closed = true;
            let dropped = state.items.len();
            state.items.clear();
            dropped
        };
        if let Some(slots) = &self.slots {
            slots.close();
        }
        self.unfinished.send_replace(0);
        self.available.notify_waiters();
        dropped
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Items waiting to be picked up.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Accepted but not yet done (queued + in flight).
    pub fn unfinished(&self) -> usize {
        *self.unfinished.borrow()
    }
}
