//! Single synchronization point for the dungeon queue: the party FIFO, the
//! per-instance slot table, and the shutdown flag live under one lock with
//! one condition variable.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::types::{InstanceId, InstanceStatus, Party};

/// Per-slot bookkeeping, mutated only under the coordinator lock.
#[derive(Clone, Debug)]
pub struct SlotStats {
    pub status: InstanceStatus,
    pub served: u64,
    pub busy_time: Duration,
}

impl SlotStats {
    fn new() -> Self {
        Self {
            status: InstanceStatus::Idle,
            served: 0,
            busy_time: Duration::ZERO,
        }
    }
}

struct CoordState {
    queue: VecDeque<Party>,
    slots: Vec<SlotStats>,
    done: bool,
    busy_count: usize,
    max_busy: usize,
}

/// Shared coordination state for the dispatcher, every instance worker, and
/// the shutdown trigger.
pub struct Coordinator {
    state: Mutex<CoordState>,
    wakeup: Condvar,
}

impl Coordinator {
    /// Create a coordinator with `instances` idle slots and an empty queue.
    pub fn new(instances: usize) -> Self {
        Self {
            state: Mutex::new(CoordState {
                queue: VecDeque::new(),
                slots: vec![SlotStats::new(); instances],
                done: false,
                busy_count: 0,
                max_busy: 0,
            }),
            wakeup: Condvar::new(),
        }
    }

    /// Append a party to the queue tail; returns the party back if shutdown
    /// has already been signaled.
    pub fn enqueue(&self, party: Party) -> Result<(), Party> {
        let mut guard = self.state.lock().expect("coordinator mutex poisoned");
        if guard.done {
            return Err(party);
        }
        guard.queue.push_back(party);
        self.wakeup.notify_one();
        Ok(())
    }

    /// Block until a party can be claimed for `slot`, or until shutdown with
    /// an empty queue. A successful claim marks the slot busy and counts the
    /// serve in the same critical section; a lost claim race just waits
    /// again. Queued parties are still handed out after shutdown is
    /// signaled, so nothing already admitted is ever dropped.
    pub fn claim_blocking(&self, slot: InstanceId) -> Option<Party> {
        let mut guard = self.state.lock().expect("coordinator mutex poisoned");
        loop {
            if let Some(party) = guard.queue.pop_front() {
                debug_assert!(
                    guard.slots[slot].status.is_idle(),
                    "claim on busy slot {slot}"
                );
                guard.slots[slot].status = InstanceStatus::Busy;
                guard.slots[slot].served += 1;
                guard.busy_count += 1;
                if guard.busy_count > guard.max_busy {
                    guard.max_busy = guard.busy_count;
                }
                return Some(party);
            }
            if guard.done {
                return None;
            }
            // Wait releases the lock and re-acquires it before returning.
            guard = self.wakeup.wait(guard).expect("condvar wait failed");
        }
    }

    /// Record a completed run and return the slot to idle. Called exactly
    /// once per claimed party, after the simulated run finishes.
    pub fn finish_run(&self, slot: InstanceId, run_time: Duration) {
        let mut guard = self.state.lock().expect("coordinator mutex poisoned");
        debug_assert!(
            !guard.slots[slot].status.is_idle(),
            "finish on idle slot {slot}"
        );
        guard.slots[slot].busy_time += run_time;
        guard.slots[slot].status = InstanceStatus::Idle;
        guard.busy_count -= 1;
        // The dispatcher and any drain watcher re-check on slot release.
        self.wakeup.notify_all();
    }

    /// Flag that no further parties will ever be enqueued and wake all
    /// blocked threads. The flag is monotonic; repeat calls are harmless.
    pub fn signal_done(&self) {
        let mut guard = self.state.lock().expect("coordinator mutex poisoned");
        guard.done = true;
        self.wakeup.notify_all();
    }

    /// One dispatcher pass: wake one idle slot per queued party, then block
    /// until the shared state changes. Returns `false` once shutdown has
    /// been signaled and the queue is drained.
    pub fn dispatch_round(&self) -> bool {
        let mut guard = self.state.lock().expect("coordinator mutex poisoned");
        if guard.done && guard.queue.is_empty() {
            return false;
        }
        let idle = guard
            .slots
            .iter()
            .filter(|slot| slot.status.is_idle())
            .count();
        let wakes = idle.min(guard.queue.len());
        for _ in 0..wakes {
            self.wakeup.notify_one();
        }
        // Workers re-check their own wait condition on wake, so a stolen or
        // spurious wakeup only costs another scan.
        let _guard = self.wakeup.wait(guard).expect("condvar wait failed");
        true
    }

    /// Block until every queued party has been claimed and every slot is
    /// idle again. Used by drain-style shutdown triggers.
    pub fn wait_until_drained(&self) {
        let mut guard = self.state.lock().expect("coordinator mutex poisoned");
        while !(guard.queue.is_empty() && guard.busy_count == 0) {
            guard = self.wakeup.wait(guard).expect("condvar wait failed");
        }
    }

    /// Current number of queued parties.
    pub fn queue_len(&self) -> usize {
        let guard = self.state.lock().expect("coordinator mutex poisoned");
        guard.queue.len()
    }

    /// Snapshot of the per-slot statistics.
    pub fn slot_stats(&self) -> Vec<SlotStats> {
        let guard = self.state.lock().expect("coordinator mutex poisoned");
        guard.slots.clone()
    }

    /// Highest number of simultaneously busy slots observed so far.
    pub fn max_busy(&self) -> usize {
        let guard = self.state.lock().expect("coordinator mutex poisoned");
        guard.max_busy
    }
}
