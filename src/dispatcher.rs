//! Dispatcher loop: wakes idle instances while work is pending.

use crate::coordinator::Coordinator;
use crate::log_dev;

/// Drive dispatch rounds until shutdown has been signaled and the queue is
/// drained. Each round wakes at most one idle slot per queued party, then
/// blocks until the queue, the slot table, or the done flag changes. The
/// dispatcher never claims parties itself; workers perform the atomic claim.
pub fn run_dispatcher(coord: &Coordinator) {
    while coord.dispatch_round() {}
    log_dev!("[DISPATCH] dispatcher stopped");
}
