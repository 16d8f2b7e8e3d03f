//! Worker loop for a single dungeon instance slot.

use std::thread;

use crate::coordinator::Coordinator;
use crate::log_dev;
use crate::types::InstanceId;

/// Run one instance slot until shutdown: claim a party, simulate the dungeon
/// run without holding the coordinator lock, record the completion, repeat.
/// An in-flight run always completes, even when shutdown is signaled
/// mid-run.
pub fn run_instance(slot: InstanceId, coord: &Coordinator) {
    while let Some(party) = coord.claim_blocking(slot) {
        log_dev!(
            "[INSTANCE] instance {} active with party {} for {:.2}s",
            slot + 1,
            party.id,
            party.duration.as_secs_f64()
        );
        thread::sleep(party.duration);
        coord.finish_run(slot, party.duration);
        log_dev!("[INSTANCE] instance {} is now empty", slot + 1);
    }
    log_dev!("[INSTANCE] instance {} stopped", slot + 1);
}
