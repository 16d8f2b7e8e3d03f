//! Simulation, benchmark, and stress-test runners for the dungeon queue.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::coordinator::{Coordinator, SlotStats};
use crate::dispatcher::run_dispatcher;
use crate::instance::run_instance;
use crate::log_dev;
use crate::matchmaking::{self, ConfigError, QueueConfig, Unmatched};
use crate::types::Party;

/// Default time the queue stays open before shutdown is signaled.
pub const DEFAULT_SHUTDOWN_DELAY: Duration = Duration::from_secs(1);

/// Policy deciding when no further parties will ever be admitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownTrigger {
    /// Signal after a fixed delay. Parties still queued or in flight at
    /// that point are drained before the workers stop.
    AfterDelay(Duration),
    /// Signal once the queue is empty and every instance is idle.
    WhenDrained,
}

/// Aggregated outcome of a completed simulation.
#[derive(Clone, Debug)]
pub struct SimReport {
    pub slots: Vec<SlotStats>,
    pub total_served: u64,
    pub total_busy: Duration,
    pub max_busy: usize,
    pub leftover: usize,
    pub elapsed: Duration,
}

/// Best-effort CPU user/system time snapshot (seconds) on Unix platforms.
#[cfg(unix)]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return None;
    }
    let user = usage.ru_utime.tv_sec as f64 + (usage.ru_utime.tv_usec as f64 / 1_000_000.0);
    let sys = usage.ru_stime.tv_sec as f64 + (usage.ru_stime.tv_usec as f64 / 1_000_000.0);
    Some((user, sys))
}

/// Stub on non-Unix platforms.
#[cfg(not(unix))]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    None
}

/// Populate the queue, spawn one worker thread per instance plus the
/// dispatcher, fire the shutdown trigger, and join everything.
pub fn run_simulation(
    instances: usize,
    parties: Vec<Party>,
    trigger: ShutdownTrigger,
) -> SimReport {
    debug_assert!(instances > 0, "instances must be > 0");
    let coord = Arc::new(Coordinator::new(instances));
    let total = parties.len();
    // Population happens before any worker starts, per the admission model.
    for party in parties {
        coord.enqueue(party).expect("queue closed before startup");
    }
    log_dev!("[QUEUE] loaded {total} parties");

    let start = Instant::now();
    let mut workers = Vec::with_capacity(instances);
    for slot in 0..instances {
        let coord = Arc::clone(&coord);
        let handle = thread::Builder::new()
            .name(format!("instance-{}", slot + 1))
            .spawn(move || run_instance(slot, &coord))
            .expect("failed to spawn instance thread");
        workers.push(handle);
    }
    let dispatcher = {
        let coord = Arc::clone(&coord);
        thread::Builder::new()
            .name("dispatcher".to_string())
            .spawn(move || run_dispatcher(&coord))
            .expect("failed to spawn dispatcher thread")
    };

    match trigger {
        ShutdownTrigger::AfterDelay(delay) => {
            thread::sleep(delay);
            log_dev!("[SHUTDOWN] timer elapsed, signaling done");
        }
        ShutdownTrigger::WhenDrained => {
            coord.wait_until_drained();
            log_dev!("[SHUTDOWN] queue drained, signaling done");
        }
    }
    coord.signal_done();

    for handle in workers {
        handle.join().expect("instance thread panicked");
    }
    dispatcher.join().expect("dispatcher thread panicked");

    let slots = coord.slot_stats();
    let total_served = slots.iter().map(|slot| slot.served).sum();
    let total_busy = slots.iter().map(|slot| slot.busy_time).sum();
    SimReport {
        total_served,
        total_busy,
        max_busy: coord.max_busy(),
        leftover: coord.queue_len(),
        elapsed: start.elapsed(),
        slots,
    }
}

/// Print the final statistics block: per-instance lines, totals, and the
/// unmatched roster.
pub fn print_report(report: &SimReport, unmatched: &Unmatched) {
    println!("FINAL STATISTICS");
    for (slot, stats) in report.slots.iter().enumerate() {
        println!(
            "instance {} served {} parties in {:.2}s",
            slot + 1,
            stats.served,
            stats.busy_time.as_secs_f64()
        );
    }
    println!("total_parties_served={}", report.total_served);
    println!("total_time_served={:.2}s", report.total_busy.as_secs_f64());
    println!("max_concurrent_runs={}", report.max_busy);
    println!("unmatched_tanks={}", unmatched.tanks);
    println!("unmatched_healers={}", unmatched.healers);
    println!("unmatched_dps={}", unmatched.dps);
}

/// Validate the configuration, form the lobby, run the simulation, and
/// print the final statistics.
pub fn run_queue(config: &QueueConfig, trigger: ShutdownTrigger) -> Result<(), ConfigError> {
    config.validate()?;
    let lobby = matchmaking::form_parties(config);
    log_dev!(
        "[LOBBY] formed {} parties (seed={}) unmatched tanks={} healers={} dps={}",
        lobby.parties.len(),
        lobby.seed,
        lobby.unmatched.tanks,
        lobby.unmatched.healers,
        lobby.unmatched.dps
    );
    for slot in 0..config.instances {
        log_dev!("[INSTANCE] instance {} is empty", slot + 1);
    }

    let report = run_simulation(config.instances, lobby.parties, trigger);
    print_report(&report, &lobby.unmatched);
    Ok(())
}

/// Aggregated metrics from a single benchmark run.
struct BenchResult {
    instances: usize,
    parties: usize,
    work_ms: u64,
    total_served: u64,
    elapsed_ms: f64,
    throughput: f64,
    cpu_user_s: Option<f64>,
    cpu_sys_s: Option<f64>,
    max_busy: usize,
    leftover: usize,
}

fn benchmark_once(instances: usize, parties: usize, work_ms: u64) -> BenchResult {
    debug_assert!(instances > 0, "instances must be > 0");
    debug_assert!(parties > 0, "parties must be > 0");
    let queue: Vec<Party> = (1..=parties as u64)
        .map(|id| Party::new(id, Duration::from_millis(work_ms)))
        .collect();

    let cpu_start = cpu_times_seconds();
    let report = run_simulation(instances, queue, ShutdownTrigger::WhenDrained);

    let elapsed_ms = report.elapsed.as_millis() as f64;
    let throughput = if elapsed_ms > 0.0 {
        (report.total_served as f64) / (elapsed_ms / 1000.0)
    } else {
        0.0
    };
    let (cpu_user_s, cpu_sys_s) = match (cpu_start, cpu_times_seconds()) {
        (Some((user_start, sys_start)), Some((user_end, sys_end))) => {
            (Some(user_end - user_start), Some(sys_end - sys_start))
        }
        _ => (None, None),
    };

    BenchResult {
        instances,
        parties,
        work_ms,
        total_served: report.total_served,
        elapsed_ms,
        throughput,
        cpu_user_s,
        cpu_sys_s,
        max_busy: report.max_busy,
        leftover: report.leftover,
    }
}

const BENCH_CSV_HEADER: &str = "instances,parties,work_ms,total_served,elapsed_ms,\
throughput_parties_per_s,cpu_user_s,cpu_sys_s,max_busy,leftover";

fn print_bench_row(result: &BenchResult, validate: bool) {
    let cpu_user = result
        .cpu_user_s
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "NA".to_string());
    let cpu_sys = result
        .cpu_sys_s
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "NA".to_string());
    println!(
        "{},{},{},{},{:.2},{:.2},{},{},{},{}",
        result.instances,
        result.parties,
        result.work_ms,
        result.total_served,
        result.elapsed_ms,
        result.throughput,
        cpu_user,
        cpu_sys,
        result.max_busy,
        result.leftover
    );
    if result.leftover > 0 {
        eprintln!("# warning,leftover_parties,{}", result.leftover);
    }
    if validate {
        if result.total_served != result.parties as u64 {
            eprintln!(
                "# violation,served_mismatch,{},{}",
                result.total_served, result.parties
            );
        }
        if result.max_busy > result.instances {
            eprintln!(
                "# violation,occupancy_overflow,{},{}",
                result.max_busy, result.instances
            );
        }
    }
}

/// Run a single benchmark with optional parameter overrides.
pub fn run_benchmark(
    instances: Option<usize>,
    parties: Option<usize>,
    work_ms: Option<u64>,
    validate: bool,
) {
    let instances = instances.unwrap_or(4);
    let parties = parties.unwrap_or(100);
    let work_ms = work_ms.unwrap_or(5);
    if instances == 0 {
        eprintln!("benchmark error: instances must be > 0");
        return;
    }
    if parties == 0 {
        eprintln!("benchmark error: parties must be > 0");
        return;
    }
    let result = benchmark_once(instances, parties, work_ms);

    println!("{BENCH_CSV_HEADER}");
    print_bench_row(&result, validate);
}

/// Sweep multiple benchmark configurations and print CSV output.
pub fn run_stress(
    instance_sets: Option<Vec<usize>>,
    party_sets: Option<Vec<usize>>,
    work_ms: Option<u64>,
    validate: bool,
) {
    let default_instance_sets = [1usize, 2, 4, 8, 12];
    let default_party_sets = [10usize, 50, 100];
    let work_ms = work_ms.unwrap_or(5);

    let instance_sets = instance_sets.unwrap_or_else(|| default_instance_sets.to_vec());
    let party_sets = party_sets.unwrap_or_else(|| default_party_sets.to_vec());
    if instance_sets.iter().any(|&instances| instances == 0) {
        eprintln!("stress error: instance_sets must be > 0");
        return;
    }
    if party_sets.iter().any(|&parties| parties == 0) {
        eprintln!("stress error: party_sets must be > 0");
        return;
    }

    println!("{BENCH_CSV_HEADER}");
    for instances in instance_sets {
        for parties in party_sets.iter().copied() {
            let result = benchmark_once(instances, parties, work_ms);
            print_bench_row(&result, validate);
        }
    }
}
