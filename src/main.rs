mod coordinator;
mod dispatcher;
mod instance;
mod logging;
mod matchmaking;
mod sim;
mod types;

use std::io::{self, Write};
use std::time::Duration;

use matchmaking::QueueConfig;
use sim::{DEFAULT_SHUTDOWN_DELAY, ShutdownTrigger};

fn parse_usize_list(arg: &str) -> Option<Vec<usize>> {
    if arg == "-" {
        return None;
    }
    let mut values = Vec::new();
    for part in arg.split(',') {
        if part.trim().is_empty() {
            return None;
        }
        let value = part.trim().parse::<usize>().ok()?;
        values.push(value);
    }
    Some(values)
}

fn print_usage(program: &str) {
    println!("Dungeon Queue CLI");
    println!("Usage:");
    println!("  {program} (interactive prompts)");
    println!("  {program} run [instances] [tanks] [healers] [dps] [min_s] [max_s] [seed] [drain]");
    println!("  {program} bench [instances] [parties] [work_ms] [validate]");
    println!("  {program} stress [instance_sets] [party_sets] [work_ms] [validate]");
    println!("  {program} --help");
    println!();
    println!("Sets are comma-separated lists (e.g., 1,2,4). Use \"-\" to keep a set's default.");
    println!("Defaults:");
    println!("  run    instances=3 tanks=5 healers=5 dps=15 min_s=1 max_s=3 (seed drawn at random)");
    println!("  bench  instances=4 parties=100 work_ms=5");
    println!("  stress instance_sets=1,2,4,8,12 party_sets=10,50,100 work_ms=5");
    println!("Flags:");
    println!("  drain     stop once the queue is drained instead of after the 1s timer");
    println!("  validate  enable extra safety checks (bench/stress)");
}

fn exit_with_usage(program: &str, message: &str) -> ! {
    eprintln!("{message}");
    print_usage(program);
    std::process::exit(2);
}

/// Prompt until the user enters an integer of at least `min`, re-prompting
/// on anything that does not parse or falls below the floor.
fn prompt_value(prompt: &str, min: u64) -> u64 {
    let mut line = String::new();
    loop {
        print!("{prompt}");
        io::stdout().flush().expect("failed to flush stdout");
        line.clear();
        let read = io::stdin()
            .read_line(&mut line)
            .expect("failed to read stdin");
        if read == 0 {
            eprintln!("input closed before configuration finished");
            std::process::exit(2);
        }
        match line.trim().parse::<u64>() {
            Ok(value) if value >= min => return value,
            Ok(_) => println!("Invalid input! Please enter a number of at least {min}.\n"),
            Err(_) => println!("Invalid input! Please enter a valid integer number.\n"),
        }
    }
}

fn run_interactive() {
    let instances = prompt_value("Enter number of instances: ", 1);
    let tanks = prompt_value("Enter number of tanks: ", 1);
    let healers = prompt_value("Enter number of healers: ", 1);
    let dps = prompt_value("Enter number of DPS: ", 1);
    let min_s = prompt_value("Enter min dungeon time (seconds): ", 1);
    // Passing the min as the floor keeps max >= min without a retry loop.
    let max_s = prompt_value("Enter max dungeon time (seconds): ", min_s);
    println!();

    let config = QueueConfig {
        instances: instances as usize,
        tanks,
        healers,
        dps,
        min_run: Duration::from_secs(min_s),
        max_run: Duration::from_secs(max_s),
        seed: None,
    };
    if let Err(error) = sim::run_queue(&config, ShutdownTrigger::AfterDelay(DEFAULT_SHUTDOWN_DELAY))
    {
        eprintln!("{error}");
        std::process::exit(2);
    }
}

fn main() {
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "dungeon_queue".to_string());
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("run") => {
            let mut values: Vec<u64> = Vec::new();
            let mut drain = false;
            for arg in args {
                match arg.as_str() {
                    "drain" => drain = true,
                    other => match other.parse::<u64>() {
                        Ok(value) => values.push(value),
                        Err(_) => {
                            exit_with_usage(&program, &format!("run: invalid argument: {other}"))
                        }
                    },
                }
            }
            if values.len() > 7 {
                exit_with_usage(&program, "run: too many arguments");
            }

            let config = QueueConfig {
                instances: values.first().copied().unwrap_or(3) as usize,
                tanks: values.get(1).copied().unwrap_or(5),
                healers: values.get(2).copied().unwrap_or(5),
                dps: values.get(3).copied().unwrap_or(15),
                min_run: Duration::from_secs(values.get(4).copied().unwrap_or(1)),
                max_run: Duration::from_secs(values.get(5).copied().unwrap_or(3)),
                seed: values.get(6).copied(),
            };
            let trigger = if drain {
                ShutdownTrigger::WhenDrained
            } else {
                ShutdownTrigger::AfterDelay(DEFAULT_SHUTDOWN_DELAY)
            };
            if let Err(error) = sim::run_queue(&config, trigger) {
                eprintln!("run error: {error}");
                std::process::exit(2);
            }
        }
        Some("bench") => {
            let mut values: Vec<u64> = Vec::new();
            let mut validate = false;
            for arg in args {
                match arg.as_str() {
                    "validate" => validate = true,
                    other => match other.parse::<u64>() {
                        Ok(value) => values.push(value),
                        Err(_) => {
                            exit_with_usage(&program, &format!("bench: invalid argument: {other}"))
                        }
                    },
                }
            }
            if values.len() > 3 {
                exit_with_usage(&program, "bench: too many arguments");
            }
            sim::run_benchmark(
                values.first().map(|&v| v as usize),
                values.get(1).map(|&v| v as usize),
                values.get(2).copied(),
                validate,
            );
        }
        Some("stress") => {
            let mut instance_sets: Option<Vec<usize>> = None;
            let mut party_sets: Option<Vec<usize>> = None;
            let mut work_ms: Option<u64> = None;
            let mut instance_sets_skipped = false;
            let mut party_sets_skipped = false;
            let mut validate = false;

            for arg in args {
                if arg == "validate" {
                    validate = true;
                    continue;
                }

                if instance_sets.is_none() && !instance_sets_skipped {
                    if arg == "-" {
                        instance_sets_skipped = true;
                    } else if let Some(values) = parse_usize_list(&arg) {
                        instance_sets = Some(values);
                    } else {
                        exit_with_usage(
                            &program,
                            &format!("stress: invalid instance_sets value: {arg}"),
                        );
                    }
                    continue;
                }
                if party_sets.is_none() && !party_sets_skipped {
                    if arg == "-" {
                        party_sets_skipped = true;
                    } else if let Some(values) = parse_usize_list(&arg) {
                        party_sets = Some(values);
                    } else {
                        exit_with_usage(
                            &program,
                            &format!("stress: invalid party_sets value: {arg}"),
                        );
                    }
                    continue;
                }
                if work_ms.is_none() {
                    if let Ok(value) = arg.parse::<u64>() {
                        work_ms = Some(value);
                    } else {
                        exit_with_usage(
                            &program,
                            &format!("stress: invalid work_ms value: {arg}"),
                        );
                    }
                    continue;
                }

                exit_with_usage(&program, &format!("stress: unexpected argument: {arg}"));
            }

            sim::run_stress(instance_sets, party_sets, work_ms, validate);
        }
        Some("--help") | Some("-h") | Some("help") => print_usage(&program),
        Some(other) => {
            exit_with_usage(&program, &format!("unknown command: {other}"));
        }
        None => run_interactive(),
    }
}
