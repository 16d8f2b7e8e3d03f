//! Roster matching and party generation for the dungeon queue.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::types::Party;

/// Players required per party: one tank, one healer, three DPS.
pub const DPS_PER_PARTY: u64 = 3;

/// Startup configuration consumed by the simulation.
#[derive(Clone, Debug)]
pub struct QueueConfig {
    pub instances: usize,
    pub tanks: u64,
    pub healers: u64,
    pub dps: u64,
    pub min_run: Duration,
    pub max_run: Duration,
    /// Fixed RNG seed for reproducible runs; `None` draws one at random.
    pub seed: Option<u64>,
}

/// Configuration rejected before any thread starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("instance count must be at least 1")]
    NoInstances,
    #[error("max dungeon time {max:?} is below min {min:?}")]
    RunTimeRange { min: Duration, max: Duration },
}

impl QueueConfig {
    /// Reject invalid configurations before the simulation spawns threads.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instances == 0 {
            return Err(ConfigError::NoInstances);
        }
        if self.max_run < self.min_run {
            return Err(ConfigError::RunTimeRange {
                min: self.min_run,
                max: self.max_run,
            });
        }
        Ok(())
    }
}

/// Players left over once no further full party can be formed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Unmatched {
    pub tanks: u64,
    pub healers: u64,
    pub dps: u64,
}

/// Result of matching the roster into full parties.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lobby {
    pub parties: Vec<Party>,
    pub unmatched: Unmatched,
    /// Seed actually used for duration generation.
    pub seed: u64,
}

/// Form as many full parties as the roster allows, drawing each dungeon
/// duration uniformly from the configured range at millisecond granularity.
/// Unmatched players are reported but never enter the queue.
pub fn form_parties(config: &QueueConfig) -> Lobby {
    let max_formable = config
        .tanks
        .min(config.healers)
        .min(config.dps / DPS_PER_PARTY);
    let unmatched = Unmatched {
        tanks: config.tanks - max_formable,
        healers: config.healers - max_formable,
        dps: config.dps - max_formable * DPS_PER_PARTY,
    };

    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = SmallRng::seed_from_u64(seed);
    let min_ms = config.min_run.as_millis() as u64;
    let max_ms = config.max_run.as_millis() as u64;

    let parties = (1..=max_formable)
        .map(|id| {
            let duration = Duration::from_millis(rng.random_range(min_ms..=max_ms));
            Party::new(id, duration)
        })
        .collect();

    Lobby {
        parties,
        unmatched,
        seed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(tanks: u64, healers: u64, dps: u64) -> QueueConfig {
        QueueConfig {
            instances: 2,
            tanks,
            healers,
            dps,
            min_run: Duration::from_millis(10),
            max_run: Duration::from_millis(30),
            seed: Some(7),
        }
    }

    #[test]
    fn forms_parties_limited_by_scarcest_role() {
        let lobby = form_parties(&config(7, 5, 23));
        // 23 DPS support 7 parties, so 5 healers are the limit.
        assert_eq!(lobby.parties.len(), 5);
        assert_eq!(
            lobby.unmatched,
            Unmatched {
                tanks: 2,
                healers: 0,
                dps: 8,
            }
        );
        let ids: Vec<u64> = lobby.parties.iter().map(|party| party.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn durations_stay_within_configured_bounds() {
        let cfg = config(20, 20, 60);
        let lobby = form_parties(&cfg);
        assert_eq!(lobby.parties.len(), 20);
        for party in &lobby.parties {
            assert!(party.duration >= cfg.min_run, "party {} too short", party.id);
            assert!(party.duration <= cfg.max_run, "party {} too long", party.id);
        }
    }

    #[test]
    fn same_seed_reproduces_the_lobby() {
        let cfg = config(6, 6, 18);
        assert_eq!(form_parties(&cfg), form_parties(&cfg));
    }

    #[test]
    fn insufficient_dps_forms_no_parties() {
        let lobby = form_parties(&config(4, 4, 2));
        assert!(lobby.parties.is_empty());
        assert_eq!(
            lobby.unmatched,
            Unmatched {
                tanks: 4,
                healers: 4,
                dps: 2,
            }
        );
    }

    #[test]
    fn validate_rejects_zero_instances() {
        let mut cfg = config(1, 1, 3);
        cfg.instances = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::NoInstances));
    }

    #[test]
    fn validate_rejects_inverted_time_range() {
        let mut cfg = config(1, 1, 3);
        cfg.min_run = Duration::from_secs(5);
        cfg.max_run = Duration::from_secs(2);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::RunTimeRange {
                min: Duration::from_secs(5),
                max: Duration::from_secs(2),
            })
        );
    }

    #[test]
    fn validate_accepts_equal_time_bounds() {
        let mut cfg = config(1, 1, 3);
        cfg.min_run = Duration::from_secs(2);
        cfg.max_run = Duration::from_secs(2);
        assert_eq!(cfg.validate(), Ok(()));
    }
}
