//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the world produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays and saved games only work if a tick is a pure function of the
//! world state. Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Units and players live in ordered maps and are processed in id order.
//!
//! - **Floating-point math**: Distances and build progress use integer
//!   math only.
//!
//! - **Hidden state**: Everything a tick reads must be part of the
//!   snapshot, or a restored world drifts from the original.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual orders are deterministic
//! 2. **Property tests**: Random scenarios still produce deterministic outputs
//! 3. **Integration tests**: Full scenarios are reproducible, also across save/load
//! 4. **Parallel tests**: Running N worlds in parallel all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use stratagem_core::world::World;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic world).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "World is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Result of parallel world runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each world.
    pub hashes: Vec<u64>,
    /// Number of ticks each world ran.
    pub ticks: u64,
    /// Number of worlds run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all worlds produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all worlds matched.
    ///
    /// # Panics
    ///
    /// Panics if worlds produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel worlds diverged!\n\
                 Worlds: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of ticks per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one tick
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```
/// use stratagem_test_utils::determinism::verify_determinism;
/// use stratagem_core::world::World;
/// use stratagem_test_utils::fixtures::scenario_world;
///
/// let result = verify_determinism(3, 50, scenario_world, World::tick, World::state_hash);
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run two worlds with identical setup and compare their final hashes.
pub fn verify_world_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> World,
{
    verify_determinism(2, num_ticks, &setup_fn, World::tick, World::state_hash).is_deterministic
}

/// Run N worlds on scoped threads and collect their final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_simulations_scoped<F>(
    setup_fn: F,
    num_sims: usize,
    num_ticks: u64,
) -> ParallelSimResult
where
    F: Fn() -> World + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut world = setup_fn();
                    for _ in 0..num_ticks {
                        world.tick();
                    }
                    world.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("world thread panicked"))
            .collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs are deterministic, `Some(tick)` if they diverge at
/// that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> World,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        a.tick();
        b.tick();

        if a.state_hash() != b.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Verify that a snapshot taken after `num_ticks` restores to the same
/// state, and that the restored world keeps ticking in lockstep with the
/// original for `continue_ticks` more ticks.
pub fn verify_serialization_determinism<F>(setup_fn: F, num_ticks: u64, continue_ticks: u64) -> bool
where
    F: Fn() -> World,
{
    let mut world = setup_fn();
    for _ in 0..num_ticks {
        world.tick();
    }

    let Ok(bytes) = world.snapshot() else {
        return false;
    };
    let Ok(mut restored) = World::restore(world.catalog_handle(), &bytes) else {
        return false;
    };

    if restored.state_hash() != world.state_hash() {
        return false;
    }
    for _ in 0..continue_ticks {
        world.tick();
        restored.tick();
        if restored.state_hash() != world.state_hash() {
            return false;
        }
    }
    true
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{repair_fixture, scenario_world};
    use crate::strategies::arb_repair_setup;
    use proptest::prelude::*;
    use stratagem_core::orders::Order;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_scenario_determinism() {
        assert!(verify_world_determinism(scenario_world, 120));
    }

    #[test]
    fn test_find_divergence_on_deterministic_world() {
        assert!(find_first_divergence(scenario_world, 80).is_none());
    }

    #[test]
    fn test_parallel_worlds_match() {
        run_parallel_simulations_scoped(scenario_world, 4, 60).assert_deterministic();
    }

    #[test]
    fn test_serialization_mid_repair() {
        for at in [0, 5, 17, 40] {
            assert!(
                verify_serialization_determinism(scenario_world, at, 60),
                "diverged after restoring at tick {at}"
            );
        }
    }

    #[test]
    fn test_unique_hashes() {
        let result = DeterminismResult {
            is_deterministic: false,
            hashes: vec![3, 1, 3],
            ticks: 1,
        };
        assert_eq!(result.unique_hashes(), vec![1, 3]);
    }

    proptest! {
        #[test]
        fn prop_repair_is_deterministic((wood, hp) in arb_repair_setup()) {
            let setup = || {
                let mut fixture = repair_fixture(wood, hp);
                let order = Order::repair_unit(&fixture.world, fixture.wagon).unwrap();
                fixture.world.issue_order(fixture.worker, order).unwrap();
                fixture.world
            };
            prop_assert!(verify_world_determinism(setup, 40));
        }
    }
}
