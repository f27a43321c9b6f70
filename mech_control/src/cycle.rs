//! Fixed-period control loop: update → control.
//!
//! The loop sleeps for the remainder of each period, so pacing is
//! best-effort rather than drift-free. A cycle that takes longer than the
//! period counts as an overrun and is logged; the loop keeps going. On exit
//! (stop flag cleared or cycle budget spent) every mechanism is stopped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::SystemError;
use crate::system::MechanismSystem;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// Per-cycle timing statistics. O(1) update, no allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration.
    pub last_cycle: Duration,
    /// Shortest cycle.
    pub min_cycle: Duration,
    /// Longest cycle.
    pub max_cycle: Duration,
    /// Running sum for the average.
    pub total: Duration,
    /// Cycles longer than the period.
    pub overruns: u64,
    /// Cycles where at least one mechanism reported a fault.
    pub faulted_cycles: u64,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleStats {
    /// Zeroed statistics.
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle: Duration::ZERO,
            min_cycle: Duration::MAX,
            max_cycle: Duration::ZERO,
            total: Duration::ZERO,
            overruns: 0,
            faulted_cycles: 0,
        }
    }

    /// Record one cycle.
    #[inline]
    pub fn record(&mut self, duration: Duration, period: Duration) {
        self.cycle_count += 1;
        self.last_cycle = duration;
        self.min_cycle = self.min_cycle.min(duration);
        self.max_cycle = self.max_cycle.max(duration);
        self.total += duration;
        if duration > period {
            self.overruns += 1;
        }
    }

    /// Average cycle time (zero if no cycles ran).
    #[inline]
    pub fn avg_cycle(&self) -> Duration {
        match u32::try_from(self.cycle_count) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total / n,
            Err(_) => Duration::from_secs_f64(self.total.as_secs_f64() / self.cycle_count as f64),
        }
    }
}

// ─── Runner ─────────────────────────────────────────────────────────

/// Drives a [`MechanismSystem`] at a fixed period.
pub struct CycleRunner {
    system: MechanismSystem,
    period: Duration,
    running: Arc<AtomicBool>,
    stats: CycleStats,
    at_target: bool,
}

impl CycleRunner {
    /// Runner for `system` with the given period.
    pub fn new(system: MechanismSystem, period: Duration) -> Self {
        Self {
            system,
            period,
            running: Arc::new(AtomicBool::new(true)),
            stats: CycleStats::new(),
            at_target: false,
        }
    }

    /// Shared flag, initially `true`. Store `false` to stop after the current cycle.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Control period.
    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Statistics so far.
    #[inline]
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Controlled system.
    #[inline]
    pub fn system(&self) -> &MechanismSystem {
        &self.system
    }

    /// Mutable access, e.g. to change targets between runs.
    #[inline]
    pub fn system_mut(&mut self) -> &mut MechanismSystem {
        &mut self.system
    }

    /// Release the system.
    pub fn into_system(self) -> MechanismSystem {
        self.system
    }

    /// Run one `update → control` step without pacing.
    ///
    /// Faulted mechanisms are skipped by control; the error lists every
    /// mechanism that failed during either phase.
    pub fn step(&mut self) -> Result<(), SystemError> {
        let mut failures = Vec::new();
        if let Err(e) = self.system.update_all_mechanism_states() {
            failures.extend(flatten(e));
        }
        if let Err(e) = self.system.execute_all_mechanism_control() {
            failures.extend(flatten(e));
        }

        let at_target = self.system.are_all_mechanisms_at_target();
        if at_target && !self.at_target {
            info!(system = self.system.system_name(), "All mechanisms at target");
        }
        self.at_target = at_target;

        if failures.is_empty() {
            Ok(())
        } else {
            Err(SystemError::CycleFaults(failures))
        }
    }

    /// Run until the flag is cleared or `max_cycles` is reached, then stop
    /// every mechanism.
    ///
    /// # Errors
    /// Only the final emergency stop can fail the run; per-cycle faults are
    /// logged and counted.
    pub fn run(&mut self, max_cycles: Option<u64>) -> Result<CycleStats, SystemError> {
        info!(
            system = self.system.system_name(),
            period_ms = self.period.as_millis() as u64,
            ?max_cycles,
            "Starting control loop"
        );
        while self.running.load(Ordering::SeqCst) {
            if max_cycles.is_some_and(|max| self.stats.cycle_count >= max) {
                break;
            }
            let cycle_start = Instant::now();

            if let Err(e) = self.step() {
                self.stats.faulted_cycles += 1;
                warn!(cycle = self.stats.cycle_count, "Cycle fault: {e}");
            }

            let elapsed = cycle_start.elapsed();
            self.stats.record(elapsed, self.period);
            if elapsed > self.period {
                let overruns = self.stats.overruns;
                if overruns <= 10 || overruns % 1000 == 0 {
                    warn!(
                        "Cycle overrun #{overruns}: took {}us (period {}us)",
                        elapsed.as_micros(),
                        self.period.as_micros()
                    );
                }
            } else {
                std::thread::sleep(self.period - elapsed);
            }

            if self.stats.cycle_count % 1000 == 0 {
                debug!(
                    cycles = self.stats.cycle_count,
                    avg_us = self.stats.avg_cycle().as_micros() as u64,
                    max_us = self.stats.max_cycle.as_micros() as u64,
                    "Cycle stats"
                );
            }
        }

        info!(
            cycles = self.stats.cycle_count,
            overruns = self.stats.overruns,
            faulted = self.stats.faulted_cycles,
            "Control loop stopped"
        );
        self.system.emergency_stop_all_mechanisms()?;
        Ok(self.stats.clone())
    }
}

fn flatten(e: SystemError) -> Vec<crate::error::MechanismError> {
    match e {
        SystemError::CycleFaults(list) => list,
        SystemError::Mechanism(m) => vec![m],
        _ => Vec::new(),
    }
}
