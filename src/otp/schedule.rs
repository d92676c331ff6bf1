//! Window scheduling — epoch-aligned rollover boundaries.
//!
//! All entries sharing a period roll over together at `now mod period == 0`
//! instants, so the boundary math is a pure function of `(now, period)` and
//! needs no wall-clock mocking to test. Entries with a non-default period
//! roll on their own boundary independently.

use std::ops::ControlFlow;
use std::time::Duration;

use crate::otp::core;
use crate::otp::service::{Clock, VaultStore};
use crate::otp::types::{GeneratedCode, InvalidParameter, VaultEntry};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Boundary math
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Unix timestamp of the next epoch-aligned boundary strictly after `now`.
pub fn next_boundary(now: i64, period: u32) -> i64 {
    core::window_start(now, period) + period as i64
}

/// Seconds until the current window rolls over, in `(0, period]`.
pub fn seconds_until_rollover(now: i64, period: u32) -> u32 {
    (next_boundary(now, period) - now) as u32
}

/// The most common period across entries (the one worth a shared countdown).
/// Ties favour the shorter period. `None` for an empty vault.
pub fn dominant_period(entries: &[VaultEntry]) -> Option<u32> {
    let mut counts: Vec<(u32, usize)> = Vec::new();
    for entry in entries {
        match counts.iter_mut().find(|(period, _)| *period == entry.period) {
            Some((_, n)) => *n += 1,
            None => counts.push((entry.period, 1)),
        }
    }
    counts
        .into_iter()
        .max_by(|(pa, na), (pb, nb)| na.cmp(nb).then(pb.cmp(pa)))
        .map(|(period, _)| period)
}

/// The next instant at which at least one entry's window rolls over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rollover {
    /// Boundary timestamp (unix seconds).
    pub at: i64,
    /// Every distinct period that rolls at that instant, ascending.
    pub periods: Vec<u32>,
}

/// Earliest upcoming boundary across all distinct periods in the vault.
///
/// `None` when no entry has a usable period (empty vault, or only
/// zero-period entries — the generator rejects those anyway).
pub fn next_rollover(entries: &[VaultEntry], now: i64) -> Option<Rollover> {
    let mut distinct: Vec<u32> = Vec::new();
    for entry in entries {
        if entry.period > 0 && !distinct.contains(&entry.period) {
            distinct.push(entry.period);
        }
    }
    let at = distinct.iter().map(|&p| next_boundary(now, p)).min()?;
    let mut periods: Vec<u32> = distinct
        .into_iter()
        .filter(|&p| next_boundary(now, p) == at)
        .collect();
    periods.sort_unstable();
    Some(Rollover { at, periods })
}

/// Every distinct period in the vault whose window rolls at `at`
/// (boundaries are epoch-aligned, so a period rolls at any multiple of
/// itself), ascending.
fn rolled_periods(entries: &[VaultEntry], at: i64) -> Vec<u32> {
    let mut periods: Vec<u32> = Vec::new();
    for entry in entries {
        if entry.period > 0
            && at.rem_euclid(entry.period as i64) == 0
            && !periods.contains(&entry.period)
        {
            periods.push(entry.period);
        }
    }
    periods.sort_unstable();
    periods
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Refresh loop
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Codes regenerated for one rollover, keyed by vault index.
pub type RefreshBatch = Vec<(usize, Result<GeneratedCode, InvalidParameter>)>;

/// Run the refresh loop: sleep until the next boundary, regenerate codes
/// for every entry whose period rolled (evaluated at the boundary instant,
/// so a pass is deterministic), hand the batch to `on_refresh`, re-arm.
///
/// Returns when the vault has no schedulable entries or when `on_refresh`
/// breaks; the host may also simply drop the future to cancel.
pub async fn drive<F>(store: &VaultStore, clock: &dyn Clock, mut on_refresh: F)
where
    F: FnMut(&Rollover, RefreshBatch) -> ControlFlow<()>,
{
    loop {
        let snapshot = store.current();
        let now = clock.now();
        let Some(rollover) = next_rollover(&snapshot.vault, now) else {
            return;
        };
        let wait = (rollover.at - now).max(0) as u64;
        log::trace!("window scheduler re-armed: {wait}s until boundary {}", rollover.at);
        tokio::time::sleep(Duration::from_secs(wait)).await;

        // Re-read the vault and recompute which periods roll at the
        // boundary: entries added while we slept still get this pass.
        let snapshot = store.current();
        let rollover = Rollover {
            at: rollover.at,
            periods: rolled_periods(&snapshot.vault, rollover.at),
        };
        let batch: RefreshBatch = snapshot
            .vault
            .iter()
            .enumerate()
            .filter(|(_, entry)| rollover.periods.contains(&entry.period))
            .map(|(index, entry)| (index, core::generate(entry, rollover.at)))
            .collect();
        if on_refresh(&rollover, batch).is_break() {
            return;
        }
    }
}
