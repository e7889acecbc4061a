use tokio::time::{interval, MissedTickBehavior};

use crate::tally::store::VoteStore;
use crate::tally::*;

/// Recomputes the snapshot of a survey from a store.
///
/// A failed fetch leaves the last good snapshot in place.
pub struct Refresher<S: VoteStore> {
    store: S,
    survey: Survey,
    last: Option<Snapshot>,
    refreshes: u64,
}

// What makes two snapshots different for someone watching the dashboard.
fn fingerprint(snapshot: &Snapshot) -> (usize, Vec<bool>) {
    (
        snapshot.record_count(),
        snapshot.sections().iter().map(|s| s.is_locked()).collect(),
    )
}

fn log_transitions(previous: Option<&Snapshot>, current: &Snapshot) {
    for section in current.sections() {
        let was_locked = previous
            .and_then(|p| p.section(&section.name))
            .map(|s| s.is_locked())
            .unwrap_or(true);
        if was_locked && !section.is_locked() {
            info!("Section {} is now unlocked", section.name);
        } else if section.is_locked() {
            debug!(
                "Section {} is locked, waiting for {:?}",
                section.name, section.gate.missing
            );
        }
    }
}

impl<S: VoteStore> Refresher<S> {
    pub fn new(store: S, survey: Survey) -> Refresher<S> {
        Refresher {
            store,
            survey,
            last: None,
            refreshes: 0,
        }
    }

    /// The last snapshot computed, if any refresh succeeded.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.last.as_ref()
    }

    pub async fn refresh(&mut self) -> TallyResult<&Snapshot> {
        let records = self.store.fetch_all().await?;
        let snapshot = compute_snapshot(&records, &self.survey);
        self.refreshes += 1;
        info!(
            "refresh #{}: {} records, locked: {}",
            self.refreshes,
            snapshot.record_count(),
            !snapshot.is_fully_unlocked()
        );
        log_transitions(self.last.as_ref(), &snapshot);
        let snapshot: &Snapshot = self.last.insert(snapshot);
        Ok(snapshot)
    }

    /// Refreshes every `period` and calls `on_update` when the number of
    /// records or the lock of a section changed. Fetch errors are logged and
    /// retried on the next tick.
    ///
    /// With `until_unlocked`, returns once every section is unlocked.
    /// Otherwise it only stops when the future is dropped.
    pub async fn watch<F>(
        &mut self,
        period: Duration,
        until_unlocked: bool,
        mut on_update: F,
    ) -> TallyResult<()>
    where
        F: FnMut(&Snapshot),
    {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let previous = self.last.as_ref().map(fingerprint);
            match self.refresh().await {
                Ok(snapshot) => {
                    if previous.as_ref() != Some(&fingerprint(snapshot)) {
                        on_update(snapshot);
                    }
                    if until_unlocked && snapshot.is_fully_unlocked() {
                        info!("watch: every section is unlocked, stopping");
                        return Ok(());
                    }
                }
                Err(e) => warn!("watch: refresh failed, retrying in {:?}: {}", period, e),
            }
        }
    }
}
