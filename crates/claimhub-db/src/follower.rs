//! The follower: catch-up cadence, change detection and subscriber fan-out.
//!
//! One long-lived task periodically advances the secondary replica, rereads
//! the writer's state row, and diffs the touched-claim and touched-hashX
//! rows between the previously observed height and the new one. Subscribers
//! receive [`ChangeEvent`]s over bounded channels; when a subscriber falls
//! behind, consecutive events are coalesced (latest height and tip win, the
//! touched sets union, a reorg flag sticks) instead of blocking the loop.

use crate::db::SecondaryDb;
use crate::error::Result;
use crate::rows::{ClaimHash, DbStateValue, HashX};
use crate::state::StateCell;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

/// Default capacity of each subscriber's event channel.
const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Backoff applied after a failed tick before the cadence resumes.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// A change observed between two catch-ups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// New tip height.
    pub height: u32,
    /// New tip hash.
    pub tip: [u8; 32],
    /// Claims whose rows changed in the scanned height range.
    pub touched_claims: BTreeSet<ClaimHash>,
    /// Address hashes whose rows changed in the scanned height range.
    pub touched_hashxs: BTreeSet<HashX>,
    /// Whether the previously reported tip was undone.
    pub reorg: bool,
}

impl ChangeEvent {
    /// Folds `other` into `self` for a subscriber that fell behind: latest
    /// height and tip win, touched sets union, the reorg flag is sticky.
    fn coalesce(&mut self, other: ChangeEvent) {
        self.height = other.height;
        self.tip = other.tip;
        self.touched_claims.extend(other.touched_claims);
        self.touched_hashxs.extend(other.touched_hashxs);
        self.reorg |= other.reorg;
    }
}

/// Follower configuration.
#[derive(Debug, Clone)]
pub struct FollowerConfig {
    /// Catch-up cadence. A zero interval is for synchronous use: the loop is
    /// not spawned and ticks are driven by hand via [`Follower::poll_once`].
    pub interval: Duration,
    /// Per-subscriber channel capacity.
    pub channel_capacity: usize,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

struct Subscriber {
    tx: mpsc::Sender<ChangeEvent>,
    /// Event coalesced while the channel was full, delivered on a later tick.
    pending: Option<ChangeEvent>,
}

#[derive(Default)]
struct Counters {
    reorgs: AtomicU64,
    catch_up_failures: AtomicU64,
}

struct Shared {
    state: StateCell,
    subscribers: Mutex<Vec<Subscriber>>,
    counters: Counters,
    channel_capacity: usize,
}

/// Cloneable handle for subscribing and reading the published state.
#[derive(Clone)]
pub struct FollowerHandle {
    shared: Arc<Shared>,
}

impl FollowerHandle {
    /// Registers a new subscriber. Events emitted after this call are
    /// delivered in order, with backpressure coalescing as documented on
    /// [`ChangeEvent`].
    pub fn subscribe(&self) -> mpsc::Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel(self.shared.channel_capacity);
        self.shared
            .subscribers
            .lock()
            .push(Subscriber { tx, pending: None });
        rx
    }

    /// The latest consistent writer state, if one has been observed.
    pub fn current_state(&self) -> Option<Arc<DbStateValue>> {
        self.shared.state.load()
    }

    /// Number of reorgs observed since startup.
    pub fn reorg_count(&self) -> u64 {
        self.shared.counters.reorgs.load(Ordering::Relaxed)
    }

    /// Number of failed catch-up attempts since startup.
    pub fn catch_up_failure_count(&self) -> u64 {
        self.shared.counters.catch_up_failures.load(Ordering::Relaxed)
    }
}

/// Read-only follower of the primary writer.
pub struct Follower {
    db: Arc<SecondaryDb>,
    shared: Arc<Shared>,
    interval: Duration,
}

impl Follower {
    pub fn new(db: Arc<SecondaryDb>, config: FollowerConfig) -> (Self, FollowerHandle) {
        let shared = Arc::new(Shared {
            state: StateCell::new(),
            subscribers: Mutex::new(Vec::new()),
            counters: Counters::default(),
            channel_capacity: config.channel_capacity.max(1),
        });
        let handle = FollowerHandle {
            shared: shared.clone(),
        };
        (
            Self {
                db,
                shared,
                interval: config.interval,
            },
            handle,
        )
    }

    /// Runs the catch-up loop until `shutdown` flips to `true`. Any
    /// in-flight tick finishes first; subscriber channels close on return.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let period = self.interval.max(Duration::from_millis(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.poll_once() {
                        Ok(Some(event)) => {
                            tracing::debug!(
                                height = event.height,
                                touched_claims = event.touched_claims.len(),
                                touched_hashxs = event.touched_hashxs.len(),
                                reorg = event.reorg,
                                "published change event"
                            );
                        }
                        Ok(None) => {}
                        Err(e) => {
                            tracing::warn!(error = %e, "catch-up tick failed, backing off");
                            tokio::time::sleep(ERROR_BACKOFF).await;
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.shared.subscribers.lock().clear();
        tracing::info!("follower stopped");
    }

    /// One synchronous tick: catch up, reread state, diff, publish, notify.
    ///
    /// Returns the emitted event, or `None` when nothing changed or the
    /// writer's state and block-hash rows are not yet mutually consistent.
    /// Errors leave the previously published state in place so the next tick
    /// rediffs from the same baseline.
    pub fn poll_once(&self) -> Result<Option<ChangeEvent>> {
        let prev = self.shared.state.load();

        if let Err(e) = self.db.try_catch_up_with_primary() {
            self.shared
                .counters
                .catch_up_failures
                .fetch_add(1, Ordering::Relaxed);
            return Err(e);
        }

        let Some(new_state) = self.db.db_state()? else {
            return Ok(None);
        };
        // The writer flushes the state row and the block-hash row
        // separately; report nothing until both agree.
        let Some(block_hash) = self.db.block_hash(new_state.height)? else {
            return Ok(None);
        };
        if block_hash != new_state.tip {
            return Ok(None);
        }

        let Some(prev) = prev else {
            self.shared.state.publish(new_state);
            tracing::info!(height = new_state.height, "initial writer state observed");
            return Ok(None);
        };

        if prev.height == new_state.height && prev.tip == new_state.tip {
            self.shared.state.publish(new_state);
            return Ok(None);
        }

        let reorg = self.detect_reorg(&prev, &new_state)?;
        let scan_from = if reorg {
            prev.height.min(new_state.height)
        } else {
            prev.height + 1
        };

        let mut touched_claims = BTreeSet::new();
        let mut touched_hashxs = BTreeSet::new();
        for height in scan_from..=new_state.height {
            touched_claims.extend(self.db.touched_claims_at(height)?);
            touched_hashxs.extend(self.db.touched_hashxs_at(height)?);
        }

        if reorg {
            self.shared.counters.reorgs.fetch_add(1, Ordering::Relaxed);
            tracing::info!(
                prev_height = prev.height,
                height = new_state.height,
                "chain reorganization observed"
            );
        }

        self.shared.state.publish(new_state);

        let event = ChangeEvent {
            height: new_state.height,
            tip: new_state.tip,
            touched_claims,
            touched_hashxs,
            reorg,
        };
        self.notify(event.clone());
        Ok(Some(event))
    }

    /// A reorg happened if the height went backwards, the tip changed at the
    /// same height, or the block we previously called tip is no longer in
    /// the chain.
    fn detect_reorg(&self, prev: &DbStateValue, new_state: &DbStateValue) -> Result<bool> {
        if new_state.height < prev.height {
            return Ok(true);
        }
        if new_state.height == prev.height {
            return Ok(new_state.tip != prev.tip);
        }
        match self.db.block_hash(prev.height)? {
            Some(hash) => Ok(hash != prev.tip),
            None => Ok(true),
        }
    }

    fn notify(&self, event: ChangeEvent) {
        let mut subscribers = self.shared.subscribers.lock();
        subscribers.retain_mut(|sub| {
            // Anything coalesced earlier goes first to preserve order.
            if let Some(pending) = sub.pending.take() {
                match sub.tx.try_send(pending) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(pending)) => {
                        let mut pending = pending;
                        pending.coalesce(event.clone());
                        sub.pending = Some(pending);
                        return true;
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => return false,
                }
            }
            match sub.tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(event)) => {
                    sub.pending = Some(event);
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(height: u32, reorg: bool) -> ChangeEvent {
        ChangeEvent {
            height,
            tip: [height as u8; 32],
            touched_claims: BTreeSet::from([[height as u8; 20]]),
            touched_hashxs: BTreeSet::new(),
            reorg,
        }
    }

    #[test]
    fn coalesce_keeps_latest_and_unions() {
        let mut first = event(5, false);
        first.coalesce(event(6, true));
        assert_eq!(first.height, 6);
        assert_eq!(first.tip, [6; 32]);
        assert!(first.reorg);
        assert_eq!(first.touched_claims.len(), 2);

        // The reorg flag survives later non-reorg events.
        first.coalesce(event(7, false));
        assert!(first.reorg);
        assert_eq!(first.height, 7);
    }
}
