use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tokio::sync::{Notify, watch};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::backend::FetchError;

use super::{ChannelKind, ChannelPhase, ChannelUpdate, SyncEvent, SyncSink, Visibility};

/// Outcome of one settled fetch: every endpoint that answered contributes updates, every
/// endpoint that failed contributes an error and nothing else.
#[derive(Debug, Default)]
pub(super) struct Settled {
    pub(super) updates: Vec<ChannelUpdate>,
    pub(super) failures: Vec<FetchError>,
}

impl Settled {
    pub(super) fn absorb<T>(
        &mut self,
        result: Result<T, FetchError>,
        update: impl FnOnce(T) -> Option<ChannelUpdate>,
    ) {
        match result {
            Ok(value) => self.updates.extend(update(value)),
            Err(error) => self.failures.push(error),
        }
    }
}

/// A data channel: how to fetch it and how to turn a finished fetch into updates.
pub(super) trait ChannelSource: Send + 'static {
    type Batch: Send + 'static;

    fn kind(&self) -> ChannelKind;

    /// Issues every endpoint of the channel. The future resolves once all of them settled.
    fn fetch(&mut self) -> BoxFuture<'static, Self::Batch>;

    fn settle(&mut self, batch: Self::Batch) -> Settled;
}

/// Control side of a running poller. Dropping it stops the poller task.
pub(super) struct PollerHandle {
    kind: ChannelKind,
    active: watch::Sender<bool>,
    refresh: Arc<Notify>,
}

impl PollerHandle {
    pub(super) fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub(super) fn set_active(&self, active: bool) {
        self.active.send_if_modified(|current| {
            let changed = *current != active;
            *current = active;
            changed
        });
    }

    pub(super) fn is_active(&self) -> bool {
        *self.active.borrow()
    }

    /// Asks for an out-of-schedule fetch. Subject to the same gating as a timer tick.
    /// Ignored while the channel is inactive.
    pub(super) fn refresh(&self) {
        if self.is_active() {
            self.refresh.notify_one();
        }
    }
}

pub(super) struct ChannelPoller<S: ChannelSource> {
    source: S,
    period: Duration,
    visibility: Visibility,
    sink: SyncSink,
    active: watch::Receiver<bool>,
    refresh: Arc<Notify>,
    in_flight: Option<BoxFuture<'static, S::Batch>>,
}

pub(super) fn spawn_poller<S: ChannelSource>(
    runtime: &Handle,
    source: S,
    period: Duration,
    visibility: Visibility,
    sink: SyncSink,
    active: bool,
) -> PollerHandle {
    let (poller, handle) = ChannelPoller::new(source, period, visibility, sink, active);
    runtime.spawn(poller.run());
    handle
}

fn start_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn settle_in_flight<T>(slot: &mut Option<BoxFuture<'static, T>>) -> T {
    match slot.as_mut() {
        Some(fetch) => fetch.await,
        None => std::future::pending().await,
    }
}

impl<S: ChannelSource> ChannelPoller<S> {
    pub(super) fn new(
        source: S,
        period: Duration,
        visibility: Visibility,
        sink: SyncSink,
        active: bool,
    ) -> (Self, PollerHandle) {
        let kind = source.kind();
        let (active_tx, active_rx) = watch::channel(active);
        let refresh = Arc::new(Notify::new());

        let poller = Self {
            source,
            period,
            visibility,
            sink,
            active: active_rx,
            refresh: Arc::clone(&refresh),
            in_flight: None,
        };
        let handle = PollerHandle {
            kind,
            active: active_tx,
            refresh,
        };
        (poller, handle)
    }

    pub(super) async fn run(mut self) {
        let kind = self.source.kind();
        let mut ticker: Option<Interval> = None;
        debug!(channel = %kind, period_ms = self.period.as_millis() as u64, "poller started");

        loop {
            let active = *self.active.borrow_and_update();
            if active && ticker.is_none() {
                // Drop a refresh stored before activation; the fresh interval fires immediately.
                let _ = self.refresh.notified().now_or_never();
                ticker = Some(start_ticker(self.period));
            } else if !active && ticker.is_some() {
                debug!(channel = %kind, "channel deactivated; timer cancelled");
                ticker = None;
            }

            tokio::select! {
                changed = self.active.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = next_tick(&mut ticker) => self.on_tick(),
                _ = self.refresh.notified(), if active => self.on_tick(),
                batch = settle_in_flight(&mut self.in_flight) => {
                    self.in_flight = None;
                    self.finish(batch);
                }
            }
        }

        debug!(channel = %kind, "poller stopped");
    }

    fn on_tick(&mut self) {
        let kind = self.source.kind();
        if !self.visibility.is_visible() {
            debug!(channel = %kind, "window hidden; skipping tick");
            return;
        }
        if self.in_flight.is_some() {
            debug!(channel = %kind, "previous fetch still in flight; skipping tick");
            return;
        }

        self.sink.send(SyncEvent::Phase {
            channel: kind,
            phase: ChannelPhase::Fetching,
        });
        self.in_flight = Some(self.source.fetch());
    }

    fn finish(&mut self, batch: S::Batch) {
        let kind = self.source.kind();
        let settled = self.source.settle(batch);

        for failure in &settled.failures {
            warn!(
                channel = %kind,
                endpoint = failure.endpoint(),
                error = %failure,
                "endpoint fetch failed; keeping previous data"
            );
        }
        for update in settled.updates {
            self.sink.send(SyncEvent::Update(update));
        }

        let phase = match settled.failures.first() {
            Some(failure) => ChannelPhase::Failed(failure.to_string()),
            None => ChannelPhase::Idle,
        };
        self.sink.send(SyncEvent::Phase {
            channel: kind,
            phase,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::{self, Receiver};

    use super::*;
    use crate::backend::mock::{MockApi, Reply};
    use crate::sync::channels::HealthSource;

    const PERIOD: Duration = Duration::from_secs(5);

    fn health_poller(
        api: &MockApi,
        visibility: Visibility,
        active: bool,
    ) -> (PollerHandle, Receiver<SyncEvent>) {
        let (tx, rx) = mpsc::channel();
        let (poller, handle) = ChannelPoller::new(
            HealthSource::new(api.clone()),
            PERIOD,
            visibility,
            SyncSink::new(tx, None),
            active,
        );
        tokio::spawn(poller.run());
        (handle, rx)
    }

    async fn advance(duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_blocks_overlapping_ticks() {
        let api = MockApi::default();
        api.state().health = Reply::Hang;
        let (_handle, rx) = health_poller(&api, Visibility::new(true), true);

        advance(Duration::from_secs(16)).await;

        assert_eq!(api.call_count("health"), 1);
        let fetching = rx
            .try_iter()
            .filter(|event| {
                matches!(
                    event,
                    SyncEvent::Phase {
                        phase: ChannelPhase::Fetching,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(fetching, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hidden_window_suppresses_requests_until_visible() {
        let api = MockApi::default();
        let visibility = Visibility::new(false);
        let (_handle, _rx) = health_poller(&api, visibility.clone(), true);

        advance(Duration::from_secs(12)).await;
        assert_eq!(api.call_count("health"), 0);

        visibility.set(true);
        advance(Duration::from_secs(5)).await;
        assert_eq!(api.call_count("health"), 1);

        advance(Duration::from_secs(5)).await;
        assert_eq!(api.call_count("health"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn deactivation_cancels_timer_and_reactivation_fetches_immediately() {
        let api = MockApi::default();
        let (handle, _rx) = health_poller(&api, Visibility::new(true), true);

        advance(Duration::from_millis(10)).await;
        assert_eq!(api.call_count("health"), 1);

        handle.set_active(false);
        advance(Duration::from_secs(30)).await;
        assert_eq!(api.call_count("health"), 1);

        handle.set_active(true);
        advance(Duration::from_millis(10)).await;
        assert_eq!(api.call_count("health"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_reported_and_next_tick_retries() {
        let api = MockApi::default();
        api.state().health = Reply::Fail;
        let (_handle, rx) = health_poller(&api, Visibility::new(true), true);

        advance(Duration::from_millis(10)).await;
        let failed = rx.try_iter().any(|event| {
            matches!(
                event,
                SyncEvent::Phase {
                    phase: ChannelPhase::Failed(_),
                    ..
                }
            )
        });
        assert!(failed);

        api.state().health = Reply::Ready(Default::default());
        advance(PERIOD).await;
        assert_eq!(api.call_count("health"), 2);
        let updated = rx
            .try_iter()
            .any(|event| matches!(event, SyncEvent::Update(ChannelUpdate::Health(_))));
        assert!(updated);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_refresh_respects_in_flight_guard() {
        let api = MockApi::default();
        api.state().health = Reply::Hang;
        let (handle, _rx) = health_poller(&api, Visibility::new(true), true);

        advance(Duration::from_millis(10)).await;
        handle.refresh();
        advance(Duration::from_millis(10)).await;

        assert_eq!(api.call_count("health"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_stops_poller() {
        let api = MockApi::default();
        let (handle, _rx) = health_poller(&api, Visibility::new(true), true);
        advance(Duration::from_millis(10)).await;
        drop(handle);

        advance(Duration::from_secs(20)).await;
        assert_eq!(api.call_count("health"), 1);
    }
}
