use tokio::runtime::Handle;
use tracing::info;

use crate::backend::DashboardApi;
use crate::config::DashboardConfig;

use super::activity::ActivityFeed;
use super::channels::{ActivitySource, ClusterSource, HealthSource, InsightsSource, ScalingSource};
use super::poller::{PollerHandle, spawn_poller};
use super::{ChannelKind, SyncSink, Visibility};

/// Owns one poller per channel. Dropping the hub stops every poller.
pub struct ChannelHub {
    pollers: Vec<PollerHandle>,
}

impl ChannelHub {
    /// Spawns every channel poller, all inactive until [`ChannelHub::set_active_channels`].
    pub fn start<A: DashboardApi>(
        runtime: &Handle,
        api: A,
        config: &DashboardConfig,
        visibility: Visibility,
        sink: SyncSink,
    ) -> Self {
        let period = |kind| config.channel_interval(kind);

        let pollers = vec![
            spawn_poller(
                runtime,
                HealthSource::new(api.clone()),
                period(ChannelKind::Health),
                visibility.clone(),
                sink.clone(),
                false,
            ),
            spawn_poller(
                runtime,
                InsightsSource::new(api.clone()),
                period(ChannelKind::Insights),
                visibility.clone(),
                sink.clone(),
                false,
            ),
            spawn_poller(
                runtime,
                ActivitySource::new(
                    api.clone(),
                    ActivityFeed::new(config.activity_retention, config.activity_limit),
                ),
                period(ChannelKind::Activity),
                visibility.clone(),
                sink.clone(),
                false,
            ),
            spawn_poller(
                runtime,
                ClusterSource::new(api.clone()),
                period(ChannelKind::Cluster),
                visibility.clone(),
                sink.clone(),
                false,
            ),
            spawn_poller(
                runtime,
                ScalingSource::new(api),
                period(ChannelKind::Scaling),
                visibility,
                sink,
                false,
            ),
        ];

        info!(channels = pollers.len(), "channel pollers started");
        Self { pollers }
    }

    /// Activates exactly the listed channels. Newly activated channels fetch immediately.
    pub fn set_active_channels(&self, active: &[ChannelKind]) {
        for poller in &self.pollers {
            poller.set_active(active.contains(&poller.kind()));
        }
    }

    pub fn is_active(&self, kind: ChannelKind) -> bool {
        self.pollers
            .iter()
            .any(|poller| poller.kind() == kind && poller.is_active())
    }

    pub fn refresh(&self, kind: ChannelKind) {
        if let Some(poller) = self.pollers.iter().find(|poller| poller.kind() == kind) {
            poller.refresh();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;
    use crate::backend::mock::MockApi;
    use crate::config::DashboardConfig;

    fn hub(api: &MockApi) -> (ChannelHub, mpsc::Receiver<super::super::SyncEvent>) {
        let (tx, rx) = mpsc::channel();
        let hub = ChannelHub::start(
            &Handle::current(),
            api.clone(),
            &DashboardConfig::default(),
            Visibility::new(true),
            SyncSink::new(tx, None),
        );
        (hub, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn only_selected_channels_poll() {
        let api = MockApi::default();
        let (hub, _rx) = hub(&api);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(api.state().calls.is_empty());

        hub.set_active_channels(&[ChannelKind::Cluster, ChannelKind::Scaling]);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(hub.is_active(ChannelKind::Cluster));
        assert!(!hub.is_active(ChannelKind::Health));
        assert_eq!(api.call_count("cluster_status"), 1);
        assert_eq!(api.call_count("scale_events"), 1);
        assert_eq!(api.call_count("validations"), 1);
        assert_eq!(api.call_count("health"), 0);
        assert_eq!(api.call_count("insights"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_of_inactive_channel_is_ignored() {
        let api = MockApi::default();
        let (hub, _rx) = hub(&api);
        hub.set_active_channels(&[ChannelKind::Health]);
        tokio::time::sleep(Duration::from_millis(10)).await;

        hub.refresh(ChannelKind::Insights);
        hub.refresh(ChannelKind::Health);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(api.call_count("insights"), 0);
        assert_eq!(api.call_count("health"), 2);

        hub.set_active_channels(&[ChannelKind::Insights]);
        tokio::time::sleep(Duration::from_millis(10)).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(api.call_count("insights"), 1);
    }
}
