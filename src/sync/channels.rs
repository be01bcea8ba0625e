use futures::FutureExt;
use futures::future::BoxFuture;

use crate::backend::payload::{
    ActivityPayload, ClusterStatus, HealthPayload, InsightsPayload, PatternsPayload,
    RecommendationsPayload, ScaleEventsPayload, ValidationsPayload,
};
use crate::backend::{DashboardApi, FetchResult};

use super::activity::ActivityFeed;
use super::poller::{ChannelSource, Settled};
use super::{ChannelKind, ChannelUpdate};

pub(super) struct HealthSource<A> {
    api: A,
}

impl<A: DashboardApi> HealthSource<A> {
    pub(super) fn new(api: A) -> Self {
        Self { api }
    }
}

impl<A: DashboardApi> ChannelSource for HealthSource<A> {
    type Batch = FetchResult<HealthPayload>;

    fn kind(&self) -> ChannelKind {
        ChannelKind::Health
    }

    fn fetch(&mut self) -> BoxFuture<'static, Self::Batch> {
        self.api.health()
    }

    fn settle(&mut self, batch: Self::Batch) -> Settled {
        let mut settled = Settled::default();
        settled.absorb(batch, |payload| {
            Some(ChannelUpdate::Health(payload.services))
        });
        settled
    }
}

pub(super) struct InsightsSource<A> {
    api: A,
}

impl<A: DashboardApi> InsightsSource<A> {
    pub(super) fn new(api: A) -> Self {
        Self { api }
    }
}

impl<A: DashboardApi> ChannelSource for InsightsSource<A> {
    type Batch = (
        FetchResult<InsightsPayload>,
        FetchResult<PatternsPayload>,
        FetchResult<RecommendationsPayload>,
    );

    fn kind(&self) -> ChannelKind {
        ChannelKind::Insights
    }

    fn fetch(&mut self) -> BoxFuture<'static, Self::Batch> {
        let insights = self.api.insights();
        let patterns = self.api.patterns();
        let recommendations = self.api.recommendations();
        async move { futures::join!(insights, patterns, recommendations) }.boxed()
    }

    fn settle(&mut self, (insights, patterns, recommendations): Self::Batch) -> Settled {
        let mut settled = Settled::default();
        settled.absorb(insights, |payload| {
            Some(ChannelUpdate::Insights(payload.insights))
        });
        settled.absorb(patterns, |payload| {
            Some(ChannelUpdate::Patterns(payload.patterns))
        });
        settled.absorb(recommendations, |payload| {
            Some(ChannelUpdate::Recommendations(payload.recommendations))
        });
        settled
    }
}

/// Incremental activity channel. Owns the feed so the cursor is only touched by this task.
pub(super) struct ActivitySource<A> {
    api: A,
    feed: ActivityFeed,
    published: bool,
}

impl<A: DashboardApi> ActivitySource<A> {
    pub(super) fn new(api: A, feed: ActivityFeed) -> Self {
        Self {
            api,
            feed,
            published: false,
        }
    }
}

impl<A: DashboardApi> ChannelSource for ActivitySource<A> {
    type Batch = FetchResult<ActivityPayload>;

    fn kind(&self) -> ChannelKind {
        ChannelKind::Activity
    }

    fn fetch(&mut self) -> BoxFuture<'static, Self::Batch> {
        let (since_id, limit) = self.feed.request();
        self.api.activity(since_id, limit)
    }

    fn settle(&mut self, batch: Self::Batch) -> Settled {
        let mut settled = Settled::default();
        let feed = &mut self.feed;
        let published = &mut self.published;
        settled.absorb(batch, |payload| {
            let fresh = feed.merge(payload.activity);
            if fresh == 0 && *published {
                return None;
            }
            *published = true;
            Some(ChannelUpdate::Activity(feed.entries().to_vec()))
        });
        settled
    }
}

pub(super) struct ClusterSource<A> {
    api: A,
}

impl<A: DashboardApi> ClusterSource<A> {
    pub(super) fn new(api: A) -> Self {
        Self { api }
    }
}

impl<A: DashboardApi> ChannelSource for ClusterSource<A> {
    type Batch = (FetchResult<ClusterStatus>, FetchResult<ScaleEventsPayload>);

    fn kind(&self) -> ChannelKind {
        ChannelKind::Cluster
    }

    fn fetch(&mut self) -> BoxFuture<'static, Self::Batch> {
        let status = self.api.cluster_status();
        let events = self.api.scale_events();
        async move { futures::join!(status, events) }.boxed()
    }

    fn settle(&mut self, (status, events): Self::Batch) -> Settled {
        let mut settled = Settled::default();
        settled.absorb(status, |status| Some(ChannelUpdate::ClusterStatus(status)));
        settled.absorb(events, |payload| {
            Some(ChannelUpdate::ScaleEvents(payload.events))
        });
        settled
    }
}

pub(super) struct ScalingSource<A> {
    api: A,
}

impl<A: DashboardApi> ScalingSource<A> {
    pub(super) fn new(api: A) -> Self {
        Self { api }
    }
}

impl<A: DashboardApi> ChannelSource for ScalingSource<A> {
    type Batch = FetchResult<ValidationsPayload>;

    fn kind(&self) -> ChannelKind {
        ChannelKind::Scaling
    }

    fn fetch(&mut self) -> BoxFuture<'static, Self::Batch> {
        self.api.validations()
    }

    fn settle(&mut self, batch: Self::Batch) -> Settled {
        let mut settled = Settled::default();
        settled.absorb(batch, |payload| {
            Some(ChannelUpdate::Validations(payload.validations))
        });
        settled
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::backend::mock::{MockApi, Reply};
    use crate::backend::payload::{ActivityEvent, Insight, Pattern};

    async fn run_once<S: ChannelSource>(source: &mut S) -> Settled {
        let batch = source.fetch().await;
        source.settle(batch)
    }

    fn activity(ids: &[u64]) -> Reply<ActivityPayload> {
        Reply::Ready(ActivityPayload {
            activity: ids
                .iter()
                .map(|id| ActivityEvent {
                    id: json!(id),
                    summary: format!("event {id}"),
                    ..ActivityEvent::default()
                })
                .collect(),
        })
    }

    #[tokio::test]
    async fn failed_sibling_does_not_block_other_insight_slices() {
        let api = MockApi::default();
        {
            let mut state = api.state();
            state.insights = Reply::Ready(InsightsPayload {
                insights: vec![Insight {
                    id: Some("i-1".into()),
                    ..Insight::default()
                }],
            });
            state.patterns = Reply::Fail;
            state.recommendations = Reply::Ready(RecommendationsPayload::default());
        }

        let settled = run_once(&mut InsightsSource::new(api.clone())).await;

        assert_eq!(settled.failures.len(), 1);
        assert_eq!(settled.failures[0].endpoint(), "patterns");
        assert_eq!(settled.updates.len(), 2);
        assert!(matches!(&settled.updates[0], ChannelUpdate::Insights(list) if list.len() == 1));
        assert!(matches!(settled.updates[1], ChannelUpdate::Recommendations(_)));
    }

    #[tokio::test]
    async fn all_insight_endpoints_succeed() {
        let api = MockApi::default();
        api.state().patterns = Reply::Ready(PatternsPayload {
            patterns: vec![Pattern::default()],
        });

        let settled = run_once(&mut InsightsSource::new(api.clone())).await;

        assert!(settled.failures.is_empty());
        assert_eq!(settled.updates.len(), 3);
        assert_eq!(api.call_count("insights"), 1);
        assert_eq!(api.call_count("patterns"), 1);
        assert_eq!(api.call_count("recommendations"), 1);
    }

    #[tokio::test]
    async fn activity_requests_advance_with_cursor() {
        let api = MockApi::default();
        {
            let mut state = api.state();
            state.activity.push_back(activity(&[5, 7, 2]));
            state.activity.push_back(activity(&[9, 7]));
            state.activity.push_back(activity(&[9]));
        }
        let mut source = ActivitySource::new(api.clone(), ActivityFeed::new(50, 20));

        let first = run_once(&mut source).await;
        let second = run_once(&mut source).await;
        let third = run_once(&mut source).await;

        assert_eq!(
            api.state().activity_requests,
            vec![(0.0, 20), (7.0, 20), (9.0, 20)]
        );
        assert!(matches!(&first.updates[..], [ChannelUpdate::Activity(list)] if list.len() == 3));
        assert!(matches!(&second.updates[..], [ChannelUpdate::Activity(list)] if list.len() == 4));
        assert!(third.updates.is_empty());
    }

    #[tokio::test]
    async fn failed_activity_fetch_keeps_cursor() {
        let api = MockApi::default();
        {
            let mut state = api.state();
            state.activity.push_back(activity(&[3]));
            state.activity.push_back(Reply::Fail);
            state.activity.push_back(activity(&[]));
        }
        let mut source = ActivitySource::new(api.clone(), ActivityFeed::new(50, 20));

        run_once(&mut source).await;
        let failed = run_once(&mut source).await;
        run_once(&mut source).await;

        assert_eq!(failed.failures.len(), 1);
        assert_eq!(
            api.state().activity_requests,
            vec![(0.0, 20), (3.0, 20), (3.0, 20)]
        );
    }

    #[tokio::test]
    async fn cluster_status_survives_failed_event_list() {
        let api = MockApi::default();
        {
            let mut state = api.state();
            state.cluster_status = Reply::Ready(ClusterStatus {
                running_replicas: 3,
                ..ClusterStatus::default()
            });
            state.scale_events = Reply::Fail;
        }

        let settled = run_once(&mut ClusterSource::new(api)).await;

        assert_eq!(settled.failures.len(), 1);
        assert!(matches!(
            &settled.updates[..],
            [ChannelUpdate::ClusterStatus(status)] if status.running_replicas == 3
        ));
    }
}
