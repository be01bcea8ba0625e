use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use serde_json::Value;

use super::client::DashboardApi;
use super::error::{FetchError, FetchResult};
use super::payload::{
    ActivityPayload, AnalyzeReport, ClusterStatus, GraphPayload, HealthPayload, InsightStatus,
    InsightsPayload, PatternsPayload, RecommendationsPayload, ScaleDirection, ScaleEventsPayload,
    ScaleReport, ValidationRecord, ValidationsPayload,
};

#[derive(Clone, Debug)]
pub enum Reply<T> {
    Ready(T),
    Fail,
    Hang,
}

impl<T: Default> Default for Reply<T> {
    fn default() -> Self {
        Self::Ready(T::default())
    }
}

#[derive(Default)]
pub struct MockState {
    pub calls: Vec<String>,
    pub graph: Reply<GraphPayload>,
    pub health: Reply<HealthPayload>,
    pub insights: Reply<InsightsPayload>,
    pub patterns: Reply<PatternsPayload>,
    pub recommendations: Reply<RecommendationsPayload>,
    pub activity: VecDeque<Reply<ActivityPayload>>,
    pub activity_requests: Vec<(f64, usize)>,
    pub cluster_status: Reply<ClusterStatus>,
    pub scale_events: Reply<ScaleEventsPayload>,
    pub validations: Reply<ValidationsPayload>,
}

/// In-memory backend recording every call it receives.
#[derive(Clone, Default)]
pub struct MockApi {
    state: Arc<Mutex<MockState>>,
}

impl MockApi {
    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state poisoned")
    }

    pub fn call_count(&self, endpoint: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.as_str() == endpoint)
            .count()
    }

    fn respond<T>(
        &self,
        endpoint: &str,
        pick: impl FnOnce(&mut MockState) -> Reply<T>,
    ) -> BoxFuture<'static, FetchResult<T>>
    where
        T: Send + 'static,
    {
        let reply = {
            let mut state = self.state();
            state.calls.push(endpoint.to_owned());
            pick(&mut state)
        };

        match reply {
            Reply::Ready(value) => future::ready(Ok(value)).boxed(),
            Reply::Fail => future::ready(Err(FetchError::Status {
                endpoint: endpoint.to_owned(),
                status: 503,
            }))
            .boxed(),
            Reply::Hang => future::pending().boxed(),
        }
    }
}

impl DashboardApi for MockApi {
    fn graph(&self) -> BoxFuture<'static, FetchResult<GraphPayload>> {
        self.respond("graph", |state| state.graph.clone())
    }

    fn health(&self) -> BoxFuture<'static, FetchResult<HealthPayload>> {
        self.respond("health", |state| state.health.clone())
    }

    fn insights(&self) -> BoxFuture<'static, FetchResult<InsightsPayload>> {
        self.respond("insights", |state| state.insights.clone())
    }

    fn patterns(&self) -> BoxFuture<'static, FetchResult<PatternsPayload>> {
        self.respond("patterns", |state| state.patterns.clone())
    }

    fn recommendations(&self) -> BoxFuture<'static, FetchResult<RecommendationsPayload>> {
        self.respond("recommendations", |state| state.recommendations.clone())
    }

    fn activity(
        &self,
        since_id: f64,
        limit: usize,
    ) -> BoxFuture<'static, FetchResult<ActivityPayload>> {
        self.respond("activity", |state| {
            state.activity_requests.push((since_id, limit));
            state.activity.pop_front().unwrap_or_default()
        })
    }

    fn cluster_status(&self) -> BoxFuture<'static, FetchResult<ClusterStatus>> {
        self.respond("cluster_status", |state| state.cluster_status.clone())
    }

    fn scale_events(&self) -> BoxFuture<'static, FetchResult<ScaleEventsPayload>> {
        self.respond("scale_events", |state| state.scale_events.clone())
    }

    fn validations(&self) -> BoxFuture<'static, FetchResult<ValidationsPayload>> {
        self.respond("validations", |state| state.validations.clone())
    }

    fn analyze(&self, _service: String) -> BoxFuture<'static, FetchResult<AnalyzeReport>> {
        self.respond("analyze", |_| Reply::default())
    }

    fn scale(
        &self,
        _service: String,
        _direction: ScaleDirection,
        _instance_count: u32,
    ) -> BoxFuture<'static, FetchResult<ScaleReport>> {
        self.respond("scale", |_| Reply::default())
    }

    fn generate_insights(&self, _service: Option<String>) -> BoxFuture<'static, FetchResult<Value>> {
        self.respond("generate_insights", |_| Reply::default())
    }

    fn set_insight_status(
        &self,
        _insight_id: String,
        _status: InsightStatus,
    ) -> BoxFuture<'static, FetchResult<Value>> {
        self.respond("set_insight_status", |_| Reply::default())
    }

    fn simulate_load(&self, _count: u32) -> BoxFuture<'static, FetchResult<Value>> {
        self.respond("simulate_load", |_| Reply::default())
    }

    fn cluster_tick(&self) -> BoxFuture<'static, FetchResult<Value>> {
        self.respond("cluster_tick", |_| Reply::default())
    }

    fn run_validation(&self) -> BoxFuture<'static, FetchResult<ValidationRecord>> {
        self.respond("run_validation", |_| Reply::default())
    }
}
