use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{FetchError, FetchResult};
use super::payload::{
    ActivityPayload, AnalyzeReport, AnalyzeRequest, ClusterStatus, GenerateRequest, GraphPayload,
    HealthPayload, InsightStatus, InsightsPayload, PatternsPayload, RecommendationsPayload,
    ScaleDirection, ScaleEventsPayload, ScaleReport, ScaleRequest, SimulateLoadRequest,
    StatusUpdate, ValidationRecord, ValidationsPayload,
};

pub const GRAPH_PATH: &str = "/api/graph/";
pub const HEALTH_PATH: &str = "/api/agent/health";
pub const INSIGHTS_PATH: &str = "/api/insights/";
pub const PATTERNS_PATH: &str = "/api/insights/patterns";
pub const RECOMMENDATIONS_PATH: &str = "/api/insights/recommendations";
pub const ACTIVITY_PATH: &str = "/api/agent/activity";
pub const CLUSTER_STATUS_PATH: &str = "/api/cluster/status";
pub const CLUSTER_EVENTS_PATH: &str = "/api/cluster/events";
pub const VALIDATIONS_PATH: &str = "/api/cluster/validations";

/// The backend as seen by the dashboard: read endpoints polled by channels plus the
/// fire-and-forget intents triggered from the UI.
pub trait DashboardApi: Clone + Send + Sync + 'static {
    fn graph(&self) -> BoxFuture<'static, FetchResult<GraphPayload>>;
    fn health(&self) -> BoxFuture<'static, FetchResult<HealthPayload>>;
    fn insights(&self) -> BoxFuture<'static, FetchResult<InsightsPayload>>;
    fn patterns(&self) -> BoxFuture<'static, FetchResult<PatternsPayload>>;
    fn recommendations(&self) -> BoxFuture<'static, FetchResult<RecommendationsPayload>>;
    fn activity(&self, since_id: f64, limit: usize)
    -> BoxFuture<'static, FetchResult<ActivityPayload>>;
    fn cluster_status(&self) -> BoxFuture<'static, FetchResult<ClusterStatus>>;
    fn scale_events(&self) -> BoxFuture<'static, FetchResult<ScaleEventsPayload>>;
    fn validations(&self) -> BoxFuture<'static, FetchResult<ValidationsPayload>>;

    fn analyze(&self, service: String) -> BoxFuture<'static, FetchResult<AnalyzeReport>>;
    fn scale(
        &self,
        service: String,
        direction: ScaleDirection,
        instance_count: u32,
    ) -> BoxFuture<'static, FetchResult<ScaleReport>>;
    fn generate_insights(&self, service: Option<String>) -> BoxFuture<'static, FetchResult<Value>>;
    fn set_insight_status(
        &self,
        insight_id: String,
        status: InsightStatus,
    ) -> BoxFuture<'static, FetchResult<Value>>;
    fn simulate_load(&self, count: u32) -> BoxFuture<'static, FetchResult<Value>>;
    fn cluster_tick(&self) -> BoxFuture<'static, FetchResult<Value>>;
    fn run_validation(&self) -> BoxFuture<'static, FetchResult<ValidationRecord>>;
}

#[derive(Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: Arc<str>,
}

impl HttpApi {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("meshpulse/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn get_json<T>(&self, endpoint: String) -> BoxFuture<'static, FetchResult<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let request = self.client.get(self.url(&endpoint));
        async move {
            let response = request
                .send()
                .await
                .map_err(|source| FetchError::Transport {
                    endpoint: endpoint.clone(),
                    source,
                })?;
            decode_response(endpoint, response).await
        }
        .boxed()
    }

    fn send_json<B, T>(
        &self,
        method: reqwest::Method,
        endpoint: String,
        body: &B,
    ) -> BoxFuture<'static, FetchResult<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Send + 'static,
    {
        let request = self.client.request(method, self.url(&endpoint)).json(body);
        async move {
            let response = request
                .send()
                .await
                .map_err(|source| FetchError::Transport {
                    endpoint: endpoint.clone(),
                    source,
                })?;
            decode_response(endpoint, response).await
        }
        .boxed()
    }
}

async fn decode_response<T: DeserializeOwned>(
    endpoint: String,
    response: reqwest::Response,
) -> FetchResult<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            endpoint,
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|source| FetchError::Transport {
            endpoint: endpoint.clone(),
            source,
        })?;

    serde_json::from_slice(&body).map_err(|error| FetchError::Decode {
        endpoint,
        message: error.to_string(),
    })
}

impl DashboardApi for HttpApi {
    fn graph(&self) -> BoxFuture<'static, FetchResult<GraphPayload>> {
        self.get_json(GRAPH_PATH.to_owned())
    }

    fn health(&self) -> BoxFuture<'static, FetchResult<HealthPayload>> {
        self.get_json(HEALTH_PATH.to_owned())
    }

    fn insights(&self) -> BoxFuture<'static, FetchResult<InsightsPayload>> {
        self.get_json(INSIGHTS_PATH.to_owned())
    }

    fn patterns(&self) -> BoxFuture<'static, FetchResult<PatternsPayload>> {
        self.get_json(PATTERNS_PATH.to_owned())
    }

    fn recommendations(&self) -> BoxFuture<'static, FetchResult<RecommendationsPayload>> {
        self.get_json(RECOMMENDATIONS_PATH.to_owned())
    }

    fn activity(
        &self,
        since_id: f64,
        limit: usize,
    ) -> BoxFuture<'static, FetchResult<ActivityPayload>> {
        self.get_json(format!("{ACTIVITY_PATH}?since_id={since_id}&limit={limit}"))
    }

    fn cluster_status(&self) -> BoxFuture<'static, FetchResult<ClusterStatus>> {
        self.get_json(CLUSTER_STATUS_PATH.to_owned())
    }

    fn scale_events(&self) -> BoxFuture<'static, FetchResult<ScaleEventsPayload>> {
        self.get_json(CLUSTER_EVENTS_PATH.to_owned())
    }

    fn validations(&self) -> BoxFuture<'static, FetchResult<ValidationsPayload>> {
        self.get_json(VALIDATIONS_PATH.to_owned())
    }

    fn analyze(&self, service: String) -> BoxFuture<'static, FetchResult<AnalyzeReport>> {
        self.send_json(
            reqwest::Method::POST,
            "/api/agent/analyze".to_owned(),
            &AnalyzeRequest { service: &service },
        )
    }

    fn scale(
        &self,
        service: String,
        direction: ScaleDirection,
        instance_count: u32,
    ) -> BoxFuture<'static, FetchResult<ScaleReport>> {
        self.send_json(
            reqwest::Method::POST,
            "/api/hooks/scale".to_owned(),
            &ScaleRequest {
                service: &service,
                direction,
                instance_count,
            },
        )
    }

    fn generate_insights(&self, service: Option<String>) -> BoxFuture<'static, FetchResult<Value>> {
        self.send_json(
            reqwest::Method::POST,
            "/api/insights/generate".to_owned(),
            &GenerateRequest {
                service_name: service.as_deref(),
            },
        )
    }

    fn set_insight_status(
        &self,
        insight_id: String,
        status: InsightStatus,
    ) -> BoxFuture<'static, FetchResult<Value>> {
        self.send_json(
            reqwest::Method::PATCH,
            format!("/api/insights/{insight_id}"),
            &StatusUpdate { status },
        )
    }

    fn simulate_load(&self, count: u32) -> BoxFuture<'static, FetchResult<Value>> {
        self.send_json(
            reqwest::Method::POST,
            "/api/cluster/simulate-load".to_owned(),
            &SimulateLoadRequest { count },
        )
    }

    fn cluster_tick(&self) -> BoxFuture<'static, FetchResult<Value>> {
        self.send_json(
            reqwest::Method::POST,
            "/api/cluster/tick".to_owned(),
            &Value::Null,
        )
    }

    fn run_validation(&self) -> BoxFuture<'static, FetchResult<ValidationRecord>> {
        self.send_json(
            reqwest::Method::POST,
            "/api/cluster/validate".to_owned(),
            &Value::Null,
        )
    }
}
