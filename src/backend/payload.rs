use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Decodes a field, falling back to its default when the value is null or has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Scalar metrics shared by graph nodes and health samples. Every field is optional on the wire.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RawMetrics {
    #[serde(default, deserialize_with = "lenient")]
    pub health_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub cpu_usage_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub mem_usage_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub p99_latency_ms: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub avg_latency_ms: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub rpm: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub error_rate_percent: Option<f64>,
}

/// A graph node as listed by the backend. An id that is missing or not a string decodes as empty.
#[derive(Clone, Debug, Deserialize)]
pub struct RawNode {
    #[serde(default, deserialize_with = "lenient")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub label: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub replica_count: Option<u32>,
    #[serde(flatten)]
    pub metrics: RawMetrics,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawLink {
    #[serde(default, deserialize_with = "lenient")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient")]
    pub target: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GraphPayload {
    pub nodes: Vec<RawNode>,
    pub links: Vec<RawLink>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HealthSample {
    #[serde(default, deserialize_with = "lenient")]
    pub service: String,
    #[serde(flatten)]
    pub metrics: RawMetrics,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct HealthPayload {
    pub services: Vec<HealthSample>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Insight {
    pub id: Option<String>,
    pub service: Option<String>,
    pub title: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub insight: Option<String>,
    pub recommendation: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct InsightsPayload {
    pub insights: Vec<Insight>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Pattern {
    pub service: Option<String>,
    pub scope: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PatternsPayload {
    pub patterns: Vec<Pattern>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecommendationsPayload {
    pub recommendations: Vec<Insight>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActivityKind {
    ToolCall,
    Insight,
    Analysis,
    Error,
    #[default]
    Generic,
}

impl ActivityKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::ToolCall => "tool",
            Self::Insight => "insight",
            Self::Analysis => "analysis",
            Self::Error => "error",
            Self::Generic => "event",
        }
    }
}

impl From<String> for ActivityKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "tool_call" => Self::ToolCall,
            "insight" | "insight_stored" => Self::Insight,
            "analysis" => Self::Analysis,
            "error" => Self::Error,
            _ => Self::Generic,
        }
    }
}

impl<'de> Deserialize<'de> for ActivityKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(|raw| raw.map(Self::from).unwrap_or_default())
    }
}

/// One activity feed entry. `id` is kept raw: only numeric ids advance the feed cursor.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ActivityEvent {
    pub id: Value,
    #[serde(deserialize_with = "lenient")]
    pub event_type: ActivityKind,
    #[serde(deserialize_with = "lenient")]
    pub summary: String,
    #[serde(deserialize_with = "lenient")]
    pub detail: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub ts: f64,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActivityPayload {
    pub activity: Vec<ActivityEvent>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClusterStatus {
    pub cluster_id: Option<String>,
    pub total_replicas: u32,
    pub running_replicas: u32,
    pub pending_work_items: u32,
    pub processing_work_items: u32,
    pub completed_analyses: u64,
    pub replicas: Vec<Value>,
    pub recent_scale_events: Vec<Value>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScaleEvent {
    pub event: Option<String>,
    pub name: Option<String>,
    pub timestamp: Option<String>,
    pub reason: Option<String>,
    pub total_replicas: Option<u32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScaleEventsPayload {
    pub events: Vec<ScaleEvent>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationRecord {
    pub validation_id: Option<String>,
    pub trigger_event: Option<String>,
    pub timestamp: Option<String>,
    pub endpoints_tested: u32,
    pub endpoints_passed: u32,
    pub endpoints_failed: u32,
    pub total_duration_ms: f64,
    pub status: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ValidationsPayload {
    pub validations: Vec<ValidationRecord>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyzeReport {
    pub service: Option<String>,
    pub health_score: Option<f64>,
    pub status: Option<String>,
    pub root_cause: Option<String>,
    pub recommended_action: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScaleReport {
    pub status: Option<String>,
    pub service: Option<String>,
    pub direction: Option<String>,
    pub instance_before: Option<u32>,
    pub instance_after: Option<u32>,
    pub network_stable: Option<bool>,
    pub verdict: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleDirection {
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightStatus {
    Acknowledged,
    Resolved,
}

#[derive(Debug, Serialize)]
pub(super) struct AnalyzeRequest<'a> {
    pub(super) service: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct ScaleRequest<'a> {
    pub(super) service: &'a str,
    pub(super) direction: ScaleDirection,
    pub(super) instance_count: u32,
}

#[derive(Debug, Serialize)]
pub(super) struct GenerateRequest<'a> {
    pub(super) service_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(super) struct StatusUpdate {
    pub(super) status: InsightStatus,
}

#[derive(Debug, Serialize)]
pub(super) struct SimulateLoadRequest {
    pub(super) count: u32,
}
