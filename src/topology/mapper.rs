use std::fmt;

const HEALTHY_FLOOR: f64 = 80.0;
const DEGRADED_FLOOR: f64 = 50.0;

/// Divisor turning p99 latency (ms) into the cpu gauge when no utilization metric is reported.
pub const CPU_LATENCY_DIVISOR: f64 = 40.0;
/// Divisor turning average latency (ms) into the mem gauge when no utilization metric is reported.
pub const MEM_LATENCY_DIVISOR: f64 = 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HealthTier {
    #[default]
    Healthy,
    Degraded,
    Critical,
    /// Remediation in progress. Only set by overlays, never by [`map_health`].
    Rolling,
}

impl HealthTier {
    pub fn label(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Critical => "critical",
            Self::Rolling => "rolling",
        }
    }
}

impl fmt::Display for HealthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    Gateway,
    #[default]
    Service,
    Database,
    Cache,
    Queue,
    Storage,
}

impl NodeCategory {
    pub const ALL: [Self; 6] = [
        Self::Gateway,
        Self::Service,
        Self::Database,
        Self::Cache,
        Self::Queue,
        Self::Storage,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Gateway => "gateway",
            Self::Service => "service",
            Self::Database => "database",
            Self::Cache => "cache",
            Self::Queue => "queue",
            Self::Storage => "storage",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::Gateway => "GW",
            Self::Service => "SV",
            Self::Database => "DB",
            Self::Cache => "CA",
            Self::Queue => "MQ",
            Self::Storage => "ST",
        }
    }
}

/// Missing scores map to healthy so services without data yet do not flash as alarms.
pub fn map_health(score: Option<f64>) -> HealthTier {
    match score {
        Some(score) if score.is_nan() => HealthTier::Healthy,
        None => HealthTier::Healthy,
        Some(score) if score >= HEALTHY_FLOOR => HealthTier::Healthy,
        Some(score) if score >= DEGRADED_FLOOR => HealthTier::Degraded,
        Some(_) => HealthTier::Critical,
    }
}

pub fn map_type(raw: Option<&str>) -> NodeCategory {
    let Some(raw) = raw else {
        return NodeCategory::default();
    };

    NodeCategory::ALL
        .into_iter()
        .find(|category| category.wire_name() == raw)
        .unwrap_or_default()
}

fn latency_gauge(latency_ms: f64, divisor: f64) -> f64 {
    if !latency_ms.is_finite() {
        return 0.0;
    }
    (latency_ms / divisor).clamp(0.0, 100.0)
}

pub fn cpu_from_latency(p99_latency_ms: f64) -> f64 {
    latency_gauge(p99_latency_ms, CPU_LATENCY_DIVISOR)
}

pub fn mem_from_latency(avg_latency_ms: f64) -> f64 {
    latency_gauge(avg_latency_ms, MEM_LATENCY_DIVISOR)
}
