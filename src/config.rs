// Dashboard configuration
//
// Polling cadence, retention caps and layout tuning live here as named constants.
// `DashboardConfig` carries the subset that can be overridden from the command line.

use std::time::Duration;

use crate::sync::ChannelKind;

// ============================================================================
// Polling
// ============================================================================

pub const ACTIVITY_INTERVAL: Duration = Duration::from_secs(3);
pub const HEALTH_INTERVAL: Duration = Duration::from_secs(5);
pub const CLUSTER_INTERVAL: Duration = Duration::from_secs(5);
pub const INSIGHTS_INTERVAL: Duration = Duration::from_secs(15);
pub const SCALING_INTERVAL: Duration = Duration::from_secs(15);

/// Client-side cap on any single request. A hung request holds its channel's in-flight guard
/// until this fires.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

// ============================================================================
// Retention
// ============================================================================

/// Activity entries kept after each merge.
pub const ACTIVITY_RETENTION: usize = 50;

/// Page size requested from the activity endpoint.
pub const DEFAULT_ACTIVITY_PAGE: usize = 20;

/// Live node annotations kept (one per node).
pub const ANNOTATION_CAPACITY: usize = 24;

// ============================================================================
// Layout
// ============================================================================

pub const LINK_DISTANCE: f32 = 120.0;
pub const LINK_STRENGTH: f32 = 0.7;
pub const REPULSION_STRENGTH: f32 = 60_000.0;
pub const REPULSION_SOFTENING: f32 = 620.0;
pub const COLLISION_RADIUS: f32 = 46.0;
pub const COLLISION_STRENGTH: f32 = 0.7;
pub const VELOCITY_DECAY: f32 = 0.4;

pub const ALPHA_MIN: f32 = 0.001;
/// Per-tick decay that takes alpha from 1.0 to `ALPHA_MIN` in roughly 300 ticks.
pub const ALPHA_DECAY: f32 = 0.0228;
/// Starting energy for rebuilds where every node already has a cached position.
pub const WARM_ALPHA: f32 = 0.1;
pub const DRAG_ALPHA_TARGET: f32 = 0.3;

/// New nodes are seeded within this radius of the viewport center.
pub const SEED_JITTER: f32 = 60.0;

// ============================================================================
// Animation
// ============================================================================

pub const CRITICAL_EDGE_PERIOD: Duration = Duration::from_millis(1600);
pub const CRITICAL_PULSE_PERIOD: Duration = Duration::from_millis(2000);
/// Repaint cadence while critical overlay loops are alive.
pub const OVERLAY_FRAME: Duration = Duration::from_millis(33);

// ============================================================================
// Configuration struct
// ============================================================================

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub api_url: String,
    pub activity_limit: usize,
    pub activity_retention: usize,
    pub request_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            activity_limit: DEFAULT_ACTIVITY_PAGE,
            activity_retention: ACTIVITY_RETENTION,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl DashboardConfig {
    pub fn new(api_url: String, activity_limit: usize) -> Self {
        Self {
            api_url,
            activity_limit: activity_limit.clamp(1, ACTIVITY_RETENTION),
            ..Self::default()
        }
    }

    pub fn channel_interval(&self, kind: ChannelKind) -> Duration {
        match kind {
            ChannelKind::Health => HEALTH_INTERVAL,
            ChannelKind::Insights => INSIGHTS_INTERVAL,
            ChannelKind::Activity => ACTIVITY_INTERVAL,
            ChannelKind::Cluster => CLUSTER_INTERVAL,
            ChannelKind::Scaling => SCALING_INTERVAL,
        }
    }
}
