use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::backend::payload::{GraphPayload, HealthSample, RawMetrics};

use super::mapper::{HealthTier, NodeCategory, cpu_from_latency, map_health, map_type, mem_from_latency};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Gauges {
    pub cpu_percent: f64,
    pub mem_percent: f64,
    pub requests_per_minute: f64,
    pub error_rate_percent: f64,
}

impl Gauges {
    /// Folds a metrics sample into the gauges, keeping the previous value for anything the
    /// sample does not report either directly or through a latency proxy.
    fn absorb(&mut self, metrics: &RawMetrics) {
        if let Some(cpu) = metrics
            .cpu_usage_percent
            .or_else(|| metrics.p99_latency_ms.map(cpu_from_latency))
        {
            self.cpu_percent = cpu.clamp(0.0, 100.0);
        }
        if let Some(mem) = metrics
            .mem_usage_percent
            .or_else(|| metrics.avg_latency_ms.map(mem_from_latency))
        {
            self.mem_percent = mem.clamp(0.0, 100.0);
        }
        if let Some(rpm) = metrics.rpm {
            self.requests_per_minute = rpm.max(0.0);
        }
        if let Some(error_rate) = metrics.error_rate_percent {
            self.error_rate_percent = error_rate.clamp(0.0, 100.0);
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServiceNode {
    pub id: String,
    pub label: String,
    pub category: NodeCategory,
    pub health: HealthTier,
    pub health_score: Option<f64>,
    pub gauges: Gauges,
    pub replicas: u32,
    pub dependencies: Vec<String>,
    pub dependents: Vec<String>,
}

impl ServiceNode {
    fn apply_metrics(&mut self, metrics: &RawMetrics) {
        self.health_score = metrics.health_score.filter(|score| score.is_finite());
        self.health = map_health(self.health_score);
        self.gauges.absorb(metrics);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceEdge {
    pub source: String,
    pub target: String,
}

/// The service dependency graph as last loaded, with health folded in from the health channel.
#[derive(Clone, Debug, Default)]
pub struct ServiceGraph {
    pub nodes: HashMap<String, ServiceNode>,
    /// Node ids in the order the backend listed them.
    pub order: Vec<String>,
    pub edges: Vec<ServiceEdge>,
}

impl ServiceGraph {
    pub fn from_payload(payload: GraphPayload) -> Self {
        let mut nodes = HashMap::with_capacity(payload.nodes.len());
        let mut order = Vec::with_capacity(payload.nodes.len());

        for raw in payload.nodes {
            let id = raw.id.trim().to_owned();
            if id.is_empty() || nodes.contains_key(&id) {
                debug!(id = %raw.id, "skipping empty or duplicate node id");
                continue;
            }

            let mut node = ServiceNode {
                label: raw
                    .label
                    .filter(|label| !label.trim().is_empty())
                    .unwrap_or_else(|| id.clone()),
                id: id.clone(),
                category: map_type(raw.kind.as_deref()),
                health: HealthTier::Healthy,
                health_score: None,
                gauges: Gauges::default(),
                replicas: raw.replica_count.unwrap_or(1),
                dependencies: Vec::new(),
                dependents: Vec::new(),
            };
            node.apply_metrics(&raw.metrics);

            order.push(id.clone());
            nodes.insert(id, node);
        }

        let mut edges = Vec::with_capacity(payload.links.len());
        for link in payload.links {
            let source = link.source.trim();
            let target = link.target.trim();
            if !nodes.contains_key(source) || !nodes.contains_key(target) {
                debug!(source = %link.source, target = %link.target, "dropping edge with unknown endpoint");
                continue;
            }

            edges.push(ServiceEdge {
                source: source.to_owned(),
                target: target.to_owned(),
            });
        }

        for edge in &edges {
            if let Some(source) = nodes.get_mut(&edge.source) {
                source.dependencies.push(edge.target.clone());
            }
            if let Some(target) = nodes.get_mut(&edge.target) {
                target.dependents.push(edge.source.clone());
            }
        }

        Self {
            nodes,
            order,
            edges,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Folds a health poll into the graph in place. Samples for unknown services are ignored.
    /// Returns the number of nodes whose tier changed.
    pub fn apply_health(&mut self, samples: &[HealthSample]) -> usize {
        let mut tier_changes = 0usize;
        for sample in samples {
            let service = sample.service.trim();
            if service.is_empty() {
                debug!("skipping health sample without a service name");
                continue;
            }
            let Some(node) = self.nodes.get_mut(service) else {
                continue;
            };

            let before = node.health;
            node.apply_metrics(&sample.metrics);
            if node.health != before {
                tier_changes += 1;
            }
        }
        tier_changes
    }

    pub fn set_replicas(&mut self, id: &str, replicas: u32) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.replicas = replicas;
        }
    }

    pub fn critical_ids(&self) -> HashSet<&str> {
        self.nodes
            .values()
            .filter(|node| node.health == HealthTier::Critical)
            .map(|node| node.id.as_str())
            .collect()
    }
}
