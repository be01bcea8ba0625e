mod forces;
mod quadtree;
mod simulation;

use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};
use tracing::debug;

use crate::config::{DRAG_ALPHA_TARGET, SEED_JITTER, WARM_ALPHA};
use crate::topology::{PositionCache, ServiceGraph};
use crate::util::stable_pair;

use simulation::{Body, Simulation};

/// Read-only snapshot of the current layout. Topology fields change on rebuild, coordinates on
/// every tick.
#[derive(Debug, Default)]
pub(in crate::app) struct LayoutFrame {
    pub ids: Vec<String>,
    pub index_by_id: HashMap<String, usize>,
    pub positions: Vec<Vec2>,
    pub edges: Vec<(usize, usize)>,
    pub segments: Vec<[Vec2; 2]>,
    pub outgoing: Vec<Vec<usize>>,
    pub incoming: Vec<Vec<usize>>,
    /// Bumped on every rebuild.
    pub revision: u64,
}

impl LayoutFrame {
    pub fn position_of(&self, id: &str) -> Option<Vec2> {
        self.index_by_id
            .get(id)
            .and_then(|&index| self.positions.get(index))
            .copied()
    }

    fn refresh_segments(&mut self) {
        self.segments.clear();
        for &(source, target) in &self.edges {
            self.segments
                .push([self.positions[source], self.positions[target]]);
        }
    }
}

/// Sorted node ids plus edges; a rebuild happens only when this changes.
#[derive(Clone, Debug, PartialEq, Eq)]
struct TopologyKey {
    nodes: Vec<String>,
    edges: Vec<(String, String)>,
}

impl TopologyKey {
    fn of(graph: &ServiceGraph) -> Self {
        let mut nodes = graph.order.clone();
        nodes.sort_unstable();
        let mut edges = graph
            .edges
            .iter()
            .map(|edge| (edge.source.clone(), edge.target.clone()))
            .collect::<Vec<_>>();
        edges.sort_unstable();
        Self { nodes, edges }
    }
}

/// Owns the force simulation for the current topology and publishes [`LayoutFrame`]s.
pub(in crate::app) struct LayoutEngine {
    simulation: Option<Simulation>,
    frame: LayoutFrame,
    key: Option<TopologyKey>,
    center: Vec2,
    dragging: Option<usize>,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

impl LayoutEngine {
    pub fn new(center: Vec2) -> Self {
        Self {
            simulation: None,
            frame: LayoutFrame::default(),
            key: None,
            center,
            dragging: None,
        }
    }

    pub fn frame(&self) -> &LayoutFrame {
        &self.frame
    }

    pub fn alpha(&self) -> f32 {
        self.simulation.as_ref().map_or(0.0, |simulation| simulation.alpha)
    }

    pub fn is_running(&self) -> bool {
        self.simulation
            .as_ref()
            .is_some_and(Simulation::is_running)
    }

    /// Rebuilds when the node or edge set differs from the current one. Returns whether it did.
    pub fn sync(&mut self, graph: &ServiceGraph, cache: &PositionCache) -> bool {
        let key = TopologyKey::of(graph);
        if self.key.as_ref() == Some(&key) {
            return false;
        }
        self.rebuild(graph, cache);
        self.key = Some(key);
        true
    }

    /// Drops the running simulation and starts a new one over `graph`, seeding every node from
    /// the position cache or, failing that, near the center.
    pub fn rebuild(&mut self, graph: &ServiceGraph, cache: &PositionCache) {
        self.simulation = None;
        self.dragging = None;

        let ids = graph.order.clone();
        let index_by_id = ids
            .iter()
            .enumerate()
            .map(|(index, id)| (id.clone(), index))
            .collect::<HashMap<_, _>>();

        let mut seeded = 0usize;
        let bodies = ids
            .iter()
            .map(|id| {
                let position = match cache.get(id) {
                    Some(position) => {
                        seeded += 1;
                        position
                    }
                    None => self.center + seed_offset(id),
                };
                Body {
                    position,
                    velocity: Vec2::ZERO,
                    pin: None,
                }
            })
            .collect::<Vec<_>>();

        let edges = graph
            .edges
            .iter()
            .filter_map(|edge| {
                Some((
                    *index_by_id.get(&edge.source)?,
                    *index_by_id.get(&edge.target)?,
                ))
            })
            .collect::<Vec<_>>();

        let mut outgoing = vec![Vec::new(); ids.len()];
        let mut incoming = vec![Vec::new(); ids.len()];
        for &(source, target) in &edges {
            outgoing[source].push(target);
            incoming[target].push(source);
        }

        let all_cached = seeded == ids.len();
        let alpha = if all_cached { WARM_ALPHA } else { 1.0 };
        debug!(
            nodes = ids.len(),
            edges = edges.len(),
            seeded,
            alpha,
            "layout rebuilt"
        );

        self.frame = LayoutFrame {
            positions: bodies.iter().map(|body| body.position).collect(),
            ids,
            index_by_id,
            edges: edges.clone(),
            segments: Vec::new(),
            outgoing,
            incoming,
            revision: self.frame.revision.wrapping_add(1),
        };
        self.frame.refresh_segments();
        self.simulation = Some(Simulation::new(bodies, edges, alpha));
    }

    /// Advances the simulation one step, persists coordinates and refreshes the frame.
    /// Returns whether anything moved.
    pub fn tick(&mut self, cache: &mut PositionCache) -> bool {
        let Some(simulation) = self.simulation.as_mut() else {
            return false;
        };
        if !simulation.step(self.center) {
            return false;
        }

        for ((id, body), slot) in self
            .frame
            .ids
            .iter()
            .zip(&simulation.bodies)
            .zip(self.frame.positions.iter_mut())
        {
            cache.set(id, body.position);
            *slot = body.position;
        }
        self.frame.refresh_segments();
        true
    }

    pub fn begin_drag(&mut self, id: &str) -> bool {
        let Some(&index) = self.frame.index_by_id.get(id) else {
            return false;
        };
        let Some(simulation) = self.simulation.as_mut() else {
            return false;
        };

        let body = &mut simulation.bodies[index];
        body.pin = Some(body.position);
        body.velocity = Vec2::ZERO;
        simulation.alpha_target = DRAG_ALPHA_TARGET;
        simulation.reheat(DRAG_ALPHA_TARGET);
        self.dragging = Some(index);
        true
    }

    pub fn drag_to(&mut self, position: Vec2) {
        let (Some(index), Some(simulation)) = (self.dragging, self.simulation.as_mut()) else {
            return;
        };
        if position.x.is_finite() && position.y.is_finite() {
            simulation.bodies[index].pin = Some(position);
        }
    }

    pub fn end_drag(&mut self) {
        let (Some(index), Some(simulation)) = (self.dragging.take(), self.simulation.as_mut())
        else {
            return;
        };
        simulation.bodies[index].pin = None;
        simulation.alpha_target = 0.0;
    }

    pub fn dragged_id(&self) -> Option<&str> {
        self.dragging
            .and_then(|index| self.frame.ids.get(index))
            .map(String::as_str)
    }
}

/// Deterministic jitter within `SEED_JITTER` of the origin, derived from a hash of the id.
/// Ids never stack on one point, but the same id always seeds at the same offset.
fn seed_offset(id: &str) -> Vec2 {
    let (x, y) = stable_pair(id);
    let offset = vec2(x, y);
    if offset.length() > 1.0 {
        offset.normalized() * SEED_JITTER
    } else {
        offset * SEED_JITTER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::payload::HealthSample;
    use crate::config::ALPHA_MIN;
    use serde_json::json;

    fn mesh(extra: &[&str]) -> ServiceGraph {
        let mut nodes = vec![
            json!({"id": "gateway", "type": "gateway"}),
            json!({"id": "orders"}),
            json!({"id": "payments"}),
            json!({"id": "inventory"}),
            json!({"id": "orders-db", "type": "database"}),
            json!({"id": "cache", "type": "cache"}),
        ];
        nodes.extend(extra.iter().map(|id| json!({"id": id})));
        let links = json!([
            {"source": "gateway", "target": "orders"},
            {"source": "gateway", "target": "payments"},
            {"source": "orders", "target": "inventory"},
            {"source": "orders", "target": "orders-db"},
            {"source": "payments", "target": "orders-db"},
            {"source": "inventory", "target": "cache"}
        ]);
        ServiceGraph::from_payload(
            serde_json::from_value(json!({"nodes": nodes, "links": links})).expect("payload"),
        )
    }

    fn settle(engine: &mut LayoutEngine, cache: &mut PositionCache) -> usize {
        let mut ticks = 0;
        while engine.is_running() && ticks < 2_000 {
            engine.tick(cache);
            ticks += 1;
        }
        ticks
    }

    fn max_displacement(before: &LayoutFrame, after: &LayoutFrame) -> f32 {
        before
            .ids
            .iter()
            .filter_map(|id| Some((before.position_of(id)? - after.position_of(id)?).length()))
            .fold(0.0, f32::max)
    }

    fn snapshot(frame: &LayoutFrame) -> LayoutFrame {
        LayoutFrame {
            ids: frame.ids.clone(),
            index_by_id: frame.index_by_id.clone(),
            positions: frame.positions.clone(),
            ..LayoutFrame::default()
        }
    }

    #[test]
    fn cold_start_seeds_near_center_and_cools_down() {
        let graph = mesh(&[]);
        let mut cache = PositionCache::default();
        let mut engine = LayoutEngine::default();

        assert!(engine.sync(&graph, &cache));
        assert_eq!(engine.alpha(), 1.0);
        for position in &engine.frame().positions {
            assert!(position.length() <= SEED_JITTER + 0.001);
        }

        let ticks = settle(&mut engine, &mut cache);
        assert!(ticks < 2_000);
        assert!(engine.alpha() < ALPHA_MIN);
        assert_eq!(cache.len(), graph.node_count());
        assert_eq!(engine.frame().segments.len(), graph.edge_count());
    }

    #[test]
    fn nodes_end_up_separated() {
        let graph = mesh(&[]);
        let mut cache = PositionCache::default();
        let mut engine = LayoutEngine::default();
        engine.sync(&graph, &cache);
        settle(&mut engine, &mut cache);

        let positions = &engine.frame().positions;
        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                assert!((*a - *b).length() > 40.0, "{a:?} too close to {b:?}");
            }
        }
    }

    #[test]
    fn rebuild_with_same_nodes_keeps_positions() {
        let graph = mesh(&[]);
        let mut cache = PositionCache::default();
        let mut engine = LayoutEngine::default();
        engine.sync(&graph, &cache);
        settle(&mut engine, &mut cache);
        engine.rebuild(&graph, &cache);
        settle(&mut engine, &mut cache);
        let before = snapshot(engine.frame());

        engine.rebuild(&graph, &cache);
        assert_eq!(engine.alpha(), WARM_ALPHA);
        assert!(max_displacement(&before, engine.frame()) < 0.001);

        settle(&mut engine, &mut cache);
        let drift = max_displacement(&before, engine.frame());
        assert!(drift < 20.0, "nodes drifted {drift}");
    }

    #[test]
    fn new_node_reheats_and_existing_nodes_resume() {
        let mut cache = PositionCache::default();
        let mut engine = LayoutEngine::default();
        engine.sync(&mesh(&[]), &cache);
        settle(&mut engine, &mut cache);
        let before = snapshot(engine.frame());

        let grown = mesh(&["search"]);
        assert!(engine.sync(&grown, &cache));
        assert_eq!(engine.alpha(), 1.0);
        assert!(max_displacement(&before, engine.frame()) < 0.001);
        let seeded = engine.frame().position_of("search").expect("new node");
        assert!(seeded.length() <= SEED_JITTER + 0.001);
    }

    #[test]
    fn unchanged_topology_does_not_rebuild() {
        let mut graph = mesh(&[]);
        let mut cache = PositionCache::default();
        let mut engine = LayoutEngine::default();
        engine.sync(&graph, &cache);
        settle(&mut engine, &mut cache);
        let revision = engine.frame().revision;
        let before = snapshot(engine.frame());

        let samples: Vec<HealthSample> =
            serde_json::from_value(json!([{"service": "orders", "health_score": 20}]))
                .expect("samples");
        graph.apply_health(&samples);

        assert!(!engine.sync(&graph, &cache));
        assert_eq!(engine.frame().revision, revision);
        assert_eq!(max_displacement(&before, engine.frame()), 0.0);
    }

    #[test]
    fn dragged_node_follows_pointer_and_is_released() {
        let graph = mesh(&[]);
        let mut cache = PositionCache::default();
        let mut engine = LayoutEngine::default();
        engine.sync(&graph, &cache);
        settle(&mut engine, &mut cache);
        assert!(!engine.is_running());

        assert!(engine.begin_drag("orders"));
        assert!(engine.is_running());
        engine.drag_to(vec2(400.0, -250.0));
        for _ in 0..30 {
            engine.tick(&mut cache);
        }
        assert_eq!(engine.frame().position_of("orders"), Some(vec2(400.0, -250.0)));
        assert_eq!(cache.get("orders"), Some(vec2(400.0, -250.0)));
        assert_eq!(engine.dragged_id(), Some("orders"));

        engine.end_drag();
        assert_eq!(engine.dragged_id(), None);
        let ticks = settle(&mut engine, &mut cache);
        assert!(ticks < 2_000);
        assert!(!engine.begin_drag("ghost"));
    }

    #[test]
    fn edge_segments_follow_their_endpoints() {
        let graph = mesh(&[]);
        let mut cache = PositionCache::default();
        let mut engine = LayoutEngine::default();
        engine.sync(&graph, &cache);
        for _ in 0..10 {
            engine.tick(&mut cache);
        }

        let frame = engine.frame();
        for (&(source, target), segment) in frame.edges.iter().zip(&frame.segments) {
            assert_eq!(segment[0], frame.positions[source]);
            assert_eq!(segment[1], frame.positions[target]);
        }
    }
}
