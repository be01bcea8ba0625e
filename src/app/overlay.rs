use std::f32::consts::TAU;

use tracing::debug;

use crate::config::{CRITICAL_EDGE_PERIOD, CRITICAL_PULSE_PERIOD};

use super::graph::RenderPlan;

/// Identity of a running loop set: the layout revision (node set) plus the critical node ids.
#[derive(Clone, Debug, PartialEq, Eq)]
struct OverlayKey {
    layout_revision: u64,
    critical: Vec<String>,
}

/// Appearance of a critical node's pulse ring at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct Pulse {
    /// Extra ring radius as a multiple of the node radius.
    pub spread: f32,
    pub alpha: f32,
}

/// The animated critical-path loops: a dashed edge highlight and a pulse ring per node.
/// Both run from `started_at` until the loop set is rebuilt or stopped.
#[derive(Debug, Default)]
pub(in crate::app) struct OverlayLoops {
    key: Option<OverlayKey>,
    started_at: f64,
    generation: u64,
}

impl OverlayLoops {
    /// Tears down and restarts the loops when the node set or critical set changed. Returns
    /// whether a rebuild happened.
    pub fn sync(&mut self, plan: &RenderPlan, layout_revision: u64, now: f64) -> bool {
        let mut critical = plan
            .critical_ids()
            .into_iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        critical.sort_unstable();

        if critical.is_empty() {
            if self.key.is_some() {
                debug!("no critical services; overlay loops stopped");
            }
            self.key = None;
            return false;
        }

        let key = OverlayKey {
            layout_revision,
            critical,
        };
        if self.key.as_ref() == Some(&key) {
            return false;
        }

        debug!(
            critical = key.critical.len(),
            generation = self.generation + 1,
            "overlay loops rebuilt"
        );
        self.key = Some(key);
        self.started_at = now;
        self.generation += 1;
        true
    }

    pub fn stop(&mut self) {
        self.key = None;
    }

    pub fn is_alive(&self) -> bool {
        self.key.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn phase(&self, now: f64, period: f32) -> f32 {
        let elapsed = (now - self.started_at).max(0.0) as f32;
        (elapsed / period).fract()
    }

    /// Opacity of the dashed critical-edge highlight; a smooth cycle between 0.25 and 1.0.
    pub fn edge_alpha(&self, now: f64) -> f32 {
        let phase = self.phase(now, CRITICAL_EDGE_PERIOD.as_secs_f32());
        0.625 + 0.375 * (phase * TAU).cos()
    }

    /// Dash offset so the dashes crawl along the edge over one edge period.
    pub fn dash_offset(&self, now: f64, dash_length: f32) -> f32 {
        self.phase(now, CRITICAL_EDGE_PERIOD.as_secs_f32()) * dash_length * 2.0
    }

    pub fn pulse(&self, now: f64) -> Pulse {
        let phase = self.phase(now, CRITICAL_PULSE_PERIOD.as_secs_f32());
        Pulse {
            spread: 0.15 + phase * 0.85,
            alpha: (1.0 - phase) * 0.8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::graph::{Emphasis, NodeGlyph};
    use crate::topology::{HealthTier, NodeCategory};
    use eframe::egui::{Color32, Vec2};

    fn plan(critical: &[&str]) -> RenderPlan {
        let nodes = critical
            .iter()
            .enumerate()
            .map(|(index, id)| NodeGlyph {
                index,
                id: (*id).to_owned(),
                label: (*id).to_owned(),
                position: Vec2::ZERO,
                tier: HealthTier::Critical,
                category: NodeCategory::Service,
                ring: Color32::RED,
                fill: Color32::BLACK,
                badge: None,
                emphasis: Emphasis::Normal,
            })
            .collect::<Vec<_>>();
        RenderPlan {
            critical_nodes: (0..nodes.len()).collect(),
            nodes,
            ..RenderPlan::default()
        }
    }

    #[test]
    fn rebuilt_only_when_node_or_critical_set_changes() {
        let mut loops = OverlayLoops::default();
        assert!(loops.sync(&plan(&["a", "b"]), 1, 0.0));
        assert!(!loops.sync(&plan(&["b", "a"]), 1, 5.0));
        assert!(loops.sync(&plan(&["a"]), 1, 6.0));
        assert!(loops.sync(&plan(&["a"]), 2, 7.0));
        assert_eq!(loops.generation(), 3);

        assert!(!loops.sync(&plan(&[]), 2, 8.0));
        assert!(!loops.is_alive());
    }

    #[test]
    fn stop_drops_the_loops() {
        let mut loops = OverlayLoops::default();
        loops.sync(&plan(&["a"]), 1, 0.0);
        assert!(loops.is_alive());
        loops.stop();
        assert!(!loops.is_alive());
        assert!(loops.sync(&plan(&["a"]), 1, 1.0));
    }

    #[test]
    fn edge_and_pulse_cycles_have_independent_periods() {
        let mut loops = OverlayLoops::default();
        loops.sync(&plan(&["a"]), 1, 10.0);

        let close = |a: f32, b: f32| (a - b).abs() < 1e-3;
        assert!(close(loops.edge_alpha(10.0), 1.0));
        assert!(close(loops.edge_alpha(10.8), 0.25));
        assert!(close(loops.edge_alpha(11.6), 1.0));

        assert!(close(loops.pulse(10.0).alpha, 0.8));
        assert!(close(loops.pulse(11.0).alpha, 0.4));
        assert!(close(loops.pulse(12.0).alpha, 0.8));
        assert!(loops.pulse(11.9).spread > loops.pulse(10.5).spread);
    }
}
