use std::collections::HashSet;

use eframe::egui::{Color32, Vec2};

use crate::topology::{HealthTier, NodeCategory};
use crate::util::truncate_text;

use super::super::highlight::HighlightState;
use super::super::physics::LayoutFrame;
use super::super::render_utils::{category_fill, tier_color};
use super::super::state::DashboardState;

const LABEL_CHARS: usize = 22;
const BADGE_CHARS: usize = 36;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum Emphasis {
    Normal,
    Selected,
    Related,
    SearchMatch,
    Dimmed,
}

#[derive(Clone, Debug)]
pub(in crate::app) struct NodeGlyph {
    pub index: usize,
    pub id: String,
    pub label: String,
    pub position: Vec2,
    pub tier: HealthTier,
    pub category: NodeCategory,
    pub ring: Color32,
    pub fill: Color32,
    pub badge: Option<String>,
    pub emphasis: Emphasis,
}

#[derive(Clone, Debug)]
pub(in crate::app) struct EdgeLine {
    pub source: usize,
    pub target: usize,
    pub segment: [Vec2; 2],
    pub critical: bool,
    pub highlighted: bool,
}

/// Everything needed to paint one frame of the topology, in world coordinates.
#[derive(Debug, Default)]
pub(in crate::app) struct RenderPlan {
    pub nodes: Vec<NodeGlyph>,
    pub edges: Vec<EdgeLine>,
    /// Indices into `nodes`.
    pub critical_nodes: Vec<usize>,
    /// Indices into `edges`.
    pub critical_edges: Vec<usize>,
}

impl RenderPlan {
    pub fn critical_ids(&self) -> Vec<&str> {
        self.critical_nodes
            .iter()
            .map(|&index| self.nodes[index].id.as_str())
            .collect()
    }
}

pub(in crate::app) fn build_render_plan(
    frame: &LayoutFrame,
    state: &DashboardState,
    highlight: Option<&HighlightState>,
    search_matches: Option<&HashSet<usize>>,
) -> RenderPlan {
    let mut plan = RenderPlan::default();
    let mut critical = vec![false; frame.ids.len()];

    for (index, (id, position)) in frame.ids.iter().zip(&frame.positions).enumerate() {
        let Some(node) = state.graph.nodes.get(id) else {
            continue;
        };
        let tier = state.display_tier(id).unwrap_or_default();
        critical[index] = tier == HealthTier::Critical;

        let emphasis = match (highlight, search_matches) {
            (Some(highlight), _) if highlight.selected == Some(index) => Emphasis::Selected,
            (Some(highlight), _) if highlight.touches(index) => Emphasis::Related,
            (Some(_), _) => Emphasis::Dimmed,
            (None, Some(matches)) if matches.contains(&index) => Emphasis::SearchMatch,
            (None, Some(matches)) if !matches.is_empty() => Emphasis::Dimmed,
            _ => Emphasis::Normal,
        };

        if critical[index] {
            plan.critical_nodes.push(plan.nodes.len());
        }
        plan.nodes.push(NodeGlyph {
            index,
            id: id.clone(),
            label: truncate_text(&node.label, LABEL_CHARS),
            position: *position,
            tier,
            category: node.category,
            ring: tier_color(tier),
            fill: category_fill(node.category),
            badge: state
                .annotations
                .for_node(id)
                .map(|annotation| truncate_text(&annotation.message, BADGE_CHARS)),
            emphasis,
        });
    }

    for (&(source, target), segment) in frame.edges.iter().zip(&frame.segments) {
        let is_critical = critical.get(source).copied().unwrap_or(false)
            || critical.get(target).copied().unwrap_or(false);
        if is_critical {
            plan.critical_edges.push(plan.edges.len());
        }
        plan.edges.push(EdgeLine {
            source,
            target,
            segment: *segment,
            critical: is_critical,
            highlighted: highlight.is_some_and(|state| state.edges.contains(&(source, target))),
        });
    }

    plan
}
