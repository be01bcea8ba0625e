use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Shape, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::config::OVERLAY_FRAME;
use crate::topology::PositionCache;

use super::super::highlight::build_highlight_state;
use super::super::overlay::OverlayLoops;
use super::super::render_utils::{
    CRITICAL_EDGE_COLOR, SELECTED_COLOR, blend_color, circle_visible, dim_color, draw_background,
    node_screen_radius, segment_visible, with_alpha, world_to_screen,
};
use super::super::{SearchMatchCache, ViewModel};
use super::plan::{Emphasis, NodeGlyph, RenderPlan, build_render_plan};

const SEARCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);
const RELATED_EDGE_COLOR: Color32 = Color32::from_rgb(241, 146, 94);
const BADGE_COLOR: Color32 = Color32::from_rgb(255, 213, 128);
const DASH_LENGTH: f32 = 9.0;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Screen-space transform for one frame.
#[derive(Clone, Copy)]
struct Viewport {
    rect: Rect,
    pan: egui::Vec2,
    zoom: f32,
    node_radius: f32,
}

impl Viewport {
    fn to_screen(self, world: egui::Vec2) -> Pos2 {
        world_to_screen(self.rect, self.pan, self.zoom, world)
    }
}

impl ViewModel {
    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        if self.selected.is_some() {
            return None;
        }

        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        let revision = self.layout.frame().revision;
        if let Some(cached) = &self.search_cache
            && cached.layout_revision == revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let frame = self.layout.frame();
        let matches = frame
            .ids
            .iter()
            .enumerate()
            .filter_map(|(index, id)| {
                let label = self
                    .data
                    .graph
                    .nodes
                    .get(id)
                    .map_or(id.as_str(), |node| node.label.as_str());
                let hit = fuzzy_match_score(&matcher, label, query).is_some()
                    || fuzzy_match_score(&matcher, id, query).is_some();
                hit.then_some(index)
            })
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            layout_revision: revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui, positions: &mut PositionCache) {
        self.sync_topology(positions);

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, self.pan, self.zoom);

        if self.layout.frame().ids.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "The backend reported no services.",
                FontId::proportional(15.0),
                Color32::from_gray(200),
            );
            return;
        }

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);
        self.handle_node_drag(ui, rect, &response);

        let dragging = self.layout.dragged_id().is_some();
        if self.live_physics || dragging {
            self.layout.tick(positions);
        }
        if (self.live_physics && self.layout.is_running()) || dragging || response.dragged() {
            ui.ctx().request_repaint();
        }

        let hovered = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| rect.contains(*pointer))
            .and_then(|pointer| self.node_at(rect, pointer));
        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let now = ui.input(|input| input.time);
        let search_matches = self.cached_search_matches();
        let highlight = self
            .selected
            .as_deref()
            .and_then(|id| build_highlight_state(self.layout.frame(), id));
        let plan = build_render_plan(
            self.layout.frame(),
            &self.data,
            highlight.as_ref(),
            search_matches.as_deref(),
        );
        self.overlay.sync(&plan, self.layout.frame().revision, now);

        let viewport = Viewport {
            rect,
            pan: self.pan,
            zoom: self.zoom,
            node_radius: node_screen_radius(self.zoom),
        };
        let selection_active = highlight.is_some();

        paint_edges(&painter, viewport, &plan, selection_active);
        paint_critical_overlay(&painter, viewport, &plan, &self.overlay, now);
        for glyph in &plan.nodes {
            let is_hovered = hovered.as_deref() == Some(glyph.id.as_str());
            paint_node(&painter, viewport, glyph, is_hovered, self.show_labels);
        }

        if self.overlay.is_alive() {
            ui.ctx().request_repaint_after(OVERLAY_FRAME);
        }

        if let Some(id) = &hovered
            && let Some(node) = self.data.graph.nodes.get(id)
        {
            let tier = self.data.display_tier(id).unwrap_or_default();
            let panel_text = format!(
                "{}  |  {}  |  cpu {:.0}%  mem {:.0}%  |  {} replicas",
                node.label, tier, node.gauges.cpu_percent, node.gauges.mem_percent, node.replicas
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                panel_text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            self.handle_graph_click(hovered.as_deref());
        }
    }
}

fn paint_edges(painter: &Painter, viewport: Viewport, plan: &RenderPlan, selection_active: bool) {
    let zoom_sqrt = viewport.zoom.sqrt();

    for edge in &plan.edges {
        let start = viewport.to_screen(edge.segment[0]);
        let end = viewport.to_screen(edge.segment[1]);
        if !segment_visible(viewport.rect, start, end, 2.0) {
            continue;
        }

        let (width, color) = if edge.highlighted {
            ((2.4 * zoom_sqrt).clamp(1.2, 4.4), RELATED_EDGE_COLOR)
        } else if selection_active {
            (
                (0.9 * zoom_sqrt).clamp(0.5, 2.0),
                Color32::from_rgba_unmultiplied(80, 90, 104, 110),
            )
        } else {
            (
                (1.3 * zoom_sqrt).clamp(0.7, 3.0),
                Color32::from_rgba_unmultiplied(120, 130, 140, 170),
            )
        };
        painter.line_segment([start, end], Stroke::new(width, color));

        // Direction marker just outside the target's ring.
        let direction = (end - start).normalized();
        if direction.is_finite() && (end - start).length() > viewport.node_radius * 2.5 {
            let tip = end - direction * (viewport.node_radius + 2.0);
            let side = direction.rot90() * 3.5;
            let back = tip - direction * 7.0;
            painter.add(Shape::convex_polygon(
                vec![tip, back + side, back - side],
                color,
                Stroke::NONE,
            ));
        }
    }
}

fn paint_critical_overlay(
    painter: &Painter,
    viewport: Viewport,
    plan: &RenderPlan,
    overlay: &OverlayLoops,
    now: f64,
) {
    if !overlay.is_alive() {
        return;
    }

    let edge_color = with_alpha(CRITICAL_EDGE_COLOR, overlay.edge_alpha(now));
    let dash_offset = overlay.dash_offset(now, DASH_LENGTH);
    for &index in &plan.critical_edges {
        let Some(edge) = plan.edges.get(index) else {
            continue;
        };
        let start = viewport.to_screen(edge.segment[0]);
        let end = viewport.to_screen(edge.segment[1]);
        if !segment_visible(viewport.rect, start, end, 4.0) {
            continue;
        }
        painter.extend(Shape::dashed_line_with_offset(
            &[start, end],
            Stroke::new(2.6, edge_color),
            &[DASH_LENGTH],
            &[DASH_LENGTH],
            dash_offset,
        ));
    }

    let pulse = overlay.pulse(now);
    for &index in &plan.critical_nodes {
        let Some(glyph) = plan.nodes.get(index) else {
            continue;
        };
        let center = viewport.to_screen(glyph.position);
        let radius = viewport.node_radius * (1.0 + pulse.spread);
        if !circle_visible(viewport.rect, center, radius) {
            continue;
        }
        painter.circle_stroke(
            center,
            radius,
            Stroke::new(2.0, with_alpha(CRITICAL_EDGE_COLOR, pulse.alpha)),
        );
    }
}

fn paint_node(
    painter: &Painter,
    viewport: Viewport,
    glyph: &NodeGlyph,
    is_hovered: bool,
    show_labels: bool,
) {
    let center = viewport.to_screen(glyph.position);
    let radius = viewport.node_radius;
    if !circle_visible(viewport.rect, center, radius + 60.0) {
        return;
    }

    let (fill, ring, ring_width) = match glyph.emphasis {
        Emphasis::Dimmed => (dim_color(glyph.fill, 0.45), dim_color(glyph.ring, 0.5), 2.0),
        Emphasis::SearchMatch => (blend_color(glyph.fill, SEARCH_COLOR, 0.35), glyph.ring, 3.0),
        Emphasis::Selected | Emphasis::Related => (glyph.fill, glyph.ring, 3.2),
        Emphasis::Normal => (glyph.fill, glyph.ring, 2.6),
    };
    let fill = if is_hovered {
        blend_color(fill, Color32::WHITE, 0.15)
    } else {
        fill
    };

    painter.circle_filled(center, radius, fill);
    painter.circle_stroke(center, radius, Stroke::new(ring_width, ring));
    if glyph.emphasis == Emphasis::Selected {
        painter.circle_stroke(center, radius + 5.0, Stroke::new(1.8, SELECTED_COLOR));
    }

    painter.text(
        center,
        Align2::CENTER_CENTER,
        glyph.category.glyph(),
        FontId::proportional((radius * 0.8).max(8.0)),
        Color32::from_gray(225),
    );

    let emphasized = matches!(
        glyph.emphasis,
        Emphasis::Selected | Emphasis::Related | Emphasis::SearchMatch
    );
    if show_labels || emphasized || is_hovered {
        let color = if glyph.emphasis == Emphasis::Dimmed {
            Color32::from_gray(130)
        } else {
            Color32::from_gray(235)
        };
        painter.text(
            center + vec2(0.0, radius + 4.0),
            Align2::CENTER_TOP,
            &glyph.label,
            FontId::proportional(12.0),
            color,
        );
    }

    if let Some(badge) = &glyph.badge {
        painter.text(
            center - vec2(0.0, radius + 4.0),
            Align2::CENTER_BOTTOM,
            badge,
            FontId::proportional(11.0),
            BADGE_COLOR,
        );
    }
}
