use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::topology::{HealthTier, NodeCategory};

pub(super) const NODE_RADIUS: f32 = 18.0;
pub(super) const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
pub(super) const CRITICAL_EDGE_COLOR: Color32 = Color32::from_rgb(239, 83, 80);

/// Node radius on screen. Grows slower than the zoom so dense views stay readable.
pub(super) fn node_screen_radius(zoom: f32) -> f32 {
    (NODE_RADIUS * zoom.sqrt()).clamp(6.0, 42.0)
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * amount) as u8;

    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn with_alpha(color: Color32, alpha: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (alpha.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

pub(super) fn tier_color(tier: HealthTier) -> Color32 {
    match tier {
        HealthTier::Healthy => Color32::from_rgb(76, 175, 80),
        HealthTier::Degraded => Color32::from_rgb(255, 183, 77),
        HealthTier::Critical => Color32::from_rgb(239, 83, 80),
        HealthTier::Rolling => Color32::from_rgb(100, 181, 246),
    }
}

pub(super) fn category_fill(category: NodeCategory) -> Color32 {
    match category {
        NodeCategory::Gateway => Color32::from_rgb(52, 64, 96),
        NodeCategory::Service => Color32::from_rgb(38, 50, 56),
        NodeCategory::Database => Color32::from_rgb(62, 48, 82),
        NodeCategory::Cache => Color32::from_rgb(74, 52, 46),
        NodeCategory::Queue => Color32::from_rgb(40, 70, 64),
        NodeCategory::Storage => Color32::from_rgb(66, 66, 48),
    }
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Cheap bounding-box test; lines crossing the viewport corner-to-corner still pass.
pub(super) fn segment_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{pos2, vec2};

    #[test]
    fn screen_and_world_round_trip() {
        let rect = Rect::from_min_size(pos2(10.0, 20.0), vec2(800.0, 600.0));
        let pan = vec2(-35.0, 12.0);
        let world = vec2(120.0, -48.0);
        let screen = world_to_screen(rect, pan, 1.7, world);
        let back = screen_to_world(rect, pan, 1.7, screen);
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn tiers_have_distinct_colors() {
        let colors = [
            HealthTier::Healthy,
            HealthTier::Degraded,
            HealthTier::Critical,
            HealthTier::Rolling,
        ]
        .map(tier_color);
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn offscreen_segments_are_culled() {
        let rect = Rect::from_min_size(Pos2::ZERO, vec2(100.0, 100.0));
        assert!(segment_visible(rect, pos2(-50.0, 50.0), pos2(150.0, 50.0), 1.0));
        assert!(!segment_visible(rect, pos2(200.0, 0.0), pos2(300.0, 90.0), 1.0));
    }
}
