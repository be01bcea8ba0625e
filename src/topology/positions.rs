use std::collections::HashMap;

use eframe::egui::Vec2;

/// Last-known layout coordinates by node id.
///
/// Entries outlive the nodes they describe: a node that disappears and later comes back
/// (for example after a full graph reload) resumes from where it was last drawn.
#[derive(Debug, Default)]
pub struct PositionCache {
    positions: HashMap<String, Vec2>,
}

impl PositionCache {
    pub fn get(&self, id: &str) -> Option<Vec2> {
        self.positions.get(id).copied()
    }

    pub fn set(&mut self, id: &str, position: Vec2) {
        if !position.x.is_finite() || !position.y.is_finite() {
            return;
        }

        match self.positions.get_mut(id) {
            Some(slot) => *slot = position,
            None => {
                self.positions.insert(id.to_owned(), position);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::vec2;

    #[test]
    fn keeps_entries_for_vanished_nodes() {
        let mut cache = PositionCache::default();
        cache.set("api-gateway", vec2(10.0, 20.0));
        cache.set("orders", vec2(-4.0, 3.5));
        cache.set("api-gateway", vec2(11.0, 21.0));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("api-gateway"), Some(vec2(11.0, 21.0)));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn ignores_non_finite_coordinates() {
        let mut cache = PositionCache::default();
        cache.set("orders", vec2(1.0, 1.0));
        cache.set("orders", vec2(f32::NAN, 0.0));
        assert_eq!(cache.get("orders"), Some(vec2(1.0, 1.0)));
    }
}
