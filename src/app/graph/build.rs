use tracing::info;

use crate::topology::PositionCache;

use super::super::ViewModel;

impl ViewModel {
    /// Brings the layout in line with the current graph. On a rebuild the click target is
    /// re-attached and anything keyed by node index is invalidated.
    pub(in crate::app) fn sync_topology(&mut self, positions: &PositionCache) {
        if !self.layout.sync(&self.data.graph, positions) {
            return;
        }

        self.click_target = Some(self.dispatcher.target());
        self.search_cache = None;
        if let Some(selected) = &self.selected
            && !self.data.graph.nodes.contains_key(selected)
        {
            self.selected = None;
        }

        let frame = self.layout.frame();
        info!(
            nodes = frame.ids.len(),
            edges = frame.edges.len(),
            revision = frame.revision,
            cached = positions.len(),
            "topology attached to layout"
        );
    }

    pub(in crate::app) fn layout_summary_text(&self) -> String {
        let frame = self.layout.frame();
        let state = if self.layout.dragged_id().is_some() {
            "dragging"
        } else if self.layout.is_running() {
            "settling"
        } else {
            "settled"
        };
        format!(
            "layout: {} nodes / {} edges, {state} (alpha {:.3})",
            frame.ids.len(),
            frame.edges.len(),
            self.layout.alpha()
        )
    }
}
