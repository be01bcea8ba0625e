use std::collections::HashSet;

mod collect;

use self::collect::collect_neighborhood;
use super::physics::LayoutFrame;

/// How many hops upstream and downstream of the selection get highlighted.
const NEIGHBORHOOD_DEPTH: usize = 2;

#[derive(Debug, Default)]
pub(super) struct HighlightState {
    pub(super) selected: Option<usize>,
    /// Nodes the selection depends on, directly or transitively.
    pub(super) dependencies: HashSet<usize>,
    /// Nodes that depend on the selection.
    pub(super) dependents: HashSet<usize>,
    pub(super) edges: HashSet<(usize, usize)>,
}

impl HighlightState {
    pub(super) fn touches(&self, index: usize) -> bool {
        self.selected == Some(index)
            || self.dependencies.contains(&index)
            || self.dependents.contains(&index)
    }
}

pub(super) fn build_highlight_state(frame: &LayoutFrame, selected_id: &str) -> Option<HighlightState> {
    let &selected = frame.index_by_id.get(selected_id)?;

    let mut state = HighlightState {
        selected: Some(selected),
        ..HighlightState::default()
    };
    collect_neighborhood(
        &frame.outgoing,
        selected,
        true,
        NEIGHBORHOOD_DEPTH,
        &mut state.dependencies,
        &mut state.edges,
    );
    collect_neighborhood(
        &frame.incoming,
        selected,
        false,
        NEIGHBORHOOD_DEPTH,
        &mut state.dependents,
        &mut state.edges,
    );
    Some(state)
}
