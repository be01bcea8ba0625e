use eframe::egui::{self, Pos2, Rect, Ui};
use tracing::debug;

use crate::sync::Intent;

use super::super::ViewModel;
use super::super::dispatch::NodeCommand;
use super::super::render_utils::{node_screen_radius, screen_to_world, world_to_screen};

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.2, 4.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    /// Closest node whose disc contains `pointer`.
    pub(in crate::app) fn node_at(&self, rect: Rect, pointer: Pos2) -> Option<String> {
        let frame = self.layout.frame();
        let radius = node_screen_radius(self.zoom);

        frame
            .ids
            .iter()
            .zip(&frame.positions)
            .filter_map(|(id, world)| {
                let distance = world_to_screen(rect, self.pan, self.zoom, *world).distance(pointer);
                (distance <= radius).then_some((id, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id.clone())
    }

    /// Primary-button drags that start on a node pin it under the pointer until released.
    pub(in crate::app) fn handle_node_drag(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(origin) = ui.input(|input| input.pointer.press_origin())
            && let Some(id) = self.node_at(rect, origin)
            && self.layout.begin_drag(&id)
        {
            debug!(node = %id, "node drag started");
        }

        if self.layout.dragged_id().is_none() {
            return;
        }

        if response.dragged_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
        {
            self.layout
                .drag_to(screen_to_world(rect, self.pan, self.zoom, pointer));
        }

        if response.drag_stopped() {
            self.layout.end_drag();
        }
    }

    /// Routes a primary click through the click target attached at the last rebuild.
    pub(in crate::app) fn handle_graph_click(&mut self, hovered: Option<&str>) {
        let Some(id) = hovered else {
            self.set_selected(None);
            return;
        };
        let Some(target) = &self.click_target else {
            return;
        };

        let command = target.activate(id);
        self.apply_node_command(command);
    }

    pub(in crate::app) fn apply_node_command(&mut self, command: NodeCommand) {
        match command {
            NodeCommand::ClearSelection => self.set_selected(None),
            NodeCommand::Select { id, analyze } => {
                self.set_selected(Some(id.clone()));
                if analyze {
                    self.dispatch(Intent::Analyze { service: id });
                }
            }
        }
    }
}
