use eframe::egui::{self, Color32, RichText, Ui, Vec2};

use crate::topology::{HealthTier, NodeCategory};

use super::super::ViewModel;
use super::super::render_utils::{category_fill, tier_color};

const LEGEND_TIERS: [HealthTier; 4] = [
    HealthTier::Healthy,
    HealthTier::Degraded,
    HealthTier::Critical,
    HealthTier::Rolling,
];

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Topology");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search services")
            .on_hover_text("Fuzzy-highlight matching services without changing the layout.");
        ui.text_edit_singleline(&mut self.search)
            .on_hover_text("Matches are highlighted until a service is selected.");

        ui.separator();

        ui.checkbox(&mut self.live_physics, "Live layout")
            .on_hover_text("Keep the force layout running until it settles.");
        ui.checkbox(&mut self.show_labels, "Service labels")
            .on_hover_text("Always draw labels; otherwise only for highlighted services.");
        if ui
            .button("Reset view")
            .on_hover_text("Re-center the canvas at 100% zoom.")
            .clicked()
        {
            self.pan = Vec2::ZERO;
            self.zoom = 1.0;
        }
        ui.small(self.layout_summary_text());

        ui.separator();

        ui.checkbox(&mut self.show_fps_bar, "FPS Display")
            .on_hover_text("Show a live FPS readout in the header.");
        ui.collapsing("FPS Display tuning", |ui| {
            ui.add_enabled_ui(self.show_fps_bar, |ui| {
                ui.checkbox(&mut self.fps.show_average, "Show average FPS")
                    .on_hover_text("Display the running average FPS over recent samples.");
                ui.checkbox(&mut self.fps.show_low, "Show low FPS")
                    .on_hover_text("Display the minimum FPS from the recent sample window.");
                ui.checkbox(&mut self.fps.show_frame_time, "Show frame time")
                    .on_hover_text("Display frame duration in milliseconds.");
            });
        });

        ui.separator();

        egui::CollapsingHeader::new("Critical services")
            .default_open(true)
            .show(ui, |ui| self.draw_critical_list(ui));

        egui::CollapsingHeader::new("Legend")
            .default_open(false)
            .show(ui, |ui| {
                for tier in LEGEND_TIERS {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new("◯").color(tier_color(tier)).strong());
                        ui.label(tier.label());
                    });
                }
                ui.add_space(4.0);
                for category in NodeCategory::ALL {
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(category.glyph())
                                .background_color(category_fill(category))
                                .color(Color32::from_gray(225)),
                        );
                        ui.label(category.wire_name());
                    });
                }
            });
    }

    fn draw_critical_list(&mut self, ui: &mut Ui) {
        let mut critical = self.data.graph.critical_ids().into_iter().collect::<Vec<_>>();
        critical.sort_unstable();

        if critical.is_empty() {
            ui.label("All services are above the critical threshold.");
            return;
        }

        let mut clicked = None;
        for id in critical {
            let is_selected = self.selected.as_deref() == Some(id);
            let score = self
                .data
                .graph
                .nodes
                .get(id)
                .and_then(|node| node.health_score)
                .map_or_else(|| "-".to_owned(), |score| format!("{score:.0}"));
            if ui
                .selectable_label(is_selected, format!("{id}  ({score})"))
                .clicked()
            {
                clicked = Some(id.to_owned());
            }
        }

        if let Some(id) = clicked {
            self.set_selected(Some(id));
        }
    }
}
