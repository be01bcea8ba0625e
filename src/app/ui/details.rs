use eframe::egui::{self, ProgressBar, RichText, Ui};

use crate::backend::payload::ScaleDirection;
use crate::sync::Intent;
use crate::util::{format_age, unix_now};

use super::super::ViewModel;
use super::super::render_utils::tier_color;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Service Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Select a service in the graph.");
            self.draw_recent_annotations(ui);
            return;
        };

        let Some(node) = self.data.graph.nodes.get(&selected_id) else {
            ui.label("Selected service no longer exists in the graph.");
            return;
        };

        let tier = self.data.display_tier(&selected_id).unwrap_or_default();
        let label = node.label.clone();
        let category = node.category;
        let health_score = node.health_score;
        let gauges = node.gauges;
        let replicas = node.replicas;
        let dependencies = node.dependencies.clone();
        let dependents = node.dependents.clone();

        ui.label(RichText::new(label).strong());
        if node.label != selected_id {
            ui.small(selected_id.as_str());
        }
        ui.add_space(6.0);

        ui.horizontal(|ui| {
            ui.label("Status:");
            ui.colored_label(tier_color(tier), tier.label());
            if let Some(score) = health_score {
                ui.label(format!("(score {score:.0})"));
            }
        });
        ui.label(format!("Type: {}", category.wire_name()));
        ui.label(format!("Replicas: {replicas}"));
        ui.add(
            ProgressBar::new((gauges.cpu_percent / 100.0) as f32)
                .text(format!("cpu {:.0}%", gauges.cpu_percent)),
        );
        ui.add(
            ProgressBar::new((gauges.mem_percent / 100.0) as f32)
                .text(format!("mem {:.0}%", gauges.mem_percent)),
        );
        ui.label(format!(
            "{:.0} req/min, {:.1}% errors",
            gauges.requests_per_minute, gauges.error_rate_percent
        ));

        if let Some(annotation) = self.data.annotations.for_node(&selected_id) {
            ui.add_space(4.0);
            ui.label(RichText::new(&annotation.message).italics())
                .on_hover_text(format_age(annotation.timestamp, unix_now()));
        }

        ui.separator();
        self.draw_actions(ui, &selected_id, replicas);

        ui.separator();
        let mut jump_to = None;
        egui::CollapsingHeader::new(format!("Depends on ({})", dependencies.len()))
            .default_open(true)
            .show(ui, |ui| {
                if dependencies.is_empty() {
                    ui.label("No dependencies.");
                }
                for id in &dependencies {
                    if ui.link(id.as_str()).clicked() {
                        jump_to = Some(id.clone());
                    }
                }
            });
        egui::CollapsingHeader::new(format!("Used by ({})", dependents.len()))
            .default_open(true)
            .show(ui, |ui| {
                if dependents.is_empty() {
                    ui.label("Nothing depends on this service.");
                }
                for id in &dependents {
                    if ui.link(id.as_str()).clicked() {
                        jump_to = Some(id.clone());
                    }
                }
            });

        if let Some(id) = jump_to {
            self.set_selected(Some(id));
        }
    }

    fn draw_actions(&mut self, ui: &mut Ui, service: &str, replicas: u32) {
        let rolling = self.data.rolling.contains(service);
        let connected = self.data.connected();

        ui.horizontal_wrapped(|ui| {
            if ui
                .add_enabled(connected, egui::Button::new("Analyze"))
                .on_hover_text("Ask the agent for a root-cause analysis.")
                .clicked()
            {
                self.dispatch(Intent::Analyze {
                    service: service.to_owned(),
                });
            }

            if ui
                .add_enabled(!rolling, egui::Button::new("Scale up"))
                .clicked()
            {
                self.dispatch(Intent::Scale {
                    service: service.to_owned(),
                    direction: ScaleDirection::Up,
                    instance_count: replicas.saturating_add(1),
                });
            }

            if ui
                .add_enabled(!rolling && replicas > 1, egui::Button::new("Scale down"))
                .clicked()
            {
                self.dispatch(Intent::Scale {
                    service: service.to_owned(),
                    direction: ScaleDirection::Down,
                    instance_count: replicas - 1,
                });
            }

            if ui.button("Generate insights").clicked() {
                self.dispatch(Intent::GenerateInsights {
                    service: Some(service.to_owned()),
                });
            }

            if rolling {
                ui.spinner();
                ui.label("rolling");
            }
        });
    }

    fn draw_recent_annotations(&self, ui: &mut Ui) {
        if self.data.annotations.is_empty() {
            return;
        }

        ui.separator();
        let heading = format!("Recent findings ({})", self.data.annotations.len());
        ui.label(RichText::new(heading).strong());
        let now = unix_now();
        for annotation in self.data.annotations.iter().take(8) {
            ui.label(format!(
                "{}: {} ({})",
                annotation.node_id,
                annotation.message,
                format_age(annotation.timestamp, now)
            ));
        }
    }
}
