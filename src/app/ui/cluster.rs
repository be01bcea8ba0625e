use eframe::egui::{self, Color32, RichText, Ui};

use crate::backend::payload::{ClusterStatus, ValidationRecord};
use crate::sync::{ChannelKind, Intent};

use super::super::ViewModel;

const PASS_COLOR: Color32 = Color32::from_rgb(129, 199, 132);
const FAIL_COLOR: Color32 = Color32::from_rgb(239, 83, 80);

fn validation_passed(record: &ValidationRecord) -> bool {
    record.endpoints_failed == 0 && record.endpoints_passed >= record.endpoints_tested
}

impl ViewModel {
    pub(in crate::app) fn draw_cluster(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading("Cluster");
            let busy = [ChannelKind::Cluster, ChannelKind::Scaling]
                .into_iter()
                .any(|kind| self.data.channel(kind).is_some_and(|state| state.in_flight));
            if busy {
                ui.spinner();
            }
        });
        ui.separator();

        let mut intent = None;
        ui.horizontal(|ui| {
            ui.add(
                egui::DragValue::new(&mut self.simulate_count)
                    .range(1..=100)
                    .prefix("items: "),
            );
            if ui
                .button("Simulate load")
                .on_hover_text("Queue synthetic work items on the cluster.")
                .clicked()
            {
                intent = Some(Intent::SimulateLoad {
                    count: self.simulate_count,
                });
            }
            if ui
                .button("Tick")
                .on_hover_text("Advance the cluster autoscaler by one step.")
                .clicked()
            {
                intent = Some(Intent::ClusterTick);
            }
            if ui
                .button("Run validation")
                .on_hover_text("Probe every endpoint and record the result.")
                .clicked()
            {
                intent = Some(Intent::RunValidation);
            }
        });
        if let Some(intent) = intent {
            self.dispatch(intent);
        }

        ui.separator();
        match &self.data.cluster {
            Some(status) => draw_status(ui, status),
            None => {
                ui.label("Waiting for cluster status...");
            }
        }

        ui.separator();
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                egui::CollapsingHeader::new(format!(
                    "Scale events ({})",
                    self.data.scale_events.len()
                ))
                .default_open(true)
                .show(ui, |ui| {
                    if self.data.scale_events.is_empty() {
                        ui.label("No scale events recorded.");
                    }
                    for event in &self.data.scale_events {
                        let kind = event.event.as_deref().unwrap_or("event");
                        let name = event.name.as_deref().unwrap_or("-");
                        let mut line = format!("{kind} {name}");
                        if let Some(total) = event.total_replicas {
                            line.push_str(&format!(" -> {total} replicas"));
                        }
                        let response = ui.label(line);
                        if let Some(reason) = &event.reason {
                            response.on_hover_text(reason.as_str());
                        }
                    }
                });

                egui::CollapsingHeader::new(format!(
                    "Validations ({})",
                    self.data.validations.len()
                ))
                .default_open(true)
                .show(ui, |ui| {
                    if self.data.validations.is_empty() {
                        ui.label("No validation runs yet.");
                    }
                    for record in &self.data.validations {
                        let color = if validation_passed(record) {
                            PASS_COLOR
                        } else {
                            FAIL_COLOR
                        };
                        ui.horizontal(|ui| {
                            ui.label(
                                RichText::new(record.status.as_deref().unwrap_or("done"))
                                    .color(color),
                            );
                            ui.label(format!(
                                "{}/{} passed in {:.0} ms",
                                record.endpoints_passed,
                                record.endpoints_tested,
                                record.total_duration_ms
                            ));
                            if let Some(trigger) = &record.trigger_event {
                                ui.small(trigger.as_str());
                            }
                        });
                    }
                });
            });
    }
}

fn draw_status(ui: &mut Ui, status: &ClusterStatus) {
    egui::Grid::new("cluster_status_grid")
        .num_columns(2)
        .striped(true)
        .show(ui, |ui| {
            ui.label("Cluster");
            ui.label(status.cluster_id.as_deref().unwrap_or("-"));
            ui.end_row();

            ui.label("Replicas");
            ui.label(format!(
                "{} running / {} total",
                status.running_replicas, status.total_replicas
            ));
            ui.end_row();

            ui.label("Work items");
            ui.label(format!(
                "{} pending, {} processing",
                status.pending_work_items, status.processing_work_items
            ));
            ui.end_row();

            ui.label("Completed analyses");
            ui.label(status.completed_analyses.to_string());
            ui.end_row();
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_passes_only_without_failures() {
        let mut record = ValidationRecord {
            endpoints_tested: 4,
            endpoints_passed: 4,
            ..ValidationRecord::default()
        };
        assert!(validation_passed(&record));

        record.endpoints_passed = 3;
        record.endpoints_failed = 1;
        assert!(!validation_passed(&record));
    }
}
