use eframe::egui::{self, Color32, RichText, Ui};

use crate::backend::payload::ActivityKind;
use crate::sync::ChannelKind;
use crate::util::{format_age, truncate_text, unix_now};

use super::super::ViewModel;

const SUMMARY_CHARS: usize = 64;

fn kind_color(kind: ActivityKind) -> Color32 {
    match kind {
        ActivityKind::ToolCall => Color32::from_rgb(100, 181, 246),
        ActivityKind::Insight => Color32::from_rgb(186, 104, 200),
        ActivityKind::Analysis => Color32::from_rgb(129, 199, 132),
        ActivityKind::Error => Color32::from_rgb(239, 83, 80),
        ActivityKind::Generic => Color32::from_gray(170),
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_activity(&self, ui: &mut Ui) {
        ui.label(RichText::new("Agent activity").strong());

        if self.data.activity.is_empty() {
            let waiting = self
                .data
                .channel(ChannelKind::Activity)
                .is_some_and(|state| state.loading);
            ui.label(if waiting {
                "Waiting for the first activity poll..."
            } else {
                "No agent activity yet."
            });
            return;
        }

        let now = unix_now();
        egui::ScrollArea::vertical()
            .id_salt("activity_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for event in &self.data.activity {
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(event.event_type.label())
                                .small()
                                .color(kind_color(event.event_type)),
                        );
                        let response = ui.label(truncate_text(&event.summary, SUMMARY_CHARS));
                        if let Some(detail) = &event.detail {
                            response.on_hover_text(detail.as_str());
                        }
                    });
                    if event.ts > 0.0 {
                        ui.small(format_age(event.ts, now));
                    }
                }
            });
    }
}
