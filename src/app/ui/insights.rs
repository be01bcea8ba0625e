use eframe::egui::{self, Color32, RichText, Ui};

use crate::backend::payload::{Insight, InsightStatus};
use crate::sync::{ChannelKind, Intent};

use super::super::ViewModel;

fn severity_color(severity: Option<&str>) -> Color32 {
    match severity.map(str::to_ascii_lowercase).as_deref() {
        Some("critical" | "high") => Color32::from_rgb(239, 83, 80),
        Some("warning" | "medium") => Color32::from_rgb(255, 183, 77),
        Some("info" | "low") => Color32::from_rgb(100, 181, 246),
        _ => Color32::from_gray(170),
    }
}

fn insight_title(insight: &Insight) -> String {
    let title = insight
        .title
        .as_deref()
        .or(insight.insight.as_deref())
        .unwrap_or("untitled insight");
    match &insight.service {
        Some(service) => format!("[{service}] {title}"),
        None => title.to_owned(),
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_insights(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading("Insights");
            if self
                .data
                .channel(ChannelKind::Insights)
                .is_some_and(|state| state.in_flight)
            {
                ui.spinner();
            }
            if ui.button("Generate insights").clicked() {
                self.dispatch(Intent::GenerateInsights { service: None });
            }
            if ui.button("Refresh").clicked() {
                self.hub.refresh(ChannelKind::Insights);
            }
        });
        ui.separator();

        let mut status_change = None;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                egui::CollapsingHeader::new(format!("Open insights ({})", self.data.insights.len()))
                    .default_open(true)
                    .show(ui, |ui| {
                        if self.data.insights.is_empty() {
                            ui.label("No insights stored.");
                        }
                        for insight in &self.data.insights {
                            if let Some(change) = draw_insight(ui, insight, true) {
                                status_change = Some(change);
                            }
                        }
                    });

                egui::CollapsingHeader::new(format!("Patterns ({})", self.data.patterns.len()))
                    .default_open(true)
                    .show(ui, |ui| {
                        if self.data.patterns.is_empty() {
                            ui.label("No recurring patterns detected.");
                        }
                        for pattern in &self.data.patterns {
                            let scope = pattern
                                .service
                                .as_deref()
                                .or(pattern.scope.as_deref())
                                .unwrap_or("global");
                            ui.label(format!(
                                "{scope}: {}",
                                pattern.description.as_deref().unwrap_or("-")
                            ));
                        }
                    });

                egui::CollapsingHeader::new(format!(
                    "Recommendations ({})",
                    self.data.recommendations.len()
                ))
                .default_open(true)
                .show(ui, |ui| {
                    if self.data.recommendations.is_empty() {
                        ui.label("No recommendations.");
                    }
                    for recommendation in &self.data.recommendations {
                        draw_insight(ui, recommendation, false);
                    }
                });
            });

        if let Some((insight_id, status)) = status_change {
            self.dispatch(Intent::SetInsightStatus { insight_id, status });
        }
    }
}

/// Draws one insight card. Returns a requested status change.
fn draw_insight(ui: &mut Ui, insight: &Insight, actionable: bool) -> Option<(String, InsightStatus)> {
    let mut change = None;

    ui.group(|ui| {
        ui.horizontal(|ui| {
            if let Some(severity) = &insight.severity {
                ui.label(
                    RichText::new(severity.as_str())
                        .small()
                        .color(severity_color(Some(severity))),
                );
            }
            ui.label(RichText::new(insight_title(insight)).strong());
            if let Some(status) = &insight.status {
                ui.small(status.as_str());
            }
        });

        if let Some(text) = insight.insight.as_deref().filter(|_| insight.title.is_some()) {
            ui.label(text);
        }
        if let Some(recommendation) = &insight.recommendation {
            ui.label(RichText::new(recommendation.as_str()).italics());
        }

        if actionable && let Some(id) = &insight.id {
            ui.horizontal(|ui| {
                if ui.small_button("Acknowledge").clicked() {
                    change = Some((id.clone(), InsightStatus::Acknowledged));
                }
                if ui.small_button("Resolve").clicked() {
                    change = Some((id.clone(), InsightStatus::Resolved));
                }
            });
        }
    });

    change
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_prefers_title_then_text_and_tags_service() {
        let insight = Insight {
            title: Some("Pool exhaustion".into()),
            insight: Some("orders-db saturates at peak".into()),
            service: Some("orders".into()),
            ..Insight::default()
        };
        assert_eq!(insight_title(&insight), "[orders] Pool exhaustion");

        let bare = Insight {
            insight: Some("latency regression".into()),
            ..Insight::default()
        };
        assert_eq!(insight_title(&bare), "latency regression");
        assert_eq!(insight_title(&Insight::default()), "untitled insight");
    }

    #[test]
    fn severity_colors_ignore_case() {
        assert_eq!(severity_color(Some("HIGH")), severity_color(Some("critical")));
        assert_ne!(severity_color(Some("low")), severity_color(Some("high")));
        assert_eq!(severity_color(None), Color32::from_gray(170));
    }
}
