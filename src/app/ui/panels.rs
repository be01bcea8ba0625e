use std::sync::mpsc;

use eframe::egui::{self, Align, Color32, Context, Layout, RichText, Ui, Vec2};
use tokio::runtime::Handle;

use crate::backend::HttpApi;
use crate::config::DashboardConfig;
use crate::sync::{ActionRunner, ChannelHub, ChannelKind, SyncSink, Visibility};
use crate::topology::{PositionCache, ServiceGraph};

use super::super::dispatch::Dispatcher;
use super::super::overlay::OverlayLoops;
use super::super::physics::LayoutEngine;
use super::super::state::DashboardState;
use super::super::{Tab, ViewModel};
use super::FpsCounter;

const OK_COLOR: Color32 = Color32::from_rgb(129, 199, 132);
const ERROR_COLOR: Color32 = Color32::from_rgb(239, 83, 80);
const IDLE_COLOR: Color32 = Color32::from_gray(140);

impl ViewModel {
    pub(in crate::app) fn new(
        graph: ServiceGraph,
        runtime: &Handle,
        api: HttpApi,
        config: &DashboardConfig,
        ctx: &Context,
    ) -> Self {
        let (tx, events) = mpsc::channel();
        let sink = SyncSink::new(tx, Some(ctx.clone()));
        let visibility = Visibility::new(true);
        let hub = ChannelHub::start(runtime, api.clone(), config, visibility.clone(), sink.clone());
        let actions = ActionRunner::new(api, runtime.clone(), sink);

        Self {
            data: DashboardState::new(graph),
            hub,
            events,
            actions,
            visibility,
            tab: Tab::Topology,
            polled_tab: None,
            layout: LayoutEngine::default(),
            overlay: OverlayLoops::default(),
            dispatcher: Dispatcher::default(),
            click_target: None,
            selected: None,
            search: String::new(),
            search_cache: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            live_physics: true,
            show_labels: true,
            show_fps_bar: false,
            fps: FpsCounter::default(),
            simulate_count: 5,
            reload_error: None,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        positions: &mut PositionCache,
        reload_requested: &mut bool,
        is_reloading: bool,
    ) {
        self.fps.record(ctx.input(|input| input.stable_dt));
        self.update_visibility(ctx);
        self.drain_events(ctx);
        self.refresh_dispatcher();

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| self.draw_top_bar(ui, reload_requested, is_reloading));
        self.sync_polling();

        egui::TopBottomPanel::bottom("status_bar")
            .resizable(false)
            .show(ctx, |ui| self.draw_status_bar(ui));

        match self.tab {
            Tab::Topology => {
                egui::SidePanel::left("controls")
                    .resizable(true)
                    .default_width(280.0)
                    .show(ctx, |ui| self.draw_controls(ui));

                egui::SidePanel::right("details")
                    .resizable(true)
                    .default_width(340.0)
                    .show(ctx, |ui| {
                        self.draw_details(ui);
                        ui.separator();
                        self.draw_activity(ui);
                    });

                egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui, positions));
            }
            Tab::Insights => {
                egui::CentralPanel::default().show(ctx, |ui| self.draw_insights(ui));
            }
            Tab::Cluster => {
                egui::CentralPanel::default().show(ctx, |ui| self.draw_cluster(ui));
            }
        }
    }

    fn draw_top_bar(&mut self, ui: &mut Ui, reload_requested: &mut bool, is_reloading: bool) {
        ui.horizontal(|ui| {
            ui.heading("meshpulse");
            ui.separator();

            for tab in Tab::ALL {
                ui.selectable_value(&mut self.tab, tab, tab.label());
            }
            ui.separator();

            ui.label(format!("services: {}", self.data.graph.node_count()));
            ui.label(format!("links: {}", self.data.graph.edge_count()));
            let critical = self.data.graph.critical_ids().len();
            if critical > 0 {
                ui.colored_label(ERROR_COLOR, format!("critical: {critical}"));
            }

            let reload_button = ui.add_enabled(!is_reloading, egui::Button::new("Reload graph"));
            if reload_button.clicked() {
                *reload_requested = true;
            }
            if is_reloading {
                ui.spinner();
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if self.data.connected() {
                    ui.colored_label(OK_COLOR, "connected");
                } else {
                    ui.colored_label(ERROR_COLOR, "disconnected");
                }
                if self.show_fps_bar
                    && let Some(fps_text) = self.fps.display_text()
                {
                    ui.label(fps_text);
                }
            });
        });
    }

    fn draw_status_bar(&self, ui: &mut Ui) {
        ui.horizontal_wrapped(|ui| {
            for kind in ChannelKind::ALL {
                self.draw_channel_status(ui, kind);
            }

            ui.separator();
            if self.data.pending_actions > 0 {
                ui.spinner();
                ui.label(format!("{} action(s) running", self.data.pending_actions));
            } else if let Some(outcome) = &self.data.last_action {
                match &outcome.result {
                    Ok(summary) => ui.label(format!("{}: {summary}", outcome.label)),
                    Err(error) => {
                        ui.colored_label(ERROR_COLOR, format!("{} failed: {error}", outcome.label))
                    }
                };
            }

            if let Some(error) = &self.reload_error {
                ui.separator();
                ui.colored_label(ERROR_COLOR, format!("reload failed: {error}"));
            }
        });
    }

    fn draw_channel_status(&self, ui: &mut Ui, kind: ChannelKind) {
        let Some(state) = self.data.channel(kind) else {
            return;
        };
        let active = self.hub.is_active(kind);

        let (text, color) = if let Some(error) = &state.last_error {
            (format!("{kind}: error"), Some((ERROR_COLOR, error.as_str())))
        } else if state.in_flight {
            (format!("{kind}: fetching"), None)
        } else if state.loading {
            (format!("{kind}: waiting"), None)
        } else if let Some(success) = state.last_success {
            (format!("{kind}: {}s", success.elapsed().as_secs()), None)
        } else {
            (format!("{kind}: -"), None)
        };

        let mut label = RichText::new(text).small();
        label = match color {
            Some((color, _)) => label.color(color),
            None if !active => label.color(IDLE_COLOR),
            None => label.color(OK_COLOR),
        };

        let response = ui.label(label);
        if let Some((_, error)) = color {
            response.on_hover_text(error);
        } else if !active {
            response.on_hover_text("paused while another tab is open");
        }
    }
}
