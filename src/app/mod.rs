use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use anyhow::Context as _;
use eframe::egui::{self, Context, Vec2};
use tokio::runtime::Runtime;
use tracing::{info, warn};

use crate::backend::{DashboardApi, HttpApi};
use crate::config::DashboardConfig;
use crate::sync::{ActionRunner, ChannelHub, ChannelKind, Intent, SyncEvent, Visibility};
use crate::topology::{PositionCache, ServiceGraph};

mod dispatch;
mod graph;
mod highlight;
mod overlay;
mod physics;
mod render_utils;
mod state;
mod ui;

use dispatch::{ActivationContext, ClickTarget, Dispatcher};
use overlay::OverlayLoops;
use physics::LayoutEngine;
use state::DashboardState;
use ui::FpsCounter;

type GraphLoad = Result<ServiceGraph, String>;

pub struct DashboardApp {
    config: DashboardConfig,
    api: HttpApi,
    runtime: Runtime,
    /// Outlives graph reloads so services keep their place.
    positions: PositionCache,
    state: AppState,
    reload_rx: Option<Receiver<GraphLoad>>,
}

enum AppState {
    Loading { rx: Receiver<GraphLoad> },
    Ready(Box<ViewModel>),
    Offline(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tab {
    Topology,
    Insights,
    Cluster,
}

impl Tab {
    const ALL: [Self; 3] = [Self::Topology, Self::Insights, Self::Cluster];

    fn label(self) -> &'static str {
        match self {
            Self::Topology => "Topology",
            Self::Insights => "Insights",
            Self::Cluster => "Cluster",
        }
    }

    /// Channels polled while this tab is selected.
    fn channels(self) -> &'static [ChannelKind] {
        match self {
            Self::Topology => &[ChannelKind::Health, ChannelKind::Activity],
            Self::Insights => &[ChannelKind::Insights],
            Self::Cluster => &[ChannelKind::Cluster, ChannelKind::Scaling],
        }
    }
}

struct ViewModel {
    data: DashboardState,
    hub: ChannelHub,
    events: Receiver<SyncEvent>,
    actions: ActionRunner<HttpApi>,
    visibility: Visibility,
    tab: Tab,
    polled_tab: Option<Tab>,
    layout: LayoutEngine,
    overlay: OverlayLoops,
    dispatcher: Dispatcher,
    click_target: Option<ClickTarget>,
    selected: Option<String>,
    search: String,
    search_cache: Option<SearchMatchCache>,
    pan: Vec2,
    zoom: f32,
    live_physics: bool,
    show_labels: bool,
    show_fps_bar: bool,
    fps: FpsCounter,
    simulate_count: u32,
    reload_error: Option<String>,
}

struct SearchMatchCache {
    query: String,
    layout_revision: u64,
    matches: Arc<HashSet<usize>>,
}

impl DashboardApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: DashboardConfig,
        api: HttpApi,
        runtime: Runtime,
    ) -> Self {
        let rx = Self::spawn_load(&runtime, api.clone(), cc.egui_ctx.clone());
        Self {
            config,
            api,
            runtime,
            positions: PositionCache::default(),
            state: AppState::Loading { rx },
            reload_rx: None,
        }
    }

    fn spawn_load(runtime: &Runtime, api: HttpApi, ctx: Context) -> Receiver<GraphLoad> {
        let (tx, rx) = mpsc::channel();

        runtime.spawn(async move {
            let result = load_graph(&api).await.map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
            ctx.request_repaint();
        });

        rx
    }

    fn make_ready(&self, ctx: &Context, graph: ServiceGraph) -> AppState {
        AppState::Ready(Box::new(ViewModel::new(
            graph,
            self.runtime.handle(),
            self.api.clone(),
            &self.config,
            ctx,
        )))
    }
}

async fn load_graph(api: &impl DashboardApi) -> anyhow::Result<ServiceGraph> {
    let payload = api
        .graph()
        .await
        .context("failed to fetch the service graph")?;
    let graph = ServiceGraph::from_payload(payload);
    info!(
        services = graph.node_count(),
        links = graph.edge_count(),
        "service graph loaded"
    );
    Ok(graph)
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => transition = Some(result),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load task disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading service topology...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Offline(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Backend unreachable");
                    ui.add_space(6.0);
                    ui.label(format!("API: {}", self.config.api_url));
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut self.positions, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    info!("reloading service graph");
                    self.reload_rx = Some(Self::spawn_load(
                        &self.runtime,
                        self.api.clone(),
                        ctx.clone(),
                    ));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(graph)) => model.replace_graph(graph),
                        Ok(Err(error)) => {
                            warn!(error = %error, "graph reload failed");
                            model.reload_error = Some(error);
                        }
                        Err(TryRecvError::Empty) => self.reload_rx = Some(rx),
                        Err(TryRecvError::Disconnected) => {
                            model.reload_error =
                                Some("Background load task disconnected".to_owned());
                        }
                    }
                }
            }
        }

        match transition {
            Some(Ok(graph)) => self.state = self.make_ready(ctx, graph),
            Some(Err(error)) => {
                warn!(error = %error, "initial graph load failed");
                self.state = AppState::Offline(error);
            }
            None => {}
        }

        if retry {
            info!("retrying initial graph load");
            self.state = AppState::Loading {
                rx: Self::spawn_load(&self.runtime, self.api.clone(), ctx.clone()),
            };
        }
    }
}

impl ViewModel {
    /// Applies everything the pollers and actions delivered since the last frame.
    fn drain_events(&mut self, ctx: &Context) {
        while let Ok(event) = self.events.try_recv() {
            let applied = self.data.apply(event);
            if let Some(kind) = applied.refresh {
                self.hub.refresh(kind);
            }
            if applied.tiers_changed && self.tab == Tab::Topology {
                ctx.request_repaint();
            }
        }
    }

    /// Starts the selected tab's channels and stops the rest when the tab changed.
    fn sync_polling(&mut self) {
        if self.polled_tab == Some(self.tab) {
            return;
        }
        info!(tab = self.tab.label(), "switching polled channels");
        self.hub.set_active_channels(self.tab.channels());
        if self.tab != Tab::Topology {
            self.overlay.stop();
        }
        self.polled_tab = Some(self.tab);
    }

    fn update_visibility(&self, ctx: &Context) {
        let minimized = ctx.input(|input| input.viewport().minimized.unwrap_or(false));
        self.visibility.set(!minimized);
    }

    fn refresh_dispatcher(&mut self) {
        self.dispatcher.refresh(ActivationContext {
            selected: self.selected.clone(),
            connected: self.data.connected(),
        });
    }

    fn dispatch(&mut self, intent: Intent) {
        self.data.begin_intent(&intent);
        self.actions.run(intent);
    }

    fn replace_graph(&mut self, graph: ServiceGraph) {
        self.reload_error = None;
        self.data.replace_graph(graph);
        self.hub.refresh(ChannelKind::Health);
    }

    fn set_selected(&mut self, selected: Option<String>) {
        if self.selected != selected {
            self.search_cache = None;
            self.selected = selected;
        }
    }
}
