//! Backend synchronization: one poller task per data channel, plus the action runner for
//! user-triggered intents. Everything produced here reaches the UI thread as a [`SyncEvent`].

pub mod actions;
pub mod activity;
mod channels;
mod hub;
mod poller;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::time::Instant;

use eframe::egui::Context;

use crate::backend::payload::{
    ActivityEvent, ClusterStatus, HealthSample, Insight, Pattern, ScaleEvent, ValidationRecord,
};

pub use actions::{ActionReport, ActionRunner, Intent};
pub use hub::ChannelHub;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Health,
    Insights,
    Activity,
    Cluster,
    Scaling,
}

impl ChannelKind {
    pub const ALL: [Self; 5] = [
        Self::Health,
        Self::Insights,
        Self::Activity,
        Self::Cluster,
        Self::Scaling,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Insights => "insights",
            Self::Activity => "activity",
            Self::Cluster => "cluster",
            Self::Scaling => "scaling",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChannelPhase {
    Fetching,
    Idle,
    Failed(String),
}

/// One slice of fresh data. Each endpoint of a channel produces its own variant so a failed
/// sibling never blocks it.
#[derive(Clone, Debug)]
pub enum ChannelUpdate {
    Health(Vec<HealthSample>),
    Insights(Vec<Insight>),
    Patterns(Vec<Pattern>),
    Recommendations(Vec<Insight>),
    Activity(Vec<ActivityEvent>),
    ClusterStatus(ClusterStatus),
    ScaleEvents(Vec<ScaleEvent>),
    Validations(Vec<ValidationRecord>),
}

#[derive(Debug)]
pub enum SyncEvent {
    Phase {
        channel: ChannelKind,
        phase: ChannelPhase,
    },
    Update(ChannelUpdate),
    ActionFinished {
        intent: Intent,
        result: Result<ActionReport, String>,
    },
}

/// UI-side bookkeeping for one channel.
#[derive(Clone, Debug, Default)]
pub struct ChannelState {
    pub loading: bool,
    pub in_flight: bool,
    pub last_error: Option<String>,
    pub last_success: Option<Instant>,
}

impl ChannelState {
    pub fn pending() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    pub fn observe(&mut self, phase: ChannelPhase) {
        match phase {
            ChannelPhase::Fetching => self.in_flight = true,
            ChannelPhase::Idle => {
                self.in_flight = false;
                self.loading = false;
                self.last_error = None;
                self.last_success = Some(Instant::now());
            }
            ChannelPhase::Failed(error) => {
                self.in_flight = false;
                self.loading = false;
                self.last_error = Some(error);
            }
        }
    }
}

/// Shared "is anyone looking" flag. Written by the window, read by every poller on each tick.
#[derive(Clone, Debug)]
pub struct Visibility(Arc<AtomicBool>);

impl Visibility {
    pub fn new(visible: bool) -> Self {
        Self(Arc::new(AtomicBool::new(visible)))
    }

    pub fn set(&self, visible: bool) {
        self.0.store(visible, Ordering::Relaxed);
    }

    pub fn is_visible(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Delivers events to the UI thread and wakes it up.
#[derive(Clone)]
pub struct SyncSink {
    tx: Sender<SyncEvent>,
    repaint: Option<Context>,
}

impl SyncSink {
    pub fn new(tx: Sender<SyncEvent>, repaint: Option<Context>) -> Self {
        Self { tx, repaint }
    }

    pub fn send(&self, event: SyncEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("sync receiver dropped; discarding event");
            return;
        }
        if let Some(ctx) = &self.repaint {
            ctx.request_repaint();
        }
    }
}
