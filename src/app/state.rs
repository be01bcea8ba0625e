use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::backend::payload::{
    ActivityEvent, AnalyzeReport, ClusterStatus, Insight, Pattern, ScaleEvent, ScaleReport,
    ValidationRecord,
};
use crate::config::ANNOTATION_CAPACITY;
use crate::sync::{ActionReport, ChannelKind, ChannelState, ChannelUpdate, Intent, SyncEvent};
use crate::topology::{Annotation, AnnotationLog, HealthTier, ServiceGraph};
use crate::util::unix_now;

/// Outcome of the last finished action, for the status line.
#[derive(Clone, Debug)]
pub(in crate::app) struct ActionOutcome {
    pub label: String,
    pub result: Result<String, String>,
}

/// Everything the UI shows, owned by the UI thread and mutated only by [`DashboardState::apply`]
/// and intent bookkeeping.
pub(in crate::app) struct DashboardState {
    pub graph: ServiceGraph,
    pub channels: HashMap<ChannelKind, ChannelState>,
    pub insights: Vec<Insight>,
    pub patterns: Vec<Pattern>,
    pub recommendations: Vec<Insight>,
    pub activity: Vec<ActivityEvent>,
    pub cluster: Option<ClusterStatus>,
    pub scale_events: Vec<ScaleEvent>,
    pub validations: Vec<ValidationRecord>,
    pub annotations: AnnotationLog,
    /// Services with a scale request outstanding.
    pub rolling: HashSet<String>,
    pub pending_actions: usize,
    pub last_action: Option<ActionOutcome>,
}

/// What the shell has to do after an event was applied.
#[derive(Debug, Default, PartialEq, Eq)]
pub(in crate::app) struct Applied {
    pub tiers_changed: bool,
    pub refresh: Option<ChannelKind>,
}

impl DashboardState {
    pub fn new(graph: ServiceGraph) -> Self {
        Self {
            graph,
            channels: ChannelKind::ALL
                .into_iter()
                .map(|kind| (kind, ChannelState::pending()))
                .collect(),
            insights: Vec::new(),
            patterns: Vec::new(),
            recommendations: Vec::new(),
            activity: Vec::new(),
            cluster: None,
            scale_events: Vec::new(),
            validations: Vec::new(),
            annotations: AnnotationLog::new(ANNOTATION_CAPACITY),
            rolling: HashSet::new(),
            pending_actions: 0,
            last_action: None,
        }
    }

    pub fn channel(&self, kind: ChannelKind) -> Option<&ChannelState> {
        self.channels.get(&kind)
    }

    /// Backend counts as reachable once health answered and its latest poll did not fail.
    pub fn connected(&self) -> bool {
        self.channel(ChannelKind::Health)
            .is_some_and(|state| state.last_success.is_some() && state.last_error.is_none())
    }

    /// Tier used for drawing: an outstanding scale request overrides the polled tier.
    pub fn display_tier(&self, id: &str) -> Option<HealthTier> {
        if self.rolling.contains(id) {
            return Some(HealthTier::Rolling);
        }
        self.graph.nodes.get(id).map(|node| node.health)
    }

    pub fn replace_graph(&mut self, graph: ServiceGraph) {
        self.rolling.retain(|id| graph.nodes.contains_key(id));
        self.graph = graph;
    }

    /// Bookkeeping before an intent is sent.
    pub fn begin_intent(&mut self, intent: &Intent) {
        self.pending_actions += 1;
        if let Intent::Scale { service, .. } = intent {
            self.rolling.insert(service.clone());
        }
    }

    pub fn apply(&mut self, event: SyncEvent) -> Applied {
        match event {
            SyncEvent::Phase { channel, phase } => {
                self.channels.entry(channel).or_default().observe(phase);
                Applied::default()
            }
            SyncEvent::Update(update) => self.apply_update(update),
            SyncEvent::ActionFinished { intent, result } => self.finish_action(intent, result),
        }
    }

    fn apply_update(&mut self, update: ChannelUpdate) -> Applied {
        let mut applied = Applied::default();
        match update {
            ChannelUpdate::Health(samples) => {
                let changes = self.graph.apply_health(&samples);
                if changes > 0 {
                    debug!(changes, "health tiers changed");
                }
                applied.tiers_changed = changes > 0;
            }
            ChannelUpdate::Insights(insights) => self.insights = insights,
            ChannelUpdate::Patterns(patterns) => self.patterns = patterns,
            ChannelUpdate::Recommendations(recommendations) => {
                self.recommendations = recommendations;
            }
            ChannelUpdate::Activity(activity) => self.activity = activity,
            ChannelUpdate::ClusterStatus(status) => self.cluster = Some(status),
            ChannelUpdate::ScaleEvents(events) => self.scale_events = events,
            ChannelUpdate::Validations(validations) => self.validations = validations,
        }
        applied
    }

    fn finish_action(
        &mut self,
        intent: Intent,
        result: Result<ActionReport, String>,
    ) -> Applied {
        self.pending_actions = self.pending_actions.saturating_sub(1);
        let mut tiers_changed = false;
        if let Intent::Scale { service, .. } = &intent {
            tiers_changed = self.rolling.remove(service);
        }

        let summary = match &result {
            Ok(ActionReport::Analysis(report)) => {
                let message = analysis_message(report);
                if let Some(service) = report.service.as_deref().or(intent.service()) {
                    self.annotate(service, message.clone());
                }
                Ok(message)
            }
            Ok(ActionReport::Scale(report)) => {
                let message = scale_message(report);
                if let Some(service) = report.service.as_deref().or(intent.service()) {
                    let service = service.to_owned();
                    if let Some(after) = report.instance_after {
                        self.graph.set_replicas(&service, after);
                    }
                    self.annotate(&service, message.clone());
                }
                Ok(message)
            }
            Ok(ActionReport::Validation(record)) => {
                self.validations.insert(0, record.clone());
                Ok(format!(
                    "{}/{} endpoints passed",
                    record.endpoints_passed, record.endpoints_tested
                ))
            }
            Ok(ActionReport::Ack(_)) => Ok("done".to_owned()),
            Err(error) => Err(error.clone()),
        };

        info!(intent = %intent.label(), ok = summary.is_ok(), "action finished");
        self.last_action = Some(ActionOutcome {
            label: intent.label(),
            result: summary,
        });

        Applied {
            tiers_changed,
            refresh: Some(intent.refreshes()),
        }
    }

    fn annotate(&mut self, node_id: &str, message: String) {
        if !self.graph.nodes.contains_key(node_id) {
            return;
        }
        self.annotations.push(Annotation {
            node_id: node_id.to_owned(),
            message,
            timestamp: unix_now(),
        });
    }
}

fn analysis_message(report: &AnalyzeReport) -> String {
    match (&report.root_cause, &report.recommended_action) {
        (Some(cause), Some(action)) => format!("{cause} → {action}"),
        (Some(cause), None) => cause.clone(),
        (None, Some(action)) => action.clone(),
        (None, None) => report
            .status
            .clone()
            .unwrap_or_else(|| "analysis complete".to_owned()),
    }
}

fn scale_message(report: &ScaleReport) -> String {
    let direction = report.direction.as_deref().unwrap_or("scaled");
    match (report.instance_before, report.instance_after) {
        (Some(before), Some(after)) => format!("{direction} {before} → {after}"),
        _ => report
            .verdict
            .clone()
            .unwrap_or_else(|| direction.to_owned()),
    }
}
