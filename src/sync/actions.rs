use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::backend::DashboardApi;
use crate::backend::payload::{
    AnalyzeReport, InsightStatus, ScaleDirection, ScaleReport, ValidationRecord,
};

use super::{ChannelKind, SyncEvent, SyncSink};

/// A user-triggered request to the backend.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    Analyze {
        service: String,
    },
    Scale {
        service: String,
        direction: ScaleDirection,
        instance_count: u32,
    },
    GenerateInsights {
        service: Option<String>,
    },
    SetInsightStatus {
        insight_id: String,
        status: InsightStatus,
    },
    SimulateLoad {
        count: u32,
    },
    ClusterTick,
    RunValidation,
}

impl Intent {
    /// The channel whose data this intent changes on the backend.
    pub fn refreshes(&self) -> ChannelKind {
        match self {
            Self::Analyze { .. } | Self::Scale { .. } => ChannelKind::Health,
            Self::GenerateInsights { .. } | Self::SetInsightStatus { .. } => ChannelKind::Insights,
            Self::SimulateLoad { .. } | Self::ClusterTick => ChannelKind::Cluster,
            Self::RunValidation => ChannelKind::Scaling,
        }
    }

    /// Service the intent is about, when there is one.
    pub fn service(&self) -> Option<&str> {
        match self {
            Self::Analyze { service } | Self::Scale { service, .. } => Some(service),
            Self::GenerateInsights { service } => service.as_deref(),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Analyze { service } => format!("analyze {service}"),
            Self::Scale {
                service,
                direction,
                instance_count,
            } => format!("scale {service} {direction:?} to {instance_count}"),
            Self::GenerateInsights { service: Some(service) } => {
                format!("generate insights for {service}")
            }
            Self::GenerateInsights { service: None } => "generate insights".to_owned(),
            Self::SetInsightStatus { insight_id, status } => {
                format!("mark insight {insight_id} {status:?}")
            }
            Self::SimulateLoad { count } => format!("simulate load x{count}"),
            Self::ClusterTick => "cluster tick".to_owned(),
            Self::RunValidation => "run validation".to_owned(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum ActionReport {
    Analysis(AnalyzeReport),
    Scale(ScaleReport),
    Validation(ValidationRecord),
    Ack(Value),
}

/// Fires intents on the runtime without blocking the caller. Completion arrives as
/// [`SyncEvent::ActionFinished`].
#[derive(Clone)]
pub struct ActionRunner<A> {
    api: A,
    runtime: Handle,
    sink: SyncSink,
}

impl<A: DashboardApi> ActionRunner<A> {
    pub fn new(api: A, runtime: Handle, sink: SyncSink) -> Self {
        Self { api, runtime, sink }
    }

    pub fn run(&self, intent: Intent) {
        info!(intent = %intent.label(), "dispatching action");
        let request = self.request(&intent);
        let sink = self.sink.clone();

        self.runtime.spawn(async move {
            let result = request.await.map_err(|error| {
                warn!(intent = %intent.label(), error = %error, "action failed");
                error.to_string()
            });
            sink.send(SyncEvent::ActionFinished { intent, result });
        });
    }

    fn request(
        &self,
        intent: &Intent,
    ) -> BoxFuture<'static, Result<ActionReport, crate::backend::FetchError>> {
        match intent.clone() {
            Intent::Analyze { service } => self
                .api
                .analyze(service)
                .map(|result| result.map(ActionReport::Analysis))
                .boxed(),
            Intent::Scale {
                service,
                direction,
                instance_count,
            } => self
                .api
                .scale(service, direction, instance_count)
                .map(|result| result.map(ActionReport::Scale))
                .boxed(),
            Intent::GenerateInsights { service } => self
                .api
                .generate_insights(service)
                .map(|result| result.map(ActionReport::Ack))
                .boxed(),
            Intent::SetInsightStatus { insight_id, status } => self
                .api
                .set_insight_status(insight_id, status)
                .map(|result| result.map(ActionReport::Ack))
                .boxed(),
            Intent::SimulateLoad { count } => self
                .api
                .simulate_load(count)
                .map(|result| result.map(ActionReport::Ack))
                .boxed(),
            Intent::ClusterTick => self
                .api
                .cluster_tick()
                .map(|result| result.map(ActionReport::Ack))
                .boxed(),
            Intent::RunValidation => self
                .api
                .run_validation()
                .map(|result| result.map(ActionReport::Validation))
                .boxed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;
    use crate::backend::mock::MockApi;

    #[tokio::test]
    async fn finished_action_reports_back_with_its_intent() {
        let api = MockApi::default();
        let (tx, rx) = mpsc::channel();
        let runner = ActionRunner::new(api.clone(), Handle::current(), SyncSink::new(tx, None));

        let intent = Intent::Scale {
            service: "orders".into(),
            direction: ScaleDirection::Up,
            instance_count: 3,
        };
        runner.run(intent.clone());

        let event = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(5)))
            .await
            .expect("join")
            .expect("action event");
        match event {
            SyncEvent::ActionFinished {
                intent: finished,
                result,
            } => {
                assert_eq!(finished, intent);
                assert!(matches!(result, Ok(ActionReport::Scale(_))));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(api.call_count("scale"), 1);
    }

    #[test]
    fn intents_refresh_their_owning_channel() {
        assert_eq!(
            Intent::Analyze {
                service: "a".into()
            }
            .refreshes(),
            ChannelKind::Health
        );
        assert_eq!(
            Intent::SetInsightStatus {
                insight_id: "i".into(),
                status: InsightStatus::Resolved,
            }
            .refreshes(),
            ChannelKind::Insights
        );
        assert_eq!(Intent::ClusterTick.refreshes(), ChannelKind::Cluster);
        assert_eq!(Intent::RunValidation.refreshes(), ChannelKind::Scaling);
    }
}
