mod annotations;
mod graph;
pub mod mapper;
mod positions;

pub use annotations::{Annotation, AnnotationLog};
pub use graph::ServiceGraph;
pub use mapper::{HealthTier, NodeCategory};
pub use positions::PositionCache;
