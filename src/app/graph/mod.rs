mod build;
mod interaction;
mod plan;
mod view;

pub(in crate::app) use plan::RenderPlan;
#[cfg(test)]
pub(in crate::app) use plan::{Emphasis, NodeGlyph};
