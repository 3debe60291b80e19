//! Pipeline assembly and execution.
//!
//! [`PipelineBuilder`] validates a stage list into a [`StageGraph`], which
//! executes it with ready-set scheduling and returns a [`PipelineResult`].
//! [`presets`] holds the canonical stage lists for the two shipped pipeline
//! shapes.

mod builder;
mod graph;
pub mod presets;
mod result;

pub use builder::PipelineBuilder;
pub use graph::StageGraph;
pub use result::PipelineResult;
