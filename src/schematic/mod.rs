//! Orchestration: pipelines of planner-driven steps over a virtual tree, and
//! the schematics built from them.

pub mod names;
pub mod ngrx;
pub mod package_json;
pub mod pipeline;
pub mod templates;

pub use names::{names, Names};
pub use ngrx::{generate_ngrx, NgrxOptions};
pub use package_json::add_dependencies;
pub use pipeline::{Pipeline, Planner, SchematicError, StepReport, StepStatus, TreeRule};
