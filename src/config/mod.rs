pub mod applicator;
pub mod loader;
pub mod schema;
pub mod version;

pub use applicator::{apply_recipe, ApplicationError};
pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{
    Metadata, NodeKind, Operation, Recipe, StepDefinition, ValidationError, ValidationIssue,
};
pub use version::{matches_requirement, workspace_version, VersionError};
