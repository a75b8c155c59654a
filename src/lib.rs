//! Nx Schematics: AST-located text splicing for Angular/Nx workspaces.
//!
//! Source files are parsed with tree-sitter's TypeScript grammar; change
//! planners locate constructs in the syntax tree and describe each mutation
//! as verified byte-span [`Change`]s; the patch applier splices them into
//! the original text, so comments and formatting outside the edited spans
//! survive untouched.
//!
//! # Architecture
//!
//! - [`ts`]: parsing and the [`SyntaxKind`]-tagged locator
//! - [`planner`]: one function per semantic mutation, returning changes
//! - [`change`]: the change model and the applier
//! - [`tree`]: a copy-on-write overlay over the workspace
//! - [`schematic`]: pipelines of steps over the overlay, and the ngrx schematic
//! - [`config`]: declarative TOML recipes built on the same pipeline
//!
//! # Safety
//!
//! - Every change verifies the text it replaces before applying
//! - Overlapping changes are rejected, never merged
//! - A failing step discards the whole run
//! - Commits are atomic per file and confined to the workspace
//!
//! # Example
//!
//! ```no_run
//! use nx_schematics::schematic::{generate_ngrx, NgrxOptions};
//! use nx_schematics::tree::VirtualTree;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tree = VirtualTree::open(".")?;
//! let options = NgrxOptions::new("user", "apps/demo/src/app/app.module.ts");
//! let (tree, reports) = generate_ngrx(tree, &options)?;
//! for report in &reports {
//!     println!("{}: {:?}", report.name, report.status);
//! }
//! tree.commit()?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod change;
pub mod config;
pub mod planner;
pub mod pool;
pub mod safety;
pub mod schematic;
pub mod sg;
pub mod tree;
pub mod ts;

// Re-exports
pub use change::{Change, ChangeError, ChangeOp, ChangeSet, Span, TextVerification};
pub use config::{
    apply_recipe, load_from_path, load_from_str, matches_requirement, ApplicationError,
    ConfigError, Recipe, VersionError,
};
pub use planner::PlanError;
pub use safety::{SafetyError, WorkspaceGuard};
pub use schematic::{generate_ngrx, NgrxOptions, Pipeline, SchematicError, StepReport, StepStatus};
pub use tree::{FileChange, TreeError, VirtualTree};
pub use ts::{SourceDocument, SyntaxKind, SyntaxNode, TreeSitterError};
