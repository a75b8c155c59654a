//! Sequential mutation pipeline over a [`VirtualTree`].
//!
//! Steps run in order and each one sees the overlay left by the previous
//! ones: a mutation step re-reads and re-parses its file, plans against that
//! snapshot and writes the spliced result back. The first failing step aborts
//! the run and the tree is dropped, so nothing reaches real storage.

use crate::change::{Change, ChangeError, ChangeSet};
use crate::planner::PlanError;
use crate::tree::{normalize, TreeError, VirtualTree};
use crate::ts::{introduced_errors, SourceDocument, TreeSitterError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchematicError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Change(#[from] ChangeError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Parse(#[from] TreeSitterError),

    #[error("step '{step}' introduced {count} syntax error(s) into {file}")]
    InvalidSyntax {
        step: String,
        file: String,
        count: usize,
    },

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("invalid JSON in {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{file}: {reason}")]
    Malformed { file: String, reason: String },
}

/// Plans the changes of one mutation step from a parsed snapshot.
pub type Planner<'a> = Box<dyn Fn(&SourceDocument) -> Result<Vec<Change>, PlanError> + 'a>;

/// Free-form step over the whole tree.
pub type TreeRule<'a> = Box<dyn Fn(&mut VirtualTree) -> Result<StepStatus, SchematicError> + 'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// The step changed the tree.
    Applied,
    /// The desired end state already held.
    Unchanged,
    /// The step decided not to run.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub name: String,
    pub file: Option<String>,
    pub status: StepStatus,
    /// Changes that touched text; 0 for non-mutation steps.
    pub changes: usize,
}

enum Action<'a> {
    Files(Vec<(String, String)>),
    Mutate { file: String, planner: Planner<'a> },
    MoveDir { from: String, to: String },
    Rule(TreeRule<'a>),
}

struct Step<'a> {
    name: String,
    action: Action<'a>,
}

pub struct Pipeline<'a> {
    name: String,
    steps: Vec<Step<'a>>,
    validate_syntax: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            validate_syntax: true,
        }
    }

    /// Instantiate files. Each path must not exist yet.
    pub fn files<I, P, C>(mut self, name: impl Into<String>, files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let files = files
            .into_iter()
            .map(|(path, content)| (normalize(&path.into()), content.into()))
            .collect();
        self.push(name, Action::Files(files))
    }

    /// Plan and apply changes to `file`, which must exist by the time the
    /// step runs.
    pub fn mutate<F>(self, name: impl Into<String>, file: &str, planner: F) -> Self
    where
        F: Fn(&SourceDocument) -> Result<Vec<Change>, PlanError> + 'a,
    {
        let file = normalize(file);
        self.push(
            name,
            Action::Mutate {
                file,
                planner: Box::new(planner),
            },
        )
    }

    /// Move every file below `from` to `to`.
    pub fn move_dir(self, name: impl Into<String>, from: &str, to: &str) -> Self {
        self.push(
            name,
            Action::MoveDir {
                from: normalize(from),
                to: normalize(to),
            },
        )
    }

    pub fn rule<F>(self, name: impl Into<String>, rule: F) -> Self
    where
        F: Fn(&mut VirtualTree) -> Result<StepStatus, SchematicError> + 'a,
    {
        self.push(name, Action::Rule(Box::new(rule)))
    }

    /// Add the steps built by `f` only when `condition` holds.
    pub fn when(self, condition: bool, f: impl FnOnce(Self) -> Self) -> Self {
        if condition {
            f(self)
        } else {
            self
        }
    }

    /// Accept mutation results even if they add parse errors.
    pub fn without_syntax_validation(mut self) -> Self {
        self.validate_syntax = false;
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn push(mut self, name: impl Into<String>, action: Action<'a>) -> Self {
        self.steps.push(Step {
            name: name.into(),
            action,
        });
        self
    }

    /// Run every step against `tree`. On success the updated tree is handed
    /// back for commit; on failure it is dropped with the error.
    pub fn run(
        self,
        mut tree: VirtualTree,
    ) -> Result<(VirtualTree, Vec<StepReport>), SchematicError> {
        let mut reports = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let report = match self.run_step(step, &mut tree) {
                Ok(report) => report,
                Err(err) => {
                    tracing::error!(
                        pipeline = %self.name,
                        step = %step.name,
                        error = %err,
                        "step failed"
                    );
                    return Err(err);
                }
            };
            tracing::info!(
                pipeline = %self.name,
                step = %report.name,
                status = ?report.status,
                changes = report.changes,
                "step finished"
            );
            reports.push(report);
        }
        Ok((tree, reports))
    }

    fn run_step(
        &self,
        step: &Step<'a>,
        tree: &mut VirtualTree,
    ) -> Result<StepReport, SchematicError> {
        let report = |file: Option<&str>, status: StepStatus, changes: usize| StepReport {
            name: step.name.clone(),
            file: file.map(str::to_string),
            status,
            changes,
        };

        match &step.action {
            Action::Files(files) => {
                for (path, content) in files {
                    tree.create(path, content.as_str())?;
                }
                Ok(report(None, StepStatus::Applied, files.len()))
            }
            Action::MoveDir { from, to } => {
                let moved = tree.move_dir(from, to)?;
                let status = if moved.is_empty() {
                    StepStatus::Unchanged
                } else {
                    StepStatus::Applied
                };
                Ok(report(None, status, moved.len()))
            }
            Action::Rule(rule) => Ok(report(None, rule(tree)?, 0)),
            Action::Mutate { file, planner } => {
                let content = tree.read_required(file)?;
                let doc = SourceDocument::parse(file.as_str(), content)?;

                let mut set = ChangeSet::new(file.as_str());
                set.extend(planner(&doc)?);
                let effective = set.effective_len();
                if effective == 0 {
                    return Ok(report(Some(file.as_str()), StepStatus::Unchanged, 0));
                }

                let updated = set.apply(doc.text())?;
                if self.validate_syntax {
                    let count = introduced_errors(&doc, &updated)?;
                    if count > 0 {
                        return Err(SchematicError::InvalidSyntax {
                            step: step.name.clone(),
                            file: file.clone(),
                            count,
                        });
                    }
                }
                tree.write(file, updated);
                Ok(report(Some(file.as_str()), StepStatus::Applied, effective))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{add_class, add_enum_members, extend_union_type, EnumMember};

    const ACTIONS: &str = "export enum FooActionTypes {\n  Foo = '[Foo] Action'\n}\n\nexport class Foo {}\n\nexport type FooActions = Foo;\n";

    #[test]
    fn later_steps_see_earlier_output() {
        let mut tree = VirtualTree::in_memory();
        tree.write("foo.actions.ts", ACTIONS);

        let (tree, reports) = Pipeline::new("test")
            .mutate("members", "foo.actions.ts", |doc| {
                add_enum_members(doc, "FooActionTypes", &[EnumMember::new("LoadData")])
            })
            .mutate("class", "foo.actions.ts", |doc| {
                add_class(doc, "LoadData", "export class LoadData {}")
            })
            .mutate("union", "foo.actions.ts", |doc| {
                // the class only exists after the previous step
                assert!(doc.text().contains("class LoadData"));
                extend_union_type(doc, "FooActions", &["LoadData"])
            })
            .run(tree)
            .unwrap();

        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| r.status == StepStatus::Applied));
        let output = tree.read_required("foo.actions.ts").unwrap();
        assert!(output.contains("type FooActions = Foo | LoadData;"));
    }

    #[test]
    fn noop_step_reports_unchanged() {
        let mut tree = VirtualTree::in_memory();
        tree.write("foo.actions.ts", ACTIONS);

        let (_, reports) = Pipeline::new("test")
            .mutate("class", "foo.actions.ts", |doc| add_class(doc, "Foo", "class Foo {}"))
            .run(tree)
            .unwrap();

        assert_eq!(reports[0].status, StepStatus::Unchanged);
    }

    #[test]
    fn missing_file_aborts() {
        let result = Pipeline::new("test")
            .mutate("class", "missing.ts", |doc| add_class(doc, "A", "class A {}"))
            .run(VirtualTree::in_memory());

        assert!(matches!(
            result,
            Err(SchematicError::Tree(TreeError::MissingFile { .. }))
        ));
    }

    #[test]
    fn planner_error_aborts_remaining_steps() {
        let mut tree = VirtualTree::in_memory();
        tree.write("foo.actions.ts", ACTIONS);

        let result = Pipeline::new("test")
            .mutate("dup", "foo.actions.ts", |doc| {
                add_enum_members(doc, "FooActionTypes", &[EnumMember::new("Foo")])
            })
            .rule("never", |_| panic!("must not run after a failure"))
            .run(tree);

        assert!(matches!(
            result,
            Err(SchematicError::Plan(PlanError::DuplicateMember { .. }))
        ));
    }

    #[test]
    fn syntax_breaking_change_is_rejected() {
        let mut tree = VirtualTree::in_memory();
        tree.write("foo.actions.ts", ACTIONS);

        let result = Pipeline::new("test")
            .mutate("broken", "foo.actions.ts", |doc| {
                add_class(doc, "Broken", "export class Broken {{{")
            })
            .run(tree);

        assert!(matches!(result, Err(SchematicError::InvalidSyntax { .. })));
    }

    #[test]
    fn files_then_move_then_conditional_rule() {
        let (tree, reports) = Pipeline::new("test")
            .files("templates", vec![("app/foo/foo.ts", "export const a = 1;\n")])
            .move_dir("move", "app/foo", "libs/foo/src/+state")
            .when(false, |p| p.rule("skipped", |_| Ok(StepStatus::Applied)))
            .run(VirtualTree::in_memory())
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert!(tree.exists("libs/foo/src/+state/foo.ts"));
        assert!(!tree.exists("app/foo/foo.ts"));
    }
}
