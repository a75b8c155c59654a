//! Recipe applicator: turns a [`Recipe`] into a [`Pipeline`] and runs it.
//!
//! Every step becomes one mutation step of the pipeline, so the changes of
//! a step are planned against a single snapshot of its file and applied as
//! one change set, and later steps see earlier output. Version gating
//! happens up front: a workspace outside the recipe's `version_range`
//! yields a `Skipped` report for every step and no writes.

use crate::change::Change;
use crate::config::schema::{Operation, Recipe, StepDefinition, ValidationError};
use crate::config::version::{matches_requirement, workspace_version, VersionError};
use crate::planner::{
    add_class, add_constructor_parameter, add_enum_members, add_switch_case, add_to_ng_module,
    extend_union_type, insert_before_constructor, insert_default_import, insert_named_imports,
    remove_node, rename_function, replace_pattern, PlanError,
};
use crate::schematic::{Pipeline, SchematicError, StepReport, StepStatus};
use crate::tree::VirtualTree;
use crate::ts::SourceDocument;
use std::fmt;

/// Errors while applying a recipe
#[derive(Debug)]
pub enum ApplicationError {
    /// The recipe failed validation
    Invalid(ValidationError),
    /// Version gating error
    Version(VersionError),
    /// A step failed; nothing was written
    Step(SchematicError),
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationError::Invalid(e) => write!(f, "invalid recipe: {}", e),
            ApplicationError::Version(e) => write!(f, "version error: {}", e),
            ApplicationError::Step(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ApplicationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplicationError::Invalid(e) => Some(e),
            ApplicationError::Version(e) => Some(e),
            ApplicationError::Step(e) => Some(e),
        }
    }
}

impl From<VersionError> for ApplicationError {
    fn from(e: VersionError) -> Self {
        ApplicationError::Version(e)
    }
}

impl From<SchematicError> for ApplicationError {
    fn from(e: SchematicError) -> Self {
        ApplicationError::Step(e)
    }
}

/// Apply `recipe` to `tree`.
///
/// Returns the updated tree (not yet committed) and one report per step.
pub fn apply_recipe(
    recipe: &Recipe,
    tree: VirtualTree,
) -> Result<(VirtualTree, Vec<StepReport>), ApplicationError> {
    recipe.validate().map_err(ApplicationError::Invalid)?;

    if let Some(reason) = version_mismatch(recipe, &tree)? {
        tracing::warn!(recipe = %recipe.meta.name, %reason, "recipe skipped");
        let reports = recipe
            .steps
            .iter()
            .map(|step| StepReport {
                name: step.id.clone(),
                file: Some(step.file.clone()),
                status: StepStatus::Skipped,
                changes: 0,
            })
            .collect();
        return Ok((tree, reports));
    }

    let name = if recipe.meta.name.is_empty() {
        "recipe"
    } else {
        recipe.meta.name.as_str()
    };
    let pipeline = recipe.steps.iter().fold(Pipeline::new(name), |pipeline, step| {
        pipeline.mutate(step.id.as_str(), &step.file, move |doc| plan_step(step, doc))
    });
    Ok(pipeline.run(tree)?)
}

/// `Some(reason)` when the workspace is outside the recipe's version range.
fn version_mismatch(recipe: &Recipe, tree: &VirtualTree) -> Result<Option<String>, VersionError> {
    let Some(range) = recipe
        .meta
        .version_range
        .as_deref()
        .map(str::trim)
        .filter(|range| !range.is_empty())
    else {
        return Ok(None);
    };

    let Some(version) = workspace_version(tree)? else {
        return Ok(Some(format!(
            "workspace has no package.json version to check against {range}"
        )));
    };
    if matches_requirement(&version, Some(range))? {
        Ok(None)
    } else {
        Ok(Some(format!(
            "workspace version {version} does not satisfy version_range {range}"
        )))
    }
}

fn plan_step(step: &StepDefinition, doc: &SourceDocument) -> Result<Vec<Change>, PlanError> {
    let mut changes = Vec::new();
    for operation in &step.changes {
        let planned = plan_operation(operation, doc)?;
        tracing::debug!(
            step = %step.id,
            operation = operation.type_name(),
            changes = planned.len(),
            "planned operation"
        );
        changes.extend(planned);
    }
    Ok(changes)
}

fn plan_operation(operation: &Operation, doc: &SourceDocument) -> Result<Vec<Change>, PlanError> {
    match operation {
        Operation::AddEnumMembers { enum_name, members } => {
            add_enum_members(doc, enum_name, members)
        }
        Operation::AddClass { class_name, source } => add_class(doc, class_name, source),
        Operation::ExtendUnion { type_name, members } => {
            extend_union_type(doc, type_name, members)
        }
        Operation::InsertImport {
            symbols,
            module,
            default: true,
        } => match symbols.first() {
            Some(symbol) => insert_default_import(doc, symbol, module),
            None => Ok(Vec::new()),
        },
        Operation::InsertImport {
            symbols, module, ..
        } => insert_named_imports(doc, symbols, module),
        Operation::RenameFunction {
            function_name,
            new_name,
            retarget_from,
            retarget_to,
        } => rename_function(
            doc,
            function_name,
            new_name,
            retarget_from.as_deref().zip(retarget_to.as_deref()),
        ),
        Operation::RemoveNode { kind, name } => remove_node(doc, (*kind).into(), name),
        Operation::AddConstructorParameter {
            class_name,
            parameter,
        } => add_constructor_parameter(doc, class_name.as_deref(), parameter),
        Operation::InsertBeforeConstructor { class_name, text } => {
            insert_before_constructor(doc, class_name.as_deref(), text)
        }
        Operation::AddSwitchCase {
            function_name,
            label,
            source,
        } => add_switch_case(doc, function_name.as_deref(), label, source),
        Operation::AddToNgModule {
            property,
            expressions,
        } => add_to_ng_module(doc, property, expressions),
        Operation::ReplacePattern {
            pattern,
            replacement,
            function_name,
        } => replace_pattern(doc, pattern, replacement, function_name.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::load_from_str;

    const ACTIONS: &str = "import { Action } from '@ngrx/store';\n\nexport enum UserActionTypes {\n  UserAction = '[User] Action'\n}\n\nexport class User implements Action {\n  readonly type = UserActionTypes.UserAction;\n}\n\nexport type UserActions = User;\n";
    const ACTIONS_PATH: &str = "libs/user/src/+state/user.actions.ts";

    const RECIPE: &str = r#"
[meta]
name = "reset-action"
version_range = ">=6.0.0"

[[steps]]
id = "actions"
file = "libs/user/src/+state/user.actions.ts"

[[steps.changes]]
type = "add-enum-members"
enum_name = "UserActionTypes"
members = [{ name = "Reset", value = "[User] Reset" }]

[[steps.changes]]
type = "add-class"
class_name = "Reset"
source = "export class Reset implements Action {\n  readonly type = UserActionTypes.Reset;\n}"

[[steps.changes]]
type = "extend-union"
type_name = "UserActions"
members = ["Reset"]
"#;

    fn workspace(version: &str) -> VirtualTree {
        let mut tree = VirtualTree::in_memory();
        tree.write("package.json", format!("{{\"name\": \"ws\", \"version\": \"{version}\"}}"));
        tree.write(ACTIONS_PATH, ACTIONS);
        tree
    }

    #[test]
    fn applies_all_changes_of_a_step_together() {
        let recipe = load_from_str(RECIPE).unwrap();
        let (tree, reports) = apply_recipe(&recipe, workspace("6.0.2")).unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].status, StepStatus::Applied);
        assert_eq!(reports[0].changes, 3);

        let output = tree.read_required(ACTIONS_PATH).unwrap();
        assert!(output.contains("UserAction = '[User] Action', Reset = '[User] Reset'"));
        assert!(output.contains("export class Reset implements Action"));
        assert!(output.contains("export type UserActions = User | Reset;"));
    }

    #[test]
    fn version_mismatch_skips_every_step() {
        let recipe = load_from_str(RECIPE).unwrap();
        let (tree, reports) = apply_recipe(&recipe, workspace("5.2.9")).unwrap();

        assert!(reports.iter().all(|r| r.status == StepStatus::Skipped));
        assert_eq!(tree.read_required(ACTIONS_PATH).unwrap(), ACTIONS);
    }

    #[test]
    fn missing_workspace_version_skips() {
        let recipe = load_from_str(RECIPE).unwrap();
        let mut tree = VirtualTree::in_memory();
        tree.write(ACTIONS_PATH, ACTIONS);

        let (_, reports) = apply_recipe(&recipe, tree).unwrap();
        assert_eq!(reports[0].status, StepStatus::Skipped);
    }

    #[test]
    fn reapplying_fails_on_duplicate_member() {
        let recipe = load_from_str(RECIPE).unwrap();
        let (tree, _) = apply_recipe(&recipe, workspace("6.0.2")).unwrap();

        let err = apply_recipe(&recipe, tree).unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Step(SchematicError::Plan(PlanError::DuplicateMember { .. }))
        ));
    }

    #[test]
    fn later_steps_see_earlier_output() {
        let recipe = load_from_str(
            r#"
[[steps]]
id = "class"
file = "libs/user/src/+state/user.actions.ts"

[[steps.changes]]
type = "add-class"
class_name = "Reset"
source = "export class Reset {}"

[[steps]]
id = "rename"
file = "libs/user/src/+state/user.actions.ts"

[[steps.changes]]
type = "replace-pattern"
pattern = "export class Reset {}"
replacement = "export class ResetAll {}"
"#,
        )
        .unwrap();

        let (tree, reports) = apply_recipe(&recipe, workspace("6.0.0")).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(tree
            .read_required(ACTIONS_PATH)
            .unwrap()
            .contains("export class ResetAll {}"));
    }

    #[test]
    fn invalid_recipe_is_rejected_before_running() {
        let err = apply_recipe(&Recipe::default(), VirtualTree::in_memory()).unwrap_err();
        assert!(matches!(err, ApplicationError::Invalid(_)));
    }
}
