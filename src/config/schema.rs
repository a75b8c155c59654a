use crate::planner::EnumMember;
use crate::ts::SyntaxKind;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// A declarative list of mutation steps, read from TOML.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Recipe {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

impl Recipe {
    /// Check every step and report all issues at once.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.steps.is_empty() {
            issues.push(ValidationIssue::EmptyStepList);
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            let id = step.id.trim();
            let step_id = (!id.is_empty()).then(|| step.id.clone());

            if id.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    step_id: None,
                    field: "id",
                });
            } else if !seen.insert(id) {
                issues.push(ValidationIssue::InvalidCombo {
                    step_id: step_id.clone(),
                    message: "step id is used more than once".to_string(),
                });
            }
            if step.file.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    step_id: step_id.clone(),
                    field: "file",
                });
            }
            if step.changes.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    step_id: step_id.clone(),
                    field: "changes",
                });
            }

            for operation in &step.changes {
                operation.validate(&step_id, &mut issues);
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Semver requirement on the `version` of the workspace `package.json`.
    #[serde(default)]
    pub version_range: Option<String>,
}

/// One step: every change is planned against the same snapshot of `file`
/// and applied together.
#[derive(Debug, Deserialize, Clone)]
pub struct StepDefinition {
    pub id: String,
    pub file: String,
    #[serde(default)]
    pub changes: Vec<Operation>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Operation {
    AddEnumMembers {
        enum_name: String,
        members: Vec<EnumMember>,
    },
    AddClass {
        class_name: String,
        source: String,
    },
    ExtendUnion {
        type_name: String,
        members: Vec<String>,
    },
    InsertImport {
        symbols: Vec<String>,
        module: String,
        /// Import the single symbol as the module's default export.
        #[serde(default)]
        default: bool,
    },
    RenameFunction {
        function_name: String,
        new_name: String,
        #[serde(default)]
        retarget_from: Option<String>,
        #[serde(default)]
        retarget_to: Option<String>,
    },
    RemoveNode {
        kind: NodeKind,
        name: String,
    },
    AddConstructorParameter {
        #[serde(default)]
        class_name: Option<String>,
        parameter: String,
    },
    InsertBeforeConstructor {
        #[serde(default)]
        class_name: Option<String>,
        text: String,
    },
    AddSwitchCase {
        #[serde(default)]
        function_name: Option<String>,
        label: String,
        source: String,
    },
    AddToNgModule {
        property: String,
        expressions: Vec<String>,
    },
    ReplacePattern {
        pattern: String,
        replacement: String,
        /// Only match inside this function declaration.
        #[serde(default)]
        function_name: Option<String>,
    },
}

impl Operation {
    pub fn type_name(&self) -> &'static str {
        match self {
            Operation::AddEnumMembers { .. } => "add-enum-members",
            Operation::AddClass { .. } => "add-class",
            Operation::ExtendUnion { .. } => "extend-union",
            Operation::InsertImport { .. } => "insert-import",
            Operation::RenameFunction { .. } => "rename-function",
            Operation::RemoveNode { .. } => "remove-node",
            Operation::AddConstructorParameter { .. } => "add-constructor-parameter",
            Operation::InsertBeforeConstructor { .. } => "insert-before-constructor",
            Operation::AddSwitchCase { .. } => "add-switch-case",
            Operation::AddToNgModule { .. } => "add-to-ng-module",
            Operation::ReplacePattern { .. } => "replace-pattern",
        }
    }

    fn validate(&self, step_id: &Option<String>, issues: &mut Vec<ValidationIssue>) {
        let mut require = |value: &str, field: &'static str| {
            if value.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    step_id: step_id.clone(),
                    field,
                });
            }
        };

        match self {
            Operation::AddEnumMembers { enum_name, members } => {
                require(enum_name, "changes.enum_name");
                if members.is_empty() {
                    require("", "changes.members");
                }
                for member in members {
                    require(&member.name, "changes.members.name");
                }
            }
            Operation::AddClass { class_name, source } => {
                require(class_name, "changes.class_name");
                require(source, "changes.source");
            }
            Operation::ExtendUnion { type_name, members } => {
                require(type_name, "changes.type_name");
                if members.is_empty() {
                    require("", "changes.members");
                }
            }
            Operation::InsertImport {
                symbols,
                module,
                default,
            } => {
                require(module, "changes.module");
                if symbols.is_empty() {
                    require("", "changes.symbols");
                }
                if *default && symbols.len() > 1 {
                    issues.push(ValidationIssue::InvalidCombo {
                        step_id: step_id.clone(),
                        message: "a default import takes exactly one symbol".to_string(),
                    });
                }
            }
            Operation::RenameFunction {
                function_name,
                new_name,
                retarget_from,
                retarget_to,
            } => {
                require(function_name, "changes.function_name");
                require(new_name, "changes.new_name");
                if retarget_from.is_some() != retarget_to.is_some() {
                    issues.push(ValidationIssue::InvalidCombo {
                        step_id: step_id.clone(),
                        message: "retarget_from and retarget_to must be given together"
                            .to_string(),
                    });
                }
            }
            Operation::RemoveNode { name, .. } => require(name, "changes.name"),
            Operation::AddConstructorParameter { parameter, .. } => {
                require(parameter, "changes.parameter")
            }
            Operation::InsertBeforeConstructor { text, .. } => require(text, "changes.text"),
            Operation::AddSwitchCase { label, source, .. } => {
                require(label, "changes.label");
                require(source, "changes.source");
            }
            Operation::AddToNgModule {
                property,
                expressions,
            } => {
                require(property, "changes.property");
                if expressions.is_empty() {
                    require("", "changes.expressions");
                }
            }
            Operation::ReplacePattern {
                pattern,
                replacement,
                ..
            } => {
                require(pattern, "changes.pattern");
                require(replacement, "changes.replacement");
            }
        }
    }
}

/// Declarations a recipe may remove.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Interface,
    Class,
    Enum,
    Function,
    TypeAlias,
}

impl From<NodeKind> for SyntaxKind {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Interface => SyntaxKind::InterfaceDeclaration,
            NodeKind::Class => SyntaxKind::ClassDeclaration,
            NodeKind::Enum => SyntaxKind::EnumDeclaration,
            NodeKind::Function => SyntaxKind::FunctionDeclaration,
            NodeKind::TypeAlias => SyntaxKind::TypeAliasDeclaration,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyStepList,
    MissingField {
        step_id: Option<String>,
        field: &'static str,
    },
    InvalidCombo {
        step_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyStepList => write!(f, "recipe contains no steps"),
            ValidationIssue::MissingField { step_id, field } => match step_id {
                Some(id) => write!(f, "step '{id}' missing required field '{field}'"),
                None => write!(f, "step missing required field '{field}'"),
            },
            ValidationIssue::InvalidCombo { step_id, message } => match step_id {
                Some(id) => write!(f, "step '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid recipe configuration: {message}"),
            },
        }
    }
}
