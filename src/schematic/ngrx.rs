//! The "add ngrx feature" schematic.
//!
//! Generates the feature files next to an NgModule, registers the feature
//! in the module, enhances the generated actions, reducer and effects with
//! a `LoadData` / `DataLoaded` pair and records the ngrx packages in
//! `package.json`. Everything runs as one [`Pipeline`], so a failing step
//! leaves the workspace untouched.

use super::names::{find_module_parent, names, to_file_name, Names};
use super::package_json::{add_dependencies, ngrx_dependencies};
use super::pipeline::{Pipeline, SchematicError, StepReport};
use super::templates::feature_files;
use crate::change::Change;
use crate::planner::{
    add_class, add_constructor_parameter, add_enum_members, add_import_to_module,
    add_provider_to_module, add_switch_case, extend_union_type, insert_before_constructor,
    insert_import, insert_named_imports, remove_node, rename_function, EnumMember, PlanError,
};
use crate::tree::{join, normalize, VirtualTree};
use crate::ts::{SourceDocument, SyntaxKind};
use serde::{Deserialize, Serialize};

const DEFAULT_DIRECTORY: &str = "+state";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NgrxOptions {
    /// Feature name, e.g. `user`.
    pub name: String,
    /// Workspace path of the NgModule to register the feature in.
    pub module: String,
    /// Directory next to the module that receives the feature files.
    #[serde(default = "default_directory")]
    pub directory: String,
    /// Register as the root store instead of a feature.
    #[serde(default)]
    pub root: bool,
    /// Only wire an empty root store into the module; no feature files.
    #[serde(default)]
    pub only_empty_root: bool,
    /// Only generate the feature files; leave the module alone.
    #[serde(default)]
    pub only_add_files: bool,
    #[serde(default)]
    pub skip_package_json: bool,
}

fn default_directory() -> String {
    DEFAULT_DIRECTORY.to_string()
}

impl NgrxOptions {
    pub fn new(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            directory: default_directory(),
            root: false,
            only_empty_root: false,
            only_add_files: false,
            skip_package_json: false,
        }
    }

    /// Parse and validate options given as JSON.
    pub fn from_json(text: &str) -> Result<Self, SchematicError> {
        let options: Self = serde_json::from_str(text)
            .map_err(|err| SchematicError::InvalidOptions(err.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), SchematicError> {
        if self.name.trim().is_empty() {
            return Err(SchematicError::InvalidOptions("'name' must not be empty".into()));
        }
        if self.module.trim().is_empty() {
            return Err(SchematicError::InvalidOptions("'module' must not be empty".into()));
        }
        if self.directory.trim().is_empty() {
            return Err(SchematicError::InvalidOptions("'directory' must not be empty".into()));
        }
        if self.only_empty_root && self.only_add_files {
            return Err(SchematicError::InvalidOptions(
                "'onlyEmptyRoot' and 'onlyAddFiles' exclude each other".into(),
            ));
        }
        Ok(())
    }
}

/// Resolved names and paths of one feature.
struct Feature {
    options: NgrxOptions,
    names: Names,
    /// `directory` as a file name.
    directory: String,
    module: String,
    state_dir: String,
}

impl Feature {
    fn new(options: &NgrxOptions) -> Self {
        let directory = to_file_name(&options.directory);
        let module = normalize(&options.module);
        let state_dir = join(&find_module_parent(&module), &directory);
        Self {
            options: options.clone(),
            names: names(&options.name),
            directory,
            module,
            state_dir,
        }
    }

    /// Workspace path of a generated file.
    fn file(&self, suffix: &str) -> String {
        join(&self.state_dir, &format!("{}.{suffix}", self.names.file_name))
    }

    /// Import specifier of a generated file, relative to the module.
    fn module_import(&self, suffix: &str) -> String {
        format!("./{}/{}.{suffix}", self.directory, self.names.file_name)
    }

    /// Import specifier of a generated file, relative to its siblings.
    fn sibling_import(&self, suffix: &str) -> String {
        format!("./{}.{suffix}", self.names.file_name)
    }

    fn staging_dir(&self) -> String {
        format!("app/{}", self.names.file_name)
    }

    fn reducer_name(&self) -> String {
        format!("{}Reducer", self.names.property_name)
    }

    fn effects_name(&self) -> String {
        format!("{}Effects", self.names.class_name)
    }

    fn initial_state_name(&self) -> String {
        format!("{}InitialState", self.names.property_name)
    }
}

/// Run the ngrx schematic against `tree`.
///
/// Returns the updated tree (not yet committed) and one report per step.
pub fn generate_ngrx(
    tree: VirtualTree,
    options: &NgrxOptions,
) -> Result<(VirtualTree, Vec<StepReport>), SchematicError> {
    options.validate()?;
    let feature = Feature::new(options);
    tracing::info!(
        name = %options.name,
        module = %feature.module,
        directory = %feature.state_dir,
        "generating ngrx feature"
    );
    pipeline(&feature).run(tree)
}

fn pipeline(feature: &Feature) -> Pipeline<'_> {
    let options = &feature.options;
    let with_files = !options.only_empty_root;

    Pipeline::new(format!("ngrx:{}", options.name))
        .when(with_files, |p| {
            let staging = feature.staging_dir();
            let files = feature_files(&feature.names)
                .into_iter()
                .map(|(name, content)| (join(&staging, &name), content));
            p.files("generate feature files", files)
                .move_dir("move feature files", &staging, &feature.state_dir)
        })
        .when(!options.only_add_files, |p| {
            p.mutate("register in module", &feature.module, move |doc| {
                wire_module(feature, doc)
            })
        })
        .when(with_files, |p| {
            p.mutate("enhance actions", &feature.file("actions.ts"), move |doc| {
                enhance_actions(feature, doc)
            })
            .mutate("enhance reducer", &feature.file("reducer.ts"), move |doc| {
                enhance_reducer(feature, doc)
            })
            .mutate("enhance effects", &feature.file("effects.ts"), move |doc| {
                enhance_effects(feature, doc)
            })
        })
        .when(!options.skip_package_json, |p| {
            p.rule("add ngrx dependencies", |tree| {
                add_dependencies(tree, &ngrx_dependencies())
            })
        })
}

fn root_store_imports(doc: &SourceDocument, changes: &mut Vec<Change>) -> Result<(), PlanError> {
    changes.extend(insert_import(doc, "StoreDevtoolsModule", "@ngrx/store-devtools")?);
    changes.extend(insert_import(doc, "environment", "../environments/environment")?);
    changes.extend(insert_import(doc, "StoreRouterConnectingModule", "@ngrx/router-store")?);
    changes.extend(insert_import(doc, "storeFreeze", "ngrx-store-freeze")?);
    Ok(())
}

const DEVTOOLS: &str = "!environment.production ? StoreDevtoolsModule.instrument() : []";
const ROUTER_STORE: &str = "StoreRouterConnectingModule";

fn wire_module(feature: &Feature, doc: &SourceDocument) -> Result<Vec<Change>, PlanError> {
    let mut changes = Vec::new();
    changes.extend(insert_import(doc, "StoreModule", "@ngrx/store")?);
    changes.extend(insert_import(doc, "EffectsModule", "@ngrx/effects")?);

    if feature.options.only_empty_root {
        root_store_imports(doc, &mut changes)?;
        changes.extend(add_import_to_module(
            doc,
            &[
                "StoreModule.forRoot({},{metaReducers: !environment.production ? [storeFreeze] : []})",
                "EffectsModule.forRoot([])",
                DEVTOOLS,
                ROUTER_STORE,
            ],
        )?);
        return Ok(changes);
    }

    let reducer = feature.reducer_name();
    let effects = feature.effects_name();
    let initial_state = feature.initial_state_name();
    let property = &feature.names.property_name;

    changes.extend(insert_import(doc, &reducer, &feature.module_import("reducer"))?);
    changes.extend(insert_import(doc, &initial_state, &feature.module_import("init"))?);
    changes.extend(insert_import(doc, &effects, &feature.module_import("effects"))?);
    changes.extend(add_provider_to_module(doc, &[effects.as_str()])?);

    if feature.options.root {
        root_store_imports(doc, &mut changes)?;
        let store = format!(
            "StoreModule.forRoot({{{property}: {reducer}}}, {{\n  initialState: {{{property}: {initial_state}}},\n  metaReducers: !environment.production ? [storeFreeze] : []\n}})"
        );
        let effects_module = format!("EffectsModule.forRoot([{effects}])");
        changes.extend(add_import_to_module(
            doc,
            &[store.as_str(), effects_module.as_str(), DEVTOOLS, ROUTER_STORE],
        )?);
    } else {
        let store = format!(
            "StoreModule.forFeature('{property}', {reducer}, {{initialState: {initial_state}}})"
        );
        let effects_module = format!("EffectsModule.forFeature([{effects}])");
        changes.extend(add_import_to_module(doc, &[store, effects_module])?);
    }
    Ok(changes)
}

fn enhance_actions(feature: &Feature, doc: &SourceDocument) -> Result<Vec<Change>, PlanError> {
    let class = &feature.names.class_name;
    let types = format!("{class}ActionTypes");

    let mut changes = add_enum_members(
        doc,
        &types,
        &[
            EnumMember::with_value("LoadData", format!("[{class}] Load Data")),
            EnumMember::with_value("DataLoaded", format!("[{class}] Data Loaded")),
        ],
    )?;
    for action in ["LoadData", "DataLoaded"] {
        let source = format!(
            "export class {action} implements Action {{\n  readonly type = {types}.{action};\n  constructor(public payload: any) {{}}\n}}"
        );
        changes.extend(add_class(doc, action, &source)?);
    }
    changes.extend(extend_union_type(
        doc,
        &format!("{class}Actions"),
        &["LoadData", "DataLoaded"],
    )?);
    Ok(changes)
}

fn enhance_reducer(feature: &Feature, doc: &SourceDocument) -> Result<Vec<Change>, PlanError> {
    let class = &feature.names.class_name;

    let mut changes = remove_node(doc, SyntaxKind::InterfaceDeclaration, "State")?;
    changes.extend(insert_import(doc, class, &feature.sibling_import("interfaces"))?);
    changes.extend(insert_import(
        doc,
        &format!("{class}Actions"),
        &feature.sibling_import("actions"),
    )?);
    changes.extend(rename_function(
        doc,
        "reducer",
        &feature.reducer_name(),
        Some(("State", class.as_str())),
    )?);

    let label = format!("{class}ActionTypes.DataLoaded");
    let case = format!("case {label}: {{\n      return {{ ...state, ...action.payload }};\n    }}");
    changes.extend(add_switch_case(doc, Some("reducer"), &label, &case)?);
    Ok(changes)
}

fn enhance_effects(feature: &Feature, doc: &SourceDocument) -> Result<Vec<Change>, PlanError> {
    let class = &feature.names.class_name;
    let effects = feature.effects_name();

    let mut changes = insert_import(doc, "DataPersistence", "@nrwl/nx")?;
    changes.extend(insert_named_imports(
        doc,
        &["LoadData", "DataLoaded"],
        &feature.sibling_import("actions"),
    )?);
    changes.extend(insert_import(doc, class, &feature.sibling_import("interfaces"))?);
    changes.extend(add_constructor_parameter(
        doc,
        Some(effects.as_str()),
        &format!("private dataPersistence: DataPersistence<{class}>"),
    )?);

    let effect = format!(
        "\n\n  @Effect()\n  loadData = this.dataPersistence.fetch({class}ActionTypes.LoadData, {{\n    run: (action: LoadData, state: {class}) => {{\n      return new DataLoaded({{}});\n    }},\n\n    onError: (action: LoadData, error) => {{\n      console.error('Error', error);\n    }}\n  }});"
    );
    changes.extend(insert_before_constructor(doc, Some(effects.as_str()), &effect)?);
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schematic::pipeline::StepStatus;

    const APP_MODULE: &str = "import { NgModule } from '@angular/core';\nimport { BrowserModule } from '@angular/platform-browser';\nimport { AppComponent } from './app.component';\n\n@NgModule({\n  imports: [BrowserModule],\n  declarations: [AppComponent],\n  bootstrap: [AppComponent]\n})\nexport class AppModule {}\n";
    const MODULE_PATH: &str = "apps/myapp/src/app/app.module.ts";

    fn workspace() -> VirtualTree {
        let mut tree = VirtualTree::in_memory();
        tree.write(MODULE_PATH, APP_MODULE);
        tree.write("package.json", "{\n  \"name\": \"proj\",\n  \"dependencies\": {}\n}\n");
        tree
    }

    #[test]
    fn options_defaults_from_json() {
        let options =
            NgrxOptions::from_json(r#"{"name": "user", "module": "apps/a/app.module.ts"}"#).unwrap();
        assert_eq!(options.directory, "+state");
        assert!(!options.root);
        assert!(!options.skip_package_json);
    }

    #[test]
    fn missing_module_option_is_rejected() {
        let err = NgrxOptions::from_json(r#"{"name": "user"}"#).unwrap_err();
        match err {
            SchematicError::InvalidOptions(message) => assert!(message.contains("module")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn exclusive_modes_are_rejected() {
        let mut options = NgrxOptions::new("user", MODULE_PATH);
        options.only_empty_root = true;
        options.only_add_files = true;
        assert!(matches!(
            options.validate(),
            Err(SchematicError::InvalidOptions(_))
        ));
    }

    #[test]
    fn feature_paths() {
        let mut options = NgrxOptions::new("userProfile", MODULE_PATH);
        options.directory = "myCustomState".into();
        let feature = Feature::new(&options);

        assert_eq!(feature.state_dir, "apps/myapp/src/app/my-custom-state");
        assert_eq!(
            feature.file("reducer.ts"),
            "apps/myapp/src/app/my-custom-state/user-profile.reducer.ts"
        );
        assert_eq!(
            feature.module_import("reducer"),
            "./my-custom-state/user-profile.reducer"
        );
        assert_eq!(feature.reducer_name(), "userProfileReducer");
        assert_eq!(feature.effects_name(), "UserProfileEffects");
    }

    #[test]
    fn full_feature_run() {
        let (tree, reports) =
            generate_ngrx(workspace(), &NgrxOptions::new("user", MODULE_PATH)).unwrap();

        assert!(reports.iter().all(|r| r.status == StepStatus::Applied));
        assert!(!tree.exists("app/user/user.actions.ts"));

        let reducer = tree.read_required("apps/myapp/src/app/+state/user.reducer.ts").unwrap();
        assert!(reducer.contains("function userReducer(state = initialState, action: UserActions): User"));
        assert!(reducer.contains("case UserActionTypes.DataLoaded"));
        assert!(!reducer.contains("interface State"));
    }

    #[test]
    fn second_run_fails_without_touching_the_tree() {
        let (tree, _) = generate_ngrx(workspace(), &NgrxOptions::new("user", MODULE_PATH)).unwrap();
        let err = generate_ngrx(tree, &NgrxOptions::new("user", MODULE_PATH)).unwrap_err();

        assert!(matches!(err, SchematicError::Tree(_)));
    }
}
