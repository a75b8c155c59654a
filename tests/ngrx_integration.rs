//! End-to-end runs of the ngrx schematic against an on-disk workspace.

use nx_schematics::schematic::{generate_ngrx, NgrxOptions, SchematicError, StepStatus};
use nx_schematics::tree::{TreeError, VirtualTree};
use nx_schematics::ts::SourceDocument;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const APP_MODULE: &str = "apps/myapp/src/app/app.module.ts";
const STATE_DIR: &str = "apps/myapp/src/app/+state";

/// An empty Nx workspace with one app.
fn create_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(root, "nx.json", "{\n  \"npmScope\": \"proj\"\n}\n");
    write(
        root,
        "package.json",
        "{\n  \"name\": \"proj\",\n  \"version\": \"0.0.0\",\n  \"dependencies\": {\n    \"@angular/core\": \"5.2.0\"\n  }\n}\n",
    );
    write(
        root,
        APP_MODULE,
        r#"import { NgModule } from '@angular/core';
import { BrowserModule } from '@angular/platform-browser';
import { AppComponent } from './app.component';

@NgModule({
  imports: [BrowserModule],
  declarations: [AppComponent],
  bootstrap: [AppComponent]
})
export class AppModule {}
"#,
    );
    write(
        root,
        "apps/myapp/src/app/app.component.ts",
        "import { Component } from '@angular/core';\n\n@Component({\n  selector: 'app-root',\n  template: ''\n})\nexport class AppComponent {}\n",
    );
    write(
        root,
        "apps/myapp/src/environments/environment.ts",
        "export const environment = {\n  production: false\n};\n",
    );
    dir
}

fn write(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, content).unwrap();
}

fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap()
}

fn run(dir: &TempDir, options: NgrxOptions) {
    let tree = VirtualTree::open(dir.path()).unwrap();
    let (tree, reports) = generate_ngrx(tree, &options).unwrap();
    assert!(reports.iter().all(|r| r.status != StepStatus::Skipped));
    tree.commit().unwrap();
}

fn feature(name: &str) -> NgrxOptions {
    NgrxOptions::new(name, APP_MODULE)
}

#[test]
fn adds_empty_root() {
    let dir = create_workspace();
    let mut options = feature("state");
    options.only_empty_root = true;
    run(&dir, options);

    let module = read(dir.path(), APP_MODULE);
    assert!(module.contains(
        "StoreModule.forRoot({},{metaReducers: !environment.production ? [storeFreeze] : []})"
    ));
    assert!(module.contains("EffectsModule.forRoot"));
    assert!(module.contains("import { environment } from '../environments/environment';"));
    assert!(!dir.path().join(STATE_DIR).exists());
}

#[test]
fn adds_root() {
    let dir = create_workspace();
    let mut options = feature("state");
    options.root = true;
    run(&dir, options);

    let module = read(dir.path(), APP_MODULE);
    assert!(module.contains("StoreModule.forRoot({state: stateReducer}"));
    assert!(module.contains("initialState: {state: stateInitialState}"));
    assert!(module.contains("EffectsModule.forRoot([StateEffects])"));
    assert!(module.contains("!environment.production ? [storeFreeze] : []"));
    assert!(module.contains("!environment.production ? StoreDevtoolsModule.instrument() : []"));

    for suffix in [
        "actions.ts",
        "effects.ts",
        "effects.spec.ts",
        "init.ts",
        "interfaces.ts",
        "reducer.ts",
        "reducer.spec.ts",
    ] {
        let path = dir.path().join(STATE_DIR).join(format!("state.{suffix}"));
        assert!(path.is_file(), "missing {}", path.display());
    }
}

#[test]
fn adds_feature() {
    let dir = create_workspace();
    run(&dir, feature("state"));

    let module = read(dir.path(), APP_MODULE);
    assert!(module.contains(
        "StoreModule.forFeature('state', stateReducer, {initialState: stateInitialState})"
    ));
    assert!(module.contains("EffectsModule.forFeature([StateEffects])"));
    assert!(!module.contains("!environment.production ? [storeFreeze] : []"));
    assert!(dir.path().join(STATE_DIR).join("state.actions.ts").is_file());
}

#[test]
fn feature_imports_and_provider_are_wired() {
    let dir = create_workspace();
    run(&dir, feature("user"));

    let module = read(dir.path(), APP_MODULE);
    assert!(module.contains("import { StoreModule } from '@ngrx/store';"));
    assert!(module.contains("import { EffectsModule } from '@ngrx/effects';"));
    assert!(module.contains("import { userReducer } from './+state/user.reducer';"));
    assert!(module.contains("import { userInitialState } from './+state/user.init';"));
    assert!(module.contains("import { UserEffects } from './+state/user.effects';"));
    assert!(module.contains("providers: [UserEffects]"));
    assert!(module.contains("imports: [BrowserModule, StoreModule.forFeature("));
}

#[test]
fn custom_directory_name() {
    let dir = create_workspace();
    let mut options = feature("state");
    options.directory = "myCustomState".to_string();
    run(&dir, options);

    let module = read(dir.path(), APP_MODULE);
    assert!(module.contains("StoreModule.forFeature"));
    assert!(module.contains("import { stateReducer } from './my-custom-state/state.reducer';"));
    assert!(dir
        .path()
        .join("apps/myapp/src/app/my-custom-state/state.actions.ts")
        .is_file());
}

#[test]
fn only_adds_files() {
    let dir = create_workspace();
    let mut options = feature("state");
    options.only_add_files = true;
    run(&dir, options);

    let module = read(dir.path(), APP_MODULE);
    assert!(!module.contains("StoreModule"));
    assert!(dir.path().join(STATE_DIR).join("state.actions.ts").is_file());
}

#[test]
fn updates_package_json() {
    let dir = create_workspace();
    run(&dir, feature("state"));

    let json: serde_json::Value =
        serde_json::from_str(&read(dir.path(), "package.json")).unwrap();
    let deps = &json["dependencies"];
    for package in [
        "@ngrx/store",
        "@ngrx/router-store",
        "@ngrx/effects",
        "ngrx-store-freeze",
    ] {
        assert!(deps.get(package).is_some(), "{package} not added");
    }
    assert_eq!(deps["@angular/core"], "5.2.0");
}

#[test]
fn skip_package_json_leaves_it_alone() {
    let dir = create_workspace();
    let before = read(dir.path(), "package.json");
    let mut options = feature("state");
    options.skip_package_json = true;
    run(&dir, options);

    assert_eq!(read(dir.path(), "package.json"), before);
}

#[test]
fn requires_module_option() {
    let err = NgrxOptions::from_json(r#"{"name": "state"}"#).unwrap_err();
    match err {
        SchematicError::InvalidOptions(message) => assert!(message.contains("module")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_module_file_writes_nothing() {
    let dir = create_workspace();
    let options = NgrxOptions::new("user", "apps/myapp/src/app/missing.module.ts");
    let tree = VirtualTree::open(dir.path()).unwrap();

    let err = generate_ngrx(tree, &options).unwrap_err();
    assert!(matches!(
        err,
        SchematicError::Tree(TreeError::MissingFile { .. })
    ));
    assert!(!dir.path().join(STATE_DIR).exists());
}

#[test]
fn creates_the_ngrx_files() {
    let dir = create_workspace();
    run(&dir, feature("user"));

    for suffix in [
        "actions.ts",
        "effects.ts",
        "effects.spec.ts",
        "reducer.ts",
        "reducer.spec.ts",
        "init.ts",
        "interfaces.ts",
    ] {
        assert!(dir.path().join(STATE_DIR).join(format!("user.{suffix}")).is_file());
    }
    assert!(!dir.path().join("app").exists());
}

#[test]
fn enhances_actions() {
    let dir = create_workspace();
    run(&dir, feature("user"));

    let content = read(dir.path(), &format!("{STATE_DIR}/user.actions.ts"));
    assert!(content.contains("UserActionTypes"));
    assert!(content.contains("LoadData = '[User] Load Data'"));
    assert!(content.contains("DataLoaded = '[User] Data Loaded'"));
    assert!(content.contains("class LoadData implements Action"));
    assert!(content.contains("class DataLoaded implements Action"));
    assert!(content.contains("readonly type = UserActionTypes.DataLoaded;"));
    assert!(content.contains("type UserActions = User | LoadData | DataLoaded"));
}

#[test]
fn enhances_reducer() {
    let dir = create_workspace();
    run(&dir, feature("user"));

    let content = read(dir.path(), &format!("{STATE_DIR}/user.reducer.ts"));
    assert!(!content.contains("export interface State"));
    assert!(!content.contains("function reducer"));
    assert!(content.contains("import { User } from './user.interfaces'"));
    assert!(content.contains("import { UserActions, UserActionTypes } from './user.actions'"));
    assert!(content
        .contains("function userReducer(state = initialState, action: UserActions): User"));
    assert!(content.contains("case UserActionTypes.DataLoaded"));
    assert!(content.contains("return { ...state, ...action.payload };"));
}

#[test]
fn enhances_effects() {
    let dir = create_workspace();
    run(&dir, feature("user"));

    let content = read(dir.path(), &format!("{STATE_DIR}/user.effects.ts"));
    assert!(content.contains("import { DataPersistence } from '@nrwl/nx'"));
    assert!(content.contains(
        "import { UserActions, UserActionTypes, LoadData, DataLoaded } from './user.actions'"
    ));
    assert!(content.contains(
        "constructor(private actions$: Actions, private dataPersistence: DataPersistence<User>)"
    ));
    let effect = content.find("loadData = this.dataPersistence.fetch").unwrap();
    let constructor = content.find("constructor(").unwrap();
    assert!(effect < constructor);
}

#[test]
fn generated_sources_parse_cleanly() {
    let dir = create_workspace();
    let mut options = feature("user-profile");
    options.root = true;
    run(&dir, options);

    let mut paths = vec![APP_MODULE.to_string()];
    for entry in fs::read_dir(dir.path().join(STATE_DIR)).unwrap() {
        let path = entry.unwrap().path();
        paths.push(path.strip_prefix(dir.path()).unwrap().to_string_lossy().into_owned());
    }
    for path in paths {
        let doc = SourceDocument::parse(path.as_str(), read(dir.path(), &path)).unwrap();
        assert!(!doc.has_errors(), "{path} has syntax errors");
    }
}

#[test]
fn rerun_fails_without_partial_writes() {
    let dir = create_workspace();
    run(&dir, feature("user"));
    let module_before = read(dir.path(), APP_MODULE);

    let tree = VirtualTree::open(dir.path()).unwrap();
    let err = generate_ngrx(tree, &feature("user")).unwrap_err();
    assert!(matches!(
        err,
        SchematicError::Tree(TreeError::AlreadyExists { .. })
    ));
    assert_eq!(read(dir.path(), APP_MODULE), module_before);
}
