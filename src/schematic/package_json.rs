use super::pipeline::{SchematicError, StepStatus};
use crate::tree::VirtualTree;
use serde_json::{Map, Value};

pub const PACKAGE_JSON: &str = "package.json";

pub const NGRX_VERSION: &str = "5.2.0";
pub const ROUTER_STORE_VERSION: &str = "5.0.1";
pub const NGRX_STORE_FREEZE_VERSION: &str = "0.2.0";

/// Packages the ngrx flow depends on, with the versions it was written against.
pub fn ngrx_dependencies() -> [(&'static str, &'static str); 6] {
    [
        ("@ngrx/store", NGRX_VERSION),
        ("@ngrx/effects", NGRX_VERSION),
        ("@ngrx/entity", NGRX_VERSION),
        ("@ngrx/store-devtools", NGRX_VERSION),
        ("@ngrx/router-store", ROUTER_STORE_VERSION),
        ("ngrx-store-freeze", NGRX_STORE_FREEZE_VERSION),
    ]
}

/// Add every `(package, version)` missing from `dependencies` of the root
/// `package.json`. Existing entries keep their version, and key order is
/// preserved. A workspace without `package.json` is skipped.
pub fn add_dependencies(
    tree: &mut VirtualTree,
    dependencies: &[(&str, &str)],
) -> Result<StepStatus, SchematicError> {
    let Some(text) = tree.read(PACKAGE_JSON)? else {
        tracing::debug!("no package.json, dependencies not recorded");
        return Ok(StepStatus::Skipped);
    };

    let mut json: Value = serde_json::from_str(&text).map_err(|source| SchematicError::Json {
        file: PACKAGE_JSON.to_string(),
        source,
    })?;
    let root = json.as_object_mut().ok_or_else(|| malformed("top level is not an object"))?;
    let deps = root
        .entry("dependencies")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| malformed("\"dependencies\" is not an object"))?;

    let mut added = 0;
    for (package, version) in dependencies {
        if !deps.contains_key(*package) {
            deps.insert(package.to_string(), Value::String(version.to_string()));
            added += 1;
        }
    }
    if added == 0 {
        return Ok(StepStatus::Unchanged);
    }

    let mut output = serde_json::to_string_pretty(&json).map_err(|source| SchematicError::Json {
        file: PACKAGE_JSON.to_string(),
        source,
    })?;
    output.push('\n');
    tree.write(PACKAGE_JSON, output);
    tracing::debug!(added, "updated package.json dependencies");
    Ok(StepStatus::Applied)
}

fn malformed(reason: &str) -> SchematicError {
    SchematicError::Malformed {
        file: PACKAGE_JSON.to_string(),
        reason: reason.to_string(),
    }
}
