use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use nx_schematics::config::{apply_recipe, load_from_path};
use nx_schematics::schematic::{generate_ngrx, NgrxOptions, StepReport, StepStatus};
use nx_schematics::tree::{FileChange, VirtualTree};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Files that mark the root of an Angular CLI / Nx workspace.
const WORKSPACE_MARKERS: &[&str] = &["angular.json", ".angular-cli.json", "nx.json"];

#[derive(Parser)]
#[command(name = "nx-schematics")]
#[command(about = "AST-based schematics for Angular/Nx workspaces", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v, -vv, -vvv); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Args)]
struct CommonArgs {
    /// Path to workspace root (auto-detected if not specified)
    #[arg(short, long)]
    workspace: Option<PathBuf>,

    /// Dry run - show what would be changed without modifying files
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long)]
    diff: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an ngrx feature and register it in an NgModule
    Ngrx {
        /// Feature name, e.g. `user`
        #[arg(long)]
        name: String,

        /// Workspace path of the NgModule, e.g. apps/demo/src/app/app.module.ts
        #[arg(long)]
        module: String,

        /// Directory next to the module that receives the feature files
        #[arg(long, default_value = "+state")]
        directory: String,

        /// Register as the root store
        #[arg(long)]
        root: bool,

        /// Only wire an empty root store into the module
        #[arg(long)]
        only_empty_root: bool,

        /// Only generate the feature files
        #[arg(long)]
        only_add_files: bool,

        /// Do not touch package.json
        #[arg(long)]
        skip_package_json: bool,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Apply mutation recipes to a workspace
    Apply {
        /// Recipe file to apply (otherwise applies all in recipes/)
        #[arg(short, long)]
        recipe: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// List available recipes and their version constraints
    List {
        /// Path to workspace root (auto-detected if not specified)
        #[arg(short, long)]
        workspace: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Ngrx {
            name,
            module,
            directory,
            root,
            only_empty_root,
            only_add_files,
            skip_package_json,
            common,
        } => {
            let options = NgrxOptions {
                name,
                module,
                directory,
                root,
                only_empty_root,
                only_add_files,
                skip_package_json,
            };
            cmd_ngrx(options, common)
        }
        Commands::Apply { recipe, common } => cmd_apply(recipe, common),
        Commands::List { workspace } => cmd_list(workspace),
    };

    if let Err(err) = result {
        eprintln!("{} {:#}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("nx_schematics={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Resolve workspace path using multiple detection strategies
///
/// Priority order:
/// 1. Explicit --workspace flag
/// 2. NX_WORKSPACE environment variable
/// 3. Nearest ancestor of the current directory with a workspace marker
fn resolve_workspace(cli_workspace: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_workspace {
        return path
            .canonicalize()
            .with_context(|| format!("workspace {} does not exist", path.display()));
    }

    if let Ok(env_path) = env::var("NX_WORKSPACE") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(path.canonicalize()?);
        }
        eprintln!(
            "{}",
            format!("Warning: NX_WORKSPACE is set but path doesn't exist: {env_path}").yellow()
        );
    }

    if let Some(path) = auto_detect_workspace() {
        eprintln!(
            "{}",
            format!("Auto-detected workspace: {}", path.display()).dimmed()
        );
        return Ok(path);
    }

    anyhow::bail!(
        "{}\n{}\n  {}\n  {}\n  {}",
        "Could not find an Angular/Nx workspace.".red(),
        "Try one of:".bold(),
        "1. cd into the workspace root (the directory with angular.json or nx.json)",
        "2. Specify explicitly: nx-schematics <command> --workspace /path/to/workspace",
        "3. Set environment variable: export NX_WORKSPACE=/path/to/workspace"
    )
}

fn auto_detect_workspace() -> Option<PathBuf> {
    let current = env::current_dir().ok()?;
    current
        .ancestors()
        .find(|dir| WORKSPACE_MARKERS.iter().any(|marker| dir.join(marker).is_file()))
        .map(Path::to_path_buf)
}

fn discover_recipe_files(workspace: &Path) -> Result<Vec<PathBuf>> {
    let recipes_dir = workspace.join("recipes");
    if !recipes_dir.is_dir() {
        anyhow::bail!("No recipes/ directory in {}", workspace.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&recipes_dir).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
        {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No .toml recipe files found in {}", recipes_dir.display());
    }
    Ok(files)
}

fn cmd_ngrx(options: NgrxOptions, common: CommonArgs) -> Result<()> {
    let workspace = resolve_workspace(common.workspace)?;
    println!("Workspace: {}", workspace.display());

    let tree = VirtualTree::open(&workspace)?;
    let (tree, reports) = generate_ngrx(tree, &options)
        .with_context(|| format!("ngrx feature '{}' failed, nothing was written", options.name))?;
    print_reports(&reports);
    finish(tree, common.dry_run, common.diff)
}

fn cmd_apply(recipe: Option<PathBuf>, common: CommonArgs) -> Result<()> {
    let workspace = resolve_workspace(common.workspace)?;
    let recipe_files = match recipe {
        Some(path) => vec![path],
        None => discover_recipe_files(&workspace)?,
    };
    println!("Workspace: {}", workspace.display());

    let mut tree = VirtualTree::open(&workspace)?;
    for recipe_file in recipe_files {
        println!("Loading recipe from {}...", recipe_file.display());
        let recipe = load_from_path(&recipe_file)?;
        let (next, reports) = apply_recipe(&recipe, tree).with_context(|| {
            format!("recipe {} failed, nothing was written", recipe_file.display())
        })?;
        print_reports(&reports);
        tree = next;
    }
    finish(tree, common.dry_run, common.diff)
}

fn cmd_list(workspace: Option<PathBuf>) -> Result<()> {
    let workspace = resolve_workspace(workspace)?;
    for recipe_file in discover_recipe_files(&workspace)? {
        let recipe = load_from_path(&recipe_file)?;
        let name = if recipe.meta.name.is_empty() {
            recipe_file.display().to_string()
        } else {
            recipe.meta.name.clone()
        };
        let range = recipe.meta.version_range.as_deref().unwrap_or("any version");
        println!(
            "{} ({} steps, {})",
            name.bold(),
            recipe.steps.len(),
            range.dimmed()
        );
        if let Some(description) = &recipe.meta.description {
            println!("  {description}");
        }
        for step in &recipe.steps {
            println!("  - {} -> {}", step.id, step.file.dimmed());
        }
    }
    Ok(())
}

fn print_reports(reports: &[StepReport]) {
    for report in reports {
        let target = report
            .file
            .as_deref()
            .map(|file| format!(" ({file})"))
            .unwrap_or_default();
        match report.status {
            StepStatus::Applied => println!(
                "{} {}{}: {} change(s)",
                "✓".green(),
                report.name,
                target,
                report.changes
            ),
            StepStatus::Unchanged => {
                println!("{} {}{}: already up to date", "⊙".yellow(), report.name, target)
            }
            StepStatus::Skipped => println!("{} {}{}: skipped", "⊘".cyan(), report.name, target),
        }
    }
}

/// Print the pending changes, then commit them unless this is a dry run.
fn finish(tree: VirtualTree, dry_run: bool, show_diff: bool) -> Result<()> {
    let changes = tree.changes()?;
    if show_diff {
        for change in &changes {
            match change {
                FileChange::Created { path, content } => display_diff(path, "", content),
                FileChange::Modified {
                    path,
                    before,
                    after,
                } => display_diff(path, before, after),
                FileChange::Deleted { path, before } => display_diff(path, before, ""),
            }
        }
    }

    println!();
    if dry_run {
        println!("{}", "[DRY RUN - nothing written]".cyan());
        print_file_changes(&changes);
        tree.discard();
        return Ok(());
    }

    let committed = tree.commit()?;
    print_file_changes(&committed);
    Ok(())
}

fn print_file_changes(changes: &[FileChange]) {
    if changes.is_empty() {
        println!("{}", "No changes.".dimmed());
        return;
    }
    for change in changes {
        let label = match change {
            FileChange::Created { .. } => "CREATE".green(),
            FileChange::Modified { .. } => "UPDATE".yellow(),
            FileChange::Deleted { .. } => "DELETE".red(),
        };
        println!("{label} {}", change.path());
    }
}

/// Show unified diff between original and modified content
fn display_diff(file: &str, original: &str, modified: &str) {
    println!("\n{}", format!("--- {file} (original)").dimmed());
    println!("{}", format!("+++ {file} (generated)").dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for change in diff.iter_all_changes() {
        let line = match change.tag() {
            ChangeTag::Delete => format!("-{change}").red(),
            ChangeTag::Insert => format!("+{change}").green(),
            ChangeTag::Equal => format!(" {change}").normal(),
        };
        print!("{line}");
    }
}
