//! Copy-on-write file tree.
//!
//! A [`VirtualTree`] layers an in-memory overlay over an optional workspace
//! directory. Reads see the overlay first; writes, moves and deletes only
//! touch the overlay until [`VirtualTree::commit`] flushes it. Dropping the
//! tree (or calling [`VirtualTree::discard`]) leaves real storage untouched.
//!
//! Paths are workspace-relative, `/`-separated and normalised, so
//! `./apps/demo/x.ts`, `/apps/demo/x.ts` and `apps//demo/x.ts` are one file.

use crate::change::{atomic_write, ChangeError};
use crate::safety::{SafetyError, WorkspaceGuard};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("file does not exist: {path}")]
    MissingFile { path: String },

    #[error("file already exists: {path}")]
    AlreadyExists { path: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: ChangeError,
    },

    #[error(transparent)]
    Safety(#[from] SafetyError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Written(String),
    Deleted,
}

/// One pending difference between the overlay and real storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Created { path: String, content: String },
    Modified { path: String, before: String, after: String },
    Deleted { path: String, before: String },
}

impl FileChange {
    pub fn path(&self) -> &str {
        match self {
            FileChange::Created { path, .. }
            | FileChange::Modified { path, .. }
            | FileChange::Deleted { path, .. } => path,
        }
    }
}

#[derive(Debug)]
pub struct VirtualTree {
    base: Option<PathBuf>,
    guard: Option<WorkspaceGuard>,
    overlay: BTreeMap<String, Entry>,
}

impl VirtualTree {
    /// A tree over the workspace at `root`. Nothing under `root` is written
    /// before [`commit`](Self::commit).
    pub fn open(root: impl AsRef<Path>) -> Result<Self, TreeError> {
        let guard = WorkspaceGuard::new(root)?;
        Ok(Self {
            base: Some(guard.workspace_root().to_path_buf()),
            guard: Some(guard),
            overlay: BTreeMap::new(),
        })
    }

    /// A tree with no backing directory; commit only reports the changes.
    pub fn in_memory() -> Self {
        Self {
            base: None,
            guard: None,
            overlay: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.base.as_deref()
    }

    pub fn exists(&self, path: &str) -> bool {
        let path = normalize(path);
        match self.overlay.get(&path) {
            Some(Entry::Written(_)) => true,
            Some(Entry::Deleted) => false,
            None => self.base_path(&path).is_some_and(|p| p.is_file()),
        }
    }

    /// Current content of `path`, `None` if it does not exist.
    pub fn read(&self, path: &str) -> Result<Option<String>, TreeError> {
        let path = normalize(path);
        match self.overlay.get(&path) {
            Some(Entry::Written(content)) => Ok(Some(content.clone())),
            Some(Entry::Deleted) => Ok(None),
            None => self.read_base(&path),
        }
    }

    /// Current content of `path`; `MissingFile` if it does not exist.
    pub fn read_required(&self, path: &str) -> Result<String, TreeError> {
        self.read(path)?.ok_or_else(|| TreeError::MissingFile {
            path: normalize(path),
        })
    }

    /// Create or overwrite `path`.
    pub fn write(&mut self, path: &str, content: impl Into<String>) {
        self.overlay
            .insert(normalize(path), Entry::Written(content.into()));
    }

    /// Create `path`; `AlreadyExists` if it is already present.
    pub fn create(&mut self, path: &str, content: impl Into<String>) -> Result<(), TreeError> {
        if self.exists(path) {
            return Err(TreeError::AlreadyExists {
                path: normalize(path),
            });
        }
        self.write(path, content);
        Ok(())
    }

    /// Overwrite `path`; `MissingFile` if it does not exist.
    pub fn overwrite(&mut self, path: &str, content: impl Into<String>) -> Result<(), TreeError> {
        if !self.exists(path) {
            return Err(TreeError::MissingFile {
                path: normalize(path),
            });
        }
        self.write(path, content);
        Ok(())
    }

    pub fn delete(&mut self, path: &str) -> Result<(), TreeError> {
        let path = normalize(path);
        if !self.exists(&path) {
            return Err(TreeError::MissingFile { path });
        }
        if self.base_path(&path).is_some_and(|p| p.is_file()) {
            self.overlay.insert(path, Entry::Deleted);
        } else {
            self.overlay.remove(&path);
        }
        Ok(())
    }

    /// Move one file. The destination must not exist.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), TreeError> {
        let content = self.read_required(from)?;
        if normalize(from) == normalize(to) {
            return Ok(());
        }
        self.create(to, content)?;
        self.delete(from)
    }

    /// Move every file below `from_dir` to the same relative location below
    /// `to_dir`. Returns the new paths.
    pub fn move_dir(&mut self, from_dir: &str, to_dir: &str) -> Result<Vec<String>, TreeError> {
        let from_dir = normalize(from_dir);
        let to_dir = normalize(to_dir);
        let mut moved = Vec::new();
        for path in self.files_under(&from_dir)? {
            let relative = path[from_dir.len()..].trim_start_matches('/');
            let target = join(&to_dir, relative);
            self.rename(&path, &target)?;
            moved.push(target);
        }
        Ok(moved)
    }

    /// Every existing file at or below `dir`, sorted.
    pub fn files_under(&self, dir: &str) -> Result<Vec<String>, TreeError> {
        let dir = normalize(dir);
        let under = |path: &str| {
            dir.is_empty() || path == dir || path.starts_with(&format!("{dir}/"))
        };

        let mut files = BTreeSet::new();
        if let Some(base) = &self.base {
            let start = base.join(&dir);
            if start.exists() {
                let walker = WalkDir::new(&start)
                    .into_iter()
                    .filter_entry(|e| !is_skipped_dir(e.file_name().to_str()));
                for entry in walker {
                    let entry = entry.map_err(|e| TreeError::Io {
                        path: dir.clone(),
                        source: e.into(),
                    })?;
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    if let Ok(relative) = entry.path().strip_prefix(base) {
                        files.insert(normalize(&relative.to_string_lossy()));
                    }
                }
            }
        }
        for (path, entry) in &self.overlay {
            match entry {
                Entry::Written(_) if under(path) => {
                    files.insert(path.clone());
                }
                Entry::Deleted => {
                    files.remove(path);
                }
                _ => {}
            }
        }
        Ok(files.into_iter().filter(|p| under(p)).collect())
    }

    /// Pending differences against real storage, in path order. Overlay
    /// writes that reproduce the stored content are not reported.
    pub fn changes(&self) -> Result<Vec<FileChange>, TreeError> {
        let mut changes = Vec::new();
        for (path, entry) in &self.overlay {
            let before = self.read_base(path)?;
            match (entry, before) {
                (Entry::Written(after), None) => changes.push(FileChange::Created {
                    path: path.clone(),
                    content: after.clone(),
                }),
                (Entry::Written(after), Some(before)) if *after != before => {
                    changes.push(FileChange::Modified {
                        path: path.clone(),
                        before,
                        after: after.clone(),
                    })
                }
                (Entry::Deleted, Some(before)) => changes.push(FileChange::Deleted {
                    path: path.clone(),
                    before,
                }),
                _ => {}
            }
        }
        Ok(changes)
    }

    /// Flush the overlay to the workspace. Every target path is validated
    /// against the workspace guard before anything is written.
    pub fn commit(self) -> Result<Vec<FileChange>, TreeError> {
        let changes = self.changes()?;
        let (Some(base), Some(guard)) = (&self.base, &self.guard) else {
            return Ok(changes);
        };

        let mut targets = Vec::with_capacity(changes.len());
        for change in &changes {
            targets.push(guard.validate_path(base.join(change.path()))?);
        }

        for (change, target) in changes.iter().zip(&targets) {
            match change {
                FileChange::Created { content, .. } | FileChange::Modified { after: content, .. } => {
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent).map_err(|source| TreeError::Io {
                            path: change.path().to_string(),
                            source,
                        })?;
                    }
                    atomic_write(target, content.as_bytes()).map_err(|source| {
                        TreeError::Write {
                            path: change.path().to_string(),
                            source,
                        }
                    })?;
                }
                FileChange::Deleted { .. } => {
                    fs::remove_file(target).map_err(|source| TreeError::Io {
                        path: change.path().to_string(),
                        source,
                    })?;
                }
            }
            tracing::info!(path = change.path(), kind = change_kind(change), "committed");
        }
        Ok(changes)
    }

    /// Drop every pending change.
    pub fn discard(self) {
        tracing::debug!(pending = self.overlay.len(), "discarding virtual tree");
    }

    fn base_path(&self, path: &str) -> Option<PathBuf> {
        self.base.as_ref().map(|base| base.join(path))
    }

    fn read_base(&self, path: &str) -> Result<Option<String>, TreeError> {
        let Some(full) = self.base_path(path) else {
            return Ok(None);
        };
        if !full.is_file() {
            return Ok(None);
        }
        fs::read_to_string(&full)
            .map(Some)
            .map_err(|source| TreeError::Io {
                path: path.to_string(),
                source,
            })
    }
}

fn change_kind(change: &FileChange) -> &'static str {
    match change {
        FileChange::Created { .. } => "create",
        FileChange::Modified { .. } => "update",
        FileChange::Deleted { .. } => "delete",
    }
}

fn is_skipped_dir(name: Option<&str>) -> bool {
    matches!(name, Some("node_modules" | ".git"))
}

/// Workspace-relative, `/`-separated path without `.`/`..` segments.
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Join two tree paths.
pub fn join(dir: &str, name: &str) -> String {
    normalize(&format!("{dir}/{name}"))
}

/// Parent directory of a tree path, `""` at the root.
pub fn dirname(path: &str) -> String {
    let path = normalize(path);
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize("/apps//demo/./src/x.ts"), "apps/demo/src/x.ts");
        assert_eq!(normalize("apps\\demo\\x.ts"), "apps/demo/x.ts");
        assert_eq!(normalize("apps/demo/../lib/x.ts"), "apps/lib/x.ts");
        assert_eq!(join("apps/demo/src/app", "+state"), "apps/demo/src/app/+state");
        assert_eq!(dirname("apps/demo/src/app/app.module.ts"), "apps/demo/src/app");
        assert_eq!(dirname("package.json"), "");
    }

    #[test]
    fn overlay_reads_writes_and_deletes() {
        let mut tree = VirtualTree::in_memory();
        assert!(!tree.exists("a.ts"));

        tree.create("a.ts", "a").unwrap();
        assert_eq!(tree.read("/a.ts").unwrap().as_deref(), Some("a"));
        assert!(matches!(tree.create("a.ts", "b"), Err(TreeError::AlreadyExists { .. })));

        tree.overwrite("a.ts", "b").unwrap();
        assert_eq!(tree.read_required("a.ts").unwrap(), "b");

        tree.delete("a.ts").unwrap();
        assert!(!tree.exists("a.ts"));
        assert!(matches!(tree.overwrite("a.ts", "c"), Err(TreeError::MissingFile { .. })));
        assert!(tree.changes().unwrap().is_empty());
    }

    #[test]
    fn move_dir_relocates_every_file() {
        let mut tree = VirtualTree::in_memory();
        tree.write("app/user/user.actions.ts", "a");
        tree.write("app/user/user.reducer.ts", "r");
        tree.write("app/other.ts", "o");

        let moved = tree.move_dir("app/user", "libs/user/src/+state").unwrap();

        assert_eq!(
            moved,
            vec![
                "libs/user/src/+state/user.actions.ts".to_string(),
                "libs/user/src/+state/user.reducer.ts".to_string(),
            ]
        );
        assert!(!tree.exists("app/user/user.actions.ts"));
        assert!(tree.exists("app/other.ts"));
    }

    #[test]
    fn uncommitted_tree_leaves_disk_untouched() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), "{}\n").unwrap();

        let mut tree = VirtualTree::open(dir.path()).unwrap();
        tree.overwrite("package.json", "{\"a\":1}\n").unwrap();
        tree.write("apps/demo/new.ts", "x");
        assert_eq!(tree.changes().unwrap().len(), 2);
        tree.discard();

        assert_eq!(fs::read_to_string(dir.path().join("package.json")).unwrap(), "{}\n");
        assert!(!dir.path().join("apps").exists());
    }

    #[test]
    fn commit_writes_creates_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("old.ts"), "old").unwrap();
        fs::write(dir.path().join("same.ts"), "same").unwrap();

        let mut tree = VirtualTree::open(dir.path()).unwrap();
        tree.rename("old.ts", "moved/new.ts").unwrap();
        tree.write("same.ts", "same");

        let committed = tree.commit().unwrap();

        assert_eq!(committed.len(), 2);
        assert!(!dir.path().join("old.ts").exists());
        assert_eq!(fs::read_to_string(dir.path().join("moved/new.ts")).unwrap(), "old");
    }

    #[test]
    fn commit_refuses_forbidden_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut tree = VirtualTree::open(dir.path()).unwrap();
        tree.write("apps/demo/ok.ts", "ok");
        tree.write("node_modules/@ngrx/store/index.js", "nope");

        assert!(matches!(tree.commit(), Err(TreeError::Safety(_))));
        assert!(!dir.path().join("apps/demo/ok.ts").exists());
    }

    #[test]
    fn files_under_merges_disk_and_overlay() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("libs/user/src")).unwrap();
        fs::write(dir.path().join("libs/user/src/index.ts"), "").unwrap();
        fs::write(dir.path().join("libs/user/src/gone.ts"), "").unwrap();

        let mut tree = VirtualTree::open(dir.path()).unwrap();
        tree.write("libs/user/src/+state/user.actions.ts", "");
        tree.delete("libs/user/src/gone.ts").unwrap();

        assert_eq!(
            tree.files_under("libs/user").unwrap(),
            vec![
                "libs/user/src/+state/user.actions.ts".to_string(),
                "libs/user/src/index.ts".to_string(),
            ]
        );
    }
}
