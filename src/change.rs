//! Textual edits against original file offsets, and the applier that splices
//! a whole set of them into one file.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// Half-open byte range `[start, end)` into a file's original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `offset`.
    pub fn at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// What the text under a Remove/Replace span must be before it is spliced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (faster for large spans)
    Hash(u64),
}

impl TextVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            TextVerification::ExactMatch(expected) => text == expected,
            TextVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            TextVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            TextVerification::ExactMatch(text.to_string())
        }
    }
}

/// The edit itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOp {
    Insert {
        position: usize,
        text: String,
    },
    Remove {
        span: Span,
        expected: TextVerification,
    },
    Replace {
        span: Span,
        expected: TextVerification,
        text: String,
    },
    /// The desired end state already holds.
    Noop { reason: String },
}

/// One textual edit in one file, expressed against the file's original text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a Change does nothing until it is applied through a ChangeSet"]
pub struct Change {
    pub file: String,
    pub op: ChangeOp,
}

impl Change {
    pub fn insert(file: impl Into<String>, position: usize, text: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            op: ChangeOp::Insert {
                position,
                text: text.into(),
            },
        }
    }

    /// Remove `span`, which must currently read `original`.
    pub fn remove(file: impl Into<String>, span: Span, original: &str) -> Self {
        Self {
            file: file.into(),
            op: ChangeOp::Remove {
                span,
                expected: TextVerification::from_text(original),
            },
        }
    }

    /// Replace `span`, which must currently read `original`, with `text`.
    pub fn replace(
        file: impl Into<String>,
        span: Span,
        original: &str,
        text: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            op: ChangeOp::Replace {
                span,
                expected: TextVerification::from_text(original),
                text: text.into(),
            },
        }
    }

    pub fn noop(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            op: ChangeOp::Noop {
                reason: reason.into(),
            },
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self.op, ChangeOp::Noop { .. })
    }

    /// Span of original text this change consumes; zero-width for inserts.
    /// `None` for Noop.
    pub fn span(&self) -> Option<Span> {
        match &self.op {
            ChangeOp::Insert { position, .. } => Some(Span::at(*position)),
            ChangeOp::Remove { span, .. } | ChangeOp::Replace { span, .. } => Some(*span),
            ChangeOp::Noop { .. } => None,
        }
    }

    fn new_text(&self) -> &str {
        match &self.op {
            ChangeOp::Insert { text, .. } | ChangeOp::Replace { text, .. } => text,
            ChangeOp::Remove { .. } | ChangeOp::Noop { .. } => "",
        }
    }

    fn expected(&self) -> Option<&TextVerification> {
        match &self.op {
            ChangeOp::Remove { expected, .. } | ChangeOp::Replace { expected, .. } => {
                Some(expected)
            }
            ChangeOp::Insert { .. } | ChangeOp::Noop { .. } => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ChangeError {
    #[error("conflicting edits in {file}: {first} overlaps {second}")]
    ConflictingEdit {
        file: String,
        first: Span,
        second: Span,
    },

    #[error("invalid span {span} in {file} of length {file_len}")]
    InvalidSpan {
        file: String,
        span: Span,
        file_len: usize,
    },

    #[error("before-text verification failed in {file} at {span}")]
    BeforeTextMismatch {
        file: String,
        span: Span,
        expected: String,
        found: String,
    },

    #[error("change for {found} submitted to the change set of {expected}")]
    ForeignFile { expected: String, found: String },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// All changes planned for one file, applied exactly once.
#[derive(Debug, Clone, Default)]
#[must_use = "ChangeSet does nothing until apply() is called"]
pub struct ChangeSet {
    file: String,
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            changes: Vec::new(),
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn extend(&mut self, changes: impl IntoIterator<Item = Change>) {
        self.changes.extend(changes);
    }

    /// Number of changes that will actually touch the text.
    pub fn effective_len(&self) -> usize {
        self.changes.iter().filter(|c| !c.is_noop()).count()
    }

    pub fn is_noop(&self) -> bool {
        self.effective_len() == 0
    }

    /// Splice every change into `original`.
    ///
    /// Noops are dropped, the rest are validated against the original text,
    /// checked for overlap and then applied bottom-to-top so no splice shifts
    /// an offset that is still pending. Inserts sharing an offset keep the
    /// order in which they were pushed; an insert at the start of a replaced
    /// span lands before the replacement.
    pub fn apply(self, original: &str) -> Result<String, ChangeError> {
        let ChangeSet { file, changes } = self;

        let mut pending: Vec<(usize, Change)> = Vec::with_capacity(changes.len());
        for (seq, change) in changes.into_iter().enumerate() {
            if change.file != file {
                return Err(ChangeError::ForeignFile {
                    expected: file,
                    found: change.file,
                });
            }
            if change.is_noop() {
                continue;
            }
            validate(&file, &change, original)?;
            pending.push((seq, change));
        }

        check_conflicts(&file, &pending)?;

        // Descending start; at equal start the wider span first, then the
        // later-pushed change first so earlier pushes end up in front.
        pending.sort_by(|(seq_a, a), (seq_b, b)| {
            let (sa, sb) = (span_of(a), span_of(b));
            sb.start
                .cmp(&sa.start)
                .then(sb.end.cmp(&sa.end))
                .then(seq_b.cmp(seq_a))
        });

        let mut text = original.to_string();
        for (_, change) in &pending {
            let span = span_of(change);
            text.replace_range(span.start..span.end, change.new_text());
        }

        tracing::debug!(file = %file, applied = pending.len(), "applied change set");
        Ok(text)
    }
}

fn span_of(change: &Change) -> Span {
    change.span().unwrap_or_default()
}

impl Default for Span {
    fn default() -> Self {
        Span::at(0)
    }
}

fn validate(file: &str, change: &Change, original: &str) -> Result<(), ChangeError> {
    let span = span_of(change);
    if span.start > span.end
        || span.end > original.len()
        || !original.is_char_boundary(span.start)
        || !original.is_char_boundary(span.end)
    {
        return Err(ChangeError::InvalidSpan {
            file: file.to_string(),
            span,
            file_len: original.len(),
        });
    }

    if let Some(expected) = change.expected() {
        let found = &original[span.start..span.end];
        if !expected.matches(found) {
            return Err(ChangeError::BeforeTextMismatch {
                file: file.to_string(),
                span,
                expected: format!("{expected:?}"),
                found: found.to_string(),
            });
        }
    }

    Ok(())
}

/// Reject any pair of changes whose consumed spans overlap, and any insert
/// that would land strictly inside a removed or replaced span. Touching at a
/// boundary is fine.
fn check_conflicts(file: &str, pending: &[(usize, Change)]) -> Result<(), ChangeError> {
    let mut spans: Vec<Span> = pending.iter().map(|(_, c)| span_of(c)).collect();
    spans.sort();

    let mut covering: Option<Span> = None;
    for span in spans {
        if let Some(cover) = covering {
            if span.start < cover.end && (span.start > cover.start || !span.is_empty()) {
                return Err(ChangeError::ConflictingEdit {
                    file: file.to_string(),
                    first: cover,
                    second: span,
                });
            }
        }
        if !span.is_empty() && covering.map_or(true, |cover| span.end > cover.end) {
            covering = Some(span);
        }
    }

    Ok(())
}

/// Group changes by target file, preserving each file's push order.
pub fn group_by_file(changes: impl IntoIterator<Item = Change>) -> BTreeMap<String, ChangeSet> {
    let mut sets: BTreeMap<String, ChangeSet> = BTreeMap::new();
    for change in changes {
        sets.entry(change.file.clone())
            .or_insert_with(|| ChangeSet::new(change.file.clone()))
            .push(change);
    }
    sets
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or nothing changes. The mtime is bumped so
/// watchers and incremental builds pick the file up.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), ChangeError> {
    let parent = path.parent().ok_or_else(|| {
        ChangeError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Path has no parent directory",
        ))
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    filetime::set_file_mtime(path, filetime::FileTime::now())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = "a.ts";

    fn apply(original: &str, changes: Vec<Change>) -> Result<String, ChangeError> {
        let mut set = ChangeSet::new(FILE);
        set.extend(changes);
        set.apply(original)
    }

    #[test]
    fn text_verification_exact_match() {
        let verify = TextVerification::ExactMatch("hello world".to_string());
        assert!(verify.matches("hello world"));
        assert!(!verify.matches("hello"));
    }

    #[test]
    fn text_verification_uses_hash_for_large_text() {
        let text = "x".repeat(2000);
        let verify = TextVerification::from_text(&text);
        assert!(matches!(verify, TextVerification::Hash(_)));
        assert!(verify.matches(&text));
    }

    #[test]
    fn noops_are_dropped() {
        let out = apply("abc", vec![Change::noop(FILE, "already there")]).unwrap();
        assert_eq!(out, "abc");
    }

    #[test]
    fn edits_apply_against_original_offsets() {
        let original = "line1\nline2\nline3\n";
        let out = apply(
            original,
            vec![
                Change::replace(FILE, Span::new(0, 5), "line1", "LINE1"),
                Change::remove(FILE, Span::new(6, 12), "line2\n"),
                Change::insert(FILE, 17, "!"),
            ],
        )
        .unwrap();

        assert_eq!(out, "LINE1\nline3!\n");
    }

    #[test]
    fn inserts_at_same_offset_keep_push_order() {
        let out = apply(
            "enum A { X }",
            vec![Change::insert(FILE, 10, ", Y"), Change::insert(FILE, 10, ", Z")],
        )
        .unwrap();

        assert_eq!(out, "enum A { X, Y, Z }");
    }

    #[test]
    fn insert_at_start_of_replaced_span_goes_first() {
        let out = apply(
            "function reducer() {}",
            vec![
                Change::insert(FILE, 9, "/* x */ "),
                Change::replace(FILE, Span::new(9, 16), "reducer", "userReducer"),
            ],
        )
        .unwrap();

        assert_eq!(out, "function /* x */ userReducer() {}");
    }

    #[test]
    fn insert_at_end_of_removed_span_is_allowed() {
        let out = apply(
            "abcdef",
            vec![
                Change::remove(FILE, Span::new(1, 3), "bc"),
                Change::insert(FILE, 3, "X"),
            ],
        )
        .unwrap();

        assert_eq!(out, "aXdef");
    }

    #[test]
    fn overlapping_replacements_conflict() {
        let result = apply(
            "function reducer() {}",
            vec![
                Change::replace(FILE, Span::new(9, 16), "reducer", "a"),
                Change::replace(FILE, Span::new(12, 18), "ucer()", "b"),
            ],
        );

        assert!(matches!(result, Err(ChangeError::ConflictingEdit { .. })));
    }

    #[test]
    fn identical_spans_conflict() {
        let result = apply(
            "abc",
            vec![
                Change::remove(FILE, Span::new(0, 1), "a"),
                Change::replace(FILE, Span::new(0, 1), "a", "z"),
            ],
        );

        assert!(matches!(result, Err(ChangeError::ConflictingEdit { .. })));
    }

    #[test]
    fn insert_inside_removed_span_conflicts() {
        let result = apply(
            "abcdef",
            vec![
                Change::remove(FILE, Span::new(1, 4), "bcd"),
                Change::insert(FILE, 2, "X"),
            ],
        );

        assert!(matches!(result, Err(ChangeError::ConflictingEdit { .. })));
    }

    #[test]
    fn nested_span_conflicts_even_after_a_later_span() {
        let result = apply(
            "0123456789",
            vec![
                Change::remove(FILE, Span::new(0, 8), "01234567"),
                Change::remove(FILE, Span::new(2, 3), "2"),
                Change::remove(FILE, Span::new(5, 6), "5"),
            ],
        );

        assert!(matches!(result, Err(ChangeError::ConflictingEdit { .. })));
    }

    #[test]
    fn invalid_range_rejected() {
        let result = apply("hello", vec![Change::insert(FILE, 20, "x")]);
        assert!(matches!(result, Err(ChangeError::InvalidSpan { .. })));
    }

    #[test]
    fn stale_before_text_rejected() {
        let result = apply(
            "hello world",
            vec![Change::replace(FILE, Span::new(0, 5), "HELLO", "bye")],
        );
        assert!(matches!(result, Err(ChangeError::BeforeTextMismatch { .. })));
    }

    #[test]
    fn foreign_file_rejected() {
        let result = apply("abc", vec![Change::insert("b.ts", 0, "x")]);
        assert!(matches!(result, Err(ChangeError::ForeignFile { .. })));
    }

    #[test]
    fn group_by_file_splits_sets() {
        let sets = group_by_file(vec![
            Change::insert("b.ts", 0, "b"),
            Change::insert("a.ts", 0, "a"),
            Change::insert("b.ts", 1, "c"),
        ]);

        assert_eq!(sets.len(), 2);
        assert_eq!(sets["b.ts"].effective_len(), 2);
        assert_eq!(sets["a.ts"].file(), "a.ts");
    }

    #[test]
    fn atomic_write_replaces_content() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("app.module.ts");
        std::fs::write(&path, b"original").unwrap();

        atomic_write(&path, b"modified").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "modified");
    }
}
