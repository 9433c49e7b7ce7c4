//! Writing units to disk.

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use simdgen_catalog::Layout;
use simdgen_codegen::{Unit, UnitKind};
use tracing::debug;

use crate::{GenerateError, GenerateResult};

/// Writes units under an output root, once per name.
///
/// The sink is shared across the rayon pool; the set of written names is the
/// only state.
#[derive(Debug)]
pub struct UnitSink {
    root: Utf8PathBuf,
    layout: Layout,
    written: Mutex<FxHashSet<String>>,
}

impl UnitSink {
    /// Create a sink rooted at `root` for units of `layout`. Nothing is
    /// created on disk.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>, layout: Layout) -> Self {
        Self {
            root: root.into(),
            layout,
            written: Mutex::new(FxHashSet::default()),
        }
    }

    /// Output root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Directory units of `kind` are written to.
    #[must_use]
    pub fn dir_for(&self, kind: UnitKind) -> Utf8PathBuf {
        self.root.join(kind.dir_in(self.layout))
    }

    /// Path a unit is written to: `{root}/{dir}/{name}.rs`.
    #[must_use]
    pub fn path_for(&self, unit: &Unit) -> Utf8PathBuf {
        self.dir_for(unit.kind).join(format!("{}.rs", unit.name))
    }

    /// Write one unit, returning its path.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::DuplicateUnit`] if the name was already
    /// written through this sink, or an I/O error from the write.
    pub fn write(&self, unit: &Unit) -> GenerateResult<Utf8PathBuf> {
        if !self.written.lock().insert(unit.name.clone()) {
            return Err(GenerateError::DuplicateUnit(unit.name.clone()));
        }

        let path = self.path_for(unit);
        std::fs::write(&path, &unit.text).map_err(|source| GenerateError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(unit = %unit.name, path = %path, "wrote unit");
        Ok(path)
    }

    /// Names written so far, sorted.
    #[must_use]
    pub fn written(&self) -> Vec<String> {
        let mut names: Vec<_> = self.written.lock().iter().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of units written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.written.lock().len()
    }

    /// Whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.written.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &str, kind: UnitKind) -> Unit {
        Unit {
            name: name.to_string(),
            kind,
            text: format!("// {name}\n"),
        }
    }

    fn utf8_root(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_path_layout() {
        let sink = UnitSink::new("out", Layout::Vector);
        assert_eq!(
            sink.path_for(&unit("vector_int4", UnitKind::Vector)),
            Utf8PathBuf::from("out/vector/vector_int4.rs")
        );
        assert_eq!(
            sink.path_for(&unit("matrix_float2x3", UnitKind::Matrix)),
            Utf8PathBuf::from("out/matrix/matrix_float2x3.rs")
        );
    }

    #[test]
    fn test_type_layout_uses_types_dir() {
        let sink = UnitSink::new("out", Layout::Type);
        assert_eq!(
            sink.path_for(&unit("type_int1", UnitKind::Vector)),
            Utf8PathBuf::from("out/types/type_int1.rs")
        );
        assert_eq!(
            sink.path_for(&unit("matrix_float3x3", UnitKind::Matrix)),
            Utf8PathBuf::from("out/matrix/matrix_float3x3.rs")
        );
    }

    #[test]
    fn test_write_and_reject_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8_root(&dir);
        std::fs::create_dir_all(root.join("vector")).unwrap();

        let sink = UnitSink::new(root, Layout::Vector);
        assert!(sink.is_empty());
        let path = sink.write(&unit("vector_char2", UnitKind::Vector)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "// vector_char2\n");

        let err = sink.write(&unit("vector_char2", UnitKind::Vector)).unwrap_err();
        assert!(matches!(err, GenerateError::DuplicateUnit(name) if name == "vector_char2"));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = UnitSink::new(utf8_root(&dir), Layout::Vector);
        let err = sink.write(&unit("matrix_double2x2", UnitKind::Matrix)).unwrap_err();
        assert!(matches!(err, GenerateError::Io { .. }));
    }

    #[test]
    fn test_written_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8_root(&dir);
        std::fs::create_dir_all(root.join("vector")).unwrap();

        let sink = UnitSink::new(root, Layout::Vector);
        for name in ["vector_uint8", "vector_char2", "vector_long4"] {
            sink.write(&unit(name, UnitKind::Vector)).unwrap();
        }
        assert_eq!(sink.written(), ["vector_char2", "vector_long4", "vector_uint8"]);
    }
}
