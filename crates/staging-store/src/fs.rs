//! # Filesystem Stage Store
//!
//! Reads stages from a staging root laid out as:
//!
//! ```text
//! <root>/<stage_id>/
//!   accessionrecords/<file>...
//!   adminnotes/<file>...
//!   legalnotes/<file>...
//!   segments/<segment_id>/<suite-dir>/
//!       content/<escaped name>      exactly one file
//!       premis/<escaped name>       zero or one file
//!       techmd/<escaped name>...    zero or more files
//!       presforms/<suite-dir>/...   same shape, recursively
//! ```
//!
//! Directory listings are sorted by file name and entries starting with
//! `.` are skipped. Content, PREMIS and technical-metadata file names are
//! stored escaped and unescaped on load; attachment and directory names
//! are taken as-is. Item bytes are not read here, only their paths.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use staging_core::codec::unescape;
use staging_core::{Item, ItemSource, MaterialSuite, Segment, Stage, StageStore, StoreError};

const ACCESSION_RECORDS_DIR: &str = "accessionrecords";
const ADMIN_NOTES_DIR: &str = "adminnotes";
const LEGAL_NOTES_DIR: &str = "legalnotes";
const SEGMENTS_DIR: &str = "segments";
const CONTENT_DIR: &str = "content";
const PREMIS_DIR: &str = "premis";
const TECHMD_DIR: &str = "techmd";
const PRESFORMS_DIR: &str = "presforms";

/// A stage store rooted at a directory on local disk.
#[derive(Debug, Clone)]
pub struct FsStageStore {
    root: PathBuf,
}

struct Entry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

impl FsStageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `None` for identifiers that are not exactly one listed directory
    /// name. Separators are refused, and so are `.`, `..` and the hidden
    /// names the listing skips.
    fn stage_dir(&self, identifier: &str) -> Option<PathBuf> {
        let unsafe_id = identifier.is_empty()
            || identifier.starts_with('.')
            || identifier.contains(['/', '\\']);
        if unsafe_id {
            None
        } else {
            Some(self.root.join(identifier))
        }
    }
}

fn malformed(path: &Path, reason: impl Into<String>) -> StoreError {
    StoreError::Malformed {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Sorted, dot-free listing of `dir`. A missing directory lists as empty.
fn entries(dir: &Path) -> Result<Vec<Entry>, StoreError> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut out = Vec::new();
    for entry in read {
        let entry = entry?;
        let path = entry.path();
        let name = entry
            .file_name()
            .into_string()
            .map_err(|_| malformed(&path, "file name is not valid UTF-8"))?;
        if name.starts_with('.') {
            continue;
        }
        let is_dir = entry.file_type()?.is_dir();
        out.push(Entry { name, path, is_dir });
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}

fn files(dir: &Path) -> Result<Vec<Entry>, StoreError> {
    Ok(entries(dir)?.into_iter().filter(|e| !e.is_dir).collect())
}

fn dirs(dir: &Path) -> Result<Vec<Entry>, StoreError> {
    Ok(entries(dir)?.into_iter().filter(|e| e.is_dir).collect())
}

fn attachments(dir: &Path) -> Result<Vec<Item>, StoreError> {
    Ok(files(dir)?
        .into_iter()
        .map(|e| Item::new(e.name, ItemSource::File(e.path)))
        .collect())
}

fn escaped_item(entry: Entry) -> Result<Item, StoreError> {
    let name = unescape(&entry.name)
        .map_err(|e| malformed(&entry.path, format!("escaped name does not decode: {e}")))?;
    Ok(Item::new(name, ItemSource::File(entry.path)))
}

fn load_suite(dir: &Path) -> Result<MaterialSuite, StoreError> {
    let content_dir = dir.join(CONTENT_DIR);
    let mut content = files(&content_dir)?;
    if content.len() != 1 {
        return Err(malformed(
            &content_dir,
            format!("expected exactly one content file, found {}", content.len()),
        ));
    }
    let mut suite = MaterialSuite::new(escaped_item(content.remove(0))?);

    let premis_dir = dir.join(PREMIS_DIR);
    let mut premis = files(&premis_dir)?;
    match premis.len() {
        0 => {}
        1 => suite.premis = Some(escaped_item(premis.remove(0))?),
        n => {
            return Err(malformed(
                &premis_dir,
                format!("expected at most one PREMIS file, found {n}"),
            ))
        }
    }

    suite.technical_metadata = files(&dir.join(TECHMD_DIR))?
        .into_iter()
        .map(escaped_item)
        .collect::<Result<_, _>>()?;

    suite.presforms = dirs(&dir.join(PRESFORMS_DIR))?
        .iter()
        .map(|e| load_suite(&e.path))
        .collect::<Result<_, _>>()?;

    Ok(suite)
}

fn load_segment(entry: &Entry) -> Result<Segment, StoreError> {
    let mut segment = Segment::new(entry.name.clone());
    segment.material_suites = dirs(&entry.path)?
        .iter()
        .map(|e| load_suite(&e.path))
        .collect::<Result<_, _>>()?;
    Ok(segment)
}

impl StageStore for FsStageStore {
    fn list_stage_identifiers(&self) -> Result<Vec<String>, StoreError> {
        if !self.root.is_dir() {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("staging root {} is not a directory", self.root.display()),
            )));
        }
        Ok(dirs(&self.root)?.into_iter().map(|e| e.name).collect())
    }

    fn load_stage(&self, identifier: &str) -> Result<Stage, StoreError> {
        let dir = match self.stage_dir(identifier) {
            Some(dir) if dir.is_dir() => dir,
            _ => return Err(StoreError::StageNotFound(identifier.to_string())),
        };

        let mut stage = Stage::new(identifier);
        stage.segments = dirs(&dir.join(SEGMENTS_DIR))?
            .iter()
            .map(load_segment)
            .collect::<Result<_, _>>()?;
        stage.accession_records = attachments(&dir.join(ACCESSION_RECORDS_DIR))?;
        stage.admin_notes = attachments(&dir.join(ADMIN_NOTES_DIR))?;
        stage.legal_notes = attachments(&dir.join(LEGAL_NOTES_DIR))?;

        tracing::debug!(
            stage_id = identifier,
            segments = stage.segments.len(),
            "stage loaded from disk"
        );
        Ok(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use staging_core::codec::escape;

    fn write(path: &Path, bytes: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
    }

    /// `<root>/S1` with one segment holding "file one.txt" (one techmd)
    /// and "scan.tif" (PREMIS plus a presform with its own presform).
    fn staging_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let stage = dir.path().join("S1");
        let seg = stage.join("segments").join("G1");

        let one = seg.join("0");
        write(&one.join("content").join(escape("file one.txt")), b"hello");
        write(&one.join("techmd").join("fits.xml"), b"<fits/>");

        let scan = seg.join("1");
        write(&scan.join("content").join("scan.tif"), b"tif");
        write(&scan.join("premis").join("premis.xml"), b"<premis/>");
        let pdf = scan.join("presforms").join("0");
        write(&pdf.join("content").join("scan.pdf"), b"pdf");
        write(&pdf.join("techmd").join(escape("pdf fits.xml")), b"<pdf/>");
        let jpg = pdf.join("presforms").join("0");
        write(&jpg.join("content").join("scan.jpg"), b"jpg");

        write(&stage.join("adminnotes").join("note.txt"), b"n");
        write(&stage.join("legalnotes").join("license.txt"), b"l");
        write(&stage.join("accessionrecords").join(".hidden"), b"h");
        fs::create_dir_all(dir.path().join("S0")).unwrap();
        fs::create_dir_all(dir.path().join(".trash")).unwrap();
        dir
    }

    #[test]
    fn lists_stage_directories_sorted() {
        let root = staging_root();
        let store = FsStageStore::new(root.path());
        assert_eq!(store.list_stage_identifiers().unwrap(), ["S0", "S1"]);
    }

    #[test]
    fn missing_root_is_an_io_error() {
        let store = FsStageStore::new("/nonexistent/staging/root");
        assert!(matches!(
            store.list_stage_identifiers(),
            Err(StoreError::Io(_))
        ));
    }

    #[test]
    fn loads_full_stage_tree() {
        let root = staging_root();
        let stage = FsStageStore::new(root.path()).load_stage("S1").unwrap();

        assert_eq!(stage.identifier, "S1");
        assert_eq!(stage.segments.len(), 1);
        let suites = &stage.segments[0].material_suites;
        assert_eq!(suites[0].name(), "file one.txt");
        assert_eq!(suites[0].technical_metadata[0].name, "fits.xml");
        assert_eq!(suites[0].technical_metadata[0].read_all().unwrap(), b"<fits/>");

        let scan = &suites[1];
        assert_eq!(scan.premis.as_ref().unwrap().name, "premis.xml");
        let pdf = &scan.presforms[0];
        assert_eq!(pdf.name(), "scan.pdf");
        assert_eq!(pdf.technical_metadata[0].name, "pdf fits.xml");
        assert_eq!(pdf.presforms[0].name(), "scan.jpg");

        let notes: Vec<_> = stage.admin_notes.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(notes, ["note.txt"]);
        assert!(stage.accession_records.is_empty());
    }

    #[test]
    fn unknown_and_unsafe_stage_ids_are_not_found() {
        let root = staging_root();
        let store = FsStageStore::new(root.path());
        for id in ["S9", "", "..", "S1/segments", "../S1", ".trash"] {
            assert!(
                matches!(store.load_stage(id), Err(StoreError::StageNotFound(_))),
                "{id:?}"
            );
        }
    }

    #[test]
    fn dotted_stage_names_round_trip_through_the_listing() {
        let root = staging_root();
        fs::create_dir(root.path().join("v1..2")).unwrap();
        let store = FsStageStore::new(root.path());
        assert!(store.list_stage_identifiers().unwrap().contains(&"v1..2".to_string()));
        assert_eq!(store.load_stage("v1..2").unwrap().identifier, "v1..2");
        assert!(matches!(store.load_stage(".."), Err(StoreError::StageNotFound(_))));
    }

    #[test]
    fn undecodable_stored_name_is_malformed() {
        let root = staging_root();
        write(&root.path().join("S1/segments/G1/9/content/%FF.bin"), b"x");
        let err = FsStageStore::new(root.path()).load_stage("S1").unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }), "{err}");
    }

    #[test]
    fn suite_without_content_is_malformed() {
        let root = staging_root();
        fs::create_dir_all(root.path().join("S1/segments/G1/2/techmd")).unwrap();
        let err = FsStageStore::new(root.path()).load_stage("S1").unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[test]
    fn two_premis_files_are_malformed() {
        let root = staging_root();
        write(&root.path().join("S1/segments/G1/1/premis/second.xml"), b"x");
        let err = FsStageStore::new(root.path()).load_stage("S1").unwrap_err();
        assert!(err.to_string().contains("at most one PREMIS"));
    }

    proptest::proptest! {
        #[test]
        fn stage_dir_never_leaves_root(prefix in "[a-z.]{0,4}", suffix in "[a-z.]{0,4}", sep in "(/|\\\\)") {
            let store = FsStageStore::new("/staging");
            let id = format!("{prefix}{sep}{suffix}");
            proptest::prop_assert!(store.stage_dir(&id).is_none(), "{id:?}");
        }

        #[test]
        fn plain_ids_stay_one_level_below_root(id in "[A-Za-z0-9_-][A-Za-z0-9._-]{0,12}") {
            let store = FsStageStore::new("/staging");
            let dir = store.stage_dir(&id).unwrap();
            proptest::prop_assert_eq!(dir.parent(), Some(Path::new("/staging")));
        }
    }
}
