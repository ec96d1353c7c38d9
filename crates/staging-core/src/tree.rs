//! # Staging Tree Model
//!
//! In-memory shape of a loaded stage:
//!
//! ```text
//! Stage
//!  ├── segments: [Segment]
//!  │     └── material_suites: [MaterialSuite]
//!  │           ├── content: Item            (its name is the suite's identifier)
//!  │           ├── premis: Option<Item>
//!  │           ├── technical_metadata: [Item]
//!  │           └── presforms: [MaterialSuite]  (recursively, same shape)
//!  ├── accession_records: [Item]
//!  ├── admin_notes: [Item]
//!  └── legal_notes: [Item]
//! ```
//!
//! A presform is not a separate type. It is a [`MaterialSuite`] held in
//! another suite's `presforms` list, so every resolver operation that
//! works on a suite works unchanged one level down.
//!
//! The tree is populated by a [`crate::store::StageStore`] and never
//! mutated by the core. Segments carry no back-reference to their stage;
//! callers that need the stage identifier keep the `&Stage` they resolved
//! the segment from.

use std::io::Read;
use std::path::PathBuf;

/// Where the bytes of an [`Item`] live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemSource {
    /// A file on local storage, opened lazily.
    File(PathBuf),
    /// Bytes held in memory.
    Inline(Vec<u8>),
}

/// A named leaf: content, PREMIS record, technical metadata, or attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub name: String,
    pub source: ItemSource,
}

impl Item {
    pub fn new(name: impl Into<String>, source: ItemSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }

    /// An item whose bytes are held in memory.
    pub fn inline(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(name, ItemSource::Inline(bytes.into()))
    }

    /// Open the item's bytes for reading.
    ///
    /// # Errors
    ///
    /// Any I/O error from opening the backing file.
    pub fn open(&self) -> std::io::Result<Box<dyn Read + Send>> {
        match &self.source {
            ItemSource::File(path) => Ok(Box::new(std::fs::File::open(path)?)),
            ItemSource::Inline(bytes) => Ok(Box::new(std::io::Cursor::new(bytes.clone()))),
        }
    }

    /// Read the whole item into memory.
    ///
    /// # Errors
    ///
    /// Any I/O error from opening or reading the backing file.
    pub fn read_all(&self) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.open()?.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// A content item with its metadata and derived presforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialSuite {
    pub content: Item,
    pub premis: Option<Item>,
    pub technical_metadata: Vec<Item>,
    pub presforms: Vec<MaterialSuite>,
}

/// A presform is a material suite in a derived-content role.
pub type Presform = MaterialSuite;

impl MaterialSuite {
    /// A suite holding only `content`.
    pub fn new(content: Item) -> Self {
        Self {
            content,
            premis: None,
            technical_metadata: Vec::new(),
            presforms: Vec::new(),
        }
    }

    pub fn with_premis(mut self, premis: Item) -> Self {
        self.premis = Some(premis);
        self
    }

    pub fn with_technical_metadata(mut self, item: Item) -> Self {
        self.technical_metadata.push(item);
        self
    }

    pub fn with_presform(mut self, presform: Presform) -> Self {
        self.presforms.push(presform);
        self
    }

    /// The suite's raw identifier, i.e. its content name.
    pub fn name(&self) -> &str {
        &self.content.name
    }

    pub fn has_technical_metadata(&self) -> bool {
        !self.technical_metadata.is_empty()
    }

    pub fn has_premis(&self) -> bool {
        self.premis.is_some()
    }

    pub fn has_presforms(&self) -> bool {
        !self.presforms.is_empty()
    }
}

/// A named grouping of material suites within a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub identifier: String,
    pub material_suites: Vec<MaterialSuite>,
}

impl Segment {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            material_suites: Vec::new(),
        }
    }

    pub fn with_material_suite(mut self, suite: MaterialSuite) -> Self {
        self.material_suites.push(suite);
        self
    }
}

/// Top-level archival container in staging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub identifier: String,
    pub segments: Vec<Segment>,
    pub accession_records: Vec<Item>,
    pub admin_notes: Vec<Item>,
    pub legal_notes: Vec<Item>,
}

impl Stage {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            segments: Vec::new(),
            accession_records: Vec::new(),
            admin_notes: Vec::new(),
            legal_notes: Vec::new(),
        }
    }

    pub fn with_segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }
}
