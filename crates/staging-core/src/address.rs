//! # Addresses
//!
//! Parses the identifier path of a request into an [`Address`]. The raw
//! path is split on `/` *before* decoding, so an escaped separator
//! (`%2F`) stays inside its segment; each segment is then unescaped once.
//!
//! ```text
//! S/G/M                          suite summary
//! S/G/M/techmds/T                technical metadata item
//! S/G/M/presforms/P1/presforms/P2/content
//!                                content of presform P2 inside P1
//! ```
//!
//! The token following `presforms` is always an identifier, so a presform
//! whose name collides with a facet keyword is still addressable.

use crate::codec::{escape, unescape};
use crate::error::StagingError;

/// What to produce for a material suite or presform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Facet {
    Summary,
    Content,
    Premis,
    TechnicalMetadataList,
    /// Raw (unescaped) technical-metadata name.
    TechnicalMetadata(String),
    PresformList,
}

/// A suite within a segment, optionally descended into a presform chain.
///
/// All identifiers are raw (unescaped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuitePath {
    pub stage_id: String,
    pub segment_id: String,
    pub ms_id: String,
    pub presforms: Vec<String>,
}

impl SuitePath {
    pub fn new(
        stage_id: impl Into<String>,
        segment_id: impl Into<String>,
        ms_id: impl Into<String>,
    ) -> Self {
        Self {
            stage_id: stage_id.into(),
            segment_id: segment_id.into(),
            ms_id: ms_id.into(),
            presforms: Vec::new(),
        }
    }

    pub fn presform(mut self, presform_id: impl Into<String>) -> Self {
        self.presforms.push(presform_id.into());
        self
    }
}

/// A parsed request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Stages,
    Stage { stage_id: String },
    Segment { stage_id: String, segment_id: String },
    Suite { path: SuitePath, facet: Facet },
}

fn invalid(reason: impl Into<String>) -> StagingError {
    StagingError::InvalidAddress(reason.into())
}

impl Address {
    /// Parse a raw, still-escaped identifier path such as `s1/g1/a%20b.txt`.
    ///
    /// A single leading `/` is ignored; an empty path addresses the stage
    /// listing.
    ///
    /// # Errors
    ///
    /// [`StagingError::InvalidAddress`] for empty segments or a shape the
    /// grammar does not describe.
    pub fn from_raw_path(raw: &str) -> Result<Self, StagingError> {
        let trimmed = raw.strip_prefix('/').unwrap_or(raw);
        if trimmed.is_empty() {
            return Ok(Self::Stages);
        }
        let segments = trimmed
            .split('/')
            .map(|s| {
                if s.is_empty() {
                    Err(invalid("empty path segment"))
                } else {
                    unescape(s).map_err(|e| invalid(format!("segment {s} is not UTF-8: {e}")))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_segments(segments.as_slice())
    }

    /// Parse already-unescaped path segments.
    ///
    /// # Errors
    ///
    /// [`StagingError::InvalidAddress`] for a shape the grammar does not
    /// describe.
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Result<Self, StagingError> {
        let segments: Vec<&str> = segments.iter().map(AsRef::as_ref).collect();
        match segments.as_slice() {
            [] => Ok(Self::Stages),
            [stage] => Ok(Self::Stage {
                stage_id: stage.to_string(),
            }),
            [stage, segment] => Ok(Self::Segment {
                stage_id: stage.to_string(),
                segment_id: segment.to_string(),
            }),
            [stage, segment, ms, rest @ ..] => {
                parse_suite_tail(SuitePath::new(*stage, *segment, *ms), rest)
            }
        }
    }

    /// Escaped path form, inverse of [`Address::from_raw_path`].
    pub fn to_raw_path(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        match self {
            Self::Stages => {}
            Self::Stage { stage_id } => parts.push(escape(stage_id)),
            Self::Segment {
                stage_id,
                segment_id,
            } => {
                parts.push(escape(stage_id));
                parts.push(escape(segment_id));
            }
            Self::Suite { path, facet } => {
                parts.push(escape(&path.stage_id));
                parts.push(escape(&path.segment_id));
                parts.push(escape(&path.ms_id));
                for p in &path.presforms {
                    parts.push("presforms".into());
                    parts.push(escape(p));
                }
                match facet {
                    Facet::Summary => {}
                    Facet::Content => parts.push("content".into()),
                    Facet::Premis => parts.push("premis".into()),
                    Facet::TechnicalMetadataList => parts.push("techmds".into()),
                    Facet::TechnicalMetadata(t) => {
                        parts.push("techmds".into());
                        parts.push(escape(t));
                    }
                    Facet::PresformList => parts.push("presforms".into()),
                }
            }
        }
        parts.join("/")
    }
}

fn parse_suite_tail(mut path: SuitePath, mut rest: &[&str]) -> Result<Address, StagingError> {
    loop {
        let facet = match rest {
            [] => Facet::Summary,
            ["content"] => Facet::Content,
            ["premis"] => Facet::Premis,
            ["techmds"] => Facet::TechnicalMetadataList,
            ["techmds", techmd] => Facet::TechnicalMetadata(techmd.to_string()),
            ["presforms"] => Facet::PresformList,
            ["presforms", presform, tail @ ..] => {
                path.presforms.push(presform.to_string());
                rest = tail;
                continue;
            }
            [keyword, ..] => {
                return Err(invalid(format!("unexpected path segment: {keyword}")));
            }
        };
        return Ok(Address::Suite { path, facet });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suite(path: SuitePath, facet: Facet) -> Address {
        Address::Suite { path, facet }
    }

    #[test]
    fn parses_tree_levels() {
        assert_eq!(Address::from_raw_path("").unwrap(), Address::Stages);
        assert_eq!(
            Address::from_raw_path("/s1").unwrap(),
            Address::Stage {
                stage_id: "s1".into()
            }
        );
        assert_eq!(
            Address::from_raw_path("s1/g1").unwrap(),
            Address::Segment {
                stage_id: "s1".into(),
                segment_id: "g1".into()
            }
        );
        assert_eq!(
            Address::from_raw_path("s1/g1/file%20one.txt").unwrap(),
            suite(SuitePath::new("s1", "g1", "file one.txt"), Facet::Summary)
        );
    }

    #[test]
    fn escaped_separator_stays_in_segment() {
        assert_eq!(
            Address::from_raw_path("s1/g1/dir%2Fa.txt/content").unwrap(),
            suite(SuitePath::new("s1", "g1", "dir/a.txt"), Facet::Content)
        );
    }

    #[test]
    fn parses_suite_facets() {
        let base = || SuitePath::new("s", "g", "m");
        assert_eq!(
            Address::from_raw_path("s/g/m/premis").unwrap(),
            suite(base(), Facet::Premis)
        );
        assert_eq!(
            Address::from_raw_path("s/g/m/techmds").unwrap(),
            suite(base(), Facet::TechnicalMetadataList)
        );
        assert_eq!(
            Address::from_raw_path("s/g/m/techmds/fits%201.xml").unwrap(),
            suite(base(), Facet::TechnicalMetadata("fits 1.xml".into()))
        );
        assert_eq!(
            Address::from_raw_path("s/g/m/presforms").unwrap(),
            suite(base(), Facet::PresformList)
        );
    }

    #[test]
    fn parses_nested_presform_chain() {
        let addr = Address::from_raw_path("s/g/m/presforms/A/presforms/B/techmds").unwrap();
        assert_eq!(
            addr,
            suite(
                SuitePath::new("s", "g", "m").presform("A").presform("B"),
                Facet::TechnicalMetadataList
            )
        );
    }

    #[test]
    fn keyword_named_presform_is_an_identifier() {
        let addr = Address::from_raw_path("s/g/m/presforms/content").unwrap();
        assert_eq!(
            addr,
            suite(SuitePath::new("s", "g", "m").presform("content"), Facet::Summary)
        );
    }

    #[test]
    fn rejects_unknown_shapes() {
        for raw in [
            "s/g/m/bogus",
            "s/g/m/content/extra",
            "s/g/m/techmds/a/b",
            "s//g",
            "s/g/",
        ] {
            assert!(
                matches!(
                    Address::from_raw_path(raw),
                    Err(StagingError::InvalidAddress(_))
                ),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn undecodable_escapes_are_invalid() {
        for raw in ["s1/g1/%FF.txt", "s1/%C3", "s1/g1/m/techmds/%80"] {
            assert!(
                matches!(
                    Address::from_raw_path(raw),
                    Err(StagingError::InvalidAddress(_))
                ),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn raw_path_round_trips() {
        for raw in [
            "s1",
            "s1/g1",
            "s1/g1/a%20b.txt",
            "s1/g1/a%2Fb/presforms/c%20d/presforms/e/techmds/f%25g",
            "s1/g1/m/presforms/p/premis",
        ] {
            assert_eq!(Address::from_raw_path(raw).unwrap().to_raw_path(), raw);
        }
    }
}
