//! Citation markers for annotated replies.
//!
//! Every annotation in a reply is replaced by a bracketed zero-based marker
//! `[i]`, where `i` is the annotation's position in document order. Spans are
//! resolved against the original text before anything is rewritten, so a
//! marker inserted for one annotation can never be matched by a later one.

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::thread::Annotation;

/// A citation whose file id still has to be resolved to a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCitation {
    /// Marker index.
    pub index: usize,
    /// Cited document.
    pub file_id: String,
}

/// Text with markers in place, plus the citations to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Rewritten text.
    pub text: String,
    /// File citations in marker order.
    pub citations: Vec<PendingCitation>,
}

/// A resolved citation line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Marker index.
    pub index: usize,
    /// Cited document.
    pub file_id: String,
    /// The document's filename.
    pub filename: String,
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.index, self.filename)
    }
}

/// A reply with citation markers and the list of cited sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedAnswer {
    /// Reply text with `[i]` markers.
    pub text: String,
    /// Cited sources.
    pub citations: Vec<Citation>,
}

impl AnnotatedAnswer {
    /// Citation lines, `"[i] <filename>"`, in marker order.
    #[must_use]
    pub fn citation_lines(&self) -> Vec<String> {
        self.citations.iter().map(ToString::to_string).collect()
    }

    /// The reply parsed as a JSON object, if it is one.
    #[must_use]
    pub fn json(&self) -> Option<serde_json::Map<String, serde_json::Value>> {
        match serde_json::from_str(self.text.trim()) {
            Ok(serde_json::Value::Object(map)) => Some(map),
            _ => None,
        }
    }
}

impl fmt::Display for AnnotatedAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)?;
        if !self.citations.is_empty() {
            write!(f, "\n{}", self.citation_lines().join("\n"))?;
        }
        Ok(())
    }
}

/// Replace each annotated span of `text` with its marker.
///
/// A span comes from the annotation's reported character offsets when the
/// text there matches the annotation, otherwise from the first occurrence of
/// the annotated text that no earlier annotation has claimed. Annotations
/// without a usable span get no marker, but file citations are always listed.
#[must_use]
pub fn rewrite_citations(text: &str, annotations: &[Annotation]) -> Rewrite {
    let char_starts: Vec<usize> = text
        .char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(text.len()))
        .collect();

    let mut claimed: Vec<(usize, usize, usize)> = Vec::with_capacity(annotations.len());
    let mut citations = Vec::new();

    for (index, annotation) in annotations.iter().enumerate() {
        let needle = annotation.text();
        let span = if needle.is_empty() {
            None
        } else {
            annotation
                .span()
                .and_then(|(s, e)| Some((*char_starts.get(s)?, *char_starts.get(e)?)))
                .filter(|&(s, e)| text.get(s..e) == Some(needle) && !overlaps(&claimed, s, e))
                .or_else(|| {
                    text.match_indices(needle)
                        .map(|(s, m)| (s, s + m.len()))
                        .find(|&(s, e)| !overlaps(&claimed, s, e))
                })
        };

        match span {
            Some((start, end)) => claimed.push((start, end, index)),
            None => debug!(index, annotation = needle, "annotation not found in reply"),
        }

        if let Some(file_id) = annotation.cited_file_id() {
            citations.push(PendingCitation {
                index,
                file_id: file_id.to_owned(),
            });
        }
    }

    claimed.sort_unstable_by_key(|&(start, _, _)| start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end, index) in claimed {
        out.push_str(&text[cursor..start]);
        let _ = write!(out, "[{index}]");
        cursor = end;
    }
    out.push_str(&text[cursor..]);

    Rewrite {
        text: out,
        citations,
    }
}

fn overlaps(claimed: &[(usize, usize, usize)], start: usize, end: usize) -> bool {
    claimed.iter().any(|&(s, e, _)| start < e && s < end)
}
