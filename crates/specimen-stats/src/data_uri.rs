//! Data URI measurement.
//!
//! Finds `data:` URIs embedded in `background`, `background-image` and
//! font-face `src` values and reports their size as written in the source.

use serde::Serialize;

use crate::format::format_bytes;

const MARKER: &str = "data:";

/// One embedded asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataUriEntry {
    /// UTF-8 byte length of the URI as written
    pub size_raw: usize,
    /// Human-formatted size
    pub size: String,
    /// Media type before the first `/` (`image`, `font`, ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// Everything between `data:` and the first `,`
    pub type_raw: String,
    /// The URI itself for images, empty otherwise
    pub display_value: String,
}

/// Total size of all entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataUriTotal {
    pub raw: usize,
    pub fmt: String,
}

/// Data URIs of a component, largest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataUriSummary {
    pub total: DataUriTotal,
    pub data: Vec<DataUriEntry>,
}

impl Default for DataUriSummary {
    fn default() -> Self {
        Self {
            total: DataUriTotal {
                raw: 0,
                fmt: format_bytes(0),
            },
            data: Vec::new(),
        }
    }
}

/// A data URI split into its parts.
///
/// Parts that cannot be found are `None`; a malformed URI is still measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDataUri<'a> {
    /// The URI as written, without the `url(...)` wrapper
    pub uri: &'a str,
    /// Text between `data:` and the first `/`
    pub media_type: Option<&'a str>,
    /// Text between `data:` and the first `,`
    pub header: Option<&'a str>,
}

impl<'a> ParsedDataUri<'a> {
    /// Split a bare URI. The `data:` marker may be missing, in which case
    /// only `uri` is set.
    pub fn from_uri(uri: &'a str) -> Self {
        let rest = uri.find(MARKER).map(|idx| &uri[idx + MARKER.len()..]);

        Self {
            uri,
            media_type: rest.and_then(|rest| rest.find('/').map(|end| &rest[..end])),
            header: rest.and_then(|rest| rest.split_once(',').map(|(header, _)| header)),
        }
    }

    /// Whether the URI declares an image media type.
    pub fn is_image(&self) -> bool {
        self.uri
            .find(MARKER)
            .is_some_and(|idx| self.uri[idx + MARKER.len()..].starts_with("image"))
    }
}

impl From<ParsedDataUri<'_>> for DataUriEntry {
    fn from(parsed: ParsedDataUri<'_>) -> Self {
        let size_raw = parsed.uri.len();

        Self {
            size_raw,
            size: format_bytes(size_raw),
            kind: parsed.media_type.unwrap_or_default().to_string(),
            type_raw: parsed.header.unwrap_or_default().to_string(),
            display_value: if parsed.is_image() {
                parsed.uri.to_string()
            } else {
                String::new()
            },
        }
    }
}

/// Parse a property value. Returns `None` when the value has no `data:` marker.
pub fn parse_data_uri(value: &str) -> Option<ParsedDataUri<'_>> {
    if !value.contains(MARKER) {
        return None;
    }

    let uri = parenthesized(value).unwrap_or_else(|| value.trim());
    Some(ParsedDataUri::from_uri(uri))
}

/// Contents of the first `(...)` pair, up to the first closing parenthesis.
fn parenthesized(value: &str) -> Option<&str> {
    let open = value.find('(')?;
    let rest = &value[open + 1..];
    let close = rest.find(')')?;
    Some(&rest[..close])
}

/// Measure every data URI in the given property values.
///
/// Values are taken in order: backgrounds, background images, then font-face
/// sources. Entries are sorted by size, largest first; equal sizes keep their
/// encounter order.
pub fn analyze(
    background: &[&str],
    background_image: &[&str],
    font_face_sources: &[&str],
) -> DataUriSummary {
    summarize(
        background
            .iter()
            .chain(background_image)
            .chain(font_face_sources)
            .filter_map(|value| parse_data_uri(value)),
    )
}

/// Measure URIs already taken out of their `url(...)` wrapper, such as the
/// URLs of a parsed stylesheet. URIs without the `data:` scheme are skipped.
pub fn measure_uris<'a>(uris: impl IntoIterator<Item = &'a str>) -> DataUriSummary {
    summarize(
        uris.into_iter()
            .filter(|uri| uri.trim_start().starts_with(MARKER))
            .map(ParsedDataUri::from_uri),
    )
}

fn summarize<'a>(uris: impl Iterator<Item = ParsedDataUri<'a>>) -> DataUriSummary {
    let mut data: Vec<DataUriEntry> = uris.map(DataUriEntry::from).collect();

    data.sort_by(|a, b| b.size_raw.cmp(&a.size_raw));

    let raw = data.iter().map(|entry| entry.size_raw).sum();

    DataUriSummary {
        total: DataUriTotal {
            raw,
            fmt: format_bytes(raw),
        },
        data,
    }
}
