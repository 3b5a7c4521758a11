//! Section Codec
//!
//! Merges a component's script, markup and style into one tagged document
//! and extracts the sections back out of it.
//!
//! Tags are plain marker lines and are not escaped: content that contains a
//! literal marker makes the split ambiguous. Extraction stays total in that
//! case and returns best-effort text instead of failing.

/// Marker preceding the script section
pub const SCRIPT_TAG: &str = "// --- TypeScript ---";
/// Marker preceding the markup section
pub const MARKUP_TAG: &str = "// --- HTML ---";
/// Marker preceding the style section
pub const STYLE_TAG: &str = "// --- CSS ---";

/// One of the three fixed sections of a merged document, in document order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionTag {
    Script,
    Markup,
    Style,
}

impl SectionTag {
    /// All sections in the order they appear in a merged document
    pub const ALL: [SectionTag; 3] = [SectionTag::Script, SectionTag::Markup, SectionTag::Style];

    /// The literal marker string for this section
    pub fn marker(self) -> &'static str {
        match self {
            SectionTag::Script => SCRIPT_TAG,
            SectionTag::Markup => MARKUP_TAG,
            SectionTag::Style => STYLE_TAG,
        }
    }

    /// The section that follows this one, if any
    pub fn next(self) -> Option<SectionTag> {
        match self {
            SectionTag::Script => Some(SectionTag::Markup),
            SectionTag::Markup => Some(SectionTag::Style),
            SectionTag::Style => None,
        }
    }

    /// Extract this section from a merged document
    pub fn extract_from(self, document: &str) -> String {
        extract(document, self.marker(), self.next().map(SectionTag::marker))
    }
}

/// Merge the three component sources into one tagged document
pub fn merge(script: &str, markup: &str, style: &str) -> String {
    let mut document = String::with_capacity(
        script.len()
            + markup.len()
            + style.len()
            + SCRIPT_TAG.len()
            + MARKUP_TAG.len()
            + STYLE_TAG.len()
            + 8,
    );
    document.push_str(SCRIPT_TAG);
    document.push('\n');
    document.push_str(script);
    document.push_str("\n\n");
    document.push_str(MARKUP_TAG);
    document.push('\n');
    document.push_str(markup);
    document.push_str("\n\n");
    document.push_str(STYLE_TAG);
    document.push('\n');
    document.push_str(style);
    document
}

/// Return the trimmed text between `start` and `end`.
///
/// A missing `start` tag makes the range begin at offset 0, so text typed
/// above the first marker is kept. `end == None` runs to the end of the
/// document. A missing `end` tag collapses the end to offset 0, and a
/// reversed range is swapped; both only happen on corrupted documents.
pub fn extract(document: &str, start: &str, end: Option<&str>) -> String {
    let start_index = document
        .find(start)
        .map(|index| index + start.len())
        .unwrap_or(0);
    let end_index = match end {
        Some(tag) => document.find(tag).unwrap_or(0),
        None => document.len(),
    };

    let (lo, hi) = if start_index <= end_index {
        (start_index, end_index)
    } else {
        (end_index, start_index)
    };

    document[lo..hi].trim().to_string()
}

/// The three sections split out of a merged document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sections {
    pub script: String,
    pub markup: String,
    pub style: String,
}

impl Sections {
    /// Split a merged document using the fixed tag boundaries
    pub fn split(document: &str) -> Self {
        Self {
            script: SectionTag::Script.extract_from(document),
            markup: SectionTag::Markup.extract_from(document),
            style: SectionTag::Style.extract_from(document),
        }
    }

    /// Merge the sections back into a tagged document
    pub fn merge(&self) -> String {
        merge(&self.script, &self.markup, &self.style)
    }

    /// Content of a single section
    pub fn get(&self, tag: SectionTag) -> &str {
        match tag {
            SectionTag::Script => &self.script,
            SectionTag::Markup => &self.markup,
            SectionTag::Style => &self.style,
        }
    }
}
