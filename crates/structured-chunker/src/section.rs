use crate::types::Section;
use once_cell::sync::Lazy;
use regex::Regex;

/// Title of the implicit section of a document without headings
pub const UNTITLED_SECTION: &str = "Content";

/// Title of the text preceding the first heading
pub const PREAMBLE_SECTION: &str = "Introduction";

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("heading pattern"));

/// Partitions (placeholder-substituted) Markdown into flat sections
#[derive(Debug, Clone, Copy)]
pub struct SectionParser {
    detect_headings: bool,
}

impl SectionParser {
    /// With `detect_headings` off the whole text becomes one implicit section
    pub const fn new(detect_headings: bool) -> Self {
        Self { detect_headings }
    }

    /// Split text into sections in document order.
    ///
    /// Heading lines start a new section and are not part of any section's
    /// content. Sections without a non-blank line are dropped.
    pub fn parse(&self, text: &str) -> Vec<Section> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        if !self.detect_headings {
            let mut section = Section::new(0, UNTITLED_SECTION);
            section.content_lines = text.split('\n').map(str::to_string).collect();
            return vec![section];
        }

        let mut sections = Vec::new();
        let mut current = Section::new(0, PREAMBLE_SECTION);
        let mut saw_heading = false;

        for line in text.split('\n') {
            match parse_heading(line) {
                Some((level, title)) => {
                    saw_heading = true;
                    let finished = std::mem::replace(&mut current, Section::new(level, title));
                    if !finished.is_blank() {
                        sections.push(finished);
                    }
                }
                None => current.content_lines.push(line.to_string()),
            }
        }

        if !saw_heading {
            current.title = UNTITLED_SECTION.to_string();
        }
        if !current.is_blank() {
            sections.push(current);
        }

        log::debug!("Parsed {} sections", sections.len());
        sections
    }
}

impl Default for SectionParser {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Heading level and title of an ATX heading line
fn parse_heading(line: &str) -> Option<(u8, String)> {
    let caps = HEADING.captures(line)?;
    let hashes = caps.get(1)?.as_str();
    let title = caps.get(2)?.as_str().trim_end();
    if title.is_empty() {
        return None;
    }
    let level = u8::try_from(hashes.len()).ok()?;
    Some((level, title.to_string()))
}
