//! Markup-aware section discovery for raw HTML.
//!
//! Headings become section boundaries, `<pre>` elements become fenced code
//! blocks and long `<code>` spans become inline code, all registered in the
//! same [`CodeBlockRegistry`] the Markdown path uses. The output feeds the
//! shared section chunker and restorer.

use crate::protector::CodeBlockRegistry;
use crate::section::{PREAMBLE_SECTION, UNTITLED_SECTION};
use crate::types::{char_len, fence, CodeBlockKind, Section};
use scraper::{ElementRef, Html};

/// Elements whose content never reaches a chunk
const SKIPPED_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "svg", "nav",
];

/// Elements that start and end a line of text
const BLOCK_TAGS: &[&str] = &[
    "html", "body", "main", "article", "section", "header", "footer", "aside", "div", "p",
    "blockquote", "ul", "ol", "dl", "dt", "dd", "table", "thead", "tbody", "tfoot", "tr",
    "figure", "figcaption", "details", "summary", "form", "fieldset", "address", "hr",
];

/// Extracts sections and protected code from an HTML document
#[derive(Debug, Clone, Copy)]
pub struct HtmlSectionExtractor {
    inline_threshold: usize,
    protect_code: bool,
    detect_headings: bool,
}

impl HtmlSectionExtractor {
    pub const fn new(inline_threshold: usize, protect_code: bool, detect_headings: bool) -> Self {
        Self {
            inline_threshold,
            protect_code,
            detect_headings,
        }
    }

    /// Parse `html` into sections whose lines may hold code placeholders
    pub fn extract(&self, html: &str) -> (Vec<Section>, CodeBlockRegistry) {
        let document = Html::parse_document(html);
        let text: String = document.root_element().text().collect();
        let registry = CodeBlockRegistry::for_source(&format!("{html}\n{text}"));

        let mut collector = SectionCollector::new(self, registry);
        collector.visit(document.root_element());
        let (sections, registry) = collector.finish();

        log::debug!(
            "Extracted {} sections and {} code blocks from HTML",
            sections.len(),
            registry.len()
        );

        (sections, registry)
    }
}

struct SectionCollector<'cfg> {
    config: &'cfg HtmlSectionExtractor,
    registry: CodeBlockRegistry,
    sections: Vec<Section>,
    current: Section,
    line: String,
    saw_heading: bool,
}

impl<'cfg> SectionCollector<'cfg> {
    fn new(config: &'cfg HtmlSectionExtractor, registry: CodeBlockRegistry) -> Self {
        Self {
            config,
            registry,
            sections: Vec::new(),
            current: Section::new(0, PREAMBLE_SECTION),
            line: String::new(),
            saw_heading: false,
        }
    }

    fn walk(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                self.push_inline_text(text);
            } else if let Some(child_element) = ElementRef::wrap(child) {
                self.visit(child_element);
            }
        }
    }

    fn visit(&mut self, element: ElementRef<'_>) {
        let tag = element.value().name();
        if SKIPPED_TAGS.contains(&tag) {
            return;
        }

        match tag {
            "pre" => self.push_preformatted(element),
            "code" => self.push_inline_code(element),
            "br" => self.end_line(),
            "li" => {
                self.end_line();
                self.line.push_str("- ");
                self.walk(element);
                self.end_line();
            }
            "td" | "th" => {
                self.walk(element);
                self.push_inline_text(" ");
            }
            _ => match heading_level(tag) {
                Some(level) if self.config.detect_headings => {
                    let title = collapse_whitespace(&element.text().collect::<String>());
                    self.start_section(level, title);
                }
                Some(_) => self.walk_block(element),
                None if BLOCK_TAGS.contains(&tag) => self.walk_block(element),
                None => self.walk(element),
            },
        }
    }

    fn walk_block(&mut self, element: ElementRef<'_>) {
        self.end_line();
        self.walk(element);
        self.end_line();
    }

    fn start_section(&mut self, level: u8, title: String) {
        self.end_line();
        if title.is_empty() {
            return;
        }
        self.saw_heading = true;
        let finished = std::mem::replace(&mut self.current, Section::new(level, title));
        if !finished.is_blank() {
            self.sections.push(finished);
        }
    }

    fn push_preformatted(&mut self, element: ElementRef<'_>) {
        self.end_line();

        let raw: String = element.text().collect();
        let content = raw.trim_start_matches(['\r', '\n']).trim_end();
        if content.is_empty() {
            return;
        }

        let language = code_language(element);
        let fence_info = if language == "plain" { "" } else { language.as_str() };

        if self.config.protect_code {
            let id = self.registry.register(
                CodeBlockKind::Fenced,
                language.as_str(),
                fence_info,
                content,
            );
            self.current.content_lines.push(id);
        } else {
            let fenced = fence(fence_info, content);
            self.current
                .content_lines
                .extend(fenced.split('\n').map(str::to_string));
        }
    }

    fn push_inline_code(&mut self, element: ElementRef<'_>) {
        let code = collapse_whitespace(&element.text().collect::<String>());
        if code.is_empty() {
            return;
        }

        if self.config.protect_code && char_len(&code) >= self.config.inline_threshold {
            let id = self
                .registry
                .register(CodeBlockKind::Inline, "inline", "", code);
            self.line.push_str(&id);
        } else {
            self.line.push('`');
            self.line.push_str(&code);
            self.line.push('`');
        }
    }

    fn push_inline_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch.is_whitespace() {
                if !self.line.is_empty() && !self.line.ends_with(' ') {
                    self.line.push(' ');
                }
            } else {
                self.line.push(ch);
            }
        }
    }

    fn end_line(&mut self) {
        let trimmed = self.line.trim();
        // An empty list item leaves only its marker behind.
        if !trimmed.is_empty() && trimmed != "-" {
            self.current.content_lines.push(trimmed.to_string());
        }
        self.line.clear();
    }

    fn finish(mut self) -> (Vec<Section>, CodeBlockRegistry) {
        self.end_line();
        if !self.saw_heading {
            self.current.title = UNTITLED_SECTION.to_string();
        }
        if !self.current.is_blank() {
            self.sections.push(self.current);
        }
        (self.sections, self.registry)
    }
}

fn heading_level(tag: &str) -> Option<u8> {
    tag.strip_prefix('h')
        .and_then(|digits| digits.parse::<u8>().ok())
        .filter(|level| (1..=6).contains(level))
}

/// Language of a `<pre>` block from `language-*`/`lang-*` classes, else the
/// first class, on the inner `<code>` first and then on the element itself
fn code_language(element: ElementRef<'_>) -> String {
    let inner = element
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == "code");
    let candidates: Vec<ElementRef<'_>> = inner.into_iter().chain(Some(element)).collect();

    let tagged = candidates.iter().find_map(|el| {
        el.value().classes().find_map(|class| {
            class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
                .filter(|lang| !lang.is_empty())
        })
    });
    let first_class = || {
        candidates
            .iter()
            .find_map(|el| el.value().classes().next())
    };

    tagged
        .or_else(first_class)
        .map_or_else(|| "plain".to_string(), str::to_lowercase)
}

fn collapse_whitespace(input: &str) -> String {
    let mut buf = String::with_capacity(input.len());
    let mut last_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_space && !buf.is_empty() {
                buf.push(' ');
            }
            last_space = true;
        } else {
            buf.push(ch);
            last_space = false;
        }
    }
    buf.trim().to_string()
}
