use crate::error::{ChunkerError, Result};
use crate::language::Language;
use std::collections::HashMap;
use tree_sitter::{Node, Parser};

/// Kind of top-level definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Function,
    Class,
}

/// A top-level definition located in source code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeUnit {
    pub kind: UnitKind,
    pub name: Option<String>,
    /// First line of the definition (0-indexed, decorators included)
    pub start_line: usize,
    /// Last line of the definition (0-indexed, inclusive)
    pub end_line: usize,
}

/// Grammar registration: how to parse a language and which nodes are units
#[derive(Debug, Clone, Copy)]
pub struct Grammar {
    language: fn() -> tree_sitter::Language,
    /// Node kinds that form a unit
    units: &'static [(&'static str, UnitKind)],
    /// Node kinds wrapping a unit, with the field that holds the definition
    wrappers: &'static [(&'static str, &'static str)],
}

impl Grammar {
    pub const fn new(
        language: fn() -> tree_sitter::Language,
        units: &'static [(&'static str, UnitKind)],
        wrappers: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self {
            language,
            units,
            wrappers,
        }
    }

    fn unit_kind(&self, node_kind: &str) -> Option<UnitKind> {
        self.units
            .iter()
            .find(|(kind, _)| *kind == node_kind)
            .map(|(_, unit)| *unit)
    }

    fn wrapped_field(&self, node_kind: &str) -> Option<&'static str> {
        self.wrappers
            .iter()
            .find(|(kind, _)| *kind == node_kind)
            .map(|(_, field)| *field)
    }
}

fn python_language() -> tree_sitter::Language {
    tree_sitter_python::LANGUAGE.into()
}

fn rust_language() -> tree_sitter::Language {
    tree_sitter_rust::LANGUAGE.into()
}

fn javascript_language() -> tree_sitter::Language {
    tree_sitter_javascript::LANGUAGE.into()
}

fn typescript_language() -> tree_sitter::Language {
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
}

const PYTHON: Grammar = Grammar::new(
    python_language,
    &[
        ("function_definition", UnitKind::Function),
        ("class_definition", UnitKind::Class),
    ],
    &[("decorated_definition", "definition")],
);

const RUST: Grammar = Grammar::new(
    rust_language,
    &[
        ("function_item", UnitKind::Function),
        ("struct_item", UnitKind::Class),
        ("enum_item", UnitKind::Class),
        ("trait_item", UnitKind::Class),
        ("impl_item", UnitKind::Class),
    ],
    &[],
);

const JAVASCRIPT: Grammar = Grammar::new(
    javascript_language,
    &[
        ("function_declaration", UnitKind::Function),
        ("generator_function_declaration", UnitKind::Function),
        ("class_declaration", UnitKind::Class),
    ],
    &[("export_statement", "declaration")],
);

const TYPESCRIPT: Grammar = Grammar::new(
    typescript_language,
    &[
        ("function_declaration", UnitKind::Function),
        ("generator_function_declaration", UnitKind::Function),
        ("class_declaration", UnitKind::Class),
        ("abstract_class_declaration", UnitKind::Class),
        ("interface_declaration", UnitKind::Class),
    ],
    &[("export_statement", "declaration")],
);

/// Languages whose code can be split along definition boundaries
#[derive(Debug, Clone)]
pub struct SyntaxRegistry {
    grammars: HashMap<Language, Grammar>,
}

/// Capability selected once per code block
pub enum SyntaxSupport {
    /// A parser for the block's language is ready
    SyntaxCapable(UnitParser),
    /// No usable grammar; callers fall back to line-count splitting
    Unsupported,
}

impl SyntaxRegistry {
    /// Registry without any grammar
    pub fn empty() -> Self {
        Self {
            grammars: HashMap::new(),
        }
    }

    /// Register (or replace) the grammar for a language
    pub fn register(&mut self, language: Language, grammar: Grammar) -> &mut Self {
        self.grammars.insert(language, grammar);
        self
    }

    /// Remove a language, returning whether it was registered
    pub fn unregister(&mut self, language: Language) -> bool {
        self.grammars.remove(&language).is_some()
    }

    pub fn supports(&self, language: Language) -> bool {
        self.grammars.contains_key(&language)
    }

    /// Build a fresh parser for `language`
    pub fn parser_for(&self, language: Language) -> Result<UnitParser> {
        let grammar = self
            .grammars
            .get(&language)
            .copied()
            .ok_or_else(|| ChunkerError::unsupported_language(language.as_str()))?;

        let mut parser = Parser::new();
        parser
            .set_language(&(grammar.language)())
            .map_err(|e| ChunkerError::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(UnitParser { parser, grammar })
    }

    /// Select the capability for `language`; never fails
    pub fn support_for(&self, language: Language) -> SyntaxSupport {
        if !self.supports(language) {
            return SyntaxSupport::Unsupported;
        }

        match self.parser_for(language) {
            Ok(parser) => SyntaxSupport::SyntaxCapable(parser),
            Err(e) => {
                log::warn!("Grammar for {} unavailable: {e}", language.as_str());
                SyntaxSupport::Unsupported
            }
        }
    }
}

impl Default for SyntaxRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register(Language::Python, PYTHON)
            .register(Language::Rust, RUST)
            .register(Language::JavaScript, JAVASCRIPT)
            .register(Language::TypeScript, TYPESCRIPT);
        registry
    }
}

/// Tree-sitter parser bound to one grammar; owned by a single split call
pub struct UnitParser {
    parser: Parser,
    grammar: Grammar,
}

impl UnitParser {
    /// Locate the top-level definitions of `source`.
    ///
    /// Fails when the tree contains syntax errors or no definition is found.
    pub fn top_level_units(&mut self, source: &str) -> Result<Vec<CodeUnit>> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ChunkerError::parse("Failed to parse source code"))?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(ChunkerError::parse("Source contains syntax errors"));
        }

        let mut units = Vec::new();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if let Some(unit) = self.node_to_unit(source, child) {
                units.push(unit);
            }
        }

        if units.is_empty() {
            return Err(ChunkerError::parse("No top-level definitions"));
        }

        Ok(units)
    }

    fn node_to_unit(&self, source: &str, node: Node) -> Option<CodeUnit> {
        // Decorators and export keywords belong to the unit's line range,
        // but kind and name come from the wrapped definition.
        let definition = match self.grammar.wrapped_field(node.kind()) {
            Some(field) => node.child_by_field_name(field)?,
            None => node,
        };
        let kind = self.grammar.unit_kind(definition.kind())?;

        Some(CodeUnit {
            kind,
            name: Self::definition_name(source, definition),
            start_line: node.start_position().row,
            end_line: node.end_position().row,
        })
    }

    fn definition_name(source: &str, node: Node) -> Option<String> {
        let name_node = node
            .child_by_field_name("name")
            .or_else(|| node.child_by_field_name("type"))?;
        name_node
            .utf8_text(source.as_bytes())
            .ok()
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn units(language: Language, code: &str) -> Result<Vec<CodeUnit>> {
        SyntaxRegistry::default().parser_for(language)?.top_level_units(code)
    }

    #[test]
    fn test_python_top_level_units() {
        let code = r#"import os

def first():
    return 1

@cached
def second(x):
    return x * 2

class Third:
    def method(self):
        pass
"#;
        let found = units(Language::Python, code).unwrap();
        let summary: Vec<_> = found
            .iter()
            .map(|u| (u.kind, u.name.as_deref(), u.start_line, u.end_line))
            .collect();
        assert_eq!(
            summary,
            vec![
                (UnitKind::Function, Some("first"), 2, 3),
                (UnitKind::Function, Some("second"), 5, 7),
                (UnitKind::Class, Some("Third"), 9, 11),
            ]
        );
    }

    #[test]
    fn test_rust_units() {
        let code = "struct Point { x: i32 }\n\nimpl Point {\n    fn x(&self) -> i32 { self.x }\n}\n\nfn origin() -> Point { Point { x: 0 } }\n";
        let found = units(Language::Rust, code).unwrap();
        let names: Vec<_> = found.iter().filter_map(|u| u.name.as_deref()).collect();
        assert_eq!(names, vec!["Point", "Point", "origin"]);
        assert_eq!(found[2].kind, UnitKind::Function);
    }

    #[test]
    fn test_exported_javascript_units() {
        let code = "export function load() {\n  return 1;\n}\n\nclass Store {}\n";
        let found = units(Language::JavaScript, code).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name.as_deref(), Some("load"));
        assert_eq!(found[1].kind, UnitKind::Class);
    }

    #[test]
    fn test_syntax_error_is_parse_failure() {
        let result = units(Language::Python, "def broken(:\n    pass\n");
        assert!(matches!(result, Err(ChunkerError::ParseError(_))));
    }

    #[test]
    fn test_no_definitions_is_parse_failure() {
        let result = units(Language::Python, "x = 1\nprint(x)\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_unregistered_language_unsupported() {
        let registry = SyntaxRegistry::default();
        assert!(matches!(
            registry.support_for(Language::Ruby),
            SyntaxSupport::Unsupported
        ));
        assert!(matches!(
            registry.parser_for(Language::Go),
            Err(ChunkerError::UnsupportedLanguage(_))
        ));
        assert!(matches!(
            registry.support_for(Language::Python),
            SyntaxSupport::SyntaxCapable(_)
        ));
    }

    #[test]
    fn test_registration_is_explicit() {
        let mut registry = SyntaxRegistry::empty();
        assert!(!registry.supports(Language::Python));
        registry.register(Language::Python, PYTHON);
        assert!(registry.supports(Language::Python));
        assert!(registry.unregister(Language::Python));
        assert!(!registry.supports(Language::Python));
    }
}
