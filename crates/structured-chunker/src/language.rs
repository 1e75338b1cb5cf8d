use once_cell::sync::Lazy;
use regex::Regex;

/// Language named by a code fence info string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Go,
    Java,
    C,
    Cpp,
    CSharp,
    Ruby,
    Shell,
    Unknown,
}

impl Language {
    /// Detect language from a fence tag (`python`, `py`, `rs`, ...)
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "rust" | "rs" => Language::Rust,
            "python" | "py" | "python3" | "py3" => Language::Python,
            "javascript" | "js" | "jsx" | "mjs" | "node" => Language::JavaScript,
            "typescript" | "ts" | "tsx" => Language::TypeScript,
            "go" | "golang" => Language::Go,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "c++" | "cc" | "cxx" | "hpp" => Language::Cpp,
            "csharp" | "c#" | "cs" => Language::CSharp,
            "ruby" | "rb" => Language::Ruby,
            "bash" | "sh" | "shell" | "zsh" | "console" => Language::Shell,
            _ => Language::Unknown,
        }
    }

    /// Get language name as string
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Ruby => "ruby",
            Language::Shell => "shell",
            Language::Unknown => "unknown",
        }
    }

    /// Best-effort function names found by pattern matching.
    ///
    /// Misses are expected (nested or unusual syntax); the result only tags
    /// chunks and never decides where a chunk ends.
    pub fn function_names(self, code: &str) -> Vec<String> {
        let patterns: Vec<&'static Regex> = match self {
            Language::Python => vec![&*PY_DEF],
            Language::JavaScript | Language::TypeScript => {
                vec![&*JS_FUNCTION, &*JS_ARROW, &*JS_METHOD]
            }
            Language::Rust => vec![&*RUST_FN],
            _ => Vec::new(),
        };
        capture_names(&patterns, code)
    }

    /// Best-effort class names found by pattern matching
    pub fn class_names(self, code: &str) -> Vec<String> {
        let patterns: Vec<&'static Regex> = match self {
            Language::Python => vec![&*PY_CLASS],
            Language::JavaScript | Language::TypeScript => vec![&*JS_CLASS],
            Language::Rust => vec![&*RUST_TYPE],
            _ => Vec::new(),
        };
        capture_names(&patterns, code)
    }
}

static PY_DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bdef\s+(\w+)\s*\(").expect("python def pattern"));
static PY_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bclass\s+(\w+)\s*[(:]").expect("python class pattern"));
static JS_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bfunction\s+(\w+)\s*\(").expect("js function pattern"));
static JS_ARROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bconst\s+(\w+)\s*=\s*(?:async\s+)?\(").expect("js arrow pattern")
});
static JS_METHOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*:\s*(?:async\s+)?\(").expect("js method pattern"));
static JS_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bclass\s+(\w+)\s*(?:extends\s+[\w.]+)?\s*\{").expect("js class pattern")
});
static RUST_FN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bfn\s+(\w+)").expect("rust fn pattern"));
static RUST_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:struct|enum|trait)\s+(\w+)").expect("rust type pattern")
});

fn capture_names(patterns: &[&Regex], code: &str) -> Vec<String> {
    let mut names = Vec::new();
    for pattern in patterns {
        for caps in pattern.captures_iter(code) {
            if let Some(name) = caps.get(1) {
                names.push(name.as_str().to_string());
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag() {
        assert_eq!(Language::from_tag("python"), Language::Python);
        assert_eq!(Language::from_tag("PY"), Language::Python);
        assert_eq!(Language::from_tag("rs"), Language::Rust);
        assert_eq!(Language::from_tag("ts"), Language::TypeScript);
        assert_eq!(Language::from_tag("ruby"), Language::Ruby);
        assert_eq!(Language::from_tag("plain"), Language::Unknown);
        assert_eq!(Language::from_tag(""), Language::Unknown);
    }

    #[test]
    fn test_python_names() {
        let code = "class Greeter(Base):\n    def greet(self):\n        pass\n\nasync def main():\n    pass\n";
        assert_eq!(Language::Python.function_names(code), vec!["greet", "main"]);
        assert_eq!(Language::Python.class_names(code), vec!["Greeter"]);
    }

    #[test]
    fn test_javascript_names() {
        let code = "function load(url) {}\nconst save = async (x) => x;\nclass Store extends Base {\n}\n";
        let functions = Language::JavaScript.function_names(code);
        assert!(functions.contains(&"load".to_string()));
        assert!(functions.contains(&"save".to_string()));
        assert_eq!(Language::JavaScript.class_names(code), vec!["Store"]);
    }

    #[test]
    fn test_rust_names() {
        let code = "pub struct Point;\nfn origin() -> Point { Point }\n";
        assert_eq!(Language::Rust.function_names(code), vec!["origin"]);
        assert_eq!(Language::Rust.class_names(code), vec!["Point"]);
    }

    #[test]
    fn test_unsupported_language_yields_nothing() {
        let code = "def hello\n  puts 'hi'\nend\n";
        assert!(Language::Ruby.function_names(code).is_empty());
        assert!(Language::Ruby.class_names(code).is_empty());
    }
}
