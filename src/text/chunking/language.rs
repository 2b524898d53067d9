//! Per-language separator tables for syntax-aware code splitting

use super::error::ChunkingError;
use std::path::Path;
use std::str::FromStr;

/// Separators for generic prose, coarse to fine.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

// Entries are regex patterns; keep metacharacters escaped.
const PYTHON: &[&str] = &["\nclass ", "\ndef ", "\n\tdef ", "\n\n", "\n", " ", ""];

const RUST: &[&str] = &[
    "\nfn ", "\nconst ", "\nlet ", "\nif ", "\nwhile ", "\nfor ", "\nloop ", "\nmatch ", "\n\n",
    "\n", " ", "",
];

const JS: &[&str] = &[
    "\nfunction ",
    "\nconst ",
    "\nlet ",
    "\nvar ",
    "\nclass ",
    "\nif ",
    "\nfor ",
    "\nwhile ",
    "\nswitch ",
    "\ncase ",
    "\ndefault ",
    "\n\n",
    "\n",
    " ",
    "",
];

const TS: &[&str] = &[
    "\nenum ",
    "\ninterface ",
    "\nnamespace ",
    "\ntype ",
    "\nclass ",
    "\nfunction ",
    "\nconst ",
    "\nlet ",
    "\nvar ",
    "\nif ",
    "\nfor ",
    "\nwhile ",
    "\nswitch ",
    "\ncase ",
    "\ndefault ",
    "\n\n",
    "\n",
    " ",
    "",
];

const JAVA: &[&str] = &[
    "\nclass ",
    "\npublic ",
    "\nprotected ",
    "\nprivate ",
    "\nstatic ",
    "\nif ",
    "\nfor ",
    "\nwhile ",
    "\nswitch ",
    "\ncase ",
    "\n\n",
    "\n",
    " ",
    "",
];

const GO: &[&str] = &[
    "\nfunc ", "\nvar ", "\nconst ", "\ntype ", "\nif ", "\nfor ", "\nswitch ", "\ncase ", "\n\n",
    "\n", " ", "",
];

// C and C++ share a table.
const C_FAMILY: &[&str] = &[
    "\nclass ",
    "\nvoid ",
    "\nint ",
    "\nfloat ",
    "\ndouble ",
    "\nif ",
    "\nfor ",
    "\nwhile ",
    "\nswitch ",
    "\ncase ",
    "\n\n",
    "\n",
    " ",
    "",
];

const CSHARP: &[&str] = &[
    "\ninterface ",
    "\nenum ",
    "\nimplements ",
    "\ndelegate ",
    "\nevent ",
    "\nclass ",
    "\nabstract ",
    "\npublic ",
    "\nprotected ",
    "\nprivate ",
    "\nstatic ",
    "\nreturn ",
    "\nif ",
    "\ncontinue ",
    "\nfor ",
    "\nforeach ",
    "\nwhile ",
    "\nswitch ",
    "\nbreak ",
    "\ncase ",
    "\nelse ",
    "\ntry ",
    "\nthrow ",
    "\nfinally ",
    "\ncatch ",
    "\n\n",
    "\n",
    " ",
    "",
];

const RUBY: &[&str] = &[
    "\ndef ", "\nclass ", "\nif ", "\nunless ", "\nwhile ", "\nfor ", "\ndo ", "\nbegin ",
    "\nrescue ", "\n\n", "\n", " ", "",
];

const PHP: &[&str] = &[
    "\nfunction ",
    "\nclass ",
    "\nif ",
    "\nforeach ",
    "\nwhile ",
    "\ndo ",
    "\nswitch ",
    "\ncase ",
    "\n\n",
    "\n",
    " ",
    "",
];

const MARKDOWN: &[&str] = &[
    // headings, then fenced code, then horizontal rules
    r"\n#{1,6} ",
    "```\n",
    r"\n\*\*\*+\n",
    r"\n---+\n",
    r"\n___+\n",
    "\n\n",
    "\n",
    " ",
    "",
];

const HTML: &[&str] = &[
    "<body", "<div", "<p", "<br", "<li", "<h1", "<h2", "<h3", "<h4", "<h5", "<h6", "<span",
    "<table", "<tr", "<td", "<th", "<ul", "<ol", "<header", "<footer", "<nav", "<head", "<style",
    "<script", "<meta", "<title", "",
];

/// Languages with a syntax-aware separator table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    Rust,
    Js,
    Ts,
    Java,
    Go,
    Cpp,
    C,
    CSharp,
    Ruby,
    Php,
    Markdown,
    Html,
}

impl Language {
    pub const ALL: [Language; 13] = [
        Language::Python,
        Language::Rust,
        Language::Js,
        Language::Ts,
        Language::Java,
        Language::Go,
        Language::Cpp,
        Language::C,
        Language::CSharp,
        Language::Ruby,
        Language::Php,
        Language::Markdown,
        Language::Html,
    ];

    /// Ordered separator patterns, coarsest first. The last entry is always `""`.
    pub fn separators(&self) -> &'static [&'static str] {
        match self {
            Language::Python => PYTHON,
            Language::Rust => RUST,
            Language::Js => JS,
            Language::Ts => TS,
            Language::Java => JAVA,
            Language::Go => GO,
            Language::Cpp | Language::C => C_FAMILY,
            Language::CSharp => CSHARP,
            Language::Ruby => RUBY,
            Language::Php => PHP,
            Language::Markdown => MARKDOWN,
            Language::Html => HTML,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Rust => "rust",
            Language::Js => "js",
            Language::Ts => "ts",
            Language::Java => "java",
            Language::Go => "go",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::CSharp => "csharp",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Markdown => "markdown",
            Language::Html => "html",
        }
    }

    /// Map a file extension (without the dot) to a language
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "py" | "pyi" => Some(Language::Python),
            "rs" => Some(Language::Rust),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::Js),
            "ts" | "tsx" => Some(Language::Ts),
            "java" => Some(Language::Java),
            "go" => Some(Language::Go),
            "cpp" | "cc" | "cxx" | "hpp" | "hh" => Some(Language::Cpp),
            "c" | "h" => Some(Language::C),
            "cs" => Some(Language::CSharp),
            "rb" => Some(Language::Ruby),
            "php" => Some(Language::Php),
            "md" | "markdown" => Some(Language::Markdown),
            "html" | "htm" => Some(Language::Html),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Whether the language is a programming language (as opposed to markup)
    pub fn is_source_code(&self) -> bool {
        !matches!(self, Language::Markdown | Language::Html)
    }
}

impl FromStr for Language {
    type Err = ChunkingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "rust" | "rs" => Ok(Language::Rust),
            "js" | "javascript" => Ok(Language::Js),
            "ts" | "typescript" => Ok(Language::Ts),
            "java" => Ok(Language::Java),
            "go" | "golang" => Ok(Language::Go),
            "cpp" | "c++" => Ok(Language::Cpp),
            "c" => Ok(Language::C),
            "csharp" | "c#" | "cs" => Ok(Language::CSharp),
            "ruby" | "rb" => Ok(Language::Ruby),
            "php" => Ok(Language::Php),
            "markdown" | "md" => Ok(Language::Markdown),
            "html" => Ok(Language::Html),
            _ => Err(ChunkingError::unknown_language(s)),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_ends_with_empty_separator() {
        for lang in Language::ALL {
            let separators = lang.separators();
            assert_eq!(separators.last(), Some(&""), "{lang} must end with \"\"");
        }
    }

    #[test]
    fn test_programming_tables_fall_back_to_lines_then_words() {
        for lang in Language::ALL.iter().filter(|l| l.is_source_code()) {
            let separators = lang.separators();
            let n = separators.len();
            assert_eq!(separators[n - 2], " ", "{lang}");
            assert_eq!(separators[n - 3], "\n", "{lang}");
            assert_eq!(separators[n - 4], "\n\n", "{lang}");
        }
    }

    #[test]
    fn test_python_prefers_class_then_def() {
        let separators = Language::Python.separators();
        assert_eq!(separators[0], "\nclass ");
        assert_eq!(separators[1], "\ndef ");
        assert_eq!(separators.len(), 7);
    }

    #[test]
    fn test_c_and_cpp_share_table() {
        assert_eq!(Language::C.separators(), Language::Cpp.separators());
    }

    #[test]
    fn test_tables_compile_as_regex() {
        for lang in Language::ALL {
            for sep in lang.separators() {
                assert!(regex::Regex::new(sep).is_ok(), "{lang}: {sep:?}");
            }
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("PY".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("c++".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!("md".parse::<Language>().unwrap(), Language::Markdown);
        assert!(matches!(
            "cobol".parse::<Language>(),
            Err(ChunkingError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            Language::from_path(Path::new("src/main.rs")),
            Some(Language::Rust)
        );
        assert_eq!(
            Language::from_path(Path::new("script.PY")),
            Some(Language::Python)
        );
        assert_eq!(Language::from_path(Path::new("notes.txt")), None);
        assert_eq!(Language::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_name_round_trip() {
        for lang in Language::ALL {
            assert_eq!(lang.name().parse::<Language>().unwrap(), lang);
        }
    }
}
