//! Regex pattern families for heuristic entity extraction.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

fn camel_case() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z][a-z]+(?:[A-Z][a-z]+)+\b").unwrap())
}

fn kebab_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[a-z]+(?:-[a-z]+)+\b").unwrap())
}

fn scoped_package() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@[\w-]+/[\w-]+").unwrap())
}

fn versioned_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Z][a-z]+)\s*\d+(?:\.\d+)*\b").unwrap())
}

fn file_extension() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.([a-z]{2,4})\b").unwrap())
}

/// File extensions that indicate a language.
const EXTENSION_MAP: &[(&str, &str)] = &[
    ("py", "Python"),
    ("ts", "TypeScript"),
    ("js", "JavaScript"),
    ("rs", "Rust"),
    ("go", "Go"),
    ("rb", "Ruby"),
    ("java", "Java"),
    ("sql", "SQL"),
];

/// Extract entities by shape: CamelCase tokens, kebab-style package names,
/// scoped packages, version-qualified names, and language-indicating file
/// extensions.
pub fn extract(text: &str) -> BTreeSet<String> {
    let mut entities = BTreeSet::new();

    for m in camel_case().find_iter(text) {
        entities.insert(m.as_str().to_string());
    }
    for m in kebab_name().find_iter(text) {
        if m.as_str().len() > 3 {
            entities.insert(m.as_str().to_string());
        }
    }
    for m in scoped_package().find_iter(text) {
        entities.insert(m.as_str().to_string());
    }
    for caps in versioned_name().captures_iter(text) {
        if let Some(name) = caps.get(1) {
            entities.insert(name.as_str().to_string());
        }
    }
    let lower = text.to_lowercase();
    for caps in file_extension().captures_iter(&lower) {
        if let Some(ext) = caps.get(1) {
            if let Some((_, language)) = EXTENSION_MAP.iter().find(|(e, _)| *e == ext.as_str()) {
                entities.insert((*language).to_string());
            }
        }
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_tokens() {
        let found = extract("I moved the app to NextAuth and TailwindCss");
        assert!(found.contains("NextAuth"));
        assert!(found.contains("TailwindCss"));
    }

    #[test]
    fn kebab_names_need_length() {
        let found = extract("installed react-query and a-b");
        assert!(found.contains("react-query"));
        assert!(!found.contains("a-b"));
    }

    #[test]
    fn scoped_packages() {
        let found = extract("added @tanstack/query to the project");
        assert!(found.contains("@tanstack/query"));
    }

    #[test]
    fn versioned_names_capture_the_name() {
        let found = extract("upgraded to Python 3.11 and Node 18");
        assert!(found.contains("Python"));
        assert!(found.contains("Node"));
    }

    #[test]
    fn file_extensions_map_to_languages() {
        let found = extract("edited main.rs and utils.py");
        assert!(found.contains("Rust"));
        assert!(found.contains("Python"));
    }
}
