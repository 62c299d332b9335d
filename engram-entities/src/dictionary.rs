//! Global technology dictionary and canonical display casing.

/// Technology terms matched without asking the language model.
pub const KNOWN_TECHNOLOGIES: &[&str] = &[
    // Languages
    "python", "javascript", "typescript", "java", "c++", "c#", "go", "golang",
    "rust", "ruby", "php", "swift", "kotlin", "scala", "julia",
    // Web frameworks
    "react", "vue", "angular", "svelte", "next.js", "nextjs", "nuxt", "remix",
    "fastapi", "django", "flask", "express", "nestjs", "rails", "laravel",
    // Databases
    "postgresql", "postgres", "mysql", "mongodb", "redis", "elasticsearch",
    "sqlite", "dynamodb", "cassandra", "neo4j", "supabase", "firebase",
    // Cloud / DevOps
    "aws", "azure", "gcp", "docker", "kubernetes", "k8s", "terraform",
    "github actions", "gitlab ci", "jenkins", "vercel", "netlify", "railway",
    // AI / ML
    "openai", "anthropic", "claude", "gpt", "llm", "langchain", "llamaindex",
    "pytorch", "tensorflow", "scikit-learn", "pandas", "numpy",
    // Tools
    "git", "npm", "yarn", "pnpm", "pip", "poetry", "vscode", "cursor",
    "postman", "figma", "notion", "slack", "discord",
    // Concepts
    "async/await", "rest api", "graphql", "websocket", "microservices",
    "serverless", "ci/cd", "devops", "agile", "scrum",
];

/// Canonical display casing for well-known names. Keys are the lowercase
/// dedup keys.
pub const CASING_MAP: &[(&str, &str)] = &[
    ("javascript", "JavaScript"),
    ("typescript", "TypeScript"),
    ("postgresql", "PostgreSQL"),
    ("mongodb", "MongoDB"),
    ("graphql", "GraphQL"),
    ("nextjs", "Next.js"),
    ("next.js", "Next.js"),
    ("nodejs", "Node.js"),
    ("vuejs", "Vue.js"),
    ("reactjs", "React"),
    ("github", "GitHub"),
    ("gitlab", "GitLab"),
    ("vscode", "VS Code"),
    ("fastapi", "FastAPI"),
    ("openai", "OpenAI"),
    ("chatgpt", "ChatGPT"),
    ("aws", "AWS"),
    ("gcp", "GCP"),
    ("api", "API"),
    ("sql", "SQL"),
    ("css", "CSS"),
    ("html", "HTML"),
    ("json", "JSON"),
    ("xml", "XML"),
    ("yaml", "YAML"),
    ("llm", "LLM"),
    ("ai", "AI"),
    ("ml", "ML"),
];

/// Canonical casing for a lowercase key, if one is registered.
pub fn canonical_casing(key: &str) -> Option<&'static str> {
    CASING_MAP
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, display)| *display)
}

/// Display form for a dictionary term: canonical casing where known, else
/// title-case for longer terms and uppercase for short acronyms.
pub fn dictionary_display(term: &str) -> String {
    if let Some(canonical) = canonical_casing(term) {
        return canonical.to_string();
    }
    if term.len() <= 3 {
        return term.to_uppercase();
    }
    let mut chars = term.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_casing_hits() {
        assert_eq!(canonical_casing("typescript"), Some("TypeScript"));
        assert_eq!(canonical_casing("nope"), None);
    }

    #[test]
    fn short_terms_uppercase_long_terms_titlecase() {
        assert_eq!(dictionary_display("git"), "GIT");
        assert_eq!(dictionary_display("docker"), "Docker");
        assert_eq!(dictionary_display("aws"), "AWS");
    }
}
