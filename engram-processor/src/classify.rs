//! Classification fallback: domain taxonomy coercion and type heuristics.

use engram_core::memory::MemoryType;
use engram_core::traits::Classification;

/// The closed domain set. Anything else is coerced into `KnowWhere` with
/// the original label prefixed into the category path.
pub const DOMAINS: [&str; 3] = ["KnowWhere", "Personal", "General"];

pub const DEFAULT_DOMAIN: &str = "KnowWhere";
pub const DEFAULT_CATEGORY: &str = "General";

/// Force a classification into the closed domain set.
pub fn coerce_domain(classification: Classification) -> Classification {
    let Classification {
        memory_type,
        domain,
        category,
    } = classification;

    let (domain, category) = match domain {
        Some(d) if DOMAINS.contains(&d.as_str()) => (Some(d), category),
        Some(unknown) => {
            let category = match category {
                Some(c) => Some(format!("{unknown}/{c}")),
                None => Some(unknown.clone()),
            };
            (Some(DEFAULT_DOMAIN.to_string()), category)
        }
        None => (None, category),
    };

    Classification {
        memory_type,
        domain,
        category,
    }
}

/// The fallback used when the language model is unreachable after retries.
pub fn fallback_classification() -> Classification {
    Classification {
        memory_type: Some(MemoryType::Semantic),
        domain: Some(DEFAULT_DOMAIN.to_string()),
        category: Some(DEFAULT_CATEGORY.to_string()),
    }
}

const PREFERENCE_KEYWORDS: &[&str] = &[
    "prefer", "like", "love", "hate", "dislike", "favorite", "favourite", "rather",
    "always use", "never use", "better than", "instead of",
];

const PROCEDURAL_KEYWORDS: &[&str] = &[
    "how to", "step by step", "to do this", "first,", "then,", "finally,",
    "run", "execute", "install", "configure",
];

const META_KEYWORDS: &[&str] = &[
    "struggling with", "confused about", "learning", "don't understand",
    "trying to figure out", "getting better at", "expertise in",
];

const EPISODIC_KEYWORDS: &[&str] = &[
    "today", "yesterday", "last week", "during the session", "mentioned that",
    "said that", "told me",
];

/// Keyword heuristic for memory type when neither the caller nor the
/// classifier provided one. Defaults to semantic.
pub fn infer_memory_type(content: &str) -> MemoryType {
    let lower = content.to_lowercase();
    let has = |keywords: &[&str]| keywords.iter().any(|kw| lower.contains(kw));

    if has(PREFERENCE_KEYWORDS) {
        MemoryType::Preference
    } else if has(PROCEDURAL_KEYWORDS) {
        MemoryType::Procedural
    } else if has(META_KEYWORDS) {
        MemoryType::Meta
    } else if has(EPISODIC_KEYWORDS) {
        MemoryType::Episodic
    } else {
        MemoryType::Semantic
    }
}
