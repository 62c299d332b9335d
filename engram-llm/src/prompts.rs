//! Prompt builders for the typed LLM tasks. Strings stay here; nothing
//! outside this crate composes prompts.

pub const CLAIM_EXTRACTION_SYSTEM: &str = "You are an expert at extracting important insights from conversations.

RULES:
1. KEEP THE LANGUAGE: answer in the SAME LANGUAGE as the transcript
2. QUALITY OVER QUANTITY: extract only genuinely important statements
3. NO TRIVIAL STEPS: ignore obvious technical steps like installing a package or running a command
4. PERSONAL FOCUS: prioritise personal preferences, decisions, and insights

Return ONLY valid JSON, no other text.";

pub fn claim_extraction(transcript: &str) -> String {
    format!(
        "Analyse this conversation and extract the MOST IMPORTANT insights about the user.

EXTRACT ONLY:
- personal preferences (\"I prefer...\", \"my favourite...\")
- decisions with context (\"I chose X because...\")
- insights and learnings (\"I learned that...\")
- ways of working and workflows (\"I usually work with...\")
- project facts (\"my project is called...\", \"I'm working on...\")
- technology stack and tools the user actively uses

IGNORE:
- individual commands or installation steps
- transient debugging sessions
- obvious statements with no value
- questions without answers

For each claim:
1. \"claim\": the statement in the transcript's original language (clear, self-contained)
2. \"source\": where in the conversation it came from (short)
3. \"confidence\": certainty (0.0-1.0)
4. \"claim_type\": one of \"preference\", \"decision\", \"workflow\", \"insight\", \
\"project_fact\", \"tool_usage\", \"fact\", \"learning\", \"how_to\", \"struggle\", \"feedback\"
5. \"entities\": important entities (max 5)
6. \"importance\": 1-10 (10 = very personal/important)

Transcript:
---
{transcript}
---

JSON array (max 10-15 claims, only the most important):"
    )
}

pub const CONFLICT_SYSTEM: &str = "You are an expert at analyzing potentially conflicting statements and understanding nuance.
Your goal is to determine if two statements truly conflict or if they can both be true in different contexts.
Return ONLY valid JSON, no other text.";

pub fn conflict_resolution(statement_a: &str, statement_b: &str, similarity: f64) -> String {
    format!(
        "Analyze these two potentially conflicting statements from the same user:

Statement A: \"{statement_a}\"
Statement B: \"{statement_b}\"

Similarity score: {similarity:.2}

Determine:
1. Are these truly contradictory, or can both be true?
2. If both can be true, explain how (e.g., different contexts, evolution of thinking)
3. If there's been an evolution in preference/thinking, describe it

Return JSON:
{{
  \"resolution\": \"Explanation of how both statements relate\",
  \"is_real_conflict\": true/false,
  \"evolved_memory\": \"If there's evolution, describe the change (or null)\",
  \"confidence\": 0.0-1.0
}}

JSON Response:"
    )
}

pub fn contradiction_check(statement_a: &str, statement_b: &str) -> String {
    format!(
        "Do these two statements from the same user contradict each other?

Statement A: \"{statement_a}\"
Statement B: \"{statement_b}\"

A contradiction means they cannot both be true for the same person at the
same time (opposite preferences about the same thing, mutually exclusive
facts).

Return JSON: {{\"contradicts\": true/false}}

JSON Response:"
    )
}

pub const ENTITY_SYSTEM: &str = "You are an expert at extracting named entities from text.
Focus on: technologies, programming languages, frameworks, tools, concepts, people, organizations.
Return ONLY a JSON array of strings, no other text.";

pub fn entity_extraction(text: &str) -> String {
    format!(
        "Extract all important entities from this text:

\"{text}\"

Return a JSON array of entity names. Example: [\"Python\", \"FastAPI\", \"async/await\", \"TypeScript\"]

JSON Response:"
    )
}

pub const RELATIONSHIP_SYSTEM: &str = "You are an expert at inferring relationships between concepts based on context.
Return ONLY valid JSON, no other text.";

pub fn relationship_inference(claims_text: &str, entities_text: &str) -> String {
    format!(
        "Based on these statements, infer relationships between the entities.

Statements:
{claims_text}

Entities: {entities_text}

For each relationship found, provide:
1. \"from_entity\": source entity name
2. \"to_entity\": target entity name
3. \"relationship_type\": one of: likes, dislikes, leads_to, related_to, depends_on, evolves_into, contradicts, supports
4. \"confidence\": your confidence (0.0-1.0)

Return a JSON array. Example:
[
  {{\"from_entity\": \"TypeScript\", \"to_entity\": \"JavaScript\", \"relationship_type\": \"related_to\", \"confidence\": 0.9}}
]

JSON Response:"
    )
}

pub const PATTERN_SYSTEM: &str = "You are an expert at identifying patterns in user behavior and preferences.
Respond in the SAME LANGUAGE as the input.
Return ONLY a JSON array of strings, no other text.";

pub fn pattern_detection(claims_text: &str) -> String {
    format!(
        "Analyse these statements and identify patterns:

{claims_text}

Look for:
- consistent preferences (e.g. \"prefers modern tooling\")
- evolution in thinking (e.g. \"moved from X to Y\")
- recurring themes (e.g. \"focus on developer experience\")
- learning patterns (e.g. \"learns through hands-on projects\")
- ways of working (e.g. \"iterative development approach\")

Return a JSON array with 3-5 pattern descriptions.
Each pattern should be specific and meaningful.

Example: [\"Prefers TypeScript for type safety\", \"Uses Docker for consistent environments\"]

JSON:"
    )
}

pub const CLASSIFICATION_SYSTEM: &str = "You are an expert at classifying personal knowledge into a taxonomy.
Return ONLY valid JSON, no other text.";

pub fn content_classification(
    content: &str,
    known_domains: &[String],
    known_categories: &[String],
) -> String {
    let domains = if known_domains.is_empty() {
        "(none yet)".to_string()
    } else {
        known_domains.join(", ")
    };
    let categories = if known_categories.is_empty() {
        "(none yet)".to_string()
    } else {
        known_categories.join(", ")
    };
    format!(
        "Classify this memory content:

\"{content}\"

The closed set of domains is: KnowWhere, Personal, General.
Domains already in use: {domains}
Categories already in use: {categories}

Provide:
1. \"memory_type\": one of \"episodic\", \"semantic\", \"preference\", \"procedural\", \"meta\" (or null if unsure)
2. \"domain\": one of the closed-set domains
3. \"category\": a short hierarchical path such as \"Backend/Auth\" (or null)

Reuse existing categories when one fits.

Return JSON: {{\"memory_type\": ..., \"domain\": ..., \"category\": ...}}

JSON Response:"
    )
}

pub const TIMELINE_SYSTEM: &str = "You are an expert at analyzing user preference evolution. Return only valid JSON.";

pub fn timeline_insights(entity_name: &str, timeline: &str) -> String {
    format!(
        "Analyze this evolution timeline for \"{entity_name}\":

{timeline}

Provide:
1. 2-3 key patterns you observe
2. 2-3 insights about how this evolved

Return as JSON:
{{
  \"patterns\": [\"pattern1\", \"pattern2\"],
  \"insights\": [\"insight1\", \"insight2\"]
}}"
    )
}

pub const LISTENER_SYSTEM: &str = "You are a librarian listening to a conversation. Extract things the user \
said about themselves (facts, preferences) or things learned during the \
session. Return a JSON list of objects: \
{\"content\": \"...\", \"role\": \"user|assistant\", \"reason\": \"...\"}";

pub fn listener_extraction(context: &str) -> String {
    format!(
        "Analyze this conversation snippet and extract key memories:

{context}

Strict JSON output only."
    )
}
