/// Engram system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding vector width. Must match the database column width.
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1408;

/// The closed set of supported embedding widths.
pub const VALID_EMBEDDING_DIMENSIONS: [usize; 6] = [256, 512, 1024, 1408, 1536, 3072];

/// Maximum memory content length in characters.
pub const MAX_CONTENT_LENGTH: usize = 8_000;

/// Transcript bounds for consolidation.
pub const MIN_TRANSCRIPT_LENGTH: usize = 10;
pub const MAX_TRANSCRIPT_LENGTH: usize = 100_000;

/// Cosine similarity at or above which a new write is a duplicate of an
/// existing memory.
pub const WRITE_DEDUP_THRESHOLD: f64 = 0.95;

/// Band in which a new write merges into (or matures) an existing memory.
pub const WRITE_MERGE_THRESHOLD: f64 = 0.85;

/// Lower bound of the conflict band on the write path.
pub const WRITE_CONFLICT_THRESHOLD: f64 = 0.5;

/// Nearest-neighbour probe size on the write path.
pub const NN_PROBE_TOP_K: usize = 5;

/// A draft ripens to active after this many evidence events.
pub const MATURATION_EVIDENCE_EVENTS: u32 = 3;

/// A draft ripens to active once accumulated confidence reaches this.
pub const MATURATION_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Upper bound on vectors in a single pairwise similarity sweep.
pub const PAIRWISE_SWEEP_CAP: usize = 50;

/// Maximum results a recall call may return.
pub const RECALL_MAX_LIMIT: usize = 50;

/// Maximum knowledge-graph traversal depth.
pub const MAX_TRAVERSAL_DEPTH: usize = 5;

/// Memories persisted per consolidation batch.
pub const CONSOLIDATION_BATCH_SIZE: usize = 10;

/// How many learned hubs the dictionary pass loads per user.
pub const DICTIONARY_HUB_LIMIT: usize = 500;

/// Entities carried per extracted claim.
pub const MAX_CLAIM_ENTITIES: usize = 5;

/// Shadow-listener buffer staleness and sweep cadence, in seconds.
pub const THOUGHT_BUFFER_TTL_SECS: u64 = 300;
pub const THOUGHT_BUFFER_SWEEP_SECS: u64 = 60;
