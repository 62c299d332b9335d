//! The eight tool operations. Each module carries its typed input/output
//! structs, the JSON input schema, and the async entry point.

pub mod analyze;
pub mod consolidate;
pub mod delete;
pub mod export;
pub mod recall;
pub mod refine;
pub mod remember;
pub mod update;

/// Every tool's input schema, keyed by tool name, for surface discovery.
pub fn all_specs() -> Vec<serde_json::Value> {
    vec![
        remember::spec(),
        recall::spec(),
        consolidate::spec(),
        refine::spec(),
        update::spec(),
        analyze::spec(),
        export::spec(),
        delete::spec(),
    ]
}
