//! The fixed structured-response schema sent with the synthesis call.
//!
//! Expressed in the OpenAPI subset accepted by Gemini's `responseSchema`
//! (upper-case type names). The shape mirrors [`crate::output::AnalysisReport`]
//! minus the citations, which are attached locally after parsing.

use once_cell::sync::Lazy;
use serde_json::{json, Value};

/// Fields the synthesis response must carry at the top level.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "locationName",
    "description",
    "confidenceScore",
    "forensicAnalysis",
    "environmentAnalysis",
];

static ANALYSIS_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "OBJECT",
        "properties": {
            "locationName": { "type": "STRING" },
            "description": { "type": "STRING" },
            "confidenceScore": { "type": "NUMBER" },
            "forensicAnalysis": {
                "type": "OBJECT",
                "properties": {
                    "summary": { "type": "STRING" },
                    "isAltered": { "type": "BOOLEAN" },
                    "alterationConfidence": { "type": "NUMBER" }
                },
                "required": ["summary", "isAltered", "alterationConfidence"]
            },
            "environmentAnalysis": {
                "type": "OBJECT",
                "properties": {
                    "type": {
                        "type": "STRING",
                        "enum": ["interior", "exterior", "unknown"]
                    },
                    "details": { "type": "STRING" }
                },
                "required": ["type", "details"]
            }
        },
        "required": REQUIRED_FIELDS
    })
});

/// The analysis-report schema.
pub fn analysis_schema() -> &'static Value {
    &ANALYSIS_SCHEMA
}
