//! Parsing and validation of the synthesis response.
//!
//! A response is accepted only if it parses as the report schema *and* carries
//! a non-empty `locationName`, a non-empty `description` and a numeric
//! `confidenceScore`. Anything else — malformed JSON, a missing field, an
//! unknown environment label — is an [`AnalysisError::InvalidResponseFormat`],
//! never a raw `serde_json` error.
//!
//! Numeric fields are not clamped. A report claiming `isAltered: false` with
//! a non-zero `alterationConfidence` is logged and passed through as-is.

use crate::error::AnalysisError;
use crate::output::{AnalysisReport, Citation, EnvironmentAssessment, ForensicAssessment};
use crate::transport::CitationChunk;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

/// Wire shape with the individually checked fields left optional, so a
/// missing one can be reported by name instead of as a serde error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReport {
    location_name: Option<String>,
    description: Option<String>,
    confidence_score: Option<f64>,
    forensic_analysis: ForensicAssessment,
    environment_analysis: EnvironmentAssessment,
}

/// Parse and validate raw synthesis text into a report with no citations.
pub fn parse_and_validate(raw: &str) -> Result<AnalysisReport, AnalysisError> {
    let body = strip_json_fences(raw);

    let parsed: RawReport = serde_json::from_str(body).map_err(|e| {
        debug!("Unparseable synthesis payload: {}", e);
        AnalysisError::invalid_format(format!("response is not a valid report: {e}"))
    })?;

    let location_name = required_text(parsed.location_name, "locationName")?;
    let description = required_text(parsed.description, "description")?;
    let confidence_score = parsed
        .confidence_score
        .ok_or_else(|| AnalysisError::invalid_format("missing field 'confidenceScore'"))?;

    if !parsed.forensic_analysis.is_consistent() {
        warn!(
            "Report marks the image as unaltered but alterationConfidence = {}; keeping as returned",
            parsed.forensic_analysis.alteration_confidence
        );
    }

    Ok(AnalysisReport {
        location_name,
        description,
        confidence_score,
        forensic: parsed.forensic_analysis,
        environment: parsed.environment_analysis,
        citations: Vec::new(),
    })
}

fn required_text(value: Option<String>, field: &str) -> Result<String, AnalysisError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(AnalysisError::invalid_format(format!(
            "field '{field}' is empty"
        ))),
        None => Err(AnalysisError::invalid_format(format!(
            "missing field '{field}'"
        ))),
    }
}

/// Keep only chunks with both a URI and a title, in their original order.
pub fn complete_citations(chunks: &[CitationChunk]) -> Vec<Citation> {
    let kept: Vec<Citation> = chunks
        .iter()
        .filter_map(|c| match (&c.uri, &c.title) {
            (Some(uri), Some(title)) if !uri.is_empty() && !title.is_empty() => Some(Citation {
                uri: uri.clone(),
                title: title.clone(),
            }),
            _ => None,
        })
        .collect();
    if kept.len() < chunks.len() {
        debug!(
            "Dropped {} incomplete citation chunk(s)",
            chunks.len() - kept.len()
        );
    }
    kept
}

static RE_JSON_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*\n(.*?)\n?```$").unwrap());

/// Remove a single outer ```json fence. Structured-output transports never
/// add one; chat-style providers sometimes do.
fn strip_json_fences(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_JSON_FENCES.captures(trimmed).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().trim(),
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::EnvironmentKind;
    use serde_json::{json, Value};

    fn full_payload() -> Value {
        json!({
            "locationName": "Bárcena Mayor, Cantabria",
            "description": "Stone houses with wooden balconies.",
            "confidenceScore": 81.5,
            "forensicAnalysis": {
                "summary": "No signs of manipulation.",
                "isAltered": false,
                "alterationConfidence": 0
            },
            "environmentAnalysis": {
                "type": "exterior",
                "details": "Village street."
            }
        })
    }

    fn without(field: &str) -> String {
        let mut v = full_payload();
        v.as_object_mut().unwrap().remove(field);
        v.to_string()
    }

    #[test]
    fn full_payload_is_copied_losslessly() {
        let report = parse_and_validate(&full_payload().to_string()).unwrap();
        assert_eq!(report.location_name, "Bárcena Mayor, Cantabria");
        assert_eq!(report.description, "Stone houses with wooden balconies.");
        assert_eq!(report.confidence_score, 81.5);
        assert_eq!(report.forensic.summary, "No signs of manipulation.");
        assert!(!report.forensic.is_altered);
        assert_eq!(report.forensic.alteration_confidence, 0.0);
        assert_eq!(report.environment.kind, EnvironmentKind::Exterior);
        assert_eq!(report.environment.details, "Village street.");
        assert!(report.citations.is_empty());

        // Re-serialising yields the input payload plus an empty citation list.
        let mut expected = full_payload();
        expected["citations"] = json!([]);
        expected["forensicAnalysis"]["alterationConfidence"] = json!(0.0);
        assert_eq!(serde_json::to_value(&report).unwrap(), expected);
    }

    #[test]
    fn missing_confidence_score_is_invalid_format() {
        let err = parse_and_validate(&without("confidenceScore")).unwrap_err();
        match err {
            AnalysisError::InvalidResponseFormat { detail } => {
                assert!(detail.contains("confidenceScore"), "got: {detail}")
            }
            e => panic!("expected InvalidResponseFormat, got {e:?}"),
        }
    }

    #[test]
    fn null_confidence_score_is_invalid_format() {
        let mut v = full_payload();
        v["confidenceScore"] = Value::Null;
        let err = parse_and_validate(&v.to_string()).unwrap_err();
        assert_eq!(err.code(), "INVALID_RESPONSE_FORMAT");
    }

    #[test]
    fn missing_or_empty_text_fields_are_invalid_format() {
        for field in ["locationName", "description"] {
            let err = parse_and_validate(&without(field)).unwrap_err();
            assert_eq!(err.code(), "INVALID_RESPONSE_FORMAT", "{field}");
        }
        let mut v = full_payload();
        v["locationName"] = json!("  ");
        let err = parse_and_validate(&v.to_string()).unwrap_err();
        assert!(err.to_string().contains("empty"), "got: {err}");
    }

    #[test]
    fn missing_nested_objects_are_invalid_format() {
        for field in ["forensicAnalysis", "environmentAnalysis"] {
            let err = parse_and_validate(&without(field)).unwrap_err();
            assert_eq!(err.code(), "INVALID_RESPONSE_FORMAT", "{field}");
        }
    }

    #[test]
    fn malformed_json_is_invalid_format() {
        for raw in ["", "not json", "{\"locationName\": ", "[1, 2, 3]"] {
            let err = parse_and_validate(raw).unwrap_err();
            assert_eq!(err.code(), "INVALID_RESPONSE_FORMAT", "{raw:?}");
        }
    }

    #[test]
    fn unknown_environment_label_is_invalid_format() {
        let mut v = full_payload();
        v["environmentAnalysis"]["type"] = json!("underwater");
        let err = parse_and_validate(&v.to_string()).unwrap_err();
        assert_eq!(err.code(), "INVALID_RESPONSE_FORMAT");
    }

    #[test]
    fn out_of_range_scores_pass_through() {
        let mut v = full_payload();
        v["confidenceScore"] = json!(140);
        v["forensicAnalysis"]["alterationConfidence"] = json!(-3);
        let report = parse_and_validate(&v.to_string()).unwrap();
        assert_eq!(report.confidence_score, 140.0);
        assert_eq!(report.forensic.alteration_confidence, -3.0);
    }

    #[test]
    fn inconsistent_alteration_confidence_is_preserved() {
        let mut v = full_payload();
        v["forensicAnalysis"]["alterationConfidence"] = json!(35);
        let report = parse_and_validate(&v.to_string()).unwrap();
        assert!(!report.forensic.is_altered);
        assert_eq!(report.forensic.alteration_confidence, 35.0);
    }

    #[test]
    fn fenced_json_is_accepted() {
        let raw = format!("```json\n{}\n```", full_payload());
        let report = parse_and_validate(&raw).unwrap();
        assert_eq!(report.location_name, "Bárcena Mayor, Cantabria");

        let raw = format!("  \n```\n{}```  ", full_payload());
        assert!(parse_and_validate(&raw).is_ok());
    }

    #[test]
    fn citations_keep_only_complete_chunks_in_order() {
        let chunks = vec![
            CitationChunk {
                uri: Some("https://a.example".into()),
                title: Some("A".into()),
            },
            CitationChunk {
                uri: Some("https://b.example".into()),
                title: None,
            },
            CitationChunk {
                uri: None,
                title: Some("C".into()),
            },
            CitationChunk {
                uri: Some("https://d.example".into()),
                title: Some("D".into()),
            },
        ];
        let kept = complete_citations(&chunks);
        assert_eq!(
            kept,
            vec![
                Citation {
                    uri: "https://a.example".into(),
                    title: "A".into()
                },
                Citation {
                    uri: "https://d.example".into(),
                    title: "D".into()
                },
            ]
        );
    }
}
