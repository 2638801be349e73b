//! The terminal artifact of a pipeline run.
//!
//! Field names serialise in camelCase so a report round-trips with the JSON
//! shape the remote service is asked to produce (see [`crate::schema`]).

use serde::{Deserialize, Serialize};

/// A web source returned by a search-grounded call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub uri: String,
    pub title: String,
}

/// A provisional location, produced before synthesis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub text: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// Authenticity assessment of the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForensicAssessment {
    pub summary: String,
    pub is_altered: bool,
    /// 0–100. Expected to be 0 when `is_altered` is false, but not enforced.
    pub alteration_confidence: f64,
}

impl ForensicAssessment {
    /// `false` when the model claims an unaltered image yet reports a
    /// non-zero alteration confidence.
    pub fn is_consistent(&self) -> bool {
        self.is_altered || self.alteration_confidence == 0.0
    }
}

/// Indoor / outdoor classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentKind {
    Interior,
    Exterior,
    #[serde(alias = "desconocido")]
    Unknown,
}

impl EnvironmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EnvironmentKind::Interior => "interior",
            EnvironmentKind::Exterior => "exterior",
            EnvironmentKind::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentAssessment {
    #[serde(rename = "type")]
    pub kind: EnvironmentKind,
    pub details: String,
}

/// Final geolocation / forensics report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub location_name: String,
    pub description: String,
    /// 0–100. Passed through as returned by the model.
    pub confidence_score: f64,
    #[serde(rename = "forensicAnalysis")]
    pub forensic: ForensicAssessment,
    #[serde(rename = "environmentAnalysis")]
    pub environment: EnvironmentAssessment,
    #[serde(default, alias = "groundingSources")]
    pub citations: Vec<Citation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn report_serialises_in_wire_shape() {
        let report = AnalysisReport {
            location_name: "Bárcena Mayor, Cantabria".into(),
            description: "Stone village".into(),
            confidence_score: 82.0,
            forensic: ForensicAssessment {
                summary: "No artefacts".into(),
                is_altered: false,
                alteration_confidence: 0.0,
            },
            environment: EnvironmentAssessment {
                kind: EnvironmentKind::Exterior,
                details: "Street".into(),
            },
            citations: vec![],
        };
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["locationName"], "Bárcena Mayor, Cantabria");
        assert_eq!(v["forensicAnalysis"]["isAltered"], false);
        assert_eq!(v["environmentAnalysis"]["type"], "exterior");
        assert_eq!(v["citations"], json!([]));
    }

    #[test]
    fn legacy_unknown_label_is_accepted() {
        let env: EnvironmentAssessment =
            serde_json::from_value(json!({"type": "desconocido", "details": "?"})).unwrap();
        assert_eq!(env.kind, EnvironmentKind::Unknown);
    }

    #[test]
    fn consistency_check() {
        let mut f = ForensicAssessment {
            summary: String::new(),
            is_altered: false,
            alteration_confidence: 0.0,
        };
        assert!(f.is_consistent());
        f.alteration_confidence = 12.0;
        assert!(!f.is_consistent());
        f.is_altered = true;
        assert!(f.is_consistent());
    }
}
