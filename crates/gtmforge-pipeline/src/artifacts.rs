//! Typed artifact models and their response schemas.
//!
//! Each artifact pairs a serde model with a hand-written JSON Schema. The
//! schema is sent to the provider as the response contract and enforced by
//! structured-output validation before deserialization, so the models can
//! assume validated input. Every schema requires the four quality metrics as
//! numbers; normalization upstream guarantees they are present and numeric.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Self-reported quality metrics attached to every artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    #[serde(default)]
    pub content_completeness: f64,
    #[serde(default)]
    pub information_specificity: f64,
    #[serde(default)]
    pub data_recency: f64,
    #[serde(default)]
    pub marketing_maturity: f64,
}

fn quality_metrics_schema() -> Value {
    json!({
        "type": "object",
        "required": [
            "content_completeness",
            "information_specificity",
            "data_recency",
            "marketing_maturity"
        ],
        "properties": {
            "content_completeness": {"type": "number"},
            "information_specificity": {"type": "number"},
            "data_recency": {"type": "number"},
            "marketing_maturity": {"type": "number"}
        }
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub category: String,
    pub business_model: String,
    #[serde(default)]
    pub existing_customers: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Positioning {
    pub key_market_belief: String,
    pub unique_approach: String,
    #[serde(default)]
    pub language_used: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IcpHypothesis {
    pub target_account_hypothesis: String,
    pub target_persona_hypothesis: String,
}

/// Company overview generated from website content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyOverviewResult {
    pub company_name: String,
    pub company_url: String,
    pub description: String,
    pub business_profile: BusinessProfile,
    pub capabilities: Vec<String>,
    pub positioning: Positioning,
    #[serde(default)]
    pub objections: Vec<String>,
    pub icp_hypothesis: IcpHypothesis,
    #[serde(default)]
    pub data_quality_metrics: QualityMetrics,
}

impl CompanyOverviewResult {
    #[must_use]
    pub fn response_schema() -> Value {
        json!({
            "type": "object",
            "required": [
                "company_name",
                "company_url",
                "description",
                "business_profile",
                "capabilities",
                "positioning",
                "icp_hypothesis",
                "data_quality_metrics"
            ],
            "properties": {
                "company_name": {"type": "string"},
                "company_url": {"type": "string"},
                "description": {"type": "string"},
                "business_profile": {
                    "type": "object",
                    "required": ["category", "business_model"],
                    "properties": {
                        "category": {"type": "string"},
                        "business_model": {"type": "string"},
                        "existing_customers": {"type": "string"}
                    }
                },
                "capabilities": {"type": "array", "items": {"type": "string"}},
                "positioning": {
                    "type": "object",
                    "required": ["key_market_belief", "unique_approach"],
                    "properties": {
                        "key_market_belief": {"type": "string"},
                        "unique_approach": {"type": "string"},
                        "language_used": {"type": "string"}
                    }
                },
                "objections": {"type": "array", "items": {"type": "string"}},
                "icp_hypothesis": {
                    "type": "object",
                    "required": ["target_account_hypothesis", "target_persona_hypothesis"],
                    "properties": {
                        "target_account_hypothesis": {"type": "string"},
                        "target_persona_hypothesis": {"type": "string"}
                    }
                },
                "data_quality_metrics": quality_metrics_schema()
            }
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanySize {
    #[serde(default)]
    pub employees: Option<String>,
    #[serde(default)]
    pub department_size: Option<String>,
    #[serde(default)]
    pub revenue: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Firmographics {
    pub industry: Vec<String>,
    #[serde(default)]
    pub company_size: CompanySize,
    #[serde(default)]
    pub geography: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuyingSignal {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub signal_type: String,
    pub priority: String,
    #[serde(default)]
    pub detection_method: String,
}

/// Ideal-customer account profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetAccountProfile {
    pub target_account_name: String,
    pub target_account_description: String,
    #[serde(default)]
    pub target_account_rationale: Vec<String>,
    pub firmographics: Firmographics,
    #[serde(default)]
    pub buying_signals: Vec<BuyingSignal>,
    #[serde(default)]
    pub data_quality_metrics: QualityMetrics,
}

impl TargetAccountProfile {
    #[must_use]
    pub fn response_schema() -> Value {
        json!({
            "type": "object",
            "required": [
                "target_account_name",
                "target_account_description",
                "firmographics",
                "data_quality_metrics"
            ],
            "properties": {
                "target_account_name": {"type": "string"},
                "target_account_description": {"type": "string"},
                "target_account_rationale": {"type": "array", "items": {"type": "string"}},
                "firmographics": {
                    "type": "object",
                    "required": ["industry"],
                    "properties": {
                        "industry": {"type": "array", "items": {"type": "string"}},
                        "company_size": {
                            "type": "object",
                            "properties": {
                                "employees": {"type": ["string", "null"]},
                                "department_size": {"type": ["string", "null"]},
                                "revenue": {"type": ["string", "null"]}
                            }
                        },
                        "geography": {"type": "array", "items": {"type": "string"}},
                        "keywords": {"type": "array", "items": {"type": "string"}}
                    }
                },
                "buying_signals": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["title", "description", "type", "priority"],
                        "properties": {
                            "title": {"type": "string"},
                            "description": {"type": "string"},
                            "type": {"type": "string"},
                            "priority": {"type": "string"},
                            "detection_method": {"type": "string"}
                        }
                    }
                },
                "data_quality_metrics": quality_metrics_schema()
            }
        })
    }
}

/// Buyer persona within a target account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetPersonaProfile {
    pub persona_name: String,
    pub persona_description: String,
    pub likely_job_titles: Vec<String>,
    #[serde(default)]
    pub primary_responsibilities: Vec<String>,
    #[serde(default)]
    pub status_quo: String,
    #[serde(default)]
    pub pain_points: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub objections: Vec<String>,
    #[serde(default)]
    pub data_quality_metrics: QualityMetrics,
}

impl TargetPersonaProfile {
    #[must_use]
    pub fn response_schema() -> Value {
        json!({
            "type": "object",
            "required": [
                "persona_name",
                "persona_description",
                "likely_job_titles",
                "data_quality_metrics"
            ],
            "properties": {
                "persona_name": {"type": "string"},
                "persona_description": {"type": "string"},
                "likely_job_titles": {"type": "array", "items": {"type": "string"}},
                "primary_responsibilities": {"type": "array", "items": {"type": "string"}},
                "status_quo": {"type": "string"},
                "pain_points": {"type": "array", "items": {"type": "string"}},
                "goals": {"type": "array", "items": {"type": "string"}},
                "objections": {"type": "array", "items": {"type": "string"}},
                "data_quality_metrics": quality_metrics_schema()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_overview() -> Value {
        json!({
            "company_name": "Acme",
            "company_url": "https://acme.example",
            "description": "Acme forges anvils for industrial customers.",
            "business_profile": {
                "category": "industrial forging equipment",
                "business_model": "B2B direct sales",
                "existing_customers": "Mid-market manufacturers"
            },
            "capabilities": ["custom forging", "bulk orders"],
            "positioning": {
                "key_market_belief": "Off-the-shelf anvils fail under load",
                "unique_approach": "Made-to-order alloys",
                "language_used": "durability, tolerances"
            },
            "objections": ["lead time"],
            "icp_hypothesis": {
                "target_account_hypothesis": "Mid-market manufacturers",
                "target_persona_hypothesis": "Head of operations"
            },
            "data_quality_metrics": {
                "content_completeness": 0.8,
                "information_specificity": 0.7,
                "data_recency": 0.5,
                "marketing_maturity": 0.6
            }
        })
    }

    #[test]
    fn sample_overview_satisfies_its_schema() {
        let validator = jsonschema::validator_for(&CompanyOverviewResult::response_schema())
            .expect("valid schema");
        assert!(validator.is_valid(&sample_overview()));
    }

    #[test]
    fn sample_overview_deserializes() {
        let overview: CompanyOverviewResult = serde_json::from_value(sample_overview()).unwrap();
        assert_eq!(overview.company_name, "Acme");
        assert_eq!(overview.capabilities.len(), 2);
        assert!((overview.data_quality_metrics.content_completeness - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn schema_rejects_missing_metrics() {
        let mut artifact = sample_overview();
        artifact.as_object_mut().unwrap().remove("data_quality_metrics");
        let validator = jsonschema::validator_for(&CompanyOverviewResult::response_schema())
            .expect("valid schema");
        assert!(!validator.is_valid(&artifact));
    }

    #[test]
    fn buying_signal_type_field_round_trips() {
        let signal: BuyingSignal = serde_json::from_value(json!({
            "title": "Hiring ops leads",
            "description": "Job postings mention forging capacity",
            "type": "hiring",
            "priority": "hi",
            "detection_method": "job boards"
        }))
        .unwrap();
        assert_eq!(signal.signal_type, "hiring");

        let back = serde_json::to_value(&signal).unwrap();
        assert_eq!(back["type"], "hiring");
    }

    #[test]
    fn account_schema_requires_industry() {
        let validator = jsonschema::validator_for(&TargetAccountProfile::response_schema())
            .expect("valid schema");
        let missing_industry = json!({
            "target_account_name": "Mid-market manufacturers",
            "target_account_description": "Manufacturers with in-house forging",
            "firmographics": {},
            "data_quality_metrics": {
                "content_completeness": 0.0,
                "information_specificity": 0.0,
                "data_recency": 0.0,
                "marketing_maturity": 0.0
            }
        });
        assert!(!validator.is_valid(&missing_industry));
    }

    #[test]
    fn persona_defaults_cover_optional_fields() {
        let persona: TargetPersonaProfile = serde_json::from_value(json!({
            "persona_name": "Head of Ops",
            "persona_description": "Owns plant throughput",
            "likely_job_titles": ["VP Operations"]
        }))
        .unwrap();
        assert!(persona.pain_points.is_empty());
        assert_eq!(persona.data_quality_metrics, QualityMetrics::default());
    }
}
