//! Clinical trial pipeline lookup.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::tool::{Tool, ToolError, ToolOutput};

/// Registered trials, phases, and sponsors per search term.
pub struct ClinicalTrialsTool;

impl ClinicalTrialsTool {
    fn search(query: &str) -> Vec<Value> {
        let q = query.to_lowercase();
        let mut trials = Vec::new();

        if q.contains("minocycline") {
            if q.contains("depression") {
                trials.push(json!({
                    "nct_id": "NCT04512345",
                    "title": "Efficacy of Minocycline as Adjunct Therapy in Major Depressive Disorder",
                    "phase": "Phase 2",
                    "status": "Recruiting",
                    "sponsor": "Institute of Psychiatry",
                    "locations": ["USA", "UK"],
                    "completion_date": "2025-12"
                }));
            } else if q.contains("alzheimer") {
                trials.push(json!({
                    "nct_id": "NCT03356789",
                    "title": "Minocycline in Early Alzheimer's Disease",
                    "phase": "Phase 2",
                    "status": "Completed",
                    "outcome": "Mixed results - reduction in inflammation markers observed",
                    "sponsor": "National Institute on Aging"
                }));
            } else {
                trials.push(json!({
                    "nct_id": "NCT00001111",
                    "title": "Minocycline for Acne Vulgaris",
                    "phase": "Phase 4",
                    "status": "Completed"
                }));
            }
        }

        if q.contains("telmisartan") && q.contains("fibrosis") {
            trials.push(json!({
                "nct_id": "NCT05566778",
                "title": "Telmisartan in Idiopathic Pulmonary Fibrosis (IPF)",
                "phase": "Phase 2",
                "status": "Recruiting",
                "sponsor": "University of Alabama"
            }));
        }

        if q.contains("metformin") && q.contains("aging") {
            trials.push(json!({
                "nct_id": "NCT02432287",
                "title": "Targeting Aging with Metformin (TAME)",
                "phase": "Phase 4",
                "status": "Not yet recruiting",
                "sponsor": "AFAR"
            }));
        }

        trials
    }
}

#[async_trait]
impl Tool for ClinicalTrialsTool {
    fn name(&self) -> &str {
        "clinical_trials"
    }

    fn description(&self) -> &str {
        "Fetches trial pipeline data from registries. \
         Outputs: tables of active trials, sponsor profiles, trial phase distributions."
    }

    async fn invoke(&self, query: &str) -> Result<ToolOutput, ToolError> {
        let trials = Self::search(query);
        if trials.is_empty() {
            return Ok(ToolOutput::no_data(
                "No registered trials found for this search term.",
            ));
        }
        let data = Value::Array(trials);
        let text = serde_json::to_string_pretty(&data)
            .map_err(|e| ToolError::Provider(e.to_string()))?;
        Ok(ToolOutput::with_data(text, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn indication_specific_trial_wins_over_default() {
        let out = ClinicalTrialsTool
            .invoke("minocycline depression trials")
            .await
            .unwrap();
        assert_eq!(out.data[0]["nct_id"], "NCT04512345");
    }

    #[tokio::test]
    async fn molecule_alone_returns_default_trial() {
        let out = ClinicalTrialsTool.invoke("minocycline").await.unwrap();
        assert_eq!(out.data[0]["nct_id"], "NCT00001111");
    }

    #[tokio::test]
    async fn compound_terms_required_for_tame() {
        let with = ClinicalTrialsTool
            .invoke("metformin anti-aging evidence")
            .await
            .unwrap();
        assert_eq!(with.data[0]["nct_id"], "NCT02432287");

        let without = ClinicalTrialsTool.invoke("metformin").await.unwrap();
        assert!(without.no_data);
    }
}
