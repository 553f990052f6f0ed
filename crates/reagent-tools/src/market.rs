//! Market insights lookup.
//!
//! Answers market size, growth, and competitor questions from a curated
//! reference dataset keyed by therapy area and molecule. Unrecognized
//! queries fall back to a general generics-market figure rather than
//! failing, matching the upstream data service's contract.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::tool::{Tool, ToolError, ToolOutput};

/// Market size, CAGR, share, and competitor data per therapy area.
pub struct MarketInsightsTool;

impl MarketInsightsTool {
    fn dataset(key: &str) -> Option<Value> {
        match key {
            "depression" => Some(json!({
                "market_size_usd_bn": 15.6,
                "cagr_percent": 3.7,
                "market_share": {
                    "SSRIs": "35%",
                    "SNRIs": "25%",
                    "Atypical Antipsychotics": "20%",
                    "Others": "20%"
                },
                "competitors": ["Pfizer (Zoloft)", "Eli Lilly (Prozac)", "AbbVie"]
            })),
            "alzheimers" => Some(json!({
                "market_size_usd_bn": 6.8,
                "cagr_percent": 8.5,
                "market_share": {
                    "Cholinesterase inhibitors": "55%",
                    "NMDA receptor antagonists": "30%",
                    "Pipeline (Monoclonal Antibodies)": "15%"
                },
                "competitors": ["Biogen (Aduhelm)", "Eisai", "Novartis"]
            })),
            "minocycline" => Some(json!({
                "market_size_usd_bn": 0.45,
                "cagr_percent": -2.1,
                "segment": "Generics (Antibiotics)",
                "major_players": ["Teva", "Sandoz", "Sun Pharma", "Dr. Reddy's"]
            })),
            "respiratory" => Some(json!({
                "market_size_usd_bn": 28.5,
                "cagr_percent": 5.2,
                "market_share": {
                    "Inhalers (ICS/LABA)": "60%",
                    "Biologics": "20%",
                    "Oral (Leukotriene Modifiers)": "10%",
                    "Others": "10%"
                },
                "competitors": ["GSK", "AstraZeneca", "Cipla (India)"]
            })),
            "telmisartan" => Some(json!({
                "market_size_usd_bn": 3.2,
                "cagr_percent": 1.5,
                "segment": "Cardiovascular (Hypertension)",
                "major_players": ["Boehringer Ingelheim", "Microlabs", "Lupin"]
            })),
            "metformin" => Some(json!({
                "market_size_usd_bn": 0.8,
                "cagr_percent": 1.0,
                "segment": "Diabetes (Type 2)",
                "growth_driver": "Potential anti-aging applications (TAME trial hype)"
            })),
            _ => None,
        }
    }

    fn classify(query: &str) -> Option<&'static str> {
        let q = query.to_lowercase();
        if q.contains("depression") || q.contains("mdd") {
            Some("depression")
        } else if q.contains("alzheimer") || q.contains("neuro") {
            Some("alzheimers")
        } else if q.contains("minocycline") {
            Some("minocycline")
        } else if q.contains("respiratory") || q.contains("asthma") || q.contains("copd") {
            Some("respiratory")
        } else if q.contains("telmisartan") {
            Some("telmisartan")
        } else if q.contains("metformin") || q.contains("diabetes") {
            Some("metformin")
        } else {
            None
        }
    }
}

#[async_trait]
impl Tool for MarketInsightsTool {
    fn name(&self) -> &str {
        "market_insights"
    }

    fn description(&self) -> &str {
        "Queries market datasets for sales trends, volume shifts and therapy area dynamics. \
         Outputs: market size tables, CAGR trends, therapy-level competition summaries."
    }

    async fn invoke(&self, query: &str) -> Result<ToolOutput, ToolError> {
        match Self::classify(query).and_then(Self::dataset) {
            Some(data) => {
                let text = serde_json::to_string_pretty(&data)
                    .map_err(|e| ToolError::Provider(e.to_string()))?;
                Ok(ToolOutput::with_data(text, data))
            }
            None => {
                // Fallback mirrors the upstream service: general generics data.
                let data = json!({"market_size_usd_bn": 400, "growth": "flat"});
                Ok(ToolOutput::with_data(
                    "Exact match not found. Returning general Generic Market data.",
                    data,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn matches_molecule() {
        let out = MarketInsightsTool
            .invoke("Current market for minocycline")
            .await
            .unwrap();
        assert!(!out.no_data);
        assert_eq!(out.data["segment"], "Generics (Antibiotics)");
    }

    #[tokio::test]
    async fn matches_therapy_area_synonyms() {
        let out = MarketInsightsTool.invoke("COPD landscape").await.unwrap();
        assert_eq!(out.data["market_size_usd_bn"], 28.5);
        let out = MarketInsightsTool.invoke("MDD prevalence").await.unwrap();
        assert_eq!(out.data["cagr_percent"], 3.7);
    }

    #[tokio::test]
    async fn unknown_query_falls_back_to_generics() {
        let out = MarketInsightsTool.invoke("quantum widgets").await.unwrap();
        assert!(!out.no_data);
        assert_eq!(out.data["market_size_usd_bn"], 400);
        assert!(out.text.contains("Exact match not found"));
    }
}
