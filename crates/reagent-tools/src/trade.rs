//! Export/import flow lookup.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::tool::{Tool, ToolError, ToolOutput};

/// Trade volumes, exporter shares, and price trends per molecule.
pub struct TradeFlowsTool;

impl TradeFlowsTool {
    fn lookup(query: &str) -> Option<Value> {
        let q = query.to_lowercase();
        if q.contains("minocycline") {
            return Some(json!({
                "molecule": "Minocycline HCl",
                "total_import_volume_kg": 52000,
                "major_exporters": [
                    {"country": "India", "share": "65%", "top_suppliers": ["Aurobindo", "Sun Pharma"]},
                    {"country": "China", "share": "25%", "top_suppliers": ["Zhejiang Medicine"]},
                    {"country": "Others", "share": "10%"}
                ],
                "price_trend": "Stable",
                "average_price_per_kg_usd": 180
            }));
        }
        if q.contains("telmisartan") {
            return Some(json!({
                "molecule": "Telmisartan",
                "total_import_volume_kg": 120000,
                "major_exporters": [
                    {"country": "China", "share": "45%", "top_suppliers": ["Zhejiang Huahai", "Tianyu"]},
                    {"country": "India", "share": "50%", "top_suppliers": ["Hetero", "Aurobindo", "Jubilant"]}
                ],
                "price_trend": "Decreasing",
                "average_price_per_kg_usd": 85
            }));
        }
        if q.contains("salbutamol") || q.contains("albuterol") {
            return Some(json!({
                "molecule": "Salbutamol Sulphate",
                "total_import_volume_kg": 250000,
                "major_exporters": [
                    {"country": "India", "share": "70%", "top_suppliers": ["Cipla", "Lupin"]},
                    {"country": "China", "share": "20%"}
                ],
                "price_trend": "Volatile",
                "average_price_per_kg_usd": 220
            }));
        }
        None
    }
}

#[async_trait]
impl Tool for TradeFlowsTool {
    fn name(&self) -> &str {
        "trade_flows"
    }

    fn description(&self) -> &str {
        "Extracts export-import data for APIs/formulations across countries. \
         Outputs: trade volumes, sourcing insights, import dependency tables."
    }

    async fn invoke(&self, query: &str) -> Result<ToolOutput, ToolError> {
        match Self::lookup(query) {
            Some(data) => {
                let text = serde_json::to_string_pretty(&data)
                    .map_err(|e| ToolError::Provider(e.to_string()))?;
                Ok(ToolOutput::with_data(text, data))
            }
            None => Ok(ToolOutput::no_data(
                "Data not available for this molecule in the trade dataset.",
            )),
        }
    }
}
