//! The fixed worker pool.

use std::collections::BTreeMap;
use std::sync::Arc;

use reagent_core::planner::Planner;
use reagent_storage::SandboxedFs;
use reagent_tools::{
    ChartRenderTool, ClinicalTrialsTool, DocumentIndex, MarketInsightsTool, PatentSearchTool,
    RetrievalTool, SearchProvider, SearchTool, Tool, TradeFlowsTool,
};

use crate::budget::Budget;
use crate::worker::{SourceRank, Worker};

/// Workers every deep run must consult at least once.
pub const MANDATORY_WORKERS: [&str; 2] = ["web-intelligence-agent", "pubmed-agent"];

/// Named pool of research workers, fixed at construction.
pub struct WorkerRegistry {
    workers: BTreeMap<String, Arc<Worker>>,
}

impl WorkerRegistry {
    /// Build an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            workers: BTreeMap::new(),
        }
    }

    /// Add a worker, keyed by its name.
    pub fn insert(&mut self, worker: Worker) {
        let _ = self.workers.insert(worker.name().to_string(), Arc::new(worker));
    }

    /// Look up a worker by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<Worker>> {
        self.workers.get(name)
    }

    /// All workers in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Worker>> {
        self.workers.values()
    }

    /// Number of registered workers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Roster description shown to the planning phase.
    #[must_use]
    pub fn roster(&self) -> String {
        self.workers
            .values()
            .map(|w| format!("- {}: {}", w.name(), w.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The standard eight-worker pool.
    ///
    /// All workers share the planner and the standard budget template; the
    /// search-backed workers take their providers, the knowledge worker its
    /// document index, and the visualization worker the output sandbox.
    #[must_use]
    pub fn standard(
        planner: Arc<dyn Planner>,
        web: Arc<dyn SearchProvider>,
        literature: Arc<dyn SearchProvider>,
        index: Arc<dyn DocumentIndex>,
        fs: Arc<SandboxedFs>,
    ) -> Self {
        let mut registry = Self::new();

        registry.insert(Worker::new(
            "web-intelligence-agent",
            "Performs real-time web search for guidelines, scientific publications, news and patient forums.",
            "You are a Web Intelligence Agent. Perform real-time web search for guidelines, \
             scientific publications, news and patient forums. Output hyperlinked summaries, \
             quotations from credible sources, and guideline extracts.",
            vec![Arc::new(SearchTool::web(web)) as Arc<dyn Tool>],
            Arc::clone(&planner),
            Budget::standard(),
            SourceRank::Guidelines,
        ));

        registry.insert(Worker::new(
            "pubmed-agent",
            "Searches and analyzes biomedical literature to support drug repurposing.",
            "You are an expert pharmaceutical researcher. Find precise biomedical literature. \
             Use Boolean operators and prioritize indexed terminology. Focus on drug targets, \
             mechanism of action, and clinical efficacy.",
            vec![Arc::new(SearchTool::literature(literature)) as Arc<dyn Tool>],
            Arc::clone(&planner),
            Budget::standard(),
            SourceRank::Literature,
        ));

        registry.insert(Worker::new(
            "iqvia-insights-agent",
            "Queries market datasets for sales trends, volume shifts and therapy area dynamics.",
            "You are a market analyst. Produce market size tables, CAGR trends and \
             therapy-level competition summaries from the market dataset.",
            vec![Arc::new(MarketInsightsTool) as Arc<dyn Tool>],
            Arc::clone(&planner),
            Budget::standard(),
            SourceRank::Market,
        ));

        registry.insert(Worker::new(
            "exim-trends-agent",
            "Extracts export-import data for APIs/formulations across countries.",
            "You are a trade analyst. Produce trade volumes, sourcing insights and import \
             dependency tables from the trade dataset.",
            vec![Arc::new(TradeFlowsTool) as Arc<dyn Tool>],
            Arc::clone(&planner),
            Budget::standard(),
            SourceRank::Market,
        ));

        registry.insert(Worker::new(
            "patent-landscape-agent",
            "Searches IP databases for active patents, expiry timelines and FTO flags.",
            "You are an IP analyst. Produce patent status tables and competitive filing \
             summaries from the patent dataset.",
            vec![Arc::new(PatentSearchTool) as Arc<dyn Tool>],
            Arc::clone(&planner),
            Budget::standard(),
            SourceRank::Registries,
        ));

        registry.insert(Worker::new(
            "clinical-trials-agent",
            "Fetches trial pipeline data from clinical registries.",
            "You are a clinical pipeline analyst. Produce tables of active trials, sponsor \
             profiles and phase distributions from the trial registry dataset.",
            vec![Arc::new(ClinicalTrialsTool) as Arc<dyn Tool>],
            Arc::clone(&planner),
            Budget::standard(),
            SourceRank::Registries,
        ));

        registry.insert(Worker::new(
            "internal-knowledge-agent",
            "Retrieves and summarizes internal documents (strategy decks, field insights).",
            "You are an internal knowledge analyst. Retrieve and summarize internal documents \
             into key takeaways and comparative tables.",
            vec![Arc::new(RetrievalTool::new(index)) as Arc<dyn Tool>],
            Arc::clone(&planner),
            Budget::standard(),
            SourceRank::Market,
        ));

        registry.insert(Worker::new(
            "visualization-agent",
            "Creates data visualizations (charts/plots) from provided data. Output: path to saved image file.",
            "You are a data visualization expert. Render the requested chart and return the \
             saved file path reported by the tool.",
            vec![Arc::new(ChartRenderTool::new(fs)) as Arc<dyn Tool>],
            planner,
            Budget::standard(),
            SourceRank::Market,
        ));

        registry
    }
}

impl Default for WorkerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reagent_core::planner::{PlannerError, PlannerRequest};
    use reagent_tools::{SearchHit, ToolError};

    struct NullPlanner;

    #[async_trait]
    impl Planner for NullPlanner {
        async fn complete(&self, _req: PlannerRequest) -> Result<String, PlannerError> {
            Ok(String::new())
        }
    }

    struct EmptyProvider;

    #[async_trait]
    impl SearchProvider for EmptyProvider {
        async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, ToolError> {
            Ok(vec![])
        }
    }

    fn standard_registry() -> WorkerRegistry {
        let dir = std::env::temp_dir().join("reagent-registry-test");
        WorkerRegistry::standard(
            Arc::new(NullPlanner),
            Arc::new(EmptyProvider),
            Arc::new(EmptyProvider),
            Arc::new(reagent_tools::InMemoryDocumentIndex::new()),
            Arc::new(SandboxedFs::new(dir)),
        )
    }

    #[test]
    fn standard_pool_has_eight_workers() {
        let registry = standard_registry();
        assert_eq!(registry.len(), 8);
        for name in [
            "web-intelligence-agent",
            "pubmed-agent",
            "iqvia-insights-agent",
            "exim-trends-agent",
            "patent-landscape-agent",
            "clinical-trials-agent",
            "internal-knowledge-agent",
            "visualization-agent",
        ] {
            assert!(registry.get(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn mandatory_workers_exist_in_pool() {
        let registry = standard_registry();
        for name in MANDATORY_WORKERS {
            assert!(registry.get(name).is_some());
        }
    }

    #[test]
    fn literature_outranks_market() {
        let registry = standard_registry();
        let pubmed = registry.get("pubmed-agent").unwrap().source_rank();
        let market = registry.get("iqvia-insights-agent").unwrap().source_rank();
        assert!(pubmed < market);
    }

    #[test]
    fn roster_lists_all_names() {
        let registry = standard_registry();
        let roster = registry.roster();
        assert!(roster.contains("visualization-agent"));
        assert!(roster.contains("exim-trends-agent"));
    }
}
