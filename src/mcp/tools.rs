//! Tool registry for MCP tools.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::models::{Record, SearchParams};
use crate::search::SearchSession;
use crate::utils::to_bibtex_all;

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "search_literature")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<Value, String>;
}

/// Registry for all MCP tools, keyed by name
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Tool>,
}

impl ToolRegistry {
    /// Register the literature tools over a shared session
    pub fn from_session(session: Arc<SearchSession>) -> Self {
        let mut registry = Self::default();

        registry.register(Tool {
            name: "search_literature".to_string(),
            description: format!(
                "Search {} bibliographic providers at once; returns merged, classified records, \
                 per-provider errors and facet counts",
                session.orchestrator().registry().len()
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "q": {
                        "type": "string",
                        "description": "Free-text query; may be empty"
                    },
                    "year_from": {
                        "type": ["string", "integer"],
                        "description": "First publication year (default 2019)"
                    },
                    "year_to": {
                        "type": ["string", "integer"],
                        "description": "Last publication year (default 2025)"
                    },
                    "lang": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Language codes to keep, e.g. ['en', 'pt']"
                    },
                    "oa": {
                        "type": "boolean",
                        "description": "Only open access records",
                        "default": false
                    }
                }
            }),
            handler: Arc::new(SearchLiteratureHandler {
                session: session.clone(),
            }),
        });

        registry.register(Tool {
            name: "list_saved".to_string(),
            description: "List the saved records".to_string(),
            input_schema: json!({ "type": "object", "properties": {} }),
            handler: Arc::new(ListSavedHandler {
                session: session.clone(),
            }),
        });

        registry.register(Tool {
            name: "toggle_saved".to_string(),
            description: "Save a record, or remove it if it is already saved".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "record": {
                        "type": "object",
                        "description": "A record as returned by search_literature"
                    }
                },
                "required": ["record"]
            }),
            handler: Arc::new(ToggleSavedHandler {
                session: session.clone(),
            }),
        });

        registry.register(Tool {
            name: "export_bibtex".to_string(),
            description: "Export saved records as BibTeX".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "ids": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Saved record ids to export; all saved records when omitted"
                    }
                }
            }),
            handler: Arc::new(ExportBibtexHandler { session }),
        });

        registry
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get all tools
    pub fn all(&self) -> Vec<&Tool> {
        self.tools.values().collect()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, String> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("Tool '{}' not found", name))?;

        tool.handler.execute(args).await
    }
}

/// Year arguments arrive as strings or numbers; both are passed on as text
/// so malformed values fall back to the defaults.
fn year_arg(args: &Value, key: &str) -> Option<String> {
    match args.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn search_params(args: &Value) -> SearchParams {
    let lang = match args.get("lang") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.to_string())
            .collect(),
        Some(Value::String(s)) => s.split(',').map(|c| c.trim().to_string()).collect(),
        _ => Vec::new(),
    };

    SearchParams {
        q: args
            .get("q")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        year_from: year_arg(args, "year_from"),
        year_to: year_arg(args, "year_to"),
        lang,
        oa: args.get("oa").and_then(|v| v.as_bool()).unwrap_or(false),
    }
}

#[derive(Debug)]
pub struct SearchLiteratureHandler {
    session: Arc<SearchSession>,
}

#[async_trait::async_trait]
impl ToolHandler for SearchLiteratureHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let params = search_params(&args);

        // Each call is its own request; clients must not supersede each other
        let outcome = self.session.search_detached(&params).await;

        serde_json::to_value(&outcome).map_err(|e| e.to_string())
    }
}

#[derive(Debug)]
pub struct ListSavedHandler {
    session: Arc<SearchSession>,
}

#[async_trait::async_trait]
impl ToolHandler for ListSavedHandler {
    async fn execute(&self, _args: Value) -> Result<Value, String> {
        let items = self.session.saved().load();
        Ok(json!({ "count": items.len(), "items": items }))
    }
}

#[derive(Debug)]
pub struct ToggleSavedHandler {
    session: Arc<SearchSession>,
}

#[async_trait::async_trait]
impl ToolHandler for ToggleSavedHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let record = args
            .get("record")
            .cloned()
            .ok_or("Missing 'record' parameter")?;
        let record: Record =
            serde_json::from_value(record).map_err(|e| format!("Invalid record: {}", e))?;

        let saved = self
            .session
            .toggle_saved(&record)
            .map_err(|e| e.to_string())?;

        Ok(json!({ "id": record.id, "saved": saved }))
    }
}

#[derive(Debug)]
pub struct ExportBibtexHandler {
    session: Arc<SearchSession>,
}

#[async_trait::async_trait]
impl ToolHandler for ExportBibtexHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let items = self.session.saved().load();

        let selected: Vec<&Record> = match args.get("ids").and_then(|v| v.as_array()) {
            Some(ids) => {
                let ids: Vec<&str> = ids.iter().filter_map(|v| v.as_str()).collect();
                items.iter().filter(|r| ids.contains(&r.id.as_str())).collect()
            }
            None => items.iter().collect(),
        };

        Ok(json!({
            "count": selected.len(),
            "bibtex": to_bibtex_all(selected),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Provider, RecordBuilder};
    use crate::search::Orchestrator;
    use crate::sources::{MockSource, SourceRegistry};
    use crate::utils::SavedList;

    fn registry_with(records: Vec<Record>) -> ToolRegistry {
        let mut sources = SourceRegistry::empty();
        sources.register(Arc::new(MockSource::with_records(Provider::Doaj, records)));
        sources.register(Arc::new(MockSource::failing(Provider::PubMed, 500)));
        let session = SearchSession::new(Orchestrator::new(sources), SavedList::in_memory());
        ToolRegistry::from_session(Arc::new(session))
    }

    fn record() -> Record {
        RecordBuilder::new("10.1/x", "Cancer Screening", Provider::Doaj)
            .authors(vec!["Doe, Jane".to_string()])
            .year(Some(2020))
            .journal("J Onc")
            .doi(Some("10.1/x".to_string()))
            .oa(true)
            .build()
    }

    #[test]
    fn test_registry_lists_tools() {
        let tools = registry_with(Vec::new());
        let names: Vec<_> = tools.all().into_iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["export_bibtex", "list_saved", "search_literature", "toggle_saved"]
        );
    }

    #[test]
    fn test_search_params_accept_numbers_and_strings() {
        let params = search_params(&json!({
            "q": "cancer",
            "year_from": 2020,
            "year_to": "2021",
            "lang": ["en", "pt"],
            "oa": true
        }));
        assert_eq!(params.year_from.as_deref(), Some("2020"));
        assert_eq!(params.year_to.as_deref(), Some("2021"));
        assert_eq!(params.lang, vec!["en", "pt"]);
        assert!(params.oa);

        let empty = search_params(&json!({}));
        assert_eq!(empty, SearchParams::default());
    }

    #[tokio::test]
    async fn test_search_literature_returns_triple() {
        let tools = registry_with(vec![record()]);
        let result = tools
            .execute("search_literature", json!({ "q": "cancer", "year_from": "x" }))
            .await
            .unwrap();

        assert_eq!(result["records"].as_array().unwrap().len(), 1);
        assert_eq!(result["errors"]["pubmed"], "PubMed HTTP 500");
        assert_eq!(result["facets"]["source"]["doaj"], 1);
        assert_eq!(result["query"]["year_from"], 2019);
    }

    #[tokio::test]
    async fn test_overlapping_searches_both_succeed() {
        let mock = Arc::new(MockSource::with_records(Provider::Doaj, vec![record()]));
        mock.set_delay(std::time::Duration::from_millis(200));
        let mut sources = SourceRegistry::empty();
        sources.register(mock.clone());
        let session = SearchSession::new(Orchestrator::new(sources), SavedList::in_memory());
        let tools = Arc::new(ToolRegistry::from_session(Arc::new(session)));

        let first = {
            let tools = Arc::clone(&tools);
            tokio::spawn(async move {
                tools
                    .execute("search_literature", json!({ "q": "cancer", "oa": true }))
                    .await
            })
        };

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        mock.set_delay(std::time::Duration::from_millis(0));
        let second = tools
            .execute("search_literature", json!({ "q": "screening" }))
            .await
            .unwrap();
        let first = first.await.unwrap().unwrap();

        assert_eq!(first["query"]["q"], "cancer");
        assert_eq!(first["records"].as_array().unwrap().len(), 1);
        assert_eq!(second["query"]["q"], "screening");
        assert_eq!(second["records"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_list_and_export() {
        let tools = registry_with(Vec::new());
        let record = serde_json::to_value(record()).unwrap();

        let toggled = tools
            .execute("toggle_saved", json!({ "record": record }))
            .await
            .unwrap();
        assert_eq!(toggled["saved"], true);

        let listed = tools.execute("list_saved", json!({})).await.unwrap();
        assert_eq!(listed["count"], 1);

        let exported = tools.execute("export_bibtex", json!({})).await.unwrap();
        assert!(exported["bibtex"]
            .as_str()
            .unwrap()
            .starts_with("@article{doe2020,"));

        let none = tools
            .execute("export_bibtex", json!({ "ids": ["missing"] }))
            .await
            .unwrap();
        assert_eq!(none["count"], 0);
    }

    #[tokio::test]
    async fn test_errors_are_reported() {
        let tools = registry_with(Vec::new());
        assert!(tools.execute("nope", json!({})).await.is_err());
        assert!(tools.execute("toggle_saved", json!({})).await.is_err());
        assert!(tools
            .execute("toggle_saved", json!({ "record": { "id": 1 } }))
            .await
            .is_err());
    }
}
