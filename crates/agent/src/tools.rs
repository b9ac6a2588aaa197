use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use tia_core::catalog::QuoteRequest;
use tia_core::ranking::parse_factors;
use tia_core::render::{Artifact, ResultRenderer};
use tia_core::CatalogError;
use tia_db::{CatalogStore, StoreError};

/// What a tool hands back: a JSON payload for the model, and optionally a
/// rendered artifact for the customer (the model never sees the artifact).
#[derive(Clone, Debug)]
pub struct ToolOutcome {
    pub payload: Value,
    pub artifact: Option<Artifact>,
}

impl ToolOutcome {
    fn payload_only(payload: Value) -> Self {
        Self { payload, artifact: None }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, input: Value) -> Result<ToolOutcome>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Runs a named tool. Unknown names produce an error payload rather than
    /// failing the turn; the model asked for something we never advertised.
    pub async fn execute(&self, name: &str, input: Value) -> Result<ToolOutcome> {
        match self.tools.get(name) {
            Some(tool) => tool.execute(input).await,
            None => {
                warn!(tool = name, "model requested an unknown tool");
                Ok(ToolOutcome::payload_only(json!({
                    "error": format!("tool `{name}` is not implemented")
                })))
            }
        }
    }
}

/// Maps catalog errors into model-facing payloads. Invalid input and misses
/// are recoverable conversation material; storage faults abort the turn.
fn catalog_failure(error: StoreError) -> Result<ToolOutcome> {
    match error {
        StoreError::Domain(CatalogError::InvalidInput(message)) => {
            Ok(ToolOutcome::payload_only(json!({"error": message})))
        }
        StoreError::Domain(CatalogError::NotFound { query }) => Ok(ToolOutcome::payload_only(
            json!({"error": format!("no catalog entry matches '{query}'")}),
        )),
        StoreError::Database(source) => Err(anyhow!(source).context("catalog storage failure")),
    }
}

#[derive(Deserialize)]
struct RequestArgs {
    age: i64,
    term: i64,
    coverage_amount: i64,
    income: i64,
}

impl RequestArgs {
    fn into_request(self) -> Result<QuoteRequest, CatalogError> {
        QuoteRequest::new(self.age, self.term, self.coverage_amount, self.income)
    }
}

/// Builds the registry with all five catalog tools.
pub struct CatalogToolkit;

impl CatalogToolkit {
    pub fn registry(
        store: CatalogStore,
        renderer: Arc<dyn ResultRenderer>,
        recommendation_limit: usize,
    ) -> ToolRegistry {
        let mut registry = ToolRegistry::default();
        registry.register(PremiumLookupTool { store: store.clone(), renderer: renderer.clone() });
        registry.register(RecommendPlansTool {
            store: store.clone(),
            renderer,
            limit: recommendation_limit,
        });
        registry.register(ListInsurersTool { store: store.clone() });
        registry.register(InsurerDetailsTool { store: store.clone() });
        registry.register(PlanDetailsTool { store });
        registry
    }
}

struct PremiumLookupTool {
    store: CatalogStore,
    renderer: Arc<dyn ResultRenderer>,
}

#[async_trait]
impl Tool for PremiumLookupTool {
    fn name(&self) -> &'static str {
        "basic_plan_and_premium_lookup"
    }

    async fn execute(&self, input: Value) -> Result<ToolOutcome> {
        let args: RequestArgs = serde_json::from_value(input)?;
        let request = match args.into_request() {
            Ok(request) => request,
            Err(CatalogError::InvalidInput(message)) => {
                return Ok(ToolOutcome::payload_only(json!({"error": message})))
            }
            Err(other) => return Err(anyhow!(other)),
        };

        match self.store.lookup_premiums(&request).await {
            Ok(rows) => {
                let artifact = self.renderer.render_premiums(&request, &rows);
                Ok(ToolOutcome { payload: json!({"plans": rows}), artifact })
            }
            Err(error) => catalog_failure(error),
        }
    }
}

struct RecommendPlansTool {
    store: CatalogStore,
    renderer: Arc<dyn ResultRenderer>,
    limit: usize,
}

#[derive(Deserialize)]
struct RecommendArgs {
    #[serde(flatten)]
    request: RequestArgs,
    #[serde(default)]
    priority_factors: Vec<String>,
}

#[async_trait]
impl Tool for RecommendPlansTool {
    fn name(&self) -> &'static str {
        "get_recommended_plans_based_on_priority_factors"
    }

    async fn execute(&self, input: Value) -> Result<ToolOutcome> {
        let args: RecommendArgs = serde_json::from_value(input)?;
        let request = match args.request.into_request() {
            Ok(request) => request,
            Err(CatalogError::InvalidInput(message)) => {
                return Ok(ToolOutcome::payload_only(json!({"error": message})))
            }
            Err(other) => return Err(anyhow!(other)),
        };
        let factors = parse_factors(&args.priority_factors);

        match self.store.recommend_plans(&request, &factors, self.limit).await {
            Ok(rows) => {
                let artifact = self.renderer.render_ranked(&request, &rows);
                Ok(ToolOutcome { payload: json!({"recommendations": rows}), artifact })
            }
            Err(error) => catalog_failure(error),
        }
    }
}

struct ListInsurersTool {
    store: CatalogStore,
}

#[async_trait]
impl Tool for ListInsurersTool {
    fn name(&self) -> &'static str {
        "list_insurers_and_metrics"
    }

    async fn execute(&self, _input: Value) -> Result<ToolOutcome> {
        match self.store.list_insurer_metrics().await {
            Ok(metrics) => Ok(ToolOutcome::payload_only(json!({"insurers": metrics}))),
            Err(error) => catalog_failure(error),
        }
    }
}

struct InsurerDetailsTool {
    store: CatalogStore,
}

#[derive(Deserialize)]
struct InsurerArgs {
    insurer_name: String,
}

#[async_trait]
impl Tool for InsurerDetailsTool {
    fn name(&self) -> &'static str {
        "get_insurer_details"
    }

    async fn execute(&self, input: Value) -> Result<ToolOutcome> {
        let args: InsurerArgs = serde_json::from_value(input)?;
        match self.store.find_insurer(&args.insurer_name).await {
            Ok(metrics) => Ok(ToolOutcome::payload_only(serde_json::to_value(metrics)?)),
            Err(error) => catalog_failure(error),
        }
    }
}

struct PlanDetailsTool {
    store: CatalogStore,
}

#[derive(Deserialize)]
struct PlanArgs {
    plan_name: String,
}

#[async_trait]
impl Tool for PlanDetailsTool {
    fn name(&self) -> &'static str {
        "get_plan_details"
    }

    async fn execute(&self, input: Value) -> Result<ToolOutcome> {
        let args: PlanArgs = serde_json::from_value(input)?;
        match self.store.find_plan(&args.plan_name).await {
            Ok(detail) => Ok(ToolOutcome::payload_only(serde_json::to_value(detail)?)),
            Err(error) => catalog_failure(error),
        }
    }
}
