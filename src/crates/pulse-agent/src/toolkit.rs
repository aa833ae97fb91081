//! The built-in tools bound to one Pulse application.

use crate::error::Result;
use crate::tools::{GenerateSqlTool, QueryEndpointTool, RawQueryTool, SemanticsTool, Tool};
use llm::ChatModel;
use pulse::{PulseApi, Semantics};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Client, model and semantics shared by the built-in tools.
///
/// Semantics are fetched once when the toolkit is created and shared
/// read-only with every tool.
#[derive(Clone)]
pub struct PulseToolkit {
    api: Arc<dyn PulseApi>,
    llm: Arc<dyn ChatModel>,
    semantics: Arc<Semantics>,
}

impl PulseToolkit {
    /// Fetch semantics and build the toolkit.
    pub async fn new(api: Arc<dyn PulseApi>, llm: Arc<dyn ChatModel>) -> Result<Self> {
        let semantics = Semantics::fetch(api.as_ref()).await?;
        info!(
            cubes = semantics.len(),
            endpoints = semantics.filter_endpoints().len(),
            "Fetched semantics"
        );
        Ok(Self::with_semantics(api, llm, Arc::new(semantics)))
    }

    /// Build from semantics already in hand.
    pub fn with_semantics(
        api: Arc<dyn PulseApi>,
        llm: Arc<dyn ChatModel>,
        semantics: Arc<Semantics>,
    ) -> Self {
        Self {
            api,
            llm,
            semantics,
        }
    }

    pub fn semantics(&self) -> &Arc<Semantics> {
        &self.semantics
    }

    pub fn api(&self) -> &Arc<dyn PulseApi> {
        &self.api
    }

    pub fn llm(&self) -> &Arc<dyn ChatModel> {
        &self.llm
    }

    /// Endpoint cubes as text.
    pub fn fetch_endpoints(&self) -> Result<String> {
        Ok(self.semantics.filter_endpoints().to_text()?)
    }

    /// Raw table cubes as text.
    pub fn fetch_tables(&self) -> Result<String> {
        Ok(self.semantics.filter_tables().to_text()?)
    }

    /// SQL generation, endpoint invocation, raw query and semantics fetch, in that order.
    pub fn get_tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(GenerateSqlTool::new(self.llm.clone(), &self.semantics)),
            Arc::new(QueryEndpointTool::new(
                self.api.clone(),
                self.semantics.clone(),
            )),
            Arc::new(RawQueryTool::new(self.api.clone())),
            Arc::new(SemanticsTool::new(self.semantics.clone())),
        ]
    }
}

impl fmt::Debug for PulseToolkit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PulseToolkit")
            .field("model", &self.llm.model_name())
            .field("cubes", &self.semantics.len())
            .finish()
    }
}
