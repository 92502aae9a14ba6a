//! Documentation Lookup Tool
//!
//! Returns the markdown of a documentation page, or `null` when there is no
//! page by that name.

use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::docs::DocumentationSource;

const NAME: &str = "get_documentation_page";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DocumentationArgs {
    /// Name of the page without extension, e.g. "Billing"
    #[serde(alias = "pageName")]
    pub page_name: String,
}

/// Tool for reading documentation pages
pub struct DocumentationTool {
    docs: Arc<dyn DocumentationSource>,
}

impl DocumentationTool {
    pub fn new(docs: Arc<dyn DocumentationSource>) -> Self {
        Self { docs }
    }
}

#[async_trait]
impl Tool for DocumentationTool {
    type Args = DocumentationArgs;
    type Output = Option<String>;

    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Retrieves the content of a documentation page by its name"
    }

    async fn call(&self, args: DocumentationArgs) -> CoreResult<Option<String>> {
        self.docs
            .get_page(&args.page_name)
            .await
            .map_err(|e| e.into_tool_error(NAME))
    }
}
