//! List Invoices Tool

use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::client::InvoiceService;
use crate::model::Invoice;

const NAME: &str = "list_invoices";

/// Takes no parameters
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListInvoicesArgs {}

/// Tool for listing every invoice
pub struct ListInvoicesTool {
    invoices: Arc<dyn InvoiceService>,
}

impl ListInvoicesTool {
    pub fn new(invoices: Arc<dyn InvoiceService>) -> Self {
        Self { invoices }
    }
}

#[async_trait]
impl Tool for ListInvoicesTool {
    type Args = ListInvoicesArgs;
    type Output = Vec<Invoice>;

    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Retrieves a list of all invoices in the system"
    }

    async fn call(&self, _args: ListInvoicesArgs) -> CoreResult<Vec<Invoice>> {
        let invoices = self
            .invoices
            .list_invoices()
            .await
            .map_err(|e| e.into_tool_error(NAME))?;
        tracing::debug!(count = invoices.len(), service = self.invoices.name(), "Listed invoices");
        Ok(invoices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryInvoiceService;
    use agent_core::{ToolCall, ToolPayload, ToolRegistry};
    use serde_json::{Value, json};

    fn registry(service: Arc<InMemoryInvoiceService>) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register_tool(ListInvoicesTool::new(service)).unwrap();
        registry
    }

    #[tokio::test]
    async fn test_lists_seeded_invoices() {
        let registry = registry(Arc::new(InMemoryInvoiceService::seeded()));

        // Providers may send null or an empty string for parameterless tools
        for arguments in [json!({}), Value::Null, json!("")] {
            let result = registry.invoke(&ToolCall::new("c1", NAME, arguments)).await;
            match result.payload {
                ToolPayload::Success(Value::Array(items)) => {
                    assert_eq!(items.len(), 3);
                    assert_eq!(items[1]["description"], json!("Globex quarterly support"));
                    assert_eq!(items[1]["status"], json!("Unpaid"));
                }
                other => panic!("unexpected payload: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_outage_becomes_error_payload() {
        let service = Arc::new(InMemoryInvoiceService::seeded());
        service.set_available(false);
        let registry = registry(service);

        let result = registry.invoke(&ToolCall::new("c1", NAME, json!({}))).await;
        match result.payload {
            ToolPayload::Error(reason) => assert!(reason.contains("offline")),
            ToolPayload::Success(_) => panic!("expected an error payload"),
        }
    }
}
