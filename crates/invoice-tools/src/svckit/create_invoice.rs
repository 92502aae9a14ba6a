//! Create Invoice Tool

use std::sync::Arc;

use agent_core::{AgentError, Result as CoreResult, Tool};
use async_trait::async_trait;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::client::InvoiceService;
use crate::model::{CreateInvoiceRequest, Invoice, parse_timestamp};

const NAME: &str = "create_invoice";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateInvoiceArgs {
    /// What the invoice is for, including the customer name
    pub description: String,

    /// Amount to bill, e.g. 1250.50
    #[schemars(with = "f64")]
    pub amount: Decimal,

    /// Due date as YYYY-MM-DD; defaults to 30 days from today
    #[serde(default)]
    pub due: Option<String>,
}

impl CreateInvoiceArgs {
    fn into_request(self) -> CoreResult<CreateInvoiceRequest> {
        let mut request = CreateInvoiceRequest::new(self.description, self.amount);
        if let Some(raw) = self.due.filter(|d| !d.trim().is_empty()) {
            let due = parse_timestamp(&raw).ok_or_else(|| AgentError::InvalidArguments {
                tool: NAME.into(),
                reason: format!("due date is not a date: {raw}"),
            })?;
            request = request.with_due(due);
        }
        Ok(request)
    }
}

/// Tool for raising a new invoice
pub struct CreateInvoiceTool {
    invoices: Arc<dyn InvoiceService>,
}

impl CreateInvoiceTool {
    pub fn new(invoices: Arc<dyn InvoiceService>) -> Self {
        Self { invoices }
    }
}

#[async_trait]
impl Tool for CreateInvoiceTool {
    type Args = CreateInvoiceArgs;
    type Output = Invoice;

    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Creates a new pending invoice and returns it with its assigned id"
    }

    async fn call(&self, args: CreateInvoiceArgs) -> CoreResult<Invoice> {
        let request = args.into_request()?;
        self.invoices
            .create_invoice(&request)
            .await
            .map_err(|e| e.into_tool_error(NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryInvoiceService;
    use crate::model::InvoiceStatus;
    use agent_core::{ToolCall, ToolPayload, ToolRegistry};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn setup() -> (Arc<InMemoryInvoiceService>, ToolRegistry) {
        let service = Arc::new(InMemoryInvoiceService::new());
        let mut registry = ToolRegistry::new();
        registry.register_tool(CreateInvoiceTool::new(service.clone())).unwrap();
        (service, registry)
    }

    #[tokio::test]
    async fn test_creates_pending_invoice() {
        let (service, registry) = setup();

        let result = registry
            .invoke(&ToolCall::new(
                "n1",
                NAME,
                json!({"description": "Hooli audit", "amount": 300.25, "due": "2025-04-30"}),
            ))
            .await;
        assert!(result.is_success(), "{result:?}");

        let stored = service.list_invoices().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].amount, dec!(300.25));
        assert_eq!(stored[0].status, InvoiceStatus::Pending);
        assert_eq!(stored[0].due, Utc.with_ymd_and_hms(2025, 4, 30, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_amount_as_string_accepted() {
        let (service, registry) = setup();
        let result = registry
            .invoke(&ToolCall::new("n1", NAME, json!({"description": "Hosting", "amount": "89.99"})))
            .await;
        assert!(result.is_success(), "{result:?}");
        assert_eq!(service.list_invoices().await.unwrap()[0].amount, dec!(89.99));
    }

    #[tokio::test]
    async fn test_invalid_inputs_are_error_payloads() {
        let (service, registry) = setup();

        let bad_date = registry
            .invoke(&ToolCall::new("n1", NAME, json!({"description": "x", "amount": 5, "due": "soon"})))
            .await;
        assert!(matches!(bad_date.payload, ToolPayload::Error(ref e) if e.contains("due date")));

        let negative = registry
            .invoke(&ToolCall::new("n2", NAME, json!({"description": "x", "amount": -5})))
            .await;
        assert!(matches!(negative.payload, ToolPayload::Error(ref e) if e.contains("positive")));

        assert!(service.list_invoices().await.unwrap().is_empty());
    }

    #[test]
    fn test_schema() {
        let schema = agent_core::tool::parameters_schema::<CreateInvoiceArgs>();
        assert_eq!(schema["properties"]["amount"]["type"], json!("number"));
        assert_eq!(schema["properties"]["due"]["nullable"], json!(true));
        assert_eq!(schema["required"], json!(["amount", "description"]));
    }
}
