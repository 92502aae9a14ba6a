//! Mark Invoice Paid Tool

use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::client::InvoiceService;
use crate::model::InvoiceStatus;

const NAME: &str = "mark_invoice_paid";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MarkInvoicePaidArgs {
    /// Numeric id of the invoice, as returned by the lookup tools
    #[serde(alias = "id", alias = "invoiceId")]
    pub invoice_id: i64,
}

/// Returned once the status change is accepted
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentConfirmation {
    pub id: i64,
    pub status: InvoiceStatus,
}

/// Tool for settling an invoice
pub struct MarkInvoicePaidTool {
    invoices: Arc<dyn InvoiceService>,
}

impl MarkInvoicePaidTool {
    pub fn new(invoices: Arc<dyn InvoiceService>) -> Self {
        Self { invoices }
    }
}

#[async_trait]
impl Tool for MarkInvoicePaidTool {
    type Args = MarkInvoicePaidArgs;
    type Output = PaymentConfirmation;

    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Marks the invoice with this id as paid"
    }

    async fn call(&self, args: MarkInvoicePaidArgs) -> CoreResult<PaymentConfirmation> {
        self.invoices
            .mark_as_paid(args.invoice_id)
            .await
            .map_err(|e| e.into_tool_error(NAME))?;

        Ok(PaymentConfirmation {
            id: args.invoice_id,
            status: InvoiceStatus::Paid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryInvoiceService;
    use agent_core::{ToolCall, ToolPayload, ToolRegistry};
    use serde_json::json;

    #[tokio::test]
    async fn test_marks_paid_and_reports_missing() {
        let service = Arc::new(InMemoryInvoiceService::seeded());
        let mut registry = ToolRegistry::new();
        registry.register_tool(MarkInvoicePaidTool::new(service.clone())).unwrap();

        let paid = registry.invoke(&ToolCall::new("p1", NAME, json!({"invoice_id": 2}))).await;
        assert_eq!(paid.payload, ToolPayload::Success(json!({"id": 2, "status": "Paid"})));

        let invoice = service.find_invoice_by_description("Globex").await.unwrap().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);

        let missing = registry.invoke(&ToolCall::new("p2", NAME, json!({"id": 404}))).await;
        assert!(matches!(missing.payload, ToolPayload::Error(ref e) if e.contains("not found")));
    }
}
