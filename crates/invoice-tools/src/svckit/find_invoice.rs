//! Find Invoice Tool
//!
//! Looks an invoice up by its description. A miss is `null`, not an error.

use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::client::InvoiceService;
use crate::model::Invoice;

const NAME: &str = "find_invoice_by_name";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FindInvoiceArgs {
    /// Invoice description or customer name to search for
    pub name: String,
}

/// Tool for finding a single invoice
pub struct FindInvoiceTool {
    invoices: Arc<dyn InvoiceService>,
}

impl FindInvoiceTool {
    pub fn new(invoices: Arc<dyn InvoiceService>) -> Self {
        Self { invoices }
    }
}

#[async_trait]
impl Tool for FindInvoiceTool {
    type Args = FindInvoiceArgs;
    type Output = Option<Invoice>;

    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Finds the invoice with this name"
    }

    async fn call(&self, args: FindInvoiceArgs) -> CoreResult<Option<Invoice>> {
        self.invoices
            .find_invoice_by_description(&args.name)
            .await
            .map_err(|e| e.into_tool_error(NAME))
    }
}
