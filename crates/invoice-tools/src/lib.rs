//! # invoice-tools
//!
//! Invoice and documentation tools the agent can call while answering
//! billing questions.
//!
//! ## Tools
//!
//! ```text
//! ┌──────────────────────────┬──────────────────────────────────────┐
//! │ get_documentation_page   │ {page_name}  → markdown or null      │
//! │ list_invoices            │ {}           → [Invoice]             │
//! │ find_invoice_by_name     │ {name}       → Invoice or null       │
//! │ create_invoice           │ {description, amount, due?} → Invoice│
//! │ mark_invoice_paid        │ {invoice_id} → {id, status}          │
//! └──────────────────────────┴──────────────────────────────────────┘
//! ```
//!
//! Collaborator failures (timeouts, non-2xx responses) surface as tool
//! errors, so the model sees them and the turn carries on.

use std::sync::Arc;

use agent_core::ToolRegistry;

pub mod client;
pub mod docs;
pub mod error;
pub mod model;
pub mod svckit;

pub use client::{HttpInvoiceClient, InMemoryInvoiceService, InvoiceService};
pub use docs::{DocumentationSource, FileDocumentation};
pub use error::{InvoiceError, Result};
pub use model::{CreateInvoiceRequest, Invoice, InvoiceStatus};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{
        CreateInvoiceTool, DocumentationTool, FindInvoiceTool, ListInvoicesTool, MarkInvoicePaidTool,
    };
}

/// Registry holding every invoice agent tool, in advertised order
pub fn registry(
    invoices: Arc<dyn InvoiceService>,
    docs: Arc<dyn DocumentationSource>,
) -> agent_core::Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register_tool(tools::DocumentationTool::new(docs))?;
    registry.register_tool(tools::ListInvoicesTool::new(invoices.clone()))?;
    registry.register_tool(tools::FindInvoiceTool::new(invoices.clone()))?;
    registry.register_tool(tools::CreateInvoiceTool::new(invoices.clone()))?;
    registry.register_tool(tools::MarkInvoicePaidTool::new(invoices))?;
    Ok(registry)
}

/// System prompt for the invoice agent
pub const INVOICE_AGENT_PROMPT: &str = r#"You are an invoicing assistant for a small business. You answer questions about invoices and about how the invoicing product works.

## How to Work

1. For questions about the product, billing rules or procedures, read the relevant page with `get_documentation_page` before answering
2. For questions about specific invoices, use `find_invoice_by_name` with the customer or description the user mentioned
3. Use `list_invoices` for totals, overviews and questions like "what is overdue?"
4. Only call `create_invoice` or `mark_invoice_paid` when the user explicitly asks for it, and confirm the details you used

## Answering

- Quote amounts with two decimals and the due date of every invoice you mention
- Compare due dates against today's date to say whether an invoice is overdue
- If a tool returns an error, tell the user the invoice system could not be reached instead of guessing
- If a lookup returns nothing, say so plainly

## Tools Available

- `get_documentation_page` - Read a documentation page by name
- `list_invoices` - All invoices in the system
- `find_invoice_by_name` - One invoice by description
- `create_invoice` - Raise a new pending invoice
- `mark_invoice_paid` - Settle an invoice by id

Never invent invoice data that did not come from these tools."#;
