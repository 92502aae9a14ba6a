//! Service Kit - Agent Tools
//!
//! Domain-specific tools that implement `agent_core::Tool` for the invoice agent.

mod create_invoice;
mod documentation;
mod find_invoice;
mod list_invoices;
mod mark_paid;

pub use create_invoice::{CreateInvoiceArgs, CreateInvoiceTool};
pub use documentation::{DocumentationArgs, DocumentationTool};
pub use find_invoice::{FindInvoiceArgs, FindInvoiceTool};
pub use list_invoices::{ListInvoicesArgs, ListInvoicesTool};
pub use mark_paid::{MarkInvoicePaidArgs, MarkInvoicePaidTool, PaymentConfirmation};
