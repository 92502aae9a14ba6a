//! Command-line and environment configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Invoice agent HTTP gateway
#[derive(Debug, Clone, Parser)]
#[command(name = "invoice-gateway", version, about)]
pub struct Cli {
    /// LLM provider: openai, gemini, claude (anthropic) or ollama
    #[arg(long, env = "AGENT_PROVIDER", default_value = "openai")]
    pub provider: String,

    /// Model id; defaults per provider
    #[arg(long, env = "AGENT_MODEL")]
    pub model: Option<String>,

    /// Override the provider's API base URL
    #[arg(long, env = "BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:5001")]
    pub bind: SocketAddr,

    /// Root of the invoice REST API
    #[arg(long, env = "INVOICE_API_URL", default_value = invoice_tools::client::DEFAULT_BASE_URL)]
    pub invoice_api_url: String,

    /// Serve a built-in demo invoice book instead of calling the invoice API
    #[arg(long, env = "DEMO_INVOICES")]
    pub demo_invoices: bool,

    /// Directory holding documentation pages as `<name>.md`
    #[arg(long, env = "DOCS_DIR", default_value = "Docs")]
    pub docs_dir: PathBuf,

    /// Maximum tool-invocation rounds per turn
    #[arg(long, default_value_t = 8)]
    pub max_tool_rounds: usize,

    /// Tool calls from one round allowed to run at once
    #[arg(long, default_value_t = 4)]
    pub tool_concurrency: usize,

    /// Whole-turn deadline; the turn is cancelled when it passes
    #[arg(long, default_value_t = 120)]
    pub request_timeout_secs: u64,

    /// Per-request timeout for LLM backend calls
    #[arg(long, default_value_t = 60)]
    pub backend_timeout_secs: u64,

    #[arg(long, default_value_t = 1.0)]
    pub temperature: f32,

    #[arg(long, default_value_t = 5000)]
    pub max_output_tokens: u32,

    /// Log filter in `RUST_LOG` syntax
    #[arg(long, env = "RUST_LOG", default_value = "info,tower_http=debug")]
    pub log_level: String,
}

impl Cli {
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub const fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "invoice-gateway",
            "--provider",
            "claude",
            "--model",
            "claude-3-5-haiku-latest",
            "--bind",
            "127.0.0.1:8080",
            "--max-tool-rounds",
            "3",
            "--request-timeout-secs",
            "15",
            "--demo-invoices",
        ])
        .unwrap();

        assert_eq!(cli.provider, "claude");
        assert_eq!(cli.model.as_deref(), Some("claude-3-5-haiku-latest"));
        assert_eq!(cli.bind, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(cli.max_tool_rounds, 3);
        assert_eq!(cli.request_timeout(), Duration::from_secs(15));
        assert!(cli.demo_invoices);
    }

    #[test]
    fn test_numeric_defaults() {
        let cli = Cli::try_parse_from(["invoice-gateway"]).unwrap();
        assert_eq!(cli.max_tool_rounds, 8);
        assert_eq!(cli.tool_concurrency, 4);
        assert_eq!(cli.max_output_tokens, 5000);
        assert!((cli.temperature - 1.0).abs() < f32::EPSILON);
        assert_eq!(cli.backend_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_rejects_bad_bind_address() {
        assert!(Cli::try_parse_from(["invoice-gateway", "--bind", "not-an-address"]).is_err());
    }
}
