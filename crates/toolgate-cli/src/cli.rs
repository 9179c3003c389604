use clap::{Args, Parser, Subcommand};

/// Toolgate CLI - checksum-pinned review and gating of MCP tool catalogs
#[derive(Parser, Debug)]
#[command(name = "toolgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Review a server's tools and write a policy file
    Review(ReviewArgs),

    /// Compare a policy file against a server's live tool list
    Compare(CompareArgs),

    /// Serve the browser-based review UI
    Webserver(WebserverArgs),
}

#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Server locator: stdio:<command [args]> or http(s)://<endpoint>
    #[arg(long)]
    pub server: String,

    /// Treat the http(s) endpoint as MCP-over-SSE
    #[arg(long)]
    pub sse: bool,

    /// Policy file to write
    #[arg(long, default_value = "toolgate_config.yaml")]
    pub config: String,

    /// Per-exchange I/O timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Accept every advertised tool without prompting
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Server locator: stdio:<command [args]> or http(s)://<endpoint>
    #[arg(long)]
    pub server: String,

    /// Treat the http(s) endpoint as MCP-over-SSE
    #[arg(long)]
    pub sse: bool,

    /// Policy file to compare against
    #[arg(long)]
    pub config: String,

    /// Per-exchange I/O timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

#[derive(Args, Debug)]
pub struct WebserverArgs {
    /// Server locator: stdio:<command [args]> or http(s)://<endpoint>
    #[arg(long)]
    pub server: String,

    /// Treat the http(s) endpoint as MCP-over-SSE
    #[arg(long)]
    pub sse: bool,

    /// Per-exchange I/O timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Host to bind the review UI to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the review UI to
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
}
