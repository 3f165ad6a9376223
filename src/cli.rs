//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, validate, health), and their associated argument
//! structs. Every proxy setting has an environment variable equivalent
//! for container deployments; `TARGET_SERVER_URL` is the one that
//! matters in production.

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "relay",
    version,
    about = "Single-route HTTP forwarding proxy",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        TARGET_SERVER_URL=https://api.example.com relay run\n  \
        relay run --target-url http://localhost:9000 --prefix /api\n  \
        relay validate --target-url https://api.example.com"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the proxy server
    Run(Box<RunArgs>),

    /// Resolve and validate proxy settings without starting
    Validate(ValidateArgs),

    /// Check health of a running instance
    Health(HealthArgs),
}

/// Settings shared by `run` and `validate`.
#[derive(Args, Clone, Debug)]
pub struct ProxyArgs {
    /// Upstream base URL (absolute, no trailing slash)
    #[arg(long, env = "TARGET_SERVER_URL")]
    pub target_url: Option<String>,

    /// Inbound path prefix under which requests are forwarded
    #[arg(long, env = "PROXY_PREFIX", default_value = "/proxy")]
    pub prefix: String,

    /// Upstream response timeout in milliseconds (0 disables)
    #[arg(
        long,
        env = "REQUEST_TIMEOUT_MS",
        default_value_t = 30_000,
        help_heading = "Tuning"
    )]
    pub timeout: u64,
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        relay run                                          Forward /proxy/* to the default upstream\n  \
        relay run --target-url https://api.example.com     Explicit upstream\n  \
        relay run -p 8080 --pretty                         Local dev mode")]
pub struct RunArgs {
    #[command(flatten)]
    pub proxy: ProxyArgs,

    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub proxy: ProxyArgs,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ValidateFormat,
}

#[derive(Args)]
pub struct HealthArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:3000")]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ValidateFormat {
    Text,
    Json,
}
