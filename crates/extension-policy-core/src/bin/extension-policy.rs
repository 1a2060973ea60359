//! Command-line front end for extension policy queries
//!
//! Queries the PBX for an extension's connect params and evaluates the
//! call and chat rules, e.g.:
//!
//! ```text
//! extension-policy --account 100@pbx.example.com chat 100 200
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use extension_policy_core::logging::{parse_log_level, setup_logging, LoggingConfig};
use extension_policy_core::{
    AccountRef, ExtensionPolicyBuilder, PolicyConfig, PolicyEvaluator, StaticAccountDirectory,
};

#[derive(Parser, Debug)]
#[command(name = "extension-policy", version, about = "Query guest calling and messaging policy")]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Local account as EXT@DOMAIN (repeatable)
    #[arg(short, long = "account", value_name = "EXT@DOMAIN")]
    accounts: Vec<AccountRef>,

    /// Account used for extensions with no local account
    #[arg(long, value_name = "EXT@DOMAIN")]
    default_account: Option<AccountRef>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the connect params of an extension
    Params { extension: String },
    /// Whether the conversations page is available to an extension
    Conversations { extension: String },
    /// Whether FROM may chat with TO
    Chat {
        from: String,
        to: String,
        /// The chat is a group chat
        #[arg(long)]
        group: bool,
    },
    /// Whether FROM may call TO
    Call { from: String, to: String },
}

impl Cli {
    fn directory(&self) -> StaticAccountDirectory {
        let mut directory = self
            .accounts
            .iter()
            .cloned()
            .fold(StaticAccountDirectory::new(), StaticAccountDirectory::with_account);
        if let Some(default) = &self.default_account {
            directory = directory.with_default(default.clone());
        }
        directory
    }

    async fn execute(self, policy: PolicyEvaluator) -> Result<()> {
        match self.command {
            Command::Params { extension } => {
                match policy.resolver().resolve_params(&extension).await {
                    Some(params) => println!("{}", serde_json::to_string_pretty(&params)?),
                    None => println!("unknown"),
                }
            }
            Command::Conversations { extension } => {
                println!("{}", policy.conversations_page_enabled(&extension).await);
            }
            Command::Chat { from, to, group } => {
                println!("{}", policy.outgoing_chat_allowed(&from, &to, group).await);
            }
            Command::Call { from, to } => {
                println!("{}", policy.outgoing_call_allowed(&from, &to).await);
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = parse_log_level(&cli.log_level)?;
    let mut logging = LoggingConfig::new(level);
    if cli.json_logs {
        logging = logging.with_json();
    }
    setup_logging(logging)?;

    let config = PolicyConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    info!(
        version = extension_policy_core::VERSION,
        port = config.port,
        "Starting extension policy query"
    );

    let policy = ExtensionPolicyBuilder::new(cli.directory())
        .config(config)
        .build()
        .context("failed to build policy service")?;

    cli.execute(policy).await
}
