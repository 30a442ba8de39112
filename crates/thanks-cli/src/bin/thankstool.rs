use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use thanks_cli::commands::{config_ops, live_ops, text_ops};
use thanks_core::model::MentionKind;
use thanks_core::moderation::{ReportStatus, ViewScope};
use thanks_core::settings::settings;
use thanks_engine::transport::{Feed, HttpTransport};

#[derive(Parser)]
#[command(name = "thankstool", about = "Thanks Share client diagnostics")]
struct Cli {
    /// Settings TOML to use instead of the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Server base URL (defaults to `[api] base_url`)
    #[arg(long, global = true)]
    server: Option<String>,
    /// Bearer token for authenticated endpoints
    #[arg(long, global = true)]
    token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the canonical search form of each text
    Normalize {
        texts: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a post body against the draft limits
    CheckDraft { text: String },
    /// Settings file tools
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Search mention candidates
    Search {
        query: String,
        #[arg(long, value_enum, default_value = "user")]
        kind: KindArg,
    },
    /// List timeline posts
    Posts {
        #[arg(long, value_enum, default_value = "all")]
        feed: FeedArg,
        #[arg(long)]
        json: bool,
    },
    /// Like a post
    Like { post_id: u64 },
    /// Remove a like
    Unlike { post_id: u64 },
    /// Admin moderation
    Moderate {
        #[command(subcommand)]
        action: ModerateAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Export default settings as TOML
    Export,
    /// Validate a custom settings TOML file
    Validate { file: String },
}

#[derive(Subcommand)]
enum ModerateAction {
    /// List posts in a view (active, deleted, reported, all)
    List {
        #[arg(default_value = "active")]
        scope: ViewScope,
        /// Filter by content or reporter name
        #[arg(long, default_value = "")]
        query: String,
    },
    /// Change a report's status (pending, ignored, deleted)
    Set {
        report_id: u64,
        status: ReportStatus,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    User,
    Department,
}

#[derive(Clone, Copy, ValueEnum)]
enum FeedArg {
    All,
    Mentioned,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    if let Some(path) = &cli.config {
        config_ops::settings_load(path);
    }

    let transport = || {
        let timeout = Duration::from_secs(settings().api.timeout_secs);
        let base = cli.server.as_deref().unwrap_or(&settings().api.base_url);
        HttpTransport::new(base, cli.token.clone(), timeout)
    };

    match cli.command {
        Command::Normalize { ref texts, json } => text_ops::normalize_cmd(texts, json),
        Command::CheckDraft { ref text } => text_ops::check_draft_cmd(text),
        Command::Settings { ref action } => match action {
            SettingsAction::Export => config_ops::settings_export(),
            SettingsAction::Validate { file } => config_ops::settings_validate(file),
        },
        Command::Search { ref query, kind } => {
            let kind = match kind {
                KindArg::User => MentionKind::User,
                KindArg::Department => MentionKind::Department,
            };
            live_ops::search_cmd(&transport(), kind, query)
        }
        Command::Posts { feed, json } => {
            let feed = match feed {
                FeedArg::All => Feed::All,
                FeedArg::Mentioned => Feed::Mentioned,
            };
            live_ops::posts_cmd(&transport(), feed, json)
        }
        Command::Like { post_id } => live_ops::like_cmd(&transport(), post_id, true),
        Command::Unlike { post_id } => live_ops::like_cmd(&transport(), post_id, false),
        Command::Moderate { ref action } => match action {
            ModerateAction::List { scope, query } => {
                live_ops::moderate_list_cmd(&transport(), *scope, query)
            }
            ModerateAction::Set {
                report_id,
                status,
                yes,
            } => live_ops::moderate_set_cmd(&transport(), *report_id, *status, *yes),
        },
    }
}
