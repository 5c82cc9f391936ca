use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use tapix_core::Period;

mod app;
mod auth;
mod commands;
mod config;
mod llm;
mod state;
mod ui;

use app::App;
use config::process_env;
use ui::Theme;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TAPIX_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "tapix", version = VERSION, about = "Chat with your card transactions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Default)]
struct DataArgs {
    /// Transaction file (defaults to [data] csv, then the bundled sample)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Month to analyse as YYYY-MM (defaults to the latest month in the data)
    #[arg(long)]
    period: Option<Period>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive chat (full-screen unless --plain or not a terminal)
    Chat {
        #[command(flatten)]
        data: DataArgs,

        /// Line-based mode without the full-screen UI
        #[arg(long)]
        plain: bool,

        /// midnight or daylight (overrides [chat] theme)
        #[arg(long)]
        theme: Option<String>,
    },

    /// Ask one question and print the reply
    Ask {
        question: Vec<String>,

        #[command(flatten)]
        data: DataArgs,
    },

    /// Print the metrics panel and category breakdown
    Stats {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Print the context the assistant receives
    Context {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long)]
        json: bool,
    },

    /// Manage ~/.tapix/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Store API keys in ~/.tapix/auth.json
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config file if none exists
    Init,
    /// Print the effective configuration
    Show,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    PasteOpenaiApiKey,
    PasteAnthropicToken,
    /// Show which providers have a key
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Chat { data, plain, theme } => {
            let (cfg, mut app) = open_app(&data);
            if plain || !io::stdout().is_terminal() {
                let stdin = io::stdin();
                let echo = !stdin.is_terminal();
                ui::plain::run_plain(&mut app, stdin.lock(), io::stdout(), echo)?;
            } else {
                let theme = Theme::resolve(theme.as_deref().unwrap_or(&cfg.chat.theme));
                ui::tui::run_tui(&mut app, theme)?;
            }
        }

        Command::Ask { question, data } => {
            let question = question.join(" ");
            if question.trim().is_empty() {
                anyhow::bail!("nothing to ask (usage: tapix ask \"How much did I spend at Tesco?\")");
            }
            let (_, mut app) = open_app(&data);
            if let Some(n) = &app.notice {
                eprintln!("note: {n}");
            }
            if let Some(reply) = app.ask(&question) {
                println!("{}", reply.content);
            }
        }

        Command::Stats { data } => {
            let (_, app) = open_app(&data);
            let view = app.view(None, "");
            println!("{}\n", view.title);
            print!("{}", ui::stats_text(&view));
        }

        Command::Context { data, json } => {
            let (_, app) = open_app(&data);
            let ctx = app.session.context();
            if json {
                println!("{}", serde_json::to_string_pretty(&ctx).context("serialize context")?);
            } else {
                println!("{}", ctx.to_lines());
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                println!("# {}", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
                println!("\n# effective model: {}", cfg.effective_model(process_env));
            }
        },

        Command::Auth { command } => match command {
            AuthCommand::PasteOpenaiApiKey => auth::openai_paste_api_key()?,
            AuthCommand::PasteAnthropicToken => auth::anthropic_paste_api_key()?,
            AuthCommand::Status => {
                let (cfg, _) = config::config_or_default(config::load_config());
                auth::print_status(cfg.llm.api_key_env.as_deref())?;
            }
        },
    }

    Ok(())
}

/// A broken config or key store degrades to defaults plus a notice
fn open_app(data: &DataArgs) -> (config::Config, App) {
    let (cfg, cfg_notice) = config::config_or_default(config::load_config());
    let (auth, auth_notice) = auth::auth_or_default(auth::load_auth());
    let app = App::open(&cfg, &auth, process_env, data.csv.as_deref(), data.period)
        .with_notices([cfg_notice, auth_notice]);
    (cfg, app)
}
