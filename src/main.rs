mod commands;

use clap::{Parser, Subcommand};
use commands::SendOutcome;
use jiraprompt_core::{config, prompt::OverwriteDecision, traits::Provider};
use jiraprompt_jira::JiraClient;
use jiraprompt_memory::Store;
use jiraprompt_providers::OpenAiProvider;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "jiraprompt",
    version,
    about = "Run reusable prompts over redacted Jira issues"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or change the API key and model.
    Settings {
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Manage the prompt library.
    Prompts {
        #[command(subcommand)]
        action: PromptsCommand,
    },
    /// Print the flattened, redacted content of a page.
    Fetch { url: String },
    /// Print what the popup shows for a page.
    Show { url: String },
    /// Run a prompt over an issue and print the reply.
    Send {
        url: String,
        /// Prompt title or its position in `prompts list`.
        #[arg(short, long)]
        prompt: Option<String>,
    },
    /// Forget the cached reply for an issue.
    Clear { url: String },
}

#[derive(Subcommand)]
enum PromptsCommand {
    /// List prompts in title order.
    List,
    Add { title: String, prompt: String },
    /// Replace the prompt at a listed position.
    Edit {
        position: usize,
        title: String,
        prompt: String,
    },
    Delete {
        position: usize,
        /// Skip the confirmation.
        #[arg(short, long)]
        yes: bool,
    },
    /// Write the library to a CSV file.
    Export {
        #[arg(default_value = "prompts.csv")]
        file: PathBuf,
    },
    /// Merge prompts from a CSV file.
    Import {
        file: PathBuf,
        /// Replace prompts whose titles already exist without asking.
        #[arg(long, conflicts_with = "keep")]
        overwrite: bool,
        /// Keep prompts whose titles already exist without asking.
        #[arg(long)]
        keep: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.general.log_level)),
        )
        .init();

    if Path::new(&cli.config).exists() {
        info!("loaded config from {}", cli.config);
    } else {
        info!("Config file not found at {}, using defaults", cli.config);
    }

    let store = Store::new(&cfg.memory).await?;

    match cli.command {
        Commands::Settings { api_key, model } => {
            let out = if api_key.is_none() && model.is_none() {
                commands::show_settings(&store).await?
            } else {
                commands::update_settings(&store, api_key.as_deref(), model.as_deref()).await?
            };
            println!("{out}");
        }
        Commands::Prompts { action } => {
            println!("{}", run_prompts(&store, action).await?);
        }
        Commands::Fetch { url } => {
            let jira = JiraClient::new(&cfg.jira)?;
            println!("{}", commands::fetch(&jira, &url).await?);
        }
        Commands::Show { url } => {
            println!("{}", commands::show(&store, &url).await?);
        }
        Commands::Send { url, prompt } => {
            let selector = match prompt {
                Some(p) => p,
                None if commands::open_popup(&store, &url).await?.can_send() => {
                    choose_prompt(&store).await?
                }
                None => String::new(),
            };
            let jira = JiraClient::new(&cfg.jira)?;
            let base_url = cfg.provider.base_url.clone();
            let outcome =
                commands::send(&store, &jira, &url, &selector, |settings| -> Box<dyn Provider> {
                    Box::new(OpenAiProvider::from_config(base_url, settings.api_key.clone()))
                })
                .await?;
            match outcome {
                SendOutcome::Completed(text) => println!("{text}"),
                SendOutcome::Blocked(blockers) => {
                    let messages: Vec<&str> = blockers.iter().map(|b| b.message()).collect();
                    anyhow::bail!("{}", messages.join("\n"));
                }
            }
        }
        Commands::Clear { url } => {
            println!("{}", commands::clear(&store, &url).await?);
        }
    }

    Ok(())
}

async fn run_prompts(store: &Store, action: PromptsCommand) -> anyhow::Result<String> {
    let out = match action {
        PromptsCommand::List => commands::list_prompts(store).await?,
        PromptsCommand::Add { title, prompt } => {
            commands::add_prompt(store, &title, &prompt).await?
        }
        PromptsCommand::Edit {
            position,
            title,
            prompt,
        } => commands::edit_prompt(store, position, &title, &prompt).await?,
        PromptsCommand::Delete { position, yes } => {
            commands::delete_prompt(store, position, |p| {
                yes || cliclack::confirm(format!("Delete prompt \"{}\"?", p.title))
                    .initial_value(false)
                    .interact()
                    .unwrap_or(false)
            })
            .await?
        }
        PromptsCommand::Export { file } => commands::export_prompts(store, &file).await?,
        PromptsCommand::Import {
            file,
            overwrite,
            keep,
        } => {
            commands::import_prompts(store, &file, |duplicates| {
                if overwrite {
                    return OverwriteDecision::Overwrite;
                }
                if keep {
                    return OverwriteDecision::KeepExisting;
                }
                confirm_overwrite(duplicates)
            })
            .await?
        }
    };
    Ok(out)
}

/// Ask once whether every duplicate title should be replaced.
/// A cancelled prompt keeps the existing entries.
fn confirm_overwrite(duplicates: &[String]) -> OverwriteDecision {
    let replace = cliclack::confirm(format!(
        "The following prompts already exist and will be replaced:\n{}\nReplace them?",
        duplicates.join(", ")
    ))
    .initial_value(true)
    .interact()
    .unwrap_or(false);
    if replace {
        OverwriteDecision::Overwrite
    } else {
        OverwriteDecision::KeepExisting
    }
}

/// Interactive prompt picker used when `--prompt` is not given.
/// Yields the 1-based position so repeated titles stay distinct.
async fn choose_prompt(store: &Store) -> anyhow::Result<String> {
    let mut prompts = store.prompts().await?;
    jiraprompt_core::prompt::sort_prompts(&mut prompts);

    let mut select = cliclack::select("Select a prompt");
    for (i, p) in prompts.iter().enumerate() {
        select = select.item(i + 1, &p.title, "");
    }
    let position: usize = select.interact()?;
    Ok(position.to_string())
}
