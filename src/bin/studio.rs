use clap::{Parser, Subcommand};
use prompt_studio::studio::{view, Outcome, Studio, TerminalDialogs};
use prompt_studio::{Config, StudioClient};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "studio", about = "CLI for the Prompt Studio image server", version)]
struct Cli {
    /// Override STUDIO_URL
    #[arg(global = true, long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an image from a text prompt
    Generate {
        /// Prompt text
        prompt: String,
        /// Also download the image to this path
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// List saved prompts, newest first
    List {
        /// Output raw JSON instead of lines
        #[arg(long)]
        json: bool,
    },
    /// Show a saved prompt and its image URL
    Show {
        id: i64,
        /// Download the image to this path
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Delete one saved prompt and its image
    Delete {
        id: i64,
        /// Skip the confirmation question
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete every saved prompt and image
    DeleteAll {
        /// Skip the confirmation question
        #[arg(short, long)]
        yes: bool,
    },
    /// Ask the server to shut down
    Shutdown,
}

#[tokio::main]
async fn main() -> ExitCode {
    Config::dotenv_load();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let url = cli.url.unwrap_or_else(|| Config::new().studio_url);
    let client = StudioClient::new(url);

    match run(client, cli.command).await {
        Ok(Outcome::Done) | Ok(Outcome::Skipped) | Ok(Outcome::Cancelled) => ExitCode::SUCCESS,
        Ok(Outcome::Failed) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(client: StudioClient, command: Commands) -> Result<Outcome, Box<dyn std::error::Error>> {
    match command {
        Commands::Generate { prompt, out } => {
            let mut studio = Studio::new(client, TerminalDialogs::new(false));
            studio.set_prompt_input(prompt);
            let outcome = studio.submit().await;
            if outcome == Outcome::Skipped {
                eprintln!("Prompt is empty, nothing to generate");
            }
            if let Some(modal) = studio.view().modal.clone() {
                print!("{}", view::render_modal(&modal));
                println!("URL:    {}", studio.client().resolve(&modal.image_url));
                if let Some(path) = out {
                    save_image(studio.client(), &modal.image_url, &path).await?;
                }
            }
            Ok(outcome)
        }
        Commands::List { json } => {
            let mut studio = Studio::new(client, TerminalDialogs::new(false));
            studio.fetch_saved_prompts().await?;
            let prompts = &studio.view().prompt_list;
            if json {
                println!("{}", serde_json::to_string_pretty(prompts)?);
            } else {
                print!("{}", view::render_prompt_list(prompts));
            }
            Ok(Outcome::Done)
        }
        Commands::Show { id, out } => {
            let mut studio = Studio::new(client, TerminalDialogs::new(false));
            studio.fetch_saved_prompts().await?;
            if !studio.show_saved(id) {
                eprintln!("No saved prompt with id {}", id);
                return Ok(Outcome::Failed);
            }
            if let Some(modal) = studio.view().modal.clone() {
                print!("{}", view::render_modal(&modal));
                println!("URL:    {}", studio.client().resolve(&modal.image_url));
                if let Some(path) = out {
                    save_image(studio.client(), &modal.image_url, &path).await?;
                }
            }
            studio.close_image();
            Ok(Outcome::Done)
        }
        Commands::Delete { id, yes } => {
            let mut studio = Studio::new(client, TerminalDialogs::new(yes));
            let outcome = studio.delete_prompt(id).await;
            if outcome == Outcome::Done {
                print!("{}", view::render_prompt_list(&studio.view().prompt_list));
            }
            Ok(outcome)
        }
        Commands::DeleteAll { yes } => {
            let mut studio = Studio::new(client, TerminalDialogs::new(yes));
            let outcome = studio.remove_all_prompts().await;
            if outcome == Outcome::Done {
                print!("{}", view::render_prompt_list(&studio.view().prompt_list));
            }
            Ok(outcome)
        }
        Commands::Shutdown => {
            println!("{}", client.shutdown().await?);
            Ok(Outcome::Done)
        }
    }
}

async fn save_image(client: &StudioClient, image_url: &str, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = client.fetch_image(image_url).await?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &bytes).await?;
    println!("Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
