use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use folio::app::{App, AppEvent};
use folio::blog::load_catalog;
use folio::config::Config;
use folio::enrich::run_from_config;
use folio::github::GitHubClient;
use folio::projects::{load_showcase, TopicFilter};
use folio::ui;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Get the config directory path (~/.config/folio/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("folio"))
}

#[derive(Parser, Debug)]
#[command(
    name = "folio",
    version,
    about = "Terminal portfolio and blog reader backed by GitHub repositories"
)]
struct Args {
    /// Config file (defaults to ~/.config/folio/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Browse articles and projects in the terminal UI (default)
    Browse,
    /// Print the article catalog, newest first
    Articles,
    /// Print the project showcase
    Projects {
        /// Only show projects carrying this topic
        #[arg(long)]
        topic: Option<String>,
    },
    /// Classify every article with Gemini and write the analysis report
    Analyze {
        /// Report path (overrides `analysis_output`)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with the TUI or printed output
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => get_config_dir()?.join("config.toml"),
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?
        .with_env_overrides();

    let client = GitHubClient::new(
        &config.api_base,
        config.github_token.clone(),
        config.request_timeout(),
    )
    .context("Failed to create GitHub client")?;
    if !client.is_authenticated() {
        tracing::debug!("No GitHub token configured, using anonymous rate limits");
    }

    match args.command.unwrap_or(Command::Browse) {
        Command::Browse => browse(&config, client).await,
        Command::Articles => print_articles(&config, &client).await,
        Command::Projects { topic } => print_projects(&config, &client, topic).await,
        Command::Analyze { output } => analyze(&config, &client, output).await,
    }
}

async fn browse(config: &Config, client: GitHubClient) -> Result<()> {
    let sources = ui::Sources {
        client: Arc::new(client),
        location: config.posts_location(),
        policy: config.body_failure,
        username: config.github_username.clone(),
        project_filter: config.project_filter(),
    };

    let mut app = App::new(config.reader_back_to_top_rows);

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    ui::run(&mut app, sources, event_tx, event_rx).await
}

async fn print_articles(config: &Config, client: &GitHubClient) -> Result<()> {
    let catalog = load_catalog(client, &config.posts_location(), config.body_failure)
        .await
        .context("Failed to load articles")?;

    if catalog.is_empty() {
        println!("No articles found.");
        return Ok(());
    }
    for article in catalog.iter() {
        println!(
            "{}  {:<12}  {:>11}  {}",
            article.short_date(),
            article.category,
            article.read_time_label(),
            article.title
        );
    }
    Ok(())
}

async fn print_projects(
    config: &Config,
    client: &GitHubClient,
    topic: Option<String>,
) -> Result<()> {
    let showcase = load_showcase(client, &config.github_username, &config.project_filter())
        .await
        .context("Failed to load projects")?;

    let filter = topic.map(TopicFilter::Topic).unwrap_or_default();
    let projects = showcase.filtered(&filter);
    if projects.is_empty() {
        println!("No projects found.");
        return Ok(());
    }
    for project in projects {
        println!("{}  ★ {}  ⑂ {}", project.title, project.stars, project.forks);
        println!("    {}", project.description);
        if !project.tech.is_empty() {
            println!("    {}", project.tech.join(", "));
        }
        println!("    {}", project.github);
        if let Some(demo) = &project.demo {
            println!("    Demo: {}", demo);
        }
    }
    Ok(())
}

async fn analyze(config: &Config, client: &GitHubClient, output: Option<PathBuf>) -> Result<()> {
    let Some(report) = run_from_config(config, client, output)
        .await
        .context("Content analysis failed")?
    else {
        return Ok(());
    };

    println!(
        "Analyzed {} articles: {} skills, {} tools, {} topics",
        report.total_articles,
        report.skills.len(),
        report.tools.len(),
        report.topics.len(),
    );
    Ok(())
}
