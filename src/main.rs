use clap::{Parser, ValueEnum};
use roster_mcp::agent::{Agent, AgentOptions};
use roster_mcp::api::ApiClient;
use roster_mcp::api_tools::register_directory_tools;
use roster_mcp::client::{ChatClient, ChatConfig};
use roster_mcp::config::AppConfig;
use roster_mcp::executor::ToolExecutor;
use roster_mcp::http::HttpTransport;
use roster_mcp::model::OllamaClient;
use roster_mcp::store::PeopleStore;
use roster_mcp::tools::people_registry;
use roster_mcp::transport::{LocalTransport, ToolTransport};
use roster_mcp::{server, stdio};
use serde_json::json;
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_DATABASE_PATH: &str = "data/roster.db";

#[derive(Parser, Debug)]
#[command(
    name = "roster-mcp",
    version,
    about = "Tool-calling roster assistant powered by Ollama"
)]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:11434")]
    ollama_url: String,
    /// Remote tool host; when absent, tools run embedded in-process.
    #[arg(long)]
    host_url: Option<String>,
    /// User/post directory REST service; when absent those tools are
    /// not registered.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    config: Option<String>,
    #[arg(long)]
    system: Option<String>,
    #[arg(long)]
    session: Option<String>,
    #[arg(long)]
    prompt_file: Option<String>,
    #[arg(long, value_enum, default_value_t = RunMode::Agent)]
    mode: RunMode,
    #[arg(long, default_value = "127.0.0.1:8080")]
    serve_addr: SocketAddr,
    #[arg(long)]
    database: Option<PathBuf>,
    prompt: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RunMode {
    Agent,
    Stdio,
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    info!("Starting roster-mcp");
    let cli = Cli::parse();
    debug!(?cli.mode, config = ?cli.config, system = ?cli.system, session = ?cli.session, "CLI arguments parsed");
    let config_path = cli.config.as_deref().map(Path::new);
    let file_config = AppConfig::load(config_path)?;
    if let Some(path) = config_path {
        info!(path = %path.display(), "Loaded configuration from file");
    } else {
        info!("Loaded configuration using default path or defaults");
    }

    if matches!(cli.mode, RunMode::Serve) {
        let executor = build_executor(&cli, &file_config)?;
        info!(addr = %cli.serve_addr, "Starting tool host");
        server::serve(executor, cli.serve_addr).await?;
        info!("Tool host shut down");
        return Ok(());
    }

    debug!(ollama_url = %cli.ollama_url, "Creating Ollama provider");
    let provider = OllamaClient::new(cli.ollama_url.clone());
    let mut chat_config = ChatConfig::new(file_config.model.clone())
        .with_prompt_template(file_config.prompt_template.clone());
    if let Some(system_prompt) = cli.system.clone().or(file_config.system_prompt.clone()) {
        chat_config = chat_config.with_system_prompt(system_prompt);
    }
    let chat = Arc::new(ChatClient::new(provider, chat_config));
    let transport = build_transport(&cli, &file_config)?;

    info!(mode = ?cli.mode, "Running in selected mode");
    match cli.mode {
        RunMode::Agent => {
            let prompt = load_prompt(&cli)?;
            let mut options = AgentOptions::default();
            options.session_id = cli.session.clone();
            options.system_prompt = cli.system.clone().or(file_config.system_prompt.clone());
            options.max_steps = file_config.max_steps;
            info!("Executing agent workflow from CLI");
            let agent = Agent::new(chat.clone(), transport);
            let outcome = agent.run(prompt, options).await?;
            let output = json!({
                "session_id": outcome.session_id,
                "content": outcome.response,
                "tool_steps": outcome.steps,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        RunMode::Stdio => {
            info!("Entering STDIO mode; awaiting JSON line input");
            stdio::run(chat.clone(), transport, file_config.max_steps).await?;
        }
        RunMode::Serve => unreachable!("handled above"),
    }
    info!("Execution finished");
    Ok(())
}

fn build_executor(cli: &Cli, config: &AppConfig) -> Result<Arc<ToolExecutor>, Box<dyn Error>> {
    let database = cli
        .database
        .clone()
        .or_else(|| config.database.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));
    info!(path = %database.display(), "Opening roster database");
    let store = Arc::new(PeopleStore::open(&database)?);
    let mut registry = people_registry(store)?;
    if let Some(api_url) = cli.api_url.clone().or_else(|| config.api_url.clone()) {
        info!(url = %api_url, "Registering directory service tools");
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let api = Arc::new(ApiClient::new(api_url, timeout)?);
        register_directory_tools(&mut registry, api)?;
    }
    Ok(Arc::new(ToolExecutor::new(registry)))
}

fn build_transport(cli: &Cli, config: &AppConfig) -> Result<Arc<dyn ToolTransport>, Box<dyn Error>> {
    let host_url = cli.host_url.clone().or_else(|| config.host_url.clone());
    match host_url {
        Some(url) => {
            info!(%url, "Using remote tool host");
            let timeout = Duration::from_secs(config.request_timeout_secs);
            Ok(Arc::new(HttpTransport::new(url, timeout)?))
        }
        None => {
            info!("Using embedded tools");
            let executor = build_executor(cli, config)?;
            Ok(Arc::new(LocalTransport::new(executor)))
        }
    }
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .init();
    });
}

fn load_prompt(cli: &Cli) -> Result<String, Box<dyn Error>> {
    if let Some(path) = &cli.prompt_file {
        info!(path = %path, "Loading prompt from file");
        let content = fs::read_to_string(path)?;
        return Ok(normalize_prompt(content));
    }

    if !cli.prompt.is_empty() {
        info!("Using prompt provided through CLI arguments");
        let joined = cli.prompt.join(" ");
        return Ok(normalize_prompt(joined));
    }

    if atty::isnt(atty::Stream::Stdin) {
        info!("Reading prompt from standard input");
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(normalize_prompt(buffer));
    }

    warn!("Prompt not provided via arguments, file, or stdin");
    Err("prompt required via arguments, file, or stdin".into())
}

fn normalize_prompt(prompt: String) -> String {
    prompt.trim().to_string()
}
