//! pulse-agent binary
//!
//! Ask questions about a Pulse application, inspect its semantics, generate
//! SQL or get question suggestions from the command line.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use llm::config::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use llm::remote::OpenAiClient;
use llm::{ChatModel, RemoteLlmConfig};
use pulse::{PulseApi, PulseClient, PulseConfig, Semantics};
use pulse_agent::suggest::split_suggestions;
use pulse_agent::tools::GenerateSqlTool;
use pulse_agent::{
    suggest_questions, AgentConfig, AgentInput, PulseAgentBuilder, PulseToolkit, StopReason,
    DEFAULT_SUGGESTION_COUNT,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pulse-agent")]
#[command(about = "Answer questions from Pulse analytics data", long_about = None)]
#[command(version)]
struct Cli {
    /// Pulse API key
    #[arg(long, env = "PULSE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Pulse application id
    #[arg(long, env = "PULSE_APPLICATION_ID")]
    application_id: Option<String>,

    /// Pulse API base URL
    #[arg(long, env = "PULSE_BASE_URL")]
    base_url: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Chat model name
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Chat completions base URL
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    llm_base_url: String,

    /// Agent configuration file (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Agent mode: react or tool-calling
    #[arg(long)]
    mode: Option<String>,

    /// Log every agent step
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the agent a question
    Ask {
        question: String,
    },

    /// Suggest questions the semantics can answer
    Suggest {
        #[arg(short = 'n', long, default_value_t = DEFAULT_SUGGESTION_COUNT)]
        count: usize,

        /// Print one question per line without list markers
        #[arg(long)]
        plain: bool,
    },

    /// Print the application semantics
    Semantics {
        /// Only endpoint cubes
        #[arg(long, conflicts_with = "tables")]
        endpoints: bool,

        /// Only raw table cubes
        #[arg(long)]
        tables: bool,
    },

    /// Generate SQL for a request without running it
    GenerateSql {
        request: String,
    },
}

impl Cli {
    fn pulse_client(&self) -> anyhow::Result<Arc<dyn PulseApi>> {
        let (Some(api_key), Some(application_id)) = (&self.api_key, &self.application_id) else {
            bail!("Pulse credentials missing: set --api-key/PULSE_API_KEY and --application-id/PULSE_APPLICATION_ID");
        };

        let mut config = PulseConfig::new(api_key, application_id);
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url);
        }
        Ok(Arc::new(PulseClient::new(config).context("Failed to create Pulse client")?))
    }

    fn chat_model(&self) -> anyhow::Result<Arc<dyn ChatModel>> {
        let Some(api_key) = &self.openai_api_key else {
            bail!("OpenAI API key missing: set --openai-api-key or OPENAI_API_KEY");
        };

        let config = RemoteLlmConfig::new(api_key, &self.llm_base_url, &self.model);
        Ok(Arc::new(OpenAiClient::new(config).context("Failed to create chat model")?))
    }

    /// File settings, then `PULSE_AGENT_*` variables, then flags.
    fn agent_config(&self) -> anyhow::Result<AgentConfig> {
        let mut config = match &self.config {
            Some(path) => AgentConfig::load(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => AgentConfig::default(),
        };
        config.apply_env()?;
        if let Some(mode) = &self.mode {
            config.mode = mode.parse()?;
        }
        config.verbose |= self.verbose;
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(rust_log)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let api = cli.pulse_client()?;

    match &cli.command {
        Commands::Ask { question } => {
            let config = cli.agent_config()?;
            let llm = cli.chat_model()?;
            let toolkit = PulseToolkit::new(api, llm.clone()).await?;

            let agent = PulseAgentBuilder::from_config(&config)
                .with_llm(llm)
                .with_toolkit(toolkit)
                .build()
                .await?;

            let output = agent.invoke(AgentInput::new(question.as_str())).await?;
            if output.stop_reason != StopReason::Finished {
                tracing::warn!(
                    reason = ?output.stop_reason,
                    steps = output.intermediate_steps.len(),
                    "Agent did not finish"
                );
            }
            println!("{}", output.output);
        }
        Commands::Suggest { count, plain } => {
            let llm = cli.chat_model()?;
            let semantics = Semantics::fetch(api.as_ref()).await?;
            let text = suggest_questions(llm.as_ref(), &semantics, *count).await?;

            if *plain {
                for question in split_suggestions(&text) {
                    println!("{}", question);
                }
            } else {
                println!("{}", text.trim());
            }
        }
        Commands::Semantics { endpoints, tables } => {
            let semantics = Semantics::fetch(api.as_ref()).await?;
            let view = if *endpoints {
                semantics.filter_endpoints()
            } else if *tables {
                semantics.filter_tables()
            } else {
                semantics.view()
            };
            print!("{}", view.to_text()?);
        }
        Commands::GenerateSql { request } => {
            let llm = cli.chat_model()?;
            let semantics = Semantics::fetch(api.as_ref()).await?;
            let sql = GenerateSqlTool::new(llm, &semantics).run(request).await?;
            println!("{}", sql.trim());
        }
    }

    Ok(())
}
