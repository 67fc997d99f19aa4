use clap::Parser;
use savings_advisor_pipeline::{
    agent::Orchestrator,
    config::AdvisorConfig,
    console::{Confirmation, Console, PresetConfirmation, StdinConfirmation},
    gemini::GeminiClient,
    nodes::{NodeContext, PipelineSettings},
    prompts::{PromptLoader, ANALYZER_SYSTEM, ANALYZER_USER},
    retry::RetryPolicy,
    telemetry,
    tools::{create_default_registry, WebSearchTool},
    WorkflowState,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "advisor")]
#[command(about = "Analyze a bank statement, allocate savings and pick a stock")]
struct Cli {
    /// Bank statement PDF for the month
    #[arg(long, default_value = "data/transactions_november.pdf")]
    statement: PathBuf,

    #[arg(long, default_value_t = 35)]
    age: u32,

    /// Investor already holds insurance
    #[arg(long)]
    insured: bool,

    /// Directory with prompt template overrides
    #[arg(long)]
    prompts_dir: Option<PathBuf>,

    /// Answer the purchase confirmation without prompting
    #[arg(long)]
    confirm: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = AdvisorConfig::from_env()?;
    let log_path = telemetry::init(&config.log_dir)?;

    info!(
        model = %config.gemini_model,
        log_file = %log_path.display(),
        web_search = config.tavily_api_key.is_some(),
        "Savings advisor starting"
    );

    let llm = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.temperature,
    )?;
    let registry = create_default_registry(WebSearchTool::new(config.tavily_api_key.clone())?);

    let prompts = match cli.prompts_dir.clone().or_else(|| config.prompts_dir.clone()) {
        Some(dir) => PromptLoader::with_dir(dir),
        None => PromptLoader::builtin(),
    };

    let confirmation: Arc<dyn Confirmation> = match cli.confirm.clone() {
        Some(answer) => Arc::new(PresetConfirmation::new(answer)),
        None => Arc::new(StdinConfirmation),
    };

    let console = Console::stdout();
    let initial = WorkflowState::seeded(
        prompts.load(ANALYZER_SYSTEM)?,
        prompts.render(
            ANALYZER_USER,
            &[("test_pdf", cli.statement.display().to_string())],
        )?,
        cli.age,
        cli.insured,
    );

    let orchestrator = Orchestrator::new(NodeContext {
        llm: Arc::new(llm),
        tools: registry,
        prompts,
        console,
        confirmation,
        retry: RetryPolicy::default(),
        settings: PipelineSettings::default(),
    });

    console.banner("🤖 Running integrated savings advisor");

    match orchestrator.run(initial).await {
        Ok(report) => {
            let state = &report.state;
            let savings = state.formatted_savings.as_deref().unwrap_or("₹0.00").to_string();
            let decision = report
                .decision()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "none".to_string());
            let instrument = state
                .investment_instruments
                .as_ref()
                .and_then(|items| items.first())
                .and_then(|item| item.lines().next())
                .unwrap_or("-")
                .to_string();
            let run_id = report.run_id.to_string();
            let steps = report.timings.len().to_string();

            console.result_box(
                "RUN SUMMARY",
                [
                    ("Run ID", run_id.as_str()),
                    ("Savings", savings.as_str()),
                    ("Instrument", instrument.as_str()),
                    ("Decision", decision.as_str()),
                    ("Steps", steps.as_str()),
                ],
            );
            console.plain("\n------Thank you------");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Pipeline run failed");
            eprintln!("Pipeline run failed: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}
