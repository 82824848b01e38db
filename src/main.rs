//! Duologue - run a moderated discussion between two LLMs from the command line

use anyhow::Context;
use clap::Parser;
use duologue::config::RunConfig;
use duologue::conversation::{ConversationState, Role};
use duologue::export::write_markdown;
use duologue::llm::{all_models, LlmConfig, ModelRegistry};
use duologue::ports::{LlmParticipant, LlmSummarizer};
use duologue::runtime::{ProductionDriver, StepOutcome};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "duologue")]
#[command(about = "Two LLMs discuss a topic while a third keeps the minutes", long_about = None)]
struct Cli {
    /// Discussion topic
    #[arg(short, long, env = "DUOLOGUE_TOPIC", required_unless_present = "list_models")]
    topic: Option<String>,

    /// Conversational turns before the final summary
    #[arg(long, env = "DUOLOGUE_MAX_TURNS", default_value_t = 8)]
    max_turns: u32,

    /// Produce a periodic summary every N turns
    #[arg(long, env = "DUOLOGUE_SUMMARY_INTERVAL", default_value_t = 4)]
    summary_interval: u32,

    /// Most recent turns shown to each participant (default: all)
    #[arg(long, env = "DUOLOGUE_HISTORY_WINDOW")]
    history_window: Option<usize>,

    #[arg(long, env = "DUOLOGUE_PARTICIPANT_A_MODEL", default_value = "gpt-4o")]
    participant_a_model: String,

    #[arg(long, env = "DUOLOGUE_PARTICIPANT_B_MODEL", default_value = "sonar")]
    participant_b_model: String,

    #[arg(long, env = "DUOLOGUE_SUMMARIZER_MODEL", default_value = "gpt-4o-mini")]
    summarizer_model: String,

    /// Directory receiving the markdown transcript
    #[arg(long, env = "DUOLOGUE_OUTPUT_DIR", default_value = "conversation_results")]
    output_dir: PathBuf,

    /// Skip writing the transcript
    #[arg(long)]
    no_export: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Print the model catalog and exit
    #[arg(long)]
    list_models: bool,
}

fn print_models(registry: &ModelRegistry) {
    for model in all_models() {
        let status = if registry.get(model.id).is_some() {
            "available"
        } else {
            "missing key"
        };
        println!(
            "{:<18} {:<11} {:<12} {}",
            model.id,
            model.provider.display_name(),
            status,
            model.description
        );
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "duologue=info".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_target(false)))
        .init();
}

/// Token cancelled by the first Ctrl-C
///
/// The driver checks it between steps, so a reply already on its way is
/// still recorded and exported.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current step");
            token.cancel();
        }
    });
    cancel
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; keys may come from the environment
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let registry = ModelRegistry::new(&LlmConfig::from_env());
    if cli.list_models {
        print_models(&registry);
        return Ok(());
    }

    let config = RunConfig {
        topic: cli.topic.clone().unwrap_or_default(),
        max_turns: cli.max_turns,
        summary_interval: cli.summary_interval,
        history_window: cli.history_window,
    };
    config.validate()?;

    if !registry.has_models() {
        anyhow::bail!(
            "no LLM providers configured; set OPENAI_API_KEY, PERPLEXITY_API_KEY, ANTHROPIC_API_KEY or LLM_GATEWAY"
        );
    }
    tracing::info!(models = ?registry.available_models(), "LLM registry initialized");

    let service_a = registry
        .require(&cli.participant_a_model)
        .map_err(anyhow::Error::msg)?;
    let service_b = registry
        .require(&cli.participant_b_model)
        .map_err(anyhow::Error::msg)?;
    let service_s = registry
        .require(&cli.summarizer_model)
        .map_err(anyhow::Error::msg)?;

    let metadata = config.metadata(
        &cli.participant_a_model,
        &cli.participant_b_model,
        &cli.summarizer_model,
    );
    let mut driver = ProductionDriver::new(
        ConversationState::new(metadata),
        LlmParticipant::new(Role::ParticipantA, service_a),
        LlmParticipant::new(Role::ParticipantB, service_b),
        LlmSummarizer::new(service_s),
    )
    .with_history_window(config.history_window)
    .with_cancellation(cancel_on_ctrl_c());

    println!("Topic: {}", config.topic.trim());
    println!(
        "Max turns: {}, summary every {} turns\n",
        config.max_turns, config.summary_interval
    );

    let outcome: anyhow::Result<()> = loop {
        let step = driver.step().await;
        let labels = driver.conversation().metadata();
        match step {
            Ok(StepOutcome::Spoke(turn)) => {
                println!("--- Turn {}: {} ---\n{}\n", turn.sequence, labels.label(turn.role), turn.content);
            }
            Ok(StepOutcome::Summarized(summary)) => {
                println!(
                    "--- {} summary (turns {}) ---\n{}\n",
                    summary.scope,
                    summary.range,
                    summary.fields.as_note()
                );
            }
            Ok(StepOutcome::Finished) => break Ok(()),
            Ok(StepOutcome::Cancelled) => break Err(anyhow::anyhow!("interrupted")),
            Err(e) => break Err(e.into()),
        }
    };

    if !cli.no_export {
        let mut transcript = driver.conversation().transcript();
        if let Err(e) = &outcome {
            transcript = transcript.halted(e);
        }
        let path = write_markdown(&cli.output_dir, &transcript)
            .with_context(|| format!("writing transcript to {}", cli.output_dir.display()))?;
        println!("Conversation saved to {}", path.display());
    }

    outcome
}
