use std::env;
use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use taxbot_backend::core::config::{AppPaths, ConfigService};
use taxbot_backend::core::logging;
use taxbot_backend::history::SessionHistory;
use taxbot_backend::session::SessionLoop;
use taxbot_backend::state::AppState;

const EXIT_COMMANDS: [&str; 3] = ["exit", "quit", "종료"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to read .env: {}", e);
        }
    }

    let paths = Arc::new(AppPaths::new());
    logging::init(&paths);

    let config_service = ConfigService::new(paths.clone());
    tracing::info!("Loading configuration from {}", config_service.config_path().display());
    let config = config_service
        .load()
        .context("Failed to load configuration")?;
    if let Ok(raw) = config_service.load_raw() {
        tracing::debug!(
            "Effective configuration: {}",
            config_service.redact_sensitive_values(&raw)
        );
    }

    let state = AppState::initialize(config)
        .await
        .context("Failed to initialize application state")?;

    match state.llm.health_check().await {
        Ok(true) => tracing::info!("LLM provider '{}' is reachable", state.llm.provider_name()),
        Ok(false) => tracing::warn!(
            "LLM provider '{}' did not report healthy",
            state.llm.provider_name()
        ),
        Err(e) => tracing::warn!("LLM health check failed: {}", e),
    }

    let mut session = SessionLoop::new(state).context("Failed to build answering pipeline")?;
    let mut history = SessionHistory::new();

    let args: Vec<String> = env::args().skip(1).collect();
    if !args.is_empty() {
        let question = args.join(" ");
        let outcome = session
            .ask(&mut history, &question)
            .await
            .context("Failed to answer question")?;
        println!("{}", outcome.answer);
        return Ok(());
    }

    run_repl(&mut session, &mut history).await
}

/// Read questions line by line until EOF or an exit command.
///
/// A failed turn is reported and the loop keeps going; history only holds
/// turns that were answered.
async fn run_repl(session: &mut SessionLoop, history: &mut SessionHistory) -> anyhow::Result<()> {
    println!("소득세 질문을 입력하세요. 종료하려면 'exit'을 입력하세요.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("질문> ");
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if EXIT_COMMANDS.contains(&question) {
            break;
        }

        match session.ask(history, question).await {
            Ok(outcome) => {
                println!("\n{}\n", outcome.answer);
            }
            Err(e) => {
                eprintln!("오류: {}", e);
            }
        }
    }

    tracing::info!(
        "Session {} ended after {} turn(s)",
        history.session_id(),
        history.len()
    );
    Ok(())
}
