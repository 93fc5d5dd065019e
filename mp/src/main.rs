//! MedPrompt - health assistant in the terminal
//!
//! CLI entry point for the interactive chat and one-shot commands.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use medprompt::assistant::{AssistantCore, QUICK_QUESTIONS};
use medprompt::cli::{Cli, Command, VitalsArgs, get_log_path};
use medprompt::config::Config;
use medprompt::plan::{DAY_FORMAT, PlanCalendar, parse_plan};
use medprompt::repl;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(base_url) = cli.base_url {
        debug!(%base_url, "main: base URL overridden on command line");
        config.backend.base_url = base_url;
    }

    info!("MedPrompt loaded config: backend={}", config.backend.base_url);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Chat) | None => {
            debug!("main: launching chat REPL");
            repl::run_interactive(&config).await
        }
        Some(Command::Ask { prompt, quick, list }) => {
            debug!(?prompt, ?quick, list, "main: matched Ask command");
            cmd_ask(&config, prompt, quick, list).await
        }
        Some(Command::Docs { prompt, show_context }) => {
            debug!(show_context, "main: matched Docs command");
            cmd_docs(&config, &prompt, show_context).await
        }
        Some(Command::Plan { vitals, file, start }) => {
            debug!(?file, ?start, "main: matched Plan command");
            cmd_plan(&config, &vitals, file.as_deref(), start).await
        }
        Some(Command::Tips { vitals, risk_score }) => {
            debug!(risk_score, "main: matched Tips command");
            cmd_tips(&config, &vitals, risk_score).await
        }
        Some(Command::Tip) => {
            debug!("main: matched Tip command");
            cmd_tip(&config).await
        }
    }
}

fn create_core(config: &Config) -> Result<AssistantCore> {
    AssistantCore::from_config(config).map_err(|e| eyre::eyre!("Failed to create backend: {}", e))
}

/// Ask a single question
async fn cmd_ask(config: &Config, prompt: Option<String>, quick: Option<usize>, list: bool) -> Result<()> {
    debug!(?quick, list, "cmd_ask: called");
    if list {
        println!("{}", "Quick questions:".bright_cyan());
        for (i, question) in QUICK_QUESTIONS.iter().enumerate() {
            println!("  {:>2}. {}", i + 1, question);
        }
        return Ok(());
    }

    let mut core = create_core(config)?;
    let answer = match (prompt, quick) {
        (_, Some(n)) => {
            if n == 0 || n > QUICK_QUESTIONS.len() {
                return Err(eyre::eyre!(
                    "No quick question {} (choose 1-{})",
                    n,
                    QUICK_QUESTIONS.len()
                ));
            }
            println!("{} {}", ">".bright_green(), QUICK_QUESTIONS[n - 1]);
            core.ask_quick(n - 1).await
        }
        (prompt, None) => core.ask(prompt.as_deref().unwrap_or_default()).await,
    };

    let answer = answer.map_err(|e| eyre::eyre!("{}", e))?;
    println!();
    println!("{}", answer);
    Ok(())
}

/// Ask the uploaded documents a question
async fn cmd_docs(config: &Config, prompt: &str, show_context: bool) -> Result<()> {
    debug!(show_context, "cmd_docs: called");
    let mut core = create_core(config)?;
    let answer = core.ask_documents(prompt).await.map_err(|e| eyre::eyre!("{}", e))?;

    println!();
    println!("{}", answer.answer);
    if show_context && !answer.context.is_empty() {
        println!();
        println!("{}", "Context used:".bright_cyan());
        println!("{}", answer.context.dimmed());
    }
    Ok(())
}

/// Generate a plan, or lay out a saved plan file
async fn cmd_plan(config: &Config, vitals: &VitalsArgs, file: Option<&Path>, start: Option<NaiveDate>) -> Result<()> {
    let start = start.unwrap_or_else(|| Local::now().date_naive());
    debug!(?file, %start, "cmd_plan: called");

    let calendar = match file {
        Some(path) => {
            let raw = fs::read_to_string(path).context(format!("Failed to read plan file {}", path.display()))?;
            parse_plan(&raw, start)
        }
        None => {
            let vitals = vitals
                .to_vitals()
                .map_err(|missing| eyre::eyre!("Missing {} (or pass --file)", missing.join(", ")))?;
            let mut core = create_core(config)?;
            core.generate_plan(vitals, start).await.map_err(|e| eyre::eyre!("{}", e))?
        }
    };

    print_calendar(&calendar);
    Ok(())
}

/// Personalised tips for a set of vitals
async fn cmd_tips(config: &Config, vitals: &VitalsArgs, risk_score: f64) -> Result<()> {
    debug!(risk_score, "cmd_tips: called");
    let vitals = vitals
        .to_vitals()
        .map_err(|missing| eyre::eyre!("Missing {}", missing.join(", ")))?;

    let mut core = create_core(config)?;
    let tips = core
        .health_tips(vitals, risk_score)
        .await
        .map_err(|e| eyre::eyre!("{}", e))?;

    println!("{}", "Health tips:".bright_cyan());
    println!("{}", tips);
    Ok(())
}

/// Tip of the day
async fn cmd_tip(config: &Config) -> Result<()> {
    debug!("cmd_tip: called");
    let core = create_core(config)?;
    let tip = core.daily_tip().await;

    println!("{}", tip.tip);
    println!("{}", format!("({})", tip.source).dimmed());
    Ok(())
}

fn print_calendar(calendar: &PlanCalendar) {
    for (i, (date, text)) in calendar.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", format!("{} Plan:", date.format(DAY_FORMAT)).bright_cyan().bold());
        println!("{}", text);
    }
}
