//! CLI command definitions and subcommands

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::backend::Vitals;

/// MedPrompt - health assistant in the terminal
#[derive(Parser)]
#[command(name = "mp", about = "Chat with the MedPrompt health assistant", version)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Backend base URL, overriding the config file
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive chat (default)
    Chat,

    /// Ask a single question
    Ask {
        /// Question to ask
        prompt: Option<String>,

        /// Ask a predefined question by number (see --list)
        #[arg(short, long, conflicts_with = "prompt")]
        quick: Option<usize>,

        /// List the predefined questions
        #[arg(long)]
        list: bool,
    },

    /// Ask a question about your uploaded medical documents
    Docs {
        /// Question to ask
        prompt: String,

        /// Also print the document excerpts the answer used
        #[arg(long = "show-context")]
        show_context: bool,
    },

    /// Generate a day-by-day health plan
    Plan {
        #[command(flatten)]
        vitals: VitalsArgs,

        /// Lay out an existing plan text file instead of calling the backend
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// First day of the plan (YYYY-MM-DD, default today)
        #[arg(short, long)]
        start: Option<NaiveDate>,
    },

    /// Personalised lifestyle tips
    Tips {
        #[command(flatten)]
        vitals: VitalsArgs,

        /// Risk score from a prior assessment
        #[arg(long = "risk-score", default_value = "0.0")]
        risk_score: f64,
    },

    /// Tip of the day
    Tip,
}

/// Vital signs given on the command line
#[derive(Debug, Clone, Args)]
pub struct VitalsArgs {
    /// Age in years
    #[arg(long)]
    pub age: Option<u32>,

    /// Body mass index
    #[arg(long)]
    pub bmi: Option<f64>,

    /// Fasting glucose (mg/dL)
    #[arg(long)]
    pub glucose: Option<f64>,

    /// Systolic blood pressure (mmHg)
    #[arg(long = "blood-pressure")]
    pub blood_pressure: Option<f64>,
}

impl VitalsArgs {
    /// All four vitals, or the names of the missing ones
    pub fn to_vitals(&self) -> Result<Vitals, Vec<&'static str>> {
        debug!(?self, "to_vitals: called");
        match (self.age, self.bmi, self.glucose, self.blood_pressure) {
            (Some(age), Some(bmi), Some(glucose), Some(blood_pressure)) => Ok(Vitals {
                age,
                bmi,
                glucose,
                blood_pressure,
            }),
            _ => {
                let missing = [
                    ("--age", self.age.is_none()),
                    ("--bmi", self.bmi.is_none()),
                    ("--glucose", self.glucose.is_none()),
                    ("--blood-pressure", self.blood_pressure.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                Err(missing)
            }
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("medprompt")
        .join("logs")
        .join("medprompt.log");
    debug!(?path, "get_log_path: returning path");
    path
}
