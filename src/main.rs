//! Score Predictor CLI
//!
//! Serves the prediction form over HTTP, or runs predictions from the command line.

use std::fs::File;
use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use score_predictor::batch;
use score_predictor::features;
use score_predictor::{
    logging, server, AppError, Config, ParticipationLevel, PredictionForm, Result,
};

#[derive(Parser)]
#[command(name = "score-predictor")]
#[command(about = "Predict a student's final score from study metrics", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "score-predictor.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the prediction form (default)
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Predict a single student's final score
    Predict {
        #[arg(long, default_value = "10.0")]
        study_hours: f64,
        #[arg(long, default_value = "75")]
        attendance_rate: f64,
        /// Previous exam score, as typed
        #[arg(long, default_value = "80", allow_hyphen_values = true)]
        previous_score: String,
        /// Low, Medium or High
        #[arg(long, default_value = "Medium")]
        participation: ParticipationLevel,
        #[arg(long, default_value = "7.0")]
        sleep_hours: f64,
    },
    /// Predict every row of a CSV file and write the results to stdout
    Batch {
        /// CSV with study_hours,attendance_rate,previous_score,participation_level,sleep_hours
        input: PathBuf,
    },
}

#[actix_web::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load_or_default(&cli.config)?;

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            server::start_api(&config).await?;
        }
        Commands::Predict {
            study_hours,
            attendance_rate,
            previous_score,
            participation,
            sleep_hours,
        } => {
            if let Some(name) =
                features::non_finite_slider(study_hours, attendance_rate, sleep_hours)
            {
                return Err(AppError::Input(format!("{} must be a finite number", name)));
            }

            let mut form = PredictionForm::default();
            form.study_hours = study_hours;
            form.attendance_rate = attendance_rate;
            form.previous_score = previous_score;
            form.select_participation(participation.index());
            form.sleep_hours = sleep_hours;

            let prediction = form.submit(&config.model_loader());
            println!("Predicted Final Score: {}", prediction);
        }
        Commands::Batch { input } => {
            let file = File::open(&input)?;
            let stdout = io::stdout();
            batch::run_batch(file, stdout.lock(), &config.model_loader())?;
        }
    }

    Ok(())
}
