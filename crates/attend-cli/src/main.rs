use anyhow::{Context, Result};
use attend_core::classifier::FERPLUS_MODEL_FILE;
use attend_core::detector::{DEFAULT_CONFIDENCE_THRESHOLD, ULTRAFACE_MODEL_FILE};
use attend_core::{analyze_frame, FerPlusClassifier, UltraFaceLocator};
use attend_log::{EventLog, DEFAULT_LOG_DIR, LOG_FILE_NAME};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "attend", about = "Attend engagement logging CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print statistics over the most recent events
    Stats {
        /// Path to the emotion log
        #[arg(long, default_value_os_t = default_log_path())]
        log: PathBuf,
    },
    /// Print the last N events
    Tail {
        /// Path to the emotion log
        #[arg(long, default_value_os_t = default_log_path())]
        log: PathBuf,
        /// Number of events to print
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
    /// Analyse a single image file without logging it
    Analyze {
        /// Image file (any format the image crate decodes)
        image: PathBuf,
        /// Directory containing the ONNX models
        #[arg(long, default_value_os_t = attend_core::default_model_dir())]
        model_dir: PathBuf,
        /// Minimum face score
        #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
        threshold: f32,
    },
}

fn default_log_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_DIR).join(LOG_FILE_NAME)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { log } => {
            let log = EventLog::new(log);
            if !log.exists() {
                eprintln!("no log at {}; reporting empty statistics", log.path().display());
            }
            let stats = log.stats().context("reading emotion log")?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Tail { log, count } => {
            let log = EventLog::new(log);
            let events = log.read_window(count).context("reading emotion log")?;
            for event in events {
                println!(
                    "{}  {:<16} {:<8} {:<10} conf={:.2} eng={:.2}",
                    event.timestamp,
                    event.user_id,
                    event.role,
                    event.emotion,
                    event.confidence,
                    event.engagement
                );
            }
        }
        Commands::Analyze {
            image,
            model_dir,
            threshold,
        } => {
            let frame = image::open(&image)
                .with_context(|| format!("opening {}", image.display()))?;

            let locator_path = model_dir.join(ULTRAFACE_MODEL_FILE);
            let classifier_path = model_dir.join(FERPLUS_MODEL_FILE);
            let mut locator = UltraFaceLocator::load(&locator_path.to_string_lossy(), threshold)?;
            let mut classifier = FerPlusClassifier::load(&classifier_path.to_string_lossy())?;

            let analysis = analyze_frame(&mut locator, &mut classifier, &frame)?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
    }

    Ok(())
}
