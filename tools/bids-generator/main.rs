use clap::Parser;
use fmriflow::bids::{SubjectSession, create_bids};
use fmriflow::config::ReorganizeConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Copies one participant session into a BIDS-style directory tree
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// <project_dir> <participant_id> <visit> <session>; anything other than
    /// exactly four values does nothing
    #[arg(num_args = 0..)]
    positional: Vec<String>,

    /// JSON file with destination settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Destination root (overrides the config file)
    #[arg(long)]
    dest_root: Option<PathBuf>,

    /// Subject label without the `sub-` prefix (overrides the config file)
    #[arg(long)]
    subject: Option<String>,

    /// Copy functional data even without a resting-state sidecar
    #[arg(long)]
    no_rest_gate: bool,

    /// Log every copied file
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let [project_dir, participant_id, visit, session] = match <[String; 4]>::try_from(cli.positional)
    {
        Ok(args) => args,
        Err(_) => return,
    };

    let mut config = match &cli.config {
        Some(path) => ReorganizeConfig::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load config: {}", e))),
        None => ReorganizeConfig::default(),
    };
    if let Some(dest_root) = cli.dest_root {
        config.dest_root = dest_root;
    }
    if let Some(subject) = cli.subject {
        config.subject_label = subject;
    }
    if cli.no_rest_gate {
        config.require_rest_sidecar = false;
    }

    let subject = SubjectSession::new(project_dir, participant_id, visit, session);
    let report = create_bids(&subject, &config)
        .unwrap_or_else(|e| exit_with_error(&format!("Reorganization failed: {}", e)));

    println!("Anatomical: {}", report.anat.display());
    for run in &report.runs {
        match &run.image {
            Some(image) => println!(
                "  -> {} (TR {} s): {}",
                run.task,
                run.repetition_time,
                image.display()
            ),
            None => println!("  -> {} (TR {} s): sidecar only", run.task, run.repetition_time),
        }
    }
    for dir in &report.skipped_dirs {
        println!("  -> skipped {}", dir.display());
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
