use clap::{Parser, ValueEnum};
use fmriflow::config::SdcSettings;
use fmriflow::plan::{Datum, ExecutionPlan};
use fmriflow::sdc::{self, sdc_unwarp};
use fmriflow::workflow::{self, Workflow};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Dot,
    Summary,
}

/// Declares the susceptibility-distortion-correction workflow and prints it
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Workflow name
    #[arg(long, default_value = sdc::DEFAULT_NAME)]
    name: String,

    /// JSON file with workflow settings
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Use the fast registration parameters
    #[arg(long)]
    debug: bool,

    /// Threads for registration (overrides the settings file)
    #[arg(long)]
    ants_nthreads: Option<u32>,

    /// Output format for the graph
    #[arg(short, long, value_enum, default_value_t = Format::Summary)]
    format: Format,

    /// Print the job plan for this many split volumes instead of the graph
    #[arg(long)]
    volumes: Option<usize>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings = match &cli.settings {
        Some(path) => SdcSettings::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load settings: {}", e))),
        None => SdcSettings::default(),
    };
    settings.debug |= cli.debug;
    if let Some(threads) = cli.ants_nthreads {
        settings.ants_nthreads = threads;
    }

    let workflow = sdc_unwarp(&cli.name, &settings)
        .unwrap_or_else(|e| exit_with_error(&format!("Workflow construction failed: {}", e)));

    match cli.volumes {
        Some(volumes) => print_plan(&workflow, volumes, cli.format),
        None => print_graph(&workflow, cli.format),
    }
}

fn print_graph(workflow: &Workflow, format: Format) {
    match format {
        Format::Json => {
            let json = workflow
                .to_json()
                .unwrap_or_else(|e| exit_with_error(&format!("Serialization failed: {}", e)));
            println!("{}", json);
        }
        Format::Dot => print!("{}", workflow::to_dot(workflow)),
        Format::Summary => print!("{}", workflow::describe(workflow)),
    }
}

/// Binds placeholder file names for `volumes` split volumes and expands the graph.
fn print_plan(workflow: &Workflow, volumes: usize, format: Format) {
    let split = Datum::list((0..volumes).map(|i| format!("vol{:04}.nii.gz", i)));
    let xforms = Datum::list((0..volumes).map(|i| format!("hmc{:04}.tfm", i)));
    let bindings = [
        ("in_split", split),
        ("in_reference", Datum::item("reference.nii.gz")),
        ("in_mask", Datum::item("mask.nii.gz")),
        ("xforms", xforms),
        ("name_source", Datum::item("bold.nii.gz")),
        ("fmap_ref", Datum::item("fmap_ref.nii.gz")),
        ("fmap_mask", Datum::item("fmap_mask.nii.gz")),
        ("fmap", Datum::item("fmap.nii.gz")),
    ];
    let plan = ExecutionPlan::new(workflow, &bindings)
        .unwrap_or_else(|e| exit_with_error(&format!("Planning failed: {}", e)));

    if let Format::Json = format {
        let json = serde_json::to_string_pretty(&plan)
            .unwrap_or_else(|e| exit_with_error(&format!("Serialization failed: {}", e)));
        println!("{}", json);
        return;
    }

    println!("Plan for '{}': {} jobs", plan.workflow(), plan.jobs().len());
    for job in plan.jobs() {
        match job.index {
            Some(i) => println!("  {}[{}] ({})", job.node, i, job.tool),
            None => println!("  {} ({})", job.node, job.tool),
        }
    }
    println!("\nOutputs:");
    for (field, datum) in plan.outputs() {
        println!("  {:<14} {}", field, datum);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
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
