use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use lc_cost::{JobOverrides, MachineProfile, NestingResult, RateBook, compute_cost_summary};

#[derive(Parser)]
#[command(name = "lc-cost", version, about = "Cost laser-cut sheet-metal nesting results")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the nesting result JSON file (shorthand for `cost <file>`)
    nesting_file: Option<PathBuf>,

    /// Path to the rate book TOML file
    #[arg(short, long, global = true)]
    rates: Option<PathBuf>,

    /// Path to the machine profile TOML file
    #[arg(short, long, global = true)]
    machine: Option<PathBuf>,

    /// Path to the job overrides TOML file
    #[arg(short = 'j', long, global = true)]
    job: Option<PathBuf>,

    /// Write the full CostSummary as JSON to this path
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Cost a nesting result
    Cost {
        /// Path to the nesting result JSON file
        nesting_file: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let nesting_file = match &cli.command {
        Some(Commands::Cost { nesting_file }) => nesting_file.clone(),
        None => match &cli.nesting_file {
            Some(f) => f.clone(),
            None => {
                eprintln!("Usage: lc-cost <NESTING_FILE> or lc-cost cost <NESTING_FILE>");
                eprintln!("Run 'lc-cost --help' for more information.");
                std::process::exit(1);
            }
        },
    };

    run_cost(&nesting_file, &cli)
}

fn run_cost(nesting_file: &PathBuf, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let nesting_json = fs::read_to_string(nesting_file)?;
    let nesting_result: NestingResult = serde_json::from_str(&nesting_json)?;

    println!("Source: {:?} {}", nesting_result.source_type, nesting_result.source_id);
    println!("Machine profile: {}", nesting_result.machine_profile_id);
    println!("Sheets: {}", nesting_result.sheets.len());

    let rate_book = load_rate_book(cli.rates.as_deref())?;
    let machine_profile = load_machine_profile(cli.machine.as_deref())?;
    let job_overrides = load_job_overrides(cli.job.as_deref(), &nesting_result)?;

    let (summary, warnings) =
        compute_cost_summary(&nesting_result, &job_overrides, &rate_book, &machine_profile)?;

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &warnings {
            println!("  WARNING: {}", warning);
        }
    }

    println!("\nVariant A (price list): {:.2} PLN", summary.variant_a.total_pln);
    for (sheet_id, breakdown) in &summary.variant_a.sheets {
        println!(
            "  {}: material {:.2}, cut {:.2}, pierce {:.2}, foil {:.2}, operational {:.2} -> {:.2}",
            sheet_id,
            breakdown.material,
            breakdown.cut,
            breakdown.pierce,
            breakdown.foil,
            breakdown.operational,
            breakdown.total,
        );
    }

    println!("\nVariant B (time-based, buffer {:.2}x): {:.2} PLN", job_overrides.buffer_factor, summary.variant_b.total_pln);
    for (sheet_id, breakdown) in &summary.variant_b.sheets {
        println!(
            "  {}: material {:.2}, laser {:.2} ({:.1}s billed), operational {:.2} -> {:.2}",
            sheet_id, breakdown.material, breakdown.laser, breakdown.billed_time_s, breakdown.operational, breakdown.total,
        );
    }

    println!("\nPer-part attribution:");
    let mut part_ids: Vec<&String> = summary.per_part.keys().collect();
    part_ids.sort();
    for part_id in part_ids {
        let attribution = &summary.per_part[part_id];
        println!(
            "  {}: variant A {:.2}, variant B {:.2}",
            part_id, attribution.total_a, attribution.total_b
        );
    }

    if let Some(output_path) = &cli.output {
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(output_path, &json)?;
        println!("\nCost summary written to: {}", output_path.display());
    }

    Ok(())
}

fn load_rate_book(path: Option<&std::path::Path>) -> Result<RateBook, Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            let toml_str = fs::read_to_string(p)?;
            Ok(toml::from_str(&toml_str)?)
        }
        None => {
            eprintln!("No rate book supplied (--rates); aborting.");
            std::process::exit(1);
        }
    }
}

fn load_machine_profile(
    path: Option<&std::path::Path>,
) -> Result<MachineProfile, Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            let toml_str = fs::read_to_string(p)?;
            Ok(toml::from_str(&toml_str)?)
        }
        None => {
            eprintln!("No machine profile supplied (--machine); aborting.");
            std::process::exit(1);
        }
    }
}

fn load_job_overrides(
    path: Option<&std::path::Path>,
    nesting_result: &NestingResult,
) -> Result<JobOverrides, Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            let toml_str = fs::read_to_string(p)?;
            Ok(toml::from_str(&toml_str)?)
        }
        None => Ok(JobOverrides {
            source_type: nesting_result.source_type,
            source_id: nesting_result.source_id.clone(),
            ..Default::default()
        }),
    }
}
