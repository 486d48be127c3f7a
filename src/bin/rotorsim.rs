use clap::Parser;
use rotorsim_rs::workload::{load_flows_from_file, save_flows_to_file};
use rotorsim_rs::{SimConfig, Simulator, WorkloadGenerator};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "rotorsim",
    about = "Packet-level simulator for a RotorNet-style reconfigurable optical fabric"
)]
struct Args {
    /// Path to key/value config file; defaults are used when omitted
    #[arg(short = 'f', long = "config")]
    config: Option<PathBuf>,

    /// Results CSV output path
    #[arg(short = 'o', long = "output", default_value = "results.csv")]
    output: PathBuf,
}

fn print_config(config: &SimConfig) {
    println!("RotorNet Packet Simulator");
    println!("=========================");
    println!("Configuration:");
    println!("  Racks: {}", config.num_racks);
    println!("  Switches: {}", config.num_switches);
    println!("  Hosts per rack: {}", config.hosts_per_rack);
    println!("  Link rate: {} Gb/s", config.link_rate_gbps);
    println!("  Load factor: {}", config.load_factor);
    println!("  Simulation time: {} ms", config.sim_time_ms);
    println!("  Workload: {}", config.workload);
    println!(
        "  Slot time: {} us, cycle time: {} us ({} matchings/switch)",
        config.slot_time_us(),
        config.cycle_time_us(),
        config.num_matchings()
    );
    println!();
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => SimConfig::load_from_file(path)?,
        None => SimConfig::default(),
    };
    config.validate()?;
    print_config(&config);

    let flows = if config.flow_file.is_empty() {
        let mut generator = WorkloadGenerator::new(&config);
        let flows = generator.generate_flows();
        if config.save_flows {
            save_flows_to_file(&flows, &config.flow_output_file)?;
        }
        flows
    } else {
        load_flows_from_file(&config.flow_file, &config)?
    };
    println!("Generated {} flows", flows.len());

    let mut sim = Simulator::new(config)?;
    sim.add_flows(flows);

    println!("Running simulation...");
    sim.run();

    let stats = sim.statistics();
    stats.print();
    stats.save_to_file(&args.output)?;
    println!("Results saved to {}", args.output.display());

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("Error: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
