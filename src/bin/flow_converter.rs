use clap::{Parser, ValueEnum};
use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Flows at or above this size are classified as bulk when importing
/// Opera-sim traces (per the Opera paper's split).
const BULK_THRESHOLD_BYTES: u64 = 15_000_000;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Opera-sim space-delimited trace -> rotor flow CSV
    Opera2rotor,
    /// Rotor flow CSV -> Opera-sim space-delimited trace
    Rotor2opera,
}

#[derive(Debug, Parser)]
#[command(
    name = "flow_converter",
    about = "Convert between Opera-sim and rotor flow trace formats"
)]
struct Args {
    #[arg(value_enum)]
    mode: Mode,
    input: PathBuf,
    output: PathBuf,

    /// Hosts per rack used for global-host-id <-> (rack, host) mapping
    #[arg(long, default_value_t = 32)]
    hosts_per_rack: usize,
}

fn opera_to_rotor(args: &Args) -> Result<usize, Box<dyn Error>> {
    let reader = BufReader::new(File::open(&args.input)?);
    let mut out = File::create(&args.output)?;
    writeln!(
        out,
        "flow_id,src_rack,dst_rack,src_host,dst_host,size_bytes,start_time_ms,flow_type"
    )?;

    let mut flow_id: u64 = 0;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut it = trimmed.split_whitespace();
        let (Some(src), Some(dst), Some(size), Some(start_ns)) =
            (it.next(), it.next(), it.next(), it.next())
        else {
            return Err(format!("line {}: expected 4 fields", idx + 1).into());
        };
        let src: usize = src.parse()?;
        let dst: usize = dst.parse()?;
        let size_bytes: u64 = size.parse()?;
        let start_time_ns: u64 = start_ns.parse()?;

        let flow_type = if size_bytes >= BULK_THRESHOLD_BYTES {
            "bulk"
        } else {
            "low_latency"
        };
        writeln!(
            out,
            "{},{},{},{},{},{},{},{}",
            flow_id,
            src / args.hosts_per_rack,
            dst / args.hosts_per_rack,
            src % args.hosts_per_rack,
            dst % args.hosts_per_rack,
            size_bytes,
            start_time_ns as f64 / 1e6,
            flow_type,
        )?;
        flow_id += 1;
    }
    Ok(flow_id as usize)
}

fn rotor_to_opera(args: &Args) -> Result<usize, Box<dyn Error>> {
    let reader = BufReader::new(File::open(&args.input)?);
    let mut out = File::create(&args.output)?;

    let mut count = 0;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if idx == 0 || line.trim().is_empty() {
            continue; // header
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 8 {
            return Err(format!("line {}: expected 8 fields", idx + 1).into());
        }
        let src_rack: usize = fields[1].trim().parse()?;
        let dst_rack: usize = fields[2].trim().parse()?;
        let src_host: usize = fields[3].trim().parse()?;
        let dst_host: usize = fields[4].trim().parse()?;
        let size_bytes: u64 = fields[5].trim().parse()?;
        let start_time_ms: f64 = fields[6].trim().parse()?;

        writeln!(
            out,
            "{} {} {} {}",
            src_rack * args.hosts_per_rack + src_host,
            dst_rack * args.hosts_per_rack + dst_host,
            size_bytes,
            (start_time_ms * 1e6) as u64,
        )?;
        count += 1;
    }
    Ok(count)
}

fn main() -> ExitCode {
    let args = Args::parse();
    let result = match args.mode {
        Mode::Opera2rotor => opera_to_rotor(&args),
        Mode::Rotor2opera => rotor_to_opera(&args),
    };
    match result {
        Ok(count) => {
            println!("Converted {count} flows");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
