use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use segalloc::allocator::constants::{PAGE_SIZE, SIZE_CLASS_COUNT};
use segalloc::allocator::core::{block_size, blocks_per_page, first_block_offset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "segalloc workspace automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the allocator comparison suite and write a report
    Bench {
        /// Lower sample size and measurement time
        #[arg(long, default_value_t = false)]
        quick: bool,

        /// Skip running, only rebuild the report from target/criterion
        #[arg(long, default_value_t = false)]
        report_only: bool,
    },
    /// Print the size-class layout of a page
    Classes {
        /// Emit JSON instead of a markdown table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

const ALLOCATORS: &[&str] = &[
    "alloc-system",
    "alloc-segalloc",
    "alloc-mimalloc",
    "alloc-snmalloc",
    "alloc-jemalloc",
];

const REPORT_PATH: &str = "benchmark_results/report.md";

#[derive(Serialize)]
struct ClassLayout {
    index: usize,
    block_size: usize,
    first_block: usize,
    blocks: usize,
    wasted: usize,
}

#[derive(Deserialize)]
struct Estimates {
    mean: Estimate,
}

#[derive(Deserialize)]
struct Estimate {
    point_estimate: f64,
}

#[derive(Deserialize)]
struct BenchmarkInfo {
    throughput: Option<Throughput>,
}

#[derive(Deserialize)]
enum Throughput {
    Elements(u64),
    Bytes(u64),
    BytesDecimal(u64),
}

/// workload -> allocator -> operations per second
type Results = BTreeMap<String, BTreeMap<String, f64>>;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench { quick, report_only } => {
            if !report_only {
                run_benchmarks(quick)?;
            }
            generate_report()?;
        }
        Commands::Classes { json } => print_classes(json)?,
    }

    Ok(())
}

fn class_layouts() -> Vec<ClassLayout> {
    (0..SIZE_CLASS_COUNT)
        .map(|index| {
            let size = block_size(index);
            let first_block = first_block_offset(size);
            let blocks = blocks_per_page(size);
            ClassLayout {
                index,
                block_size: size,
                first_block,
                blocks,
                wasted: PAGE_SIZE - blocks * size,
            }
        })
        .collect()
}

fn print_classes(json: bool) -> Result<()> {
    let layouts = class_layouts();
    if json {
        println!("{}", serde_json::to_string_pretty(&layouts)?);
        return Ok(());
    }
    println!("| Class | Block | First block | Blocks/page | Unused bytes |");
    println!("|---|---|---|---|---|");
    for l in &layouts {
        println!(
            "| {} | {} | {} | {} | {} |",
            l.index, l.block_size, l.first_block, l.blocks, l.wasted
        );
    }
    Ok(())
}

fn run_benchmarks(quick: bool) -> Result<()> {
    println!("Compiling benchmarks...");
    let status = Command::new("cargo")
        .args(["build", "--bench", "suite", "--release"])
        .status()?;
    if !status.success() {
        bail!("failed to compile benchmarks");
    }

    for alloc in ALLOCATORS {
        println!("\n>>> Benchmarking with feature: {alloc}");
        let start = Instant::now();

        let mut cmd = Command::new("cargo");
        cmd.env("CARGO_INCREMENTAL", "0")
            .args(["bench", "--bench", "suite", "--no-default-features"])
            .args(["--features", alloc])
            .arg("--")
            .args(["--save-baseline", baseline_name(alloc)]);

        if quick {
            cmd.args(["--measurement-time", "0.1", "--sample-size", "10", "--noplot"]);
        }

        let status = cmd
            .status()
            .with_context(|| format!("failed to run bench for {alloc}"))?;

        if status.success() {
            println!("Finished {alloc} in {:.2?}", start.elapsed());
        } else {
            eprintln!("Warning: benchmark failed for {alloc}");
        }
    }

    Ok(())
}

fn baseline_name(feature: &str) -> &str {
    feature.trim_start_matches("alloc-")
}

fn generate_report() -> Result<()> {
    let criterion_dir = Path::new("target/criterion");
    if !criterion_dir.exists() {
        eprintln!("No criterion output found at {}", criterion_dir.display());
        return Ok(());
    }

    let mut results = Results::new();
    collect_results(criterion_dir, &mut results)?;

    let report_path = PathBuf::from(REPORT_PATH);
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(&report_path)
        .with_context(|| format!("creating {}", report_path.display()))?;
    write_report(&mut file, &results)?;

    println!("Report written to {}", report_path.display());
    Ok(())
}

fn write_report(out: &mut impl Write, results: &Results) -> Result<()> {
    writeln!(out, "# Allocator Comparison")?;
    writeln!(out)?;

    write!(out, "| Workload |")?;
    for alloc in ALLOCATORS {
        write!(out, " {} (ops/s) | vs system |", baseline_name(alloc))?;
    }
    writeln!(out)?;
    write!(out, "|---|")?;
    for _ in ALLOCATORS {
        write!(out, "---|---|")?;
    }
    writeln!(out)?;

    for (workload, by_alloc) in results {
        write!(out, "| {workload} |")?;
        let system = by_alloc.get("system").copied().unwrap_or(0.0);
        for alloc in ALLOCATORS {
            match by_alloc.get(baseline_name(alloc)) {
                Some(&ops) => {
                    let rel = if system > 0.0 { ops / system } else { 0.0 };
                    write!(out, " {} | **{rel:.2}x** |", format_ops(ops))?;
                }
                None => write!(out, " N/A | - |")?,
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn format_ops(ops: f64) -> String {
    if ops > 1_000_000.0 {
        format!("{:.2}M", ops / 1_000_000.0)
    } else if ops > 1_000.0 {
        format!("{:.2}K", ops / 1_000.0)
    } else {
        format!("{ops:.0}")
    }
}

/// Walks `<workload>/<baseline>/estimates.json` files under `dir`.
fn collect_results(dir: &Path, results: &mut Results) -> Result<()> {
    for entry in fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_results(&path, results)?;
            continue;
        }
        if path.file_name().and_then(|s| s.to_str()) != Some("estimates.json") {
            continue;
        }
        let Some(baseline_dir) = path.parent() else { continue };
        let Some(workload_dir) = baseline_dir.parent() else { continue };
        let (Some(baseline), Some(workload)) = (dir_name(baseline_dir), dir_name(workload_dir))
        else {
            continue;
        };
        if baseline == "report" || workload == "report" {
            continue;
        }

        let estimates: Estimates = read_json(&path)?;
        let time_ns = estimates.mean.point_estimate;
        if time_ns <= 0.0 {
            continue;
        }
        let elements = read_json::<BenchmarkInfo>(&baseline_dir.join("benchmark.json"))
            .ok()
            .and_then(|info| info.throughput)
            .map_or(1.0, |t| match t {
                Throughput::Elements(n) | Throughput::Bytes(n) | Throughput::BytesDecimal(n) => {
                    n as f64
                }
            });

        results
            .entry(workload)
            .or_default()
            .insert(baseline, elements * 1e9 / time_ns);
    }
    Ok(())
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name()?.to_str().map(str::to_owned)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}
