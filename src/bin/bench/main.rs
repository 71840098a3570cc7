// Rift Benchmark Runner v0.3.0 - Monte Carlo invariant validation
// Seeded player traffic against the full engine, per-tick invariant checks
//
// Usage:
//   cargo run --release --bin bench                     # Run all scenarios (30 runs each)
//   cargo run --release --bin bench -- --runs 5         # Quick mode (5 runs each)
//   cargo run --release --bin bench -- RIFT_FAST        # Filter by name
//   cargo run --release --bin bench -- --seed 42        # Custom base seed
//   RUST_LOG=rift_engine=info cargo run --bin bench     # Engine logs

mod intents;
mod monte_carlo;
mod report;
mod scenarios;

use report::*;
use scenarios::*;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    runs: usize,
    seed: u64,
    filter: Option<String>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs { runs: 30, seed: 0, filter: None };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--runs" => {
                i += 1;
                if i < args.len() {
                    cli.runs = args[i].parse().unwrap_or(30);
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    cli.seed = args[i].parse().unwrap_or(0);
                }
            }
            arg if !arg.starts_with('-') => {
                cli.filter = Some(arg.to_string());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    cli
}

fn pass_label(ok: bool) -> &'static str {
    if ok { "PASS" } else { "FAIL" }
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = parse_args();
    let all_scenarios = scenarios();

    let to_run: Vec<&Scenario> = match &cli.filter {
        Some(f) => {
            let f_lower = f.to_lowercase();
            all_scenarios
                .iter()
                .filter(|s| {
                    s.name.to_lowercase().contains(&f_lower)
                        || s.label.to_lowercase().contains(&f_lower)
                        || s.category.to_lowercase().contains(&f_lower)
                })
                .collect()
        }
        None => all_scenarios.iter().collect(),
    };

    if to_run.is_empty() {
        eprintln!("No scenarios match filter: {:?}", cli.filter);
        std::process::exit(1);
    }

    println!("\n  Rift Benchmark Runner v0.3.0");
    println!("  PRNG: ChaCha8Rng | Runs/scenario: {} | Base seed: {}", cli.runs, cli.seed);
    println!("  Running {} scenario(s)...\n", to_run.len());
    println!(
        "  {:<32} {:>5} {:>11} {:>9} {:>8} {:>9} {:>10} {:>7}",
        "Scenario", "Pass%", "Settled", "Rejected", "AI acts", "PeakEnt", "AuditErr", "Time"
    );
    println!("  {}", "-".repeat(98));

    let suite_start = Instant::now();
    let mut mc_reports = Vec::new();

    for scenario in &to_run {
        let report = monte_carlo::run_monte_carlo(scenario, cli.runs, cli.seed);
        let pass_pct = report.pass_rate * 100.0;

        println!(
            "  {:<32} {:>4}% {:>6.1}±{:<3.1} {:>9.1} {:>8.1} {:>9.3} {:>10.2e} {:>5.0}ms  {}",
            report.label,
            pass_pct as u32,
            report.settlements.mean,
            report.settlements.half_width(),
            report.rejected.mean,
            report.ai_actions.mean,
            report.peak_entropy.max,
            report.max_audit_error.max,
            report.elapsed_ms.mean,
            pass_label(report.pass_rate >= 1.0),
        );

        mc_reports.push(report);
    }

    let suite_elapsed = suite_start.elapsed();

    // ─── Invariant Validation ───────────────────────────────────────────

    let runs = || mc_reports.iter().flat_map(|r| r.individual_runs.iter());
    let invariants = InvariantValidation {
        credits_conserved: runs().all(|r| r.audit_balanced),
        prices_bounded: runs().all(|r| r.price_breaches == 0),
        entropy_bounded: runs().all(|r| r.entropy_breaches == 0),
        capacity_respected: runs().all(|r| r.capacity_breaches == 0),
        max_audit_error: runs().map(|r| r.max_audit_error).fold(0.0_f64, f64::max),
    };

    // ─── Summary ────────────────────────────────────────────────────────

    let total = mc_reports.len();
    let passed = mc_reports.iter().filter(|r| r.pass_rate >= 1.0).count();
    let failed = total - passed;

    println!("  {}", "-".repeat(98));
    println!(
        "  Total: {}  Passed: {}  Failed: {}  Suite time: {:.1}s\n",
        total,
        passed,
        failed,
        suite_elapsed.as_secs_f64()
    );

    println!("  Invariants:");
    println!("    Credit conservation:  {}", pass_label(invariants.credits_conserved));
    println!("    Price bounds:         {}", pass_label(invariants.prices_bounded));
    println!("    Entropy bounds:       {}", pass_label(invariants.entropy_bounded));
    println!("    Cargo capacity:       {}", pass_label(invariants.capacity_respected));
    println!("    Max audit error:      {:.2e}\n", invariants.max_audit_error);

    let all_pass = failed == 0 && invariants.all_pass();

    // ─── Write JSON Report ──────────────────────────────────────────────

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let timestamp = format!("{}", ts);

    let report = BenchReport {
        timestamp: timestamp.clone(),
        version: "0.3.0",
        prng: "ChaCha8Rng",
        n_runs_per_scenario: cli.runs,
        summary: Summary {
            total,
            passed,
            failed,
            pass_rate: passed as f64 / total as f64,
        },
        invariants,
        scenarios: mc_reports,
    };

    let dir = std::path::Path::new("benchmark-results");
    if !dir.exists() {
        std::fs::create_dir_all(dir).expect("Failed to create benchmark-results/");
    }
    let path = dir.join(format!("bench-{}.json", timestamp));
    let json = serde_json::to_string_pretty(&report).expect("Failed to serialize");
    std::fs::write(&path, &json).expect("Failed to write benchmark file");
    println!("  Results saved to: {}\n", path.display());

    if !all_pass {
        std::process::exit(1);
    }
}
