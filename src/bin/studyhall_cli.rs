//! Offline tool for the frame sampler.
//!
//! Examples:
//!   studyhall-cli classify 58 42
//!   studyhall-cli synth --fps 40 --seconds 20 --jitter 0.15 --seed 7 > trace.json
//!   studyhall-cli replay trace.json --config monitor.json --quality high
//!
//! `STUDYHALL_SHOW_DEBUG`, `STUDYHALL_ADAPTIVE_QUALITY` and `STUDYHALL_HISTORY_LEN`
//! override the loaded config.

use std::path::PathBuf;
use std::process;

use studyhall::config::MonitorConfig;
use studyhall::observer::sparkline;
use studyhall::quality::QualityLevel;
use studyhall::tier::{PerformanceTier, MIB};
use studyhall::trace::{replay, synthesize, FrameTrace};
use tracing::{error, info};

fn usage() -> ! {
    eprintln!("studyhall-cli (frame sampler tooling)");
    eprintln!("Usage: studyhall-cli <command> [args]\n");
    eprintln!("Commands:");
    eprintln!("  classify <avg_fps> <memory_mib>          Print the tier and recommendations");
    eprintln!("  synth --fps N --seconds S [--jitter J] [--seed N]");
    eprintln!("                                           Print a synthetic frame trace (JSON)");
    eprintln!("  replay <trace.json> [--config cfg.json] [--quality low|medium|high|ultra] [--json]");
    eprintln!("                                           Run a trace through the sampler");
    process::exit(1);
}

fn fail(msg: impl std::fmt::Display) -> ! {
    error!("{msg}");
    eprintln!("error: {msg}");
    process::exit(2);
}

/// Pull `--name value` out of `args`.
fn take_opt(args: &mut Vec<String>, name: &str) -> Option<String> {
    let i = args.iter().position(|a| a == name)?;
    if i + 1 >= args.len() {
        fail(format!("{name} needs a value"));
    }
    let value = args.remove(i + 1);
    args.remove(i);
    Some(value)
}

fn take_flag(args: &mut Vec<String>, name: &str) -> bool {
    match args.iter().position(|a| a == name) {
        Some(i) => {
            args.remove(i);
            true
        }
        None => false,
    }
}

fn parse_num<T: std::str::FromStr>(what: &str, v: &str) -> T {
    v.trim()
        .parse::<T>()
        .unwrap_or_else(|_| fail(format!("invalid {what}: {v:?}")))
}

fn cmd_classify(args: &[String]) {
    if args.len() != 2 {
        usage();
    }
    let fps: f64 = parse_num("fps", &args[0]);
    let mem_mib: f64 = parse_num("memory", &args[1]);
    let bytes = (mem_mib.max(0.0) * MIB as f64) as u64;
    let tier = PerformanceTier::classify(fps, bytes);
    println!("{} {}", tier.icon(), tier.label());
    for r in tier.recommendations() {
        println!("  • {r}");
    }
}

fn cmd_synth(mut args: Vec<String>) {
    let fps: f64 = take_opt(&mut args, "--fps")
        .map(|v| parse_num("fps", &v))
        .unwrap_or(60.0);
    let seconds: f64 = take_opt(&mut args, "--seconds")
        .map(|v| parse_num("seconds", &v))
        .unwrap_or(10.0);
    let jitter: f64 = take_opt(&mut args, "--jitter")
        .map(|v| parse_num("jitter", &v))
        .unwrap_or(0.1);
    let seed: u64 = take_opt(&mut args, "--seed")
        .map(|v| parse_num("seed", &v))
        .unwrap_or(2026);
    if !args.is_empty() {
        usage();
    }

    let trace = synthesize(fps, seconds, jitter, seed).unwrap_or_else(|e| fail(e));
    info!(frames = trace.frames.len(), "synthesized trace");
    match trace.to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(e) => fail(e),
    }
}

fn load_config(path: Option<String>) -> MonitorConfig {
    let base = match path {
        Some(p) => match std::fs::read_to_string(&p) {
            Ok(raw) => MonitorConfig::from_json_str(&raw).unwrap_or_else(|e| fail(e)),
            Err(e) => fail(format!("cannot read {p}: {e}")),
        },
        None => MonitorConfig::default(),
    };
    base.apply_env().unwrap_or_else(|e| fail(e))
}

fn cmd_replay(mut args: Vec<String>) {
    let config = load_config(take_opt(&mut args, "--config"));
    let quality = match take_opt(&mut args, "--quality") {
        Some(v) => QualityLevel::parse(&v).unwrap_or_else(|| fail(format!("unknown quality {v:?}"))),
        None => QualityLevel::default(),
    };
    let as_json = take_flag(&mut args, "--json");
    if args.len() != 1 {
        usage();
    }

    let path = PathBuf::from(&args[0]);
    let trace = FrameTrace::load(&path).unwrap_or_else(|e| fail(e));
    info!(
        trace = %path.display(),
        frames = trace.frames.len(),
        duration_ms = trace.duration_ms(),
        "replaying"
    );

    let report = replay(&trace, &config, quality).unwrap_or_else(|e| fail(e));

    if as_json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => fail(e),
        }
        return;
    }

    println!("{:>9} {:>5} {:>7} {:>9}  tier", "t(ms)", "fps", "avg", "mem(MB)");
    for s in &report.samples {
        println!(
            "{:>9.0} {:>5} {:>7.1} {:>9.1}  {} {}",
            s.render_time_ms,
            s.frame_rate,
            s.average_frame_rate,
            s.memory_used_mib(),
            s.tier.icon(),
            s.tier.label()
        );
    }
    let fps: Vec<u32> = report.samples.iter().map(|s| s.frame_rate).collect();
    println!();
    println!("frames:   {}", report.frames);
    println!("history:  {}", sparkline(&fps));
    for c in &report.quality_changes {
        println!("quality:  {} -> {}", c.action.label(), c.level.label());
    }
    println!("final:    {}", report.final_quality.label());
}

fn main() {
    tracing_subscriber::fmt::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || args[0] == "--help" || args[0] == "-h" || args[0] == "help" {
        usage();
    }
    let cmd = args.remove(0);
    match cmd.as_str() {
        "classify" => cmd_classify(&args),
        "synth" => cmd_synth(args),
        "replay" => cmd_replay(args),
        other => {
            eprintln!("Unknown command: {other}");
            usage();
        }
    }
}
