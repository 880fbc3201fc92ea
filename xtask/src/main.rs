use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const BINARIES: [&str; 2] = ["ride-match", "ride-pricing"];
const MODEL_FILES: [&str; 2] = ["match_model.json", "pricing_model.json"];
const MODELS_DIR: &str = "models";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the ride decision engine workspace",
    long_about = "A unified CLI for CI checks, smoke runs, benchmarks,\n\
                  and release packaging of the ride-match / ride-pricing binaries."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the decision binaries once each against the demo models
    Smoke {
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Debug)]
        profile: BuildProfile,
    },
    /// Run Criterion benchmarks
    Bench,
    /// Compare benchmarks: stash changes, create baseline, restore, compare
    BenchCompare,
    /// Run CI checks (fmt, clippy, tests, smoke run, benchmarks)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build the binaries and zip them with the demo models
    Package {
        /// Compilation target triple
        #[arg(long, env = "XTASK_TARGET")]
        target: Option<String>,
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Output directory for the archive
        #[arg(long, default_value = "dist")]
        out_dir: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Build and run both binaries against the demo models
    Smoke,
    /// Run benchmarks
    Bench,
    /// Run check + smoke + bench
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn git(args: &[&str]) -> ExitStatus {
    eprintln!("+ git {}", args.join(" "));
    Command::new("git")
        .args(args)
        .status()
        .expect("failed to execute git")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn run_git(args: &[&str]) {
    let status = git(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn binary_name(bin_name: &str, target: Option<&str>) -> String {
    let windows = match target {
        Some(target) => target.contains("windows"),
        None => cfg!(windows),
    };
    if windows {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    }
}

fn build_binaries(target: Option<&str>, profile: BuildProfile) -> PathBuf {
    let mut cargo_args = vec!["build", "-p", "decision_cli", "--bins"];
    if let Some(target) = target {
        cargo_args.extend(["--target", target]);
    }
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    let mut dir = PathBuf::from("target");
    if let Some(target) = target {
        dir.push(target);
    }
    dir.join(profile.dir_name())
}

// ── smoke run ──────────────────────────────────────────────────────

fn smoke(profile: BuildProfile) {
    step("Build decision binaries");
    let bin_dir = build_binaries(None, profile);

    // The binaries read models from their working directory.
    let workdir = Path::new("target/smoke");
    fs::create_dir_all(workdir).expect("failed to create smoke directory");
    for model in MODEL_FILES {
        fs::copy(Path::new(MODELS_DIR).join(model), workdir.join(model))
            .unwrap_or_else(|error| panic!("failed to stage {model}: {error}"));
    }

    let runs = [
        ("ride-match", r#"{"seats": 3, "time_epoch": 1700000000}"#),
        (
            "ride-pricing",
            r#"{"distance_km": 12.5, "duration_min": 18, "seats": 2}"#,
        ),
    ];
    for (bin, request) in runs {
        step(&format!("Run {bin}"));
        let binary = fs::canonicalize(bin_dir.join(binary_name(bin, None)))
            .unwrap_or_else(|error| panic!("missing {bin} binary: {error}"));
        let output = Command::new(&binary)
            .arg(request)
            .current_dir(workdir)
            .output()
            .unwrap_or_else(|error| panic!("failed to run {bin}: {error}"));
        if !output.status.success() {
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
            exit(output.status.code().unwrap_or(1));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.lines().count() != 1 {
            panic!("{bin} must print exactly one line, got {stdout:?}");
        }
        eprint!("{stdout}");
    }
}

// ── packaging ──────────────────────────────────────────────────────

fn package(target: Option<&str>, profile: BuildProfile, out_dir: &Path) {
    step("Build release binaries");
    let bin_dir = build_binaries(target, profile);

    step("Package binaries and models");
    fs::create_dir_all(out_dir).expect("failed to create output directory");
    let suffix = target.unwrap_or("host");
    let zip_path = out_dir.join(format!("ride-decision-{suffix}.zip"));

    let file = fs::File::create(&zip_path).expect("failed to create archive");
    let mut zip = ZipWriter::new(file);
    let executable = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    let data = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for bin in BINARIES {
        let name = binary_name(bin, target);
        let path = bin_dir.join(&name);
        if !path.exists() {
            panic!("expected binary at '{}'", path.display());
        }
        let bytes = fs::read(&path).expect("failed to read binary");
        zip.start_file(name.as_str(), executable)
            .expect("failed to start binary entry");
        zip.write_all(&bytes).expect("failed to write binary entry");
    }
    for model in MODEL_FILES {
        let bytes = fs::read(Path::new(MODELS_DIR).join(model))
            .unwrap_or_else(|error| panic!("failed to read {model}: {error}"));
        zip.start_file(model, data)
            .expect("failed to start model entry");
        zip.write_all(&bytes).expect("failed to write model entry");
    }
    zip.finish().expect("failed to finish archive");

    eprintln!("\nPackaged artifact:\n- {}", zip_path.display());
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test decision_core");
    run_cargo(&["test", "-p", "decision_core"]);

    step("Test decision_cli");
    run_cargo(&["test", "-p", "decision_cli"]);
}

fn ci_bench() {
    step("Run benchmarks");
    run_cargo(&["bench", "--package", "decision_core", "--bench", "pipeline"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Smoke { profile } => smoke(profile),
        Commands::Bench => ci_bench(),
        Commands::BenchCompare => {
            let baseline_dir = Path::new("target/criterion");
            if baseline_dir.exists() {
                step("Removing existing benchmark data");
                fs::remove_dir_all(baseline_dir).expect("failed to remove target/criterion");
            }

            step("Stashing current changes");
            run_git(&[
                "stash",
                "push",
                "-m",
                "Temporary stash for benchmark comparison",
            ]);

            step("Running benchmark to create baseline");
            run_cargo(&[
                "bench",
                "--package",
                "decision_core",
                "--bench",
                "pipeline",
                "--",
                "--save-baseline",
                "main",
            ]);

            step("Reapplying changes");
            run_git(&["stash", "pop"]);

            step("Running benchmark comparing against baseline");
            run_cargo(&[
                "bench",
                "--package",
                "decision_core",
                "--bench",
                "pipeline",
                "--",
                "--baseline",
                "main",
            ]);

            eprintln!("\nDone! Check the output above to see performance comparison.");
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Smoke => smoke(BuildProfile::Debug),
                CiJob::Bench => ci_bench(),
                CiJob::All => {
                    ci_check();
                    smoke(BuildProfile::Debug);
                    ci_bench();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::Package {
            target,
            profile,
            out_dir,
        } => package(target.as_deref(), profile, &out_dir),
    }
}
