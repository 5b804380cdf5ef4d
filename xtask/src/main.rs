use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the score update function workspace",
    long_about = "A unified CLI for CI checks and Lambda packaging in the\n\
                  score update function workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci,
    /// Build and package the Rust Lambda artifact
    ServerlessPackage {
        /// Compilation target triple for the Lambda binary
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for the binary
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Directory the zip artifact is written to
        #[arg(long, default_value = "dist")]
        dist_dir: String,
    },
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

const LAMBDA_PACKAGE: &str = "score_update_lambda";
const LAMBDA_BIN: &str = "update_score_lambda";
const ARTIFACT_NAME: &str = "update_score.zip";

type TaskResult = Result<(), String>;

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> TaskResult {
    eprintln!("+ cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .status()
        .map_err(|error| format!("failed to spawn cargo: {error}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("cargo {} exited with {status}", args[0]))
    }
}

// ── packaging ──────────────────────────────────────────────────────

fn package_lambda(target: &str, profile: BuildProfile, dist_dir: &str) -> TaskResult {
    step("Build score update lambda binary");
    let mut args = vec!["build", "-p", LAMBDA_PACKAGE, "--bin", LAMBDA_BIN, "--target", target];
    args.extend(profile.as_cargo_flag());
    cargo(&args)?;

    step("Package lambda zip artifact");
    let binary = Path::new("target")
        .join(target)
        .join(profile.dir_name())
        .join(LAMBDA_BIN);
    let artifact = PathBuf::from(dist_dir).join(ARTIFACT_NAME);
    write_bootstrap_zip(&binary, &artifact)?;

    eprintln!("\nPackaged artifact:\n- {}", artifact.display());
    Ok(())
}

/// The provided.al2 runtimes execute the archive entry named `bootstrap`.
fn write_bootstrap_zip(binary: &Path, artifact: &Path) -> TaskResult {
    let bytes = fs::read(binary)
        .map_err(|error| format!("cannot read lambda binary '{}': {error}", binary.display()))?;
    if let Some(parent) = artifact.parent() {
        fs::create_dir_all(parent)
            .map_err(|error| format!("cannot create '{}': {error}", parent.display()))?;
    }

    let file = fs::File::create(artifact)
        .map_err(|error| format!("cannot create '{}': {error}", artifact.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .and_then(|_| zip.write_all(&bytes).map_err(Into::into))
        .and_then(|_| zip.finish().map(|_| ()))
        .map_err(|error| format!("cannot write '{}': {error}", artifact.display()))
}

// ── CI ─────────────────────────────────────────────────────────────

fn ci_check() -> TaskResult {
    step("Check formatting");
    cargo(&["fmt", "--all", "--", "--check"])?;

    step("Clippy");
    cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?;

    step("Test workspace");
    cargo(&["test", "--workspace"])
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ci => ci_check().map(|()| eprintln!("\nCI job passed.")),
        Commands::ServerlessPackage {
            target,
            profile,
            dist_dir,
        } => package_lambda(&target, profile, &dist_dir),
    };

    if let Err(message) = result {
        eprintln!("error: {message}");
        exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn bootstrap_zip_holds_the_binary_as_executable_entry() {
        let dir = tempfile::tempdir().expect("temp dir");
        let binary = dir.path().join(LAMBDA_BIN);
        fs::write(&binary, b"\x7fELF-fake").expect("write fake binary");
        let artifact = dir.path().join("dist").join(ARTIFACT_NAME);

        write_bootstrap_zip(&binary, &artifact).expect("zip should be written");

        let file = fs::File::open(&artifact).expect("open artifact");
        let mut archive = zip::ZipArchive::new(file).expect("read archive");
        assert_eq!(archive.len(), 1);
        let mut entry = archive.by_name("bootstrap").expect("bootstrap entry");
        assert_eq!(entry.unix_mode().map(|mode| mode & 0o777), Some(0o755));
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).expect("read entry");
        assert_eq!(contents, b"\x7fELF-fake");
    }

    #[test]
    fn missing_binary_is_reported_not_panicked() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = write_bootstrap_zip(
            &dir.path().join("absent"),
            &dir.path().join(ARTIFACT_NAME),
        )
        .expect_err("missing binary should fail");
        assert!(error.starts_with("cannot read lambda binary"));
    }
}
