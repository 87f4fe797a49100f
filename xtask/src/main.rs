use anyhow::{Context, Result};
use clap::Parser;
use see_common::LIBRARY_FILE_NAME;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Parser)]
struct Args {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Parser)]
enum Cmd {
    /// Compile the LibSee preload shim into a shared object
    BuildShim {
        /// C source of the shim
        #[arg(long, default_value = "libsee.c")]
        source: PathBuf,
        /// Output path (defaults to target/libsee.so)
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, env = "CC", default_value = "cc")]
        cc: String,
        #[arg(long)]
        release: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Cmd::BuildShim { source, output, cc, release } => {
            let output = output.unwrap_or_else(|| Path::new("target").join(LIBRARY_FILE_NAME));
            build_shim(&cc, &source, &output, release)?;
        }
    }

    Ok(())
}

fn build_shim(cc: &str, source: &Path, output: &Path, release: bool) -> Result<()> {
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    // The shim resolves the real libc symbols through dlsym(RTLD_NEXT, ...)
    let mut cmd = Command::new(cc);
    cmd.args(["-shared", "-fPIC"])
        .args(if release { ["-O3", "-DNDEBUG"] } else { ["-O0", "-g"] })
        .arg("-o")
        .arg(output)
        .arg(source)
        .args(["-ldl", "-lpthread"]);

    let status = cmd.status().with_context(|| format!("Failed to run {cc}"))?;

    if !status.success() {
        anyhow::bail!("Failed to build preload shim from {}", source.display());
    }

    println!("✓ preload shim built successfully");
    println!("  Output: {}", output.display());
    println!("  Profile: {}", if release { "release" } else { "debug" });

    Ok(())
}
