use std::{fs, path::PathBuf};

use anyhow::Context;
use bollard::Docker;
use chrono::Utc;
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sysinfo::{CpuExt, System, SystemExt};

use asm_bench::{
    execute_all,
    provision::DockerProvisioner,
    runs::{FailurePolicy, RunStatus, SweepOptions, TimeExecutor},
    Suite,
};

#[derive(Parser, Serialize, Deserialize)]
#[command(author, version, about)]
struct Args {
    /// Path to the suite file (tools, samples, thread counts)
    #[arg(short, long, default_value = "suite.json")]
    suite: PathBuf,

    /// Path to a directory to dump the sweep summary in
    #[arg(short, long, default_value = "results")]
    output: PathBuf,

    /// What to do when a single combination fails
    #[arg(short, long, value_enum, default_value_t = FailurePolicy::Continue)]
    policy: FailurePolicy,

    /// Skip combinations whose renamed artifact already exists
    #[arg(long)]
    resume: bool,

    /// If true, collects system information (e.g. CPU, memory, etc...) in the output
    #[arg(long)]
    collect_sysinfo: bool,
}

#[derive(Serialize)]
struct HostInfo {
    cpu_brand: String,
    logical_cores: usize,
    total_memory_bytes: u64,
    os: Option<String>,
}

fn host_info() -> HostInfo {
    let mut system = System::new_all();
    system.refresh_all();
    HostInfo {
        cpu_brand: system.global_cpu_info().brand().to_string(),
        logical_cores: system.cpus().len(),
        total_memory_bytes: system.total_memory(),
        os: system.long_os_version(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    human_panic::setup_panic!();
    env_logger::init();

    let args = Args::parse();

    let start_time = Utc::now();

    let suite = Suite::load(&args.suite)?;
    let registry = suite.registry();
    let manifest = suite.manifest().context("invalid sample manifest")?;

    log::info!("attempting to connect to Docker daemon...");
    let docker =
        Docker::connect_with_local_defaults().context("could not connect to Docker daemon")?;
    let docker_version = docker
        .version()
        .await
        .context("could not get Docker version")?;
    log::info!(
        "connected to Docker daemon with version {} (api: {}, os/arch: {}/{})",
        docker_version
            .version
            .as_ref()
            .unwrap_or(&"unknown".to_string()),
        docker_version
            .api_version
            .as_ref()
            .unwrap_or(&"unknown".to_string()),
        docker_version.os.as_ref().unwrap_or(&"unknown".to_string()),
        docker_version
            .arch
            .as_ref()
            .unwrap_or(&"unknown".to_string()),
    );

    let runs = execute_all(
        &registry,
        &manifest,
        &suite.thread_counts,
        &DockerProvisioner::new(&docker),
        &TimeExecutor,
        &SweepOptions {
            base: suite.base_dir.clone(),
            policy: args.policy,
            resume: args.resume,
        },
    )
    .await
    .map_err(|err| {
        log::error!("{err}");
        err
    })?;

    let output = serde_json::to_string_pretty(&json!({
        "started_at": start_time.to_rfc3339(),
        "suite": args.suite,
        "host": args.collect_sysinfo.then(host_info),
        "runs": runs,
    }))?;

    let output_file_path = args.output.join(format!(
        "sweep.{}.json",
        start_time.format("%Y-%m-%dT%H-%M-%S%z")
    ));
    log::info!(
        "writing sweep summary to {}...",
        output_file_path.to_string_lossy()
    );
    fs::create_dir_all(&args.output).context("could not create output directory structure")?;
    fs::write(&output_file_path, output).context(format!(
        "could not write to output file {}",
        output_file_path.to_string_lossy()
    ))?;

    let failed = runs
        .iter()
        .filter(|run| matches!(run.status, RunStatus::Failed { .. }))
        .count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} combination(s) failed", runs.len());
    }

    Ok(())
}
