//! Orchestration for the benchmark sweep.
//!
//! This is the core of the harness. [`execute_all`] provisions every registered image once, then
//! walks sample × thread-count × assembler strictly sequentially, issuing exactly one external
//! process at a time; running combinations concurrently would contend for the same CPU cores and
//! corrupt the measurements the sweep exists to collect. [`execute_single`] handles one
//! combination: truncate the transcript, execute the profiled containerized invocation, append
//! the captured output, and rename the tool's default output to a sweep-qualified artifact name.
//!
//! Every transcript and artifact path encodes (sample, tool, thread count), so no two
//! combinations can ever collide or misattribute results; thread-count attribution is enforced
//! entirely by this naming scheme since there is no concurrency to race.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! use bollard::Docker;
//! use asm_bench::provision::DockerProvisioner;
//! use asm_bench::runs::{execute_all, FailurePolicy, SweepOptions, TimeExecutor};
//! use asm_bench::suite::Suite;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let suite = Suite::load(&PathBuf::from("suite.json"))?;
//! let docker = Docker::connect_with_local_defaults()?;
//!
//! let runs = execute_all(
//!     &suite.registry(),
//!     &suite.manifest()?,
//!     &suite.thread_counts,
//!     &DockerProvisioner::new(&docker),
//!     &TimeExecutor,
//!     &SweepOptions {
//!         base: suite.base_dir.clone(),
//!         policy: FailurePolicy::Continue,
//!         resume: false,
//!     },
//! )
//! .await?;
//! #     Ok(())
//! # }
//! ```

use std::{
    fmt::{self, Display, Formatter},
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    provision::Provisioner,
    samples::{Manifest, Sample},
    tools::{AssemblerCommand, ProfiledCommand, Registry, ToolDescriptor},
};

/// Unique identifier for one run: `<sample>_<tool>_<threads>`.
///
/// # Examples
///
/// ```
/// use asm_bench::runs::Identifier;
/// use asm_bench::tools::Identifier as ToolIdentifier;
///
/// let identifier = Identifier::new("reads.fq", &ToolIdentifier::from("flye"), 4);
///
/// assert_eq!(identifier.to_string(), "reads.fq_flye_4");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier(String);

impl Identifier {
    /// Constructs the identifier for a (sample, tool, thread count) combination.
    #[must_use]
    pub fn new(sample: &str, tool: &crate::tools::Identifier, threads: u32) -> Self {
        Self(format!("{sample}_{tool}_{threads}"))
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal state of one combination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// Transcript captured and artifact renamed.
    Completed,
    /// Skipped because the renamed artifact already existed (resume mode).
    Skipped,
    /// The combination failed; the error text is retained for the summary.
    Failed {
        /// Why the combination failed.
        error: String,
    },
}

/// Record of one combination of the sweep.
///
/// Serialized into the sweep summary so failures are surfaced with full context rather than
/// silently dropped.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Run {
    /// Unique identifier for this run.
    pub identifier: Identifier,
    /// Identifier of the tool that was run.
    pub tool: crate::tools::Identifier,
    /// Derived sample name the tool was run against.
    pub sample: String,
    /// Worker-thread count under test.
    pub threads: u32,
    /// Combined stdout/stderr transcript, including the profiler summary.
    pub transcript: PathBuf,
    /// Renamed assembly artifact.
    pub artifact: PathBuf,
    /// Terminal state.
    pub status: RunStatus,
}

/// What to do when a single combination fails.
///
/// Configuration-shape and provisioning errors always abort the run; this policy only governs
/// per-combination execution failures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the sweep on the first failed combination.
    Halt,
    /// Record the failure and proceed to the next combination, so the remaining combinations
    /// still produce data. The process still exits non-zero at the end.
    #[default]
    Continue,
}

impl Display for FailurePolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Halt => "halt",
            Self::Continue => "continue",
        })
    }
}

/// Options shared by every combination of a sweep.
#[derive(Clone, Debug)]
pub struct SweepOptions {
    /// Absolute base directory; all inputs and outputs resolve under it and it is the container
    /// bind mount.
    pub base: PathBuf,
    /// Per-combination failure policy.
    pub policy: FailurePolicy,
    /// Skip combinations whose renamed artifact already exists.
    pub resume: bool,
}

/// Error raised by a single combination.
#[derive(Debug, Error)]
pub enum RunError {
    /// The output directory could not be created.
    #[error("could not prepare output directory `{path}`: {source}")]
    OutputDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The transcript file could not be written.
    #[error("could not write transcript `{path}`: {source}")]
    Transcript {
        /// Transcript path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The external invocation could not be started.
    #[error("could not launch `{command}`: {source}")]
    Launch {
        /// The invocation that failed to start.
        command: String,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The tool's default output file was absent after the run.
    ///
    /// This strongly suggests the tool itself failed; the transcript is retained as diagnostic
    /// evidence.
    #[error("expected output `{expected}` missing after run (transcript kept at `{transcript}`)")]
    ArtifactNotFound {
        /// Default output path that should have existed.
        expected: PathBuf,
        /// Transcript of the failed run.
        transcript: PathBuf,
    },
    /// The default output existed but could not be renamed.
    #[error("could not rename `{from}` to `{to}`: {source}")]
    Rename {
        /// Default output path.
        from: PathBuf,
        /// Sweep-qualified artifact path.
        to: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

/// Output captured from one profiled invocation.
#[derive(Clone, Debug, Default)]
pub struct CapturedOutput {
    /// Exit code of the wrapper process, if it exited normally.
    pub status_code: Option<i32>,
    /// Captured standard output.
    pub stdout: Vec<u8>,
    /// Captured standard error (where the profiler writes its summary).
    pub stderr: Vec<u8>,
}

/// Synchronous execution of a [`ProfiledCommand`].
///
/// The sweep blocks on each invocation until it terminates; fakes implement this trait in tests.
pub trait Executor {
    /// Launches the command and waits for it, capturing both output streams.
    ///
    /// A non-zero tool exit status is not an error here; whether the run produced usable data is
    /// decided by the artifact check afterwards.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the process cannot be started.
    fn execute(&self, command: &ProfiledCommand) -> io::Result<CapturedOutput>;
}

/// [`Executor`] that spawns the profiled invocation as a child process.
pub struct TimeExecutor;

impl Executor for TimeExecutor {
    fn execute(&self, command: &ProfiledCommand) -> io::Result<CapturedOutput> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .output()?;
        Ok(CapturedOutput {
            status_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Transcript path for a combination: `<out_dir>/<sample>_<tool>_<threads>_thread.txt`.
#[must_use]
pub fn transcript_path(
    out_dir: &Path,
    sample: &str,
    tool: &crate::tools::Identifier,
    threads: u32,
) -> PathBuf {
    out_dir.join(format!("{sample}_{tool}_{threads}_thread.txt"))
}

/// Artifact path for a combination: `<out_dir>/<sample>_<tool>_<threads>_thread.fasta`.
#[must_use]
pub fn artifact_path(
    out_dir: &Path,
    sample: &str,
    tool: &crate::tools::Identifier,
    threads: u32,
) -> PathBuf {
    out_dir.join(format!("{sample}_{tool}_{threads}_thread.fasta"))
}

/// Executes one (sample, tool, thread count) combination.
///
/// The transcript file is truncated before the run, so a rerun can never mix content from a
/// previous thread count, and the captured output is appended to it afterwards. On success the
/// tool's default output file is renamed to the sweep-qualified artifact path; rerunning a
/// completed combination is therefore safe, and with `resume` set it is skipped outright.
///
/// # Errors
///
/// Returns [`RunError`] if the process cannot be launched, the transcript cannot be written, or
/// the expected default output is absent after the run. No partially named artifact is ever left
/// behind: the rename happens only once the default output is known to exist.
pub fn execute_single<E: Executor>(
    descriptor: &ToolDescriptor,
    command: AssemblerCommand,
    sample: &Sample,
    threads: u32,
    executor: &E,
    opts: &SweepOptions,
) -> Result<Run, RunError> {
    let sample_name = sample.name();
    let run_identifier = Identifier::new(&sample_name, &descriptor.identifier, threads);
    let out_dir = sample.output_path(&opts.base);
    let transcript = transcript_path(&out_dir, &sample_name, &descriptor.identifier, threads);
    let artifact = artifact_path(&out_dir, &sample_name, &descriptor.identifier, threads);

    let run = |status| Run {
        identifier: run_identifier.clone(),
        tool: descriptor.identifier.clone(),
        sample: sample_name.clone(),
        threads,
        transcript: transcript.clone(),
        artifact: artifact.clone(),
        status,
    };

    if opts.resume && artifact.exists() {
        log::info!("[{run_identifier}] artifact already present, skipping");
        return Ok(run(RunStatus::Skipped));
    }

    std::fs::create_dir_all(&out_dir).map_err(|source| RunError::OutputDir {
        path: out_dir.clone(),
        source,
    })?;

    // Truncate before running: stale content from a prior run must never survive, even if this
    // run fails before producing output.
    File::create(&transcript).map_err(|source| RunError::Transcript {
        path: transcript.clone(),
        source,
    })?;

    let profiled = ProfiledCommand::build(
        descriptor,
        command,
        &opts.base,
        &sample.input_path(&opts.base),
        &out_dir,
        threads,
    );
    log::info!(
        "[{run_identifier}] running {} on {} with {threads} thread(s)...",
        descriptor.identifier,
        sample.relative_path.display()
    );
    log::debug!("[{run_identifier}] invocation: {profiled}");

    let captured = executor
        .execute(&profiled)
        .map_err(|source| RunError::Launch {
            command: profiled.to_string(),
            source,
        })?;
    if let Some(code) = captured.status_code {
        if code != 0 {
            log::warn!("[{run_identifier}] invocation exited with status {code}");
        }
    }

    let mut file = OpenOptions::new()
        .append(true)
        .open(&transcript)
        .map_err(|source| RunError::Transcript {
            path: transcript.clone(),
            source,
        })?;
    file.write_all(&captured.stdout)
        .and_then(|()| file.write_all(&captured.stderr))
        .map_err(|source| RunError::Transcript {
            path: transcript.clone(),
            source,
        })?;

    let default_output = out_dir.join(command.default_artifact());
    if !default_output.exists() {
        return Err(RunError::ArtifactNotFound {
            expected: default_output,
            transcript: transcript.clone(),
        });
    }
    std::fs::rename(&default_output, &artifact).map_err(|source| RunError::Rename {
        from: default_output,
        to: artifact.clone(),
        source,
    })?;

    log::info!("[{run_identifier}] completed, artifact at {}", artifact.display());
    Ok(run(RunStatus::Completed))
}

/// Runs the full sweep.
///
/// Installs every registry entry exactly once, then executes each (sample, thread count,
/// assembler) combination strictly in sequence. Per-combination failures are handled per
/// [`FailurePolicy`]; with [`FailurePolicy::Continue`] they are recorded as [`RunStatus::Failed`]
/// runs and the sweep proceeds, so no failure is ever silently dropped.
///
/// # Errors
///
/// Returns an error if provisioning fails, or on the first failed combination under
/// [`FailurePolicy::Halt`].
pub async fn execute_all<P: Provisioner, E: Executor>(
    registry: &Registry,
    manifest: &Manifest,
    thread_counts: &[u32],
    provisioner: &P,
    executor: &E,
    opts: &SweepOptions,
) -> anyhow::Result<Vec<Run>> {
    for descriptor in registry.iter() {
        provisioner
            .install(descriptor)
            .await
            .with_context(|| format!("provisioning tool `{}`", descriptor.identifier))?;
    }

    let assemblers: Vec<_> = registry.assemblers().collect();
    log::info!(
        "sweeping {} assembler(s) over {} sample(s) and thread counts {thread_counts:?}...",
        assemblers.len(),
        manifest.len()
    );

    let mut runs = Vec::new();
    for sample in manifest.entries() {
        for &threads in thread_counts {
            for &(descriptor, command) in &assemblers {
                match execute_single(descriptor, command, sample, threads, executor, opts) {
                    Ok(run) => runs.push(run),
                    Err(err) => {
                        let sample_name = sample.name();
                        let identifier =
                            Identifier::new(&sample_name, &descriptor.identifier, threads);
                        log::error!("[{identifier}] combination failed: {err}");
                        match opts.policy {
                            FailurePolicy::Halt => {
                                return Err(anyhow::Error::new(err)
                                    .context(format!("combination {identifier} failed")));
                            }
                            FailurePolicy::Continue => {
                                let out_dir = sample.output_path(&opts.base);
                                runs.push(Run {
                                    identifier,
                                    tool: descriptor.identifier.clone(),
                                    sample: sample_name.clone(),
                                    threads,
                                    transcript: transcript_path(
                                        &out_dir,
                                        &sample_name,
                                        &descriptor.identifier,
                                        threads,
                                    ),
                                    artifact: artifact_path(
                                        &out_dir,
                                        &sample_name,
                                        &descriptor.identifier,
                                        threads,
                                    ),
                                    status: RunStatus::Failed {
                                        error: err.to_string(),
                                    },
                                });
                            }
                        }
                    }
                }
            }
        }
    }

    let failed = runs
        .iter()
        .filter(|run| matches!(run.status, RunStatus::Failed { .. }))
        .count();
    log::info!(
        "sweep finished: {} run(s), {failed} failed",
        runs.len()
    );

    Ok(runs)
}

#[cfg(test)]
mod tests {
    use std::{
        cell::RefCell,
        collections::{BTreeMap, HashSet, VecDeque},
    };

    use tempfile::TempDir;

    use super::*;
    use crate::{
        provision::InstallError,
        samples::Manifest,
        tools::{Identifier as ToolIdentifier, ImageReference},
    };

    fn descriptor(id: &str) -> ToolDescriptor {
        ToolDescriptor {
            identifier: ToolIdentifier::from(id),
            image: ImageReference::parse(&format!("quay.io/biocontainers/{id}@sha256:abc"))
                .unwrap(),
        }
    }

    fn sample(base: &Path) -> Sample {
        std::fs::create_dir_all(base.join("input")).unwrap();
        std::fs::write(base.join("input/reads.fq"), b"@r1\nACGT\n+\nIIII\n").unwrap();
        Sample::new(PathBuf::from("input/reads.fq"), PathBuf::from("out")).unwrap()
    }

    fn options(base: &Path) -> SweepOptions {
        SweepOptions {
            base: base.to_path_buf(),
            policy: FailurePolicy::Continue,
            resume: false,
        }
    }

    /// One scripted response per invocation, consumed in order.
    enum Step {
        /// Create the given file, then report the transcript text.
        Produce(PathBuf, &'static str),
        /// Report the transcript text without creating any output file.
        NoOutput(&'static str),
        /// Fail to launch.
        LaunchFailure,
    }

    struct ScriptedExecutor {
        steps: RefCell<VecDeque<Step>>,
    }

    impl ScriptedExecutor {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: RefCell::new(steps.into()),
            }
        }
    }

    impl Executor for ScriptedExecutor {
        fn execute(&self, _command: &ProfiledCommand) -> io::Result<CapturedOutput> {
            match self.steps.borrow_mut().pop_front().expect("unexpected invocation") {
                Step::Produce(path, transcript) => {
                    std::fs::write(path, b">contig_1\nACGT\n")?;
                    Ok(CapturedOutput {
                        status_code: Some(0),
                        stdout: transcript.as_bytes().to_vec(),
                        stderr: b"\tMaximum resident set size (kbytes): 1024\n".to_vec(),
                    })
                }
                Step::NoOutput(transcript) => Ok(CapturedOutput {
                    status_code: Some(1),
                    stdout: transcript.as_bytes().to_vec(),
                    stderr: Vec::new(),
                }),
                Step::LaunchFailure => {
                    Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
                }
            }
        }
    }

    struct CountingProvisioner {
        installed: RefCell<Vec<String>>,
    }

    impl CountingProvisioner {
        fn new() -> Self {
            Self {
                installed: RefCell::new(Vec::new()),
            }
        }
    }

    impl Provisioner for CountingProvisioner {
        async fn install(&self, descriptor: &ToolDescriptor) -> Result<(), InstallError> {
            self.installed
                .borrow_mut()
                .push(descriptor.identifier.to_string());
            Ok(())
        }
    }

    #[test]
    fn paths_are_pairwise_distinct_across_sweep() {
        let out_dir = Path::new("/data/out");
        let mut paths = HashSet::new();
        let mut expected = 0;
        for sample in ["reads.fq", "other.fq"] {
            for tool in ["flye", "canu", "raven"] {
                for threads in [1, 2, 4, 8] {
                    let tool = ToolIdentifier::from(tool);
                    paths.insert(transcript_path(out_dir, sample, &tool, threads));
                    paths.insert(artifact_path(out_dir, sample, &tool, threads));
                    expected += 2;
                }
            }
        }
        assert_eq!(paths.len(), expected);
    }

    #[test]
    fn successful_run_renames_default_output() {
        let tmp = TempDir::new().unwrap();
        let opts = options(tmp.path());
        let sample = sample(tmp.path());
        let executor = ScriptedExecutor::new(vec![Step::Produce(
            tmp.path().join("out/assembly.fasta"),
            "flye log\n",
        )]);

        // The executor only sees the output directory once it exists.
        std::fs::create_dir_all(tmp.path().join("out")).unwrap();
        let run = execute_single(
            &descriptor("toyasm"),
            AssemblerCommand::Flye,
            &sample,
            1,
            &executor,
            &opts,
        )
        .unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(
            run.transcript,
            tmp.path().join("out/reads.fq_toyasm_1_thread.txt")
        );
        assert_eq!(
            run.artifact,
            tmp.path().join("out/reads.fq_toyasm_1_thread.fasta")
        );
        assert!(run.artifact.exists());
        assert!(!tmp.path().join("out/assembly.fasta").exists());
        let transcript = std::fs::read_to_string(&run.transcript).unwrap();
        assert!(transcript.contains("flye log"));
        assert!(transcript.contains("Maximum resident set size"));
    }

    #[test]
    fn rerun_truncates_transcript() {
        let tmp = TempDir::new().unwrap();
        let opts = options(tmp.path());
        let sample = sample(tmp.path());
        std::fs::create_dir_all(tmp.path().join("out")).unwrap();
        let executor = ScriptedExecutor::new(vec![
            Step::Produce(tmp.path().join("out/assembly.fasta"), "first run\n"),
            Step::Produce(tmp.path().join("out/assembly.fasta"), "second run\n"),
        ]);

        let flye = descriptor("flye");
        execute_single(&flye, AssemblerCommand::Flye, &sample, 4, &executor, &opts).unwrap();
        let run =
            execute_single(&flye, AssemblerCommand::Flye, &sample, 4, &executor, &opts).unwrap();

        let transcript = std::fs::read_to_string(&run.transcript).unwrap();
        assert!(transcript.contains("second run"));
        assert!(!transcript.contains("first run"));
    }

    #[test]
    fn missing_default_output_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let opts = options(tmp.path());
        let sample = sample(tmp.path());
        let executor = ScriptedExecutor::new(vec![Step::NoOutput("tool crashed\n")]);

        let err = execute_single(
            &descriptor("flye"),
            AssemblerCommand::Flye,
            &sample,
            2,
            &executor,
            &opts,
        )
        .unwrap_err();

        assert!(matches!(err, RunError::ArtifactNotFound { .. }));
        // No renamed artifact is left behind, but the transcript survives as evidence.
        let flye = ToolIdentifier::from("flye");
        let out_dir = tmp.path().join("out");
        assert!(!artifact_path(&out_dir, "reads.fq", &flye, 2).exists());
        let transcript = transcript_path(&out_dir, "reads.fq", &flye, 2);
        assert!(transcript.exists());
        assert!(std::fs::read_to_string(transcript)
            .unwrap()
            .contains("tool crashed"));
    }

    #[test]
    fn launch_failure_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let opts = options(tmp.path());
        let sample = sample(tmp.path());
        let executor = ScriptedExecutor::new(vec![Step::LaunchFailure]);

        let err = execute_single(
            &descriptor("flye"),
            AssemblerCommand::Flye,
            &sample,
            1,
            &executor,
            &opts,
        )
        .unwrap_err();
        assert!(matches!(err, RunError::Launch { .. }));
    }

    #[test]
    fn resume_skips_completed_combination() {
        let tmp = TempDir::new().unwrap();
        let mut opts = options(tmp.path());
        opts.resume = true;
        let sample = sample(tmp.path());
        let out_dir = tmp.path().join("out");
        std::fs::create_dir_all(&out_dir).unwrap();
        let flye = ToolIdentifier::from("flye");
        std::fs::write(artifact_path(&out_dir, "reads.fq", &flye, 1), b">c\nA\n").unwrap();

        // No scripted steps: an invocation would panic.
        let executor = ScriptedExecutor::new(vec![]);
        let run = execute_single(
            &descriptor("flye"),
            AssemblerCommand::Flye,
            &sample,
            1,
            &executor,
            &opts,
        )
        .unwrap();

        assert_eq!(run.status, RunStatus::Skipped);
        assert!(!transcript_path(&out_dir, "reads.fq", &flye, 1).exists());
    }

    #[tokio::test]
    async fn sweep_installs_once_per_tool() {
        let tmp = TempDir::new().unwrap();
        let opts = options(tmp.path());
        let registry = Registry::new(vec![
            (
                ToolIdentifier::from("flye"),
                ImageReference::parse("quay.io/biocontainers/flye@sha256:abc").unwrap(),
            ),
            (
                ToolIdentifier::from("minimap2"),
                ImageReference::parse("quay.io/biocontainers/minimap2@sha256:def").unwrap(),
            ),
        ]);
        let manifest = Manifest::new(BTreeMap::from([(
            PathBuf::from("input/reads.fq"),
            PathBuf::from("out"),
        )]))
        .unwrap();
        sample(tmp.path());
        std::fs::create_dir_all(tmp.path().join("out")).unwrap();

        let provisioner = CountingProvisioner::new();
        let executor = ScriptedExecutor::new(vec![
            Step::Produce(tmp.path().join("out/assembly.fasta"), "t1\n"),
            Step::Produce(tmp.path().join("out/assembly.fasta"), "t2\n"),
        ]);

        let runs = execute_all(&registry, &manifest, &[1, 2], &provisioner, &executor, &opts)
            .await
            .unwrap();

        // install once per registry entry, regardless of sweep size; only flye is swept.
        assert_eq!(*provisioner.installed.borrow(), vec!["flye", "minimap2"]);
        assert_eq!(runs.len(), 2);
        let flye = ToolIdentifier::from("flye");
        let out_dir = tmp.path().join("out");
        for threads in [1, 2] {
            assert!(transcript_path(&out_dir, "reads.fq", &flye, threads).exists());
            assert!(artifact_path(&out_dir, "reads.fq", &flye, threads).exists());
        }
    }

    #[tokio::test]
    async fn continue_policy_records_failure_and_proceeds() {
        let tmp = TempDir::new().unwrap();
        let opts = options(tmp.path());
        let registry = Registry::new(vec![(
            ToolIdentifier::from("flye"),
            ImageReference::parse("quay.io/biocontainers/flye@sha256:abc").unwrap(),
        )]);
        let manifest = Manifest::new(BTreeMap::from([(
            PathBuf::from("input/reads.fq"),
            PathBuf::from("out"),
        )]))
        .unwrap();
        sample(tmp.path());
        std::fs::create_dir_all(tmp.path().join("out")).unwrap();

        let executor = ScriptedExecutor::new(vec![
            Step::NoOutput("boom\n"),
            Step::Produce(tmp.path().join("out/assembly.fasta"), "ok\n"),
        ]);

        let runs = execute_all(
            &registry,
            &manifest,
            &[1, 2],
            &CountingProvisioner::new(),
            &executor,
            &opts,
        )
        .await
        .unwrap();

        assert_eq!(runs.len(), 2);
        assert!(matches!(runs[0].status, RunStatus::Failed { .. }));
        assert_eq!(runs[1].status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn halt_policy_aborts_on_first_failure() {
        let tmp = TempDir::new().unwrap();
        let mut opts = options(tmp.path());
        opts.policy = FailurePolicy::Halt;
        let registry = Registry::new(vec![(
            ToolIdentifier::from("flye"),
            ImageReference::parse("quay.io/biocontainers/flye@sha256:abc").unwrap(),
        )]);
        let manifest = Manifest::new(BTreeMap::from([(
            PathBuf::from("input/reads.fq"),
            PathBuf::from("out"),
        )]))
        .unwrap();
        sample(tmp.path());
        std::fs::create_dir_all(tmp.path().join("out")).unwrap();

        let executor = ScriptedExecutor::new(vec![Step::NoOutput("boom\n")]);

        let result = execute_all(
            &registry,
            &manifest,
            &[1, 2],
            &CountingProvisioner::new(),
            &executor,
            &opts,
        )
        .await;

        assert!(result.is_err());
        let flye = ToolIdentifier::from("flye");
        let out_dir = tmp.path().join("out");
        assert!(!artifact_path(&out_dir, "reads.fq", &flye, 2).exists());
        assert!(!transcript_path(&out_dir, "reads.fq", &flye, 2).exists());
    }
}
