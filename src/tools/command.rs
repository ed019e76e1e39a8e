//! Structured command construction for assembler invocations.
//!
//! Each supported assembler has a variant in [`AssemblerCommand`] that knows how to build its
//! argument list and where the tool conventionally leaves its output. Building argument vectors
//! instead of interpolated shell strings keeps every tool's argument contract independently
//! testable and removes shell-quoting hazards entirely: nothing here ever passes through a shell.

use std::{
    fmt::{self, Display, Formatter},
    path::Path,
};

use serde::{Deserialize, Serialize};

use super::ToolDescriptor;

/// Resource-profiling wrapper executable. GNU time's verbose mode reports wall-clock time, user
/// and kernel CPU time, and peak resident set size on its standard error.
pub const PROFILER: &str = "/usr/bin/time";

/// Invocation strategy for one supported assembler.
///
/// The variant is looked up from a tool identifier with [`AssemblerCommand::for_tool`]; registry
/// entries without a variant (aligners, polishers) are provisioned but never swept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssemblerCommand {
    /// Flye in metagenomic mode over raw nanopore reads.
    Flye,
    /// Canu with the low-coverage/high-sensitivity parameter block.
    Canu,
    /// Raven with default parameters.
    Raven,
}

impl AssemblerCommand {
    /// Looks up the invocation strategy for a tool identifier.
    #[must_use]
    pub fn for_tool(identifier: &super::Identifier) -> Option<Self> {
        match identifier.as_str() {
            "flye" => Some(Self::Flye),
            "canu" => Some(Self::Canu),
            "raven" => Some(Self::Raven),
            _ => None,
        }
    }

    /// The executable name inside the container image.
    #[must_use]
    pub fn executable(self) -> &'static str {
        match self {
            Self::Flye => "flye",
            Self::Canu => "canu",
            Self::Raven => "raven",
        }
    }

    /// The filename the tool conventionally leaves in the output directory.
    ///
    /// This is the file [`crate::runs::execute_single`] renames to the sweep-qualified artifact
    /// name after the run.
    #[must_use]
    pub fn default_artifact(self) -> &'static str {
        match self {
            Self::Flye | Self::Raven => "assembly.fasta",
            // canu names contigs after its `-p` prefix.
            Self::Canu => "assembly.contigs.fasta",
        }
    }

    /// Builds the tool's argument list for one benchmark combination.
    ///
    /// `input` and `out_dir` are absolute paths (inside the container mount); `threads` is the
    /// independent variable under test.
    #[must_use]
    pub fn args(self, input: &Path, out_dir: &Path, threads: u32) -> Vec<String> {
        let input = input.to_string_lossy().into_owned();
        let out_dir = out_dir.to_string_lossy().into_owned();
        match self {
            Self::Flye => vec![
                "--nano-raw".to_string(),
                input,
                "--out-dir".to_string(),
                out_dir,
                "--meta".to_string(),
                "--threads".to_string(),
                threads.to_string(),
            ],
            Self::Canu => {
                let mut args = vec![
                    "-p".to_string(),
                    "assembly".to_string(),
                    "-d".to_string(),
                    out_dir,
                ];
                args.extend(
                    [
                        format!("minThreads={threads}"),
                        format!("maxThreads={threads}"),
                        format!("corThreads={threads}"),
                        "maxInputCoverage=10000".to_string(),
                        "corOutCoverage=10000".to_string(),
                        "corMhapSensitivity=high".to_string(),
                        "corMinCoverage=0".to_string(),
                        "redMemory=32".to_string(),
                        "oeaMemory=32".to_string(),
                        "batMemory=126".to_string(),
                    ]
                    .into_iter(),
                );
                args.push("-nanopore".to_string());
                args.push(input);
                args
            }
            Self::Raven => vec![input, "-t".to_string(), threads.to_string()],
        }
    }
}

/// A fully built, profiled, containerized invocation.
///
/// `program` plus `args` form the exact argv executed by the [`crate::runs::Executor`]: the
/// profiling wrapper around a `docker run` of the tool's own pinned image. No shell is involved
/// at any point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfiledCommand {
    /// Executable to launch (the profiling wrapper).
    pub program: String,
    /// Arguments, starting with the profiler's own flags.
    pub args: Vec<String>,
}

impl ProfiledCommand {
    /// Builds the profiled invocation for one benchmark combination.
    ///
    /// `mount` is the validated absolute base directory, bind-mounted into the container at the
    /// same path and used as the working directory, so host-side input/output paths are valid
    /// verbatim inside the container.
    #[must_use]
    pub fn build(
        descriptor: &ToolDescriptor,
        command: AssemblerCommand,
        mount: &Path,
        input: &Path,
        out_dir: &Path,
        threads: u32,
    ) -> Self {
        let mount = mount.to_string_lossy();
        let mut args = vec![
            "-v".to_string(),
            "docker".to_string(),
            "run".to_string(),
            "--rm".to_string(),
            "-v".to_string(),
            format!("{mount}:{mount}"),
            "-w".to_string(),
            mount.into_owned(),
            descriptor.image.as_str().to_string(),
            command.executable().to_string(),
        ];
        args.extend(command.args(input, out_dir, threads));
        Self {
            program: PROFILER.to_string(),
            args,
        }
    }
}

impl Display for ProfiledCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.program, self.args.join(" "))
    }
}
