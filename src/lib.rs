//! Benchmarking harness for containerized long-read genome assemblers.
//!
//! asm-bench drives a fixed set of assemblers (flye, canu, raven), each pinned to an exact
//! container image by content digest, against a fixed set of input read files, sweeping the
//! worker-thread count and capturing wall-clock time, CPU time, and peak memory via GNU time.
//! Every (sample, tool, thread-count) combination leaves behind exactly two files at
//! deterministic, collision-free paths:
//!
//! - `<out_dir>/<sample>_<tool>_<threads>_thread.txt`: the combined stdout/stderr transcript,
//!   including the resource-profiling summary
//! - `<out_dir>/<sample>_<tool>_<threads>_thread.fasta`: the assembly artifact, renamed from
//!   the tool's conventional output name
//!
//! The artifacts feed a later offline accuracy comparison against reference genomes (MUMmer-style
//! identity/coverage/mismatch/indel statistics). That step is deliberately outside this harness:
//! asm-bench's whole obligation toward it is producing artifacts at predictable paths.
//!
//! Invocations are issued strictly one at a time: the thread count of the tool is the independent
//! variable under test, and concurrent invocations would contend for the same cores and corrupt
//! the measurements.
//!
//! # Usage
//! asm-bench is primarily designed to be used as an executable driven by a suite file:
//! ```console
//! $ RUST_LOG=info asm-bench --suite suite.json --policy continue
//! ```
//! Refer to the output of the `--help` flag for the full surface.
//!
//! ## As a library
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

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]

pub mod provision;
pub mod runs;
pub mod samples;
pub mod suite;
pub mod tools;

pub use runs::{execute_all, execute_single, Run};
pub use samples::{Manifest, Sample};
pub use suite::Suite;
pub use tools::{Registry, ToolDescriptor};
