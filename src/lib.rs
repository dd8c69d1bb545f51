//! # duplicity_job
//!
//! Compiles declarative backup job descriptions into duplicity shell scripts.
//!
//! ## Features
//!
//! - **Defaults**: jobs inherit bucket and credentials from process-wide defaults
//! - **Backends**: S3-compatible buckets, provider object storage and SSH targets
//! - **Encryption**: public-key encryption to one or more recipient keys
//! - **Retention**: optional pruning of old backup sets after each run
//! - **Key import**: an idempotent action fetching missing public keys
//!
//! Compilation is pure and deterministic; writing the script and running the
//! key import are left to the caller.
//!
//! ## Quick Start
//!
//! ```no_run
//! use duplicity_job::job::compiler::JobCompiler;
//! use duplicity_job::job::config::CompilerConfig;
//!
//! let config = CompilerConfig::load("jobs.yml")?;
//! let compiler = JobCompiler::new(config.defaults().clone());
//! for result in compiler.compile_batch(config.jobs()) {
//!     let compiled = result?;
//!     println!("{:?}", compiled.script.content);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod job;
