//! Resolve, validate, pick a destination, build commands, render.
//!
//! Compilation is pure: no I/O, no processes, and the same descriptor and
//! defaults always give byte-identical script content.

use crate::job::command::{build_command_chain, build_environment};
use crate::job::descriptor::{EffectiveDefaults, Ensure, JobDescriptor};
use crate::job::destination::Destination;
use crate::job::key_import::{build_key_import, KeyImportAction};
use crate::job::resolve::{resolve, ResolvedJob};
use crate::job::result_error::error::CompileError;
use crate::job::script::{render_script, ScriptArtifact};
use crate::job::validate::validate_job;
use rayon::prelude::*;
use serde::Serialize;
use serde_with::skip_serializing_none;
use std::sync::Arc;
use tracing::{debug, info};

#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CompiledJob {
    pub title: String,
    pub script: ScriptArtifact,
    pub key_import: Option<KeyImportAction>,
}

pub fn compile_resolved(job: &ResolvedJob) -> Result<CompiledJob, CompileError> {
    validate_job(job)?;

    if *job.ensure() == Ensure::Absent {
        debug!("Job {:?} is absent, emitting removal marker", job.title());
        return Ok(CompiledJob {
            title: job.title().clone(),
            script: ScriptArtifact::absent(job.script_path().clone()),
            key_import: None,
        });
    }

    let destination = Destination::try_from(job)?;
    let environment = build_environment(job, &destination);
    let chain = build_command_chain(job, &destination);
    let script = render_script(job, &environment, &chain);
    let key_import = build_key_import(job);

    info!(
        "Compiled job {:?} into {:?} ({} command(s))",
        job.title(),
        script.path,
        chain.commands().len()
    );

    Ok(CompiledJob {
        title: job.title().clone(),
        script,
        key_import,
    })
}

/// Compiles jobs against one shared, read-only set of defaults.
#[derive(Clone, Debug, Default)]
pub struct JobCompiler {
    defaults: Arc<EffectiveDefaults>,
}

impl JobCompiler {
    pub fn new<D: Into<Arc<EffectiveDefaults>>>(defaults: D) -> Self {
        Self {
            defaults: defaults.into(),
        }
    }

    pub fn defaults(&self) -> &EffectiveDefaults {
        &self.defaults
    }

    pub fn compile(&self, job: &JobDescriptor) -> Result<CompiledJob, CompileError> {
        compile_resolved(&resolve(job, &self.defaults))
    }

    /// Failures stay with their job; results keep the input order.
    pub fn compile_batch(&self, jobs: &[JobDescriptor]) -> Vec<Result<CompiledJob, CompileError>> {
        jobs.par_iter().map(|job| self.compile(job)).collect()
    }
}
