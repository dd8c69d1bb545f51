//! Merges a job descriptor with the process-wide defaults.

use crate::job::descriptor::{CloudProvider, EffectiveDefaults, Ensure, JobDescriptor};
use crate::job::redacted::RedactedString;
use crate::job::validate::{
    validate_absolute_path, validate_absolute_paths, validate_interval, validate_key_ids,
    validate_keyserver, validate_title,
};
use getset::Getters;
use itertools::Itertools;
use std::path::PathBuf;
use tracing::debug;
use validator::Validate;

/// A job with every optional field settled against the defaults.
///
/// Only [`resolve`] builds one; the fields are read-only afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Validate, Getters)]
#[getset(get = "pub")]
pub struct ResolvedJob {
    #[validate(custom(function = validate_title))]
    title: String,
    ensure: Ensure,
    #[validate(custom(function = validate_absolute_paths))]
    directories: Vec<PathBuf>,
    bucket: Option<String>,
    dest_id: Option<String>,
    dest_key: Option<RedactedString>,
    cloud_provider: Option<CloudProvider>,
    target: Option<String>,
    #[validate(custom(function = validate_absolute_path))]
    ssh_identity: Option<PathBuf>,
    #[validate(custom(function = validate_key_ids))]
    pubkey_ids: Vec<String>,
    #[validate(custom(function = validate_interval))]
    full_if_older_than: String,
    #[validate(custom(function = validate_interval))]
    remove_older_than: Option<String>,
    pre_command: Option<String>,
    host_identifier: Option<String>,
    #[validate(custom(function = validate_absolute_path))]
    script_path: PathBuf,
    /// Emitted bare in the key fetch command, so it is checked per job too.
    #[validate(custom(function = validate_keyserver))]
    keyserver: String,
}

impl ResolvedJob {
    /// Bucket storage addressed as `<bucket>/<host>/<title>/` rather than by provider scheme.
    pub fn uses_s3_layout(&self) -> bool {
        self.target.is_none() && matches!(self.cloud_provider, None | Some(CloudProvider::S3))
    }
}

fn non_empty(value: &String) -> bool {
    !value.is_empty()
}

pub fn resolve(job: &JobDescriptor, defaults: &EffectiveDefaults) -> ResolvedJob {
    let title = job.title().clone();
    let target = job.target().clone().filter(non_empty);

    let ssh_identity = match (&target, job.ssh_identity()) {
        (Some(_), identity) => identity.clone(),
        (None, Some(identity)) => {
            debug!("Job {title:?} has no target, ignoring ssh identity {identity:?}");
            None
        }
        (None, None) => None,
    };

    let script_path = job
        .script_path()
        .clone()
        .unwrap_or_else(|| defaults.spool_dir().join(format!("{title}.sh")));

    ResolvedJob {
        ensure: *job.ensure(),
        directories: job.directories().iter().unique().cloned().collect(),
        bucket: job
            .bucket()
            .resolve(defaults.bucket().as_ref())
            .filter(non_empty),
        dest_id: job
            .dest_id()
            .resolve(defaults.dest_id().as_ref())
            .filter(non_empty),
        dest_key: job
            .dest_key()
            .resolve(defaults.dest_key().as_ref())
            .filter(|key| !key.inner().is_empty()),
        cloud_provider: job.cloud_provider().resolve(None),
        target,
        ssh_identity,
        pubkey_ids: job.pubkey_ids().iter().unique().cloned().collect(),
        full_if_older_than: job.full_if_older_than().clone(),
        remove_older_than: job.remove_older_than().clone().filter(non_empty),
        pre_command: job.pre_command().clone().filter(non_empty),
        host_identifier: job
            .host_identifier()
            .clone()
            .or_else(|| defaults.host_identifier().clone())
            .filter(non_empty),
        script_path,
        keyserver: defaults.keyserver().clone(),
        title,
    }
}
