//! Input model: one job descriptor per backup job plus the process-wide defaults.

use crate::job::redacted::RedactedString;
use crate::job::setting::Setting;
use crate::job::validate::{validate_absolute_path, validate_keyserver};
use bon::Builder;
use derive_more::Display;
use getset::{Getters, Setters};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, skip_serializing_none, OneOrMany};
use std::path::PathBuf;
use validator::Validate;

pub static DEFAULT_FULL_IF_OLDER_THAN: &str = "30D";
pub static DEFAULT_KEYSERVER: &str = "subkeys.pgp.net";
pub static DEFAULT_SPOOL_DIR: &str = "/var/spool/duplicity";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Ensure {
    #[default]
    #[display("present")]
    Present,
    #[display("absent")]
    Absent,
}

/// Object storage backend tag.
///
/// `s3` keeps the S3-compatible addressing (bucket/host/title), every other
/// tag addresses the bucket directly through the provider's own scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum CloudProvider {
    #[serde(rename = "s3")]
    #[display("s3")]
    S3,
    #[serde(rename = "cf", alias = "cloudfiles")]
    #[display("cf")]
    CloudFiles,
}

/// Declarative description of one backup job.
///
/// `bucket`, `dest_id`, `dest_key` and `cloud_provider` are tri-state: left
/// out they fall back to [`EffectiveDefaults`], `false` switches them off for
/// this job only.
#[serde_as]
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, Builder, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct JobDescriptor {
    #[builder(into)]
    title: String,
    #[serde(default)]
    #[builder(default)]
    ensure: Ensure,
    #[serde_as(as = "OneOrMany<_>")]
    #[serde(default, alias = "directory")]
    #[builder(default)]
    directories: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Setting::is_unset")]
    #[builder(default, into)]
    bucket: Setting<String>,
    #[serde(default, skip_serializing_if = "Setting::is_unset")]
    #[builder(default, into)]
    dest_id: Setting<String>,
    #[serde(default, skip_serializing_if = "Setting::is_unset")]
    #[builder(default, into)]
    dest_key: Setting<RedactedString>,
    #[serde(default, alias = "cloud", skip_serializing_if = "Setting::is_unset")]
    #[builder(default, into)]
    cloud_provider: Setting<CloudProvider>,
    /// Remote URL such as `ssh://host//path`, exclusive with bucket storage.
    #[builder(into)]
    target: Option<String>,
    #[serde(alias = "ssh_id")]
    #[builder(into)]
    ssh_identity: Option<PathBuf>,
    #[serde_as(as = "OneOrMany<_>")]
    #[serde(default, alias = "pubkey_id")]
    #[builder(default)]
    pubkey_ids: Vec<String>,
    #[serde(default = "default_full_if_older_than")]
    #[builder(default = default_full_if_older_than(), into)]
    full_if_older_than: String,
    #[builder(into)]
    remove_older_than: Option<String>,
    /// Raw shell fragment, emitted verbatim in front of the backup chain.
    #[builder(into)]
    pre_command: Option<String>,
    #[builder(into)]
    host_identifier: Option<String>,
    #[serde(alias = "spoolfile")]
    #[builder(into)]
    script_path: Option<PathBuf>,
}

fn default_full_if_older_than() -> String {
    DEFAULT_FULL_IF_OLDER_THAN.into()
}

/// Values every job falls back to when it leaves a field out.
///
/// Read-only for the lifetime of a compilation batch.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, Validate, Builder, Getters, Setters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct EffectiveDefaults {
    #[builder(into)]
    bucket: Option<String>,
    #[builder(into)]
    dest_id: Option<String>,
    #[builder(into)]
    dest_key: Option<RedactedString>,
    #[getset(set = "pub")]
    #[builder(into)]
    host_identifier: Option<String>,
    #[validate(custom(function = validate_keyserver))]
    #[serde(default = "default_keyserver")]
    #[builder(default = default_keyserver(), into)]
    keyserver: String,
    #[validate(custom(function = validate_absolute_path))]
    #[serde(default = "default_spool_dir")]
    #[builder(default = default_spool_dir(), into)]
    spool_dir: PathBuf,
}

fn default_keyserver() -> String {
    DEFAULT_KEYSERVER.into()
}

fn default_spool_dir() -> PathBuf {
    DEFAULT_SPOOL_DIR.into()
}

impl Default for EffectiveDefaults {
    fn default() -> Self {
        Self::builder().build()
    }
}
