//! Public key import for jobs that encrypt to recipient keys.
//!
//! The action is applied by the provisioning layer: it runs `command` unless
//! `unless` succeeds, so repeated runs never re-import a present key.

use crate::job::command::{Arg, ShellCommand};
use crate::job::resolve::ResolvedJob;
use serde::Serialize;

pub static KEY_IMPORT_SEARCH_PATH: &str = "/usr/bin:/usr/sbin:/bin";
static GPG: &str = "gpg";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyImportAction {
    /// Stable across runs, used by the applier to deduplicate.
    pub name: String,
    pub command: String,
    pub unless: String,
    pub path: &'static str,
}

fn key_args(job: &ResolvedJob) -> impl Iterator<Item = Arg> + '_ {
    job.pubkey_ids().iter().map(|id| Arg::quoted(id.as_str()))
}

pub fn build_key_import(job: &ResolvedJob) -> Option<KeyImportAction> {
    if job.pubkey_ids().is_empty() {
        return None;
    }

    let command = ShellCommand::new(GPG)
        .arg(Arg::word("--keyserver"))
        .arg(Arg::word(job.keyserver().clone()))
        .arg(Arg::word("--recv-keys"))
        .args(key_args(job));
    let unless = ShellCommand::new(GPG)
        .arg(Arg::word("--batch"))
        .arg(Arg::word("--list-keys"))
        .args(key_args(job));

    Some(KeyImportAction {
        name: format!("duplicity-pgp-{}", job.title()),
        command: command.to_string(),
        unless: unless.to_string(),
        path: KEY_IMPORT_SEARCH_PATH,
    })
}
