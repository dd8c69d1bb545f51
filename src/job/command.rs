//! Typed shell words and the duplicity command chain.
//!
//! Quoting lives in [`Arg`]'s `Display` impl and nowhere else: user data is
//! always single-quoted, fixed flags and validated intervals are bare words.

use crate::job::destination::Destination;
use crate::job::resolve::ResolvedJob;
use itertools::Itertools;
use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::warn;

static DUPLICITY: &str = "duplicity";

/// Wraps `value` in single quotes, rendering embedded quotes as `'\''`.
pub fn single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Arg {
    /// Emitted as is.
    Word(Cow<'static, str>),
    /// Emitted single-quoted.
    Quoted(String),
    /// `name='value'`, used for option assignments and environment lines.
    Assign(&'static str, String),
}

impl Arg {
    pub fn word<S: Into<Cow<'static, str>>>(word: S) -> Self {
        Arg::Word(word.into())
    }

    pub fn quoted<S: Into<String>>(value: S) -> Self {
        Arg::Quoted(value.into())
    }

    pub fn assign<S: Into<String>>(name: &'static str, value: S) -> Self {
        Arg::Assign(name, value.into())
    }

    fn path(path: &Path) -> Self {
        Arg::Quoted(path.to_string_lossy().into_owned())
    }
}

impl Display for Arg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Arg::Word(word) => f.write_str(word),
            Arg::Quoted(value) => f.write_str(&single_quote(value)),
            Arg::Assign(name, value) => write!(f, "{}={}", name, single_quote(value)),
        }
    }
}

/// One simple command, rendered as its arguments joined by single spaces.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShellCommand {
    args: Vec<Arg>,
}

impl ShellCommand {
    pub fn new(program: &'static str) -> Self {
        Self {
            args: vec![Arg::word(program)],
        }
    }

    /// A shell fragment taken verbatim, e.g. a user supplied pre-command.
    pub fn raw<S: Into<String>>(fragment: S) -> Self {
        Self {
            args: vec![Arg::word(fragment.into())],
        }
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn args<I: IntoIterator<Item = Arg>>(mut self, args: I) -> Self {
        self.args.extend(args);
        self
    }
}

impl From<Arg> for ShellCommand {
    fn from(arg: Arg) -> Self {
        Self { args: vec![arg] }
    }
}

impl Display for ShellCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.args.iter().join(" "))
    }
}

/// Commands joined by `&&`, so the first failure stops the rest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandChain {
    commands: Vec<ShellCommand>,
}

impl CommandChain {
    pub fn commands(&self) -> &[ShellCommand] {
        &self.commands
    }
}

impl Display for CommandChain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.commands.iter().join(" && "))
    }
}

fn encryption_flags(job: &ResolvedJob) -> Vec<Arg> {
    if job.pubkey_ids().is_empty() {
        return vec![Arg::word("--no-encryption")];
    }

    std::iter::once(Arg::word("--gpg-options"))
        .chain(std::iter::once(Arg::quoted("--trust-model=always")))
        .chain(
            job.pubkey_ids()
                .iter()
                .flat_map(|id| [Arg::word("--encrypt-key"), Arg::quoted(id.as_str())]),
        )
        .collect()
}

fn backup_command(job: &ResolvedJob, destination: &Destination) -> ShellCommand {
    ShellCommand::new(DUPLICITY)
        .arg(Arg::word("--full-if-older-than"))
        .arg(Arg::word(job.full_if_older_than().clone()))
        .arg(Arg::word("--s3-use-new-style"))
        .args(encryption_flags(job))
        .args(
            job.directories()
                .iter()
                .flat_map(|dir| [Arg::word("--include"), Arg::path(dir)]),
        )
        .arg(Arg::word("--exclude"))
        .arg(Arg::quoted("**"))
        .args(destination.extra_flags.iter().cloned())
        .arg(Arg::word("/"))
        .arg(Arg::quoted(destination.url.as_str()))
}

/// Pruning only deletes remote sets, so it never carries encryption flags.
fn remove_older_than_command(
    remove_older_than: &str,
    destination: &Destination,
) -> ShellCommand {
    ShellCommand::new(DUPLICITY)
        .arg(Arg::word("remove-older-than"))
        .arg(Arg::word(remove_older_than.to_string()))
        .arg(Arg::word("--no-encryption"))
        .arg(Arg::word("--force"))
        .args(destination.extra_flags.iter().cloned())
        .arg(Arg::quoted(destination.url.as_str()))
}

/// Pre-command, backup, then the optional prune, in that order.
pub fn build_command_chain(job: &ResolvedJob, destination: &Destination) -> CommandChain {
    let commands = job
        .pre_command()
        .iter()
        .map(ShellCommand::raw)
        .chain(std::iter::once(backup_command(job, destination)))
        .chain(
            job.remove_older_than()
                .iter()
                .map(|age| remove_older_than_command(age, destination)),
        )
        .collect();

    CommandChain { commands }
}

/// Credential assignments for bucket backends, followed by an `export` of
/// the assigned names so the duplicity child process sees them. Remote hosts
/// get no lines at all.
pub fn build_environment(job: &ResolvedJob, destination: &Destination) -> Vec<ShellCommand> {
    let Some((id_var, key_var)) = destination.kind.credential_variables() else {
        return vec![];
    };

    if job.dest_id().is_none() || job.dest_key().is_none() {
        warn!(
            "Job {:?} has only one of dest_id/dest_key, emitting the one that is set",
            job.title()
        );
    }

    let assignments = job
        .dest_id()
        .iter()
        .map(|id| (id_var, id.as_str()))
        .chain(
            job.dest_key()
                .iter()
                .map(|key| (key_var, key.inner().as_str())),
        )
        .collect_vec();
    if assignments.is_empty() {
        return vec![];
    }

    let export = ShellCommand::new("export")
        .args(assignments.iter().map(|(name, _)| Arg::word(*name)));
    assignments
        .into_iter()
        .map(|(name, value)| ShellCommand::from(Arg::assign(name, value)))
        .chain(std::iter::once(export))
        .collect()
}
