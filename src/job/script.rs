//! Final script artifact handed to the provisioning layer.

use crate::job::command::{CommandChain, ShellCommand};
use crate::job::descriptor::Ensure;
use crate::job::resolve::ResolvedJob;
use itertools::Itertools;
use serde::{Serialize, Serializer};
use serde_with::skip_serializing_none;
use std::path::PathBuf;

/// Owner of every generated script; not configurable.
pub static SCRIPT_OWNER: &str = "root";
/// Scripts hold credentials, so only the owner may read them.
pub const SCRIPT_MODE: u32 = 0o700;

#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScriptArtifact {
    pub path: PathBuf,
    pub owner: &'static str,
    #[serde(serialize_with = "serialize_mode")]
    pub mode: u32,
    pub ensure: Ensure,
    /// `None` for removal markers.
    pub content: Option<String>,
}

fn serialize_mode<S: Serializer>(mode: &u32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{mode:04o}"))
}

impl ScriptArtifact {
    pub fn absent(path: PathBuf) -> Self {
        Self {
            path,
            owner: SCRIPT_OWNER,
            mode: SCRIPT_MODE,
            ensure: Ensure::Absent,
            content: None,
        }
    }

    pub fn present(path: PathBuf, content: String) -> Self {
        Self {
            path,
            owner: SCRIPT_OWNER,
            mode: SCRIPT_MODE,
            ensure: Ensure::Present,
            content: Some(content),
        }
    }
}

/// Environment lines first, then the whole chain on one line, newline terminated.
pub fn render_script(
    job: &ResolvedJob,
    environment: &[ShellCommand],
    chain: &CommandChain,
) -> ScriptArtifact {
    let content = environment
        .iter()
        .map(ToString::to_string)
        .chain(std::iter::once(chain.to_string()))
        .join("\n")
        + "\n";

    ScriptArtifact::present(job.script_path().clone(), content)
}
