use crate::job::descriptor::CloudProvider;
use crate::job::result_error::WithMsg;
use thiserror::Error;

/// Reasons a single job cannot be compiled.
///
/// Every variant names the job so a batch report stays readable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error(
        "job {title:?}: target {target:?} conflicts with bucket {bucket:?} / cloud provider {cloud_provider:?}"
    )]
    ConflictingDestination {
        title: String,
        target: String,
        bucket: Option<String>,
        cloud_provider: Option<CloudProvider>,
    },
    #[error("job {title:?}: neither target nor bucket is set")]
    MissingDestination { title: String },
    #[error("job {title:?}: no directories to back up")]
    MissingSource { title: String },
    #[error("job {title:?}: bucket {bucket:?} has neither dest_id nor dest_key")]
    MissingCredentials { title: String, bucket: String },
    #[error("job {title:?}: bucket {bucket:?} needs a host identifier to build its path")]
    MissingHostIdentifier { title: String, bucket: String },
    #[error("job {title:?}: {errors}")]
    InvalidField {
        title: String,
        errors: validator::ValidationErrors,
    },
}

impl CompileError {
    pub fn title(&self) -> &str {
        match self {
            Self::ConflictingDestination { title, .. }
            | Self::MissingDestination { title }
            | Self::MissingSource { title }
            | Self::MissingCredentials { title, .. }
            | Self::MissingHostIdentifier { title, .. }
            | Self::InvalidField { title, .. } => title,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    SerdeYml(#[from] serde_yml::Error),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error(transparent)]
    ValidationError(#[from] validator::ValidationErrors),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("{}:\n{}", msg, indent::indent_all_with("  ", error.to_string()))]
    WithMsg { msg: String, error: Box<Error> },
    #[error("{}", itertools::join(.0, "\n\n"))]
    LotsOfError(Vec<Error>),
}

impl<S: Into<String>> WithMsg<S> for Error {
    fn with_msg(self, msg: S) -> Self {
        Self::WithMsg {
            msg: msg.into(),
            error: Box::new(self),
        }
    }
}

impl Error {
    pub fn into_iter(self) -> Box<dyn Iterator<Item = Error>> {
        match self {
            Error::LotsOfError(v) => Box::new(v.into_iter().flat_map(Error::into_iter)),
            e => Box::new(std::iter::once(e)),
        }
    }
}
