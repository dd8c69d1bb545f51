//! Configuration file: process-wide defaults plus the declared jobs.

use crate::job::descriptor::{EffectiveDefaults, JobDescriptor};
use crate::job::result_error::error::Error;
use crate::job::result_error::result::Result;
use crate::job::result_error::WithMsg;
use getset::{Getters, MutGetters};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use validator::{Validate, ValidationError};

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate, Getters, MutGetters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct CompilerConfig {
    #[serde(default)]
    #[validate(nested)]
    #[getset(get_mut = "pub")]
    defaults: EffectiveDefaults,
    #[serde(default)]
    #[validate(custom(function = validate_unique_titles))]
    jobs: Vec<JobDescriptor>,
}

fn validate_unique_titles(jobs: &[JobDescriptor]) -> std::result::Result<(), ValidationError> {
    let duplicates = jobs.iter().map(JobDescriptor::title).duplicates().join(", ");
    if !duplicates.is_empty() {
        return Err(ValidationError::new("DuplicateJobTitle")
            .with_message(format!("job titles declared more than once: {duplicates}").into()));
    }

    Ok(())
}

impl CompilerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        File::open(path)
            .map_err(Error::from)
            .with_msg(format!("Open config failed: {:?}", path))
            .and_then(|f| {
                serde_yml::from_reader::<_, CompilerConfig>(f)
                    .map_err(Error::from)
                    .with_msg(format!("Parse YAML config failed: {:?}", path))
            })
            .and_then(|config| {
                config
                    .validate()
                    .map_err(Error::from)
                    .map(|_| config)
                    .with_msg(format!("Config validation failed: {:?}", path))
            })
    }
}
