//! Backend selection: turns the resolved job into one [`Destination`].
//!
//! Later stages only look at the destination, never at `target` or
//! `cloud_provider` directly.

use crate::job::command::Arg;
use crate::job::descriptor::CloudProvider;
use crate::job::resolve::ResolvedJob;
use crate::job::result_error::error::CompileError;
use tracing::debug;

/// Bucket services addressed through their own URL scheme. S3 is not one of
/// them, it always goes through [`DestinationKind::S3Compatible`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectStorage {
    CloudFiles,
}

impl ObjectStorage {
    pub fn for_provider(provider: CloudProvider) -> Option<Self> {
        match provider {
            CloudProvider::CloudFiles => Some(ObjectStorage::CloudFiles),
            CloudProvider::S3 => None,
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            ObjectStorage::CloudFiles => "cf",
        }
    }

    pub fn credential_variables(&self) -> (&'static str, &'static str) {
        match self {
            ObjectStorage::CloudFiles => ("CLOUDFILES_USERNAME", "CLOUDFILES_APIKEY"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DestinationKind {
    /// e.g. `cf+http://<bucket>`.
    CloudObjectStorage(ObjectStorage),
    /// `s3+http://<bucket>/<host>/<title>/`.
    S3Compatible,
    /// Verbatim target URL, e.g. `ssh://host//path`.
    RemoteHost,
}

impl DestinationKind {
    /// Environment variable names for the id/secret pair, if the backend reads any.
    pub fn credential_variables(&self) -> Option<(&'static str, &'static str)> {
        match self {
            DestinationKind::CloudObjectStorage(storage) => Some(storage.credential_variables()),
            DestinationKind::S3Compatible => Some(("AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY")),
            DestinationKind::RemoteHost => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Destination {
    pub kind: DestinationKind,
    pub url: String,
    /// Flags every command talking to this destination must carry.
    pub extra_flags: Vec<Arg>,
}

impl TryFrom<&ResolvedJob> for Destination {
    type Error = CompileError;

    fn try_from(job: &ResolvedJob) -> Result<Self, Self::Error> {
        let storage = (*job.cloud_provider()).and_then(ObjectStorage::for_provider);
        let destination = match (job.target(), storage, job.bucket()) {
            (Some(target), _, _) => Destination {
                kind: DestinationKind::RemoteHost,
                url: target.clone(),
                extra_flags: job
                    .ssh_identity()
                    .iter()
                    .flat_map(|identity| {
                        [
                            Arg::word("--ssh-options"),
                            Arg::assign("-oIdentityFile", identity.to_string_lossy()),
                        ]
                    })
                    .collect(),
            },
            (None, Some(storage), Some(bucket)) => Destination {
                kind: DestinationKind::CloudObjectStorage(storage),
                url: format!("{}+http://{}", storage.scheme(), bucket),
                extra_flags: vec![],
            },
            (None, None, Some(bucket)) => {
                let host = job.host_identifier().as_ref().ok_or_else(|| {
                    CompileError::MissingHostIdentifier {
                        title: job.title().clone(),
                        bucket: bucket.clone(),
                    }
                })?;
                Destination {
                    kind: DestinationKind::S3Compatible,
                    url: format!("s3+http://{}/{}/{}/", bucket, host, job.title()),
                    extra_flags: vec![],
                }
            }
            (None, _, None) => {
                return Err(CompileError::MissingDestination {
                    title: job.title().clone(),
                })
            }
        };

        debug!(
            "Job {:?} writes to {:?} at {}",
            job.title(),
            destination.kind,
            destination.url
        );
        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::descriptor::{EffectiveDefaults, JobDescriptor};
    use crate::job::resolve::resolve;

    fn destination(job: JobDescriptor) -> Result<Destination, CompileError> {
        Destination::try_from(&resolve(&job, &EffectiveDefaults::default()))
    }

    #[test]
    fn test_cloud_files_destination() {
        let job = JobDescriptor::builder()
            .title("some_backup_name")
            .bucket("somebucket")
            .cloud_provider(CloudProvider::CloudFiles)
            .build();
        let destination = destination(job).unwrap();

        assert_eq!(
            destination.kind,
            DestinationKind::CloudObjectStorage(ObjectStorage::CloudFiles)
        );
        assert_eq!(destination.url, "cf+http://somebucket");
        assert!(destination.extra_flags.is_empty());
    }

    #[test]
    fn test_s3_destination() {
        let job = JobDescriptor::builder()
            .title("some_backup_name")
            .bucket("somebucket")
            .host_identifier("somehost.domaindomain.org")
            .build();
        let destination = destination(job).unwrap();

        assert_eq!(destination.kind, DestinationKind::S3Compatible);
        assert_eq!(
            destination.url,
            "s3+http://somebucket/somehost.domaindomain.org/some_backup_name/"
        );
    }

    #[test]
    fn test_explicit_s3_provider_uses_s3_layout() {
        let job = JobDescriptor::builder()
            .title("some_backup_name")
            .bucket("somebucket")
            .cloud_provider(CloudProvider::S3)
            .host_identifier("somehost.domaindomain.org")
            .build();
        assert_eq!(destination(job).unwrap().kind, DestinationKind::S3Compatible);
    }

    #[test]
    fn test_s3_provider_is_not_object_storage() {
        assert_eq!(ObjectStorage::for_provider(CloudProvider::S3), None);
        assert_eq!(
            ObjectStorage::for_provider(CloudProvider::CloudFiles),
            Some(ObjectStorage::CloudFiles)
        );
    }

    #[test]
    fn test_remote_host_destination_with_identity() {
        let job = JobDescriptor::builder()
            .title("some_backup_name")
            .target("ssh://someserver//some/dir")
            .ssh_identity("/etc/duplicity/id_rsa")
            .build();
        let destination = destination(job).unwrap();

        assert_eq!(destination.kind, DestinationKind::RemoteHost);
        assert_eq!(destination.url, "ssh://someserver//some/dir");
        assert_eq!(
            destination
                .extra_flags
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec!["--ssh-options", "-oIdentityFile='/etc/duplicity/id_rsa'"]
        );
    }

    #[test]
    fn test_remote_host_destination_without_identity() {
        let job = JobDescriptor::builder()
            .title("some_backup_name")
            .target("ssh://someserver//some/dir")
            .build();
        assert!(destination(job).unwrap().extra_flags.is_empty());
    }

    #[test]
    fn test_missing_destination() {
        let job = JobDescriptor::builder().title("some_backup_name").build();
        assert!(matches!(
            destination(job),
            Err(CompileError::MissingDestination { .. })
        ));
    }

    #[test]
    fn test_credential_variables() {
        assert_eq!(
            DestinationKind::S3Compatible.credential_variables(),
            Some(("AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"))
        );
        assert_eq!(
            DestinationKind::CloudObjectStorage(ObjectStorage::CloudFiles).credential_variables(),
            Some(("CLOUDFILES_USERNAME", "CLOUDFILES_APIKEY"))
        );
        assert_eq!(DestinationKind::RemoteHost.credential_variables(), None);
    }
}
