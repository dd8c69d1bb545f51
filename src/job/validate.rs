//! Validation of resolved jobs.
//!
//! Structural rules run first, in a fixed order, and report the first
//! failure. Field-level checks (`validator` functions below) run last.

use crate::job::descriptor::Ensure;
use crate::job::resolve::ResolvedJob;
use crate::job::result_error::error::CompileError;
use sanitize_filename::{is_sanitized, sanitize};
use std::path::{Path, PathBuf};
use validator::{Validate, ValidationError, ValidationErrors};

static INTERVAL_UNITS: &str = "smhDWMY";

/// An absent job still names the file to remove, so its title and path are checked.
fn validate_removal(job: &ResolvedJob) -> Result<(), CompileError> {
    let mut errors = ValidationErrors::new();
    if let Err(e) = validate_title(job.title()) {
        errors.add("title", e);
    }
    if let Err(e) = validate_absolute_path(job.script_path()) {
        errors.add("script_path", e);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CompileError::InvalidField {
            title: job.title().clone(),
            errors,
        })
    }
}

pub fn validate_job(job: &ResolvedJob) -> Result<(), CompileError> {
    if *job.ensure() == Ensure::Absent {
        return validate_removal(job);
    }

    let title = job.title().clone();

    if let Some(target) = job.target() {
        if job.bucket().is_some() || job.cloud_provider().is_some() {
            return Err(CompileError::ConflictingDestination {
                title,
                target: target.clone(),
                bucket: job.bucket().clone(),
                cloud_provider: *job.cloud_provider(),
            });
        }
    }

    let bucket = match (job.target(), job.bucket()) {
        (Some(_), _) => None,
        (None, Some(bucket)) => Some(bucket),
        (None, None) => return Err(CompileError::MissingDestination { title }),
    };

    if job.directories().is_empty() {
        return Err(CompileError::MissingSource { title });
    }

    if let Some(bucket) = bucket {
        if job.dest_id().is_none() && job.dest_key().is_none() {
            return Err(CompileError::MissingCredentials {
                title,
                bucket: bucket.clone(),
            });
        }

        if job.uses_s3_layout() && job.host_identifier().is_none() {
            return Err(CompileError::MissingHostIdentifier {
                title,
                bucket: bucket.clone(),
            });
        }
    }

    job.validate()
        .map_err(|errors| CompileError::InvalidField { title, errors })
}

pub fn validate_title<S: AsRef<str>>(title: S) -> Result<(), ValidationError> {
    let title = title.as_ref();
    if title.is_empty() {
        return Err(ValidationError::new("InvalidTitle").with_message("title is empty".into()));
    }

    if !is_sanitized(title) || title.contains(char::is_whitespace) {
        return Err(ValidationError::new("InvalidTitle").with_message(
            format!(
                "title {:?} is not a valid file name, try {:?}",
                title,
                sanitize(title).replace(char::is_whitespace, "_")
            )
            .into(),
        ));
    }

    Ok(())
}

pub fn validate_absolute_path<P: AsRef<Path>>(path: P) -> Result<(), ValidationError> {
    let path = path.as_ref();
    if !path.is_absolute() {
        return Err(ValidationError::new("RelativePath")
            .with_message(format!("{:?} is not an absolute path", path).into()));
    }

    Ok(())
}

pub fn validate_absolute_paths(paths: &[PathBuf]) -> Result<(), ValidationError> {
    paths.iter().try_for_each(validate_absolute_path)
}

/// Accepts `now` or one or more `<digits><unit>` groups, e.g. `30D` or `1h30m`.
pub fn validate_interval<S: AsRef<str>>(interval: S) -> Result<(), ValidationError> {
    let interval = interval.as_ref();
    if interval == "now" || is_interval(interval) {
        return Ok(());
    }

    Err(ValidationError::new("InvalidInterval")
        .with_message(format!("invalid duplicity interval: {interval:?}").into()))
}

fn is_interval(interval: &str) -> bool {
    let mut digits = 0;
    let mut groups = 0;
    for c in interval.chars() {
        if c.is_ascii_digit() {
            digits += 1;
        } else if digits > 0 && INTERVAL_UNITS.contains(c) {
            digits = 0;
            groups += 1;
        } else {
            return false;
        }
    }

    digits == 0 && groups > 0
}

/// Short, long and fingerprint key ids: 8, 16 or 40 hex digits.
pub fn validate_key_ids(ids: &[String]) -> Result<(), ValidationError> {
    match ids
        .iter()
        .find(|id| !matches!(id.len(), 8 | 16 | 40) || !id.chars().all(|c| c.is_ascii_hexdigit()))
    {
        None => Ok(()),
        Some(id) => Err(ValidationError::new("InvalidKeyId")
            .with_message(format!("{id:?} is not a 8, 16 or 40 digit hex key id").into())),
    }
}

pub fn validate_keyserver<S: AsRef<str>>(keyserver: S) -> Result<(), ValidationError> {
    let keyserver = keyserver.as_ref();
    if keyserver.is_empty()
        || !keyserver
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ".-:/".contains(c))
    {
        return Err(ValidationError::new("InvalidKeyserver")
            .with_message(format!("invalid keyserver: {keyserver:?}").into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::descriptor::{CloudProvider, EffectiveDefaults, JobDescriptor};
    use crate::job::resolve::resolve;
    use crate::job::setting::Setting;
    use rstest::rstest;

    fn defaults() -> EffectiveDefaults {
        EffectiveDefaults::default()
    }

    fn bucket_job() -> JobDescriptor {
        JobDescriptor::builder()
            .title("some_backup_name")
            .directories(vec!["/etc/".into()])
            .bucket("somebucket")
            .dest_id("some_id")
            .dest_key("some_key")
            .host_identifier("somehost.domaindomain.org")
            .build()
    }

    fn check(job: JobDescriptor) -> Result<(), CompileError> {
        validate_job(&resolve(&job, &defaults()))
    }

    #[test]
    fn test_valid_bucket_job() {
        assert_eq!(check(bucket_job()), Ok(()));
    }

    #[test]
    fn test_absent_job_skips_structural_checks() {
        let job = JobDescriptor::builder()
            .title("gone")
            .ensure(Ensure::Absent)
            .target("ssh://someserver//some/dir")
            .bucket("somebucket")
            .build();
        assert_eq!(check(job), Ok(()));
    }

    #[test]
    fn test_absent_job_rejects_path_traversal_title() {
        let job = JobDescriptor::builder()
            .title("../../../etc/cron.daily/backup")
            .ensure(Ensure::Absent)
            .build();

        match check(job) {
            Err(CompileError::InvalidField { errors, .. }) => {
                assert!(errors.field_errors().contains_key("title"))
            }
            other => panic!("Expected InvalidField, got {other:?}"),
        }
    }

    #[test]
    fn test_absent_job_rejects_relative_script_path() {
        let job = JobDescriptor::builder()
            .title("gone")
            .ensure(Ensure::Absent)
            .script_path("spool/gone.sh")
            .build();
        assert!(matches!(check(job), Err(CompileError::InvalidField { .. })));
    }

    #[test]
    fn test_unsafe_keyserver_is_invalid() {
        let job = JobDescriptor::builder()
            .title("some_backup_name")
            .directories(vec!["/etc/".into()])
            .target("ssh://someserver//some/dir")
            .pubkey_ids(vec!["15ABDA79".into()])
            .build();
        let defaults = EffectiveDefaults::builder()
            .keyserver("k.org; rm -rf /")
            .build();

        match validate_job(&resolve(&job, &defaults)) {
            Err(CompileError::InvalidField { errors, .. }) => {
                assert!(errors.field_errors().contains_key("keyserver"))
            }
            other => panic!("Expected InvalidField, got {other:?}"),
        }
    }

    #[test]
    fn test_target_and_bucket_conflict() {
        let job = JobDescriptor::builder()
            .title("some_backup_name")
            .directories(vec!["/root/mysqldump".into()])
            .target("ssh://someserver//some/dir")
            .bucket("somebucket")
            .dest_id("some_id")
            .dest_key("some_key")
            .build();

        match check(job) {
            Err(CompileError::ConflictingDestination { title, target, bucket, .. }) => {
                assert_eq!(title, "some_backup_name");
                assert_eq!(target, "ssh://someserver//some/dir");
                assert_eq!(bucket.as_deref(), Some("somebucket"));
            }
            other => panic!("Expected ConflictingDestination, got {other:?}"),
        }
    }

    #[test]
    fn test_target_and_cloud_provider_conflict() {
        let job = JobDescriptor::builder()
            .title("some_backup_name")
            .directories(vec!["/etc/".into()])
            .target("ssh://someserver//some/dir")
            .cloud_provider(CloudProvider::CloudFiles)
            .build();
        assert!(matches!(
            check(job),
            Err(CompileError::ConflictingDestination { .. })
        ));
    }

    #[test]
    fn test_target_with_disabled_bucket_is_fine() {
        let job = JobDescriptor::builder()
            .title("some_backup_name")
            .directories(vec!["/etc/".into()])
            .target("ssh://someserver//some/dir")
            .bucket(Setting::Disabled)
            .cloud_provider(Setting::Disabled)
            .build();
        let defaults = EffectiveDefaults::builder().bucket("default").build();
        assert_eq!(validate_job(&resolve(&job, &defaults)), Ok(()));
    }

    #[test]
    fn test_missing_destination() {
        let job = JobDescriptor::builder()
            .title("some_backup_name")
            .directories(vec!["/etc/".into()])
            .build();
        assert!(matches!(
            check(job),
            Err(CompileError::MissingDestination { .. })
        ));
    }

    #[test]
    fn test_cloud_provider_without_bucket_is_missing_destination() {
        let job = JobDescriptor::builder()
            .title("some_backup_name")
            .directories(vec!["/etc/".into()])
            .cloud_provider(CloudProvider::CloudFiles)
            .dest_id("some_id")
            .build();
        assert!(matches!(
            check(job),
            Err(CompileError::MissingDestination { .. })
        ));
    }

    #[test]
    fn test_missing_source() {
        let job = JobDescriptor::builder()
            .title("some_backup_name")
            .bucket("somebucket")
            .dest_id("some_id")
            .build();
        assert!(matches!(check(job), Err(CompileError::MissingSource { .. })));
    }

    #[test]
    fn test_missing_credentials() {
        let job = JobDescriptor::builder()
            .title("some_backup_name")
            .directories(vec!["/etc/".into()])
            .bucket("somebucket")
            .host_identifier("somehost")
            .build();

        match check(job) {
            Err(CompileError::MissingCredentials { bucket, .. }) => {
                assert_eq!(bucket, "somebucket")
            }
            other => panic!("Expected MissingCredentials, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_host_identifier() {
        let job = JobDescriptor::builder()
            .title("some_backup_name")
            .directories(vec!["/etc/".into()])
            .bucket("somebucket")
            .dest_id("some_id")
            .dest_key("some_key")
            .build();
        assert!(matches!(
            check(job),
            Err(CompileError::MissingHostIdentifier { .. })
        ));
    }

    #[test]
    fn test_rule_order_conflict_before_missing_source() {
        let job = JobDescriptor::builder()
            .title("some_backup_name")
            .target("ssh://someserver//some/dir")
            .bucket("somebucket")
            .build();
        assert!(matches!(
            check(job),
            Err(CompileError::ConflictingDestination { .. })
        ));
    }

    #[test]
    fn test_relative_directory_is_invalid() {
        let job = JobDescriptor::builder()
            .title("some_backup_name")
            .directories(vec!["etc".into()])
            .target("ssh://someserver//some/dir")
            .build();
        assert!(matches!(check(job), Err(CompileError::InvalidField { .. })));
    }

    #[rstest]
    #[case("30D", true)]
    #[case("5D", true)]
    #[case("1h30m", true)]
    #[case("1Y", true)]
    #[case("now", true)]
    #[case("", false)]
    #[case("D", false)]
    #[case("30", false)]
    #[case("30d", false)]
    #[case("30D; rm -rf /", false)]
    fn test_validate_interval(#[case] interval: &str, #[case] valid: bool) {
        assert_eq!(validate_interval(interval).is_ok(), valid);
    }

    #[rstest]
    #[case("15ABDA79", true)]
    #[case("0123456789ABCDEF", true)]
    #[case("0123456789abcdef0123456789abcdef01234567", true)]
    #[case("15ABDA7", false)]
    #[case("15ABDA7Z", false)]
    #[case("15AB DA79", false)]
    fn test_validate_key_ids(#[case] id: &str, #[case] valid: bool) {
        assert_eq!(validate_key_ids(&[id.to_string()]).is_ok(), valid);
    }

    #[rstest]
    #[case("some_backup_name", true)]
    #[case("db-nightly.1", true)]
    #[case("", false)]
    #[case("a/b", false)]
    #[case("two words", false)]
    fn test_validate_title(#[case] title: &str, #[case] valid: bool) {
        assert_eq!(validate_title(title).is_ok(), valid);
    }

    #[test]
    fn test_validate_absolute_paths() {
        assert!(validate_absolute_paths(&["/etc/".into(), "/var/".into()]).is_ok());
        assert!(validate_absolute_paths(&["/etc/".into(), "var".into()]).is_err());
    }
}
