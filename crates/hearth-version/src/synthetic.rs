use std::path::Path;

use time::OffsetDateTime;

use crate::error::Result;
use crate::repo::{GitRepository, SourceRepository};

/// Formats a synthetic version `"{major}.{YYMMDD}.{HMM}-H{hash}"`.
///
/// The time component is the zero-padded `HHMM` with leading zeros dropped, or
/// `"0"` at midnight. The date lands in the minor slot as six digits; decode it
/// with [`crate::DateEncoding::Short`].
pub fn date_commit_version(major: u64, hash: &str, now: OffsetDateTime) -> String {
    let day = format!(
        "{:02}{:02}{:02}",
        now.year().rem_euclid(100),
        u8::from(now.month()),
        now.day()
    );
    let hour_minute = format!("{:02}{:02}", now.hour(), now.minute());
    let mut time = hour_minute.trim_start_matches('0');
    if time.is_empty() {
        time = "0";
    }
    format!("{major}.{day}.{time}-H{hash}")
}

/// Builds a synthetic version from the abbreviated head commit of `repository`.
pub fn generate_from_repository(
    repository: &impl SourceRepository,
    major: u64,
    now: OffsetDateTime,
) -> Result<String> {
    let hash = repository.head_commit_hash(true)?;
    let version = date_commit_version(major, &hash, now);
    tracing::debug!(target = "hearth.version", version = %version, "generated date/commit version");
    Ok(version)
}

/// Opens the git repository at `repo_path` and builds a synthetic version from its head.
pub fn generate_date_commit_version(
    repo_path: &Path,
    major: u64,
    now: OffsetDateTime,
) -> Result<String> {
    let repository = GitRepository::open(repo_path)?;
    generate_from_repository(&repository, major, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VersionError;
    use time::{Date, Month};

    fn at(year: i32, month: Month, day: u8, hour: u8, minute: u8, second: u8) -> OffsetDateTime {
        Date::from_calendar_date(year, month, day)
            .unwrap()
            .with_hms(hour, minute, second)
            .unwrap()
            .assume_utc()
    }

    struct FixedHead(&'static str);

    impl SourceRepository for FixedHead {
        fn head_commit_hash(&self, short: bool) -> Result<String> {
            assert!(short, "synthetic versions use the abbreviated hash");
            Ok(self.0.to_owned())
        }
    }

    struct NoHead;

    impl SourceRepository for NoHead {
        fn head_commit_hash(&self, _short: bool) -> Result<String> {
            Err(VersionError::HeadCommit {
                path: "repo".into(),
                source: git2::Error::from_str("reference 'refs/heads/main' not found"),
            })
        }
    }

    #[test]
    fn midnight_collapses_to_zero() {
        assert_eq!(
            date_commit_version(42, "68cdd17", at(2006, Month::January, 2, 0, 0, 0)),
            "42.060102.0-H68cdd17"
        );
    }

    #[test]
    fn drops_leading_zero_of_hour() {
        assert_eq!(
            date_commit_version(42, "68cdd17", at(2006, Month::January, 2, 3, 4, 5)),
            "42.060102.304-H68cdd17"
        );
    }

    #[test]
    fn keeps_inner_zeros() {
        assert_eq!(
            date_commit_version(1, "abc", at(2026, Month::October, 16, 10, 0, 59)),
            "1.261016.1000-Habc"
        );
        assert_eq!(
            date_commit_version(1, "abc", at(2026, Month::October, 16, 0, 7, 0)),
            "1.261016.7-Habc"
        );
    }

    #[test]
    fn generates_from_repository_head() {
        let version =
            generate_from_repository(&FixedHead("68cdd17"), 7, at(2026, Month::October, 16, 23, 59, 0))
                .unwrap();
        assert_eq!(version, "7.261016.2359-H68cdd17");
        assert!(crate::Version::parse(&version).is_ok());
    }

    #[test]
    fn missing_head_is_an_error() {
        let err = generate_from_repository(&NoHead, 1, OffsetDateTime::UNIX_EPOCH).unwrap_err();
        assert!(matches!(err, VersionError::HeadCommit { .. }), "{err}");
    }
}
