//! The local repository: an on-disk mirror of every artifact and POM this
//! resolver has ever fetched, keyed by Maven layout, plus a per-artifact
//! tracking file recording which remote repository it came from and when it
//! was last checked for updates.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use resolver_util::errors::ResolverError;

/// Governs when a cached artifact is re-checked against its remote
/// repository, parsed from `artifactResolver.updatePolicy`
/// (`always|never|daily|interval:N`, N in minutes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePolicy {
    Always,
    Never,
    Daily,
    Interval(u64),
}

impl UpdatePolicy {
    pub fn parse(s: &str) -> Self {
        if let Some(n) = s.strip_prefix("interval:") {
            if let Ok(minutes) = n.parse::<u64>() {
                return UpdatePolicy::Interval(minutes);
            }
        }
        match s {
            "always" => UpdatePolicy::Always,
            "never" => UpdatePolicy::Never,
            _ => UpdatePolicy::Daily,
        }
    }

    /// Whether, given the tracking record's `last_checked`, this artifact
    /// should be re-checked against the remote right now.
    pub fn should_check(&self, last_checked: Option<u64>, now: u64) -> bool {
        let Some(last) = last_checked else {
            return true;
        };
        match self {
            UpdatePolicy::Always => true,
            UpdatePolicy::Never => false,
            UpdatePolicy::Daily => now.saturating_sub(last) >= 24 * 60 * 60,
            UpdatePolicy::Interval(minutes) => now.saturating_sub(last) >= minutes * 60,
        }
    }
}

/// Per-artifact tracking record, persisted as a `.tracking.json` sidecar
/// next to the cached file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TrackingRecord {
    pub origin_repository_id: String,
    pub last_checked_epoch_secs: u64,
}

/// Result of a local-repository lookup, mirroring the core's
/// `LocalArtifactResult` contract: whether the artifact is considered
/// locally installed, and the path it would live at either way.
#[derive(Debug, Clone)]
pub struct LocalArtifactResult {
    pub file: PathBuf,
    pub available: bool,
    pub tracking: Option<TrackingRecord>,
}

/// On-disk local repository, rooted wherever the session's
/// `local_repository_path` points.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_dir(&self, group_id: &str, artifact_id: &str, version: &str) -> PathBuf {
        self.root.join(group_id.replace('.', "/")).join(artifact_id).join(version)
    }

    fn artifact_path(&self, group_id: &str, artifact_id: &str, version: &str, filename: &str) -> PathBuf {
        self.artifact_dir(group_id, artifact_id, version).join(filename)
    }

    fn tracking_path(&self, group_id: &str, artifact_id: &str, version: &str, filename: &str) -> PathBuf {
        self.artifact_dir(group_id, artifact_id, version)
            .join(format!("{filename}.tracking.json"))
    }

    /// Locate an artifact file in the local repository without fetching.
    pub fn find(&self, group_id: &str, artifact_id: &str, version: &str, filename: &str) -> LocalArtifactResult {
        let path = self.artifact_path(group_id, artifact_id, version, filename);
        let available = path.is_file();
        let tracking = self.read_tracking(group_id, artifact_id, version, filename);
        LocalArtifactResult {
            file: path,
            available,
            tracking,
        }
    }

    fn read_tracking(&self, group_id: &str, artifact_id: &str, version: &str, filename: &str) -> Option<TrackingRecord> {
        let path = self.tracking_path(group_id, artifact_id, version, filename);
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Store `data` under the artifact's Maven-layout path and record
    /// provenance in its tracking sidecar.
    pub fn add(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        filename: &str,
        data: &[u8],
        origin_repository_id: &str,
    ) -> Result<PathBuf, ResolverError> {
        let dir = self.artifact_dir(group_id, artifact_id, version);
        fs::create_dir_all(&dir).map_err(ResolverError::from)?;
        let path = dir.join(filename);
        fs::write(&path, data).map_err(ResolverError::from)?;

        let tracking = TrackingRecord {
            origin_repository_id: origin_repository_id.to_string(),
            last_checked_epoch_secs: now_epoch_secs(),
        };
        let tracking_path = self.tracking_path(group_id, artifact_id, version, filename);
        let json = serde_json::to_string_pretty(&tracking).map_err(|e| ResolverError::Generic {
            message: format!("failed to serialize tracking record: {e}"),
        })?;
        fs::write(&tracking_path, json).map_err(ResolverError::from)?;

        Ok(path)
    }

    /// Touch the tracking record's `last_checked` without changing the
    /// cached data, matching spec.md §4.6 step 9's "still touch the
    /// update-check so subsequent attempts honor the policy" rule for
    /// failed re-fetches.
    pub fn touch_checked(&self, group_id: &str, artifact_id: &str, version: &str, filename: &str) -> Result<(), ResolverError> {
        let existing = self
            .read_tracking(group_id, artifact_id, version, filename)
            .map(|t| t.origin_repository_id)
            .unwrap_or_default();
        let tracking = TrackingRecord {
            origin_repository_id: existing,
            last_checked_epoch_secs: now_epoch_secs(),
        };
        let dir = self.artifact_dir(group_id, artifact_id, version);
        fs::create_dir_all(&dir).map_err(ResolverError::from)?;
        let tracking_path = self.tracking_path(group_id, artifact_id, version, filename);
        let json = serde_json::to_string_pretty(&tracking).map_err(|e| ResolverError::Generic {
            message: format!("failed to serialize tracking record: {e}"),
        })?;
        fs::write(&tracking_path, json).map_err(ResolverError::from)?;
        Ok(())
    }

    /// Copy an externally-built artifact into the local repository, the
    /// thin `install` mirror this resolver ships instead of a full
    /// publish/deploy pipeline.
    pub fn install(&self, group_id: &str, artifact_id: &str, version: &str, filename: &str, source: &Path) -> Result<PathBuf, ResolverError> {
        let data = fs::read(source).map_err(ResolverError::from)?;
        self.add(group_id, artifact_id, version, filename, &data, "local-install")
    }

    /// Remove cached version directories not present in `keep`
    /// (`(group_id, artifact_id, version)` triples). Returns the number of
    /// version directories removed.
    pub fn prune(&self, keep: &HashSet<(String, String, String)>) -> u32 {
        let mut removed = 0;
        if self.root.is_dir() {
            collect_version_dirs(&self.root, &self.root, keep, &mut removed);
        }
        removed
    }
}

fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

fn collect_version_dirs(root: &Path, current: &Path, keep: &HashSet<(String, String, String)>, removed: &mut u32) {
    let Ok(entries) = fs::read_dir(current) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let has_files = fs::read_dir(&path)
            .map(|rd| rd.flatten().any(|e| e.path().is_file()))
            .unwrap_or(false);

        if has_files {
            if let Some(coord) = reconstruct_coordinate(root, &path) {
                if !keep.contains(&coord) {
                    let _ = fs::remove_dir_all(&path);
                    *removed += 1;
                }
            }
        } else {
            collect_version_dirs(root, &path, keep, removed);
            if fs::read_dir(&path).map(|mut rd| rd.next().is_none()).unwrap_or(true) {
                let _ = fs::remove_dir(&path);
            }
        }
    }
}

fn reconstruct_coordinate(root: &Path, version_dir: &Path) -> Option<(String, String, String)> {
    let rel = version_dir.strip_prefix(root).ok()?;
    let components: Vec<_> = rel.components().map(|c| c.as_os_str().to_string_lossy().to_string()).collect();
    if components.len() < 3 {
        return None;
    }
    let version = components.last()?.clone();
    let artifact = components[components.len() - 2].clone();
    let group = components[..components.len() - 2].join(".");
    Some((group, artifact, version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_find_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = LocalRepository::new(tmp.path());

        repo.add("org.example", "lib", "1.0", "lib-1.0.jar", b"data", "central")
            .unwrap();

        let result = repo.find("org.example", "lib", "1.0", "lib-1.0.jar");
        assert!(result.available);
        assert_eq!(result.tracking.unwrap().origin_repository_id, "central");
    }

    #[test]
    fn find_missing_reports_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = LocalRepository::new(tmp.path());
        let result = repo.find("com.missing", "lib", "1.0", "lib-1.0.jar");
        assert!(!result.available);
        assert!(result.tracking.is_none());
    }

    #[test]
    fn layout_mirrors_maven() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = LocalRepository::new(tmp.path());
        repo.add("org.jetbrains.kotlin", "kotlin-stdlib", "2.3.0", "kotlin-stdlib-2.3.0.jar", b"x", "central")
            .unwrap();
        let expected = tmp.path().join("org/jetbrains/kotlin/kotlin-stdlib/2.3.0/kotlin-stdlib-2.3.0.jar");
        assert!(expected.is_file());
    }

    #[test]
    fn prune_removes_stale_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = LocalRepository::new(tmp.path());

        repo.add("org.example", "lib", "1.0", "lib-1.0.jar", b"old", "central").unwrap();
        repo.add("org.example", "lib", "2.0", "lib-2.0.jar", b"new", "central").unwrap();
        repo.add("org.other", "util", "3.0", "util-3.0.jar", b"keep", "central").unwrap();

        let mut keep = HashSet::new();
        keep.insert(("org.example".to_string(), "lib".to_string(), "2.0".to_string()));
        keep.insert(("org.other".to_string(), "util".to_string(), "3.0".to_string()));

        let pruned = repo.prune(&keep);
        assert_eq!(pruned, 1);
        assert!(!repo.find("org.example", "lib", "1.0", "lib-1.0.jar").available);
        assert!(repo.find("org.example", "lib", "2.0", "lib-2.0.jar").available);
    }

    #[test]
    fn update_policy_parsing() {
        assert_eq!(UpdatePolicy::parse("always"), UpdatePolicy::Always);
        assert_eq!(UpdatePolicy::parse("never"), UpdatePolicy::Never);
        assert_eq!(UpdatePolicy::parse("daily"), UpdatePolicy::Daily);
        assert_eq!(UpdatePolicy::parse("interval:30"), UpdatePolicy::Interval(30));
        assert_eq!(UpdatePolicy::parse("garbage"), UpdatePolicy::Daily);
    }

    #[test]
    fn never_policy_never_rechecks() {
        assert!(!UpdatePolicy::Never.should_check(Some(0), 1_000_000));
    }

    #[test]
    fn always_policy_always_rechecks() {
        assert!(UpdatePolicy::Always.should_check(Some(1_000_000), 1_000_000));
    }

    #[test]
    fn daily_policy_respects_window() {
        let now = 100_000;
        assert!(!UpdatePolicy::Daily.should_check(Some(now - 60), now));
        assert!(UpdatePolicy::Daily.should_check(Some(now - 25 * 60 * 60), now));
    }

    #[test]
    fn missing_tracking_record_always_triggers_check() {
        assert!(UpdatePolicy::Daily.should_check(None, 0));
    }

    #[test]
    fn touch_checked_preserves_origin_repository() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = LocalRepository::new(tmp.path());
        repo.add("org.example", "lib", "1.0", "lib-1.0.jar", b"data", "central").unwrap();
        repo.touch_checked("org.example", "lib", "1.0", "lib-1.0.jar").unwrap();
        let result = repo.find("org.example", "lib", "1.0", "lib-1.0.jar");
        assert_eq!(result.tracking.unwrap().origin_repository_id, "central");
    }
}
