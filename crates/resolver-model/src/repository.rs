/// A configured remote repository. Shared between `resolver-descriptor`
/// (POM/metadata fetch) and `resolver-transport` (artifact download) so both
/// collaborators agree on identity and URL layout without depending on each
/// other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepository {
    pub id: String,
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Whether this repository hosts snapshots in addition to releases.
    pub snapshots_enabled: bool,
    /// Whether the endpoint is known to be a repository manager (Nexus,
    /// Artifactory) as opposed to a plain static file server; affects which
    /// `simpleLrmInterop` behaviors are safe to assume.
    pub is_repository_manager: bool,
}

impl RemoteRepository {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into().trim_end_matches('/').to_string(),
            username: None,
            password: None,
            snapshots_enabled: true,
            is_repository_manager: false,
        }
    }

    pub fn maven_central() -> Self {
        Self::new("central", "https://repo.maven.apache.org/maven2")
    }

    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn has_auth(&self) -> bool {
        self.username.is_some()
    }

    /// Standard Maven layout path for a coordinate:
    /// `org.example:lib:1.0` -> `org/example/lib/1.0`.
    pub fn coordinate_path(group_id: &str, artifact_id: &str, version: &str) -> String {
        format!("{}/{}/{}", group_id.replace('.', "/"), artifact_id, version)
    }

    pub fn file_url(&self, group_id: &str, artifact_id: &str, version: &str, filename: &str) -> String {
        format!(
            "{}/{}/{}",
            self.url,
            Self::coordinate_path(group_id, artifact_id, version),
            filename
        )
    }

    /// A `(url, is_repository_manager)` key used to group resolution
    /// requests targeting the same physical endpoint.
    pub fn grouping_key(&self) -> (String, bool) {
        (self.url.clone(), self.is_repository_manager)
    }
}

impl std::fmt::Display for RemoteRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.url)
    }
}
