//! URL construction for Maven layout paths this crate needs that
//! [`resolver_model::RemoteRepository`] doesn't carry itself (it only owns
//! `file_url`/`coordinate_path`, shared with `resolver-transport`).

use resolver_model::RemoteRepository;

pub fn pom_url(repo: &RemoteRepository, group_id: &str, artifact_id: &str, version: &str) -> String {
    repo.file_url(group_id, artifact_id, version, &format!("{artifact_id}-{version}.pom"))
}

pub fn metadata_url(repo: &RemoteRepository, group_id: &str, artifact_id: &str) -> String {
    format!(
        "{}/{}/{}/maven-metadata.xml",
        repo.url,
        group_id.replace('.', "/"),
        artifact_id
    )
}

pub fn snapshot_metadata_url(
    repo: &RemoteRepository,
    group_id: &str,
    artifact_id: &str,
    version: &str,
) -> String {
    repo.file_url(group_id, artifact_id, version, "maven-metadata.xml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pom_url_follows_maven_layout() {
        let repo = RemoteRepository::maven_central();
        let url = pom_url(&repo, "org.example", "lib", "1.0");
        assert_eq!(
            url,
            "https://repo.maven.apache.org/maven2/org/example/lib/1.0/lib-1.0.pom"
        );
    }

    #[test]
    fn metadata_url_omits_version() {
        let repo = RemoteRepository::maven_central();
        let url = metadata_url(&repo, "org.example", "lib");
        assert_eq!(
            url,
            "https://repo.maven.apache.org/maven2/org/example/lib/maven-metadata.xml"
        );
    }
}
