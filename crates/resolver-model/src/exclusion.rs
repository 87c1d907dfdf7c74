use crate::artifact::Artifact;

/// A pattern matching transitive dependencies to drop. Each field is either
/// a literal or the wildcard `"*"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Exclusion {
    pub group_id: String,
    pub artifact_id: String,
    pub classifier: String,
    pub extension: String,
}

impl Exclusion {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            classifier: "*".to_string(),
            extension: "*".to_string(),
        }
    }

    /// Whether `artifact` matches this exclusion pattern, field by field.
    pub fn matches(&self, artifact: &Artifact) -> bool {
        field_matches(&self.group_id, &artifact.group_id)
            && field_matches(&self.artifact_id, &artifact.artifact_id)
            && field_matches(&self.classifier, &artifact.classifier)
            && field_matches(&self.extension, &artifact.extension)
    }
}

fn field_matches(pattern: &str, value: &str) -> bool {
    pattern == "*" || pattern == value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_artifact_matches_any() {
        let excl = Exclusion::new("org.example", "*");
        let a = Artifact::new("org.example", "anything", "1.0");
        assert!(excl.matches(&a));
    }

    #[test]
    fn mismatched_group_does_not_match() {
        let excl = Exclusion::new("org.example", "lib");
        let a = Artifact::new("org.other", "lib", "1.0");
        assert!(!excl.matches(&a));
    }

    #[test]
    fn exact_match() {
        let excl = Exclusion::new("org.example", "lib");
        let a = Artifact::new("org.example", "lib", "1.0");
        assert!(excl.matches(&a));
    }
}
