//! App group container resolution.

use std::path::PathBuf;

/// Maps an app group identifier to its shared container directory.
///
/// Resolution is fallible: a misconfigured host app has no container, and
/// callers must treat `None` as "store unavailable", not as an error.
pub trait ContainerResolverTrait: Send + Sync {
    fn container_path(&self, group_identifier: &str) -> Option<PathBuf>;
}

/// Resolves groups to `{root}/{groupIdentifier}`.
///
/// Only existing directories resolve, mirroring the platform, which never
/// creates a container for an entitlement the app does not have.
#[derive(Debug, Clone)]
pub struct DirectoryContainerResolver {
    root: PathBuf,
}

impl DirectoryContainerResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ContainerResolverTrait for DirectoryContainerResolver {
    fn container_path(&self, group_identifier: &str) -> Option<PathBuf> {
        let trimmed = group_identifier.trim();
        let path_like = trimmed.contains(|c: char| c == '/' || c == '\\');
        if trimmed.is_empty() || path_like || trimmed == ".." {
            return None;
        }
        let path = self.root.join(trimmed);
        path.is_dir().then_some(path)
    }
}
