use std::collections::HashSet;
use tracing::debug;

use crate::common::error::GitGroupError;
use crate::common::result::GitGroupResult;
use crate::domain::entities::registry::RepositoryCatalog;
use crate::domain::entities::repository::Repository;

/// グループ名の列を実行対象リポジトリの列に展開する
pub struct GroupResolver<'a> {
    catalog: &'a dyn RepositoryCatalog,
}

impl<'a> GroupResolver<'a> {
    pub fn new(catalog: &'a dyn RepositoryCatalog) -> Self {
        Self { catalog }
    }

    /// 要求順にメンバーを連結し、最初の出現順を保って重複を除く
    ///
    /// 未定義のグループやリポジトリが1つでもあれば部分的な結果は返さない。
    pub fn resolve<S: AsRef<str>>(&self, groups: &[S]) -> GitGroupResult<Vec<Repository>> {
        if groups.is_empty() {
            return Err(GitGroupError::validation_error(
                "groups",
                "at least one group is required",
                None,
            ));
        }

        let mut seen = HashSet::new();
        let mut targets = Vec::new();

        for group in groups {
            let group = group.as_ref();
            let members = self
                .catalog
                .group_members(group)
                .ok_or_else(|| GitGroupError::group_not_found(group))?;

            for member in members {
                if !seen.insert(member.as_str()) {
                    continue;
                }
                let path = self
                    .catalog
                    .repository_path(member)
                    .ok_or_else(|| GitGroupError::repository_not_found(member, group))?;
                targets.push(Repository::new(member.clone(), path));
            }
        }

        if targets.is_empty() {
            let requested: Vec<String> = groups.iter().map(|g| g.as_ref().to_string()).collect();
            return Err(GitGroupError::no_targets(&requested));
        }

        debug!(
            targets = ?targets.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            "resolved groups"
        );
        Ok(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::registry::RepositoryRegistry;
    use pretty_assertions::assert_eq;

    fn names(repos: &[Repository]) -> Vec<&str> {
        repos.iter().map(|r| r.name.as_str()).collect()
    }

    fn members(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn registry() -> RepositoryRegistry {
        RepositoryRegistry::new()
            .with_repository("web", "/src/web")
            .with_repository("mobile", "/src/mobile")
            .with_repository("api", "/src/api")
            .with_group("frontend", members(&["web", "mobile"]))
            .with_group("backend", members(&["api"]))
            .with_group("all", members(&["api", "web", "mobile"]))
            .with_group("empty", Vec::new())
    }

    #[test]
    fn test_union_in_request_order() {
        let registry = registry();
        let targets = GroupResolver::new(&registry)
            .resolve(&["frontend", "backend"])
            .unwrap();
        assert_eq!(names(&targets), vec!["web", "mobile", "api"]);
        assert_eq!(targets[2].path, std::path::PathBuf::from("/src/api"));
    }

    #[test]
    fn test_same_group_twice_has_no_duplicates() {
        let registry = registry();
        let targets = GroupResolver::new(&registry)
            .resolve(&["frontend", "frontend"])
            .unwrap();
        assert_eq!(names(&targets), vec!["web", "mobile"]);
    }

    #[test]
    fn test_overlapping_groups_keep_first_seen_order() {
        let registry = registry();
        let targets = GroupResolver::new(&registry)
            .resolve(&["backend", "all", "frontend"])
            .unwrap();
        assert_eq!(names(&targets), vec!["api", "web", "mobile"]);
    }

    #[test]
    fn test_unknown_group_fails_without_partial_result() {
        let registry = registry();
        let error = GroupResolver::new(&registry)
            .resolve(&["frontend", "nope"])
            .unwrap_err();
        assert!(matches!(error, GitGroupError::GroupNotFound { ref group } if group == "nope"));
        assert!(error.is_configuration_error());
    }

    #[test]
    fn test_undefined_member_is_configuration_error() {
        let registry = registry().with_group("broken", members(&["web", "ghost"]));
        let error = GroupResolver::new(&registry).resolve(&["broken"]).unwrap_err();
        assert!(matches!(
            error,
            GitGroupError::RepositoryNotFound { ref repository, ref group }
                if repository == "ghost" && group == "broken"
        ));
    }

    #[test]
    fn test_empty_group_yields_no_targets() {
        let registry = registry();
        let error = GroupResolver::new(&registry).resolve(&["empty"]).unwrap_err();
        assert!(matches!(error, GitGroupError::NoTargets { .. }));
    }

    #[test]
    fn test_empty_request_is_validation_error() {
        let registry = registry();
        let error = GroupResolver::new(&registry)
            .resolve::<&str>(&[])
            .unwrap_err();
        assert!(matches!(error, GitGroupError::ValidationError { .. }));
    }
}
