use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::group::Group;

/// リポジトリ名とグループ名の参照を提供する設定プロバイダ
///
/// 解決処理はこのトレイトだけに依存し、設定ファイルの形式を知らない。
pub trait RepositoryCatalog: Send + Sync {
    /// グループのメンバー名を定義順で返す（未定義なら `None`）
    fn group_members(&self, group: &str) -> Option<&[String]>;

    /// リポジトリの絶対パスを返す（未定義なら `None`）
    fn repository_path(&self, repository: &str) -> Option<&Path>;
}

/// 静的なリポジトリ・グループの登録簿
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryRegistry {
    repositories: BTreeMap<String, PathBuf>,
    groups: BTreeMap<String, Group>,
}

impl RepositoryRegistry {
    /// 空のレジストリを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// リポジトリを登録
    pub fn with_repository(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.insert_repository(name, path);
        self
    }

    /// グループを登録
    pub fn with_group(mut self, name: impl Into<String>, members: Vec<String>) -> Self {
        let name = name.into();
        self.groups.insert(name.clone(), Group::new(name, members));
        self
    }

    pub fn insert_repository(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.repositories.insert(name.into(), path.into());
    }

    /// 名前順のグループ一覧
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }
}

impl RepositoryCatalog for RepositoryRegistry {
    fn group_members(&self, group: &str) -> Option<&[String]> {
        self.groups.get(group).map(|g| g.members.as_slice())
    }

    fn repository_path(&self, repository: &str) -> Option<&Path> {
        self.repositories.get(repository).map(PathBuf::as_path)
    }
}
