use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 作業ツリーの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryStatus {
    /// 変更なし
    Clean,
    /// 未コミットの変更あり
    Modified,
    /// パスが無効、またはステータス取得に失敗
    Error,
}

/// リポジトリエンティティ
///
/// 解決時にレジストリから生成され、ステータス確認の後にのみ更新される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    /// リポジトリ名（一意キー）
    pub name: String,

    /// 絶対パス
    pub path: PathBuf,

    /// パスが存在し、リポジトリのルートとして認識できるか
    pub is_valid: bool,

    /// 現在のブランチ名（判定できない場合は空文字）
    pub branch: String,

    /// 作業ツリーの状態
    pub status: RepositoryStatus,

    /// 追加・未追跡ファイル数
    pub created_files: usize,

    /// 変更・リネームされたファイル数
    pub modified_files: usize,

    /// 削除されたファイル数
    pub deleted_files: usize,
}

impl Repository {
    /// 新しいRepositoryインスタンスを作成
    ///
    /// `is_valid` はこの時点でファイルシステムを見て決定する。
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_valid = is_repository_root(&path);
        Self {
            name: name.into(),
            path,
            is_valid,
            branch: String::new(),
            status: if is_valid {
                RepositoryStatus::Clean
            } else {
                RepositoryStatus::Error
            },
            created_files: 0,
            modified_files: 0,
            deleted_files: 0,
        }
    }

    /// 変更件数を設定し、状態を再分類する
    pub fn with_file_changes(mut self, created: usize, modified: usize, deleted: usize) -> Self {
        self.created_files = created;
        self.modified_files = modified;
        self.deleted_files = deleted;
        self.status = if !self.is_valid {
            RepositoryStatus::Error
        } else if self.total_changes() == 0 {
            RepositoryStatus::Clean
        } else {
            RepositoryStatus::Modified
        };
        self
    }

    /// ブランチ名を設定
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// エラー状態に設定
    pub fn mark_error(&mut self) {
        self.status = RepositoryStatus::Error;
    }

    /// 変更ファイルの合計
    pub fn total_changes(&self) -> usize {
        self.created_files + self.modified_files + self.deleted_files
    }
}

/// ディレクトリが存在し `.git` を持つか
///
/// `.git` はworktreeやsubmoduleではファイルになるため、種別は問わない。
pub fn is_repository_root(path: &Path) -> bool {
    path.is_dir() && path.join(".git").exists()
}
