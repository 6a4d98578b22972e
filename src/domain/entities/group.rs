use serde::{Deserialize, Serialize};

/// グループの定義
///
/// 順序付きのリポジトリ名リスト。実行中は不変。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// グループ名（一意キー）
    pub name: String,

    /// メンバーのリポジトリ名（定義順）
    pub members: Vec<String>,
}

impl Group {
    /// 新しいGroupインスタンスを作成
    pub fn new(name: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_creation() {
        let group = Group::new("frontend", vec!["web".to_string(), "mobile".to_string()]);
        assert_eq!(group.name, "frontend");
        assert_eq!(group.members, vec!["web", "mobile"]);
        assert!(!group.is_empty());
        assert!(Group::new("spare", Vec::new()).is_empty());
    }
}
