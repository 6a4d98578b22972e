use crate::common::error::GitGroupError;

/// gitgroup全体で使用するResult型のエイリアス
///
/// # Examples
///
/// ```
/// use gitgroup::common::result::GitGroupResult;
/// use gitgroup::common::error::GitGroupError;
///
/// fn example_function() -> GitGroupResult<String> {
///     Ok("success".to_string())
/// }
///
/// fn example_with_error() -> GitGroupResult<()> {
///     Err(GitGroupError::internal_error("Something went wrong"))
/// }
/// ```
pub type GitGroupResult<T> = Result<T, GitGroupError>;

/// Optionのエラー変換ヘルパー
pub trait OptionExt<T> {
    /// OptionをGitGroupResultに変換する
    ///
    /// # Examples
    ///
    /// ```
    /// use gitgroup::common::result::{GitGroupResult, OptionExt};
    /// use gitgroup::common::error::GitGroupError;
    ///
    /// let none_value: Option<String> = None;
    /// let result: GitGroupResult<String> = none_value.ok_or_gitgroup(
    ///     GitGroupError::internal_error("Value not found")
    /// );
    /// assert!(result.is_err());
    /// ```
    fn ok_or_gitgroup(self, error: GitGroupError) -> GitGroupResult<T>;

    /// Option値をValidationErrorに変換する
    ///
    /// # Arguments
    ///
    /// * `field` - バリデーションエラーのフィールド名
    /// * `message` - エラーメッセージ
    fn ok_or_validation_error(
        self,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> GitGroupResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_gitgroup(self, error: GitGroupError) -> GitGroupResult<T> {
        self.ok_or(error)
    }

    fn ok_or_validation_error(
        self,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> GitGroupResult<T> {
        self.ok_or_else(|| GitGroupError::validation_error(field, message, None))
    }
}

/// Resultのエラー変換ヘルパー
pub trait ResultExt<T, E> {
    /// ResultをGitGroupResultに変換（エラーメッセージ付き）
    ///
    /// # Examples
    ///
    /// ```
    /// use gitgroup::common::result::{GitGroupResult, ResultExt};
    ///
    /// let result: Result<String, std::io::Error> = Err(std::io::Error::new(
    ///     std::io::ErrorKind::NotFound, "file not found"
    /// ));
    /// let converted: GitGroupResult<String> = result.with_internal_error("File operation failed");
    /// assert!(converted.is_err());
    /// ```
    fn with_internal_error(self, message: impl Into<String>) -> GitGroupResult<T>
    where
        E: std::error::Error + Send + Sync + 'static;

    /// ファイルシステムエラーとしてGitGroupResultに変換
    fn with_filesystem_error(
        self,
        message: impl Into<String>,
        path: Option<std::path::PathBuf>,
    ) -> GitGroupResult<T>
    where
        E: Into<std::io::Error>;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn with_internal_error(self, message: impl Into<String>) -> GitGroupResult<T>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.map_err(|e| GitGroupError::internal_error_with_source(message, e))
    }

    fn with_filesystem_error(
        self,
        message: impl Into<String>,
        path: Option<std::path::PathBuf>,
    ) -> GitGroupResult<T>
    where
        E: Into<std::io::Error>,
    {
        self.map_err(|e| GitGroupError::filesystem_error_with_source(message, path, e.into()))
    }
}
