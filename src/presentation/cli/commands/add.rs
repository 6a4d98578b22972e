use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use super::CommandContext;
use crate::common::result::ResultExt;
use crate::domain::entities::repository::is_repository_root;

/// Handler for the add command
pub struct AddCommand {
    pub name: String,
    pub path: PathBuf,
    pub group: Option<String>,
}

impl AddCommand {
    pub fn new(name: String, path: PathBuf, group: Option<String>) -> Self {
        Self { name, path, group }
    }

    pub fn execute(&self, context: &CommandContext) -> Result<i32> {
        validate_name("repository", &self.name)?;
        if let Some(group) = &self.group {
            validate_name("group", group)?;
        }

        let path = absolute_path(&self.path)?;
        if !is_repository_root(&path) {
            context.display.warning(&format!(
                "{} is not a git repository; it will be reported as an error until it is",
                path.display()
            ));
        }

        let mut config = context.load_or_default()?;
        config.add_repository(
            self.name.clone(),
            path.display().to_string(),
            self.group.as_deref(),
        );
        context.save_config(&config)?;

        match &self.group {
            Some(group) => context.display.success(&format!(
                "Added {} ({}) to group {}",
                self.name,
                path.display(),
                group
            )),
            None => context
                .display
                .success(&format!("Added {} ({})", self.name, path.display())),
        }
        Ok(0)
    }
}

/// Names must be usable as shorthand tokens: non-empty, no whitespace, no leading `@`
fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() || name.contains(char::is_whitespace) {
        bail!("invalid {} name '{}': must be non-empty without whitespace", kind, name);
    }
    if name.starts_with('@') {
        bail!("invalid {} name '{}': must not start with '@'", kind, name);
    }
    Ok(())
}

fn absolute_path(path: &Path) -> Result<PathBuf> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .with_filesystem_error("failed to read the current directory", None)?
            .join(path)
    };
    Ok(path.canonicalize().unwrap_or(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("group", "frontend").is_ok());
        assert!(validate_name("group", "").is_err());
        assert!(validate_name("group", "front end").is_err());
        assert!(validate_name("group", "@frontend").is_err());
    }

    #[test]
    fn test_absolute_path_keeps_missing_absolute_paths() {
        let path = absolute_path(Path::new("/definitely/not/here")).unwrap();
        assert_eq!(path, PathBuf::from("/definitely/not/here"));
    }

    #[test]
    fn test_absolute_path_resolves_relative_paths() {
        let path = absolute_path(Path::new(".")).unwrap();
        assert!(path.is_absolute());
    }
}
