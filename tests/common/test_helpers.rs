//! Test helper functions and utilities

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Whether a `git` executable is on PATH
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Run git in `dir`, panicking on failure
pub fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args([
            "-c",
            "user.name=gitgroup tests",
            "-c",
            "user.email=tests@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .status()
        .expect("Failed to run git");
    assert!(status.success(), "git {:?} failed in {}", args, dir.display());
}

/// Directory with an empty `.git` directory; enough for path validation
pub fn create_fake_repo(root: &Path, name: &str) -> PathBuf {
    let path = root.join(name);
    std::fs::create_dir_all(path.join(".git")).expect("Failed to create fake repository");
    path
}

/// Real repository on branch `main` with two committed files
pub fn create_git_repo(root: &Path, name: &str) -> PathBuf {
    let path = root.join(name);
    std::fs::create_dir_all(&path).expect("Failed to create repository directory");
    git(&path, &["init", "--quiet"]);
    git(&path, &["checkout", "--quiet", "-b", "main"]);
    std::fs::write(path.join("tracked.txt"), "original\n").expect("Failed to write file");
    std::fs::write(path.join("doomed.txt"), "bye\n").expect("Failed to write file");
    git(&path, &["add", "."]);
    git(&path, &["commit", "--quiet", "-m", "initial"]);
    path
}

/// Whether a process is gone (absent or a zombie), polling up to `within`
#[cfg(target_os = "linux")]
pub fn process_gone(pid: u32, within: Duration) -> bool {
    let start = std::time::Instant::now();
    loop {
        let gone = match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Err(_) => true,
            // state is the first field after the parenthesised command name
            Ok(stat) => stat
                .rsplit_once(')')
                .map(|(_, rest)| rest.trim_start().starts_with('Z'))
                .unwrap_or(false),
        };
        if gone {
            return true;
        }
        if start.elapsed() > within {
            return false;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}
