//! コミットとプッシュ
//!
//! フック（pre-commit, commit-msg など）が通常どおり動くよう、
//! git2 ではなく `git` コマンドをサブプロセスとして実行する。

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use super::DiffMode;

/// git コマンドの出力
#[derive(Debug, Clone, Default)]
pub struct GitOutput {
    pub stdout: String,
    pub stderr: String,
}

/// `git commit` の引数を組み立てる。
pub fn commit_args(message: &str, mode: DiffMode) -> Vec<String> {
    let mut args = vec!["commit".to_string()];
    if mode.commits_all_tracked() {
        args.push("-a".to_string());
    }
    args.push("-m".to_string());
    args.push(message.to_string());
    args
}

/// 実行前に表示する動作の説明
pub fn action_description(mode: DiffMode) -> &'static str {
    match mode {
        DiffMode::Staged => "Committing staged changes",
        DiffMode::Tracked => "Staging all tracked file changes and committing",
    }
}

/// `workdir` で git を実行する。非ゼロ終了は出力を含めたエラーにする。
fn run_git(workdir: &Path, args: &[String]) -> Result<GitOutput> {
    debug!(workdir = %workdir.display(), subcommand = ?args.first(), "Running git");

    let output = Command::new("git")
        .args(args)
        .current_dir(workdir)
        .output()
        .context("'git' command not found. Is Git installed and in your PATH?")?;

    let result = GitOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if !output.status.success() {
        warn!(status = %output.status, subcommand = ?args.first(), "git failed");
        let combined = format!("{}{}", result.stdout, result.stderr);
        let combined = combined.trim();
        if combined.is_empty() {
            bail!("git {} failed with {}", args[0], output.status);
        }
        bail!("git {} failed:\n{combined}", args[0]);
    }

    Ok(result)
}

/// コミットを作成する。
pub fn commit(workdir: &Path, message: &str, mode: DiffMode) -> Result<GitOutput> {
    let output = run_git(workdir, &commit_args(message, mode))?;
    info!(mode = ?mode, message_length = message.len(), "Commit created");
    Ok(output)
}

/// 現在のブランチをプッシュする。
pub fn push(workdir: &Path) -> Result<GitOutput> {
    let output = run_git(workdir, &["push".to_string()])?;
    info!("Push completed");
    Ok(output)
}
