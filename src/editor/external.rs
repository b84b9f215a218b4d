//! 外部エディタでの編集
//!
//! 一時ファイルにドラフトとヘルプコメントを書き出し、外部エディタの終了を待ってから
//! 読み戻す。一時ファイルは `NamedTempFile` のドロップで必ず削除される
//! （正常終了・異常終了・起動失敗のいずれでも）。

use std::io::Write;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

const HELP_TEXT: &str = "
# Edit your commit message above.
# Lines starting with '#' will be ignored.
# Save and close the editor to proceed.
# Leave the message empty to cancel the commit.
";

/// 外部エディタでドラフトを編集する。
///
/// 戻り値:
/// - `Ok(Some(text))`: 編集後のテキスト（コメント行除去・trim 済み）
/// - `Ok(None)`: キャンセル（空メッセージ、または非ゼロ終了）
/// - `Err`: コマンドの解釈・起動・ファイル入出力の失敗
pub fn edit_with_external_editor(initial: &str, command: &str) -> Result<Option<String>> {
    let tokens = shell_words::split(command)
        .with_context(|| format!("failed to parse editor command: {command}"))?;
    let (program, args) = tokens
        .split_first()
        .with_context(|| format!("editor command is empty: {command:?}"))?;

    let program_path = which::which(program)
        .with_context(|| format!("editor '{program}' was not found in PATH"))?;

    let mut file = tempfile::Builder::new()
        .prefix("COMMIT_EDITMSG-")
        .suffix(".txt")
        .tempfile()
        .context("failed to create temporary file for the editor")?;
    file.write_all(initial.as_bytes())?;
    file.write_all(b"\n")?;
    file.write_all(HELP_TEXT.as_bytes())?;
    file.flush()?;

    debug!(
        editor = %program_path.display(),
        args = ?args,
        path = %file.path().display(),
        "Launching external editor"
    );

    let status = Command::new(&program_path)
        .args(args)
        .arg(file.path())
        .status()
        .with_context(|| format!("failed to launch editor '{program}'"))?;

    if !status.success() {
        warn!(status = %status, "Editor exited with non-zero status");
        crate::cli::butler::butler_warn(&format!("Editor exited with {status}"));
        return Ok(None);
    }

    // エディタがファイルを置き換える場合に備えてパスから読み直す
    let content = std::fs::read_to_string(file.path())
        .context("failed to read the edited commit message")?;
    let edited = strip_comment_lines(&content);
    info!(edited = edited.is_some(), "External editor finished");
    Ok(edited)
}

/// `#` で始まる行を除去して trim する。空になった場合は None。
pub fn strip_comment_lines(content: &str) -> Option<String> {
    let text = content
        .lines()
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments_and_trims() {
        let content = format!("feat: add retry\n\nRetries uploads.\n{HELP_TEXT}");
        assert_eq!(
            strip_comment_lines(&content).as_deref(),
            Some("feat: add retry\n\nRetries uploads.")
        );
    }

    #[test]
    fn only_comments_means_cancelled() {
        assert!(strip_comment_lines(HELP_TEXT).is_none());
        assert!(strip_comment_lines("").is_none());
    }

    #[test]
    fn indented_hash_is_kept() {
        assert_eq!(
            strip_comment_lines("fix: issue\n  #123 referenced").as_deref(),
            Some("fix: issue\n  #123 referenced")
        );
    }

    #[test]
    fn empty_command_is_an_error() {
        assert!(edit_with_external_editor("x", "   ").is_err());
    }

    #[test]
    fn unknown_editor_is_an_error() {
        let result = edit_with_external_editor("x", "definitely-not-an-editor-7f3a9");
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_cancels() {
        let result = edit_with_external_editor("feat: x", "false").unwrap();
        assert!(result.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn unchanged_file_returns_initial_text() {
        // `true` はファイルに触れずに成功終了するため、初期テキストがそのまま返る
        let result = edit_with_external_editor("feat: keep me", "true").unwrap();
        assert_eq!(result.as_deref(), Some("feat: keep me"));
    }

    #[cfg(unix)]
    #[test]
    fn editor_arguments_are_passed_through() {
        // sh -c '<script>' <name> <file> の形で一時ファイルを書き換える
        let command = r#"sh -c 'printf "docs: rewritten\n# note\n" > "$1"' editor"#;
        let result = edit_with_external_editor("old", command).unwrap();
        assert_eq!(result.as_deref(), Some("docs: rewritten"));
    }
}
