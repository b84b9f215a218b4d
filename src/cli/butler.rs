//! ターミナル出力と確認プロンプト
//!
//! Butler の発話、ドラフトの枠付き表示、スピナー、Yes/No 確認を提供する。
//! 表示はすべてここを経由し、ログ（tracing）とは分離する。

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reedline::{Reedline, Signal};
use tracing::warn;

use super::color::{bold_blue, bold_green, bold_yellow, cyan, dim, red, white, yellow};
use super::prompt::LinePrompt;

const SEPARATOR: &str = "---";

/// Butler が発話するときに使う共通関数。
/// 先頭に 🤵 絵文字を付与し、白色テキストで表示する。
pub fn butler_say(message: &str) {
    println!("🤵 {}", white(message));
}

/// 成功メッセージ（緑）
pub fn butler_success(message: &str) {
    println!("🤵 {}", bold_green(message));
}

/// 警告メッセージ（黄）。処理は継続する。
pub fn butler_warn(message: &str) {
    println!("🤵 {}", yellow(message));
}

/// エラーメッセージ（赤）。`commit-butler: error:` を付けて stderr に出す。
pub fn butler_error(message: &str) {
    eprintln!("{}", red(&format!("commit-butler: error: {message}")));
}

/// 補足・ヒント（薄字）
pub fn butler_hint(message: &str) {
    println!("{}", dim(message));
}

/// 区切り線
pub fn separator() {
    println!("{SEPARATOR}");
}

/// 見出し付きでテキストブロックを表示する（本文はシアン）。
pub fn print_block(title: &str, body: &str) {
    println!("\n{}", bold_yellow(title));
    if body.trim().is_empty() {
        println!("{}", dim("(empty)"));
    } else {
        for line in body.lines() {
            println!("{}", cyan(line));
        }
    }
    separator();
}

/// ユーザーの発言をエコーする。
pub fn print_user_line(text: &str) {
    println!("{}{}", bold_blue("You: "), white(text));
}

/// AI の会話テキストを表示する。
pub fn print_model_reply(segments: &[String]) {
    println!("{}", bold_green("AI:"));
    if segments.is_empty() {
        println!("{}", dim("(no conversational text)"));
    }
    for segment in segments {
        for line in segment.lines() {
            println!("{line}");
        }
    }
}

/// AI 処理中に表示するスピナーを生成・開始する。
/// 呼び出し元で `finish_and_clear()` を呼んでスピナーを停止すること。
pub fn butler_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("🤵 {spinner} {msg}")
            .expect("Invalid spinner template"),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Yes/No の回答を解釈する。
///
/// `y` / `yes` / 空行 → Yes、それ以外 → No（大文字小文字は区別しない）。
pub fn is_affirmative(answer: &str) -> bool {
    let trimmed = answer.trim().to_lowercase();
    trimmed.is_empty() || trimmed == "y" || trimmed == "yes"
}

/// Yes/No 確認の回答
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    /// Ctrl-C / Ctrl-D / 入力エラー
    Interrupted,
}

/// reedline で Yes/No を 1 行読み取る。既定値は Yes（空行 = Yes）。
pub fn read_answer(editor: &mut Reedline, question: &str) -> Answer {
    let prompt = LinePrompt::question(&format!("{question} (Y/n):"));
    match editor.read_line(&prompt) {
        Ok(Signal::Success(line)) => {
            if is_affirmative(&line) {
                Answer::Yes
            } else {
                Answer::No
            }
        }
        Ok(_) => Answer::Interrupted,
        Err(e) => {
            warn!(error = %e, "Failed to read confirmation");
            Answer::Interrupted
        }
    }
}

/// セッション外（コミット実行・設定リセットなど）の Yes/No 確認。
///
/// `default_yes` が false の場合は `y` / `yes` のみを Yes とする。
/// 中断は No として扱う。
pub fn ask_yes_no(question: &str, default_yes: bool) -> bool {
    let mut editor = Reedline::create();
    if default_yes {
        return read_answer(&mut editor, question) == Answer::Yes;
    }

    let prompt = LinePrompt::question(&format!("{question} (y/N):"));
    match editor.read_line(&prompt) {
        Ok(Signal::Success(line)) => {
            let trimmed = line.trim().to_lowercase();
            trimmed == "y" || trimmed == "yes"
        }
        Ok(_) => false,
        Err(e) => {
            warn!(error = %e, "Failed to read confirmation");
            false
        }
    }
}
