//! チャット入力の分類
//!
//! 1 ターン分のユーザー入力（行・ショートカット・シグナル）を
//! キャンセル / 適用 / 空入力 / チャット質問 のいずれかに分類する。
//! 状態遷移は行わない（呼び出し側のセッションが担当する）。

use tracing::debug;

/// 明示的なキャンセルコマンド
pub const CANCEL_COMMAND: &str = "/cancel";
/// 明示的な適用コマンド
pub const APPLY_COMMAND: &str = "/apply";

/// ターミナルから受け取った 1 ターン分の入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnInput {
    /// Enter で確定された 1 行
    Line(String),
    /// 入力中に適用ショートカット（Ctrl+A）が押された
    ApplyShortcut,
    /// Ctrl-C
    Interrupted,
    /// Ctrl-D / 入力終端
    EndOfInput,
}

/// 分類結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnCommand {
    /// セッションを破棄し、開始時のドラフトを返す
    Cancel,
    /// 現在のドラフトを確定してセッションを終える（確認あり）
    Apply,
    /// 空入力。セッションは終了せず再入力を促す
    Empty,
    /// AI に送るチャット質問（trim 済み）
    ChatQuery(String),
}

impl TurnInput {
    pub fn classify(&self) -> TurnCommand {
        match self {
            TurnInput::Line(line) => classify(line, false),
            TurnInput::ApplyShortcut => classify("", true),
            TurnInput::Interrupted | TurnInput::EndOfInput => {
                debug!(input = ?self, "Signal treated as cancel");
                TurnCommand::Cancel
            }
        }
    }
}

/// 入力行とショートカット発生有無からコマンドを判定する。
///
/// 判定順: キャンセル → 適用 → 空入力 → チャット質問
pub fn classify(raw_line: &str, apply_shortcut: bool) -> TurnCommand {
    let line = raw_line.trim();

    let command = if line.eq_ignore_ascii_case(CANCEL_COMMAND) {
        TurnCommand::Cancel
    } else if apply_shortcut || line.eq_ignore_ascii_case(APPLY_COMMAND) {
        TurnCommand::Apply
    } else if line.is_empty() {
        TurnCommand::Empty
    } else {
        TurnCommand::ChatQuery(line.to_string())
    };

    debug!(input = %line, apply_shortcut, command = ?command, "Chat input classified");
    command
}
