//! チャットによるコミットメッセージ改善
//!
//! - `proposal`: AI 応答から提案ブロックを抽出する
//! - `draft`: 作業中ドラフトと会話履歴を保持する
//! - `turn`: チャット入力をコマンドに分類する
//! - `session`: 上記を組み合わせた対話ループ

mod draft;
mod proposal;
mod session;
mod turn;

pub use proposal::{PROPOSAL_END, PROPOSAL_START};
pub use session::{interruptible, RefinementSession, SessionTerminal};
pub use turn::{TurnInput, APPLY_COMMAND, CANCEL_COMMAND};

#[cfg(test)]
pub(crate) use session::scripted;
