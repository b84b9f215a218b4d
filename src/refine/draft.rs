//! 作業中ドラフトの状態
//!
//! セッション中に唯一の「現在のドラフト」と、キャンセル時に返す
//! 開始時点のドラフト（seed）、そしてこのセッション限りの会話履歴を保持する。

use crate::ai::ChatTurn;

/// 作業中のコミットメッセージと会話履歴
#[derive(Debug, Clone)]
pub struct DraftState {
    /// セッション開始時のドラフト。セッション中は変更しない。
    seed: String,
    /// 現在のドラフト。提案の受諾でのみ置き換わる。
    current: String,
    /// 次のターンで AI に送る会話履歴（挿入順）
    turns: Vec<ChatTurn>,
}

impl DraftState {
    pub fn new(seed: impl Into<String>) -> Self {
        let seed = seed.into();
        Self {
            current: seed.clone(),
            seed,
            turns: Vec::new(),
        }
    }

    /// 現在のドラフトを返す（表示とコンテキスト構築用）。
    pub fn snapshot(&self) -> &str {
        &self.current
    }

    /// セッション開始時のドラフトを返す。
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// 現在のドラフトを無条件に置き換える。
    pub fn replace(&mut self, text: impl Into<String>) {
        self.current = text.into();
    }

    /// 現在のドラフトが空白のみかどうか
    pub fn is_blank(&self) -> bool {
        self.current.trim().is_empty()
    }

    pub fn push_turn(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }
}
