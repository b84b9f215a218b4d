//! AI モジュールの公開型定義

use std::fmt;

/// 会話ターンの話者
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// 会話履歴の 1 エントリ。作成後は変更しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// 会話履歴を `User: ...` / `Assistant: ...` 形式の 1 つのテキストに整形する。
///
/// 履歴を直接受け取れないクライアントに単発プロンプトとして渡すために使う。
pub fn format_transcript(turns: &[ChatTurn]) -> String {
    if turns.is_empty() {
        return "No conversation history yet.".to_string();
    }
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role.label(), turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// トークン使用量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenUsage {
    pub input: u32,
    pub output: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input + self.output
    }
}

impl fmt::Display for TokenUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} input, {} output, {} total",
            self.input,
            self.output,
            self.total()
        )
    }
}

/// モデル呼び出し 1 回分の応答
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    /// 応答テキスト（未加工）
    pub text: String,
    /// トークン使用量（プロバイダが返さない場合は None）
    pub usage: Option<TokenUsage>,
}

impl ModelReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_of_empty_history() {
        assert_eq!(format_transcript(&[]), "No conversation history yet.");
    }

    #[test]
    fn transcript_labels_each_turn() {
        let turns = vec![
            ChatTurn::user("shorter please"),
            ChatTurn::assistant("Done."),
        ];
        assert_eq!(
            format_transcript(&turns),
            "User: shorter please\nAssistant: Done."
        );
    }

    #[test]
    fn usage_display_includes_total() {
        let usage = TokenUsage {
            input: 120,
            output: 30,
        };
        assert_eq!(usage.to_string(), "120 input, 30 output, 150 total");
    }
}
