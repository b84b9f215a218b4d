use std::borrow::Cow;

use reedline::{Color, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus};

use super::color::{bold_magenta, bold_yellow, cyan};

/// reedline 用の 1 行プロンプト（チャット入力・確認プロンプトで使用）。
///
/// ```text
/// Your Query: ▏
/// Accept this proposal as current draft? (Y/n): ▏
/// ```
pub struct LinePrompt {
    label: String,
}

impl LinePrompt {
    /// チャット質問用（マゼンタ）
    pub fn query(label: &str) -> Self {
        Self {
            label: bold_magenta(label),
        }
    }

    /// Yes/No 確認用（黄色）
    pub fn question(question: &str) -> Self {
        Self {
            label: bold_yellow(question),
        }
    }
}

impl Prompt for LinePrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.label.as_str())
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed(" ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed(" :: ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        search_indicator(history_search)
    }
}

/// コミットメッセージ編集用のプロンプト。
///
/// ```text
/// Commit Message:
/// ❯ feat: add retry to uploader
///   (複数行の場合は 2 行目以降をインデント)
/// ```
pub struct DraftPrompt;

impl Prompt for DraftPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{}\n", cyan("Commit Message:")))
    }

    fn get_prompt_color(&self) -> Color {
        Color::White
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Owned(cyan("\u{276f} "))
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("  ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        search_indicator(history_search)
    }
}

fn search_indicator(history_search: PromptHistorySearch) -> Cow<'static, str> {
    let prefix = match history_search.status {
        PromptHistorySearchStatus::Passing => "",
        PromptHistorySearchStatus::Failing => "(failed) ",
    };
    Cow::Owned(format!("{prefix}(search: '{}') ", history_search.term))
}
