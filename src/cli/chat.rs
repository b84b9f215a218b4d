//! チャット入力用ターミナル
//!
//! reedline でチャット質問を読み取る。Ctrl+A は入力中いつでも
//! 「適用」ショートカットとして扱い、通常の行とは区別して返す。

use reedline::{
    default_emacs_keybindings, EditCommand, Emacs, KeyCode, KeyModifiers, Reedline,
    ReedlineEvent, Signal,
};
use tracing::{debug, warn};

use crate::refine::{SessionTerminal, TurnInput, APPLY_COMMAND, CANCEL_COMMAND};

use super::butler::{butler_hint, read_answer, Answer};
use super::color::{bold, dim};
use super::prompt::LinePrompt;

/// Ctrl+A 押下時に reedline が返すホストコマンド。
/// 通常入力と衝突しないよう制御文字で始める。
const APPLY_SHORTCUT_SIGNAL: &str = "\u{1}apply";

/// reedline を使ったチャット用ターミナル
pub struct ChatTerminal {
    editor: Reedline,
    confirm_editor: Reedline,
    prompt: LinePrompt,
}

impl ChatTerminal {
    pub fn new() -> Self {
        let mut keybindings = default_emacs_keybindings();
        keybindings.add_binding(
            KeyModifiers::CONTROL,
            KeyCode::Char('a'),
            ReedlineEvent::ExecuteHostCommand(APPLY_SHORTCUT_SIGNAL.to_string()),
        );

        Self {
            editor: Reedline::create().with_edit_mode(Box::new(Emacs::new(keybindings))),
            confirm_editor: Reedline::create(),
            prompt: LinePrompt::query("Your Query:"),
        }
    }

    fn print_toolbar() {
        println!(
            "{} {} {}",
            bold("[Chat]"),
            dim(&format!("Ctrl+A or {APPLY_COMMAND}: use current draft & exit |")),
            dim(&format!("{CANCEL_COMMAND}: discard & exit")),
        );
    }
}

impl Default for ChatTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTerminal for ChatTerminal {
    fn read_turn(&mut self) -> TurnInput {
        Self::print_toolbar();
        match self.editor.read_line(&self.prompt) {
            Ok(Signal::Success(line)) if line == APPLY_SHORTCUT_SIGNAL => {
                debug!("Apply shortcut pressed");
                // ショートカット時は入力途中のテキストがバッファに残るため破棄する
                self.editor.run_edit_commands(&[EditCommand::Clear]);
                butler_hint("(Ctrl+A pressed, initiating apply sequence...)");
                TurnInput::ApplyShortcut
            }
            Ok(Signal::Success(line)) => TurnInput::Line(line),
            Ok(Signal::CtrlC) => TurnInput::Interrupted,
            Ok(Signal::CtrlD) => {
                butler_hint("(Ctrl+D treated as /cancel)");
                TurnInput::EndOfInput
            }
            Ok(other) => {
                debug!(signal = ?other, "Unexpected signal treated as end of input");
                TurnInput::EndOfInput
            }
            Err(e) => {
                warn!(error = %e, "Failed to read chat input");
                TurnInput::EndOfInput
            }
        }
    }

    fn confirm(&mut self, question: &str) -> Answer {
        read_answer(&mut self.confirm_editor, question)
    }
}
