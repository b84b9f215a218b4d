//! 組み込みラインエディタ
//!
//! reedline でコミットメッセージを編集する。Tab（= Ctrl+I）で
//! チャット改善への切り替えを要求し、編集中のテキストと一緒に通知する。

use reedline::{
    default_emacs_keybindings, EditCommand, Emacs, KeyCode, KeyModifiers, Reedline,
    ReedlineEvent, Signal,
};
use tracing::{debug, warn};

use crate::cli::color::cyan;
use crate::cli::prompt::DraftPrompt;

use super::{DraftEditor, EditorEvent};

/// Tab 押下時に reedline が返すホストコマンド
const REFINE_SIGNAL: &str = "\u{1}refine";

const INSTRUCTIONS: &str = "\
Type/edit your commit message below.
  - To add a NEW LINE: press Alt+Enter.
  - To SUBMIT the message: press Enter.
  - Chat to refine: press Tab (Ctrl+I).
  - To CANCEL: press Ctrl+C or Ctrl+D.
";

/// reedline ベースのコミットメッセージエディタ
pub struct InlineEditor {
    editor: Reedline,
}

impl InlineEditor {
    pub fn new() -> Self {
        let mut keybindings = default_emacs_keybindings();
        keybindings.add_binding(
            KeyModifiers::NONE,
            KeyCode::Tab,
            ReedlineEvent::ExecuteHostCommand(REFINE_SIGNAL.to_string()),
        );
        keybindings.add_binding(
            KeyModifiers::ALT,
            KeyCode::Enter,
            ReedlineEvent::Edit(vec![EditCommand::InsertNewline]),
        );

        Self {
            editor: Reedline::create().with_edit_mode(Box::new(Emacs::new(keybindings))),
        }
    }

    pub fn print_instructions() {
        println!("{}", cyan(INSTRUCTIONS));
    }
}

impl Default for InlineEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftEditor for InlineEditor {
    fn edit(&mut self, text: &str) -> EditorEvent {
        self.editor.run_edit_commands(&[
            EditCommand::Clear,
            EditCommand::InsertString(text.to_string()),
        ]);

        match self.editor.read_line(&DraftPrompt) {
            Ok(Signal::Success(line)) if line == REFINE_SIGNAL => {
                let current = self.editor.current_buffer_contents().to_string();
                debug!(buffer_length = current.len(), "Refinement requested from editor");
                EditorEvent::RefineRequested(current)
            }
            Ok(Signal::Success(line)) => EditorEvent::Submitted(line),
            Ok(Signal::CtrlC) | Ok(Signal::CtrlD) => EditorEvent::Cancelled,
            Ok(other) => {
                debug!(signal = ?other, "Unexpected editor signal treated as cancel");
                EditorEvent::Cancelled
            }
            Err(e) => {
                warn!(error = %e, "Editor failed");
                EditorEvent::Cancelled
            }
        }
    }
}
