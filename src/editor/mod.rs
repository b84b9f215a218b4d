//! コミットメッセージの編集
//!
//! - `resolve`: 使用するエディタの決定
//! - `internal`: 組み込みラインエディタ（チャット改善への切り替えあり）
//! - `external`: 外部エディタプロセス
//!
//! 組み込みエディタは「チャット改善を要求された」というイベントを返すだけで、
//! セッションの実行と編集の再開は `edit_interactively` が担当する。

pub mod external;
mod internal;
pub mod resolve;

use tracing::info;

use crate::ai::ModelClient;
use crate::cli::color::bold_magenta;
use crate::refine::{RefinementSession, SessionTerminal};

pub use internal::InlineEditor;

/// エディタから返るイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// Enter で確定された
    Submitted(String),
    /// チャット改善が要求された（編集中のテキスト付き）
    RefineRequested(String),
    /// キャンセルされた
    Cancelled,
}

/// ドラフトを編集する面
pub trait DraftEditor {
    /// `text` を初期値として編集し、次のイベントを返す。
    fn edit(&mut self, text: &str) -> EditorEvent;
}

/// 組み込みエディタで編集し、要求があればチャット改善セッションを挟む。
///
/// セッション終了後は、その結果（キャンセル時は切り替え前のテキスト）で編集を再開する。
/// 戻り値: 確定したメッセージ。キャンセル時は None。
pub async fn edit_interactively(
    editor: &mut dyn DraftEditor,
    terminal: &mut dyn SessionTerminal,
    model: &dyn ModelClient,
    diff: &str,
    suggestion: &str,
) -> Option<String> {
    let mut text = suggestion.to_string();

    loop {
        match editor.edit(&text) {
            EditorEvent::Submitted(message) => return Some(message),
            EditorEvent::Cancelled => {
                info!("Editing cancelled");
                return None;
            }
            EditorEvent::RefineRequested(current) => {
                println!("{}", bold_magenta("\n==> Entering Chat Mode..."));
                let outcome = RefinementSession::new(model, &mut *terminal, diff, current)
                    .run()
                    .await;
                println!("{}", bold_magenta("<== Exiting Chat Mode..."));
                text = outcome.into_draft();
            }
        }
    }
}
