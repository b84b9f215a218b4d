//! チャット改善セッション
//!
//! ユーザーと AI が 1 つのドラフトを会話で練り上げるループ。
//!
//! ```text
//! Prompting ──/cancel──▶ Cancelled (seed を返す)
//!    │ ▲
//!    │ └──────── No ─── ApplyConfirm ── Yes ──▶ Applied (現在のドラフトを返す)
//!    │                      ▲
//!    ├──/apply, Ctrl+A ─────┘
//!    └──質問──▶ ChatPending ──提案あり──▶ ProposalConfirm ──▶ Prompting
//!                     └──提案なし / エラー──▶ Prompting
//! ```
//!
//! どの待機点（入力・モデル呼び出し・確認）での中断も Cancelled になる。

use std::future::Future;

use tracing::{debug, info, warn};

use crate::ai::prompts::chat_refinement_prompt;
use crate::ai::{format_transcript, ChatTurn, ModelClient, ModelReply};
use crate::cli::butler::{
    butler_error, butler_hint, butler_spinner, butler_success, butler_warn, print_block,
    print_model_reply, print_user_line, separator, Answer,
};
use crate::cli::color::{bold_magenta, dim};

use super::draft::DraftState;
use super::proposal::{self, ParsedResponse};
use super::turn::{TurnCommand, TurnInput};

/// セッションが入力を受け取るターミナル
pub trait SessionTerminal {
    /// チャット質問を 1 ターン分読み取る。
    fn read_turn(&mut self) -> TurnInput;

    /// Yes/No を確認する（空行 = Yes）。
    fn confirm(&mut self, question: &str) -> Answer;
}

/// セッションの最終結果。1 セッションにつき必ず 1 つ生成される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// キャンセル。開始時のドラフトをそのまま返す。
    Cancelled(String),
    /// 適用。確定した現在のドラフトを返す。
    Applied(String),
}

impl SessionOutcome {
    pub fn into_draft(self) -> String {
        match self {
            SessionOutcome::Cancelled(text) | SessionOutcome::Applied(text) => text,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, SessionOutcome::Applied(_))
    }
}

/// 1 ステップ処理後にループを続けるか終えるか
enum Flow {
    Resume,
    Finish(SessionOutcome),
}

/// モデル呼び出しの結果
enum ModelCall {
    Reply(ModelReply),
    Failed(anyhow::Error),
    Interrupted,
}

/// チャット改善セッション
pub struct RefinementSession<'a> {
    model: &'a dyn ModelClient,
    terminal: &'a mut dyn SessionTerminal,
    diff: &'a str,
    draft: DraftState,
}

impl<'a> RefinementSession<'a> {
    pub fn new(
        model: &'a dyn ModelClient,
        terminal: &'a mut dyn SessionTerminal,
        diff: &'a str,
        seed: impl Into<String>,
    ) -> Self {
        Self {
            model,
            terminal,
            diff,
            draft: DraftState::new(seed),
        }
    }

    /// Cancelled か Applied になるまでターンを繰り返す。ターン数の上限はない。
    pub async fn run(mut self) -> SessionOutcome {
        println!("\n{}", bold_magenta("--- Chat Session Started ---"));
        butler_hint("The model sees the original diff and the current draft.");
        print_block("Reference: Initial Draft (when chat started):", self.draft.seed());
        info!(
            model = self.model.model_id(),
            seed_length = self.draft.seed().len(),
            "Refinement session started"
        );

        loop {
            print_block("Current Draft being refined in chat:", self.draft.snapshot());

            let input = self.terminal.read_turn();
            let flow = match input.classify() {
                TurnCommand::Cancel => Flow::Finish(self.cancelled()),
                TurnCommand::Empty => {
                    butler_hint(
                        "(Empty input ignored. Type /cancel to discard or /apply to finish.)",
                    );
                    Flow::Resume
                }
                TurnCommand::Apply => self.confirm_apply(),
                TurnCommand::ChatQuery(query) => self.chat_turn(query).await,
            };

            if let Flow::Finish(outcome) = flow {
                info!(
                    applied = outcome.is_applied(),
                    turns = self.draft.turns().len(),
                    "Refinement session finished"
                );
                return outcome;
            }
            separator();
        }
    }

    fn cancelled(&self) -> SessionOutcome {
        butler_warn("Chat cancelled. Returning original draft.");
        SessionOutcome::Cancelled(self.draft.seed().to_string())
    }

    fn confirm_apply(&mut self) -> Flow {
        if self.draft.is_blank() {
            butler_error("Current draft is empty. Cannot apply.");
            return Flow::Resume;
        }

        print_block("This is the current draft that will be applied:", self.draft.snapshot());
        match self.terminal.confirm("Use this message & exit chat?") {
            Answer::Yes => {
                butler_success("Current draft confirmed. Returning to editor.");
                Flow::Finish(SessionOutcome::Applied(self.draft.snapshot().to_string()))
            }
            Answer::No => {
                butler_warn("/apply discarded. Continuing chat.");
                Flow::Resume
            }
            Answer::Interrupted => Flow::Finish(self.cancelled()),
        }
    }

    async fn chat_turn(&mut self, query: String) -> Flow {
        print_user_line(&query);
        self.draft.push_turn(ChatTurn::user(query));

        let reply = match self.call_model().await {
            ModelCall::Reply(reply) => reply,
            ModelCall::Interrupted => {
                info!("Model call interrupted");
                return Flow::Finish(self.cancelled());
            }
            ModelCall::Failed(e) => {
                warn!(error = %e, "Model call failed during refinement");
                butler_error(&format!("LLM Error: {e:#}"));
                self.draft
                    .push_turn(ChatTurn::assistant(format!("(LLM Error: {e})")));
                return Flow::Resume;
            }
        };

        let parsed = proposal::parse(&reply.text);
        debug!(
            segments = parsed.conversational.len(),
            has_proposal = parsed.proposal.is_some(),
            "Model reply parsed"
        );

        // 空のマーカーだけの応答も本文なしとして扱う
        if parsed.proposal.is_none() && parsed.conversational.is_empty() {
            println!("{}", dim(NO_TEXT_NOTE));
            self.draft.push_turn(ChatTurn::assistant(NO_TEXT_NOTE));
            return Flow::Resume;
        }

        print_model_reply(&parsed.conversational);

        match parsed.proposal.clone() {
            Some(candidate) => self.review_proposal(&parsed, candidate),
            None => {
                self.draft
                    .push_turn(ChatTurn::assistant(parsed.conversational_text()));
                Flow::Resume
            }
        }
    }

    fn review_proposal(&mut self, parsed: &ParsedResponse, candidate: String) -> Flow {
        print_block("LLM Proposes Update to Draft:", &candidate);

        match self.terminal.confirm("Accept this proposal as current draft?") {
            Answer::Yes => {
                butler_success("Proposal accepted. Current draft updated.");
                let note = accepted_note(&parsed.conversational_text(), &candidate);
                self.draft.replace(candidate);
                self.draft.push_turn(ChatTurn::assistant(note));
                Flow::Resume
            }
            Answer::No => {
                butler_warn("Proposal rejected. Current draft remains unchanged.");
                let text = parsed.conversational_text();
                let note = if text.is_empty() {
                    "(Proposed a new draft, which the user rejected.)".to_string()
                } else {
                    format!("{text}\n(The proposed draft was rejected by the user.)")
                };
                self.draft.push_turn(ChatTurn::assistant(note));
                Flow::Resume
            }
            Answer::Interrupted => Flow::Finish(self.cancelled()),
        }
    }

    /// 現在のドラフトを埋め込んだシステムプロンプトと履歴でモデルを呼び出す。
    ///
    /// 履歴非対応のクライアントには会話全体を 1 つのプロンプトに整形して渡す。
    async fn call_model(&self) -> ModelCall {
        let system = chat_refinement_prompt(self.diff, self.draft.snapshot());
        let turns = self.draft.turns();

        let (prompt, history) = if self.model.supports_history() {
            match turns.split_last() {
                Some((last, earlier)) => (last.content.clone(), earlier),
                None => return ModelCall::Failed(anyhow::anyhow!("no query to send")),
            }
        } else {
            (format_transcript(turns), &[][..])
        };

        let spinner = butler_spinner("LLM thinking...");
        let result = interruptible(self.model.generate(&system, &prompt, history)).await;
        spinner.finish_and_clear();

        match result {
            Some(Ok(reply)) => ModelCall::Reply(reply),
            Some(Err(e)) => ModelCall::Failed(e),
            None => ModelCall::Interrupted,
        }
    }
}

/// 本文のない応答の代わりに履歴へ残すテキスト
const NO_TEXT_NOTE: &str = "(LLM returned no text)";

/// 受諾した提案を履歴に残すためのテキスト
fn accepted_note(conversational: &str, accepted: &str) -> String {
    let header = "(The user accepted this proposal; it is now the current draft.)";
    if conversational.is_empty() {
        format!("{header}\n{accepted}")
    } else {
        format!("{conversational}\n{header}\n{accepted}")
    }
}

/// Ctrl-C (SIGINT) で中断できる形で future を待つ。中断時は None。
pub async fn interruptible<F, T>(future: F) -> Option<T>
where
    F: Future<Output = T>,
{
    tokio::pin!(future);
    tokio::select! {
        value = &mut future => Some(value),
        Ok(()) = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received while waiting for the model");
            None
        }
    }
}


#[cfg(test)]
mod tests {
    use super::scripted::{ScriptedModel, ScriptedTerminal};
    use super::*;
    use anyhow::Result;
    use crate::ai::Role;
    use crate::refine::{PROPOSAL_END, PROPOSAL_START};

    fn line(text: &str) -> TurnInput {
        TurnInput::Line(text.to_string())
    }

    fn proposal_reply(conversation: &str, body: &str) -> Result<String> {
        Ok(format!("{conversation}\n{PROPOSAL_START}\n{body}\n{PROPOSAL_END}"))
    }

    async fn run_session(
        model: &ScriptedModel,
        terminal: &mut ScriptedTerminal,
        seed: &str,
    ) -> SessionOutcome {
        RefinementSession::new(model, terminal, "diff --git a/x b/x", seed)
            .run()
            .await
    }

    #[tokio::test]
    async fn cancel_on_first_turn_returns_seed() {
        let model = ScriptedModel::new(true, vec![]);
        let mut terminal = ScriptedTerminal::new(vec![line("/cancel")], vec![]);
        let outcome = run_session(&model, &mut terminal, "fix: bug").await;
        assert_eq!(outcome, SessionOutcome::Cancelled("fix: bug".to_string()));
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn accept_then_apply_returns_proposal() {
        let proposal = "fix: correct off-by-one in parser\n\nAdjusts loop bound.";
        let model = ScriptedModel::new(true, vec![proposal_reply("Sure.", proposal)]);
        let mut terminal = ScriptedTerminal::new(
            vec![line("make it more detailed"), line("/apply")],
            vec![Answer::Yes, Answer::Yes],
        );
        let outcome = run_session(&model, &mut terminal, "fix: bug").await;
        assert_eq!(outcome, SessionOutcome::Applied(proposal.to_string()));
        assert_eq!(
            terminal.questions,
            vec![
                "Accept this proposal as current draft?".to_string(),
                "Use this message & exit chat?".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn cancel_after_accepting_still_returns_seed() {
        let model = ScriptedModel::new(
            true,
            vec![
                proposal_reply("One.", "feat: first"),
                proposal_reply("Two.", "feat: second"),
            ],
        );
        let mut terminal = ScriptedTerminal::new(
            vec![line("again"), line("and again"), TurnInput::Interrupted],
            vec![Answer::Yes, Answer::Yes],
        );
        let outcome = run_session(&model, &mut terminal, "feat: seed").await;
        assert_eq!(outcome, SessionOutcome::Cancelled("feat: seed".to_string()));
    }

    #[tokio::test]
    async fn rejected_proposal_leaves_draft_unchanged() {
        let model = ScriptedModel::new(true, vec![proposal_reply("Try this.", "feat: other")]);
        let mut terminal = ScriptedTerminal::new(
            vec![line("rewrite it"), TurnInput::ApplyShortcut],
            vec![Answer::No, Answer::Yes],
        );
        let outcome = run_session(&model, &mut terminal, "feat: original").await;
        assert_eq!(outcome, SessionOutcome::Applied("feat: original".to_string()));
    }

    #[tokio::test]
    async fn apply_on_empty_draft_is_rejected() {
        let model = ScriptedModel::new(true, vec![]);
        let mut terminal = ScriptedTerminal::new(
            vec![line("/apply"), TurnInput::ApplyShortcut, line("/cancel")],
            vec![],
        );
        let outcome = run_session(&model, &mut terminal, "  ").await;
        assert_eq!(outcome, SessionOutcome::Cancelled("  ".to_string()));
        // 空ドラフトでは確認プロンプト自体が出ない
        assert!(terminal.questions.is_empty());
    }

    #[tokio::test]
    async fn declined_apply_keeps_prompting() {
        let model = ScriptedModel::new(true, vec![]);
        let mut terminal = ScriptedTerminal::new(
            vec![line("/apply"), line("/APPLY")],
            vec![Answer::No, Answer::Yes],
        );
        let outcome = run_session(&model, &mut terminal, "docs: readme").await;
        assert_eq!(outcome, SessionOutcome::Applied("docs: readme".to_string()));
        assert_eq!(terminal.questions.len(), 2);
    }

    #[tokio::test]
    async fn empty_input_reprompts_instead_of_cancelling() {
        let model = ScriptedModel::new(true, vec![]);
        let mut terminal =
            ScriptedTerminal::new(vec![line(""), line("   "), line("/apply")], vec![Answer::Yes]);
        let outcome = run_session(&model, &mut terminal, "chore: bump").await;
        assert!(outcome.is_applied());
    }

    #[tokio::test]
    async fn model_failure_is_not_fatal() {
        let model = ScriptedModel::new(
            true,
            vec![Err(anyhow::anyhow!("connection refused")), Ok("Fine now.".to_string())],
        );
        let mut terminal = ScriptedTerminal::new(
            vec![line("first"), line("second"), line("/cancel")],
            vec![],
        );
        let outcome = run_session(&model, &mut terminal, "fix: x").await;
        assert_eq!(outcome, SessionOutcome::Cancelled("fix: x".to_string()));

        // 2 回目の呼び出しの履歴にエラーノートが残っている
        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        let (_, prompt, history) = &calls[1];
        assert_eq!(prompt, "second");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], ChatTurn::user("first"));
        assert_eq!(history[1].role, Role::Assistant);
        assert!(history[1].content.contains("connection refused"));
    }

    #[tokio::test]
    async fn system_prompt_tracks_current_draft() {
        let model = ScriptedModel::new(
            true,
            vec![proposal_reply("Here.", "feat: better"), Ok("Looks good.".to_string())],
        );
        let mut terminal = ScriptedTerminal::new(
            vec![line("improve"), line("happy now?"), line("/cancel")],
            vec![Answer::Yes],
        );
        run_session(&model, &mut terminal, "feat: draft").await;

        let calls = model.calls();
        assert!(calls[0].0.contains("--- CURRENT DRAFT START ---\nfeat: draft\n"));
        assert!(calls[1].0.contains("--- CURRENT DRAFT START ---\nfeat: better\n"));
        assert!(calls[0].0.contains("diff --git a/x b/x"));
    }

    #[tokio::test]
    async fn history_less_client_gets_transcript_prompt() {
        let model = ScriptedModel::new(false, vec![Ok("Noted.".to_string()), Ok("Ok.".to_string())]);
        let mut terminal = ScriptedTerminal::new(
            vec![line("hello"), line("shorter"), line("/cancel")],
            vec![],
        );
        run_session(&model, &mut terminal, "feat: a").await;

        let calls = model.calls();
        assert_eq!(calls[0].1, "User: hello");
        assert!(calls[0].2.is_empty());
        assert_eq!(calls[1].1, "User: hello\nAssistant: Noted.\nUser: shorter");
    }

    #[tokio::test]
    async fn empty_reply_is_recorded_and_session_continues() {
        let model = ScriptedModel::new(true, vec![Ok("   ".to_string())]);
        let mut terminal =
            ScriptedTerminal::new(vec![line("anything?"), line("/apply")], vec![Answer::Yes]);
        let outcome = run_session(&model, &mut terminal, "fix: y").await;
        assert_eq!(outcome, SessionOutcome::Applied("fix: y".to_string()));
    }

    #[tokio::test]
    async fn accepted_proposal_is_noted_in_history() {
        let model = ScriptedModel::new(
            true,
            vec![proposal_reply("Tightened it.", "feat: better"), Ok("Sure.".to_string())],
        );
        let mut terminal = ScriptedTerminal::new(
            vec![line("improve"), line("anything else?"), line("/cancel")],
            vec![Answer::Yes],
        );
        run_session(&model, &mut terminal, "feat: draft").await;

        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        let (_, prompt, history) = &calls[1];
        assert_eq!(prompt, "anything else?");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], ChatTurn::user("improve"));
        let note = &history[1];
        assert_eq!(note.role, Role::Assistant);
        assert!(note.content.contains("Tightened it."));
        assert!(note.content.contains("it is now the current draft"));
        assert!(note.content.contains("feat: better"));
    }

    #[tokio::test]
    async fn rejected_proposal_is_noted_without_its_body() {
        let model = ScriptedModel::new(
            true,
            vec![proposal_reply("How about this?", "feat: unwanted"), Ok("Ok.".to_string())],
        );
        let mut terminal = ScriptedTerminal::new(
            vec![line("rewrite"), line("keep it then"), line("/cancel")],
            vec![Answer::No],
        );
        run_session(&model, &mut terminal, "feat: draft").await;

        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        let (system, _, history) = &calls[1];
        assert_eq!(history.len(), 2);
        let note = &history[1];
        assert_eq!(note.role, Role::Assistant);
        assert!(note.content.contains("How about this?"));
        assert!(note.content.contains("rejected by the user"));
        assert!(!note.content.contains("feat: unwanted"));
        assert!(system.contains("--- CURRENT DRAFT START ---\nfeat: draft\n"));
    }

    #[tokio::test]
    async fn marker_only_reply_is_recorded_as_no_text() {
        let model = ScriptedModel::new(
            true,
            vec![
                Ok(format!("{PROPOSAL_START}\n  \n{PROPOSAL_END}")),
                Ok("Ok.".to_string()),
            ],
        );
        let mut terminal = ScriptedTerminal::new(
            vec![line("try"), line("again"), line("/cancel")],
            vec![],
        );
        run_session(&model, &mut terminal, "fix: z").await;

        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        let history = &calls[1].2;
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].content, "(LLM returned no text)");
        // 提案の確認は出ない
        assert!(terminal.questions.is_empty());
    }

    #[tokio::test]
    async fn interrupt_at_proposal_confirmation_cancels() {
        let model = ScriptedModel::new(true, vec![proposal_reply("x", "feat: new")]);
        let mut terminal =
            ScriptedTerminal::new(vec![line("go")], vec![Answer::Interrupted]);
        let outcome = run_session(&model, &mut terminal, "feat: old").await;
        assert_eq!(outcome, SessionOutcome::Cancelled("feat: old".to_string()));
    }

    #[test]
    fn outcome_into_draft() {
        assert_eq!(SessionOutcome::Applied("a".into()).into_draft(), "a");
        assert_eq!(SessionOutcome::Cancelled("b".into()).into_draft(), "b");
    }
}
