//! コミットメッセージ生成コマンド
//!
//! 差分の取得 → モデルによる下書き生成 → 編集（組み込みエディタ + チャット改善、
//! または外部エディタ） → コミット、の一連の流れ。

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::ai::{ModelClient, OpenAiClient};
use crate::cli::butler::{
    ask_yes_no, butler_error, butler_hint, butler_say, butler_spinner, butler_success,
    butler_warn,
};
use crate::cli::chat::ChatTerminal;
use crate::cli::color::{bold, cyan, yellow};
use crate::config::ButlerConfig;
use crate::editor::external::edit_with_external_editor;
use crate::editor::resolve::{self, EditorChoice, EditorOverride, SystemEnv, ENVIRONMENT};
use crate::editor::{edit_interactively, InlineEditor};
use crate::git::{commit, DiffMode, Repo};
use crate::prompts::PromptLibrary;
use crate::refine::interruptible;

/// 切り詰めた差分の末尾に付ける印
const TRUNCATION_SUFFIX: &str = "\n\n... [diff truncated]";

/// ルートコマンドのオプション
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub mode: DiffMode,
    pub model: Option<String>,
    pub system: Option<String>,
    pub prompt_style: Option<String>,
    pub list_prompts: bool,
    pub max_chars: Option<usize>,
    pub api_key: Option<String>,
    pub yes: bool,
    pub editor: EditorOverride,
    pub show_usage: bool,
}

pub async fn run(opts: GenerateOptions) -> Result<()> {
    let library = PromptLibrary::default_location();
    if let Err(e) = library.install() {
        warn!(error = %e, "Failed to install prompts");
        butler_warn(&format!("Could not install prompt files: {e}"));
    }
    let config = ButlerConfig::load();

    if opts.list_prompts {
        print_prompt_list(&library, &config.prompt);
        return Ok(());
    }

    let cwd = std::env::current_dir().context("failed to read the current directory")?;
    let repo = Repo::discover(&cwd)?;

    let Some(diff) = load_diff(&repo, opts.mode)? else {
        return Ok(());
    };

    let model_id = opts.model.clone().or_else(|| config.model.clone());
    let client = OpenAiClient::new(model_id.as_deref(), opts.api_key.as_deref(), config.timeout())?;

    let max_chars = config.effective_max_chars(opts.max_chars);
    let diff = match truncate_diff(&diff, max_chars) {
        Some(truncated) => {
            butler_warn(&format!(
                "Warning: Diff is very long ({} chars), truncating to {max_chars} chars for the model.",
                diff.chars().count()
            ));
            truncated
        }
        None => diff,
    };

    let system = match library.resolve_system_prompt(
        opts.system.as_deref(),
        opts.prompt_style.as_deref(),
        &config.prompt,
    ) {
        Ok(system) => system,
        Err(e) => {
            butler_hint("Use --list-prompts to see available styles.");
            return Err(e);
        }
    };

    let Some(draft) = generate_draft(&client, &system, &diff, opts.mode, opts.show_usage).await?
    else {
        return Ok(());
    };

    let final_message = if opts.yes {
        if draft.is_empty() {
            anyhow::bail!("the model returned an empty message and --yes was used; aborting commit");
        }
        println!("{}", cyan("\nUsing the generated message directly:"));
        println!("\"\"\"\n{draft}\n\"\"\"");
        Some(draft)
    } else {
        edit_draft(&config, &opts.editor, &client, &diff, &draft).await?
    };

    match final_message.filter(|m| !m.trim().is_empty()) {
        Some(message) => execute_commit(&repo, message.trim(), opts.mode),
        None => {
            info!("Commit aborted: empty final message");
            butler_say("Commit aborted.");
            Ok(())
        }
    }
}

/// 差分を読み込む。処理を続けられない場合は None。
///
/// ステージ済みの変更がなければ、すべての変更をステージするか確認する。
fn load_diff(repo: &Repo, mode: DiffMode) -> Result<Option<String>> {
    let diff = repo.diff(mode)?;
    if !diff.trim().is_empty() {
        return Ok(Some(diff));
    }

    match mode {
        DiffMode::Staged => {
            butler_say("No staged changes found.");
            show_status(repo);
            if !ask_yes_no("Do you want to stage all changes and commit?", true) {
                butler_say("Commit aborted.");
                return Ok(None);
            }

            butler_say("Staging all changes...");
            repo.stage_all()?;
            butler_success("Changes staged.");

            let diff = repo.diff(DiffMode::Staged)?;
            if diff.trim().is_empty() {
                butler_warn("No changes to commit even after staging.");
                return Ok(None);
            }
            Ok(Some(diff))
        }
        DiffMode::Tracked => {
            butler_say(&format!("No {} to commit.", mode.description()));
            show_status(repo);
            Ok(None)
        }
    }
}

fn show_status(repo: &Repo) {
    match repo.status_short() {
        Ok(lines) if lines.is_empty() => {
            butler_hint("Git status is clean (no changes detected).");
        }
        Ok(lines) => {
            println!("\nCurrent git status (--short):");
            for line in lines {
                println!("{line}");
            }
        }
        Err(e) => {
            debug!(error = %e, "Failed to read status");
            butler_warn("Could not retrieve git status.");
        }
    }
}

/// `max_chars` 文字を超える差分を文字境界で切り詰める。超えなければ None。
pub fn truncate_diff(diff: &str, max_chars: usize) -> Option<String> {
    let (cut, _) = diff.char_indices().nth(max_chars)?;
    Some(format!("{}{TRUNCATION_SUFFIX}", &diff[..cut]))
}

/// 最初の下書きを生成する。Ctrl-C で中断された場合は None。
async fn generate_draft(
    client: &dyn ModelClient,
    system: &str,
    diff: &str,
    mode: DiffMode,
    show_usage: bool,
) -> Result<Option<String>> {
    butler_say(&format!(
        "Generating commit message using {} based on {}...",
        bold(client.model_id()),
        mode.description()
    ));

    let spinner = butler_spinner("Thinking...");
    let result = interruptible(client.generate(system, diff, &[])).await;
    spinner.finish_and_clear();

    let reply = match result {
        Some(reply) => reply.context("error calling the model")?,
        None => {
            butler_warn("Generation interrupted.");
            return Ok(None);
        }
    };

    if show_usage {
        match reply.usage {
            Some(usage) => println!("{}", cyan(&format!("Token usage: {usage}"))),
            None => butler_warn("Token usage: not available for this model"),
        }
    }

    let draft = reply.text.trim().to_string();
    info!(draft_length = draft.len(), "Initial draft generated");
    if draft.is_empty() {
        butler_warn(
            "The model returned an empty commit message. Please write one manually or try again.",
        );
    }
    Ok(Some(draft))
}

/// エディタを決定して下書きを編集する。キャンセル時は None。
async fn edit_draft(
    config: &ButlerConfig,
    cli_editor: &EditorOverride,
    client: &dyn ModelClient,
    diff: &str,
    draft: &str,
) -> Result<Option<String>> {
    let choice = resolve::resolve(&config.editor, cli_editor, &SystemEnv);

    match choice {
        EditorChoice::Internal => {
            let env_requested = match cli_editor {
                EditorOverride::UseEnvironment => true,
                EditorOverride::Absent => config.editor.trim().eq_ignore_ascii_case(ENVIRONMENT),
                EditorOverride::Command(_) => false,
            };
            if env_requested {
                butler_warn(
                    "Warning: No external editor found in environment. Using built-in editor.",
                );
            }

            println!("{}", cyan("\nSuggested commit message (edit below):"));
            InlineEditor::print_instructions();
            let mut editor = InlineEditor::new();
            let mut terminal = ChatTerminal::new();
            Ok(edit_interactively(&mut editor, &mut terminal, client, diff, draft).await)
        }
        EditorChoice::EnvironmentDetected(command) | EditorChoice::ExplicitCommand(command) => {
            println!(
                "{}",
                cyan(&format!("\nOpening {command} to edit commit message..."))
            );
            edit_with_external_editor(draft, &command)
        }
    }
}

/// 確認のうえでコミットし、続けてプッシュするか尋ねる。
fn execute_commit(repo: &Repo, message: &str, mode: DiffMode) -> Result<()> {
    println!("\n{} with message:", commit::action_description(mode));
    println!("{}", yellow(&format!("\"\"\"\n{message}\n\"\"\"")));

    if !ask_yes_no("Proceed?", true) {
        butler_say("Commit aborted by user.");
        return Ok(());
    }

    let output = commit::commit(repo.workdir(), message, mode)?;
    butler_success("Commit successful!");
    print_git_output(&output);

    // プッシュは外部に公開される操作なので既定は No
    if ask_yes_no("Do you want to push the changes?", false) {
        butler_say("Pushing changes...");
        match commit::push(repo.workdir()) {
            Ok(output) => {
                butler_success("Push successful!");
                print_git_output(&output);
            }
            Err(e) => butler_error(&format!("{e:#}")),
        }
    }
    Ok(())
}

fn print_git_output(output: &commit::GitOutput) {
    if !output.stdout.trim().is_empty() {
        println!("{}", output.stdout.trim_end());
    }
    if !output.stderr.trim().is_empty() {
        butler_hint(output.stderr.trim_end());
    }
}

fn print_prompt_list(library: &PromptLibrary, current: &str) {
    println!("Available prompt styles:\n");
    for (name, description) in library.list() {
        let marker = if name == current { " (current)" } else { "" };
        println!("  {} {description}{marker}", bold(&format!("{name:20}")));
    }
    println!("\nPrompt files location: {}", library.dir().display());
    println!("\nUsage: commit-butler --prompt-style <style>");
    println!("       commit-butler config --prompt <style>  (set as default)");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_diff_is_untouched() {
        assert_eq!(truncate_diff("abc", 3), None);
        assert_eq!(truncate_diff("abc", 10), None);
    }

    #[test]
    fn long_diff_is_cut_with_suffix() {
        assert_eq!(
            truncate_diff("abcdef", 4).as_deref(),
            Some("abcd\n\n... [diff truncated]")
        );
    }

    #[test]
    fn zero_max_chars_in_config_keeps_the_diff() {
        let config: ButlerConfig = toml::from_str("max-chars = 0").unwrap();
        let diff = "diff --git a/x b/x\n+added line\n";
        assert_eq!(truncate_diff(diff, config.effective_max_chars(None)), None);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // マルチバイト文字の途中で切らない
        let diff = "日本語のdiff";
        assert_eq!(
            truncate_diff(diff, 2).as_deref(),
            Some("日本\n\n... [diff truncated]")
        );
    }
}
