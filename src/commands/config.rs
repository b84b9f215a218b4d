//! `config` サブコマンド
//!
//! 既定値（モデル・プロンプト・エディタ・最大文字数）の表示と変更。

use std::path::Path;

use anyhow::{bail, Result};
use tracing::info;

use crate::ai::prompts::DEFAULT_MODEL;
use crate::cli::butler::{ask_yes_no, butler_say};
use crate::cli::color::{bold, cyan};
use crate::config::ButlerConfig;
use crate::editor::resolve::{detect_from_env, SystemEnv, ENVIRONMENT, INTERNAL};
use crate::prompts::PromptLibrary;

/// `config` サブコマンドのオプション
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub view: bool,
    pub reset: bool,
    pub model: Option<String>,
    pub prompt: Option<String>,
    pub editor: Option<String>,
    pub max_chars: Option<usize>,
    pub show_prompt: bool,
}

impl ConfigOptions {
    fn has_updates(&self) -> bool {
        self.model.is_some()
            || self.prompt.is_some()
            || self.editor.is_some()
            || self.max_chars.is_some()
    }
}

pub fn run(opts: ConfigOptions) -> Result<()> {
    let library = PromptLibrary::default_location();
    if let Err(e) = library.install() {
        butler_say(&format!("Could not install prompt files: {e}"));
    }
    let path = ButlerConfig::config_path();
    let mut config = ButlerConfig::load_from(&path);
    let env_editor = detect_from_env(&SystemEnv);

    if opts.view || !(opts.reset || opts.show_prompt || opts.has_updates()) {
        print_config(&config, &library, &path, env_editor.as_deref());
        return Ok(());
    }

    if opts.show_prompt {
        println!("{}", bold(&format!("Current prompt ({}):\n", config.prompt)));
        println!(
            "{}",
            cyan(&format!("File: {}\n", library.path_for(&config.prompt).display()))
        );
        println!("{}", library.resolve_system_prompt(None, None, &config.prompt)?);
        return Ok(());
    }

    if opts.reset {
        if ask_yes_no("Are you sure you want to reset all configurations?", false) {
            ButlerConfig::reset_at(&path)?;
            butler_say("Configuration has been reset.");
        } else {
            butler_say("Reset cancelled.");
        }
        return Ok(());
    }

    let messages = apply_updates(&mut config, &opts, &library, env_editor.as_deref())?;
    config.save_to(&path)?;
    for message in messages {
        butler_say(&message);
    }
    Ok(())
}

/// オプションの変更を設定に反映し、表示用のメッセージを返す。
///
/// プロンプト名が見つからない場合は何も変更せずにエラーを返す。
fn apply_updates(
    config: &mut ButlerConfig,
    opts: &ConfigOptions,
    library: &PromptLibrary,
    env_editor: Option<&str>,
) -> Result<Vec<String>> {
    if let Some(prompt) = &opts.prompt {
        if library.get(prompt).is_none() {
            bail!(
                "prompt '{prompt}' not found. Create a prompt file at: {} (or use --list-prompts)",
                library.path_for(prompt).display()
            );
        }
    }

    if opts.max_chars == Some(0) {
        bail!("max-chars must be greater than 0");
    }

    let mut messages = Vec::new();

    if let Some(model) = &opts.model {
        config.model = Some(model.clone());
        messages.push(format!("Default model set to: {model}"));
    }

    if let Some(prompt) = &opts.prompt {
        config.prompt = prompt.clone();
        messages.push(format!("Default prompt set to: {prompt}"));
        messages.push(format!(
            "Edit the prompt at: {}",
            library.path_for(prompt).display()
        ));
    }

    if let Some(editor) = &opts.editor {
        let editor = editor.trim();
        if editor.eq_ignore_ascii_case(INTERNAL) {
            config.editor = INTERNAL.to_string();
            messages.push("Editor set to: internal (built-in line editor)".to_string());
        } else if editor.eq_ignore_ascii_case(ENVIRONMENT) {
            config.editor = ENVIRONMENT.to_string();
            messages.push(match env_editor {
                Some(found) => format!("Editor set to: env (currently: {found})"),
                None => "Editor set to: env (no editor found in environment, will fall back to internal)"
                    .to_string(),
            });
        } else {
            config.editor = editor.to_string();
            messages.push(format!("Editor set to: {editor}"));
        }
    }

    if let Some(max_chars) = opts.max_chars {
        config.max_chars = max_chars;
        messages.push(format!("Default max-chars set to: {max_chars}"));
    }

    info!(updates = messages.len(), "Config updated");
    Ok(messages)
}

fn print_config(
    config: &ButlerConfig,
    library: &PromptLibrary,
    path: &Path,
    env_editor: Option<&str>,
) {
    println!("{}", bold("commit-butler configuration\n"));
    println!("Config file:    {}", path.display());
    println!("Prompts dir:    {}", library.dir().display());
    println!();

    match &config.model {
        Some(model) => println!("Model:          {model}"),
        None => println!("Model:          (default: {DEFAULT_MODEL})"),
    }

    println!(
        "Prompt:         {} - {}",
        config.prompt,
        library.description(&config.prompt)
    );
    println!("Prompt file:    {}", library.path_for(&config.prompt).display());

    let editor = config.editor.trim();
    if editor.is_empty() || editor.eq_ignore_ascii_case(INTERNAL) {
        println!("Editor:         internal (built-in line editor)");
    } else if editor.eq_ignore_ascii_case(ENVIRONMENT) {
        println!(
            "Editor:         env -> {}",
            env_editor.unwrap_or("(not found, will use internal)")
        );
    } else {
        println!("Editor:         {editor}");
    }
    if let Some(found) = env_editor {
        println!("Env editor:     {found}");
    }

    println!("Max chars:      {}", config.max_chars);
    if let Some(secs) = config.timeout_secs {
        println!("Timeout:        {secs}s");
    }

    println!();
    println!("Use --show-prompt to see the full prompt text.");
    println!("Edit prompt files directly in: {}", library.dir().display());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> (tempfile::TempDir, PromptLibrary) {
        let tmp = tempfile::TempDir::new().unwrap();
        let library = PromptLibrary::new(tmp.path().join("prompts"));
        (tmp, library)
    }

    #[test]
    fn updates_are_applied_and_echoed() {
        let (_tmp, library) = library();
        let mut config = ButlerConfig::default();
        let opts = ConfigOptions {
            model: Some("gpt-4o".into()),
            prompt: Some("gitmoji".into()),
            max_chars: Some(9000),
            ..ConfigOptions::default()
        };

        let messages = apply_updates(&mut config, &opts, &library, None).unwrap();
        assert_eq!(config.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.prompt, "gitmoji");
        assert_eq!(config.max_chars, 9000);
        assert_eq!(messages[0], "Default model set to: gpt-4o");
        assert!(messages.iter().any(|m| m == "Default max-chars set to: 9000"));
    }

    #[test]
    fn unknown_prompt_is_rejected_without_changes() {
        let (_tmp, library) = library();
        let mut config = ButlerConfig::default();
        let opts = ConfigOptions {
            model: Some("gpt-4o".into()),
            prompt: Some("does-not-exist".into()),
            ..ConfigOptions::default()
        };

        let err = apply_updates(&mut config, &opts, &library, None).unwrap_err();
        assert!(err.to_string().contains("prompt 'does-not-exist' not found"));
        assert_eq!(config, ButlerConfig::default());
    }

    #[test]
    fn zero_max_chars_is_rejected_without_changes() {
        let (_tmp, library) = library();
        let mut config = ButlerConfig::default();
        let opts = ConfigOptions {
            model: Some("gpt-4o".into()),
            max_chars: Some(0),
            ..ConfigOptions::default()
        };

        let err = apply_updates(&mut config, &opts, &library, None).unwrap_err();
        assert!(err.to_string().contains("max-chars must be greater than 0"));
        assert_eq!(config, ButlerConfig::default());
    }

    #[test]
    fn editor_keywords_are_case_insensitive() {
        let (_tmp, library) = library();
        let mut config = ButlerConfig::default();

        let opts = ConfigOptions {
            editor: Some("ENV".into()),
            ..ConfigOptions::default()
        };
        let messages = apply_updates(&mut config, &opts, &library, Some("nvim")).unwrap();
        assert_eq!(config.editor, "env");
        assert_eq!(messages, vec!["Editor set to: env (currently: nvim)"]);

        let opts = ConfigOptions {
            editor: Some("Internal".into()),
            ..ConfigOptions::default()
        };
        apply_updates(&mut config, &opts, &library, None).unwrap();
        assert_eq!(config.editor, "internal");
    }

    #[test]
    fn editor_command_is_kept_verbatim() {
        let (_tmp, library) = library();
        let mut config = ButlerConfig::default();
        let opts = ConfigOptions {
            editor: Some("code --wait".into()),
            ..ConfigOptions::default()
        };
        apply_updates(&mut config, &opts, &library, None).unwrap();
        assert_eq!(config.editor, "code --wait");
    }

    #[test]
    fn has_updates_ignores_view_flags() {
        let opts = ConfigOptions {
            view: true,
            show_prompt: true,
            ..ConfigOptions::default()
        };
        assert!(!opts.has_updates());
    }
}
