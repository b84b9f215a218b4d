//! コマンドライン定義とサブコマンドの振り分け

pub mod config;
pub mod generate;

use clap::{Args, Parser, Subcommand};

use crate::editor::resolve::EditorOverride;
use crate::git::DiffMode;

use self::config::ConfigOptions;
use self::generate::GenerateOptions;

/// commit-butler: AI でコミットメッセージを下書きし、チャットで仕上げてからコミットする
#[derive(Parser, Debug)]
#[command(
    name = "commit-butler",
    version,
    about = "Draft git commit messages with an AI model, refine them in a chat, and commit",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// ステージ済みの変更から生成する（git diff --staged）[既定]
    #[arg(long, conflicts_with = "tracked")]
    pub staged: bool,

    /// 追跡ファイルのすべての変更から生成する（git diff HEAD）
    #[arg(long)]
    pub tracked: bool,

    /// 使用するモデル（例: gpt-4o）
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// 既定のシステムプロンプトを置き換える
    #[arg(short = 's', long)]
    pub system: Option<String>,

    /// プロンプトスタイル（conventional, detailed, minimal, semantic, gitmoji, custom）
    #[arg(short = 'p', long = "prompt-style")]
    pub prompt_style: Option<String>,

    /// 利用可能なプロンプトスタイルを表示して終了する
    #[arg(long)]
    pub list_prompts: bool,

    /// モデルに送る差分の最大文字数
    #[arg(long)]
    pub max_chars: Option<usize>,

    /// API キー（OPENAI_API_KEY より優先）
    #[arg(long)]
    pub key: Option<String>,

    /// 編集せずに生成されたメッセージでコミットする
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// 外部エディタを使う。値なしなら環境から検出、値ありならそのコマンド
    #[arg(
        short = 'e',
        long,
        value_name = "COMMAND",
        num_args = 0..=1,
        default_missing_value = "env"
    )]
    pub editor: Option<String>,

    /// 生成後にトークン使用量を表示する
    #[arg(long)]
    pub usage: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 既定値の表示・変更
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// 現在の設定を表示する（オプションなしの既定動作）
    #[arg(long)]
    pub view: bool,

    /// 設定ファイルを削除して既定値に戻す
    #[arg(long)]
    pub reset: bool,

    /// 既定のモデル
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// 既定のプロンプトスタイル
    #[arg(short = 'p', long)]
    pub prompt: Option<String>,

    /// エディタ: internal / env / コマンド
    #[arg(short = 'e', long)]
    pub editor: Option<String>,

    /// 既定の最大文字数
    #[arg(long)]
    pub max_chars: Option<usize>,

    /// 現在のプロンプト本文を表示する
    #[arg(long)]
    pub show_prompt: bool,
}

impl Cli {
    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            mode: if self.tracked {
                DiffMode::Tracked
            } else {
                DiffMode::Staged
            },
            model: self.model.clone(),
            system: self.system.clone(),
            prompt_style: self.prompt_style.clone(),
            list_prompts: self.list_prompts,
            max_chars: self.max_chars,
            api_key: self.key.clone(),
            yes: self.yes,
            editor: EditorOverride::from_cli(self.editor.as_deref()),
            show_usage: self.usage,
        }
    }
}

impl From<ConfigArgs> for ConfigOptions {
    fn from(args: ConfigArgs) -> Self {
        ConfigOptions {
            view: args.view,
            reset: args.reset,
            model: args.model,
            prompt: args.prompt,
            editor: args.editor,
            max_chars: args.max_chars,
            show_prompt: args.show_prompt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_staged_generation() {
        let cli = Cli::try_parse_from(["commit-butler"]).unwrap();
        assert!(cli.command.is_none());
        let opts = cli.generate_options();
        assert_eq!(opts.mode, DiffMode::Staged);
        assert_eq!(opts.editor, EditorOverride::Absent);
        assert!(!opts.yes);
    }

    #[test]
    fn tracked_and_staged_conflict() {
        assert!(Cli::try_parse_from(["commit-butler", "--staged", "--tracked"]).is_err());
        let cli = Cli::try_parse_from(["commit-butler", "--tracked"]).unwrap();
        assert_eq!(cli.generate_options().mode, DiffMode::Tracked);
    }

    #[test]
    fn bare_editor_flag_means_environment() {
        let cli = Cli::try_parse_from(["commit-butler", "-e"]).unwrap();
        assert_eq!(cli.generate_options().editor, EditorOverride::UseEnvironment);
    }

    #[test]
    fn editor_flag_with_command() {
        let cli = Cli::try_parse_from(["commit-butler", "--editor", "code --wait"]).unwrap();
        assert_eq!(
            cli.generate_options().editor,
            EditorOverride::Command("code --wait".into())
        );
    }

    #[test]
    fn generation_flags() {
        let cli = Cli::try_parse_from([
            "commit-butler",
            "-m",
            "gpt-4o",
            "-p",
            "gitmoji",
            "--max-chars",
            "500",
            "--key",
            "sk-test",
            "-y",
            "--usage",
        ])
        .unwrap();
        let opts = cli.generate_options();
        assert_eq!(opts.model.as_deref(), Some("gpt-4o"));
        assert_eq!(opts.prompt_style.as_deref(), Some("gitmoji"));
        assert_eq!(opts.max_chars, Some(500));
        assert_eq!(opts.api_key.as_deref(), Some("sk-test"));
        assert!(opts.yes);
        assert!(opts.show_usage);
    }

    #[test]
    fn config_subcommand_parses_updates() {
        let cli = Cli::try_parse_from([
            "commit-butler",
            "config",
            "-m",
            "gpt-4o",
            "--editor",
            "env",
            "--max-chars",
            "8000",
        ])
        .unwrap();
        let Some(Command::Config(args)) = cli.command else {
            panic!("expected config subcommand");
        };
        let opts = ConfigOptions::from(args);
        assert_eq!(opts.model.as_deref(), Some("gpt-4o"));
        assert_eq!(opts.editor.as_deref(), Some("env"));
        assert_eq!(opts.max_chars, Some(8000));
        assert!(!opts.reset);
    }
}
