//! エディタの決定
//!
//! 設定ファイルの `editor`、CLI の `-e/--editor`、環境変数から、
//! コミットメッセージを編集するエディタを一度だけ決定する。

use tracing::debug;

/// ツール専用のエディタ指定環境変数
pub const EDITOR_ENV_VAR: &str = "COMMIT_BUTLER_EDITOR";

/// 設定値 `internal`
pub const INTERNAL: &str = "internal";
/// 設定値 `env`
pub const ENVIRONMENT: &str = "env";

/// 決定されたエディタ
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorChoice {
    /// 組み込みのラインエディタ（チャット改善あり）
    Internal,
    /// 環境から検出した外部エディタ
    EnvironmentDetected(String),
    /// 明示的に指定された外部エディタコマンド
    ExplicitCommand(String),
}

/// CLI の `-e/--editor` 指定
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditorOverride {
    /// 指定なし
    #[default]
    Absent,
    /// 値なしの `-e`（環境から検出）
    UseEnvironment,
    /// 値付きの `-e <command>`
    Command(String),
}

impl EditorOverride {
    /// clap から受け取った値を変換する（値なし `-e` は `env` として届く）。
    pub fn from_cli(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None => EditorOverride::Absent,
            Some(v) if v.is_empty() || v.eq_ignore_ascii_case(ENVIRONMENT) => {
                EditorOverride::UseEnvironment
            }
            Some(v) => EditorOverride::Command(v.to_string()),
        }
    }
}

/// エディタ検出に使う環境
pub trait EditorEnv {
    /// 環境変数を読む
    fn var(&self, key: &str) -> Option<String>;
    /// git の `core.editor` 設定を読む
    fn git_core_editor(&self) -> Option<String>;
}

/// 実際のプロセス環境と git 設定
pub struct SystemEnv;

impl EditorEnv for SystemEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn git_core_editor(&self) -> Option<String> {
        let config = std::env::current_dir()
            .ok()
            .and_then(|cwd| git2::Repository::discover(cwd).ok())
            .and_then(|repo| repo.config().ok())
            .or_else(|| git2::Config::open_default().ok())?;
        config.get_string("core.editor").ok()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 環境からエディタを検出する。
///
/// 優先順位: `COMMIT_BUTLER_EDITOR` > git `core.editor` > `VISUAL` > `EDITOR`
pub fn detect_from_env(env: &dyn EditorEnv) -> Option<String> {
    non_empty(env.var(EDITOR_ENV_VAR))
        .or_else(|| non_empty(env.git_core_editor()))
        .or_else(|| non_empty(env.var("VISUAL")))
        .or_else(|| non_empty(env.var("EDITOR")))
}

fn from_environment(env: &dyn EditorEnv) -> EditorChoice {
    match detect_from_env(env) {
        Some(command) => EditorChoice::EnvironmentDetected(command),
        // 環境にエディタがなければ組み込みエディタにフォールバック
        None => EditorChoice::Internal,
    }
}

/// 使用するエディタを決定する。
///
/// 優先順位: CLI のコマンド指定 > CLI の `-e`（環境） > 設定のコマンド >
/// 設定の `env` > 組み込みエディタ
pub fn resolve(setting: &str, cli: &EditorOverride, env: &dyn EditorEnv) -> EditorChoice {
    let choice = match cli {
        EditorOverride::Command(command) if command.eq_ignore_ascii_case(INTERNAL) => {
            EditorChoice::Internal
        }
        EditorOverride::Command(command) => EditorChoice::ExplicitCommand(command.clone()),
        EditorOverride::UseEnvironment => from_environment(env),
        EditorOverride::Absent => {
            let setting = setting.trim();
            if setting.is_empty() || setting.eq_ignore_ascii_case(INTERNAL) {
                EditorChoice::Internal
            } else if setting.eq_ignore_ascii_case(ENVIRONMENT) {
                from_environment(env)
            } else {
                EditorChoice::ExplicitCommand(setting.to_string())
            }
        }
    };

    debug!(setting = %setting, cli = ?cli, choice = ?choice, "Editor resolved");
    choice
}
