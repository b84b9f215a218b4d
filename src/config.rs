//! 設定ファイル管理
//!
//! `~/.config/commit-butler/config.toml` から TOML 形式の設定を読み込む。
//! ファイルが存在しない場合はテンプレートを生成し、デフォルト値を使用する。
//!
//! # 設定ファイル例
//!
//! ```toml
//! model = "gpt-4o"
//! prompt = "conventional"
//! editor = "internal"
//! max-chars = 15000
//! timeout-secs = 60
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// 既定のプロンプトスタイル
pub const DEFAULT_PROMPT_STYLE: &str = "conventional";
/// 既定のエディタ設定
pub const DEFAULT_EDITOR: &str = "internal";
/// モデルに送る差分の既定の最大文字数
pub const DEFAULT_MAX_CHARS: usize = 15000;

const TEMPLATE: &str = r#"# commit-butler configuration
#
# You can write setting like this:

# model = "gpt-4o-mini"
# prompt = "conventional"    # conventional, detailed, minimal, semantic, gitmoji, custom
# editor = "internal"        # internal, env, or a command such as "code --wait"
# max-chars = 15000
# timeout-secs = 60
"#;

/// commit-butler の設定全体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ButlerConfig {
    /// 使用するモデル名（未設定なら既定モデル）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// プロンプトスタイル名
    pub prompt: String,
    /// `internal` / `env` / エディタコマンド
    pub editor: String,
    /// モデルに送る差分の最大文字数
    pub max_chars: usize,
    /// モデル呼び出しのタイムアウト（秒）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for ButlerConfig {
    fn default() -> Self {
        Self {
            model: None,
            prompt: DEFAULT_PROMPT_STYLE.to_string(),
            editor: DEFAULT_EDITOR.to_string(),
            max_chars: DEFAULT_MAX_CHARS,
            timeout_secs: None,
        }
    }
}

impl ButlerConfig {
    /// 既定パスから設定を読み込む。
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// 指定パスから設定を読み込む。
    ///
    /// ファイルがなければテンプレートを生成してデフォルト値を返す。
    /// 読み込み・パースに失敗した場合は警告を表示してデフォルト値を返す。
    pub fn load_from(path: &Path) -> Self {
        debug!(path = %path.display(), "Loading config file");

        if !path.exists() {
            Self::create_default_config(path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<ButlerConfig>(&content) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        model = ?config.model,
                        prompt = %config.prompt,
                        editor = %config.editor,
                        max_chars = config.max_chars,
                        "Config loaded successfully"
                    );
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    eprintln!("commit-butler: warning: failed to parse config file: {e}");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config file");
                eprintln!("commit-butler: warning: failed to read config file: {e}");
                Self::default()
            }
        }
    }

    /// 指定パスに保存する（親ディレクトリがなければ作成する）。
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create config directory {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write config file {}", path.display()))?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// 設定ファイルを削除する。ファイルがなければ何もしない。
    pub fn reset_at(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)
                .with_context(|| format!("failed to remove config file {}", path.display()))?;
            info!(path = %path.display(), "Config reset");
        }
        Ok(())
    }

    /// 差分の最大文字数。CLI の値を優先し、0 は未設定として扱う。
    pub fn effective_max_chars(&self, cli: Option<usize>) -> usize {
        cli.filter(|n| *n > 0)
            .or(Some(self.max_chars).filter(|n| *n > 0))
            .unwrap_or(DEFAULT_MAX_CHARS)
    }

    /// モデル呼び出しのタイムアウト
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }

    /// 設定ディレクトリを返す。
    ///
    /// dotfiles として管理しやすいよう、XDG_CONFIG_HOME に依存しない固定パス
    /// `~/.config/commit-butler` を使用する。`$HOME` が取得できない場合は
    /// カレントディレクトリ基準にフォールバックする。
    pub fn config_dir() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".config/commit-butler")
    }

    /// 設定ファイルのパス
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// 設定ファイルが存在しない場合にテンプレートから生成する。
    /// 生成に失敗した場合は警告を表示するが、処理は継続する。
    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "Failed to create config directory");
                eprintln!("commit-butler: warning: failed to create config directory: {e}");
                return;
            }
        }

        match std::fs::write(path, TEMPLATE) {
            Ok(()) => {
                info!(path = %path.display(), "Created default config file");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to create default config file");
                eprintln!("commit-butler: warning: failed to create config file: {e}");
            }
        }
    }
}
