//! プロンプトライブラリ
//!
//! システムプロンプトはスタイル名ごとのテキストファイルとして
//! `~/.config/commit-butler/prompts/<style>.txt` に置かれる。
//! 組み込みスタイルはバイナリに埋め込まれ、初回実行時にインストールされる。
//! ユーザーはファイルを直接編集したり、新しいファイルを追加したりできる。

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use crate::ai::prompts::FALLBACK_SYSTEM_PROMPT;
use crate::config::{ButlerConfig, DEFAULT_PROMPT_STYLE};

/// 組み込みスタイル
struct BuiltinStyle {
    name: &'static str,
    description: &'static str,
    text: &'static str,
}

const BUILTIN_STYLES: &[BuiltinStyle] = &[
    BuiltinStyle {
        name: "conventional",
        description: "Conventional Commits format (feat:, fix:, etc.) [Default]",
        text: include_str!("../prompts/conventional.txt"),
    },
    BuiltinStyle {
        name: "detailed",
        description: "Detailed multi-paragraph messages with context",
        text: include_str!("../prompts/detailed.txt"),
    },
    BuiltinStyle {
        name: "minimal",
        description: "Short single-line messages only",
        text: include_str!("../prompts/minimal.txt"),
    },
    BuiltinStyle {
        name: "semantic",
        description: "Semantic commits with scope: type(scope): description",
        text: include_str!("../prompts/semantic.txt"),
    },
    BuiltinStyle {
        name: "gitmoji",
        description: "Gitmoji-style with emoji prefixes",
        text: include_str!("../prompts/gitmoji.txt"),
    },
    BuiltinStyle {
        name: "custom",
        description: "Editable custom prompt - edit prompts/custom.txt to customize",
        text: include_str!("../prompts/custom.txt"),
    },
];

fn builtin(name: &str) -> Option<&'static BuiltinStyle> {
    BUILTIN_STYLES.iter().find(|style| style.name == name)
}

/// スタイル名として受け付けるか（ディレクトリ外を指す名前は拒否する）
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
}

/// プロンプトファイルの置き場所と解決ロジック
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    dir: PathBuf,
}

impl PromptLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.config/commit-butler/prompts`
    pub fn default_location() -> Self {
        Self::new(ButlerConfig::config_dir().join("prompts"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.txt"))
    }

    /// 組み込みスタイルのうち、まだファイルがないものを書き出す。
    /// 既存ファイルは上書きしない。戻り値は新たに書き出したファイル数。
    pub fn install(&self) -> Result<usize> {
        std::fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create prompts directory {}", self.dir.display())
        })?;

        let mut installed = 0;
        for style in BUILTIN_STYLES {
            let path = self.path_for(style.name);
            if path.exists() {
                continue;
            }
            std::fs::write(&path, style.text)
                .with_context(|| format!("failed to install prompt {}", path.display()))?;
            installed += 1;
        }

        if installed > 0 {
            info!(dir = %self.dir.display(), installed, "Installed built-in prompts");
        }
        Ok(installed)
    }

    /// スタイル名からプロンプト本文を取得する（trim 済み）。
    ///
    /// インストール済みファイルを優先し、なければ埋め込みテキストを使う。
    pub fn get(&self, name: &str) -> Option<String> {
        if !is_valid_name(name) {
            warn!(name, "Rejected prompt style name");
            return None;
        }

        let path = self.path_for(name);
        if let Ok(content) = std::fs::read_to_string(&path) {
            let content = content.trim();
            if !content.is_empty() {
                return Some(content.to_string());
            }
        }

        builtin(name)
            .map(|style| style.text.trim().to_string())
            .filter(|text| !text.is_empty())
    }

    /// スタイルの説明文
    ///
    /// 独自スタイルは `Custom: {name}`（一覧表示の `Custom prompt: {name}` とは別表記）。
    pub fn description(&self, name: &str) -> String {
        match builtin(name) {
            Some(style) => style.description.to_string(),
            None => format!("Custom: {name}"),
        }
    }

    /// 利用可能なスタイル一覧（名前, 説明）。
    ///
    /// 組み込みスタイルを定義順に並べ、プロンプトディレクトリにある
    /// それ以外の `*.txt` を名前順で続ける。
    pub fn list(&self) -> Vec<(String, String)> {
        let mut styles: Vec<(String, String)> = BUILTIN_STYLES
            .iter()
            .filter(|style| self.get(style.name).is_some())
            .map(|style| (style.name.to_string(), style.description.to_string()))
            .collect();

        let mut extra: Vec<String> = std::fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
                    .filter_map(|path| {
                        path.file_stem()
                            .and_then(|stem| stem.to_str())
                            .map(str::to_string)
                    })
                    .filter(|name| builtin(name).is_none())
                    .collect()
            })
            .unwrap_or_default();
        extra.sort();

        styles.extend(
            extra
                .into_iter()
                // `description()` の `Custom: {name}` とは別表記
                .map(|name| (name.clone(), format!("Custom prompt: {name}"))),
        );
        styles
    }

    /// 使用するシステムプロンプトを決定する。
    ///
    /// 優先順位: `--system` の本文 > `--prompt-style`（見つからなければエラー） >
    /// 設定の `prompt` > 既定スタイル > 組み込みのフォールバック
    pub fn resolve_system_prompt(
        &self,
        system_override: Option<&str>,
        style_override: Option<&str>,
        configured: &str,
    ) -> Result<String> {
        if let Some(system) = system_override.filter(|s| !s.trim().is_empty()) {
            debug!("Using system prompt from command line");
            return Ok(system.to_string());
        }

        if let Some(style) = style_override {
            return match self.get(style) {
                Some(text) => {
                    debug!(style, "Using prompt style from command line");
                    Ok(text)
                }
                None => bail!(
                    "prompt style '{style}' not found. Create {} or use --list-prompts",
                    self.path_for(style).display()
                ),
            };
        }

        for name in [configured, DEFAULT_PROMPT_STYLE] {
            if let Some(text) = self.get(name) {
                debug!(style = name, "Using configured prompt style");
                return Ok(text);
            }
        }

        warn!("No prompt style resolved, using fallback system prompt");
        Ok(FALLBACK_SYSTEM_PROMPT.to_string())
    }
}
