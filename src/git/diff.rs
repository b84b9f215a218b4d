//! 差分の取得とリポジトリ操作（git2）

use std::path::Path;

use anyhow::{Context, Result};
use git2::{DiffFormat, DiffOptions, IndexAddOption, Repository, Status, StatusOptions};
use tracing::{debug, info};

/// どの変更からコミットメッセージを作るか
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffMode {
    /// ステージ済みの変更（`git diff --staged`）
    #[default]
    Staged,
    /// 追跡ファイルのすべての変更（`git diff HEAD`）
    Tracked,
}

impl DiffMode {
    pub fn description(&self) -> &'static str {
        match self {
            DiffMode::Staged => "staged changes",
            DiffMode::Tracked => "all changes in tracked files",
        }
    }

    /// コミット時に `-a` を付けるか
    pub fn commits_all_tracked(&self) -> bool {
        matches!(self, DiffMode::Tracked)
    }
}

/// 作業中の git リポジトリ
pub struct Repo {
    repo: Repository,
}

impl Repo {
    /// `path` から親方向にリポジトリを探す。
    pub fn discover(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path).context("not inside a git repository")?;
        if repo.is_bare() {
            anyhow::bail!("not inside a git repository (bare repository)");
        }
        debug!(path = %repo.path().display(), "Repository discovered");
        Ok(Self { repo })
    }

    /// 作業ツリーのルート
    pub fn workdir(&self) -> &Path {
        self.repo.workdir().unwrap_or_else(|| self.repo.path())
    }

    /// 差分をパッチ形式のテキストで返す。
    ///
    /// HEAD が未生成（最初のコミット前）の場合は空のツリーと比較する。
    pub fn diff(&self, mode: DiffMode) -> Result<String> {
        let head_tree = self.repo.head().ok().and_then(|h| h.peel_to_tree().ok());
        let mut opts = DiffOptions::new();
        opts.ignore_submodules(true);

        let diff = match mode {
            DiffMode::Staged => self
                .repo
                .diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts)),
            DiffMode::Tracked => self
                .repo
                .diff_tree_to_workdir_with_index(head_tree.as_ref(), Some(&mut opts)),
        }
        .with_context(|| format!("failed to compute diff of {}", mode.description()))?;

        let mut buf = Vec::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            // 追加・削除・文脈行は origin 文字が content に含まれない
            if matches!(line.origin(), '+' | '-' | ' ') {
                buf.push(line.origin() as u8);
            }
            buf.extend_from_slice(line.content());
            true
        })
        .context("failed to render diff")?;

        let text = String::from_utf8_lossy(&buf).into_owned();
        info!(mode = ?mode, length = text.len(), "Diff retrieved");
        Ok(text)
    }

    /// `git status --short` 形式の行を返す（変更がなければ空）。
    pub fn status_short(&self) -> Result<Vec<String>> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .context("failed to read repository status")?;

        Ok(statuses
            .iter()
            .filter_map(|entry| {
                let code = short_code(entry.status())?;
                let path = entry.path()?;
                Some(format!("{code} {path}"))
            })
            .collect())
    }

    /// 作業ツリーのすべての変更（新規・変更・削除）をステージする。
    pub fn stage_all(&self) -> Result<()> {
        let mut index = self.repo.index().context("failed to open the index")?;
        index
            .add_all(["*"], IndexAddOption::DEFAULT, None)
            .context("failed to stage changes")?;
        index
            .update_all(["*"], None)
            .context("failed to stage removals")?;
        index.write().context("failed to write the index")?;
        info!("Staged all changes");
        Ok(())
    }
}

/// ステータスを `XY` の 2 文字コードに変換する。未追跡は `??`。
fn short_code(status: Status) -> Option<String> {
    if status.contains(Status::WT_NEW) && !status.intersects(index_flags()) {
        return Some("??".to_string());
    }

    let x = if status.contains(Status::INDEX_NEW) {
        'A'
    } else if status.contains(Status::INDEX_MODIFIED) {
        'M'
    } else if status.contains(Status::INDEX_DELETED) {
        'D'
    } else if status.contains(Status::INDEX_RENAMED) {
        'R'
    } else if status.contains(Status::INDEX_TYPECHANGE) {
        'T'
    } else {
        ' '
    };

    let y = if status.contains(Status::WT_MODIFIED) {
        'M'
    } else if status.contains(Status::WT_DELETED) {
        'D'
    } else if status.contains(Status::WT_RENAMED) {
        'R'
    } else if status.contains(Status::WT_TYPECHANGE) {
        'T'
    } else {
        ' '
    };

    (x != ' ' || y != ' ').then(|| format!("{x}{y}"))
}

fn index_flags() -> Status {
    Status::INDEX_NEW
        | Status::INDEX_MODIFIED
        | Status::INDEX_DELETED
        | Status::INDEX_RENAMED
        | Status::INDEX_TYPECHANGE
}
