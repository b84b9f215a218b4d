//! git 連携
//!
//! - `diff`: 差分・ステータスの取得とステージ（git2）
//! - `commit`: `git commit` / `git push` の実行

pub mod commit;
mod diff;

pub use diff::{DiffMode, Repo};
