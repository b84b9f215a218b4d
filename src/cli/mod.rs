//! 端末まわり: 色、プロンプト、Butler の発話と確認、チャット入力

pub mod butler;
pub mod chat;
pub mod color;
pub mod prompt;
