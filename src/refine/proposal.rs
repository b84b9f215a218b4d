//! 提案ブロックの抽出
//!
//! AI の自由形式の応答から、マーカーで囲まれたコミットメッセージ案と
//! それ以外の会話テキストを切り出す。マーカーが揃っていない場合は
//! エラーにせず「提案なし・全文が会話」として扱う。

/// 提案ブロックの開始マーカー
pub const PROPOSAL_START: &str = "PROPOSED_COMMIT_MESSAGE_START";
/// 提案ブロックの終了マーカー
pub const PROPOSAL_END: &str = "PROPOSED_COMMIT_MESSAGE_END";

/// AI 応答 1 件を解析した結果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedResponse {
    /// 会話部分（前半 → 後半の順。空のセグメントは含まない）
    pub conversational: Vec<String>,
    /// マーカー間のコミットメッセージ案（trim 済み、空なら None）
    pub proposal: Option<String>,
}

impl ParsedResponse {
    /// 会話セグメントを改行で連結したテキストを返す。
    pub fn conversational_text(&self) -> String {
        self.conversational.join("\n")
    }

    fn conversation_only(raw: &str) -> Self {
        let trimmed = raw.trim();
        let conversational = if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
        Self {
            conversational,
            proposal: None,
        }
    }
}

/// AI の応答テキストを会話部分と提案部分に分割する。
///
/// - 開始マーカーがない → 全文（trim）が唯一の会話セグメント
/// - 開始マーカーの後に終了マーカーがない → 同上
/// - 両方ある → 前後のテキストが会話、間のテキストが提案
///
/// 最初に成立したマーカー対のみを採用する。終了マーカー以降のテキストは
/// 別のマーカーを含んでいても再解析せず、後半の会話セグメントにそのまま入る。
pub fn parse(raw: &str) -> ParsedResponse {
    let Some(start) = raw.find(PROPOSAL_START) else {
        return ParsedResponse::conversation_only(raw);
    };

    let content_start = start + PROPOSAL_START.len();
    let Some(end_offset) = raw[content_start..].find(PROPOSAL_END) else {
        return ParsedResponse::conversation_only(raw);
    };
    let end = content_start + end_offset;

    let before = raw[..start].trim();
    let after = raw[end + PROPOSAL_END.len()..].trim();
    let conversational = [before, after]
        .into_iter()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();

    let candidate = raw[content_start..end].trim();
    let proposal = (!candidate.is_empty()).then(|| candidate.to_string());

    ParsedResponse {
        conversational,
        proposal,
    }
}
