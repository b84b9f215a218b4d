//! AI モデルクライアント
//!
//! `ModelClient` トレイトはコミットメッセージ生成とチャット改善の両方が使う
//! 呼び出し口。`OpenAiClient` は async-openai を使った実装。
//! サーバー側のセッション状態は前提にせず、毎回必要な会話全体を送る。

use std::time::Duration;

use anyhow::{Context, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::prompts::DEFAULT_MODEL;
use super::types::{ChatTurn, ModelReply, Role, TokenUsage};

/// テキスト生成モデルへの呼び出し口
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// 表示用のモデル名
    fn model_id(&self) -> &str;

    /// 会話履歴をロール付きメッセージとして受け取れるかどうか。
    /// 構築時に決まり、呼び出しごとには変わらない。
    fn supports_history(&self) -> bool;

    /// `system` と `history`（古い順）に続けて `prompt` をユーザー発話として送る。
    /// 履歴非対応のクライアントには空の `history` が渡される。
    async fn generate(&self, system: &str, prompt: &str, history: &[ChatTurn])
        -> Result<ModelReply>;
}

/// OpenAI 互換 API のクライアント
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Option<Duration>,
}

impl OpenAiClient {
    /// API キーを `--key` 指定 → `OPENAI_API_KEY` の順で解決して初期化する。
    ///
    /// `OPENAI_BASE_URL` が設定されていれば接続先をそれに切り替える。
    pub fn new(model: Option<&str>, api_key: Option<&str>, timeout: Option<Duration>) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key.to_string(),
            None => std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY is not set. Pass --key or add it to .env")?,
        };

        if api_key.trim().is_empty() || api_key == "your_openai_api_key" {
            anyhow::bail!("OPENAI_API_KEY is not configured. Please set a valid API key");
        }

        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Ok(base) = std::env::var("OPENAI_BASE_URL") {
            if !base.trim().is_empty() {
                debug!(api_base = %base, "Using custom API base");
                config = config.with_api_base(base);
            }
        }

        let model = model.unwrap_or(DEFAULT_MODEL).to_string();
        info!(model = %model, timeout = ?timeout, "Model client initialized");

        Ok(Self {
            client: Client::with_config(config),
            model,
            timeout,
        })
    }

    fn build_messages(
        system: &str,
        prompt: &str,
        history: &[ChatTurn],
    ) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(history.len() + 2);
        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()?
                .into(),
        );

        for turn in history {
            let message = match turn.role {
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.content.as_str())
                    .build()?
                    .into(),
                Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.content.as_str())
                    .build()?
                    .into(),
            };
            messages.push(message);
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into(),
        );

        Ok(messages)
    }

    async fn request(&self, messages: Vec<ChatCompletionRequestMessage>) -> Result<ModelReply> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .context("Failed to build chat request")?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .context("Chat completion request failed")?;

        let text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();

        let usage = response.usage.map(|u| TokenUsage {
            input: u.prompt_tokens,
            output: u.completion_tokens,
        });

        Ok(ModelReply { text, usage })
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn supports_history(&self) -> bool {
        true
    }

    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        history: &[ChatTurn],
    ) -> Result<ModelReply> {
        let messages = Self::build_messages(system, prompt, history)?;
        debug!(
            model = %self.model,
            message_count = messages.len(),
            system_prompt_length = system.len(),
            prompt_length = prompt.len(),
            "Sending chat request"
        );

        let reply = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.request(messages)).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!(timeout = ?limit, "Model call timed out");
                    anyhow::bail!("model call timed out after {}s", limit.as_secs());
                }
            },
            None => self.request(messages).await?,
        };

        info!(
            response_length = reply.text.len(),
            usage = ?reply.usage,
            "Model replied"
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn new_fails_without_api_key() {
        let original = std::env::var("OPENAI_API_KEY").ok();
        std::env::remove_var("OPENAI_API_KEY");

        let result = OpenAiClient::new(None, None, None);
        assert!(result.is_err());

        if let Some(key) = original {
            std::env::set_var("OPENAI_API_KEY", key);
        }
    }

    #[test]
    fn new_rejects_placeholder_key() {
        let result = OpenAiClient::new(None, Some("your_openai_api_key"), None);
        assert!(result.is_err());
        let result = OpenAiClient::new(None, Some("   "), None);
        assert!(result.is_err());
    }

    #[test]
    fn explicit_key_and_model_are_used() {
        let client = OpenAiClient::new(Some("gpt-4o"), Some("sk-test"), None).unwrap();
        assert_eq!(client.model_id(), "gpt-4o");
        assert!(client.supports_history());
    }

    #[test]
    fn default_model_when_unspecified() {
        let client = OpenAiClient::new(None, Some("sk-test"), None).unwrap();
        assert_eq!(client.model_id(), DEFAULT_MODEL);
    }

    #[test]
    fn messages_wrap_history_between_system_and_prompt() {
        let history = vec![ChatTurn::user("shorter"), ChatTurn::assistant("ok")];
        let messages = OpenAiClient::build_messages("sys", "again", &history).unwrap();
        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(messages[3], ChatCompletionRequestMessage::User(_)));
    }
}
