//! Minimal Telegram Bot API client: long polling in, text and reply keyboards out.

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{future::Future, sync::Arc, time::Duration};
use tokio_util::task::TaskTracker;
use weather_bot_core::{Config, Dispatcher, Reply};

const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct KeyboardButton<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct ReplyKeyboardMarkup<'a> {
    keyboard: Vec<Vec<KeyboardButton<'a>>>,
    resize_keyboard: bool,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ReplyKeyboardMarkup<'a>>,
}

#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: Client,
    base_url: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str, config: &Config) -> Result<Self> {
        let poll_timeout = config.poll_timeout();
        // Long polls legitimately hold the connection for `poll_timeout`.
        let http = Client::builder()
            .timeout(poll_timeout + config.request_timeout())
            .build()
            .context("Failed to build Telegram HTTP client")?;

        Ok(Self {
            http,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            poll_timeout,
        })
    }

    /// One Bot API call. The URL path holds the bot token, so it is stripped from
    /// transport errors before they reach a log line.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, method);

        let res = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Failed to send Telegram `{method}` request"))?;

        let status = res.status();
        let parsed: ApiResponse<T> = res
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Failed to parse Telegram `{method}` response ({status})"))?;

        if !parsed.ok {
            return Err(anyhow!(
                "Telegram `{method}` failed with status {status}: {}",
                parsed.description.unwrap_or_default()
            ));
        }

        parsed
            .result
            .ok_or_else(|| anyhow!("Telegram `{method}` returned no result"))
    }

    /// Polling does not work while a webhook is registered.
    pub async fn delete_webhook(&self) -> Result<()> {
        let _: bool = self
            .call(
                "deleteWebhook",
                &serde_json::json!({ "drop_pending_updates": true }),
            )
            .await?;
        Ok(())
    }

    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &serde_json::json!({
                "offset": offset,
                "timeout": self.poll_timeout.as_secs(),
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    pub async fn send_reply(&self, chat_id: i64, reply_to: i64, reply: &Reply) -> Result<()> {
        let reply_markup = match reply.options() {
            [] => None,
            options => Some(ReplyKeyboardMarkup {
                keyboard: options
                    .iter()
                    .map(|text| vec![KeyboardButton { text: text.as_str() }])
                    .collect(),
                resize_keyboard: true,
            }),
        };

        let body = SendMessage {
            chat_id,
            text: reply.text(),
            reply_to_message_id: Some(reply_to),
            reply_markup,
        };

        let _: serde_json::Value = self.call("sendMessage", &body).await?;
        Ok(())
    }
}

/// Poll Telegram until Ctrl-C, answering every text message on its own task.
pub async fn run(config: &Config) -> Result<()> {
    let token = config.bot_token()?;
    let client = Arc::new(TelegramClient::new(
        &config.endpoints.telegram,
        token,
        config,
    )?);
    let dispatcher = Arc::new(Dispatcher::from_config(config)?);

    client
        .delete_webhook()
        .await
        .context("Failed to drop Telegram webhook")?;
    tracing::info!("Bot started, polling for updates");

    poll(client, dispatcher, tokio::signal::ctrl_c()).await
}

/// Long-poll loop. Stops at the next `getUpdates` call or retry delay after
/// `shutdown` resolves; in-flight replies are allowed to finish before returning.
async fn poll<S: Future>(
    client: Arc<TelegramClient>,
    dispatcher: Arc<Dispatcher>,
    shutdown: S,
) -> Result<()> {
    let tasks = TaskTracker::new();
    tokio::pin!(shutdown);

    let mut offset = 0;
    loop {
        let updates = tokio::select! {
            _ = &mut shutdown => break,
            updates = client.get_updates(offset) => updates,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!("getUpdates failed: {e:#}; retrying in {RETRY_DELAY:?}");
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(RETRY_DELAY) => continue,
                }
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            let Some(text) = message.text else {
                tracing::debug!("Skipping non-text message {}", message.message_id);
                continue;
            };

            let (chat_id, message_id) = (message.chat.id, message.message_id);
            let client = Arc::clone(&client);
            let dispatcher = Arc::clone(&dispatcher);
            tasks.spawn(async move {
                let reply = dispatcher.handle_or_apologize(&text).await;
                if let Err(e) = client.send_reply(chat_id, message_id, &reply).await {
                    tracing::error!("Failed to reply in chat {chat_id}: {e:#}");
                }
            });
        }
    }

    tasks.close();
    tracing::info!("Shutting down, waiting for {} pending reply(ies)", tasks.len());
    tasks.wait().await;
    Ok(())
}
