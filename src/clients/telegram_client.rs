use serde::Serialize;
use tracing::debug;

use crate::error::NotifierError;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SendMessageRequest<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
    pub parse_mode: &'a str,
}

impl<'a> SendMessageRequest<'a> {
    pub fn html(chat_id: &'a str, text: &'a str) -> Self {
        Self {
            chat_id,
            text,
            parse_mode: "HTML",
        }
    }
}

pub fn send_message_url(api_base: &str, bot_token: &str) -> String {
    format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), bot_token)
}

/// Posts an HTML message to a chat through the bot API.
pub async fn send_telegram_message(
    http: &reqwest::Client,
    api_base: &str,
    bot_token: &str,
    chat_id: &str,
    text: &str,
) -> Result<(), NotifierError> {
    let request = SendMessageRequest::html(chat_id, text);
    let response = http
        .post(send_message_url(api_base, bot_token))
        .header("Content-Type", "application/json")
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(NotifierError::Status {
            status: status.as_u16(),
            body,
        });
    }
    debug!(chat_id, "Telegram notification sent");
    Ok(())
}
