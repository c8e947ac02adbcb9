use serde::Deserialize;
use std::fmt::Debug;
use std::time::Duration;
use tokio::runtime::Runtime;

use crate::config::TrelloConfig;

const BOARD_TIMEOUT: Duration = Duration::from_secs(30);
const ATTACHMENT_FIELDS: &str = "url,mimeType,previews";
const CARD_FIELDS: &str = "name,desc,shortUrl,labels,idMembers,cover";

/// Card as returned by the board API, including cover and attachments.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub short_url: Option<String>,
    #[serde(default)]
    pub id_members: Option<Vec<String>>,
    #[serde(default)]
    pub cover: Option<Cover>,
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
}

impl Card {
    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or_default().trim()
    }

    pub fn description(&self) -> &str {
        self.desc.as_deref().unwrap_or_default()
    }

    pub fn attachments(&self) -> &[Attachment] {
        self.attachments.as_deref().unwrap_or_default()
    }

    pub fn members(&self) -> &[String] {
        self.id_members.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cover {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub scaled: Option<Vec<ImageRef>>,
    #[serde(default)]
    pub id_attachment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub previews: Option<Vec<ImageRef>>,
}

/// Scaled cover or attachment preview.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImageRef {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("board returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("board request failed: {0}")]
    Transport(String),
    #[error("board response could not be decoded: {0}")]
    Decode(String),
    #[error("board runtime unavailable: {0}")]
    Runtime(String),
}

pub trait BoardGateway: Debug {
    fn fetch_cards(&self) -> Result<Vec<Card>, BoardError>;
}

/// Blocking client for the Trello board cards endpoint.
pub struct TrelloClient {
    client: reqwest::Client,
    runtime: Runtime,
    config: TrelloConfig,
}

impl TrelloClient {
    pub fn new(config: TrelloConfig) -> Result<Self, BoardError> {
        let client = reqwest::Client::builder()
            .timeout(BOARD_TIMEOUT)
            .build()
            .map_err(|err| BoardError::Transport(err.to_string()))?;
        let runtime = Runtime::new().map_err(|err| BoardError::Runtime(err.to_string()))?;

        Ok(Self {
            client,
            runtime,
            config,
        })
    }
}

impl Debug for TrelloClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrelloClient")
            .field("board_id", &self.config.board_id)
            .finish_non_exhaustive()
    }
}

impl BoardGateway for TrelloClient {
    fn fetch_cards(&self) -> Result<Vec<Card>, BoardError> {
        let url = format!(
            "{}/1/boards/{}/cards",
            self.config.base_url.trim_end_matches('/'),
            self.config.board_id
        );

        self.runtime.block_on(async {
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("key", self.config.key.as_str()),
                    ("token", self.config.token.as_str()),
                    ("attachments", "true"),
                    ("attachment_fields", ATTACHMENT_FIELDS),
                    ("fields", CARD_FIELDS),
                ])
                .send()
                .await
                .map_err(|err| BoardError::Transport(err.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(BoardError::Http {
                    status: status.as_u16(),
                    body,
                });
            }

            response
                .json::<Vec<Card>>()
                .await
                .map_err(|err| BoardError::Decode(err.to_string()))
        })
    }
}
