use crate::ProviderError;
use reqwest::Client;
use serde::Serialize;

const NOTION_API_URL: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";

#[derive(Clone)]
pub struct NotionConfig {
    pub api_key: String,
    pub database_id: String,
    pub base_url: Option<String>,
}

/// Minimal Notion pages client; the caller supplies the property map.
#[derive(Clone)]
pub struct NotionClient {
    client: Client,
    cfg: NotionConfig,
}

impl NotionClient {
    pub fn new(cfg: NotionConfig) -> Self {
        Self {
            client: Client::new(),
            cfg,
        }
    }

    pub async fn create_page(&self, properties: serde_json::Value) -> Result<(), ProviderError> {
        #[derive(Serialize)]
        struct Parent<'a> {
            database_id: &'a str,
        }
        #[derive(Serialize)]
        struct CreatePageRequest<'a> {
            parent: Parent<'a>,
            properties: serde_json::Value,
        }

        let base = self.cfg.base_url.as_deref().unwrap_or(NOTION_API_URL);
        let body = CreatePageRequest {
            parent: Parent {
                database_id: &self.cfg.database_id,
            },
            properties,
        };

        let resp = self
            .client
            .post(format!("{}/pages", base))
            .bearer_auth(&self.cfg.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}
