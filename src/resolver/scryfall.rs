use crate::config::config::ScryfallCfg;
use crate::core::error::UnresolvedCard;
use crate::core::types::CardAttributes;
use crate::resolver::client::CardResolver;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ScryfallCard {
    name: String,
    #[serde(default)]
    color_identity: Vec<String>,
    #[serde(default)]
    type_line: String,
    #[serde(default)]
    cmc: f64,
}

impl From<ScryfallCard> for CardAttributes {
    fn from(card: ScryfallCard) -> Self {
        Self {
            name: card.name,
            color_identity: card.color_identity,
            type_line: card.type_line,
            cmc: card.cmc,
        }
    }
}

// Body of a Scryfall error response
#[derive(Debug, Deserialize)]
struct ScryfallError {
    #[serde(default)]
    details: String,
}

/// `GET /cards/named?exact=<name>` against Scryfall.
///
/// The request timeout comes from the shared `Client`. Spacing between calls is
/// the caller's job (see `RateGate`).
pub struct ScryfallResolver {
    client: Client,
    cfg: ScryfallCfg,
}

impl ScryfallResolver {
    pub fn new(cfg: ScryfallCfg, client: Client) -> Self {
        Self { client, cfg }
    }

    fn named_url(&self) -> String {
        format!("{}/cards/named", self.cfg.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CardResolver for ScryfallResolver {
    async fn resolve(&self, name: &str) -> Result<CardAttributes, UnresolvedCard> {
        let start = Instant::now();

        let resp = self
            .client
            .get(self.named_url())
            .query(&[("exact", name)])
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| UnresolvedCard::from_reqwest(name, e))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            let details = resp
                .json::<ScryfallError>()
                .await
                .map(|e| e.details)
                .unwrap_or_default();
            return Err(UnresolvedCard::NotFound {
                name: name.to_string(),
                details,
            });
        }
        if !status.is_success() {
            return Err(UnresolvedCard::Status {
                name: name.to_string(),
                status: status.as_u16(),
            });
        }

        let card: ScryfallCard = resp
            .json()
            .await
            .map_err(|e| UnresolvedCard::from_reqwest(name, e))?;

        metrics::histogram!("cards_lookup_duration_seconds").record(start.elapsed().as_secs_f64());
        debug!(card = %card.name, cmc = card.cmc, "Resolved card");
        Ok(card.into())
    }
}
