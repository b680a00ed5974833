use crate::core::error::UnresolvedCard;
use crate::core::types::CardAttributes;
use crate::resolver::client::CardResolver;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory card table for tests; records every name it was asked for.
pub struct StaticResolver {
    cards: HashMap<String, CardAttributes>,
    calls: Mutex<Vec<String>>,
}

impl StaticResolver {
    pub fn new(cards: Vec<CardAttributes>) -> Self {
        Self {
            cards: cards.into_iter().map(|c| (c.name.clone(), c)).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Lightning Bolt, Forest and Counterspell.
    pub fn standard() -> Self {
        Self::new(vec![
            attrs("Lightning Bolt", &["R"], "Instant", 1.0),
            attrs("Forest", &[], "Basic Land — Forest", 0.0),
            attrs("Counterspell", &["U"], "Instant", 2.0),
        ])
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CardResolver for StaticResolver {
    async fn resolve(&self, name: &str) -> Result<CardAttributes, UnresolvedCard> {
        self.calls.lock().unwrap().push(name.to_string());
        self.cards
            .get(name)
            .cloned()
            .ok_or_else(|| UnresolvedCard::NotFound {
                name: name.to_string(),
                details: "not in fixture".to_string(),
            })
    }
}

pub fn attrs(name: &str, identity: &[&str], type_line: &str, cmc: f64) -> CardAttributes {
    CardAttributes {
        name: name.to_string(),
        color_identity: identity.iter().map(|s| s.to_string()).collect(),
        type_line: type_line.to_string(),
        cmc,
    }
}
