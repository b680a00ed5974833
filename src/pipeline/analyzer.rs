use crate::charts::renderer::ChartRenderer;
use crate::core::error::{AnalyzeError, RenderError};
use crate::core::types::{DeckAnalysis, DeckSummary, DecklistEntry, ResolvedCard};
use crate::deck::aggregator::DeckAggregator;
use crate::decklist::parser::parse_decklist;
use crate::resolver::client::CardResolver;
use crate::resolver::rate::RateGate;
use std::sync::Arc;
use tracing::{info, warn};

/// Decklist text in, statistics and charts out.
///
/// Lookups run one at a time through the shared `RateGate`; a failed lookup
/// drops that entry and the batch carries on.
pub struct DeckAnalyzer {
    resolver: Arc<dyn CardResolver>,
    renderer: Arc<dyn ChartRenderer>,
    gate: RateGate,
    aggregator: DeckAggregator,
}

impl DeckAnalyzer {
    pub fn new(
        resolver: Arc<dyn CardResolver>,
        renderer: Arc<dyn ChartRenderer>,
        gate: RateGate,
    ) -> Self {
        Self {
            resolver,
            renderer,
            gate,
            aggregator: DeckAggregator::new(),
        }
    }

    #[tracing::instrument(skip_all, fields(bytes = decklist.len()))]
    pub async fn analyze(&self, decklist: &str) -> Result<DeckAnalysis, AnalyzeError> {
        let result = self.run(decklist).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.outcome(),
        };
        metrics::counter!("deck_analysis_total", "outcome" => outcome).increment(1);
        result
    }

    async fn run(&self, decklist: &str) -> Result<DeckAnalysis, AnalyzeError> {
        let entries = parse_decklist(decklist)?;
        info!(entries = entries.len(), "Resolving decklist");

        let (cards, unresolved) = self.resolve_entries(&entries).await;
        if cards.is_empty() {
            warn!(unresolved = unresolved.len(), "No card in the decklist resolved");
            return Err(AnalyzeError::NoCardsResolved);
        }

        let stats = self.aggregator.aggregate(&cards);
        info!(
            resolved = cards.len(),
            unresolved = unresolved.len(),
            lands = stats.land_count,
            nonlands = stats.nonland_count,
            "Deck aggregated"
        );

        let color_chart = chart_or_empty(self.renderer.color_pie(&stats.color_counts))?;
        let curve_chart = chart_or_empty(self.renderer.mana_curve_bar(&stats.mana_curve))?;
        let breakdown_chart =
            chart_or_empty(self.renderer.color_breakdown(&stats.color_percentages))?;

        let summary = DeckSummary {
            total_cards: stats.total_cards(),
            land_count: stats.land_count,
            nonland_count: stats.nonland_count,
            unresolved,
        };

        Ok(DeckAnalysis {
            cards,
            color_distribution: stats.color_counts,
            color_percentages: stats.color_percentages,
            mana_curve: stats.mana_curve,
            color_chart_base64: color_chart,
            mana_curve_chart_base64: curve_chart,
            color_breakdown_chart_base64: breakdown_chart,
            chart_media_type: self.renderer.media_type().to_string(),
            summary,
        })
    }

    /// Resolves entries in order. Returns the resolved cards and the names that failed.
    async fn resolve_entries(&self, entries: &[DecklistEntry]) -> (Vec<ResolvedCard>, Vec<String>) {
        let mut cards = Vec::with_capacity(entries.len());
        let mut unresolved = Vec::new();

        for entry in entries {
            self.gate.until_ready().await;
            info!(card = %entry.raw_name, quantity = entry.quantity, "Processing");

            match self.resolver.resolve(&entry.raw_name).await {
                Ok(attributes) => {
                    metrics::counter!("cards_lookup_total", "outcome" => "resolved").increment(1);
                    cards.push(ResolvedCard::new(attributes, entry.quantity));
                }
                Err(e) => {
                    metrics::counter!("cards_lookup_total", "outcome" => e.outcome()).increment(1);
                    warn!(card = %entry.raw_name, error = %e, "Skipping card");
                    unresolved.push(entry.raw_name.clone());
                }
            }
        }

        (cards, unresolved)
    }
}

fn chart_or_empty(rendered: Result<String, RenderError>) -> Result<String, AnalyzeError> {
    match rendered {
        Ok(image) => Ok(image),
        Err(RenderError::Unavailable(_)) => Ok(String::new()),
        Err(e) => Err(anyhow::Error::new(e).into()),
    }
}
