use crate::core::types::{
    Color, ColorCounts, ColorPercentages, LAND_MARKER, ManaCurve, ResolvedCard,
};
use tracing::warn;

/// Everything derived from one set of resolved cards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeckStats {
    /// Nonland cards only; colors with zero cards are absent.
    pub color_counts: ColorCounts,
    pub color_percentages: ColorPercentages,
    pub mana_curve: ManaCurve,
    pub land_count: u64,
    pub nonland_count: u64,
}

impl DeckStats {
    pub fn total_cards(&self) -> u64 {
        self.land_count + self.nonland_count
    }
}

/// Quantity-weighted color identity and mana curve over nonland cards.
#[derive(Default)]
pub struct DeckAggregator;

impl DeckAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, cards: &[ResolvedCard]) -> DeckStats {
        let (lands, nonlands) = self.partition_lands(cards);

        let color_counts = self.count_color_identity(&nonlands);
        let color_percentages = self.color_percentages(&color_counts);
        let mana_curve = self.mana_curve(&nonlands);

        DeckStats {
            color_counts,
            color_percentages,
            mana_curve,
            land_count: total_quantity(&lands),
            nonland_count: total_quantity(&nonlands),
        }
    }

    /// Returns `(lands, nonlands)`, preserving input order.
    pub fn partition_lands<'a>(
        &self,
        cards: &'a [ResolvedCard],
    ) -> (Vec<&'a ResolvedCard>, Vec<&'a ResolvedCard>) {
        cards.iter().partition(|c| c.is_land())
    }

    pub fn count_color_identity(&self, nonlands: &[&ResolvedCard]) -> ColorCounts {
        let mut counts: ColorCounts = Color::ALL.iter().map(|c| (*c, 0)).collect();

        for card in nonlands {
            let quantity = u64::from(card.quantity);

            if card.color_identity.is_empty() {
                // lands should already be partitioned out; re-checked because
                // colorless lands must never count as 'C'
                if !card.type_line.contains(LAND_MARKER) {
                    *counts.entry(Color::C).or_default() += quantity;
                }
                continue;
            }

            for code in &card.color_identity {
                match Color::from_code(code) {
                    Some(color) => *counts.entry(color).or_default() += quantity,
                    None => warn!(card = %card.name, code = %code, "Unexpected color identity"),
                }
            }
        }

        counts.retain(|_, v| *v > 0);
        counts
    }

    pub fn color_percentages(&self, counts: &ColorCounts) -> ColorPercentages {
        let total: u64 = counts.values().sum();
        if total == 0 {
            return ColorPercentages::new();
        }

        counts
            .iter()
            .map(|(color, v)| (*color, *v as f64 / total as f64 * 100.0))
            .collect()
    }

    pub fn mana_curve(&self, nonlands: &[&ResolvedCard]) -> ManaCurve {
        let mut curve = ManaCurve::new();
        for card in nonlands {
            *curve.entry(card.cmc_bucket()).or_default() += u64::from(card.quantity);
        }
        curve
    }
}

fn total_quantity(cards: &[&ResolvedCard]) -> u64 {
    cards.iter().map(|c| u64::from(c.quantity)).sum()
}
