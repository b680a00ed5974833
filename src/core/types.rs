use serde::Serialize;
use std::collections::BTreeMap;

/// Deck color buckets, ordered WUBRG then colorless.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Color {
    W,
    U,
    B,
    R,
    G,
    C,
}

impl Color {
    pub const ALL: [Color; 6] = [
        Color::W,
        Color::U,
        Color::B,
        Color::R,
        Color::G,
        Color::C,
    ];

    pub fn from_code(code: &str) -> Option<Color> {
        match code {
            "W" => Some(Color::W),
            "U" => Some(Color::U),
            "B" => Some(Color::B),
            "R" => Some(Color::R),
            "G" => Some(Color::G),
            "C" => Some(Color::C),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Color::W => "W",
            Color::U => "U",
            Color::B => "B",
            Color::R => "R",
            Color::G => "G",
            Color::C => "C",
        }
    }
}

pub type ColorCounts = BTreeMap<Color, u64>;
pub type ColorPercentages = BTreeMap<Color, f64>;
/// Truncated CMC -> nonland card quantity. Sparse.
pub type ManaCurve = BTreeMap<u32, u64>;

// ----------- Pipeline records -----------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecklistEntry {
    pub quantity: u32,
    pub raw_name: String,
}

/// What the card-data service knows about one card name.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CardAttributes {
    pub name: String,
    pub color_identity: Vec<String>, // raw codes as reported, e.g. ["U", "R"]
    pub type_line: String,
    pub cmc: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedCard {
    pub name: String,
    pub color_identity: Vec<String>,
    pub type_line: String,
    #[serde(rename = "cmc")]
    pub converted_mana_cost: f64,
    pub quantity: u32,
}

impl ResolvedCard {
    pub fn new(attributes: CardAttributes, quantity: u32) -> Self {
        Self {
            name: attributes.name,
            color_identity: attributes.color_identity,
            type_line: attributes.type_line,
            converted_mana_cost: attributes.cmc,
            quantity,
        }
    }

    pub fn is_land(&self) -> bool {
        self.type_line.contains(LAND_MARKER)
    }

    /// Mana-curve bucket: the cost truncated toward zero.
    pub fn cmc_bucket(&self) -> u32 {
        // `as` saturates and maps NaN to 0
        self.converted_mana_cost.trunc() as u32
    }
}

/// Case-sensitive substring that marks a type line as a land.
pub const LAND_MARKER: &str = "Land";

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DeckSummary {
    pub total_cards: u64,
    pub land_count: u64,
    pub nonland_count: u64,
    /// Names that failed lookup and were left out of every aggregate.
    pub unresolved: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DeckAnalysis {
    pub cards: Vec<ResolvedCard>,
    pub color_distribution: ColorCounts,
    pub color_percentages: ColorPercentages,
    pub mana_curve: ManaCurve,
    pub color_chart_base64: String,
    pub mana_curve_chart_base64: String,
    pub color_breakdown_chart_base64: String,
    pub chart_media_type: String,
    pub summary: DeckSummary,
}
