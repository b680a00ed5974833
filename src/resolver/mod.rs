pub mod client;
#[cfg(test)]
pub mod fixture;
pub mod rate;
pub mod scryfall;
