use std::fmt;

use crate::models::{Card, Rarity};

/// Text and rarity predicates over the catalog. Both must hold when both are
/// set; an empty search or a missing rarity matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFilter {
    pub search: String,
    pub rarity: Option<Rarity>,
}

impl CardFilter {
    pub fn matches(&self, card: &Card) -> bool {
        self.matches_text(card) && self.matches_rarity(card)
    }

    fn matches_text(&self, card: &Card) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let term = self.search.to_lowercase();
        card.name.to_lowercase().contains(&term) || card.card_number.contains(&term)
    }

    fn matches_rarity(&self, card: &Card) -> bool {
        match self.rarity {
            Some(rarity) => card.rarity == Some(rarity),
            None => true,
        }
    }

    /// Positions of the matching cards, in catalog order.
    pub fn apply(&self, cards: &[Card]) -> Vec<usize> {
        cards
            .iter()
            .enumerate()
            .filter(|(_, card)| self.matches(card))
            .map(|(i, _)| i)
            .collect()
    }
}

/// An entry of the rarity selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RarityOption {
    All,
    Only(Rarity),
}

impl RarityOption {
    pub const CHOICES: [RarityOption; 8] = [
        RarityOption::All,
        RarityOption::Only(Rarity::Common),
        RarityOption::Only(Rarity::Uncommon),
        RarityOption::Only(Rarity::Rare),
        RarityOption::Only(Rarity::HoloRare),
        RarityOption::Only(Rarity::UltraRare),
        RarityOption::Only(Rarity::SecretRare),
        RarityOption::Only(Rarity::Promo),
    ];

    pub fn rarity(self) -> Option<Rarity> {
        match self {
            RarityOption::All => None,
            RarityOption::Only(r) => Some(r),
        }
    }
}

impl From<Option<Rarity>> for RarityOption {
    fn from(rarity: Option<Rarity>) -> Self {
        match rarity {
            Some(r) => RarityOption::Only(r),
            None => RarityOption::All,
        }
    }
}

impl fmt::Display for RarityOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RarityOption::All => f.write_str("All Rarities"),
            RarityOption::Only(r) => fmt::Display::fmt(r, f),
        }
    }
}

#[cfg(test)]
pub(crate) fn card(id: i64, number: &str, name: &str, rarity: Option<Rarity>) -> Card {
    Card {
        id,
        set_code: Some("SV01".to_owned()),
        set_name: Some("Scarlet & Violet".to_owned()),
        card_number: number.to_owned(),
        name: name.to_owned(),
        rarity,
        variant: None,
        image_url: Some(format!("http://media-service:8084/images/SV01/{}.png", number)),
        description: None,
        card_type: None,
        artist: None,
    }
}
