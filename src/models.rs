use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: i64,
    #[serde(default)]
    pub set_code: Option<String>,
    #[serde(default)]
    pub set_name: Option<String>,
    pub card_number: String,
    pub name: String,
    #[serde(default)]
    pub rarity: Option<Rarity>,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub card_type: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    HoloRare,
    UltraRare,
    SecretRare,
    Promo,
}

impl Rarity {
    pub fn wire_name(self) -> &'static str {
        match self {
            Rarity::Common => "COMMON",
            Rarity::Uncommon => "UNCOMMON",
            Rarity::Rare => "RARE",
            Rarity::HoloRare => "HOLO_RARE",
            Rarity::UltraRare => "ULTRA_RARE",
            Rarity::SecretRare => "SECRET_RARE",
            Rarity::Promo => "PROMO",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&title_case(self.wire_name()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    Mint,
    #[default]
    NearMint,
    Excellent,
    Good,
    LightPlayed,
    Played,
    Poor,
}

impl Condition {
    pub const ALL: [Condition; 7] = [
        Condition::Mint,
        Condition::NearMint,
        Condition::Excellent,
        Condition::Good,
        Condition::LightPlayed,
        Condition::Played,
        Condition::Poor,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            Condition::Mint => "MINT",
            Condition::NearMint => "NEAR_MINT",
            Condition::Excellent => "EXCELLENT",
            Condition::Good => "GOOD",
            Condition::LightPlayed => "LIGHT_PLAYED",
            Condition::Played => "PLAYED",
            Condition::Poor => "POOR",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&title_case(self.wire_name()))
    }
}

/// One owned card as the collection service reports it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEntry {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub card_id: i64,
    pub quantity: i32,
    #[serde(default)]
    pub condition: Condition,
    #[serde(default)]
    pub is_reverse_holo: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub acquired_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl CollectionEntry {
    pub fn reverse_holo(&self) -> bool {
        self.is_reverse_holo.unwrap_or(false)
    }
}

/// Body of the create and update calls.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntryRequest {
    pub card_id: i64,
    pub quantity: i32,
    pub condition: Condition,
    pub is_reverse_holo: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl EntryRequest {
    /// What the "add" action submits: one near-mint, non reverse-holo copy.
    pub fn add_default(card_id: i64) -> Self {
        Self {
            card_id,
            quantity: 1,
            condition: Condition::NearMint,
            is_reverse_holo: false,
            notes: None,
        }
    }

    pub fn from_entry(entry: &CollectionEntry) -> Self {
        Self {
            card_id: entry.card_id,
            quantity: entry.quantity,
            condition: entry.condition,
            is_reverse_holo: entry.reverse_holo(),
            notes: entry.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectionStats {
    pub unique: usize,
    pub total: i64,
}

impl CollectionStats {
    pub fn of(entries: &[CollectionEntry]) -> Self {
        Self {
            unique: entries.len(),
            total: entries
                .iter()
                .fold(0, |acc, entry| acc + i64::from(entry.quantity)),
        }
    }
}

/// "LIGHT_PLAYED" -> "Light Played"
pub fn title_case(wire: &str) -> String {
    wire.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let lower = w.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_deserializes_from_catalog_payload() {
        let json = r#"{
            "id": 7,
            "setCode": "SV01",
            "setName": "Scarlet & Violet",
            "cardNumber": "025",
            "name": "Pikachu",
            "rarity": "HOLO_RARE",
            "variant": null,
            "imageUrl": "http://media-service:8084/images/SV01/025.png",
            "description": null,
            "type": "Lightning",
            "artist": "Someone"
        }"#;

        let card: Card = serde_json::from_str(json).unwrap();
        assert_eq!(card.id, 7);
        assert_eq!(card.card_number, "025");
        assert_eq!(card.rarity, Some(Rarity::HoloRare));
        assert_eq!(card.card_type.as_deref(), Some("Lightning"));
        assert_eq!(card.variant, None);
    }

    #[test]
    fn card_tolerates_missing_optional_fields() {
        let card: Card =
            serde_json::from_str(r#"{"id": 1, "cardNumber": "1", "name": "Sprigatito"}"#)
                .unwrap();
        assert_eq!(card.rarity, None);
        assert_eq!(card.image_url, None);
    }

    #[test]
    fn entry_deserializes_with_local_timestamps() {
        let json = r#"{
            "id": 3,
            "userId": 1,
            "cardId": 7,
            "quantity": 2,
            "condition": "LIGHT_PLAYED",
            "isReverseHolo": null,
            "notes": null,
            "acquiredDate": "2024-03-01T10:15:30.123456",
            "createdAt": "2024-03-01T10:15:30",
            "updatedAt": null
        }"#;

        let entry: CollectionEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.card_id, 7);
        assert_eq!(entry.condition, Condition::LightPlayed);
        assert!(!entry.reverse_holo());
        assert!(entry.acquired_date.is_some());
    }

    #[test]
    fn add_request_uses_collection_defaults() {
        let body = serde_json::to_value(EntryRequest::add_default(42)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "cardId": 42,
                "quantity": 1,
                "condition": "NEAR_MINT",
                "isReverseHolo": false
            })
        );
    }

    #[test]
    fn display_names_are_title_cased() {
        assert_eq!(Rarity::HoloRare.to_string(), "Holo Rare");
        assert_eq!(Rarity::Promo.to_string(), "Promo");
        assert_eq!(Condition::NearMint.to_string(), "Near Mint");
        assert_eq!(title_case("SECRET__RARE"), "Secret Rare");
    }

    #[test]
    fn stats_sum_quantities() {
        let entry = |card_id, quantity| CollectionEntry {
            id: None,
            user_id: Some(1),
            card_id,
            quantity,
            condition: Condition::NearMint,
            is_reverse_holo: Some(false),
            notes: None,
            acquired_date: None,
            created_at: None,
            updated_at: None,
        };

        let stats = CollectionStats::of(&[entry(1, 1), entry(2, 3)]);
        assert_eq!(stats, CollectionStats { unique: 2, total: 4 });
        assert_eq!(CollectionStats::of(&[]), CollectionStats::default());
    }
}
