//! Session state of the binder and the transitions that drive it.
//!
//! Everything here is synchronous and free of I/O; the application issues the
//! remote calls and feeds their outcomes back through these methods.

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    api::{ApiResult, Reconciliation},
    filter::CardFilter,
    models::{Card, CollectionEntry, CollectionStats, Rarity},
    prefs::ThemePreference,
    progress::ProgressReport,
};

pub const CATALOG_ERROR: &str = "Failed to load cards. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Catalog,
    Collection,
    Progress,
}

/// Remote data a view wants fetched when it is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reload {
    Nothing,
    Collection,
    OwnedCardIds,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogStatus {
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
}

/// Which action the detail panel offers for the selected card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailAction {
    Add { enabled: bool, label: &'static str },
    Remove,
}

pub struct AppState {
    pub catalog: Vec<Card>,
    pub collection: Vec<CollectionEntry>,
    pub view: View,
    pub selected: Option<Card>,
    pub search_input: String,
    pub filter: CardFilter,
    pub visible: Vec<usize>,
    pub catalog_status: CatalogStatus,
    pub progress: Option<ProgressReport>,
    pub just_added: bool,
    pub notifications: Vec<Notification>,
    pub theme: ThemePreference,
}

impl AppState {
    pub fn new(theme: ThemePreference) -> Self {
        Self {
            catalog: Vec::new(),
            collection: Vec::new(),
            view: View::Catalog,
            selected: None,
            search_input: String::new(),
            filter: CardFilter::default(),
            visible: Vec::new(),
            catalog_status: CatalogStatus::Loading,
            progress: None,
            just_added: false,
            notifications: Vec::new(),
            theme,
        }
    }

    pub fn catalog_loading(&mut self) {
        self.catalog_status = CatalogStatus::Loading;
    }

    pub fn catalog_loaded(&mut self, result: ApiResult<Vec<Card>>) {
        match result {
            Ok(cards) => {
                info!(count = cards.len(), "catalog loaded");
                self.catalog = cards;
                self.catalog_status = CatalogStatus::Loaded;
            }
            Err(e) => {
                error!(error = %e, "error loading catalog");
                self.catalog.clear();
                self.catalog_status = CatalogStatus::Failed(CATALOG_ERROR.to_owned());
            }
        }
        self.refilter();
    }

    /// A failed load is treated as an empty collection.
    pub fn collection_loaded(&mut self, result: ApiResult<Vec<CollectionEntry>>) {
        match result {
            Ok(entries) => self.collection = entries,
            Err(e) => {
                warn!(error = %e, "error loading collection, showing it empty");
                self.collection.clear();
            }
        }
        self.just_added = false;
    }

    /// A failed fetch leaves the previous report in place.
    pub fn progress_loaded(&mut self, result: ApiResult<Vec<i64>>) {
        match result {
            Ok(owned_ids) => {
                self.progress = Some(ProgressReport::compute(&owned_ids, &self.catalog));
            }
            Err(e) => error!(error = %e, "error loading progress"),
        }
    }

    pub fn switch_view(&mut self, view: View) -> Reload {
        self.view = view;
        match view {
            View::Catalog => Reload::Nothing,
            View::Collection => Reload::Collection,
            View::Progress => Reload::OwnedCardIds,
        }
    }

    pub fn set_search_input(&mut self, input: String) {
        self.search_input = input;
    }

    /// Applies the typed search text once its debounce window has settled.
    pub fn apply_search(&mut self) {
        self.filter.search = self.search_input.clone();
        self.refilter();
    }

    /// Rarity changes filter at once, taking the search box as typed so far.
    pub fn set_rarity(&mut self, rarity: Option<Rarity>) {
        self.filter.search = self.search_input.clone();
        self.filter.rarity = rarity;
        self.refilter();
    }

    pub fn refilter(&mut self) {
        self.visible = self.filter.apply(&self.catalog);
    }

    pub fn visible_cards(&self) -> impl Iterator<Item = &Card> {
        self.visible.iter().filter_map(|&i| self.catalog.get(i))
    }

    /// "showing N of M"
    pub fn showing_counter(&self) -> (usize, usize) {
        (self.visible.len(), self.catalog.len())
    }

    pub fn card(&self, card_id: i64) -> Option<&Card> {
        self.catalog.iter().find(|c| c.id == card_id)
    }

    pub fn entry(&self, card_id: i64) -> Option<&CollectionEntry> {
        self.collection.iter().find(|e| e.card_id == card_id)
    }

    pub fn owns(&self, card_id: i64) -> bool {
        self.entry(card_id).is_some()
    }

    pub fn stats(&self) -> CollectionStats {
        CollectionStats::of(&self.collection)
    }

    /// Collection entries paired with their catalog card, skipping entries
    /// whose card is not in the catalog.
    pub fn owned_cards(&self) -> impl Iterator<Item = (&Card, &CollectionEntry)> {
        self.collection
            .iter()
            .filter_map(|entry| self.card(entry.card_id).map(|card| (card, entry)))
    }

    pub fn select_card(&mut self, card_id: i64) {
        self.selected = self.card(card_id).cloned();
        self.just_added = false;
    }

    pub fn close_detail(&mut self) {
        self.selected = None;
        self.just_added = false;
    }

    pub fn detail_action(&self) -> Option<DetailAction> {
        let card = self.selected.as_ref()?;
        if self.just_added {
            return Some(DetailAction::Add {
                enabled: false,
                label: "Added to Collection!",
            });
        }
        if self.owns(card.id) {
            Some(DetailAction::Remove)
        } else {
            Some(DetailAction::Add {
                enabled: true,
                label: "Add to Collection",
            })
        }
    }

    pub fn added(&mut self, result: ApiResult<Reconciliation>) -> Uuid {
        match result {
            Ok(reconciled) => {
                self.collection_loaded(reconciled.collection);
                if self.selected.as_ref().map(|c| c.id) == Some(reconciled.card_id) {
                    self.just_added = true;
                }
                self.notify(NotificationKind::Success, "Card added to collection!")
            }
            Err(e) => {
                error!(error = %e, "error adding to collection");
                self.notify(
                    NotificationKind::Error,
                    "Failed to add card. Please try again.",
                )
            }
        }
    }

    pub fn updated(&mut self, result: ApiResult<Reconciliation>) -> Uuid {
        match result {
            Ok(reconciled) => {
                self.collection_loaded(reconciled.collection);
                self.notify(NotificationKind::Success, "Collection updated!")
            }
            Err(e) => {
                error!(error = %e, "error updating collection entry");
                self.notify(
                    NotificationKind::Error,
                    "Failed to update card. Please try again.",
                )
            }
        }
    }

    pub fn removed(&mut self, result: ApiResult<Reconciliation>) -> Uuid {
        match result {
            Ok(reconciled) => {
                self.collection_loaded(reconciled.collection);
                self.close_detail();
                self.notify(NotificationKind::Success, "Card removed from collection!")
            }
            Err(e) => {
                error!(error = %e, "error deleting from collection");
                self.notify(
                    NotificationKind::Error,
                    "Failed to remove card. Please try again.",
                )
            }
        }
    }

    pub fn notify(&mut self, kind: NotificationKind, message: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.notifications.push(Notification {
            id,
            kind,
            message: message.to_owned(),
        });
        id
    }

    pub fn dismiss(&mut self, id: Uuid) {
        self.notifications.retain(|n| n.id != id);
    }

    pub fn toggle_theme(&mut self) -> ThemePreference {
        self.theme = self.theme.toggled();
        self.theme
    }
}
