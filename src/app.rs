use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use bytes::Bytes;
use iced::{
    executor,
    widget::{self, column, image::Handle, row},
    Application, Color, Command, Length, Theme,
};
use reqwest::Client;
use tracing::error;
use uuid::Uuid;

use crate::{
    api::{
        self, ApiResult, CatalogService, CollectionService, HttpCatalog, HttpCollection,
        Reconciliation,
    },
    config::Config,
    debounce::{self, Debouncer},
    filter::RarityOption,
    models::{Card, CollectionEntry, Condition, EntryRequest},
    prefs::{Preferences, ThemePreference},
    progress::Completion,
    state::{AppState, CatalogStatus, DetailAction, NotificationKind, Reload, View},
};

const GRID_COLUMNS: usize = 4;
const ERROR_COLOR: Color = Color {
    r: 0.85,
    g: 0.25,
    b: 0.25,
    a: 1.0,
};
const SUCCESS_COLOR: Color = Color {
    r: 0.2,
    g: 0.65,
    b: 0.35,
    a: 1.0,
};

static RARITY_CHOICES: [RarityOption; 8] = RarityOption::CHOICES;
static CONDITION_CHOICES: [Condition; 7] = Condition::ALL;

pub struct App {
    config: Config,
    client: Client,
    catalog_service: Arc<dyn CatalogService>,
    collection_service: Arc<dyn CollectionService>,
    state: AppState,
    search_debounce: Debouncer,
    image_cache: HashMap<i64, Bytes>,
    requested_images: HashSet<i64>,
}

#[derive(Debug, Clone)]
pub enum AppMessage {
    ChangeView(View),
    ReloadCatalog,
    CatalogLoaded(ApiResult<Vec<Card>>),
    CollectionLoaded(ApiResult<Vec<CollectionEntry>>),
    ProgressLoaded(ApiResult<Vec<i64>>),
    SearchInput(String),
    SearchSettled(u64),
    RarityChanged(RarityOption),
    ShowCard(i64),
    CloseDetail,
    AddToCollection(i64),
    RemoveFromCollection(i64),
    EditEntry(EntryRequest),
    Added(ApiResult<Reconciliation>),
    Removed(ApiResult<Reconciliation>),
    Updated(ApiResult<Reconciliation>),
    UpdateImageCache(i64, Option<Bytes>),
    DismissNotification(Uuid),
    ToggleTheme,
}

type AppElement<'a> = iced::Element<'a, AppMessage, Theme, iced::Renderer>;

impl Application for App {
    type Executor = executor::Default;
    type Message = AppMessage;
    type Theme = Theme;
    type Flags = Config;

    fn new(config: Self::Flags) -> (Self, Command<Self::Message>) {
        let client = Client::new();
        let prefs = Preferences::load(&config.prefs_path);

        let app = Self {
            catalog_service: Arc::new(HttpCatalog::new(
                client.clone(),
                config.catalog_url.clone(),
            )),
            collection_service: Arc::new(HttpCollection::new(
                client.clone(),
                config.collection_url.clone(),
            )),
            search_debounce: Debouncer::new(config.search_debounce),
            state: AppState::new(prefs.theme),
            image_cache: HashMap::new(),
            requested_images: HashSet::new(),
            client,
            config,
        };
        let startup = Command::batch([app.load_catalog(), app.load_collection()]);

        (app, startup)
    }

    fn title(&self) -> String {
        "TCG Binder".to_owned()
    }

    fn theme(&self) -> Self::Theme {
        match self.state.theme {
            ThemePreference::Light => Theme::Light,
            ThemePreference::Dark => Theme::Dark,
        }
    }

    fn update(&mut self, message: Self::Message) -> Command<Self::Message> {
        match message {
            AppMessage::ChangeView(view) => {
                return match self.state.switch_view(view) {
                    Reload::Nothing => Command::none(),
                    Reload::Collection => self.load_collection(),
                    Reload::OwnedCardIds => self.load_progress(),
                };
            }
            AppMessage::ReloadCatalog => {
                self.state.catalog_loading();
                return self.load_catalog();
            }
            AppMessage::CatalogLoaded(result) => {
                self.state.catalog_loaded(result);
                return self.request_images();
            }
            AppMessage::CollectionLoaded(result) => {
                self.state.collection_loaded(result);
                return self.request_images();
            }
            AppMessage::ProgressLoaded(result) => self.state.progress_loaded(result),
            AppMessage::SearchInput(text) => {
                self.state.set_search_input(text);
                let ticket = self.search_debounce.schedule();
                return Command::perform(
                    debounce::timer(self.search_debounce.delay(), ticket),
                    AppMessage::SearchSettled,
                );
            }
            AppMessage::SearchSettled(ticket) => {
                if self.search_debounce.settle(ticket) {
                    self.state.apply_search();
                    return self.request_images();
                }
            }
            AppMessage::RarityChanged(option) => {
                // the pending search timer would only repeat this pass
                self.search_debounce.schedule();
                self.state.set_rarity(option.rarity());
                return self.request_images();
            }
            AppMessage::ShowCard(card_id) => self.state.select_card(card_id),
            AppMessage::CloseDetail => self.state.close_detail(),
            AppMessage::AddToCollection(card_id) => {
                let service = self.collection_service.clone();
                let user_id = self.config.user_id;
                return Command::perform(
                    api::add_and_reconcile(service, user_id, card_id),
                    AppMessage::Added,
                );
            }
            AppMessage::RemoveFromCollection(card_id) => {
                let service = self.collection_service.clone();
                let user_id = self.config.user_id;
                return Command::perform(
                    api::remove_and_reconcile(service, user_id, card_id),
                    AppMessage::Removed,
                );
            }
            AppMessage::EditEntry(request) => {
                let service = self.collection_service.clone();
                let user_id = self.config.user_id;
                return Command::perform(
                    api::update_and_reconcile(service, user_id, request),
                    AppMessage::Updated,
                );
            }
            AppMessage::Added(result) => {
                let notification = self.state.added(result);
                return Command::batch([self.dismiss_later(notification), self.request_images()]);
            }
            AppMessage::Removed(result) => {
                let notification = self.state.removed(result);
                return self.dismiss_later(notification);
            }
            AppMessage::Updated(result) => {
                let notification = self.state.updated(result);
                return self.dismiss_later(notification);
            }
            AppMessage::UpdateImageCache(card_id, bytes) => match bytes {
                Some(b) => {
                    self.image_cache.insert(card_id, b);
                }
                None => {}
            },
            AppMessage::DismissNotification(id) => self.state.dismiss(id),
            AppMessage::ToggleTheme => {
                let theme = self.state.toggle_theme();
                if let Err(e) = (Preferences { theme }).save(&self.config.prefs_path) {
                    error!(error = %e, "failed to save theme preference");
                }
            }
        };

        Command::none()
    }

    fn view(&self) -> AppElement<'_> {
        let nav = column!(
            nav_button("Catalog", View::Catalog, self.state.view),
            nav_button("Collection", View::Collection, self.state.view),
            nav_button("Progress", View::Progress, self.state.view),
            widget::button(match self.state.theme {
                ThemePreference::Light => "Dark mode",
                ThemePreference::Dark => "Light mode",
            })
            .width(Length::Fixed(120.))
            .on_press(AppMessage::ToggleTheme),
        )
        .spacing(4);

        let body = match self.state.view {
            View::Catalog => view_catalog(self),
            View::Collection => view_collection(self),
            View::Progress => view_progress(self),
        };
        let content = column!(view_notifications(self), body)
            .spacing(8)
            .width(Length::Fill);

        let mut layout = row!(nav, content).spacing(12).padding(12);
        if let Some(card) = &self.state.selected {
            layout = layout.push(view_detail(self, card));
        }

        layout.into()
    }
}

impl App {
    fn load_catalog(&self) -> Command<AppMessage> {
        let service = self.catalog_service.clone();
        let set_code = self.config.set_code.clone();
        Command::perform(
            async move { service.set_cards(&set_code).await },
            AppMessage::CatalogLoaded,
        )
    }

    fn load_collection(&self) -> Command<AppMessage> {
        let service = self.collection_service.clone();
        let user_id = self.config.user_id;
        Command::perform(
            async move { service.entries(user_id).await },
            AppMessage::CollectionLoaded,
        )
    }

    fn load_progress(&self) -> Command<AppMessage> {
        let service = self.collection_service.clone();
        let user_id = self.config.user_id;
        Command::perform(
            async move { service.card_ids(user_id).await },
            AppMessage::ProgressLoaded,
        )
    }

    fn dismiss_later(&self, id: Uuid) -> Command<AppMessage> {
        Command::perform(tokio::time::sleep(self.config.notification_ttl), move |_| {
            AppMessage::DismissNotification(id)
        })
    }

    /// Downloads the images of the cards on screen that were never requested.
    fn request_images(&mut self) -> Command<AppMessage> {
        let wanted: Vec<(i64, String)> = self
            .state
            .visible_cards()
            .chain(self.state.owned_cards().map(|(card, _)| card))
            .filter(|card| !self.requested_images.contains(&card.id))
            .filter_map(|card| {
                card.image_url
                    .as_deref()
                    .map(|url| (card.id, self.config.image_url(url)))
            })
            .collect();

        let mut downloads = Vec::new();
        for (card_id, url) in wanted {
            if !self.requested_images.insert(card_id) {
                continue;
            }
            downloads.push(Command::perform(
                api::download_image(self.client.clone(), card_id, url),
                |res| AppMessage::UpdateImageCache(res.0, res.1),
            ));
        }

        Command::batch(downloads)
    }
}

fn nav_button<'a>(label: &str, view: View, current: View) -> AppElement<'a> {
    let label = if view == current {
        format!("> {}", label)
    } else {
        label.to_owned()
    };
    widget::button(widget::text(label))
        .width(Length::Fixed(120.))
        .on_press(AppMessage::ChangeView(view))
        .into()
}

fn view_notifications<'a>(app: &'a App) -> AppElement<'a> {
    widget::column(app.state.notifications.iter().map(|n| {
        let color = match n.kind {
            NotificationKind::Success => SUCCESS_COLOR,
            NotificationKind::Error => ERROR_COLOR,
        };
        AppElement::from(widget::text(&n.message).style(color))
    }))
    .spacing(4)
    .into()
}

fn view_catalog<'a>(app: &'a App) -> AppElement<'a> {
    let state = &app.state;

    let search_box = widget::text_input("Search by name or number...", &state.search_input)
        .on_input(AppMessage::SearchInput)
        .width(Length::Fill);
    let rarity = widget::pick_list(
        &RARITY_CHOICES[..],
        Some(RarityOption::from(state.filter.rarity)),
        AppMessage::RarityChanged,
    );

    let (showing, total) = state.showing_counter();
    let counter = widget::text(format!("Showing {} of {} cards", showing, total));

    let cards: AppElement<'a> = match &state.catalog_status {
        CatalogStatus::Loading => widget::text("Loading cards...").into(),
        CatalogStatus::Failed(message) => column!(
            widget::text(message).style(ERROR_COLOR),
            widget::button("Retry").on_press(AppMessage::ReloadCatalog),
        )
        .spacing(8)
        .into(),
        CatalogStatus::Loaded if state.visible.is_empty() => widget::text("No cards found").into(),
        CatalogStatus::Loaded => view_grid(
            state
                .visible_cards()
                .map(|card| view_card_tile(app, card))
                .collect(),
        ),
    };

    column!(row!(search_box, rarity).spacing(8), counter, cards)
        .spacing(8)
        .into()
}

fn view_collection<'a>(app: &'a App) -> AppElement<'a> {
    let stats = app.state.stats();
    let header = row!(
        widget::text(format!("{} unique cards", stats.unique)),
        widget::text(format!("{} total cards", stats.total)),
    )
    .spacing(16);

    if app.state.collection.is_empty() {
        let empty = column!(
            widget::text("Your collection is empty"),
            widget::text("Add cards from the catalog to start your collection").size(12),
        )
        .spacing(4);
        return column!(header, empty).spacing(8).into();
    }

    let cards = view_grid(
        app.state
            .owned_cards()
            .map(|(card, entry)| view_owned_tile(app, card, entry))
            .collect(),
    );

    column!(header, cards).spacing(8).into()
}

fn view_progress<'a>(app: &'a App) -> AppElement<'a> {
    let report = match &app.state.progress {
        Some(r) => r,
        None => return widget::text("Progress not loaded yet").into(),
    };

    column!(
        view_completion("Standard Set (1-198)", report.standard),
        view_completion("Full Set (1-258)", report.full),
        view_completion("Complete Set (with reverse holos)", report.complete),
        widget::text(
            "Reverse holos are not tracked separately yet; the complete set counts each card once."
        )
        .size(12),
    )
    .spacing(16)
    .into()
}

fn view_completion<'a>(label: &str, completion: Completion) -> AppElement<'a> {
    let title = row!(
        widget::text(label).width(Length::Fill),
        widget::text(format!("{} / {}", completion.owned, completion.total)),
    );
    let bar = widget::progress_bar(0.0..=100.0, completion.percent());

    column!(title, bar).spacing(4).into()
}

fn view_grid<'a>(tiles: Vec<AppElement<'a>>) -> AppElement<'a> {
    let mut rows: Vec<AppElement<'a>> = Vec::new();
    let mut tiles = tiles.into_iter().peekable();
    while tiles.peek().is_some() {
        let chunk: Vec<AppElement<'a>> = tiles.by_ref().take(GRID_COLUMNS).collect();
        rows.push(widget::row(chunk).spacing(8).into());
    }

    widget::scrollable(widget::column(rows).spacing(8))
        .height(Length::Fill)
        .into()
}

fn view_card_image<'a>(app: &'a App, card_id: i64, height: f32) -> AppElement<'a> {
    match app.image_cache.get(&card_id) {
        Some(bytes) => widget::image::<Handle>(Handle::from_memory(bytes.clone()))
            .content_fit(iced::ContentFit::ScaleDown)
            .height(Length::Fixed(height))
            .into(),
        None => widget::container(widget::text("No image").size(12))
            .width(Length::Fill)
            .height(Length::Fixed(height))
            .center_x()
            .center_y()
            .into(),
    }
}

fn view_card_tile<'a>(app: &'a App, card: &'a Card) -> AppElement<'a> {
    let badge = if app.state.owns(card.id) { "[owned] " } else { "" };
    let rarity = card.rarity.map(|r| r.to_string()).unwrap_or_default();

    let tile = column!(
        view_card_image(app, card.id, 140.),
        widget::text(format!("#{}", card.card_number)).size(12),
        widget::text(format!("{}{}", badge, card.name)),
        widget::text(rarity).size(12),
    )
    .spacing(2)
    .width(Length::Fixed(150.));

    widget::button(tile)
        .on_press(AppMessage::ShowCard(card.id))
        .into()
}

fn view_owned_tile<'a>(app: &'a App, card: &'a Card, entry: &'a CollectionEntry) -> AppElement<'a> {
    let tile = column!(
        view_card_image(app, card.id, 140.),
        widget::text(format!("#{}", card.card_number)).size(12),
        widget::text(&card.name),
        widget::text(format!("x{}  {}", entry.quantity, entry.condition)).size(12),
    )
    .spacing(2)
    .width(Length::Fixed(150.));

    widget::button(tile)
        .on_press(AppMessage::ShowCard(card.id))
        .into()
}

fn detail_field<'a>(label: &str, value: String) -> AppElement<'a> {
    row!(
        widget::text(format!("{}:", label)).width(Length::Fixed(60.)),
        widget::text(value),
    )
    .spacing(8)
    .into()
}

fn view_detail<'a>(app: &'a App, card: &'a Card) -> AppElement<'a> {
    let btn_close = widget::button("Close").on_press(AppMessage::CloseDetail);

    let rarity = card
        .rarity
        .map(|r| r.to_string())
        .unwrap_or_else(|| "N/A".to_owned());
    let mut panel = column!(
        btn_close,
        view_card_image(app, card.id, 280.),
        widget::text(&card.name).size(22),
        detail_field("Number", format!("#{}", card.card_number)),
        detail_field("Set", card.set_name.clone().unwrap_or_default()),
        detail_field("Rarity", rarity),
        detail_field("Type", card.card_type.clone().unwrap_or_else(|| "N/A".to_owned())),
        detail_field("Artist", card.artist.clone().unwrap_or_else(|| "Unknown".to_owned())),
    )
    .spacing(6)
    .width(Length::Fixed(320.));

    if let Some(variant) = &card.variant {
        panel = panel.push(detail_field("Variant", variant.clone()));
    }
    if let Some(description) = &card.description {
        panel = panel.push(widget::text(description).size(12));
    }

    let action: AppElement<'a> = match app.state.detail_action() {
        Some(DetailAction::Add { enabled, label }) => widget::button(label)
            .on_press_maybe(enabled.then_some(AppMessage::AddToCollection(card.id)))
            .into(),
        Some(DetailAction::Remove) => widget::button("Remove from Collection")
            .on_press(AppMessage::RemoveFromCollection(card.id))
            .into(),
        None => widget::Space::with_height(Length::Shrink).into(),
    };
    panel = panel.push(action);

    if let (Some(entry), false) = (app.state.entry(card.id), app.state.just_added) {
        panel = panel.push(view_entry_editor(entry));
    }

    panel.into()
}

/// Quantity and condition controls for an owned card.
fn view_entry_editor<'a>(entry: &CollectionEntry) -> AppElement<'a> {
    let current = EntryRequest::from_entry(entry);
    let fewer = EntryRequest {
        quantity: entry.quantity - 1,
        ..current.clone()
    };
    let more = EntryRequest {
        quantity: entry.quantity + 1,
        ..current.clone()
    };

    let quantity = row!(
        widget::button("-").on_press_maybe((entry.quantity > 1).then(|| AppMessage::EditEntry(fewer))),
        widget::text(format!("x{}", entry.quantity)),
        widget::button("+").on_press(AppMessage::EditEntry(more)),
    )
    .spacing(8);

    let condition = widget::pick_list(
        &CONDITION_CHOICES[..],
        Some(entry.condition),
        move |condition| {
            AppMessage::EditEntry(EntryRequest {
                condition,
                ..current.clone()
            })
        },
    );

    let mut editor = column!(quantity, condition).spacing(6);
    if let Some(acquired) = entry.acquired_date {
        editor = editor.push(detail_field(
            "Acquired",
            acquired.format("%Y-%m-%d").to_string(),
        ));
    }

    editor.into()
}
