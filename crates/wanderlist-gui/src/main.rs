// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use iced::widget::{
    button, column, container, horizontal_space, pick_list, row, scrollable, text, text_editor,
    text_input, Column,
};
use iced::{Element, Length, Subscription, Task, Theme};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::time::Duration;
use wanderlist_core::config::WanderConfig;
use wanderlist_core::geocode::NominatimGeocoder;
use wanderlist_core::geolocation::{GeolocationOutcome, IpGeolocator};
use wanderlist_core::route::RouteState;
use wanderlist_core::scene::SceneGraph;
use wanderlist_core::search::SearchOutcome;
use wanderlist_core::surface::{LayerId, MarkerKind};
use wanderlist_core::{LatLon, MapThemeKind, TripPlanner};

mod map;
mod style;
use map::{MapView, TileManager};

fn main() -> iced::Result {
    let config_path = WanderConfig::default_path();
    let loaded = WanderConfig::load(&config_path);
    let level = loaded
        .as_ref()
        .map(WanderConfig::log_level_filter)
        .unwrap_or(log::LevelFilter::Info);
    init_logging(level);

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            log::warn!(
                "Config unusable; falling back to defaults: path={} error={:#}",
                config_path.display(),
                e
            );
            WanderConfig::default()
        }
    };
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            log::warn!("Could not write default config: error={:#}", e);
        }
    }

    iced::application("WanderList", App::update, App::view)
        .subscription(App::subscription)
        .theme(|_| Theme::Dark)
        .run_with(move || App::new(config))
}

fn init_logging(level: log::LevelFilter) {
    let config = ConfigBuilder::new()
        .add_filter_ignore_str("wgpu")
        .add_filter_ignore_str("naga")
        .add_filter_ignore_str("cosmic_text")
        .build();
    if let Err(e) = TermLogger::init(level, config, TerminalMode::Mixed, ColorChoice::Auto) {
        eprintln!("Logger already initialised: {}", e);
    }
}

#[derive(Debug, Clone)]
enum Message {
    // Add place form
    NameChanged(String),
    LatitudeChanged(String),
    LongitudeChanged(String),
    DescriptionChanged(String),
    AddDestination,

    // Import / export
    ToggleImport,
    ImportAction(text_editor::Action),
    Import,
    Export,

    // Routing
    RouteStartSelected(String),
    RouteEndSelected(String),
    CalculateRoute,

    // External search
    SearchQueryChanged(String),
    Search,
    SearchFinished(SearchOutcome),

    // Map
    ThemeSelected(MapThemeKind),
    MapZoom {
        new_center: (f64, f64),
        new_zoom: f64,
    },
    SelectMarker(Option<LayerId>),
    Locate,
    LocationFound(GeolocationOutcome),
    Refresh,
    TilesTick,

    // Common
    BackgroundFailed(String),
    DismissNotice,
}

struct App {
    config: WanderConfig,
    planner: TripPlanner<SceneGraph>,
    tile_manager: TileManager,
    import_editor: text_editor::Content,
    selected_marker: Option<LayerId>,
    searching: bool,
    locating: bool,
    status: String,
}

impl App {
    fn new(config: WanderConfig) -> (Self, Task<Message>) {
        let mut planner = TripPlanner::new(
            SceneGraph::new(),
            config.default_theme,
            style::marker_styles(),
        );
        planner.mount();

        let mut app = Self {
            tile_manager: TileManager::new(config.geocoder.user_agent.clone()),
            config,
            planner,
            import_editor: text_editor::Content::new(),
            selected_marker: None,
            searching: false,
            locating: false,
            status: "Ready".to_string(),
        };

        let task = app.locate();
        (app, task)
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::NameChanged(value) => self.planner.set_name(value),
            Message::LatitudeChanged(value) => self.planner.set_latitude(value),
            Message::LongitudeChanged(value) => self.planner.set_longitude(value),
            Message::DescriptionChanged(value) => self.planner.set_description(value),
            Message::AddDestination => {
                if self.planner.add_destination().is_ok() {
                    self.status = format!("{} places saved", self.planner.places().len());
                }
            }

            Message::ToggleImport => {
                self.planner.toggle_import_form();
                self.import_editor = text_editor::Content::new();
            }
            Message::ImportAction(action) => {
                self.import_editor.perform(action);
                self.planner.set_import_text(self.import_editor.text());
            }
            Message::Import => {
                if let Ok(count) = self.planner.import() {
                    self.import_editor = text_editor::Content::new();
                    self.selected_marker = None;
                    self.status = format!("Imported {} places", count);
                }
            }
            Message::Export => match self.planner.export() {
                Ok(json) => {
                    self.status = format!(
                        "Copied {} places to the clipboard",
                        self.planner.places().len()
                    );
                    return iced::clipboard::write(json);
                }
                Err(e) => {
                    log::error!("Export failed: error={}", e);
                    self.status = format!("Export failed: {}", e);
                }
            },

            Message::RouteStartSelected(name) => self.planner.select_route_start(Some(name)),
            Message::RouteEndSelected(name) => self.planner.select_route_end(Some(name)),
            Message::CalculateRoute => {
                if self.planner.calculate_route() == RouteState::NoRoute {
                    self.status = "Pick two different saved places first".to_string();
                }
            }

            Message::SearchQueryChanged(query) => self.planner.set_search_query(query),
            Message::Search => return self.search(),
            Message::SearchFinished(outcome) => {
                self.searching = false;
                let _ = self.planner.finish_search(outcome);
            }

            Message::ThemeSelected(theme) => {
                self.planner.select_theme(theme);
                self.config.default_theme = theme;
                if let Err(e) = self.config.save(&WanderConfig::default_path()) {
                    log::warn!("Could not persist theme: error={:#}", e);
                }
            }
            Message::MapZoom {
                new_center,
                new_zoom,
            } => {
                self.planner
                    .set_view(LatLon::new(new_center.0, new_center.1), new_zoom);
            }
            Message::SelectMarker(id) => self.selected_marker = id,
            Message::Locate => return self.locate(),
            Message::LocationFound(outcome) => {
                self.locating = false;
                self.planner.finish_geolocation(outcome);
            }
            Message::Refresh => {
                self.planner.refresh();
                self.selected_marker = None;
                self.status = "Map refreshed".to_string();
            }
            Message::TilesTick => {}

            Message::BackgroundFailed(e) => {
                self.searching = false;
                self.locating = false;
                log::error!("Background task failed: error={}", e);
                self.status = format!("Background task failed: {}", e);
            }
            Message::DismissNotice => self.planner.dismiss_notice(),
        }

        Task::none()
    }

    fn search(&mut self) -> Task<Message> {
        let Some(request) = self.planner.begin_search() else {
            return Task::none();
        };
        self.searching = true;

        // The geocoder blocks on HTTP, so it runs off the async executor.
        let geocoder = NominatimGeocoder::new(&self.config.geocoder);
        Task::perform(
            async move { tokio::task::spawn_blocking(move || request.run(&geocoder)).await },
            |res| match res {
                Ok(outcome) => Message::SearchFinished(outcome),
                Err(e) => Message::BackgroundFailed(e.to_string()),
            },
        )
    }

    fn locate(&mut self) -> Task<Message> {
        let Some(request) = self.planner.begin_geolocation() else {
            return Task::none();
        };
        self.locating = true;

        let locator = IpGeolocator::from_config(&self.config.geolocation);
        Task::perform(
            async move { tokio::task::spawn_blocking(move || request.run(locator.as_ref())).await },
            |res| match res {
                Ok(outcome) => Message::LocationFound(outcome),
                Err(e) => Message::BackgroundFailed(e.to_string()),
            },
        )
    }

    fn subscription(&self) -> Subscription<Message> {
        // Tiles arrive on worker threads; redraw periodically to pick them up.
        iced::time::every(Duration::from_millis(500)).map(|_| Message::TilesTick)
    }

    fn view(&self) -> Element<'_, Message> {
        let sidebar = container(scrollable(self.view_sidebar()))
            .width(Length::Fixed(360.0))
            .height(Length::Fill)
            .style(style::container_sidebar)
            .padding(15);

        let attribution = self
            .planner
            .surface()
            .backend()
            .tile_layers()
            .first()
            .map(|s| s.attribution)
            .unwrap_or_default();

        let map_view = MapView {
            scene: self.planner.surface().backend(),
            tile_manager: &self.tile_manager,
            selected_marker: self.selected_marker,
        };

        let map_panel = column![
            container(map_view)
                .width(Length::Fill)
                .height(Length::Fill)
                .style(style::container_card)
                .padding(1)
                .clip(true),
            row![
                text(&self.status)
                    .size(12)
                    .color(style::palette::TEXT_SECONDARY),
                horizontal_space(),
                text(attribution)
                    .size(11)
                    .color(style::palette::TEXT_SECONDARY),
            ]
            .spacing(10),
        ]
        .spacing(6)
        .padding(10);

        row![sidebar, map_panel]
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn view_sidebar(&self) -> Element<'_, Message> {
        let mut content: Column<'_, Message> = column![row![
            text("WanderList").size(24),
            horizontal_space(),
            button(text("Refresh").size(12))
                .on_press(Message::Refresh)
                .style(style::button_success)
                .padding([6, 12]),
        ]
        .align_y(iced::Alignment::Center)]
        .spacing(18);

        if let Some(notice) = self.planner.notice() {
            content = content.push(
                container(
                    row![
                        text(notice).size(12).width(Length::Fill),
                        button(text("×").size(14))
                            .on_press(Message::DismissNotice)
                            .style(style::button_ghost)
                            .padding([0, 6]),
                    ]
                    .align_y(iced::Alignment::Center),
                )
                .style(style::container_notice)
                .padding(8),
            );
        }

        content
            .push(self.view_search())
            .push(self.view_theme())
            .push(self.view_selected_marker())
            .push(self.view_add_place())
            .push(self.view_import())
            .push(self.view_route())
            .push(self.view_places())
            .into()
    }

    fn view_search(&self) -> Element<'_, Message> {
        let input = text_input("Search for a place…", self.planner.search_query())
            .on_input(Message::SearchQueryChanged)
            .on_submit(Message::Search)
            .size(13)
            .padding(6);

        let label = if self.searching { "Searching…" } else { "Search" };
        let search_btn = button(text(label).size(12))
            .on_press_maybe((!self.searching).then_some(Message::Search))
            .style(style::button_primary)
            .padding([6, 12]);

        let locate_btn = button(text(if self.locating { "Locating…" } else { "Locate me" }).size(12))
            .on_press_maybe((!self.locating).then_some(Message::Locate))
            .style(style::button_secondary)
            .padding([6, 12]);

        column![
            section_title("Find a place"),
            row![input, search_btn].spacing(8),
            locate_btn,
        ]
        .spacing(8)
        .into()
    }

    fn view_theme(&self) -> Element<'_, Message> {
        column![
            section_title("Map style"),
            pick_list(
                MapThemeKind::ALL,
                Some(self.planner.theme()),
                Message::ThemeSelected
            )
            .text_size(13)
            .width(Length::Fill),
        ]
        .spacing(8)
        .into()
    }

    fn view_selected_marker(&self) -> Element<'_, Message> {
        let scene = self.planner.surface().backend();
        let Some((_, spec)) = self
            .selected_marker
            .and_then(|id| scene.markers().into_iter().find(|(m, _)| *m == id))
        else {
            return column![].into();
        };

        let kind = match spec.kind {
            MarkerKind::Place => "Saved place",
            MarkerKind::SearchResult => "Search result",
        };
        let mut card = column![
            text(kind).size(11).color(style::palette::TEXT_SECONDARY),
            text(spec.title.clone()).size(15),
            text(spec.position.to_string())
                .size(11)
                .color(style::palette::TEXT_SECONDARY),
        ]
        .spacing(4);
        if !spec.body.is_empty() {
            card = card.push(text(spec.body.clone()).size(12));
        }

        container(card)
            .width(Length::Fill)
            .style(style::container_card)
            .padding(10)
            .into()
    }

    fn view_add_place(&self) -> Element<'_, Message> {
        let form = self.planner.form();
        let field = |placeholder: &str, value: &str, on_input: fn(String) -> Message| {
            text_input(placeholder, value)
                .on_input(on_input)
                .on_submit(Message::AddDestination)
                .size(13)
                .padding(6)
        };

        let mut col = column![
            section_title("Add New Place"),
            field("Place name", &form.name, Message::NameChanged),
            row![
                field("Latitude", &form.latitude, Message::LatitudeChanged),
                field("Longitude", &form.longitude, Message::LongitudeChanged),
            ]
            .spacing(8),
            field("Description", &form.description, Message::DescriptionChanged),
            button(text("Add Destination").size(12))
                .on_press(Message::AddDestination)
                .style(style::button_primary)
                .padding([6, 12]),
        ]
        .spacing(8);

        if !self.planner.import_panel().visible {
            if let Some(error) = self.planner.error() {
                col = col.push(text(error).size(12).color(style::palette::DANGER));
            }
        }

        col.into()
    }

    fn view_import(&self) -> Element<'_, Message> {
        let panel = self.planner.import_panel();
        let toggle_label = if panel.visible {
            "Cancel Import"
        } else {
            "Import Places"
        };

        let mut col = column![
            section_title("Import / Export"),
            row![
                button(text(toggle_label).size(12))
                    .on_press(Message::ToggleImport)
                    .style(style::button_secondary)
                    .padding([6, 12]),
                button(text("Copy as JSON").size(12))
                    .on_press(Message::Export)
                    .style(style::button_secondary)
                    .padding([6, 12]),
            ]
            .spacing(8),
        ]
        .spacing(8);

        if panel.visible {
            col = col
                .push(
                    text_editor(&self.import_editor)
                        .on_action(Message::ImportAction)
                        .placeholder(
                            r#"[{"name": "...", "latitude": 0, "longitude": 0, "description": "..."}]"#,
                        )
                        .size(12)
                        .height(Length::Fixed(140.0)),
                )
                .push(
                    button(text("Import").size(12))
                        .on_press(Message::Import)
                        .style(style::button_primary)
                        .padding([6, 12]),
                );
            if let Some(error) = self.planner.error() {
                col = col.push(text(error).size(12).color(style::palette::DANGER));
            }
        }

        col.into()
    }

    fn view_route(&self) -> Element<'_, Message> {
        let names = self.planner.places().names();
        let selection = self.planner.route_selection();

        let mut col = column![
            section_title("Plan a Route"),
            pick_list(
                names.clone(),
                selection.start.clone(),
                Message::RouteStartSelected
            )
            .placeholder("Select start")
            .text_size(13)
            .width(Length::Fill),
            pick_list(names, selection.end.clone(), Message::RouteEndSelected)
                .placeholder("Select end")
                .text_size(13)
                .width(Length::Fill),
            button(text("Calculate Route").size(12))
                .on_press_maybe(selection.is_complete().then_some(Message::CalculateRoute))
                .style(style::button_primary)
                .padding([6, 12]),
        ]
        .spacing(8);

        if let Some(summary) = self.planner.route_summary() {
            col = col.push(
                text(format!(
                    "{} → {}: {:.1} km straight line",
                    summary.start, summary.end, summary.distance_km
                ))
                .size(12)
                .color(style::palette::ACCENT_MAGENTA),
            );
        }

        col.into()
    }

    fn view_places(&self) -> Element<'_, Message> {
        let places = self.planner.places();
        let mut col = column![section_title(&format!("Saved Places ({})", places.len()))]
            .spacing(6);

        if places.is_empty() {
            col = col.push(
                text("No places yet. Add one above or import a list.")
                    .size(12)
                    .color(style::palette::TEXT_SECONDARY),
            );
        }

        for place in places {
            let mut entry = column![
                text(place.name().to_string()).size(13),
                text(place.position().to_string())
                    .size(11)
                    .color(style::palette::TEXT_SECONDARY),
            ]
            .spacing(2);
            if !place.description().is_empty() {
                entry = entry.push(text(place.description().to_string()).size(12));
            }
            col = col.push(
                container(entry)
                    .width(Length::Fill)
                    .style(style::container_card)
                    .padding(8),
            );
        }

        col.into()
    }
}

fn section_title<'a>(title: &str) -> Element<'a, Message> {
    text(title.to_string())
        .size(14)
        .color(style::palette::TEXT_SECONDARY)
        .into()
}
