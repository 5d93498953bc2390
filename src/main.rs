// src/main.rs
use iced::widget::{button, container, scrollable, text, Column, Row, Space};
use iced::{executor, window, Application, Color, Command, Element, Font, Length, Settings, Theme};
use tracing::{info, warn, Level};
use tracing_subscriber::{filter::Targets, layer::SubscriberExt, util::SubscriberInitExt, Registry};

mod data_types;
mod page;
mod secrets;
mod sheet_client;
mod ui;

use data_types::Table;
use page::{Banner, BannerKind, Layout, Outcome, Page, PAGE_TITLE};
use secrets::{SecretStore, DEFAULT_SECRETS_PATH, SECRETS_PATH_VAR};
use sheet_client::GoogleSheetClient;
use ui::{ButtonStyle, ContainerStyle, Styles, LIGHT_THEME};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const CENTERED_WIDTH: f32 = 760.0;
const PREVIEW_ROWS: usize = 200;

pub fn main() -> iced::Result {
    init_tracing();

    let path =
        std::env::var(SECRETS_PATH_VAR).unwrap_or_else(|_| DEFAULT_SECRETS_PATH.to_string());
    let secrets = SecretStore::load(&path).unwrap_or_else(|err| {
        warn!(%path, %err, "secrets file could not be parsed; continuing without secrets");
        SecretStore::empty()
    });

    let mut settings = Settings::with_flags(secrets);
    settings.window = window::Settings {
        size: (1024, 768),
        resizable: true,
        ..Default::default()
    };
    LabManager::run(settings)
}

fn init_tracing() {
    Registry::default()
        .with(
            Targets::new()
                .with_target("lab_manager", Level::DEBUG)
                .with_default(Level::WARN),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

struct LabManager {
    secrets: SecretStore,
    page: Option<Page>,
    loading: bool,
}

#[derive(Debug, Clone)]
enum Message {
    Reload,
    Rendered(Page),
}

impl Application for LabManager {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = SecretStore;

    fn new(secrets: SecretStore) -> (Self, Command<Message>) {
        let mut app = LabManager {
            secrets,
            page: None,
            loading: false,
        };
        let command = app.start_render();
        (app, command)
    }

    fn title(&self) -> String {
        self.page
            .as_ref()
            .map_or(PAGE_TITLE, |page| page.config.title)
            .to_string()
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::Reload => self.start_render(),

            Message::Rendered(page) => {
                self.loading = false;
                self.page = Some(page);
                Command::none()
            }
        }
    }

    fn view(&self) -> Element<Message> {
        let theme = &*LIGHT_THEME;

        let mut content = Column::new()
            .spacing(12)
            .padding(20)
            .width(Length::Fill)
            .push(text(PAGE_TITLE).size(32).style(theme.fg));

        match &self.page {
            None => {
                content = content.push(text("Loading…").size(16).style(theme.caption_fg));
            }
            Some(page) => {
                for banner in page.banners() {
                    content = content.push(banner_view(banner, theme));
                }

                let caption = if self.loading {
                    "Reloading…".to_string()
                } else {
                    format!(
                        "Last loaded at {}",
                        page.rendered_at.format("%Y-%m-%d %H:%M:%S")
                    )
                };
                content = content.push(text(caption).size(14).style(theme.caption_fg));

                // The reference worksheet stays bound in the outcome but is not shown.
                if let Outcome::Ready { default, .. } = &page.outcome {
                    content = content.push(render_table(default, theme));
                }
            }
        }

        let layout = self
            .page
            .as_ref()
            .map_or(Layout::Centered, |page| page.config.layout);
        let body = container(content).width(Length::Fill);
        let body = match layout {
            Layout::Centered => body.max_width(CENTERED_WIDTH),
        };

        let main_area = scrollable(container(body).width(Length::Fill).center_x())
            .height(Length::Fill);

        Column::new()
            .push(
                container(main_area)
                    .width(Length::Fill)
                    .height(Length::Fill)
                    .style(iced::theme::Container::Custom(Box::new(ContainerStyle {
                        bg: theme.bg,
                        fg: Some(theme.fg),
                        radius: 0.0,
                    }))),
            )
            .push(self.footer(theme))
            .into()
    }
}

impl LabManager {
    fn start_render(&mut self) -> Command<Message> {
        if self.loading {
            return Command::none();
        }
        self.loading = true;
        info!("rendering page");

        let secrets = self.secrets.clone();
        Command::perform(
            async move {
                let client = GoogleSheetClient::new(secrets.clone());
                page::render(&secrets, &client).await
            },
            Message::Rendered,
        )
    }

    fn footer(&self, theme: &Styles) -> Element<'_, Message> {
        let reload = button(text("Reload").size(16))
            .padding([6, 14])
            .style(iced::theme::Button::Custom(Box::new(ButtonStyle {
                bg: theme.footer_bg,
                fg: theme.footer_fg,
                hover_bg: Color::from_rgb(0.0, 0.26, 0.5),
            })));
        let reload = if self.loading {
            reload
        } else {
            reload.on_press(Message::Reload)
        };

        let footer = Row::new()
            .push(text(format!("{PAGE_TITLE} v{VERSION}")).size(14))
            .push(Space::with_width(Length::Fill))
            .push(reload)
            .spacing(5)
            .padding(10)
            .width(Length::Fill);

        container(footer)
            .width(Length::Fill)
            .style(iced::theme::Container::Custom(Box::new(ContainerStyle {
                bg: theme.footer_bg,
                fg: Some(theme.footer_fg),
                radius: 0.0,
            })))
            .into()
    }
}

fn banner_view<'a>(banner: Banner, theme: &Styles) -> Element<'a, Message> {
    let (bg, fg) = theme.banner(banner.kind);
    let size = if banner.is_top_level() { 18 } else { 16 };
    let label = match banner.kind {
        BannerKind::Exception => text(banner.text).font(Font::MONOSPACE).size(13),
        _ => text(banner.text).size(size),
    };

    container(label)
        .width(Length::Fill)
        .padding(12)
        .style(iced::theme::Container::Custom(Box::new(ContainerStyle {
            bg,
            fg: Some(fg),
            radius: 4.0,
        })))
        .into()
}

fn render_table<'a>(data: &Table, theme: &Styles) -> Element<'a, Message> {
    let headers = Row::with_children(
        data.headers
            .iter()
            .map(|header| cell(header.clone(), theme.header_bg, theme.header_fg))
            .collect(),
    )
    .spacing(1);

    let mut table = Column::new().spacing(1).push(headers);
    for row in data.rows.iter().take(PREVIEW_ROWS) {
        table = table.push(
            Row::with_children(
                row.iter()
                    .map(|value| cell(Table::cell_text(value), theme.bg, theme.fg))
                    .collect(),
            )
            .spacing(1),
        );
    }

    if data.len() > PREVIEW_ROWS {
        table = table.push(
            text(format!("Showing {PREVIEW_ROWS} of {} rows", data.len()))
                .size(14)
                .style(theme.caption_fg),
        );
    }

    table.into()
}

fn cell<'a>(content: String, bg: Color, fg: Color) -> Element<'a, Message> {
    container(text(content).size(15).style(fg))
        .width(Length::Fill)
        .padding(5)
        .style(iced::theme::Container::Custom(Box::new(ContainerStyle {
            bg,
            fg: None,
            radius: 0.0,
        })))
        .into()
}
