// src/ui.rs
use iced::widget::{button, container};
use iced::{Background, Color, Theme};
use once_cell::sync::Lazy;

use crate::page::BannerKind;

pub struct Styles {
    pub bg: Color,
    pub fg: Color,
    pub caption_fg: Color,
    pub footer_bg: Color,
    pub footer_fg: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub success_bg: Color,
    pub success_fg: Color,
    pub error_bg: Color,
    pub error_fg: Color,
    pub info_bg: Color,
    pub info_fg: Color,
    pub trace_bg: Color,
    pub trace_fg: Color,
}

impl Styles {
    /// Background and text colour of a banner.
    pub fn banner(&self, kind: BannerKind) -> (Color, Color) {
        match kind {
            BannerKind::Success => (self.success_bg, self.success_fg),
            BannerKind::Error => (self.error_bg, self.error_fg),
            BannerKind::Info => (self.info_bg, self.info_fg),
            BannerKind::Exception => (self.trace_bg, self.trace_fg),
        }
    }
}

pub static LIGHT_THEME: Lazy<Styles> = Lazy::new(|| Styles {
    bg: Color::from_rgb(1.0, 1.0, 1.0),
    fg: Color::from_rgb(0.0, 0.0, 0.0),
    caption_fg: Color::from_rgb(0.45, 0.45, 0.45),
    footer_bg: Color::from_rgb(0.0078, 0.325, 0.6118), // #02539c
    footer_fg: Color::from_rgb(1.0, 1.0, 1.0),
    header_bg: Color::from_rgb(0.8784, 0.8784, 0.8784), // #e0e0e0
    header_fg: Color::from_rgb(0.0, 0.0, 0.0),
    success_bg: Color::from_rgb(0.8745, 0.9412, 0.8471), // #dff0d8
    success_fg: Color::from_rgb(0.1176, 0.4, 0.1176),
    error_bg: Color::from_rgb(1.0, 0.8824, 0.8824), // #ffe1e1
    error_fg: Color::from_rgb(0.6, 0.0, 0.0),
    info_bg: Color::from_rgb(0.8588, 0.9216, 0.9804), // #dbebfa
    info_fg: Color::from_rgb(0.0, 0.2, 0.4),
    trace_bg: Color::from_rgb(0.96, 0.96, 0.96),
    trace_fg: Color::from_rgb(0.3, 0.0, 0.0),
});

pub struct ContainerStyle {
    pub bg: Color,
    pub fg: Option<Color>,
    pub radius: f32,
}

impl container::StyleSheet for ContainerStyle {
    type Style = Theme;

    fn appearance(&self, _style: &Theme) -> container::Appearance {
        container::Appearance {
            background: Some(Background::Color(self.bg)),
            text_color: self.fg,
            border_radius: self.radius.into(),
            border_width: 0.0,
            border_color: Color::TRANSPARENT,
        }
    }
}

pub struct ButtonStyle {
    pub bg: Color,
    pub fg: Color,
    pub hover_bg: Color,
}

impl button::StyleSheet for ButtonStyle {
    type Style = Theme;

    fn active(&self, _style: &Theme) -> button::Appearance {
        button::Appearance {
            background: Some(Background::Color(self.bg)),
            border_radius: 4.0.into(),
            text_color: self.fg,
            ..button::Appearance::default()
        }
    }

    fn hovered(&self, style: &Theme) -> button::Appearance {
        button::Appearance {
            background: Some(Background::Color(self.hover_bg)),
            ..self.active(style)
        }
    }

    fn disabled(&self, style: &Theme) -> button::Appearance {
        button::Appearance {
            text_color: Color {
                a: 0.5,
                ..self.fg
            },
            ..self.active(style)
        }
    }
}
