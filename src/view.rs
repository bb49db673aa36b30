use iced::{
    alignment,
    font::{self, Font},
    widget::{column, container, rich_text, span, text, text::Span, Space},
    Background, Border, Color, Element, Length, Theme,
};

use crate::conversation::Sender;
use crate::markdown::{Block, BlockKind, SpanStyle};
use crate::Message;

const ACCENT: Color = Color::from_rgb(0.388, 0.400, 0.945);
const ACCENT_TEXT: Color = Color::WHITE;
const BOT_BUBBLE: Color = Color::from_rgb(0.898, 0.906, 0.922);
const BOT_TEXT: Color = Color::from_rgb(0.067, 0.094, 0.153);
const LINK: Color = Color::from_rgb(0.192, 0.180, 0.506);
const CODE_BACKGROUND: Color = Color::from_rgba(0.0, 0.0, 0.0, 0.08);

const BUBBLE_MAX_WIDTH: f32 = 320.0;
const AVATAR_SIZE: f32 = 96.0;
const BODY_SIZE: f32 = 15.0;

const LOADING_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[derive(Debug, Clone, Copy)]
struct Palette {
    background: Color,
    text: Color,
    link: Color,
}

impl Palette {
    fn for_sender(sender: Sender) -> Self {
        match sender {
            Sender::User => Palette {
                background: ACCENT,
                text: ACCENT_TEXT,
                link: ACCENT_TEXT,
            },
            Sender::Bot => Palette {
                background: BOT_BUBBLE,
                text: BOT_TEXT,
                link: LINK,
            },
        }
    }
}

pub fn header_style(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(ACCENT)),
        text_color: Some(ACCENT_TEXT),
        border: Border {
            radius: 8.0.into(),
            ..Border::default()
        },
        ..container::Style::default()
    }
}

fn avatar_style(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(Color::WHITE)),
        text_color: Some(ACCENT),
        border: Border {
            radius: (AVATAR_SIZE / 2.0).into(),
            width: 3.0,
            color: Color { a: 0.6, ..Color::WHITE },
        },
        ..container::Style::default()
    }
}

fn bubble_style(palette: Palette) -> container::Style {
    container::Style {
        background: Some(Background::Color(palette.background)),
        text_color: Some(palette.text),
        border: Border {
            radius: 10.0.into(),
            ..Border::default()
        },
        ..container::Style::default()
    }
}

fn heading_size(level: u8) -> f32 {
    match level {
        1 => 22.0,
        2 => 19.0,
        3 => 17.0,
        _ => 16.0,
    }
}

fn styled_span<'a>(
    content: &'a str,
    style: SpanStyle,
    palette: Palette,
    size: f32,
) -> Span<'a, Message> {
    let mut font = if style.code { Font::MONOSPACE } else { Font::DEFAULT };
    if style.strong {
        font.weight = font::Weight::Bold;
    }
    if style.emphasis {
        font.style = font::Style::Italic;
    }

    let color = if style.link { palette.link } else { palette.text };

    span(content)
        .font(font)
        .size(size)
        .color(color)
        .underline(style.link)
        .strikethrough(style.strikethrough)
}

fn block_view<'a>(block: &'a Block, palette: Palette) -> Element<'a, Message> {
    let size = match block.kind {
        BlockKind::Heading(level) => heading_size(level),
        _ => BODY_SIZE,
    };

    let spans: Vec<Span<'a, Message>> = block
        .spans
        .iter()
        .map(|s| {
            let mut style = s.style;
            if let BlockKind::Heading(_) = block.kind {
                style.strong = true;
            }
            styled_span(&s.text, style, palette, size)
        })
        .collect();

    match block.kind {
        BlockKind::Rule => container(Space::with_height(1.0))
            .width(Length::Fill)
            .style(move |_theme: &Theme| container::Style {
                background: Some(Background::Color(Color { a: 0.3, ..palette.text })),
                ..container::Style::default()
            })
            .into(),
        BlockKind::CodeBlock => container(rich_text(spans))
            .padding(8)
            .width(Length::Fill)
            .style(|_theme: &Theme| container::Style {
                background: Some(Background::Color(CODE_BACKGROUND)),
                border: Border {
                    radius: 6.0.into(),
                    ..Border::default()
                },
                ..container::Style::default()
            })
            .into(),
        BlockKind::Quote => container(rich_text(spans))
            .padding(iced::Padding {
                left: 10.0,
                ..iced::Padding::ZERO
            })
            .width(Length::Fill)
            .style(move |_theme: &Theme| container::Style {
                background: Some(Background::Color(Color { a: 0.06, ..palette.text })),
                ..container::Style::default()
            })
            .into(),
        BlockKind::ListItem { depth } => container(rich_text(spans))
            .padding(iced::Padding {
                left: 14.0 * depth as f32,
                ..iced::Padding::ZERO
            })
            .into(),
        BlockKind::Paragraph | BlockKind::Heading(_) => rich_text(spans).into(),
    }
}

/// First letter of the assistant's name, shown in place of a portrait.
pub fn avatar_initial(name: &str) -> String {
    match name.trim().chars().next() {
        Some(c) => c.to_uppercase().collect(),
        None => "?".to_string(),
    }
}

/// Round badge that sits above the intake greeting.
pub fn avatar<'a>(name: &str) -> Element<'a, Message> {
    let mut font = Font::DEFAULT;
    font.weight = font::Weight::Bold;

    container(text(avatar_initial(name)).size(AVATAR_SIZE / 2.0).font(font))
        .width(AVATAR_SIZE)
        .height(AVATAR_SIZE)
        .align_x(alignment::Horizontal::Center)
        .align_y(alignment::Vertical::Center)
        .style(avatar_style)
        .into()
}

/// One chat bubble. User bubbles hug the right edge, bot bubbles the left.
pub fn bubble<'a>(sender: Sender, blocks: &'a [Block]) -> Element<'a, Message> {
    let palette = Palette::for_sender(sender);

    let body = column(blocks.iter().map(|block| block_view(block, palette))).spacing(6);

    let bubble = container(body)
        .padding([8, 12])
        .max_width(BUBBLE_MAX_WIDTH)
        .style(move |_theme: &Theme| bubble_style(palette));

    let align = match sender {
        Sender::User => alignment::Horizontal::Right,
        Sender::Bot => alignment::Horizontal::Left,
    };

    container(bubble)
        .width(Length::Fill)
        .align_x(align)
        .into()
}

pub fn loading_bubble<'a>(frame: usize) -> Element<'a, Message> {
    let palette = Palette::for_sender(Sender::Bot);
    let spinner = LOADING_FRAMES[frame % LOADING_FRAMES.len()];

    container(
        container(text(spinner).size(20))
            .padding([6, 14])
            .style(move |_theme: &Theme| bubble_style(palette)),
    )
    .width(Length::Fill)
    .align_x(alignment::Horizontal::Left)
    .into()
}
