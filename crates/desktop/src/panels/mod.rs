pub mod image_panel;
#[cfg(feature = "image-sequence")]
pub mod sequence_panel;

use iced::border::Border;
use iced::widget::{button, column, container, row, text, text_input, Space};
use iced::{Element, Length, Theme};

use frame_export_core::shared::constants::MAX_DIMENSION;

use crate::app::{ExportInputs, Message};
use crate::theme::muted_color;

const LABEL_WIDTH: f32 = 86.0;

/// Titled card with a close button, used for both export dialogs.
fn dialog<'a>(
    title: &'a str,
    on_close: Option<Message>,
    body: Element<'a, Message>,
) -> Element<'a, Message> {
    let close = button(text("\u{2715}").size(12))
        .on_press_maybe(on_close)
        .style(button::text);

    container(
        column![
            row![text(title).size(15), Space::new().width(Length::Fill), close]
                .align_y(iced::Alignment::Center),
            Space::new().height(8),
            body,
        ]
        .spacing(0),
    )
    .padding(14)
    .width(Length::Fill)
    .style(|theme: &Theme| {
        let palette = theme.extended_palette();
        container::Style {
            background: Some(palette.background.weak.color.into()),
            border: Border {
                radius: 10.0.into(),
                ..Border::default()
            },
            ..container::Style::default()
        }
    })
    .into()
}

/// `label  [input]` row.
fn field<'a>(
    label: &'a str,
    value: &'a str,
    on_input: Option<fn(String) -> Message>,
) -> Element<'a, Message> {
    let mut input = text_input(label, value).size(13).padding(6);
    if let Some(on_input) = on_input {
        input = input.on_input(on_input);
    }
    row![
        text(label)
            .size(13)
            .width(LABEL_WIDTH)
            .style(|theme: &Theme| text::Style {
                color: Some(muted_color(theme)),
            }),
        input,
    ]
    .spacing(8)
    .align_y(iced::Alignment::Center)
    .into()
}

/// Export width and height, shared by both dialogs.
fn resolution<'a>(inputs: &'a ExportInputs, editable: bool) -> Element<'a, Message> {
    let mut content = column![
        field(
            "Width",
            &inputs.width,
            editable.then_some(Message::ExportWidthChanged as fn(String) -> Message),
        ),
        field(
            "Height",
            &inputs.height,
            editable.then_some(Message::ExportHeightChanged as fn(String) -> Message),
        ),
    ]
    .spacing(6);

    if inputs.resolution().is_none() {
        content = content.push(
            text(format!(
                "Width and height must be whole numbers from 1 to {MAX_DIMENSION}"
            ))
                .size(11)
                .style(text::danger),
        );
    }
    content.into()
}
