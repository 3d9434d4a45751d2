use iced::widget::{button, column, row, text, text_input, Space};
use iced::{Element, Length, Theme};

use frame_export_core::export::exporter::Exporter;

use super::{dialog, field, resolution};
use crate::app::{ExportInputs, Message};
use crate::widgets::primary_button::primary_button;

pub fn view<'a>(exporter: &'a Exporter, inputs: &'a ExportInputs) -> Element<'a, Message> {
    let folder = exporter.image_folder().display().to_string();

    let path_row = row![
        text_input("Folder", &folder).size(13).padding(6),
        button(text("Browse").size(13)).on_press(Message::BrowseImageFolder),
    ]
    .spacing(6)
    .align_y(iced::Alignment::Center);

    let mut body = column![
        resolution(inputs, true),
        Space::new().height(10),
        field(
            "File Name",
            exporter.file_name(),
            Some(Message::ImageFileNameChanged as fn(String) -> Message),
        ),
        Space::new().height(6),
        path_row,
    ]
    .spacing(0);

    if exporter.show_file_exists_warning() {
        body = body.push(Space::new().height(8)).push(
            text("This file already exists. Are you sure you want to overwrite it ?")
                .size(12)
                .style(|theme: &Theme| text::Style {
                    color: Some(theme.palette().warning),
                }),
        );
    }

    let can_export = inputs.resolution().is_some()
        && !exporter.file_name().trim().is_empty()
        && !sequence_running(exporter);
    body = body.push(Space::new().height(12)).push(
        row![
            Space::new().width(Length::Fill),
            primary_button("Export as PNG", can_export.then_some(Message::ExportImage)),
        ],
    );

    dialog("Image", Some(Message::CloseImageWindow), body.into())
}

/// A snapshot cannot start while a sequence owns the export size.
#[cfg(feature = "image-sequence")]
fn sequence_running(exporter: &Exporter) -> bool {
    exporter.sequence().is_exporting()
}

#[cfg(not(feature = "image-sequence"))]
fn sequence_running(_exporter: &Exporter) -> bool {
    false
}
