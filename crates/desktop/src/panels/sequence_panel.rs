use iced::widget::{button, column, progress_bar, row, text, text_input, Space};
use iced::{Element, Length};

use frame_export_core::export::exporter::Exporter;

use super::{dialog, field, resolution};
use crate::app::{ExportInputs, Message};
use crate::widgets::primary_button::primary_button;

pub fn view<'a>(exporter: &'a Exporter, inputs: &'a ExportInputs) -> Element<'a, Message> {
    let sequence = exporter.sequence();
    let exporting = sequence.is_exporting();
    let folder = sequence.settings().folder.display().to_string();

    let mut path_row = row![text_input("Folder", &folder).size(13).padding(6)]
        .spacing(6)
        .align_y(iced::Alignment::Center);
    if !exporting {
        path_row =
            path_row.push(button(text("Browse").size(13)).on_press(Message::BrowseSequenceFolder));
    }

    let editable = !exporting;
    let on = |message: fn(String) -> Message| editable.then_some(message);

    let mut body = column![
        resolution(inputs, editable),
        Space::new().height(10),
        path_row,
        Space::new().height(6),
        field("FPS", &inputs.fps, on(Message::FpsChanged)),
        field("From (s)", &inputs.begin, on(Message::BeginChanged)),
        field("To (s)", &inputs.end, on(Message::EndChanged)),
        Space::new().height(12),
    ]
    .spacing(6);

    match sequence.progress() {
        Some(progress) => {
            body = body
                .push(text(progress.label()).size(13))
                .push(text(progress.remaining_label()).size(12))
                .push(progress_bar(0.0..=1.0, progress.fraction()))
                .push(row![
                    Space::new().width(Length::Fill),
                    primary_button("Stop exporting", Some(Message::StopSequenceExport)),
                ]);
        }
        None => {
            let can_start = inputs.is_sequence_valid() && inputs.resolution().is_some();
            body = body.push(row![
                Space::new().width(Length::Fill),
                primary_button(
                    "Start exporting",
                    can_start.then_some(Message::StartSequenceExport)
                ),
            ]);
        }
    }

    let on_close = (!exporting).then_some(Message::CloseSequenceWindow);
    dialog("Image Sequence", on_close, body.into())
}
