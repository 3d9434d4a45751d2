use std::path::PathBuf;
use std::time::Duration;

use iced::widget::{button, column, container, image, pick_list, row, text, Space};
use iced::{window, ContentFit, Element, Length, Size, Subscription, Task, Theme};

use frame_export_core::export::domain::render_state::RenderState;
use frame_export_core::export::exporter::Exporter;
use frame_export_core::scene::infrastructure::scene_renderer::SceneRenderer;
use frame_export_core::shared::constants::MAX_DIMENSION;
use frame_export_core::shared::rect_size::RectSize;
use frame_export_core::time::domain::clock::Clock;

#[cfg(feature = "image-sequence")]
use frame_export_core::export::sequence_exporter::SequenceSettings;

use crate::panels;
use crate::session::{ExportSession, Status};
use crate::settings::{Appearance, Settings};
use crate::theme;
use crate::workers::encode_worker::{self, EncodeQueue, QUEUE_CAPACITY};

pub const WINDOW_SIZE: Size = Size::new(980.0, 620.0);

const PREVIEW_TICK: Duration = Duration::from_millis(16);
/// Sequence export is not tied to the display, so run as fast as it encodes.
const EXPORT_TICK: Duration = Duration::from_millis(1);
/// The preview renders at this fraction of the window size.
const PREVIEW_SCALE: f32 = 0.5;
/// How long closing the window waits for queued frames to reach the disk.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Message {
    Tick,
    WindowResized(Size),
    CloseRequested(window::Id),
    AppearanceChanged(Appearance),
    PollSystemTheme,
    ShowInFolder(PathBuf),
    ExportWidthChanged(String),
    ExportHeightChanged(String),

    OpenImageWindow,
    CloseImageWindow,
    ImageFileNameChanged(String),
    BrowseImageFolder,
    ImageFolderSelected(Option<PathBuf>),
    ExportImage,

    #[cfg(feature = "image-sequence")]
    OpenSequenceWindow,
    #[cfg(feature = "image-sequence")]
    CloseSequenceWindow,
    #[cfg(feature = "image-sequence")]
    BrowseSequenceFolder,
    #[cfg(feature = "image-sequence")]
    SequenceFolderSelected(Option<PathBuf>),
    #[cfg(feature = "image-sequence")]
    FpsChanged(String),
    #[cfg(feature = "image-sequence")]
    BeginChanged(String),
    #[cfg(feature = "image-sequence")]
    EndChanged(String),
    #[cfg(feature = "image-sequence")]
    StartSequenceExport,
    #[cfg(feature = "image-sequence")]
    StopSequenceExport,
}

/// Text buffers behind the numeric inputs. Values are applied only when they
/// parse, so half-typed numbers stay editable.
#[derive(Debug, Clone)]
pub struct ExportInputs {
    pub width: String,
    pub height: String,
    pub fps: String,
    pub begin: String,
    pub end: String,
}

impl ExportInputs {
    fn from_settings(settings: &Settings) -> Self {
        Self {
            width: settings.export_width.to_string(),
            height: settings.export_height.to_string(),
            fps: settings.fps.to_string(),
            begin: settings.begin_s.to_string(),
            end: settings.end_s.to_string(),
        }
    }

    /// Width and height, if both are integers in `1..=MAX_DIMENSION`.
    pub fn resolution(&self) -> Option<(u32, u32)> {
        let width = self.width.trim().parse::<u32>().ok()?;
        let height = self.height.trim().parse::<u32>().ok()?;
        let valid = |v: u32| (1..=MAX_DIMENSION).contains(&v);
        (valid(width) && valid(height)).then_some((width, height))
    }

    pub fn is_sequence_valid(&self) -> bool {
        let parse = |s: &str| s.trim().parse::<f64>().ok().filter(|v| v.is_finite());
        matches!(
            (parse(&self.fps), parse(&self.begin), parse(&self.end)),
            (Some(fps), Some(begin), Some(end)) if fps > 0.0 && end > begin
        )
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    settings: Settings,
    session: ExportSession,
    renderer: SceneRenderer,
    encode_queue: EncodeQueue,
    inputs: ExportInputs,
    preview: Option<image::Handle>,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let settings = Settings::load();
        let root = std::env::current_dir().unwrap_or_default();
        let (writer, encode_queue) = encode_worker::spawn(QUEUE_CAPACITY);
        let mut exporter = Exporter::new(&root, Box::new(writer));

        if let Some(folder) = &settings.image_folder {
            exporter.set_image_folder(folder);
        }
        exporter.set_image_file_name(settings.file_name.clone());
        #[cfg(feature = "image-sequence")]
        {
            let sequence = exporter.sequence_mut().settings_mut();
            if let Some(folder) = &settings.sequence_folder {
                sequence.folder = folder.clone();
            }
            sequence.fps = settings.fps;
            sequence.begin_s = settings.begin_s;
            sequence.end_s = settings.end_s;
        }

        let window_size = preview_size(WINDOW_SIZE);
        let mut render_state = RenderState::new(window_size);
        if let Err(e) = render_state.set_export_size(settings.export_width, settings.export_height)
        {
            log::warn!("Ignoring saved export size: {e}");
        }

        let renderer = SceneRenderer::gpu_or_cpu(window_size);
        log::info!(
            "Preview renders on the {}",
            if renderer.is_gpu() { "GPU" } else { "CPU" }
        );

        (
            Self {
                inputs: ExportInputs::from_settings(&settings),
                settings,
                session: ExportSession::new(exporter, render_state),
                renderer,
                encode_queue,
                preview: None,
            },
            Task::none(),
        )
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => self.frame(),
            Message::WindowResized(size) => {
                self.session
                    .render_state_mut()
                    .set_window_size(preview_size(size));
            }
            Message::CloseRequested(id) => {
                #[cfg(feature = "image-sequence")]
                self.session.stop_sequence_export();
                for event in self.encode_queue.drain(DRAIN_TIMEOUT) {
                    self.session.handle_encode_event(event);
                }
                return window::close(id);
            }
            Message::AppearanceChanged(appearance) => {
                self.settings.appearance = appearance;
                self.settings.save();
            }
            Message::PollSystemTheme => {
                // theme() resolves the system appearance on every redraw
            }
            Message::ShowInFolder(path) => {
                if let Err(e) = open::that(&path) {
                    log::warn!("Could not open {}: {e}", path.display());
                }
            }
            Message::ExportWidthChanged(value) => {
                self.inputs.width = value;
                self.apply_resolution();
            }
            Message::ExportHeightChanged(value) => {
                self.inputs.height = value;
                self.apply_resolution();
            }

            Message::OpenImageWindow => {
                self.session.exporter_mut().set_image_window_open(true);
            }
            Message::CloseImageWindow => {
                self.session.exporter_mut().set_image_window_open(false);
            }
            Message::ImageFileNameChanged(name) => {
                self.session.exporter_mut().set_image_file_name(name.clone());
                self.settings.file_name = name;
                self.settings.save();
            }
            Message::BrowseImageFolder => {
                return pick_folder(self.session.exporter().image_folder().to_path_buf())
                    .map(Message::ImageFolderSelected);
            }
            Message::ImageFolderSelected(Some(folder)) => {
                self.session.exporter_mut().set_image_folder(folder.clone());
                self.settings.image_folder = Some(folder);
                self.settings.save();
            }
            Message::ImageFolderSelected(None) => {}
            Message::ExportImage => self.session.request_image_export(),

            #[cfg(feature = "image-sequence")]
            Message::OpenSequenceWindow => {
                self.session.exporter_mut().sequence_mut().set_window_open(true);
            }
            #[cfg(feature = "image-sequence")]
            Message::CloseSequenceWindow => {
                self.session.exporter_mut().sequence_mut().set_window_open(false);
            }
            #[cfg(feature = "image-sequence")]
            Message::BrowseSequenceFolder => {
                let start = self.session.exporter().sequence().settings().folder.clone();
                return pick_folder(start).map(Message::SequenceFolderSelected);
            }
            #[cfg(feature = "image-sequence")]
            Message::SequenceFolderSelected(Some(folder)) => {
                self.sequence_settings().folder = folder.clone();
                self.settings.sequence_folder = Some(folder);
                self.settings.save();
            }
            #[cfg(feature = "image-sequence")]
            Message::SequenceFolderSelected(None) => {}
            #[cfg(feature = "image-sequence")]
            Message::FpsChanged(value) => {
                if let Some(fps) = parse_finite(&value) {
                    self.sequence_settings().fps = fps;
                    self.settings.fps = fps;
                    self.settings.save();
                }
                self.inputs.fps = value;
            }
            #[cfg(feature = "image-sequence")]
            Message::BeginChanged(value) => {
                if let Some(begin) = parse_finite(&value) {
                    self.sequence_settings().begin_s = begin;
                    self.settings.begin_s = begin;
                    self.settings.save();
                }
                self.inputs.begin = value;
            }
            #[cfg(feature = "image-sequence")]
            Message::EndChanged(value) => {
                if let Some(end) = parse_finite(&value) {
                    self.sequence_settings().end_s = end;
                    self.settings.end_s = end;
                    self.settings.save();
                }
                self.inputs.end = value;
            }
            #[cfg(feature = "image-sequence")]
            Message::StartSequenceExport => self.session.start_sequence_export(),
            #[cfg(feature = "image-sequence")]
            Message::StopSequenceExport => self.session.stop_sequence_export(),
        }
        Task::none()
    }

    fn frame(&mut self) {
        while let Some(event) = self.encode_queue.try_recv() {
            self.session.handle_encode_event(event);
        }
        self.session
            .frame(&mut self.renderer, self.encode_queue.pending());
        self.refresh_preview();
    }

    #[cfg(feature = "image-sequence")]
    fn sequence_settings(&mut self) -> &mut SequenceSettings {
        self.session.exporter_mut().sequence_mut().settings_mut()
    }

    fn refresh_preview(&mut self) {
        let size = self.session.render_state().size();
        match self.renderer.source().read_pixels(size) {
            Ok(frame) => {
                self.preview = Some(image::Handle::from_rgba(
                    size.width(),
                    size.height(),
                    frame.into_data(),
                ));
            }
            Err(e) => log::warn!("Preview readback failed: {e}"),
        }
    }

    fn apply_resolution(&mut self) {
        let Some((width, height)) = self.inputs.resolution() else {
            return;
        };
        if self
            .session
            .render_state_mut()
            .set_export_size(width, height)
            .is_ok()
        {
            self.settings.export_width = width;
            self.settings.export_height = height;
            self.settings.save();
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let menu = self.menu_bar();

        let preview: Element<'_, Message> = match &self.preview {
            Some(handle) => image(handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => container(text("Rendering\u{2026}"))
                .center(Length::Fill)
                .into(),
        };

        let mut side = column![].spacing(12).width(320);
        if self.session.exporter().is_image_window_open() {
            side = side.push(panels::image_panel::view(
                self.session.exporter(),
                &self.inputs,
            ));
        }
        #[cfg(feature = "image-sequence")]
        if self.session.exporter().sequence().is_window_open() {
            side = side.push(panels::sequence_panel::view(
                self.session.exporter(),
                &self.inputs,
            ));
        }

        let body = row![container(preview).width(Length::Fill).height(Length::Fill), side]
            .spacing(12)
            .height(Length::Fill);

        column![menu, body, self.status_bar()]
            .spacing(8)
            .padding(12)
            .height(Length::Fill)
            .into()
    }

    fn menu_bar(&self) -> Element<'_, Message> {
        let idle = !self.session.is_exporting();
        let image_item = button(text("Image").size(13))
            .on_press_maybe(idle.then_some(Message::OpenImageWindow))
            .style(button::text);

        let mut items = row![text("Export").size(13), image_item]
            .spacing(4)
            .align_y(iced::Alignment::Center);

        #[cfg(feature = "image-sequence")]
        {
            items = items.push(
                button(text("Image Sequence").size(13))
                    .on_press_maybe(idle.then_some(Message::OpenSequenceWindow))
                    .style(button::text),
            );
        }

        row![
            items,
            Space::new().width(Length::Fill),
            text(format!("{:.2}s", self.session.clock().time())).size(12),
            pick_list(
                Appearance::ALL,
                Some(self.settings.appearance),
                Message::AppearanceChanged
            )
            .text_size(13),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center)
        .into()
    }

    fn status_bar(&self) -> Element<'_, Message> {
        match self.session.status() {
            Some(Status::Saved(path)) => {
                let folder = if path.is_dir() {
                    path.clone()
                } else {
                    path.parent().map(|p| p.to_path_buf()).unwrap_or_default()
                };
                row![
                    text(format!("Saved {}", path.display())).size(12),
                    button(text("Show in Folder").size(12))
                        .on_press(Message::ShowInFolder(folder))
                        .style(button::text),
                ]
                .spacing(8)
                .align_y(iced::Alignment::Center)
                .into()
            }
            Some(Status::Error(message)) => text(message.clone())
                .size(12)
                .style(text::danger)
                .into(),
            None => Space::new().height(0).into(),
        }
    }

    pub fn theme(&self) -> Theme {
        theme::resolve_theme(self.settings.appearance)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let tick = if self.session.is_exporting() {
            iced::time::every(EXPORT_TICK).map(|_| Message::Tick)
        } else {
            iced::time::every(PREVIEW_TICK).map(|_| Message::Tick)
        };
        let resize = window::resize_events().map(|(_id, size)| Message::WindowResized(size));
        let close = window::close_requests().map(Message::CloseRequested);

        let mut subscriptions = vec![tick, resize, close];
        if self.settings.appearance == Appearance::System {
            subscriptions
                .push(iced::time::every(Duration::from_secs(2)).map(|_| Message::PollSystemTheme));
        }
        Subscription::batch(subscriptions)
    }
}

fn pick_folder(start: PathBuf) -> Task<Option<PathBuf>> {
    Task::perform(
        async move {
            rfd::AsyncFileDialog::new()
                .set_title("Choose export folder")
                .set_directory(start)
                .pick_folder()
                .await
                .map(|h| h.path().to_path_buf())
        },
        |folder| folder,
    )
}

/// Preview framebuffer size for a window of `window` logical pixels.
fn preview_size(window: Size) -> RectSize {
    let width = (window.width * PREVIEW_SCALE).round().max(1.0) as u32;
    let height = (window.height * PREVIEW_SCALE).round().max(1.0) as u32;
    RectSize::new(width, height).unwrap_or(RectSize::DEFAULT_EXPORT)
}

/// Parses a number typed into an fps or seconds field.
#[cfg(feature = "image-sequence")]
fn parse_finite(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
