mod app;
mod panels;
mod session;
mod settings;
mod theme;
mod widgets;
mod workers;

use app::App;

use frame_export_core::scene::domain::scene::Scene;
use frame_export_core::scene::infrastructure::plasma_scene::PlasmaScene;
use frame_export_core::shared::frame::Frame;
use frame_export_core::shared::rect_size::RectSize;

const ICON_SIZE: u32 = 64;
/// Scene time the icon is captured at.
const ICON_TIME: f64 = 1.25;

fn main() -> iced::Result {
    env_logger::init();

    iced::application(App::new, App::update, App::view)
        .title("Frame Export")
        .theme(App::theme)
        .subscription(App::subscription)
        .window(iced::window::Settings {
            size: app::WINDOW_SIZE,
            icon: render_icon(),
            // Closing waits for queued frames, see Message::CloseRequested
            exit_on_close_request: false,
            ..Default::default()
        })
        .run()
}

fn render_icon() -> Option<iced::window::Icon> {
    let size = RectSize::new(ICON_SIZE, ICON_SIZE).ok()?;
    let mut frame = Frame::filled(size, [0, 0, 0, 255]);
    PlasmaScene::new().render(ICON_TIME, &mut frame);
    iced::window::icon::from_rgba(frame.into_data(), ICON_SIZE, ICON_SIZE).ok()
}
