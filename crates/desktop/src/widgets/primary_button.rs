use iced::border::Border;
use iced::widget::{button, text, Button};
use iced::{Color, Shadow, Theme, Vector};

const HOVER_DARKEN: f32 = 0.05;
const CORNER_RADIUS: f32 = 8.0;
const SHADOW_BLUR: f32 = 8.0;
const SHADOW_OFFSET_Y: f32 = 2.0;
const SHADOW_ALPHA: f32 = 0.25;
const DISABLED_ALPHA: f32 = 0.45;

/// Filled accent button. Passing `None` renders it disabled.
pub fn primary_button<'a, Message: Clone + 'a>(
    label: &'a str,
    on_press: Option<Message>,
) -> Button<'a, Message> {
    button(text(label).size(13))
        .on_press_maybe(on_press)
        .padding([8, 18])
        .style(|theme: &Theme, status: button::Status| {
            let base = theme.extended_palette().primary.base.color;
            match status {
                button::Status::Active => styled(base, 0.0),
                button::Status::Hovered => styled(base, 1.0),
                button::Status::Pressed => styled(base, 2.0),
                button::Status::Disabled => button::Style {
                    shadow: Shadow::default(),
                    ..styled(
                        Color {
                            a: DISABLED_ALPHA,
                            ..base
                        },
                        0.0,
                    )
                },
            }
        })
}

fn styled(base: Color, darken_steps: f32) -> button::Style {
    button::Style {
        background: Some(darken(base, darken_steps).into()),
        text_color: Color::WHITE,
        border: Border {
            radius: CORNER_RADIUS.into(),
            ..Border::default()
        },
        shadow: Shadow {
            color: Color::from_rgba(base.r, base.g, base.b, SHADOW_ALPHA),
            offset: Vector::new(0.0, SHADOW_OFFSET_Y),
            blur_radius: SHADOW_BLUR,
        },
        ..button::Style::default()
    }
}

fn darken(color: Color, steps: f32) -> Color {
    let shift = HOVER_DARKEN * steps;
    Color {
        r: (color.r - shift).max(0.0),
        g: (color.g - shift).max(0.0),
        b: (color.b - shift).max(0.0),
        a: color.a,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_darken_clamps_and_keeps_alpha() {
        let c = darken(Color::from_rgba(0.02, 0.5, 1.0, 0.4), 1.0);
        assert_eq!(c.r, 0.0);
        assert!((c.g - 0.45).abs() < 1e-6);
        assert!((c.b - 0.95).abs() < 1e-6);
        assert_eq!(c.a, 0.4);
    }
}
