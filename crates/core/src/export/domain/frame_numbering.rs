use crate::shared::constants::PNG_EXTENSION;

/// Number of frames needed to cover `duration_s` at `fps`, rounded up.
pub fn total_frames(duration_s: f64, fps: f64) -> u32 {
    let frames = (duration_s * fps).ceil();
    if frames.is_finite() && frames > 0.0 {
        frames.min(u32::MAX as f64) as u32
    } else {
        0
    }
}

/// Digits needed to zero-pad every frame index in `0..total`, never less than one.
pub fn digit_count(total: u32) -> usize {
    let last = total.saturating_sub(1);
    last.checked_ilog10().map_or(1, |log| log as usize + 1)
}

/// `<index zero-padded to digits>.png`, so files sort in frame order.
pub fn frame_file_name(index: u32, digits: usize) -> String {
    format!("{index:0digits$}.{PNG_EXTENSION}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::whole(10.0, 30.0, 300)]
    #[case::rounds_up(1.01, 30.0, 31)]
    #[case::fractional_fps(2.0, 23.976, 48)]
    #[case::empty(0.0, 30.0, 0)]
    #[case::negative(-1.0, 30.0, 0)]
    fn test_total_frames(#[case] duration: f64, #[case] fps: f64, #[case] expected: u32) {
        assert_eq!(total_frames(duration, fps), expected);
    }

    #[rstest]
    #[case::zero(0, 1)]
    #[case::single(1, 1)]
    #[case::ten(10, 1)]
    #[case::eleven(11, 2)]
    #[case::hundred(100, 2)]
    #[case::hundred_and_one(101, 3)]
    #[case::thousand(1000, 3)]
    fn test_digit_count(#[case] total: u32, #[case] expected: usize) {
        assert_eq!(digit_count(total), expected);
    }

    #[test]
    fn test_frame_file_name_pads() {
        assert_eq!(frame_file_name(7, 3), "007.png");
        assert_eq!(frame_file_name(123, 3), "123.png");
        assert_eq!(frame_file_name(0, 1), "0.png");
    }

    #[test]
    fn test_every_index_fits_the_padding() {
        let total = 300;
        let digits = digit_count(total);
        assert_eq!(frame_file_name(total - 1, digits).len(), digits + 4);
    }
}
