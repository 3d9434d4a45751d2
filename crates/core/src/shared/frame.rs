use crate::shared::constants::BYTES_PER_PIXEL;
use crate::shared::rect_size::RectSize;

/// Pixels read out of a framebuffer: tightly packed RGBA8, row-major,
/// top row first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    size: RectSize,
}

impl Frame {
    pub fn new(data: Vec<u8>, size: RectSize) -> Self {
        debug_assert_eq!(
            data.len(),
            size.pixel_count() * BYTES_PER_PIXEL as usize,
            "data length must equal width * height * 4"
        );
        Self { data, size }
    }

    /// A frame where every pixel is `rgba`.
    pub fn filled(size: RectSize, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(size.pixel_count() * BYTES_PER_PIXEL as usize)
            .collect();
        Self { data, size }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn size(&self) -> RectSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width()
    }

    pub fn height(&self) -> u32 {
        self.size.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    /// Reverses row order. OpenGL-style readbacks deliver the bottom row first.
    pub fn flip_vertical(&mut self) {
        let stride = self.row_stride();
        let height = self.height() as usize;
        for row in 0..height / 2 {
            let (top, bottom) = self.data.split_at_mut((height - 1 - row) * stride);
            top[row * stride..(row + 1) * stride].swap_with_slice(&mut bottom[..stride]);
        }
    }

    fn row_stride(&self) -> usize {
        (self.width() * BYTES_PER_PIXEL) as usize
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width() && y < self.height(), "pixel out of bounds");
        y as usize * self.row_stride() + (x * BYTES_PER_PIXEL) as usize
    }
}
