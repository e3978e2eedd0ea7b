/// Row-major 1 bit per pixel buffer.
///
/// Each row takes `width_bytes` bytes, the MSB of a byte is its leftmost pixel.
/// Laid out this way the first byte is the top row of the leftmost 8x8 module
/// of a MAX7219 chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer<const N: usize> {
    width: u8,
    height: u8,
    width_bytes: u8,
    buffer: [u8; N],
}

impl<const N: usize> FrameBuffer<N> {
    /// `N` must hold `height` rows of `ceil(width / 8)` bytes. Rows that do not
    /// fit are dropped from the visible height.
    pub fn new(width: u8, height: u8) -> Self {
        let width_bytes = ((u16::from(width) + 7) / 8) as u8;
        let rows = if width_bytes == 0 {
            height
        } else {
            (N / usize::from(width_bytes)).min(usize::from(height)) as u8
        };
        Self {
            width,
            height: rows,
            width_bytes,
            buffer: [0; N],
        }
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn width_bytes(&self) -> u8 {
        self.width_bytes
    }

    pub fn as_bytes(&self) -> &[u8] {
        let used = usize::from(self.width_bytes) * usize::from(self.height);
        &self.buffer[..used]
    }

    pub fn clear(&mut self) {
        self.buffer = [0; N];
    }

    fn locate(&self, x: u8, y: u8) -> Option<(usize, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = usize::from(y) * usize::from(self.width_bytes) + usize::from(x / 8);
        Some((index, 0x80 >> (x % 8)))
    }

    /// Pixels outside the buffer are ignored.
    pub fn set_pixel(&mut self, x: u8, y: u8, on: bool) {
        if let Some((index, mask)) = self.locate(x, y) {
            if on {
                self.buffer[index] |= mask;
            } else {
                self.buffer[index] &= !mask;
            }
        }
    }

    pub fn pixel(&self, x: u8, y: u8) -> bool {
        self.locate(x, y)
            .map_or(false, |(index, mask)| self.buffer[index] & mask != 0)
    }

    /// Horizontal line from `x_start` to `x_end` inclusive, clipped to the buffer.
    pub fn hline(&mut self, x_start: i16, x_end: i16, y: i16, on: bool) {
        if y < 0 || y >= i16::from(self.height) {
            return;
        }
        let from = x_start.max(0);
        let to = x_end.min(i16::from(self.width) - 1);
        for x in from..=to {
            self.set_pixel(x as u8, y as u8, on);
        }
    }

    /// Vertical line from `y_start` to `y_end` inclusive, clipped to the buffer.
    pub fn vline(&mut self, x: i16, y_start: i16, y_end: i16, on: bool) {
        if x < 0 || x >= i16::from(self.width) {
            return;
        }
        let from = y_start.max(0);
        let to = y_end.min(i16::from(self.height) - 1);
        for y in from..=to {
            self.set_pixel(x as u8, y as u8, on);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Matrix = FrameBuffer<32>;

    #[test]
    fn test_pixel_addressing_is_row_major_msb_first() {
        let mut fb = Matrix::new(32, 8);
        fb.set_pixel(0, 0, true);
        fb.set_pixel(9, 0, true);
        fb.set_pixel(31, 7, true);

        let bytes = fb.as_bytes();
        assert_eq!(bytes[0], 0x80);
        assert_eq!(bytes[1], 0x40);
        assert_eq!(bytes[31], 0x01);
        assert!(fb.pixel(9, 0));
        assert!(!fb.pixel(8, 0));

        fb.set_pixel(9, 0, false);
        assert_eq!(fb.as_bytes()[1], 0);
    }

    #[test]
    fn test_out_of_range_pixels_are_ignored() {
        let mut fb = Matrix::new(32, 8);
        fb.set_pixel(32, 0, true);
        fb.set_pixel(0, 8, true);

        assert!(fb.as_bytes().iter().all(|&b| b == 0));
        assert!(!fb.pixel(40, 40));
    }

    #[test]
    fn test_lines_are_clipped() {
        let mut fb = Matrix::new(32, 8);
        fb.hline(-5, 40, 2, true);
        assert_eq!(&fb.as_bytes()[8..12], &[0xFF; 4]);

        fb.clear();
        fb.vline(3, -2, 3, true);
        for y in 0..8 {
            assert_eq!(fb.pixel(3, y), y <= 3);
        }

        fb.clear();
        fb.hline(5, 2, 0, true);
        fb.vline(-1, 0, 7, true);
        fb.hline(0, 31, 8, true);
        assert!(fb.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_odd_width_rounds_up_to_bytes() {
        let fb = FrameBuffer::<30>::new(10, 20);
        assert_eq!(fb.width_bytes(), 2);
        assert_eq!(fb.height(), 15);
        assert_eq!(fb.as_bytes().len(), 30);
    }
}
