use super::FrameBuffer;

/// An image of at most 8x8 pixels.
///
/// `size` packs the dimensions as `T WWW X HHH`: T marks a stamp rather than
/// a tile, WWW is width - 1, X is unused and HHH is height - 1. Each row byte
/// holds its leftmost pixel in the MSB.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tile {
    pub size: u8,
    pub bytes: [u8; 8],
}

impl Tile {
    pub const fn new(width: u8, height: u8, bytes: [u8; 8]) -> Self {
        Self {
            size: Self::encode_size(width, height),
            bytes,
        }
    }

    /// Pack 1..=8 width and height into the size byte.
    pub const fn encode_size(width: u8, height: u8) -> u8 {
        let w = if width == 0 { 0 } else { (width - 1) & 0x07 };
        let h = if height == 0 { 0 } else { (height - 1) & 0x07 };
        (w << 4) | h
    }

    pub fn width(&self) -> u8 {
        ((self.size & 0x70) >> 4) + 1
    }

    pub fn height(&self) -> u8 {
        (self.size & 0x07) + 1
    }

    pub fn is_stamp(&self) -> bool {
        self.size & 0x80 != 0
    }

    #[inline]
    pub fn is_set(&self, x: u8, y: u8) -> bool {
        x < 8 && y < 8 && self.bytes[usize::from(y)] & (0x80 >> x) != 0
    }

    /// Draw the tile with its top left corner at (x, y). With `full` the unset
    /// pixels of the tile are cleared as well, otherwise only set pixels are
    /// drawn. Parts outside the buffer are clipped.
    pub fn place<const N: usize>(&self, fb: &mut FrameBuffer<N>, x: i16, y: i16, full: bool) {
        self.for_each_visible(fb, x, y, |fb, sx, sy, set| {
            if set {
                fb.set_pixel(sx, sy, true);
            } else if full {
                fb.set_pixel(sx, sy, false);
            }
        });
    }

    /// Clear every buffer pixel covered by a set tile pixel.
    pub fn erase<const N: usize>(&self, fb: &mut FrameBuffer<N>, x: i16, y: i16) {
        self.for_each_visible(fb, x, y, |fb, sx, sy, set| {
            if set {
                fb.set_pixel(sx, sy, false);
            }
        });
    }

    fn for_each_visible<const N: usize, F>(&self, fb: &mut FrameBuffer<N>, x: i16, y: i16, mut f: F)
    where
        F: FnMut(&mut FrameBuffer<N>, u8, u8, bool),
    {
        let (fb_width, fb_height) = (i16::from(fb.width()), i16::from(fb.height()));
        for ty in 0..self.height() {
            let sy = match y.checked_add(i16::from(ty)) {
                Some(sy) if sy >= 0 && sy < fb_height => sy,
                _ => continue,
            };
            for tx in 0..self.width() {
                let sx = match x.checked_add(i16::from(tx)) {
                    Some(sx) if sx >= 0 && sx < fb_width => sx,
                    _ => continue,
                };
                f(fb, sx as u8, sy as u8, self.is_set(tx, ty));
            }
        }
    }
}
