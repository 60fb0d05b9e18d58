use crate::{FrameSize, VisionError};

/// Owned 8-bit camera frame, row-major, interleaved channels.
///
/// `channels` is 1 for grayscale or 3 for BGR as delivered by most webcams.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: Vec<u8>,
}

/// Borrowed single-channel view.
#[derive(Clone, Copy, Debug)]
pub struct GrayView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

impl Frame {
    /// Build a frame, checking that the buffer length matches the dimensions.
    pub fn from_raw(
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<u8>,
    ) -> Result<Self, VisionError> {
        let frame = Self {
            width,
            height,
            channels,
            data,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// Check the layout invariants `from_raw` enforces.
    ///
    /// Fields are public, so frames built by hand must pass this before any
    /// pixel access.
    pub fn validate(&self) -> Result<(), VisionError> {
        let expected = self
            .width
            .checked_mul(self.height)
            .and_then(|n| n.checked_mul(self.channels));
        match expected {
            Some(expected)
                if (self.channels == 1 || self.channels == 3) && self.data.len() == expected =>
            {
                Ok(())
            }
            _ => Err(VisionError::InvalidFrame {
                width: self.width,
                height: self.height,
                channels: self.channels,
                len: self.data.len(),
            }),
        }
    }

    /// Uniform grayscale frame.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            channels: 1,
            data: vec![value; width * height],
        }
    }

    #[inline]
    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width as u32, self.height as u32)
    }

    /// Grayscale view, if the frame is already single-channel.
    pub fn as_gray(&self) -> Option<GrayView<'_>> {
        (self.channels == 1).then_some(GrayView {
            width: self.width,
            height: self.height,
            data: &self.data,
        })
    }

    /// Convert to single-channel luma (BT.601 weights on BGR input).
    pub fn to_gray(&self) -> Frame {
        if self.channels == 1 {
            return self.clone();
        }
        let data = self
            .data
            .chunks_exact(self.channels)
            .map(|px| {
                let (b, g, r) = (px[0] as u32, px[1] as u32, px[2] as u32);
                ((114 * b + 587 * g + 299 * r + 500) / 1000) as u8
            })
            .collect();
        Frame {
            width: self.width,
            height: self.height,
            channels: 1,
            data,
        }
    }

    /// Set a grayscale pixel; out-of-bounds writes are ignored.
    #[inline]
    pub fn put(&mut self, x: i64, y: i64, value: u8) {
        if self.channels != 1 || x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = value;
        }
    }
}

impl GrayView<'_> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}
