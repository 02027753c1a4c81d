//! # Bitmaps
//!
//! Owned RGBA pixel buffers. The canvas of every frame is a [`Bitmap`], as is the detached payload
//! of a floating selection. Payloads never borrow from the canvas - they are copied out with
//! [`Bitmap::try_sub_copy`] and moved around by value from then on.

use crate::{
    color::Color,
    geom::{Point, Rect, Size},
};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapError {
    #[error("not enough memory for a {0} bitmap")]
    OutOfMemory(Size),
    #[error("a {0} bitmap is too large to address")]
    TooLarge(Size),
}

/// How a source bitmap is combined with the pixels below it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct BlitOptions {
    /// Source pixels exactly equal to this color are skipped.
    pub mask: Option<Color>,
    /// Composite source-over instead of overwriting.
    pub alpha_blend: bool,
}
impl BlitOptions {
    /// Overwrite every destination pixel, including alpha. Used to restore captured pixels.
    pub const REPLACE: Self = Self {
        mask: None,
        alpha_blend: false,
    };
}

#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    size: Size,
    // Row-major, `size.width * size.height` long.
    pixels: Vec<Color>,
}
impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't dump the pixels.
        f.debug_struct("Bitmap").field("size", &self.size).finish()
    }
}
impl Bitmap {
    /// Allocate a bitmap filled with one color, reporting allocation failure instead of aborting.
    pub fn new(size: Size, fill: Color) -> Result<Self, BitmapError> {
        let mut pixels = Self::try_alloc(size)?;
        // Area is known to fit, try_alloc checked.
        pixels.resize(size.area().unwrap_or_default(), fill);
        Ok(Self { size, pixels })
    }
    /// Number of pixels in a bitmap of `size`, if its bytes can be addressed at all.
    pub fn checked_area(size: Size) -> Result<usize, BitmapError> {
        size.area()
            .filter(|area| {
                area.checked_mul(std::mem::size_of::<Color>())
                    .is_some_and(|bytes| isize::try_from(bytes).is_ok())
            })
            .ok_or(BitmapError::TooLarge(size))
    }
    /// Allocate an empty vec with room for exactly `size` pixels.
    fn try_alloc(size: Size) -> Result<Vec<Color>, BitmapError> {
        let area = Self::checked_area(size)?;
        #[cfg(test)]
        if test_alloc::FAIL.get() {
            return Err(BitmapError::OutOfMemory(size));
        }
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(area).map_err(|_| {
            log::warn!(
                "failed to allocate {size} bitmap ({})",
                human_bytes::human_bytes(
                    (area as f64) * (std::mem::size_of::<Color>() as f64)
                )
            );
            BitmapError::OutOfMemory(size)
        })?;
        Ok(pixels)
    }
    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }
    /// The area covered by this bitmap, placed at the origin.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::of_size(self.size)
    }
    #[must_use]
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }
    /// Raw RGBA bytes, row-major.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
    /// Size in bytes of the pixel data.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<Color>()
    }
    fn index(&self, point: Point) -> Option<usize> {
        if !self.rect().contains(point) {
            return None;
        }
        // Contained, so both are non-negative and in range.
        let x = usize::try_from(point.x).ok()?;
        let y = usize::try_from(point.y).ok()?;
        let width = usize::try_from(self.size.width).ok()?;
        Some(y * width + x)
    }
    #[must_use]
    pub fn get(&self, point: Point) -> Option<Color> {
        self.index(point).map(|idx| self.pixels[idx])
    }
    /// Set a single pixel. Returns false if out of bounds.
    pub fn put(&mut self, point: Point, color: Color) -> bool {
        match self.index(point) {
            Some(idx) => {
                self.pixels[idx] = color;
                true
            }
            None => false,
        }
    }
    /// Iterate the rows of `rect` (clipped to this bitmap) as index ranges into `pixels`.
    fn rows(&self, rect: Rect) -> impl Iterator<Item = std::ops::Range<usize>> {
        let clipped = rect.intersection(&self.rect());
        // Clipped to our own bounds, so these are all non-negative and in range.
        let width = self.size.width as usize;
        let x0 = clipped.origin.x.max(0) as usize;
        let y0 = clipped.origin.y.max(0) as usize;
        let w = clipped.size.width as usize;
        let h = clipped.size.height as usize;
        (y0..y0 + h).map(move |y| {
            let start = y * width + x0;
            start..start + w
        })
    }
    /// Fill the part of `rect` that lies within the bitmap.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let rows: Vec<_> = self.rows(rect).collect();
        for row in rows {
            self.pixels[row].fill(color);
        }
    }
    /// Draw `src` with its top-left at `origin`. Parts falling outside `self` are dropped.
    pub fn blit(&mut self, src: &Bitmap, origin: Point, options: BlitOptions) {
        let dest = Rect::from_origin_size(origin, src.size).intersection(&self.rect());
        if dest.is_empty() {
            return;
        }
        // Where `dest` starts within `src`. Non-negative as `dest` is within the src rect.
        let src_local = dest.translated(Point::ZERO - origin);
        let src_rows = src.rows(src_local);
        let dest_rows: Vec<_> = self.rows(dest).collect();
        for (src_row, dest_row) in src_rows.zip(dest_rows) {
            let from = &src.pixels[src_row];
            let to = &mut self.pixels[dest_row];
            if options == BlitOptions::REPLACE {
                to.copy_from_slice(from);
                continue;
            }
            for (&src_px, dest_px) in from.iter().zip(to.iter_mut()) {
                if options.mask == Some(src_px) {
                    continue;
                }
                *dest_px = if options.alpha_blend {
                    src_px.over(*dest_px)
                } else {
                    src_px
                };
            }
        }
    }
    /// Copy out the part of `rect` lying within the bitmap.
    ///
    /// The result has the size of the clipped rectangle, which may be empty.
    pub fn try_sub_copy(&self, rect: Rect) -> Result<Bitmap, BitmapError> {
        let clipped = rect.intersection(&self.rect());
        let mut pixels = Self::try_alloc(clipped.size)?;
        for row in self.rows(clipped) {
            pixels.extend_from_slice(&self.pixels[row]);
        }
        Ok(Bitmap {
            size: clipped.size,
            pixels,
        })
    }
    /// Infallible version of [`Self::try_sub_copy`], for snapshots no larger than a bitmap that
    /// already exists. Allocation failure aborts like any other `Vec` growth.
    #[must_use]
    pub fn sub_copy(&self, rect: Rect) -> Bitmap {
        let clipped = rect.intersection(&self.rect());
        let mut pixels = Vec::with_capacity(clipped.size.area().unwrap_or(0));
        for row in self.rows(clipped) {
            pixels.extend_from_slice(&self.pixels[row]);
        }
        Bitmap {
            size: clipped.size,
            pixels,
        }
    }
    /// Shrink to `rect` (in this bitmap's own coordinates) without reallocating.
    pub fn crop_in_place(&mut self, rect: Rect) {
        let clipped = rect.intersection(&self.rect());
        let rows: Vec<_> = self.rows(clipped).collect();
        let mut write = 0;
        for row in rows {
            let len = row.len();
            self.pixels.copy_within(row, write);
            write += len;
        }
        self.pixels.truncate(write);
        self.size = clipped.size;
    }
    /// A new bitmap of `size`, with the old content kept at the top-left and new area filled.
    pub fn resized(&self, size: Size, fill: Color) -> Result<Bitmap, BitmapError> {
        let mut new = Bitmap::new(size, fill)?;
        new.blit(self, Point::ZERO, BlitOptions::REPLACE);
        Ok(new)
    }
}

/// Pixels captured from a canvas so they can be put back later.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Where `pixels` was taken from. May be smaller than requested, if the request was partly offscreen.
    pub rect: Rect,
    pub pixels: Bitmap,
}
impl Snapshot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rect.is_empty()
    }
}
