/// A straight (non-premultiplied) 8-bit sRGBA color, the pixel format of every canvas and floating payload.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[allow(clippy::module_name_repetitions)]
pub struct Color(pub [u8; 4]);
impl Color {
    pub const TRANSPARENT: Self = Self([0; 4]);
    pub const WHITE: Self = Self([255; 4]);
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }
    #[must_use]
    pub const fn alpha(self) -> u8 {
        self.0[3]
    }
    #[must_use]
    pub const fn is_opaque(self) -> bool {
        self.0[3] == 255
    }
    /// Composite `self` over `background` (source-over).
    #[must_use]
    pub fn over(self, background: Self) -> Self {
        let src_a = u32::from(self.alpha());
        if src_a == 255 {
            return self;
        }
        if src_a == 0 {
            return background;
        }
        let dst_a = u32::from(background.alpha());
        // out_a = src_a + dst_a * (1 - src_a), all in 0..=255 fixed point.
        let inv = 255 - src_a;
        let out_a_scaled = src_a * 255 + dst_a * inv;
        if out_a_scaled == 0 {
            return Self::TRANSPARENT;
        }
        let mut out = [0u8; 4];
        for (channel, out) in out.iter_mut().enumerate().take(3) {
            let src = u32::from(self.0[channel]);
            let dst = u32::from(background.0[channel]);
            let value = (src * src_a * 255 + dst * dst_a * inv + out_a_scaled / 2) / out_a_scaled;
            // Weighted average of two u8s, can't exceed 255.
            *out = u8::try_from(value).unwrap_or(u8::MAX);
        }
        out[3] = u8::try_from((out_a_scaled + 127) / 255).unwrap_or(u8::MAX);
        Self(out)
    }
}
impl std::fmt::Debug for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r, g, b, a] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}
impl From<[u8; 4]> for Color {
    fn from(value: [u8; 4]) -> Self {
        Self(value)
    }
}
impl From<Color> for [u8; 4] {
    fn from(value: Color) -> Self {
        value.0
    }
}

#[cfg(test)]
mod test {
    use super::Color;
    #[test]
    fn over_extremes() {
        let red = Color::rgb(255, 0, 0);
        assert_eq!(red.over(Color::WHITE), red);
        assert_eq!(Color::TRANSPARENT.over(red), red);
        assert_eq!(Color::TRANSPARENT.over(Color::TRANSPARENT), Color::TRANSPARENT);
    }
    #[test]
    fn over_half() {
        let half_black = Color::rgba(0, 0, 0, 128);
        let out = half_black.over(Color::WHITE);
        assert!(out.is_opaque());
        // Roughly half way, allow rounding.
        assert!((126..=128).contains(&out.0[0]), "{out:?}");
    }
    #[test]
    fn debug_hex() {
        assert_eq!(format!("{:?}", Color::rgba(1, 2, 255, 16)), "#0102ff10");
    }
}
