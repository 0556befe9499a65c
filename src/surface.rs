use image::{Rgba, RgbaImage};

/// How newly painted pixels combine with what is already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    /// Paint on top of existing pixels.
    #[default]
    SourceOver,
    /// Paint removes existing pixels, scaled by the paint's alpha.
    DestinationOut,
}

impl CompositeMode {
    pub fn apply(self, dst: &mut Rgba<u8>, src: Rgba<u8>) {
        let sa = src[3] as u32;
        let da = dst[3] as u32;
        match self {
            CompositeMode::SourceOver => {
                if sa == 255 {
                    *dst = src;
                    return;
                }
                // alpha scaled to 255 * 255
                let out_a = sa * 255 + da * (255 - sa);
                if out_a == 0 {
                    *dst = Rgba([0, 0, 0, 0]);
                    return;
                }
                let mut out = [0u8; 4];
                for (c, channel) in out.iter_mut().take(3).enumerate() {
                    let mixed = src[c] as u32 * sa * 255 + dst[c] as u32 * da * (255 - sa);
                    *channel = ((mixed + out_a / 2) / out_a) as u8;
                }
                out[3] = ((out_a + 127) / 255) as u8;
                *dst = Rgba(out);
            }
            CompositeMode::DestinationOut => {
                let out_a = (da * (255 - sa) + 127) / 255;
                *dst = if out_a == 0 {
                    Rgba([0, 0, 0, 0])
                } else {
                    Rgba([dst[0], dst[1], dst[2], out_a as u8])
                };
            }
        }
    }
}

/// The raster the user scratches away.
///
/// Starts fully transparent. Every mutation bumps [`OverlaySurface::generation`] so a host
/// only needs to re-upload the pixels when it changed.
pub struct OverlaySurface {
    pixels: RgbaImage,
    mode: CompositeMode,
    generation: u64,
}

impl OverlaySurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            mode: CompositeMode::default(),
            generation: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
        self.pixels.get_pixel_checked(x, y).map(|p| p[3])
    }

    pub fn mode(&self) -> CompositeMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CompositeMode) {
        self.mode = mode;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Paints `color` over the whole surface using the current composite mode.
    pub fn fill(&mut self, color: Rgba<u8>) {
        let mode = self.mode;
        for p in self.pixels.pixels_mut() {
            mode.apply(p, color);
        }
        self.touch();
    }

    /// Composites an image of exactly the surface's size onto it.
    pub fn draw_image(&mut self, image: &RgbaImage) {
        debug_assert_eq!(image.dimensions(), self.dimensions());
        let mode = self.mode;
        for (dst, src) in self.pixels.pixels_mut().zip(image.pixels()) {
            mode.apply(dst, *src);
        }
        self.touch();
    }

    /// Composites `color` onto each listed pixel. Coordinates outside the surface are skipped.
    pub fn paint_pixels(&mut self, coords: impl IntoIterator<Item = (u32, u32)>, color: Rgba<u8>) {
        let mode = self.mode;
        let (width, height) = self.dimensions();
        for (x, y) in coords {
            if x < width && y < height {
                mode.apply(self.pixels.get_pixel_mut(x, y), color);
            }
        }
        self.touch();
    }

    /// Makes every pixel fully transparent regardless of the composite mode.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
        self.touch();
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREY: Rgba<u8> = Rgba([0xcc, 0xcc, 0xcc, 255]);

    #[test]
    fn new_surface_is_transparent() {
        let surface = OverlaySurface::new(4, 3);
        assert_eq!((4, 3), surface.dimensions());
        assert!(surface.pixels().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn opaque_source_over_replaces() {
        let mut surface = OverlaySurface::new(2, 2);
        surface.fill(GREY);
        assert!(surface.pixels().pixels().all(|p| *p == GREY));
    }

    #[test]
    fn translucent_source_over_blends_alpha() {
        let mut dst = Rgba([0, 0, 0, 0]);
        CompositeMode::SourceOver.apply(&mut dst, Rgba([255, 0, 0, 128]));
        assert_eq!(Rgba([255, 0, 0, 128]), dst);

        let mut dst = Rgba([0, 0, 255, 255]);
        CompositeMode::SourceOver.apply(&mut dst, Rgba([255, 0, 0, 128]));
        assert_eq!(255, dst[3]);
        assert!(dst[0] > 120 && dst[2] > 120);
    }

    #[test]
    fn opaque_destination_out_erases_completely() {
        let mut dst = GREY;
        CompositeMode::DestinationOut.apply(&mut dst, Rgba([0, 0, 0, 255]));
        assert_eq!(Rgba([0, 0, 0, 0]), dst);
    }

    #[test]
    fn translucent_destination_out_erases_partially() {
        let mut dst = GREY;
        CompositeMode::DestinationOut.apply(&mut dst, Rgba([0, 0, 0, 128]));
        assert_eq!(127, dst[3]);
        assert_eq!(0xcc, dst[0]);
    }

    #[test]
    fn paint_pixels_skips_out_of_bounds() {
        let mut surface = OverlaySurface::new(2, 2);
        surface.fill(GREY);
        surface.set_mode(CompositeMode::DestinationOut);
        surface.paint_pixels([(1, 1), (5, 0)], Rgba([0, 0, 0, 255]));
        assert_eq!(Some(0), surface.alpha_at(1, 1));
        assert_eq!(Some(255), surface.alpha_at(0, 0));
    }

    #[test]
    fn every_mutation_bumps_generation() {
        let mut surface = OverlaySurface::new(2, 2);
        let start = surface.generation();
        surface.fill(GREY);
        surface.clear();
        surface.paint_pixels([(0, 0)], Rgba([0, 0, 0, 255]));
        assert_eq!(start + 3, surface.generation());
    }
}
