use image::{imageops, DynamicImage, Rgba, RgbaImage};
use log::{debug, info, warn};

use crate::{
    async_task::AsyncTask,
    host::{BitmapLoader, LoadError, TargetRegion},
    surface::{CompositeMode, OverlaySurface},
};

/// What the overlay is painted with before the user starts scratching.
#[derive(Debug, Clone, PartialEq)]
pub enum FillSource {
    Color(Rgba<u8>),
    Image(String),
}

enum Bitmap {
    NotRequested,
    Loading(AsyncTask<Result<DynamicImage, LoadError>>),
    Loaded {
        image: DynamicImage,
        cover: RgbaImage,
    },
    Failed,
}

/// Whether the overlay has its content after a fill request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillProgress {
    Done,
    Pending,
}

/// Paints the overlay's initial content and switches it into erasing mode.
pub struct FillManager {
    source: FillSource,
    bitmap: Bitmap,
}

impl FillManager {
    pub fn new(source: FillSource) -> Self {
        Self {
            source,
            bitmap: Bitmap::NotRequested,
        }
    }

    pub fn is_image_loaded(&self) -> bool {
        matches!(self.bitmap, Bitmap::Loaded { .. })
    }

    /// Paints the configured fill, starting the image load if it was never requested.
    pub fn fill(
        &mut self,
        surface: &mut OverlaySurface,
        target: &mut dyn TargetRegion,
        loader: &dyn BitmapLoader,
    ) -> FillProgress {
        match &self.source {
            FillSource::Color(color) => {
                surface.fill(*color);
                Self::arm(surface, target);
                FillProgress::Done
            }
            FillSource::Image(locator) => match &mut self.bitmap {
                Bitmap::Loaded { image, cover } => {
                    if cover.dimensions() != surface.dimensions() {
                        *cover = cover_crop(image, surface.width(), surface.height());
                    }
                    surface.draw_image(cover);
                    Self::arm(surface, target);
                    FillProgress::Done
                }
                Bitmap::Loading(_) => {
                    debug!("Fill image {locator} is still loading");
                    FillProgress::Pending
                }
                Bitmap::NotRequested | Bitmap::Failed => {
                    debug!("Requesting fill image {locator}");
                    self.bitmap = Bitmap::Loading(AsyncTask::new(loader.load(locator)));
                    FillProgress::Pending
                }
            },
        }
    }

    /// Drives a pending image load. Returns the load result once, when it completed.
    pub fn poll(
        &mut self,
        surface: &mut OverlaySurface,
        target: &mut dyn TargetRegion,
    ) -> Option<Result<(), LoadError>> {
        let Bitmap::Loading(task) = &mut self.bitmap else {
            return None;
        };
        let result = task.data()?;
        match result {
            Ok(image) => {
                info!(
                    "Fill image loaded: {}x{}, overlay {}x{}",
                    image.width(),
                    image.height(),
                    surface.width(),
                    surface.height()
                );
                let cover = cover_crop(&image, surface.width(), surface.height());
                surface.draw_image(&cover);
                Self::arm(surface, target);
                self.bitmap = Bitmap::Loaded { image, cover };
                Some(Ok(()))
            }
            Err(e) => {
                warn!("Fill image failed to load: {e}");
                self.bitmap = Bitmap::Failed;
                Some(Err(e))
            }
        }
    }

    /// Starts over from a blank overlay in painting mode and fills again.
    ///
    /// A loaded image is reused, never fetched twice.
    pub fn reset(
        &mut self,
        surface: &mut OverlaySurface,
        target: &mut dyn TargetRegion,
        loader: &dyn BitmapLoader,
    ) -> FillProgress {
        surface.set_mode(CompositeMode::SourceOver);
        surface.clear();
        self.fill(surface, target, loader)
    }

    /// Switches to erasing and reveals the target now that the overlay has content.
    fn arm(surface: &mut OverlaySurface, target: &mut dyn TargetRegion) {
        surface.set_mode(CompositeMode::DestinationOut);
        target.set_opacity(1.0);
        target.request_redraw();
    }
}

/// Scales `image` to cover `width` x `height` with its aspect ratio kept, cropping the overflow
/// evenly from both sides.
///
/// The source window is cut before scaling, so the work is bounded by the overlay size no matter
/// how elongated the image is.
pub fn cover_crop(image: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    let (iw, ih) = (image.width(), image.height());
    if iw == 0 || ih == 0 || width == 0 || height == 0 {
        return RgbaImage::new(width, height);
    }
    let scale = f64::max(width as f64 / iw as f64, height as f64 / ih as f64);
    let crop_w = ((width as f64 / scale).ceil() as u32).clamp(1, iw);
    let crop_h = ((height as f64 / scale).ceil() as u32).clamp(1, ih);

    let window =
        imageops::crop_imm(image, (iw - crop_w) / 2, (ih - crop_h) / 2, crop_w, crop_h).to_image();
    if window.dimensions() == (width, height) {
        window
    } else {
        imageops::resize(&window, width, height, imageops::FilterType::Triangle)
    }
}
