//! Services the session needs from whoever renders it.

use std::{cell::Cell, collections::HashMap, io, path::PathBuf};

use futures::{future::BoxFuture, FutureExt};
use image::DynamicImage;

use crate::pointer::Point;

/// The region the overlay covers.
pub trait TargetRegion {
    /// Current rendered width and height in pixels.
    fn rendered_size(&self) -> (u32, u32);

    /// Top-left corner of the region relative to the page.
    fn page_origin(&self) -> Point;

    /// Whether the device reports touch input. Queried once per session.
    fn supports_touch(&self) -> bool {
        false
    }

    /// Make the region a positioning context for the overlay layer.
    fn set_positioned(&mut self);

    /// Place the overlay as an absolutely positioned layer covering the whole region.
    fn attach_overlay(&mut self);

    fn detach_overlay(&mut self);

    /// Opacity of the region itself. Hosts may start at 0 to hide the region until the overlay
    /// has content.
    fn set_opacity(&mut self, opacity: f32);

    /// Force the overlay to be recomposited after its pixels changed.
    fn request_redraw(&mut self) {}
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO Error while loading {locator}: {source}")]
    Io {
        locator: String,
        #[source]
        source: io::Error,
    },
    #[error("Could not decode {locator}: {source}")]
    Decode {
        locator: String,
        #[source]
        source: image::ImageError,
    },
    #[error("Loading {0} was abandoned")]
    Abandoned(String),
}

/// Fetches and decodes fill images.
pub trait BitmapLoader {
    fn load(&self, locator: &str) -> BoxFuture<'static, Result<DynamicImage, LoadError>>;
}

impl<B: BitmapLoader + ?Sized> BitmapLoader for Box<B> {
    fn load(&self, locator: &str) -> BoxFuture<'static, Result<DynamicImage, LoadError>> {
        (**self).load(locator)
    }
}

pub fn decode_bitmap(locator: &str, bytes: &[u8]) -> Result<DynamicImage, LoadError> {
    image::load_from_memory(bytes).map_err(|source| LoadError::Decode {
        locator: locator.to_string(),
        source,
    })
}

/// Loads images from disk, relative to a base directory.
///
/// Reading and decoding happen on a helper thread so the UI thread never blocks.
pub struct FileBitmapLoader {
    base: PathBuf,
}

impl FileBitmapLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn load_blocking(path: PathBuf, locator: &str) -> Result<DynamicImage, LoadError> {
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            locator: locator.to_string(),
            source,
        })?;
        decode_bitmap(locator, &bytes)
    }
}

impl BitmapLoader for FileBitmapLoader {
    fn load(&self, locator: &str) -> BoxFuture<'static, Result<DynamicImage, LoadError>> {
        let (tx, rx) = futures::channel::oneshot::channel();
        let path = self.base.join(locator);
        let locator = locator.to_string();
        let thread_locator = locator.clone();

        let handle = std::thread::spawn(move || {
            let r = Self::load_blocking(path, &thread_locator);
            tx.send(r).is_ok()
        });
        async move {
            let r = rx
                .await
                .map_err(|_| LoadError::Abandoned(locator.clone()))
                .and_then(|r| r);
            match handle.join() {
                Ok(_) => r,
                Err(_) => Err(LoadError::Abandoned(locator)),
            }
        }
        .boxed()
    }
}

/// Serves already decoded images and counts how often it was asked.
#[derive(Default)]
pub struct MemoryBitmapLoader {
    images: HashMap<String, DynamicImage>,
    fetches: Cell<usize>,
}

impl MemoryBitmapLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, locator: impl Into<String>, image: DynamicImage) -> Self {
        self.images.insert(locator.into(), image);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }
}

impl BitmapLoader for MemoryBitmapLoader {
    fn load(&self, locator: &str) -> BoxFuture<'static, Result<DynamicImage, LoadError>> {
        self.fetches.set(self.fetches.get() + 1);
        let result = self.images.get(locator).cloned().ok_or_else(|| LoadError::Io {
            locator: locator.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "No such image"),
        });
        futures::future::ready(result).boxed()
    }
}

/// Checkerboard used when no fill image is around.
pub fn chessboard(width: u32, height: u32, square: u32) -> DynamicImage {
    let square = square.max(1);
    let image = image::RgbaImage::from_fn(width, height, |x, y| {
        if (x / square + y / square) % 2 == 0 {
            image::Rgba([0xd0, 0xb0, 0x40, 255])
        } else {
            image::Rgba([0x90, 0x70, 0x20, 255])
        }
    });
    DynamicImage::ImageRgba8(image)
}
