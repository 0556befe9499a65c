use log::debug;

use crate::surface::OverlaySurface;

/// Result of scanning the overlay's alpha channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub cleared: u64,
    pub total: u64,
    pub reached: bool,
}

impl Evaluation {
    /// Fraction of fully transparent pixels. A zero-area surface counts as nothing cleared.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.cleared as f64 / self.total as f64
        }
    }
}

/// Counts fully erased pixels. Partially transparent pixels don't count.
pub fn count_cleared(surface: &OverlaySurface) -> u64 {
    let pixels: &[[u8; 4]] = bytemuck::cast_slice(surface.pixels().as_raw());
    pixels.iter().filter(|[_, _, _, a]| *a == 0).count() as u64
}

/// Decides at gesture end whether enough of the overlay is gone.
///
/// This is the only full scan of the surface, so it must never run on move events.
#[derive(Debug, Clone, Copy)]
pub struct RatioEvaluator {
    reveal_ratio: f64,
}

impl RatioEvaluator {
    pub fn new(reveal_ratio: f64) -> Self {
        Self { reveal_ratio }
    }

    pub fn reveal_ratio(&self) -> f64 {
        self.reveal_ratio
    }

    pub fn evaluate(&self, surface: &OverlaySurface) -> Evaluation {
        let cleared = count_cleared(surface);
        let total = surface.pixel_count();
        let mut evaluation = Evaluation {
            cleared,
            total,
            reached: false,
        };
        evaluation.reached = total > 0 && evaluation.fraction() >= self.reveal_ratio;
        debug!(
            "Cleared {cleared}/{total} pixels ({:.4}), threshold {} reached: {}",
            evaluation.fraction(),
            self.reveal_ratio,
            evaluation.reached
        );
        evaluation
    }
}
