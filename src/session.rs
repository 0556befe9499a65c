use log::{debug, info, trace};

use crate::{
    config::{Config, ConfigError, LoadErrorCallback, SessionCallback},
    fill::{FillManager, FillProgress, FillSource},
    host::{BitmapLoader, TargetRegion},
    listeners::{EventFamily, Listeners, PointerPhase},
    pointer::{normalize_pointer_event, PointerInput, PointerState},
    ratio::{Evaluation, RatioEvaluator},
    stroke::{StrokeRenderer, StrokeStyle},
    surface::OverlaySurface,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Idle,
    Active,
}

/// Where a session is in its lifecycle. A [`Session`] only exists once it was initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the fill image. Pointer events are swallowed.
    Filling,
    Armed(Gesture),
    /// Listeners are detached.
    Disabled,
}

/// What callbacks get to see and do with the session that fired them.
pub trait SessionHandle {
    fn reset(&mut self);
    fn clear(&mut self);
    fn enable(&mut self);
    fn disable(&mut self);
    fn state(&self) -> SessionState;
    fn cleared_fraction(&self) -> f64;
}

#[derive(Default)]
struct Callbacks {
    on_reveal_ratio: Option<SessionCallback>,
    on_image_filled: Option<SessionCallback>,
    on_image_failed: Option<LoadErrorCallback>,
}

/// One scratch-off overlay on one target region.
pub struct Session<T: TargetRegion, L: BitmapLoader> {
    target: T,
    loader: L,
    surface: OverlaySurface,
    fill: FillManager,
    stroke: StrokeRenderer,
    evaluator: RatioEvaluator,
    pointer: PointerState,
    listeners: Listeners,
    filled: bool,
    callbacks: Callbacks,
}

impl<T: TargetRegion, L: BitmapLoader> Session<T, L> {
    /// Covers `target` with a fresh overlay, starts the fill and attaches the pointer listeners.
    pub fn initialize(mut target: T, loader: L, config: Config) -> Result<Self, ConfigError> {
        let Config {
            settings,
            on_reveal_ratio,
            on_image_filled,
            on_image_failed,
        } = config;
        settings.validate()?;

        let fill_source = match settings.fill_image() {
            Some(locator) => FillSource::Image(locator.to_string()),
            None => FillSource::Color(settings.fill_rgba()?),
        };
        let family = EventFamily::detect(target.supports_touch());
        let (width, height) = target.rendered_size();
        info!("Initializing {width}x{height} overlay, {family:?} input, fill {fill_source:?}");

        target.set_positioned();
        target.attach_overlay();

        let mut session = Self {
            surface: OverlaySurface::new(width, height),
            fill: FillManager::new(fill_source),
            stroke: StrokeRenderer::new(StrokeStyle::new(settings.stroke_width)),
            evaluator: RatioEvaluator::new(settings.reveal_ratio),
            pointer: PointerState::default(),
            listeners: Listeners::new(family),
            filled: false,
            callbacks: Callbacks {
                on_reveal_ratio,
                on_image_filled,
                on_image_failed,
            },
            target,
            loader,
        };
        session.filled =
            session.fill.fill(&mut session.surface, &mut session.target, &session.loader)
                == FillProgress::Done;
        session.listeners.attach();
        Ok(session)
    }

    /// Lets a pending image load make progress. Call it from the host's event loop.
    pub fn poll(&mut self) {
        match self.fill.poll(&mut self.surface, &mut self.target) {
            Some(Ok(())) => {
                self.filled = true;
                debug!("Fill finished, state {:?}", self.state());
                if let Some(mut callback) = self.callbacks.on_image_filled.take() {
                    callback(self);
                    self.callbacks.on_image_filled.get_or_insert(callback);
                }
            }
            Some(Err(e)) => {
                if let Some(callback) = self.callbacks.on_image_failed.as_mut() {
                    callback(&e);
                }
            }
            None => {}
        }
    }

    /// Feeds a host event into the overlay. Returns whether an attached listener received it.
    pub fn dispatch(&mut self, event_name: &str, event: &mut impl PointerInput) -> bool {
        let Some(phase) = self.listeners.route(event_name) else {
            return false;
        };
        event.prevent_default();
        if !self.filled {
            trace!("Ignoring {event_name} while the overlay is filling");
            return true;
        }

        let point = normalize_pointer_event(&*event, self.target.page_origin());
        if point.is_none() {
            trace!("{event_name} without coordinates");
        }
        match phase {
            PointerPhase::Down => self.pointer.begin(point),
            PointerPhase::Move => {
                if let Some((from, to)) = self.pointer.advance(point) {
                    self.stroke.paint_segment(&mut self.surface, from, to);
                    self.target.request_redraw();
                }
            }
            PointerPhase::Up => {
                self.pointer.end();
                if self.evaluate().reached {
                    self.fire_reveal();
                }
            }
        }
        true
    }

    fn evaluate(&self) -> Evaluation {
        self.evaluator.evaluate(&self.surface)
    }

    fn fire_reveal(&mut self) {
        if let Some(mut callback) = self.callbacks.on_reveal_ratio.take() {
            info!("Reveal ratio {} reached", self.evaluator.reveal_ratio());
            callback(self);
            self.callbacks.on_reveal_ratio.get_or_insert(callback);
        }
    }

    /// Clears the overlay and removes it from the target.
    pub fn destroy(mut self) -> T {
        self.listeners.detach();
        self.surface.clear();
        self.target.detach_overlay();
        self.target
    }

    pub fn surface(&self) -> &OverlaySurface {
        &self.surface
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn event_family(&self) -> EventFamily {
        self.listeners.family()
    }
}

impl<T: TargetRegion, L: BitmapLoader> SessionHandle for Session<T, L> {
    /// Repaints the fill and re-arms the overlay.
    fn reset(&mut self) {
        self.pointer.end();
        self.filled = self.fill.reset(&mut self.surface, &mut self.target, &self.loader)
            == FillProgress::Done;
        self.enable();
        debug!("Reset, state {:?}", self.state());
    }

    /// Reveals everything without counting it as a scratch-off.
    fn clear(&mut self) {
        self.disable();
        self.pointer.end();
        self.surface.clear();
        self.target.request_redraw();
    }

    fn enable(&mut self) {
        if self.listeners.attach() {
            debug!("Attached {:?} listeners", self.listeners.family());
        }
    }

    fn disable(&mut self) {
        if self.listeners.detach() {
            debug!("Detached {:?} listeners", self.listeners.family());
        }
    }

    fn state(&self) -> SessionState {
        if !self.filled {
            SessionState::Filling
        } else if !self.listeners.is_attached() {
            SessionState::Disabled
        } else if self.pointer.active {
            SessionState::Armed(Gesture::Active)
        } else {
            SessionState::Armed(Gesture::Idle)
        }
    }

    fn cleared_fraction(&self) -> f64 {
        self.evaluate().fraction()
    }
}
