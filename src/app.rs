use std::{cell::Cell, rc::Rc};

use eframe::egui::{
    self, Align2, Color32, ColorImage, FontId, Pos2, Rect, Sense, TextureHandle, TextureOptions,
    Vec2,
};
use image::Rgba;
use log::info;
use scratch_off::{
    chessboard, BitmapLoader, Config, ConfigError, Contact, FileBitmapLoader, MemoryBitmapLoader,
    Point, PointerEvent, PointerPhase, ScratchSettings, Session, SessionHandle, SessionState,
    TargetRegion,
};

const CARD_SIZE: Vec2 = Vec2::new(400.0, 300.0);
const CHESSBOARD: &str = "chessboard";

/// The card widget the overlay sits on. One overlay pixel per egui point.
pub(crate) struct CardRegion {
    rect: Rect,
    opacity: f32,
    overlay_attached: bool,
    ctx: egui::Context,
}

impl TargetRegion for CardRegion {
    fn rendered_size(&self) -> (u32, u32) {
        (self.rect.width() as u32, self.rect.height() as u32)
    }

    fn page_origin(&self) -> Point {
        Point::new(self.rect.min.x, self.rect.min.y)
    }

    // Widgets are laid out in absolute screen coordinates already.
    fn set_positioned(&mut self) {}

    fn attach_overlay(&mut self) {
        self.overlay_attached = true;
    }

    fn detach_overlay(&mut self) {
        self.overlay_attached = false;
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
    }

    fn request_redraw(&mut self) {
        self.ctx.request_repaint();
    }
}

pub(crate) struct ScratchApp {
    session: Session<CardRegion, Box<dyn BitmapLoader>>,
    texture: Option<(u64, TextureHandle)>,
    revealed: Rc<Cell<bool>>,
}

impl ScratchApp {
    /// Covers the card with `image`, or with a chessboard when no path is given.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        image: Option<String>,
    ) -> Result<Self, ConfigError> {
        let (loader, locator): (Box<dyn BitmapLoader>, String) = match image {
            Some(path) => (Box::new(FileBitmapLoader::new(".")), path),
            None => (
                Box::new(MemoryBitmapLoader::new().with_image(CHESSBOARD, chessboard(64, 48, 8))),
                CHESSBOARD.to_string(),
            ),
        };
        let region = CardRegion {
            rect: Rect::from_min_size(Pos2::ZERO, CARD_SIZE),
            opacity: 0.0,
            overlay_attached: false,
            ctx: cc.egui_ctx.clone(),
        };

        let revealed = Rc::new(Cell::new(false));
        let flag = revealed.clone();
        let config = Config::new(ScratchSettings {
            fill_image: Some(locator),
            ..Default::default()
        })
        .on_reveal_ratio(move |session| {
            info!("Card revealed at {:.1}%", session.cleared_fraction() * 100.0);
            flag.set(true);
            session.clear();
        })
        .on_image_filled(|session| info!("Card ready: {:?}", session.state()))
        .on_image_failed(|e| log::error!("Card stays hidden: {e}"));

        Ok(Self {
            session: Session::initialize(region, loader, config)?,
            texture: None,
            revealed,
        })
    }

    fn overlay_texture(&mut self, ctx: &egui::Context) -> &TextureHandle {
        let surface = self.session.surface();
        let generation = surface.generation();
        let image = || ColorImage {
            size: [surface.width() as usize, surface.height() as usize],
            pixels: surface
                .pixels()
                .pixels()
                .map(|&Rgba([r, g, b, a])| Color32::from_rgba_unmultiplied(r, g, b, a))
                .collect(),
        };
        let options = TextureOptions {
            magnification: egui::TextureFilter::Nearest,
            ..Default::default()
        };

        let texture = match self.texture.take() {
            Some((seen, handle)) if seen == generation => handle,
            Some((_, mut handle)) => {
                handle.set(image(), options);
                handle
            }
            None => ctx.load_texture("Overlay", image(), options),
        };
        &self.texture.insert((generation, texture)).1
    }

    /// Replays egui's drag of the card as the overlay's mouse events.
    fn forward_drag(&mut self, response: &egui::Response) {
        let mut phases = Vec::with_capacity(2);
        if response.drag_started() {
            phases.push(PointerPhase::Down);
        } else if response.dragged() {
            phases.push(PointerPhase::Move);
        }
        if response.drag_stopped() {
            phases.push(PointerPhase::Up);
        }

        let family = self.session.event_family();
        for phase in phases {
            let mut event = match response.interact_pointer_pos() {
                Some(pos) => PointerEvent::mouse(Contact::at_page(pos.x, pos.y)),
                None => PointerEvent::empty(),
            };
            self.session.dispatch(family.name_of(phase), &mut event);
        }
    }
}

impl eframe::App for ScratchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.session.poll();
        if self.session.state() == SessionState::Filling {
            ctx.request_repaint();
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Scratch to reveal");
            ui.horizontal(|ui| {
                if ui.button("Reset").clicked() {
                    self.revealed.set(false);
                    self.session.reset();
                }
                if ui.button("Clear").clicked() {
                    self.session.clear();
                }
                let enabled = !matches!(self.session.state(), SessionState::Disabled);
                if ui.button(if enabled { "Disable" } else { "Enable" }).clicked() {
                    if enabled {
                        self.session.disable();
                    } else {
                        self.session.enable();
                    }
                }
            });
            ui.label(format!(
                "{:?}, {:.1}% scratched",
                self.session.state(),
                self.session.cleared_fraction() * 100.0
            ));

            let (rect, response) = ui.allocate_exact_size(CARD_SIZE, Sense::drag());
            self.session.target_mut().rect = rect;
            self.forward_drag(&response);

            let opacity = self.session.target().opacity;
            let prize = if self.revealed.get() { "You won!" } else { "Keep going" };
            let painter = ui.painter_at(rect);
            painter.rect_filled(rect, 8.0, Color32::from_rgb(30, 110, 60).gamma_multiply(opacity));
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                prize,
                FontId::proportional(40.0),
                Color32::WHITE.gamma_multiply(opacity),
            );

            if self.session.target().overlay_attached {
                let texture = self.overlay_texture(ctx).id();
                painter.image(
                    texture,
                    rect,
                    Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                    Color32::WHITE.gamma_multiply(opacity),
                );
            }
        });
    }
}
