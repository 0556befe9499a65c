use std::{cell::Cell, rc::Rc};

use scratch_off::{
    chessboard, Config, Contact, Gesture, MemoryBitmapLoader, Point, PointerEvent,
    ScratchSettings, Session, SessionHandle, SessionState, TargetRegion,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Card {
    size: (u32, u32),
    origin: Point,
    touch: bool,
    positioned: bool,
    overlay: bool,
    opacity: f32,
    redraws: usize,
}

impl Card {
    fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            origin: Point::default(),
            touch: false,
            positioned: false,
            overlay: false,
            opacity: 0.0,
            redraws: 0,
        }
    }
}

impl TargetRegion for Card {
    fn rendered_size(&self) -> (u32, u32) {
        self.size
    }
    fn page_origin(&self) -> Point {
        self.origin
    }
    fn supports_touch(&self) -> bool {
        self.touch
    }
    fn set_positioned(&mut self) {
        self.positioned = true;
    }
    fn attach_overlay(&mut self) {
        self.overlay = true;
    }
    fn detach_overlay(&mut self) {
        self.overlay = false;
    }
    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
    }
    fn request_redraw(&mut self) {
        self.redraws += 1;
    }
}

fn counter() -> (Rc<Cell<usize>>, impl FnMut(&mut dyn SessionHandle) + 'static) {
    let count = Rc::new(Cell::new(0));
    let inner = count.clone();
    (count, move |_: &mut dyn SessionHandle| inner.set(inner.get() + 1))
}

fn mouse(x: f32, y: f32) -> PointerEvent {
    PointerEvent::mouse(Contact::at_offset(x, y))
}

/// Drags once across the middle of a 400x300 card, clearing a 20 pixel band.
fn scratch_middle<L: scratch_off::BitmapLoader>(session: &mut Session<Card, L>) {
    session.dispatch("mousedown", &mut mouse(0.0, 150.0));
    session.dispatch("mousemove", &mut mouse(400.0, 150.0));
    session.dispatch("mouseup", &mut PointerEvent::empty());
}

fn session_with_ratio(reveal_ratio: f64) -> (Session<Card, MemoryBitmapLoader>, Rc<Cell<usize>>) {
    let (fired, callback) = counter();
    let options = format!(r#"{{"revealRatio": {reveal_ratio}}}"#);
    let config =
        Config::new(ScratchSettings::from_json(&options).unwrap()).on_reveal_ratio(callback);
    let session =
        Session::initialize(Card::new(400, 300), MemoryBitmapLoader::new(), config).unwrap();
    (session, fired)
}

#[test]
fn overlay_covers_the_card() {
    init_logging();
    let (session, _) = session_with_ratio(0.5);
    assert_eq!((400, 300), session.surface().dimensions());
    assert!(session.target().positioned);
    assert!(session.target().overlay);
    assert_eq!(1.0, session.target().opacity);
    assert!(session.surface().pixels().pixels().all(|p| p[3] == 255));
}

#[test]
fn band_scratch_fires_a_low_threshold() {
    init_logging();
    let (mut session, fired) = session_with_ratio(0.05);
    scratch_middle(&mut session);

    assert_eq!(1, fired.get());
    let fraction = session.cleared_fraction();
    assert!((fraction - 8000.0 / 120_000.0).abs() < 1e-9, "{fraction}");
    assert_eq!(SessionState::Armed(Gesture::Idle), session.state());
}

#[test]
fn band_scratch_misses_the_default_threshold() {
    init_logging();
    let (mut session, fired) = session_with_ratio(0.5);
    scratch_middle(&mut session);
    assert_eq!(0, fired.get());
    assert!(session.target().redraws > 0);
}

#[test]
fn each_gesture_end_is_evaluated() {
    init_logging();
    let (mut session, fired) = session_with_ratio(0.05);
    scratch_middle(&mut session);
    session.dispatch("mouseup", &mut PointerEvent::empty());
    assert_eq!(2, fired.get());
}

#[test]
fn enabling_twice_attaches_once() {
    init_logging();
    let (mut session, fired) = session_with_ratio(0.05);
    session.enable();
    session.enable();
    scratch_middle(&mut session);
    assert_eq!(1, fired.get());
}

#[test]
fn untouched_card_never_fires() {
    init_logging();
    let (mut session, fired) = session_with_ratio(0.05);
    for _ in 0..3 {
        session.poll();
    }
    session.dispatch("mousemove", &mut mouse(10.0, 10.0));
    assert_eq!(0, fired.get());
    assert_eq!(0.0, session.cleared_fraction());
}

#[test]
fn clear_reveals_without_firing() {
    init_logging();
    let (mut session, fired) = session_with_ratio(0.05);
    session.clear();

    assert_eq!(1.0, session.cleared_fraction());
    assert_eq!(0, fired.get());
    assert_eq!(SessionState::Disabled, session.state());
    assert!(!session.dispatch("mousedown", &mut mouse(1.0, 1.0)));

    // Everything is already gone, so the next gesture end crosses any threshold.
    session.enable();
    session.dispatch("mouseup", &mut PointerEvent::empty());
    assert_eq!(1, fired.get());
}

#[test]
fn reset_repaints_from_cached_image() {
    init_logging();
    let loader = MemoryBitmapLoader::new().with_image("card.png", chessboard(40, 30, 5));
    let (filled, on_filled) = counter();
    let config = Config::new(ScratchSettings {
        fill_image: Some("card.png".into()),
        ..Default::default()
    })
    .on_image_filled(on_filled);
    let mut session = Session::initialize(Card::new(400, 300), loader, config).unwrap();
    assert_eq!(SessionState::Filling, session.state());
    assert_eq!(0.0, session.target().opacity);

    session.poll();
    assert_eq!(1, filled.get());
    scratch_middle(&mut session);
    session.clear();
    assert_eq!(1.0, session.cleared_fraction());

    session.reset();
    assert_eq!(SessionState::Armed(Gesture::Idle), session.state());
    assert_eq!(0.0, session.cleared_fraction());
    assert!(session.surface().pixels().pixels().all(|p| p[3] == 255));
    assert_eq!(1, session.loader().fetch_count());
    session.poll();
    assert_eq!(1, filled.get());
}

#[test]
fn reset_while_loading_keeps_the_pending_load() {
    init_logging();
    let loader = MemoryBitmapLoader::new().with_image("card.png", chessboard(4, 4, 1));
    let config = Config::new(ScratchSettings {
        fill_image: Some("card.png".into()),
        ..Default::default()
    });
    let mut session = Session::initialize(Card::new(8, 8), loader, config).unwrap();
    session.reset();
    assert_eq!(SessionState::Filling, session.state());
    session.poll();
    assert_eq!(SessionState::Armed(Gesture::Idle), session.state());
    assert_eq!(1, session.loader().fetch_count());
}

#[test]
fn failed_load_is_retried_by_reset() {
    init_logging();
    let failures = Rc::new(Cell::new(0));
    let count = failures.clone();
    let config = Config::new(ScratchSettings {
        fill_image: Some("gone.png".into()),
        ..Default::default()
    })
    .on_image_failed(move |_| count.set(count.get() + 1));
    let mut session =
        Session::initialize(Card::new(8, 8), MemoryBitmapLoader::new(), config).unwrap();

    session.poll();
    assert_eq!(1, failures.get());
    assert_eq!(SessionState::Filling, session.state());

    session.reset();
    session.poll();
    assert_eq!(2, failures.get());
    assert_eq!(2, session.loader().fetch_count());
}

#[test]
fn zero_area_card_never_fires() {
    init_logging();
    let (fired, callback) = counter();
    let config = Config::new(ScratchSettings {
        reveal_ratio: 0.0,
        ..Default::default()
    })
    .on_reveal_ratio(callback);
    let mut session =
        Session::initialize(Card::new(0, 0), MemoryBitmapLoader::new(), config).unwrap();
    session.dispatch("mousedown", &mut mouse(0.0, 0.0));
    session.dispatch("mouseup", &mut PointerEvent::empty());
    assert_eq!(0, fired.get());
    assert_eq!(0.0, session.cleared_fraction());
}

#[test]
fn touch_page_coordinates_are_made_relative() {
    init_logging();
    let mut card = Card::new(100, 100);
    card.touch = true;
    card.origin = Point::new(200.0, 50.0);
    let config = Config::new(ScratchSettings {
        stroke_width: 2.0,
        ..Default::default()
    });
    let mut session = Session::initialize(card, MemoryBitmapLoader::new(), config).unwrap();

    session.dispatch("touchstart", &mut PointerEvent::touch([Contact::at_page(210.5, 60.5)]));
    session.dispatch("touchmove", &mut PointerEvent::touch([Contact::at_page(210.5, 60.5)]));
    session.dispatch("touchend", &mut PointerEvent::touch([]));

    assert_eq!(Some(0), session.surface().alpha_at(10, 10));
    assert_eq!(Some(255), session.surface().alpha_at(12, 10));
}

#[test]
fn consecutive_segments_join_round() {
    init_logging();
    let mut session =
        Session::initialize(Card::new(100, 100), MemoryBitmapLoader::new(), Config::default())
            .unwrap();
    session.dispatch("mousedown", &mut mouse(20.0, 20.0));
    session.dispatch("mousemove", &mut mouse(60.0, 20.0));
    session.dispatch("mousemove", &mut mouse(60.0, 60.0));
    session.dispatch("mouseup", &mut PointerEvent::empty());

    let alpha = |x, y| session.surface().alpha_at(x, y);
    assert_eq!(Some(0), alpha(40, 20));
    assert_eq!(Some(0), alpha(60, 40));
    // Outer corner: pixel center (66.5, 13.5) is 9.2 away from the vertex at (60, 20).
    assert_eq!(Some(0), alpha(66, 13));
    // Pixel center (68.5, 11.5) is 12.0 away, outside the 10 pixel radius.
    assert_eq!(Some(255), alpha(68, 11));
    assert_eq!(Some(255), alpha(90, 90));
}

#[test]
fn destroy_hands_back_the_bare_card() {
    init_logging();
    let (session, _) = session_with_ratio(0.5);
    let card = session.destroy();
    assert!(!card.overlay);
}
