//! Turns mouse and touch payloads into one stream of overlay-local coordinates.

/// Position in the target region's local coordinate space (pixels, origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Self) -> Self::Output {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// One contact of a pointer event as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Contact {
    /// Position already relative to the target, if the platform reports it.
    pub offset: Option<Point>,
    /// Position relative to the page.
    pub page: Option<Point>,
}

impl Contact {
    pub fn at_offset(x: f32, y: f32) -> Self {
        Self {
            offset: Some(Point::new(x, y)),
            page: None,
        }
    }

    pub fn at_page(x: f32, y: f32) -> Self {
        Self {
            offset: None,
            page: Some(Point::new(x, y)),
        }
    }
}

/// Anything that behaves like a pointer event.
pub trait PointerInput {
    /// The contact to track. Multi-touch inputs return their first touch.
    fn primary_contact(&self) -> Option<Contact>;

    /// Keep the gesture exclusive to the overlay (no scrolling, no text selection).
    fn prevent_default(&mut self);
}

/// Plain pointer event used by hosts that don't have their own event type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointerEvent {
    contacts: Vec<Contact>,
    default_prevented: bool,
}

impl PointerEvent {
    pub fn mouse(contact: Contact) -> Self {
        Self {
            contacts: vec![contact],
            default_prevented: false,
        }
    }

    pub fn touch(contacts: impl IntoIterator<Item = Contact>) -> Self {
        Self {
            contacts: contacts.into_iter().collect(),
            default_prevented: false,
        }
    }

    /// An event without coordinates, e.g. a `touchend` whose touch list is empty.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

impl PointerInput for PointerEvent {
    fn primary_contact(&self) -> Option<Contact> {
        self.contacts.first().copied()
    }

    fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}

/// Resolve the event's primary contact into target-local coordinates.
///
/// A reported offset wins. Otherwise the target's page origin is subtracted from the page
/// position. `None` means the event carried no usable coordinates.
pub fn normalize_pointer_event(event: &impl PointerInput, target_origin: Point) -> Option<Point> {
    let contact = event.primary_contact()?;
    contact
        .offset
        .or_else(|| contact.page.map(|page| page - target_origin))
}

/// Transient gesture state owned by the session.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    pub active: bool,
    pub last_point: Point,
}

impl PointerState {
    pub fn begin(&mut self, point: Option<Point>) {
        self.active = true;
        if let Some(point) = point {
            self.last_point = point;
        }
    }

    /// Moves the cursor and returns the segment to paint while a gesture is active.
    pub fn advance(&mut self, point: Option<Point>) -> Option<(Point, Point)> {
        let point = point?;
        if !self.active {
            return None;
        }
        let from = std::mem::replace(&mut self.last_point, point);
        Some((from, point))
    }

    pub fn end(&mut self) {
        self.active = false;
    }
}
