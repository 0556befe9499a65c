/// Phase of a pointer gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// Which family of event names the overlay listens to.
///
/// Picked once when the session is created; handlers never re-check per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFamily {
    Mouse,
    Touch,
}

impl EventFamily {
    pub fn detect(supports_touch: bool) -> Self {
        if supports_touch {
            Self::Touch
        } else {
            Self::Mouse
        }
    }

    pub fn names(self) -> [(&'static str, PointerPhase); 3] {
        match self {
            EventFamily::Mouse => [
                ("mousedown", PointerPhase::Down),
                ("mousemove", PointerPhase::Move),
                ("mouseup", PointerPhase::Up),
            ],
            EventFamily::Touch => [
                ("touchstart", PointerPhase::Down),
                ("touchmove", PointerPhase::Move),
                ("touchend", PointerPhase::Up),
            ],
        }
    }

    pub fn name_of(self, phase: PointerPhase) -> &'static str {
        let [down, moved, up] = self.names();
        match phase {
            PointerPhase::Down => down.0,
            PointerPhase::Move => moved.0,
            PointerPhase::Up => up.0,
        }
    }

    pub fn phase_of(self, event_name: &str) -> Option<PointerPhase> {
        self.names()
            .into_iter()
            .find_map(|(name, phase)| (name == event_name).then_some(phase))
    }
}

/// Attachment state of the three overlay listeners.
#[derive(Debug)]
pub struct Listeners {
    family: EventFamily,
    attached: bool,
}

impl Listeners {
    pub fn new(family: EventFamily) -> Self {
        Self {
            family,
            attached: false,
        }
    }

    pub fn family(&self) -> EventFamily {
        self.family
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Returns whether anything changed.
    pub fn attach(&mut self) -> bool {
        !std::mem::replace(&mut self.attached, true)
    }

    /// Returns whether anything changed.
    pub fn detach(&mut self) -> bool {
        std::mem::replace(&mut self.attached, false)
    }

    /// Routes an incoming event name to its phase, or `None` when no listener would receive it.
    pub fn route(&self, event_name: &str) -> Option<PointerPhase> {
        if !self.attached {
            return None;
        }
        self.family.phase_of(event_name)
    }
}
