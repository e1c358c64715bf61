//! Surface events and the listener registration table.
//!
//! The window translates protocol events into [`SurfaceEvent`]s and hands them
//! to a [`SurfaceListeners`] table, which invokes every handler registered for
//! that event's kind, synchronously and in registration order.

use std::collections::HashMap;

use winit::event::WindowEvent;

/// Discriminant of a [`SurfaceEvent`], used as the registration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceEventKind {
    Resized,
    CloseRequested,
}

/// Something the presentation surface wants its owner to know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The drawable now has this size in physical pixels. Either may be zero
    /// while the window is minimized.
    Resized { width: u32, height: u32 },
    /// The user asked to close the window.
    CloseRequested,
}

impl SurfaceEvent {
    /// Returns the registration key for this event.
    pub fn kind(&self) -> SurfaceEventKind {
        match self {
            Self::Resized { .. } => SurfaceEventKind::Resized,
            Self::CloseRequested => SurfaceEventKind::CloseRequested,
        }
    }

    /// Translates a winit window event, if it is one the surface cares about.
    pub fn from_window_event(event: &WindowEvent) -> Option<Self> {
        match event {
            WindowEvent::Resized(size) => Some(Self::Resized {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::CloseRequested => Some(Self::CloseRequested),
            _ => None,
        }
    }
}

type Listener = Box<dyn FnMut(&SurfaceEvent)>;

/// Registration table mapping event kind to handler closures.
#[derive(Default)]
pub struct SurfaceListeners {
    table: HashMap<SurfaceEventKind, Vec<Listener>>,
}

impl SurfaceListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for events of `kind`.
    pub fn on(&mut self, kind: SurfaceEventKind, listener: impl FnMut(&SurfaceEvent) + 'static) {
        self.table.entry(kind).or_default().push(Box::new(listener));
    }

    /// Invokes every listener registered for `event`'s kind.
    ///
    /// Returns how many listeners ran.
    pub fn dispatch(&mut self, event: &SurfaceEvent) -> usize {
        match self.table.get_mut(&event.kind()) {
            Some(listeners) => {
                for listener in listeners.iter_mut() {
                    listener(event);
                }
                listeners.len()
            }
            None => 0,
        }
    }

    /// Number of listeners registered for `kind`.
    pub fn len(&self, kind: SurfaceEventKind) -> usize {
        self.table.get(&kind).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.table.values().all(Vec::is_empty)
    }
}

impl std::fmt::Debug for SurfaceListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceListeners")
            .field("resized", &self.len(SurfaceEventKind::Resized))
            .field("close_requested", &self.len(SurfaceEventKind::CloseRequested))
            .finish()
    }
}
