//! Input events and scoped listener registration
//!
//! The platform forwards raw events to the game; an event only reaches the
//! active level if that level registered a listener for its kind. Listeners
//! are RAII guards, so tearing a round down (dropping its [`Teardown`])
//! removes exactly what its setup registered.

use glam::Vec2;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Keyboard keys the game cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Space,
    Enter,
    Escape,
    /// Number row 0-9
    Digit(u8),
    /// Letter, lowercased
    Char(char),
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom(key: &str) -> Self {
        match key {
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            " " | "Spacebar" => Key::Space,
            "Enter" => Key::Enter,
            "Escape" => Key::Escape,
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_digit() => Key::Digit(c as u8 - b'0'),
                    (Some(c), None) if c.is_alphabetic() => {
                        Key::Char(c.to_lowercase().next().unwrap_or(c))
                    }
                    _ => Key::Other,
                }
            }
        }
    }

    pub fn is_direction(&self) -> bool {
        matches!(
            self,
            Key::ArrowUp | Key::ArrowDown | Key::ArrowLeft | Key::ArrowRight
        )
    }
}

/// Clickable things on the game page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A car element, by lane index
    Car(usize),
    /// A level 1 time option button, by index in the sorted list
    TimeOption(usize),
    Canvas,
}

/// A user input event, in canvas coordinates for pointer events
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    Click(Target),
    DoubleClick(Target),
    PointerDown(Vec2),
    PointerMove(Vec2),
    PointerUp,
    PointerLeave,
}

/// Event kind a listener subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    KeyDown,
    KeyUp,
    Click,
    DoubleClick,
    PointerDown,
    PointerMove,
    PointerUp,
    PointerLeave,
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InputEvent::KeyDown(_) => EventKind::KeyDown,
            InputEvent::KeyUp(_) => EventKind::KeyUp,
            InputEvent::Click(_) => EventKind::Click,
            InputEvent::DoubleClick(_) => EventKind::DoubleClick,
            InputEvent::PointerDown(_) => EventKind::PointerDown,
            InputEvent::PointerMove(_) => EventKind::PointerMove,
            InputEvent::PointerUp => EventKind::PointerUp,
            InputEvent::PointerLeave => EventKind::PointerLeave,
        }
    }

    /// Key or button released, or the pointer left the surface
    pub fn is_release(&self) -> bool {
        matches!(
            self,
            InputEvent::KeyUp(_) | InputEvent::PointerUp | InputEvent::PointerLeave
        )
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: u64,
    listeners: Vec<(u64, EventKind)>,
}

/// Shared table of live listeners
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl ListenerRegistry {
    pub fn listen(&self, kind: EventKind) -> ListenerGuard {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, kind));
        ListenerGuard {
            id,
            registry: Rc::downgrade(&self.inner),
        }
    }

    /// Register one listener per kind and bundle them for teardown
    pub fn listen_all(&self, kinds: &[EventKind]) -> Teardown {
        Teardown {
            guards: kinds.iter().map(|k| self.listen(*k)).collect(),
        }
    }

    pub fn is_listening(&self, kind: EventKind) -> bool {
        self.inner.borrow().listeners.iter().any(|(_, k)| *k == kind)
    }

    /// Number of live listeners
    pub fn len(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes its listener when dropped
#[derive(Debug)]
pub struct ListenerGuard {
    id: u64,
    registry: Weak<RefCell<RegistryInner>>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.borrow_mut().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Teardown handle returned by a level engine's setup
#[derive(Debug, Default)]
pub struct Teardown {
    guards: Vec<ListenerGuard>,
}

impl Teardown {
    /// Remove every listener this handle owns
    pub fn run(self) {
        drop(self);
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

/// Held state of the four arrow keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl DirectionKeys {
    /// Update from a key event; returns true if the key was a direction
    pub fn apply(&mut self, key: Key, pressed: bool) -> bool {
        match key {
            Key::ArrowUp => self.up = pressed,
            Key::ArrowDown => self.down = pressed,
            Key::ArrowLeft => self.left = pressed,
            Key::ArrowRight => self.right = pressed,
            _ => return false,
        }
        true
    }

    /// Unit movement direction in screen space (y down), zero if none held
    pub fn direction(&self) -> Vec2 {
        let mut v = Vec2::ZERO;
        if self.up {
            v.y -= 1.0;
        }
        if self.down {
            v.y += 1.0;
        }
        if self.left {
            v.x -= 1.0;
        }
        if self.right {
            v.x += 1.0;
        }
        v.normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_events() {
        assert!(InputEvent::KeyUp(Key::ArrowUp).is_release());
        assert!(InputEvent::PointerUp.is_release());
        assert!(InputEvent::PointerLeave.is_release());
        assert!(!InputEvent::KeyDown(Key::ArrowUp).is_release());
        assert!(!InputEvent::PointerDown(Vec2::ZERO).is_release());
    }

    #[test]
    fn test_key_from_dom() {
        assert_eq!(Key::from_dom("ArrowLeft"), Key::ArrowLeft);
        assert_eq!(Key::from_dom(" "), Key::Space);
        assert_eq!(Key::from_dom("3"), Key::Digit(3));
        assert_eq!(Key::from_dom("A"), Key::Char('a'));
        assert_eq!(Key::from_dom("Shift"), Key::Other);
    }

    #[test]
    fn test_teardown_is_symmetric() {
        let registry = ListenerRegistry::default();
        let first = registry.listen_all(&[EventKind::KeyDown, EventKind::Click]);
        assert_eq!(registry.len(), 2);
        assert!(registry.is_listening(EventKind::Click));

        let second = registry.listen_all(&[EventKind::KeyDown]);
        first.run();
        assert_eq!(registry.len(), 1);
        assert!(registry.is_listening(EventKind::KeyDown));
        assert!(!registry.is_listening(EventKind::Click));

        drop(second);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_guard_outliving_registry() {
        let registry = ListenerRegistry::default();
        let guard = registry.listen(EventKind::PointerUp);
        drop(registry);
        drop(guard);
    }

    #[test]
    fn test_diagonal_is_normalized() {
        let mut keys = DirectionKeys::default();
        keys.apply(Key::ArrowUp, true);
        keys.apply(Key::ArrowRight, true);
        let d = keys.direction();
        assert!((d.length() - 1.0).abs() < 1e-6);
        assert!(d.x > 0.0 && d.y < 0.0);

        keys.apply(Key::ArrowUp, false);
        keys.apply(Key::ArrowRight, false);
        assert_eq!(keys.direction(), Vec2::ZERO);
        assert!(!keys.apply(Key::Enter, true));
    }
}
