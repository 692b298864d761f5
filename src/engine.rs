use std::cell::RefCell;
use std::rc::Rc;

use crate::host::HostCallbacks;
use crate::layout::KeyboardLayout;
use crate::notes::KeyIdx;
use crate::touch::{KeyTransition, TouchEvent, TouchTracker};

/// Something that reacts to key presses: the sound dispatcher, the unlock detector, tests.
pub trait PianoListener {
    fn on_key_down(&mut self, key: KeyIdx);
    fn on_key_up(&mut self, key: KeyIdx);
}

pub type SharedListener = Rc<RefCell<dyn PianoListener>>;

/// Platform-agnostic piano state.
/// Frontends feed it raw touch events; it keeps the pressed set and notifies listeners.
pub struct Piano {
    layout: KeyboardLayout,
    pressed: Vec<bool>,
    tracker: TouchTracker,
    listeners: Vec<SharedListener>,
    host: Option<Rc<dyn HostCallbacks>>,
}

impl Piano {
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        let layout = KeyboardLayout::new(screen_width, screen_height);
        log::debug!(
            "Piano {screen_width}x{screen_height}: {} keys, key width {}",
            layout.keys_count(),
            layout.key_width()
        );
        Self {
            pressed: vec![false; layout.keys_count()],
            layout,
            tracker: TouchTracker::new(),
            listeners: Vec::new(),
            host: None,
        }
    }

    pub fn with_host(mut self, host: Rc<dyn HostCallbacks>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn layout(&self) -> &KeyboardLayout {
        &self.layout
    }

    pub fn keys_count(&self) -> usize {
        self.layout.keys_count()
    }

    pub fn resolve_key(&self, x: f32, y: f32) -> KeyIdx {
        self.layout.pos_to_key_idx(x, y)
    }

    pub fn is_key_pressed(&self, key: KeyIdx) -> bool {
        usize::try_from(key.0)
            .ok()
            .and_then(|i| self.pressed.get(i))
            .copied()
            .unwrap_or(false)
    }

    /// Swap in a layout for a new screen size. Listeners stay registered; every key and
    /// pointer is forgotten silently.
    pub fn resize(&mut self, screen_width: u32, screen_height: u32) {
        self.layout = KeyboardLayout::new(screen_width, screen_height);
        self.pressed = vec![false; self.layout.keys_count()];
        self.tracker.reset();
        self.request_redraw();
    }

    /// Registers a listener. Returns false if this very listener was already registered.
    pub fn add_listener(&mut self, listener: SharedListener) -> bool {
        if self.listeners.iter().any(|l| Rc::ptr_eq(l, &listener)) {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    /// Returns false if the listener was not registered.
    pub fn remove_listener(&mut self, listener: &SharedListener) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| !Rc::ptr_eq(l, listener));
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn handle_touch(&mut self, event: &TouchEvent) {
        let layout = &self.layout;
        let out = self
            .tracker
            .handle_event(event, |x, y| layout.pos_to_key_idx(x, y));

        if out.desync {
            self.clear_pressed();
            return;
        }

        for t in out.transitions {
            match t {
                KeyTransition::Down(k) => self.do_key_down(k),
                KeyTransition::Up(k) => self.do_key_up(k),
            }
        }
    }

    pub fn do_key_down(&mut self, key: KeyIdx) {
        if !self.set_pressed(key, true) {
            return;
        }
        log::debug!("Key {} down", key.0);
        for l in &self.listeners {
            l.borrow_mut().on_key_down(key);
        }
    }

    pub fn do_key_up(&mut self, key: KeyIdx) {
        if !self.set_pressed(key, false) {
            return;
        }
        log::debug!("Key {} up", key.0);
        for l in &self.listeners {
            l.borrow_mut().on_key_up(key);
        }
    }

    /// Drops all touch and pressed state without notifying listeners.
    pub fn reset_state(&mut self) {
        self.tracker.reset();
        self.clear_pressed();
    }

    fn clear_pressed(&mut self) {
        self.pressed.iter_mut().for_each(|p| *p = false);
        self.request_redraw();
    }

    fn set_pressed(&mut self, key: KeyIdx, pressed: bool) -> bool {
        let slot = usize::try_from(key.0)
            .ok()
            .and_then(|i| self.pressed.get_mut(i));
        let Some(slot) = slot else {
            log::warn!(
                "Ignoring key {} outside 0..{}",
                key.0,
                self.layout.keys_count()
            );
            return false;
        };
        *slot = pressed;
        self.request_redraw();
        true
    }

    fn request_redraw(&self) {
        if let Some(host) = &self.host {
            host.request_redraw();
        }
    }
}
