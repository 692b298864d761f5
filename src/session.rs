use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::config_trigger::{ConfigKeys, ConfigTrigger};
use crate::engine::Piano;
use crate::host::{HostRequests, PendingRequests};
use crate::layout::KeyboardLayout;
use crate::melody::{Melody, MultiSongPlayer};
use crate::notes::KeyIdx;
use crate::reminder::{Clock, SystemClock};
use crate::settings::Settings;
use crate::sound::{DispatchStrategy, SoundDispatch, SoundSet};
use crate::touch::TouchEvent;

/// Picks how key presses turn into notes for the given preferences.
///
/// Melody mode with no known melody selected plays the pressed keys instead.
pub fn dispatch_strategy(settings: &Settings) -> DispatchStrategy {
    if !settings.melodies_enabled {
        return DispatchStrategy::Straight;
    }
    let melodies = Melody::selected(&settings.selected_melodies);
    if melodies.is_empty() {
        log::warn!("Melody mode is on but no known melody is selected; playing keys as-is");
        return DispatchStrategy::Straight;
    }
    log::info!(
        "Melody mode: {}",
        melodies.iter().map(Melody::id).collect::<Vec<_>>().join(", ")
    );
    DispatchStrategy::Melodic(Box::new(MultiSongPlayer::new(melodies)))
}

/// A piano wired up the way the app uses it: sound playback and the settings unlock both
/// listen to the keys, and whatever they ask of the host is collected for polling.
pub struct Session {
    piano: Piano,
    requests: Rc<PendingRequests>,
    sound: Rc<RefCell<SoundDispatch>>,
    trigger: Rc<RefCell<ConfigTrigger>>,
}

impl Session {
    pub fn new(
        screen_width: u32,
        screen_height: u32,
        settings: &Settings,
        sound_set: Box<dyn SoundSet>,
    ) -> Self {
        Self::with_clock_and_rng(
            screen_width,
            screen_height,
            settings,
            sound_set,
            Rc::new(SystemClock::new()),
            Box::new(StdRng::from_entropy()),
        )
    }

    pub fn with_clock_and_rng(
        screen_width: u32,
        screen_height: u32,
        settings: &Settings,
        sound_set: Box<dyn SoundSet>,
        clock: Rc<dyn Clock>,
        rng: Box<dyn RngCore>,
    ) -> Self {
        let requests = Rc::new(PendingRequests::new());
        let mut piano = Piano::new(screen_width, screen_height).with_host(requests.clone());

        let sound = Rc::new(RefCell::new(SoundDispatch::new(
            sound_set,
            dispatch_strategy(settings),
        )));
        let trigger = Rc::new(RefCell::new(ConfigTrigger::with_rng(
            requests.clone(),
            clock,
            rng,
        )));
        piano.add_listener(sound.clone());
        piano.add_listener(trigger.clone());

        Self {
            piano,
            requests,
            sound,
            trigger,
        }
    }

    pub fn piano(&self) -> &Piano {
        &self.piano
    }

    pub fn piano_mut(&mut self) -> &mut Piano {
        &mut self.piano
    }

    pub fn layout(&self) -> &KeyboardLayout {
        self.piano.layout()
    }

    /// Feeds one touch event and returns what the host should do about it.
    pub fn handle_touch(&mut self, event: &TouchEvent) -> HostRequests {
        self.piano.handle_touch(event);
        self.take_requests()
    }

    pub fn take_requests(&self) -> HostRequests {
        self.requests.take()
    }

    pub fn resize(&mut self, screen_width: u32, screen_height: u32) {
        log::info!("Screen resized to {screen_width}x{screen_height}");
        self.piano.resize(screen_width, screen_height);
    }

    pub fn set_sound_set(&mut self, sound_set: Box<dyn SoundSet>) {
        self.sound.borrow_mut().set_sound_set(sound_set);
    }

    pub fn sound_set_name(&self) -> String {
        self.sound.borrow().sound_set_name().to_string()
    }

    /// Rebuilds the melody player from the melody settings. Playback restarts from the top.
    pub fn apply_melody_settings(&mut self, settings: &Settings) {
        self.sound
            .borrow_mut()
            .set_strategy(dispatch_strategy(settings));
    }

    pub fn is_melodic(&self) -> bool {
        self.sound.borrow().strategy().is_melodic()
    }

    pub fn reset_state(&mut self) {
        self.piano.reset_state();
    }

    pub fn is_key_pressed(&self, key: KeyIdx) -> bool {
        self.piano.is_key_pressed(key)
    }

    pub fn resolve_key(&self, x: f32, y: f32) -> KeyIdx {
        self.piano.resolve_key(x, y)
    }

    pub fn keys_count(&self) -> usize {
        self.piano.keys_count()
    }

    pub fn pressed_config_keys(&self) -> ConfigKeys {
        self.trigger.borrow().pressed_config_keys()
    }

    pub fn next_expected_config_key(&self) -> KeyIdx {
        self.trigger.borrow().next_expected_key()
    }
}
