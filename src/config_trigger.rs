use std::rc::Rc;

use bitflags::bitflags;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::engine::PianoListener;
use crate::host::HostCallbacks;
use crate::notes::KeyIdx;
use crate::reminder::{Clock, TooltipReminder};

/// Keys that must be held at the same time to open the settings.
pub const CONFIG_TRIGGER_COUNT: usize = 2;

bitflags! {
    /// Black keys usable in the unlock sequence. Bit `n` is key index `n`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ConfigKeys: u32 {
        const C_SHARP_1 = 1 << 1;
        const D_SHARP_1 = 1 << 3;
        const F_SHARP_1 = 1 << 7;
        const G_SHARP_1 = 1 << 9;
        const A_SHARP_1 = 1 << 11;
        const C_SHARP_2 = 1 << 15;
    }
}

// Otherwise the sequence could run out of keys to ask for.
const _: () = assert!(ConfigKeys::all().bits().count_ones() as usize > CONFIG_TRIGGER_COUNT);

impl ConfigKeys {
    pub fn from_key(key: KeyIdx) -> Option<Self> {
        let bit = u32::try_from(key.0).ok().filter(|&b| b < u32::BITS)?;
        Self::from_bits(1 << bit)
    }

    pub fn keys(self) -> impl Iterator<Item = KeyIdx> {
        self.iter().map(|f| KeyIdx(f.bits().trailing_zeros() as i32))
    }
}

/// Watches the key stream for the hidden "hold these black keys together" gesture.
///
/// One expected key is advertised at a time. Pressing it while keeping the earlier ones held
/// makes progress; any other press or any release starts over.
pub struct ConfigTrigger {
    host: Rc<dyn HostCallbacks>,
    reminder: TooltipReminder,
    rng: Box<dyn RngCore>,
    held: ConfigKeys,
    expected: KeyIdx,
}

impl ConfigTrigger {
    pub fn new(host: Rc<dyn HostCallbacks>, clock: Rc<dyn Clock>) -> Self {
        Self::with_rng(host, clock, Box::new(StdRng::from_entropy()))
    }

    pub fn with_rng(
        host: Rc<dyn HostCallbacks>,
        clock: Rc<dyn Clock>,
        rng: Box<dyn RngCore>,
    ) -> Self {
        let mut trigger = Self {
            host,
            reminder: TooltipReminder::new(clock),
            rng,
            held: ConfigKeys::empty(),
            expected: KeyIdx(-1),
        };
        trigger.pick_next_expected();
        trigger
    }

    pub fn pressed_config_keys(&self) -> ConfigKeys {
        self.held
    }

    pub fn next_expected_key(&self) -> KeyIdx {
        self.expected
    }

    fn pick_next_expected(&mut self) {
        let candidates: Vec<KeyIdx> = (ConfigKeys::all() - self.held).keys().collect();
        if candidates.is_empty() {
            return;
        }
        self.expected = candidates[self.rng.gen_range(0..candidates.len())];
        log::trace!("Next unlock key: {}", self.expected.0);
    }

    fn reset(&mut self) {
        // Leave the hint alone if nothing was in progress, so it doesn't hop on every press.
        if self.held.is_empty() {
            return;
        }
        self.held = ConfigKeys::empty();
        self.pick_next_expected();
        self.host.request_redraw();
    }
}

impl PianoListener for ConfigTrigger {
    fn on_key_down(&mut self, key: KeyIdx) {
        let progress = if key == self.expected {
            ConfigKeys::from_key(key)
        } else {
            None
        };
        let Some(flag) = progress else {
            self.reset();
            return;
        };

        self.held |= flag;
        if self.held.bits().count_ones() as usize >= CONFIG_TRIGGER_COUNT {
            self.reset();
            log::info!("Unlock sequence complete; requesting settings");
            self.host.request_config();
        } else {
            self.pick_next_expected();
            self.host.request_redraw();
        }
    }

    fn on_key_up(&mut self, key: KeyIdx) {
        let was_held = ConfigKeys::from_key(key).is_some_and(|f| self.held.contains(f));
        self.reset();
        if was_held {
            log::debug!("Unlock attempt abandoned at key {}", key.0);
            self.reminder.register_failed_attempt(self.host.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostRequests, PendingRequests};
    use crate::reminder::ManualClock;

    use rand::rngs::mock::StepRng;

    fn trigger_with(rng: Box<dyn RngCore>) -> (ConfigTrigger, Rc<PendingRequests>) {
        let host = Rc::new(PendingRequests::new());
        let clock = Rc::new(ManualClock::new(0));
        (ConfigTrigger::with_rng(host.clone(), clock, rng), host)
    }

    fn seeded(seed: u64) -> (ConfigTrigger, Rc<PendingRequests>) {
        trigger_with(Box::new(StdRng::seed_from_u64(seed)))
    }

    #[test]
    fn candidate_bits_match_key_indices() {
        let keys: Vec<i32> = ConfigKeys::all().keys().map(|k| k.0).collect();
        assert_eq!(keys, vec![1, 3, 7, 9, 11, 15]);
        assert_eq!(ConfigKeys::from_key(KeyIdx(7)), Some(ConfigKeys::F_SHARP_1));
        for k in [0, 2, 5, 13, 31, 32, -1, i32::MIN, i32::MAX] {
            assert_eq!(ConfigKeys::from_key(KeyIdx(k)), None, "{k}");
        }
    }

    #[test]
    fn expected_key_is_a_candidate() {
        for seed in 0..50 {
            let (t, _) = seeded(seed);
            assert!(ConfigKeys::from_key(t.next_expected_key()).is_some());
            assert!(t.pressed_config_keys().is_empty());
        }
    }

    #[test]
    fn happy_path_requests_config_once() {
        let (mut t, host) = seeded(1);

        let first = t.next_expected_key();
        t.on_key_down(first);
        assert_eq!(t.pressed_config_keys().keys().collect::<Vec<_>>(), vec![first]);
        assert_ne!(t.next_expected_key(), first);
        assert!(!host.take().contains(HostRequests::OPEN_CONFIG));

        let second = t.next_expected_key();
        t.on_key_down(second);
        assert_eq!(host.take(), HostRequests::REDRAW | HostRequests::OPEN_CONFIG);
        assert!(t.pressed_config_keys().is_empty());
    }

    #[test]
    fn deterministic_sequence_with_step_rng() {
        let (mut t, host) = trigger_with(Box::new(StepRng::new(0, 0)));
        assert_eq!(t.next_expected_key(), KeyIdx(1));
        t.on_key_down(KeyIdx(1));
        assert_eq!(t.next_expected_key(), KeyIdx(3));
        t.on_key_down(KeyIdx(3));
        assert!(host.take().contains(HostRequests::OPEN_CONFIG));
        assert_eq!(t.next_expected_key(), KeyIdx(1));
    }

    #[test]
    fn stray_key_without_progress_keeps_the_hint() {
        let (mut t, host) = seeded(2);
        let expected = t.next_expected_key();

        for k in [0, 2, 4, 5, 13, 100, -7] {
            t.on_key_down(KeyIdx(k));
            t.on_key_up(KeyIdx(k));
            assert_eq!(t.next_expected_key(), expected);
        }
        assert!(host.take().is_empty());
    }

    #[test]
    fn wrong_key_wipes_progress() {
        let (mut t, host) = seeded(3);
        t.on_key_down(t.next_expected_key());
        host.take();

        t.on_key_down(KeyIdx(0));
        assert!(t.pressed_config_keys().is_empty());
        assert_eq!(host.take(), HostRequests::REDRAW);
    }

    #[test]
    fn wrong_keys_never_unlock() {
        let (mut t, host) = seeded(8);
        for _ in 0..100 {
            t.on_key_down(t.next_expected_key());
            assert!(!t.pressed_config_keys().is_empty());
            t.on_key_down(KeyIdx(i32::MIN));
            assert!(t.pressed_config_keys().is_empty());
            assert!(!host.take().contains(HostRequests::OPEN_CONFIG));
        }
    }

    #[test]
    fn another_candidate_out_of_turn_is_wrong() {
        let (mut t, _) = seeded(4);
        let first = t.next_expected_key();
        t.on_key_down(first);

        let expected = t.next_expected_key();
        let wrong = (ConfigKeys::all() - t.pressed_config_keys())
            .keys()
            .find(|&k| k != expected)
            .unwrap();
        t.on_key_down(wrong);
        assert!(t.pressed_config_keys().is_empty());
    }

    #[test]
    fn releasing_a_held_key_is_a_failed_attempt() {
        let (mut t, host) = seeded(5);
        let first = t.next_expected_key();
        t.on_key_down(first);
        host.take();

        t.on_key_up(first);
        assert!(t.pressed_config_keys().is_empty());
        // The very first failure always brings up the hint.
        assert_eq!(host.take(), HostRequests::REDRAW | HostRequests::SHOW_TOOLTIP);
    }

    #[test]
    fn releasing_an_unheld_key_only_resets() {
        let (mut t, host) = seeded(6);
        t.on_key_down(t.next_expected_key());
        host.take();

        t.on_key_up(KeyIdx(0));
        assert!(t.pressed_config_keys().is_empty());
        assert_eq!(host.take(), HostRequests::REDRAW);
    }

    #[test]
    fn expected_key_is_never_held() {
        let (mut t, _) = seeded(7);
        let mut rng = StdRng::seed_from_u64(99);

        for _ in 0..10_000 {
            let key = if rng.gen_bool(0.5) {
                t.next_expected_key()
            } else {
                KeyIdx(rng.gen_range(-2..20))
            };
            if rng.gen_bool(0.8) {
                t.on_key_down(key);
            } else {
                t.on_key_up(key);
            }

            let held = t.pressed_config_keys();
            assert!(ConfigKeys::all().contains(held));
            assert!((held.bits().count_ones() as usize) < CONFIG_TRIGGER_COUNT);
            let expected = ConfigKeys::from_key(t.next_expected_key()).unwrap();
            assert!(!held.contains(expected));
        }
    }
}
