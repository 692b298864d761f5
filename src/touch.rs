use crate::notes::KeyIdx;

use std::collections::HashMap;

#[repr(transparent)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PointerId(pub u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub id: PointerId,
    pub x: f32,
    pub y: f32,
}

/// One raw touch event. Move events may carry every pointer that moved since the last one.
#[derive(Clone, Debug, PartialEq)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub pointers: Vec<PointerSample>,
}

impl TouchEvent {
    pub fn single(phase: TouchPhase, id: u64, x: f32, y: f32) -> Self {
        Self {
            phase,
            pointers: vec![PointerSample {
                id: PointerId(id),
                x,
                y,
            }],
        }
    }

    pub fn down(id: u64, x: f32, y: f32) -> Self {
        Self::single(TouchPhase::Down, id, x, y)
    }

    pub fn moved(id: u64, x: f32, y: f32) -> Self {
        Self::single(TouchPhase::Move, id, x, y)
    }

    pub fn up(id: u64, x: f32, y: f32) -> Self {
        Self::single(TouchPhase::Up, id, x, y)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyTransition {
    Down(KeyIdx),
    Up(KeyIdx),
}

/// Result of processing a touch event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TouchOutput {
    /// Key changes, in the order they must be applied.
    pub transitions: Vec<KeyTransition>,
    /// The event stream lost sync with our pointer map. The tracker has already cleared
    /// itself; the caller must silently release every key.
    pub desync: bool,
}

/// Tracks which key each pointer is holding, and reports key transitions.
///
/// This is platform-agnostic: desktop replays and Android multitouch both feed it.
pub struct TouchTracker {
    key_by_pointer: HashMap<PointerId, KeyIdx>,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self {
            key_by_pointer: HashMap::new(),
        }
    }

    pub fn key_for_pointer(&self, id: PointerId) -> Option<KeyIdx> {
        self.key_by_pointer.get(&id).copied()
    }

    pub fn active_pointers(&self) -> usize {
        self.key_by_pointer.len()
    }

    pub fn held_keys(&self) -> impl Iterator<Item = KeyIdx> + '_ {
        self.key_by_pointer.values().copied()
    }

    fn is_held_by_other(&self, key: KeyIdx, id: PointerId) -> bool {
        self.key_by_pointer
            .iter()
            .any(|(&other, &k)| other != id && k == key)
    }

    /// Forget every pointer, without reporting anything.
    pub fn reset(&mut self) {
        self.key_by_pointer.clear();
    }

    fn desync(&mut self, reason: &str) -> TouchOutput {
        log::warn!("Touch-track error: {reason}; resetting touch state");
        self.reset();
        TouchOutput {
            transitions: Vec::new(),
            desync: true,
        }
    }

    pub fn handle_event(
        &mut self,
        event: &TouchEvent,
        resolve: impl Fn(f32, f32) -> KeyIdx,
    ) -> TouchOutput {
        let mut out = TouchOutput::default();

        for p in &event.pointers {
            match event.phase {
                TouchPhase::Down => {
                    if self.key_by_pointer.contains_key(&p.id) {
                        return self.desync("repeated touch-down event received");
                    }
                    let key = resolve(p.x, p.y);
                    self.key_by_pointer.insert(p.id, key);
                    out.transitions.push(KeyTransition::Down(key));
                }
                TouchPhase::Move => {
                    let Some(&prev) = self.key_by_pointer.get(&p.id) else {
                        return self.desync("missed touch-down event");
                    };
                    let key = resolve(p.x, p.y);
                    if key != prev {
                        log::trace!("Pointer {:?} moved from key {} to key {}", p.id, prev.0, key.0);
                        // Release before pressing, never the other way round.
                        self.key_by_pointer.insert(p.id, key);
                        if !self.is_held_by_other(prev, p.id) {
                            out.transitions.push(KeyTransition::Up(prev));
                        }
                        out.transitions.push(KeyTransition::Down(key));
                    }
                }
                TouchPhase::Up | TouchPhase::Cancel => {
                    // The finger may have slid since the last move; release what it held,
                    // not what lies under it now.
                    let Some(prev) = self.key_by_pointer.remove(&p.id) else {
                        return self.desync("repeated touch-up event received");
                    };
                    if !self.is_held_by_other(prev, p.id) {
                        out.transitions.push(KeyTransition::Up(prev));
                    }
                }
            }
        }

        out
    }
}

impl Default for TouchTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 100px wide keys along x, y is ignored.
    fn strip(x: f32, _y: f32) -> KeyIdx {
        KeyIdx((x / 100.0).floor() as i32)
    }

    #[test]
    fn down_move_up_lifecycle() {
        let mut t = TouchTracker::new();

        let out = t.handle_event(&TouchEvent::down(1, 50.0, 0.0), strip);
        assert_eq!(out.transitions, vec![KeyTransition::Down(KeyIdx(0))]);
        assert!(!out.desync);

        // Moving within the same key is silent.
        let out = t.handle_event(&TouchEvent::moved(1, 60.0, 0.0), strip);
        assert!(out.transitions.is_empty());

        let out = t.handle_event(&TouchEvent::moved(1, 250.0, 0.0), strip);
        assert_eq!(
            out.transitions,
            vec![KeyTransition::Up(KeyIdx(0)), KeyTransition::Down(KeyIdx(2))]
        );

        let out = t.handle_event(&TouchEvent::up(1, 250.0, 0.0), strip);
        assert_eq!(out.transitions, vec![KeyTransition::Up(KeyIdx(2))]);
        assert_eq!(t.active_pointers(), 0);
    }

    #[test]
    fn up_releases_the_held_key_not_the_one_under_the_finger() {
        let mut t = TouchTracker::new();
        t.handle_event(&TouchEvent::down(1, 50.0, 0.0), strip);

        let out = t.handle_event(&TouchEvent::up(1, 950.0, 0.0), strip);
        assert_eq!(out.transitions, vec![KeyTransition::Up(KeyIdx(0))]);
    }

    #[test]
    fn batched_moves_resolve_every_pointer() {
        let mut t = TouchTracker::new();
        t.handle_event(&TouchEvent::down(1, 50.0, 0.0), strip);
        t.handle_event(&TouchEvent::down(2, 550.0, 0.0), strip);

        let batch = TouchEvent {
            phase: TouchPhase::Move,
            pointers: vec![
                PointerSample {
                    id: PointerId(1),
                    x: 150.0,
                    y: 0.0,
                },
                PointerSample {
                    id: PointerId(2),
                    x: 650.0,
                    y: 0.0,
                },
            ],
        };
        let out = t.handle_event(&batch, strip);
        assert_eq!(
            out.transitions,
            vec![
                KeyTransition::Up(KeyIdx(0)),
                KeyTransition::Down(KeyIdx(1)),
                KeyTransition::Up(KeyIdx(5)),
                KeyTransition::Down(KeyIdx(6)),
            ]
        );
        assert_eq!(t.key_for_pointer(PointerId(1)), Some(KeyIdx(1)));
        assert_eq!(t.key_for_pointer(PointerId(2)), Some(KeyIdx(6)));
    }

    #[test]
    fn shared_key_is_released_by_the_last_pointer() {
        let mut t = TouchTracker::new();
        t.handle_event(&TouchEvent::down(1, 10.0, 0.0), strip);
        let out = t.handle_event(&TouchEvent::down(2, 20.0, 0.0), strip);
        assert_eq!(out.transitions, vec![KeyTransition::Down(KeyIdx(0))]);

        let out = t.handle_event(&TouchEvent::up(1, 10.0, 0.0), strip);
        assert!(out.transitions.is_empty());

        let out = t.handle_event(&TouchEvent::moved(2, 120.0, 0.0), strip);
        assert_eq!(
            out.transitions,
            vec![KeyTransition::Up(KeyIdx(0)), KeyTransition::Down(KeyIdx(1))]
        );
    }

    #[test]
    fn repeated_down_is_a_desync() {
        let mut t = TouchTracker::new();
        t.handle_event(&TouchEvent::down(1, 10.0, 0.0), strip);
        t.handle_event(&TouchEvent::down(2, 210.0, 0.0), strip);

        let out = t.handle_event(&TouchEvent::down(1, 10.0, 0.0), strip);
        assert!(out.desync);
        assert!(out.transitions.is_empty());
        assert_eq!(t.active_pointers(), 0);
    }

    #[test]
    fn move_or_up_for_unknown_pointer_is_a_desync() {
        let mut t = TouchTracker::new();
        assert!(t.handle_event(&TouchEvent::moved(9, 10.0, 0.0), strip).desync);
        assert!(t.handle_event(&TouchEvent::up(9, 10.0, 0.0), strip).desync);

        // Desync mid-batch drops whatever the batch had produced so far.
        t.handle_event(&TouchEvent::down(1, 10.0, 0.0), strip);
        let batch = TouchEvent {
            phase: TouchPhase::Move,
            pointers: vec![
                PointerSample {
                    id: PointerId(1),
                    x: 310.0,
                    y: 0.0,
                },
                PointerSample {
                    id: PointerId(7),
                    x: 10.0,
                    y: 0.0,
                },
            ],
        };
        let out = t.handle_event(&batch, strip);
        assert!(out.desync);
        assert!(out.transitions.is_empty());
        assert_eq!(t.active_pointers(), 0);
    }

    #[test]
    fn cancel_releases_like_up() {
        let mut t = TouchTracker::new();
        t.handle_event(&TouchEvent::down(4, 410.0, 0.0), strip);
        let out = t.handle_event(
            &TouchEvent::single(TouchPhase::Cancel, 4, 410.0, 0.0),
            strip,
        );
        assert_eq!(out.transitions, vec![KeyTransition::Up(KeyIdx(4))]);
        assert_eq!(t.held_keys().count(), 0);
    }
}
