use crate::notes::KeyIdx;

/// Widest a big key gets on large screens, in pixels.
pub const PREFERRED_KEY_WIDTH: i32 = 220;

/// Big keys that must fit on any screen, so one octave is always visible.
pub const MIN_KEYS: i32 = 7;

/// Width of a flat key relative to a big key.
pub const FLAT_WIDTH_RATIO: f64 = 0.6;

/// Height of a flat key relative to the screen.
pub const FLAT_HEIGHT_RATIO: f64 = 0.55;

/// Rectangular hit-area of a key.
///
/// Bounds are exclusive on all four sides: a touch exactly on an edge belongs to neither
/// neighbour ("the line is out").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyArea {
    pub x_start: i32,
    pub x_end: i32,
    pub y_start: i32,
    pub y_end: i32,
}

impl KeyArea {
    /// Zero-area stand-in for the flats that don't exist; nothing is ever inside it.
    pub const UNTOUCHABLE: KeyArea = KeyArea {
        x_start: 0,
        x_end: 0,
        y_start: 0,
        y_end: 0,
    };

    pub fn new(x_start: i32, x_end: i32, y_start: i32, y_end: i32) -> Self {
        Self {
            x_start,
            x_end,
            y_start,
            y_end,
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        (x > self.x_start as f32 && x < self.x_end as f32)
            && (y > self.y_start as f32 && y < self.y_end as f32)
    }

    pub fn is_untouchable(&self) -> bool {
        self.x_start == self.x_end || self.y_start == self.y_end
    }
}

/// Key geometry for one screen size.
///
/// Big keys occupy the even indices and span the full height. Flats occupy the odd indices,
/// straddle the boundary between their two big neighbours and cover the upper part of the
/// screen. There is always one extra (possibly partial) big key at the right edge.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyboardLayout {
    height: i32,
    key_width: i32,
    flat_width: i32,
    flat_height: i32,
    keys_count: usize,
}

impl KeyboardLayout {
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        let width = screen_width.min(i32::MAX as u32) as i32;
        let height = screen_height.min(i32::MAX as u32) as i32;

        // Guarantees MIN_KEYS whole keys; degenerate screens still get a usable width.
        let key_width = (width / MIN_KEYS).min(PREFERRED_KEY_WIDTH).max(1);
        let flat_width = (key_width as f64 * FLAT_WIDTH_RATIO) as i32;
        let flat_height = (height as f64 * FLAT_HEIGHT_RATIO) as i32;

        // Round up for a possible half-key at the right edge.
        let big_keys = 1 + (width / key_width) as usize;

        Self {
            height,
            key_width,
            flat_width,
            flat_height,
            keys_count: big_keys * 2 + 1,
        }
    }

    pub fn keys_count(&self) -> usize {
        self.keys_count
    }

    pub fn key_width(&self) -> i32 {
        self.key_width
    }

    pub fn flat_width(&self) -> i32 {
        self.flat_width
    }

    pub fn flat_height(&self) -> i32 {
        self.flat_height
    }

    pub fn contains_key(&self, idx: KeyIdx) -> bool {
        idx.0 >= 0 && (idx.0 as usize) < self.keys_count
    }

    /// Area of any key, big or flat.
    pub fn area_for_key(&self, idx: KeyIdx) -> KeyArea {
        if idx.is_big() {
            self.area_for_big_key(idx)
        } else {
            self.area_for_flat_key(idx)
        }
    }

    pub fn area_for_big_key(&self, idx: KeyIdx) -> KeyArea {
        let x_start = idx.0.div_euclid(2).saturating_mul(self.key_width);
        KeyArea::new(x_start, x_start.saturating_add(self.key_width), 0, self.height)
    }

    /// Area of flat `idx`, or [`KeyArea::UNTOUCHABLE`] where a standard octave has no black
    /// key (between E-F and B-C).
    pub fn area_for_flat_key(&self, idx: KeyIdx) -> KeyArea {
        let big = idx.0.div_euclid(2);
        let octave_pos = big.rem_euclid(7);
        if octave_pos == 2 || octave_pos == 6 {
            return KeyArea::UNTOUCHABLE;
        }

        let offset = self.key_width - self.flat_width / 2;
        let x_start = big.saturating_mul(self.key_width).saturating_add(offset);
        KeyArea::new(
            x_start,
            x_start.saturating_add(self.flat_width),
            0,
            self.flat_height,
        )
    }

    /// Maps a screen coordinate to a key index.
    ///
    /// Below the flats the big key is unambiguous. In the flat band the current big key's
    /// own flat wins over the previous key's overhanging flat, and the big key is the
    /// fallback when neither contains the point.
    pub fn pos_to_key_idx(&self, x: f32, y: f32) -> KeyIdx {
        let big_key = KeyIdx(((x / self.key_width as f32).floor() as i32).saturating_mul(2));
        if y > self.flat_height as f32 {
            return big_key;
        }

        let flat = KeyIdx(big_key.0.saturating_add(1));
        if self.area_for_flat_key(flat).contains(x, y) {
            return flat;
        }

        if big_key.0 > 0 {
            let prev_flat = KeyIdx(big_key.0 - 1);
            if self.area_for_flat_key(prev_flat).contains(x, y) {
                return prev_flat;
            }
        }

        big_key
    }
}
