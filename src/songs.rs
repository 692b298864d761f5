//! Built-in melodies, as `(id, notes)` pairs.
//!
//! Notes are plain note names separated by whitespace; newlines mark phrases. Everything must
//! fit the two octaves the keyboard addresses (C1..B2).

pub const TWINKLE: &str = "
    C1 C1 G1 G1 A1 A1 G1
    F1 F1 E1 E1 D1 D1 C1
    G1 G1 F1 F1 E1 E1 D1
    G1 G1 F1 F1 E1 E1 D1
    C1 C1 G1 G1 A1 A1 G1
    F1 F1 E1 E1 D1 D1 C1
";

pub const INSY_WINSY: &str = "
    G1 C2 C2 C2 D2 E2 E2
    E2 D2 C2 D2 E2 C2
    E2 E2 F2 G2 G2
    F2 E2 F2 G2 E2
    C2 C2 D2 E2 E2
    D2 C2 D2 E2 C2
    G1 G1 C2 C2 C2 D2 E2 E2
    E2 D2 C2 D2 E2 C2
";

pub const TEAPOT: &str = "
    C1 D1 E1 F1 G1 C2
    A1 C2 G1
    F1 F1 F1 E1 E1
    D1 D1 D1 C1
    C1 D1 E1 F1 G1 C2
    A1 C2 G1
    C2 A1 G1 G1 F1 E1 D1 C1
";

pub const WALTZING_MATILDA: &str = "
    D1 D1 D1 D1 B1 A1 G1
    G1 A1 B1 A1 G1 F#1 E1 D1
    D1 D1 D1 B1 A1 G1
    G1 A1 B1 A1 G1 A1
    D1 D1 D1 D1 B1 A1 G1
    G1 A1 B1 D2 C2 B1 A1
    G1 A1 B1 A1 G1 F#1 G1
";

pub const BROTHER_JOHN: &str = "
    C2 D2 E2 C2
    C2 D2 E2 C2
    E2 F2 G2
    E2 F2 G2
    G2 A2 G2 F2 E2 C2
    G2 A2 G2 F2 E2 C2
    C2 G1 C2
    C2 G1 C2
";

pub const CATALOG: &[(&str, &str)] = &[
    ("twinkle", TWINKLE),
    ("insy_winsy", INSY_WINSY),
    ("teapot", TEAPOT),
    ("waltzing_matilda", WALTZING_MATILDA),
    ("brother_john", BROTHER_JOHN),
];

pub fn ids() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|&(id, _)| id)
}
