//! Dictionaries and helpers shared by the codec tests.

use bilbinary_dict::{Dictionaries, Dictionary};
use bilbinary_tree::Node;

/// General dictionary entries.
pub const GENERAL: &[(&str, u64)] = &[
    ("function", 10),
    ("variable", 11),
    ("list", 12),
    ("name", 13),
    ("image", 14),
    ("secs", 17),
    ("args", 20),
    ("locals", 21),
    ("value", 22),
    ("condition", 23),
    ("blocks", 26),
    ("port-settings", 32),
    ("scripts", 33),
    ("x", 34),
    ("y", 35),
    ("V0", 46),
    ("V2", 48),
    ("V6", 52),
    ("dc-motor", 72),
    ("servo-motor", 73),
    ("buzzer", 74),
    ("port-parameters", 85),
    ("scale", 86),
    ("drift", 87),
];

/// Instruction dictionary entries.
pub const INSTRUCTIONS: &[(&str, u64)] = &[
    ("when-green-flag-clicked", 1),
    ("wait", 6),
    ("plus", 10),
    ("multiply", 11),
    ("if-then", 20),
    ("equal?", 21),
    ("function", 42),
    ("call-function", 43),
    ("variable-ref", 44),
    ("set-variable-to", 45),
];

pub fn dictionaries() -> Dictionaries {
    Dictionaries::new(
        Dictionary::from_entries(GENERAL.iter().copied()).unwrap(),
        Dictionary::from_entries(INSTRUCTIONS.iter().copied()).unwrap(),
    )
}

pub fn node(value: serde_json::Value) -> Node {
    serde_json::from_value(value).unwrap()
}
