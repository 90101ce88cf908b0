//! bilbinary keyword dictionaries - string <-> 16-bit code bijections.
//!
//! The wire format never carries text. Every key and every textual value is
//! replaced by a code from one of two externally supplied dictionaries: the
//! general dictionary (keys and generic values) and the instruction dictionary
//! (values of the `name` key).
//!
//! # Example
//!
//! ```
//! use bilbinary_dict::Dictionary;
//!
//! let dict = Dictionary::from_json(r#"{"x": 34, "y": 35}"#).unwrap();
//! assert_eq!(dict.code("x"), Some(34));
//! assert_eq!(dict.keyword(35), Some("y"));
//! ```

pub mod dictionary;

pub use dictionary::{Dictionaries, Dictionary, DictionaryError, KeywordCode, NAME_KEY};
