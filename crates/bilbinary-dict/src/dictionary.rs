//! Keyword dictionary tables.

use std::collections::HashMap;

use indexmap::IndexMap;
use thiserror::Error;

/// A 16-bit code identifying a keyword. Code 0 is never assigned.
pub type KeywordCode = u16;

/// The key whose textual values are instruction names.
pub const NAME_KEY: &str = "name";

/// Errors raised while building a dictionary.
#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("keyword {keyword:?} uses reserved code 0")]
    ZeroCode { keyword: String },

    #[error("code {code} for keyword {keyword:?} does not fit in 16 bits")]
    CodeOutOfRange { keyword: String, code: u64 },

    #[error("code {code} is assigned to both {first:?} and {second:?}")]
    DuplicateCode {
        code: KeywordCode,
        first: String,
        second: String,
    },

    #[error("invalid dictionary JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A fixed bijection between keywords and codes, with its inverse precomputed.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    codes: HashMap<String, KeywordCode>,
    keywords: HashMap<KeywordCode, String>,
}

impl Dictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary from `(keyword, code)` pairs.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, DictionaryError>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut dict = Self::new();
        for (keyword, code) in entries {
            dict.insert(keyword, code)?;
        }
        Ok(dict)
    }

    /// Parse the JSON object form `{"keyword": code, ...}`.
    pub fn from_json(json: &str) -> Result<Self, DictionaryError> {
        let entries: IndexMap<String, u64> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    /// Add one entry, rejecting codes that would break the bijection.
    ///
    /// Re-inserting a keyword with a new code replaces the old code.
    pub fn insert(&mut self, keyword: impl Into<String>, code: u64) -> Result<(), DictionaryError> {
        let keyword = keyword.into();
        if code == 0 {
            return Err(DictionaryError::ZeroCode { keyword });
        }
        let code = KeywordCode::try_from(code)
            .map_err(|_| DictionaryError::CodeOutOfRange {
                keyword: keyword.clone(),
                code,
            })?;
        if let Some(first) = self.keywords.get(&code) {
            if *first != keyword {
                return Err(DictionaryError::DuplicateCode {
                    code,
                    first: first.clone(),
                    second: keyword,
                });
            }
        }
        if let Some(old) = self.codes.insert(keyword.clone(), code) {
            self.keywords.remove(&old);
        }
        self.keywords.insert(code, keyword);
        Ok(())
    }

    /// Look up the code for a keyword.
    pub fn code(&self, keyword: &str) -> Option<KeywordCode> {
        self.codes.get(keyword).copied()
    }

    /// Look up the keyword for a code.
    pub fn keyword(&self, code: KeywordCode) -> Option<&str> {
        self.keywords.get(&code).map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Iterate over `(keyword, code)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, KeywordCode)> {
        self.codes.iter().map(|(k, &c)| (k.as_str(), c))
    }
}

/// The general and instruction dictionaries used together by the codec.
#[derive(Debug, Clone, Default)]
pub struct Dictionaries {
    /// Keys and generic values.
    pub general: Dictionary,
    /// Values of the `name` key.
    pub instructions: Dictionary,
}

impl Dictionaries {
    pub fn new(general: Dictionary, instructions: Dictionary) -> Self {
        Self {
            general,
            instructions,
        }
    }

    /// The dictionary that holds values owned by `key`.
    pub fn for_value(&self, key: Option<&str>) -> &Dictionary {
        match key {
            Some(NAME_KEY) => &self.instructions,
            _ => &self.general,
        }
    }

    /// Code for a key. Keys always come from the general dictionary.
    pub fn key_code(&self, key: &str) -> Option<KeywordCode> {
        self.general.code(key)
    }

    /// Key for a code.
    pub fn key(&self, code: KeywordCode) -> Option<&str> {
        self.general.keyword(code)
    }

    /// Code for a textual value owned by `key`.
    pub fn value_code(&self, key: Option<&str>, value: &str) -> Option<KeywordCode> {
        self.for_value(key).code(value)
    }

    /// Textual value for a code owned by `key`.
    pub fn value(&self, key: Option<&str>, code: KeywordCode) -> Option<&str> {
        self.for_value(key).keyword(code)
    }
}
