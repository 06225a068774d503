//! Token descriptors and the interning token table.

use crate::index::dense_id;
use compact_str::CompactString;
use hashbrown::HashMap;
use std::fmt;

dense_id! {
    /// Dense id of an interned [`TokenDescriptor`].
    ///
    /// Id `0` is always end-of-file.
    pub struct TokenId => "t";
}

impl TokenId {
    /// The end-of-file token, registered first in every table.
    pub const EOF: Self = Self(0);
}

/// Identifies a terminal symbol kind.
///
/// Literal descriptors carry their text; lexical classes match any token of
/// that shape. Descriptors compare by value and are interned by
/// [`TokenTable`] into [`TokenId`]s.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenDescriptor {
    /// A reserved word such as `if`
    Keyword(CompactString),
    /// A punctuation sequence such as `(` or `==`
    KeyChar(CompactString),
    Identifier,
    Integer,
    Float,
    String,
    Eof,
}

impl TokenDescriptor {
    /// Describe a literal: words starting with a letter or `_` are keywords,
    /// everything else is a key-character sequence.
    #[must_use]
    pub fn literal(text: &str) -> Self {
        if text
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
        {
            Self::Keyword(text.into())
        } else {
            Self::KeyChar(text.into())
        }
    }

    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Keyword(_) | Self::KeyChar(_))
    }

    /// The literal text, if this is a keyword or key-character descriptor.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Keyword(text) | Self::KeyChar(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for TokenDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(text) | Self::KeyChar(text) => write!(f, "\"{text}\""),
            Self::Identifier => f.write_str("<identifier>"),
            Self::Integer => f.write_str("<integer>"),
            Self::Float => f.write_str("<float>"),
            Self::String => f.write_str("<string>"),
            Self::Eof => f.write_str("<eof>"),
        }
    }
}

/// Interning table from [`TokenDescriptor`] to dense [`TokenId`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenTable {
    descriptors: Vec<TokenDescriptor>,
    lookup: HashMap<TokenDescriptor, TokenId, ahash::RandomState>,
}

impl TokenTable {
    /// Create a table holding only [`TokenDescriptor::Eof`].
    #[must_use]
    pub fn new() -> Self {
        let mut table = Self {
            descriptors: Vec::new(),
            lookup: HashMap::with_hasher(ahash::RandomState::new()),
        };
        table.intern(TokenDescriptor::Eof);
        table
    }

    /// Return the id for `descriptor`, registering it if needed.
    pub fn intern(&mut self, descriptor: TokenDescriptor) -> TokenId {
        if let Some(&id) = self.lookup.get(&descriptor) {
            return id;
        }
        let id = <TokenId as crate::index::Indexed>::from_index(self.descriptors.len());
        self.descriptors.push(descriptor.clone());
        self.lookup.insert(descriptor, id);
        id
    }

    #[must_use]
    pub fn get(&self, descriptor: &TokenDescriptor) -> Option<TokenId> {
        self.lookup.get(descriptor).copied()
    }

    /// Look up a keyword by its text.
    #[must_use]
    pub fn keyword(&self, word: &str) -> Option<TokenId> {
        self.get(&TokenDescriptor::Keyword(word.into()))
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this table.
    #[must_use]
    pub fn descriptor(&self, id: TokenId) -> &TokenDescriptor {
        &self.descriptors[id.index()]
    }

    /// Like [`descriptor`](Self::descriptor), for ids of unknown origin.
    #[must_use]
    pub fn get_descriptor(&self, id: TokenId) -> Option<&TokenDescriptor> {
        self.descriptors.get(id.index())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Always false: end-of-file is registered on construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &TokenDescriptor)> {
        self.descriptors
            .iter()
            .enumerate()
            .map(|(index, descriptor)| (crate::index::Indexed::from_index(index), descriptor))
    }

    /// Key-character sequences, longest first, for maximal-munch scanning.
    #[must_use]
    pub fn key_chars(&self) -> Vec<(&str, TokenId)> {
        let mut key_chars: Vec<(&str, TokenId)> = self
            .iter()
            .filter_map(|(id, descriptor)| match descriptor {
                TokenDescriptor::KeyChar(text) if !text.is_empty() => Some((text.as_str(), id)),
                _ => None,
            })
            .collect();
        key_chars.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));
        key_chars
    }
}

impl Default for TokenTable {
    fn default() -> Self {
        Self::new()
    }
}
