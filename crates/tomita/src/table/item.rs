use crate::grammar::{Element, ProductionId};
use crate::index::{IndexSet, dense_id};
use smallvec::SmallVec;

dense_id! {
    /// Dense id of a [`ParserItem`].
    pub struct ItemId => "i";
}

/// An LR(0) item: a production with a dot before `position`.
///
/// Items of one production form a chain through `next`, from position 0 to
/// the complete item.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ParserItem {
    pub id: ItemId,
    pub production: ProductionId,
    pub position: usize,
    /// The item with the dot advanced by one, unless this item is complete
    pub next: Option<ItemId>,
    /// The element right after the dot, unless this item is complete
    pub expected: Option<Element>,
}

impl ParserItem {
    /// True when the dot is at the end and the production can be reduced.
    #[inline]
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.expected.is_none()
    }
}

/// The items of one automaton state.
///
/// Stored sorted, so two sets with the same items compare and hash equal
/// regardless of the order the closure discovered them in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ParserItemSet {
    items: SmallVec<[ItemId; 8]>,
}

impl ParserItemSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn contains(&self, item: ItemId) -> bool {
        self.items.binary_search(&item).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.iter().copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ItemId] {
        &self.items
    }
}

impl From<IndexSet<ItemId>> for ParserItemSet {
    fn from(set: IndexSet<ItemId>) -> Self {
        let mut items: SmallVec<[ItemId; 8]> = set.iter().collect();
        items.sort_unstable();
        Self { items }
    }
}

impl FromIterator<ItemId> for ParserItemSet {
    fn from_iter<I: IntoIterator<Item = ItemId>>(iter: I) -> Self {
        iter.into_iter().collect::<IndexSet<_>>().into()
    }
}
