//! Preference between two derivations of the same input.

use crate::engine::stack::{ElementId, StackArena, StackElement};
use std::cmp::Ordering;

/// Shape of a derivation as far as ambiguity resolution cares: how many
/// tokens each node covers, and its children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AmbiguityNode {
    tokens: usize,
    children: Vec<AmbiguityNode>,
}

impl AmbiguityNode {
    /// A shifted token.
    #[must_use]
    pub const fn terminal() -> Self {
        Self::leaf(1)
    }

    /// A leaf covering `tokens` tokens; 0 for an empty derivation.
    #[must_use]
    pub const fn leaf(tokens: usize) -> Self {
        Self {
            tokens,
            children: Vec::new(),
        }
    }

    /// A node over `children`, covering all of their tokens.
    #[must_use]
    pub fn node(children: Vec<Self>) -> Self {
        Self {
            tokens: children.iter().map(|child| child.tokens).sum(),
            children,
        }
    }

    #[must_use]
    pub const fn tokens(&self) -> usize {
        self.tokens
    }

    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// [`Ordering::Greater`] if `self` is the preferred derivation.
    ///
    /// The node covering more tokens wins. On a tie the children are compared
    /// pairwise from the left and the first difference decides; if every
    /// shared child ties, the node with fewer children wins. Nodes that tie
    /// all the way down are [`Ordering::Equal`].
    ///
    /// Applied at every level, this prefers the derivation whose leftmost
    /// constituents extend furthest, which attaches dangling suffixes to the
    /// innermost construct.
    ///
    /// ```rust
    /// use std::cmp::Ordering;
    /// use tomita::engine::AmbiguityNode;
    ///
    /// let t = AmbiguityNode::terminal;
    /// // if (c) [if (c) s else s] vs. if (c) [if (c) s] else s
    /// let inner = AmbiguityNode::node(vec![AmbiguityNode::node(vec![t(); 6]), AmbiguityNode::leaf(0)]);
    /// let outer = AmbiguityNode::node(vec![AmbiguityNode::node(vec![t(); 4]), AmbiguityNode::node(vec![t(); 2])]);
    /// assert_eq!(inner.compare(&outer), Ordering::Greater);
    /// ```
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        prefer(self, other)
    }
}

/// A derivation shape the comparator can walk.
///
/// Implemented by [`AmbiguityNode`] trees and by [`StackDerivation`], which
/// reads token counts cached in a [`StackArena`] instead of building a tree.
pub trait Derivation: Copy {
    /// Tokens covered by this node.
    fn tokens(self) -> usize;

    fn child_count(self) -> usize;

    /// # Panics
    ///
    /// May panic if `index` is not below [`Derivation::child_count`].
    fn child(self, index: usize) -> Self;
}

impl Derivation for &AmbiguityNode {
    fn tokens(self) -> usize {
        self.tokens
    }

    fn child_count(self) -> usize {
        self.children.len()
    }

    fn child(self, index: usize) -> Self {
        &self.children[index]
    }
}

/// [`Ordering::Greater`] if `left` is the preferred derivation, by the rules
/// of [`AmbiguityNode::compare`].
///
/// Children are only visited while their parents tie.
pub fn prefer<D: Derivation>(left: D, right: D) -> Ordering {
    if left.tokens() != right.tokens() {
        return left.tokens().cmp(&right.tokens());
    }
    // Explicit frames so deep derivations cannot exhaust the call stack
    let mut frames: Vec<(D, D, usize)> = vec![(left, right, 0)];
    while let Some(&(left, right, next)) = frames.last() {
        let top = frames.len() - 1;
        if next < left.child_count().min(right.child_count()) {
            frames[top].2 += 1;
            let (a, b) = (left.child(next), right.child(next));
            if a.tokens() != b.tokens() {
                return a.tokens().cmp(&b.tokens());
            }
            frames.push((a, b, 0));
        } else {
            let fewer = right.child_count().cmp(&left.child_count());
            if fewer != Ordering::Equal {
                return fewer;
            }
            frames.pop();
        }
    }
    Ordering::Equal
}

/// The derivation of a run of stack elements, read straight from the arena.
///
/// A segment is a node over its elements; a reduced element is a node over
/// the elements it consumed; shifted tokens and the start element are leaves.
#[derive(Debug, Clone, Copy)]
pub struct StackDerivation<'a> {
    arena: &'a StackArena,
    shape: Shape<'a>,
}

#[derive(Debug, Clone, Copy)]
enum Shape<'a> {
    Segment(&'a [ElementId]),
    Element(ElementId),
}

impl<'a> StackDerivation<'a> {
    #[must_use]
    pub const fn segment(arena: &'a StackArena, elements: &'a [ElementId]) -> Self {
        Self {
            arena,
            shape: Shape::Segment(elements),
        }
    }

    fn element(self, id: ElementId) -> Self {
        Self {
            arena: self.arena,
            shape: Shape::Element(id),
        }
    }
}

impl Derivation for StackDerivation<'_> {
    fn tokens(self) -> usize {
        match self.shape {
            Shape::Segment(elements) => elements.iter().map(|&id| self.arena.node(id).tokens).sum(),
            Shape::Element(id) => self.arena.node(id).tokens,
        }
    }

    fn child_count(self) -> usize {
        match self.shape {
            Shape::Segment(elements) => elements.len(),
            Shape::Element(id) => match &self.arena.node(id).element {
                StackElement::Nonterminal { children, .. } => children.len(),
                StackElement::Start | StackElement::Terminal(_) => 0,
            },
        }
    }

    fn child(self, index: usize) -> Self {
        match self.shape {
            Shape::Segment(elements) => self.element(elements[index]),
            Shape::Element(id) => {
                let children: &[ElementId] = match &self.arena.node(id).element {
                    StackElement::Nonterminal { children, .. } => children,
                    StackElement::Start | StackElement::Terminal(_) => &[],
                };
                self.element(children[index])
            }
        }
    }
}
