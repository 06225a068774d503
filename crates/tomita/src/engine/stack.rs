//! Parse stacks
//!
//! Stack elements live in an append-only [`StackArena`] and link to their
//! predecessor by id, so any number of stacks can share a common suffix.
//! A [`ParserStack`] is a top element plus the bookkeeping the engine needs
//! for merging and deleting stacks within one token position; all stacks of
//! one position are held by a [`StacksList`].
//!
//! Two element chains are equal when they hold the same sequence of states,
//! whatever the elements carry. Each element caches its depth and a hash of
//! its state sequence, so most unequal chains are told apart without a walk.

use crate::grammar::ProductionId;
use crate::index::{Indexed, dense_id};
use crate::lexer::Token;
use crate::table::StateId;
use hashbrown::HashMap;
use smallvec::SmallVec;

dense_id! {
    /// Dense id of a [`StackNode`] in a [`StackArena`].
    pub struct ElementId => "e";
}

dense_id! {
    /// Dense id of a [`ParserStack`] in a [`StacksList`].
    pub struct StackId => "k";
}

/// What a stack element holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackElement {
    /// Bottom of every stack
    Start,
    /// A shifted token
    Terminal(Token),
    /// A reduced production over the elements it consumed, bottom to top
    Nonterminal {
        production: ProductionId,
        children: SmallVec<[ElementId; 4]>,
    },
}

#[derive(Debug, Clone)]
pub struct StackNode {
    pub state: StateId,
    pub prev: Option<ElementId>,
    /// Number of elements from the bottom up to and including this one
    pub depth: usize,
    /// Hash of the state sequence from the bottom up to this element
    pub hash: u64,
    /// Tokens covered by the element's derivation
    pub tokens: usize,
    pub element: StackElement,
}

const fn chain_hash(prev: u64, state: StateId) -> u64 {
    (prev.rotate_left(5) ^ state.index() as u64).wrapping_mul(0x517c_c1b7_2722_0a95)
}

/// Append-only storage for stack elements.
///
/// Elements are never removed during a parse; rejected and deleted stacks
/// simply stop being referenced.
#[derive(Debug, Default)]
pub struct StackArena {
    nodes: Vec<StackNode>,
}

impl StackArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, state: StateId, prev: Option<ElementId>, element: StackElement) -> ElementId {
        let (depth, prev_hash) = prev.map_or((1, 0), |prev| {
            let prev = self.node(prev);
            (prev.depth + 1, prev.hash)
        });
        let tokens = match &element {
            StackElement::Start => 0,
            StackElement::Terminal(_) => 1,
            StackElement::Nonterminal { children, .. } => {
                children.iter().map(|&child| self.node(child).tokens).sum()
            }
        };
        let id = ElementId::from_index(self.nodes.len());
        self.nodes.push(StackNode {
            state,
            prev,
            depth,
            hash: chain_hash(prev_hash, state),
            tokens,
            element,
        });
        id
    }

    pub fn push_start(&mut self, state: StateId) -> ElementId {
        self.push(state, None, StackElement::Start)
    }

    pub fn push_terminal(&mut self, state: StateId, prev: ElementId, token: Token) -> ElementId {
        self.push(state, Some(prev), StackElement::Terminal(token))
    }

    pub fn push_nonterminal(
        &mut self,
        state: StateId,
        prev: ElementId,
        production: ProductionId,
        children: SmallVec<[ElementId; 4]>,
    ) -> ElementId {
        self.push(
            state,
            Some(prev),
            StackElement::Nonterminal {
                production,
                children,
            },
        )
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this arena.
    #[must_use]
    pub fn node(&self, id: ElementId) -> &StackNode {
        &self.nodes[id.index()]
    }

    /// True if the chains ending at `a` and `b` hold the same states.
    #[must_use]
    pub fn same_chain(&self, mut a: ElementId, mut b: ElementId) -> bool {
        loop {
            if a == b {
                return true;
            }
            let (left, right) = (self.node(a), self.node(b));
            if left.depth != right.depth || left.hash != right.hash || left.state != right.state {
                return false;
            }
            match (left.prev, right.prev) {
                (Some(prev_a), Some(prev_b)) => {
                    a = prev_a;
                    b = prev_b;
                }
                (None, None) => return true,
                _ => return false,
            }
        }
    }

    /// Pop `count` elements off the chain ending at `top`.
    ///
    /// Returns the exposed element and the popped ones, bottom to top, or
    /// `None` if the chain is not deep enough above its start element.
    #[must_use]
    pub fn pop(
        &self,
        top: ElementId,
        count: usize,
    ) -> Option<(ElementId, SmallVec<[ElementId; 4]>)> {
        let mut popped = SmallVec::with_capacity(count);
        let mut current = top;
        for _ in 0..count {
            let node = self.node(current);
            if matches!(node.element, StackElement::Start) {
                return None;
            }
            popped.push(current);
            current = node.prev?;
        }
        popped.reverse();
        Some((current, popped))
    }

    /// The elements of two equal-depth chains above their deepest shared
    /// element, each bottom to top.
    #[must_use]
    pub fn divergent_segments(
        &self,
        a: ElementId,
        b: ElementId,
    ) -> (SmallVec<[ElementId; 4]>, SmallVec<[ElementId; 4]>) {
        let mut left = SmallVec::new();
        let mut right = SmallVec::new();
        let (mut a, mut b) = (Some(a), Some(b));
        while let (Some(x), Some(y)) = (a, b) {
            if x == y {
                break;
            }
            left.push(x);
            right.push(y);
            a = self.node(x).prev;
            b = self.node(y).prev;
        }
        left.reverse();
        right.reverse();
        (left, right)
    }

    /// Post-order fold over the derivation under `root`, without recursion.
    ///
    /// `terminal` is called for every token and `nonterminal` once per
    /// reduced production with the folded children in order. Returns `None`
    /// for the start element.
    pub fn fold<T>(
        &self,
        root: ElementId,
        mut terminal: impl FnMut(&Token) -> T,
        mut nonterminal: impl FnMut(ProductionId, Vec<T>) -> T,
    ) -> Option<T> {
        let mut work = vec![(root, false)];
        let mut values: Vec<T> = Vec::new();
        while let Some((id, expanded)) = work.pop() {
            match &self.node(id).element {
                StackElement::Start => return None,
                StackElement::Terminal(token) => values.push(terminal(token)),
                StackElement::Nonterminal {
                    production,
                    children,
                } => {
                    if expanded {
                        let args = values.split_off(values.len().saturating_sub(children.len()));
                        values.push(nonterminal(*production, args));
                    } else {
                        work.push((id, true));
                        work.extend(children.iter().rev().map(|&child| (child, false)));
                    }
                }
            }
        }
        values.pop()
    }
}

/// A stack of the current token position.
#[derive(Debug, Clone)]
pub struct ParserStack {
    pub top: ElementId,
    /// The stack this one was reduced from
    pub source: Option<StackId>,
    /// Stacks reduced from this one
    pub derived: SmallVec<[StackId; 2]>,
    /// Elements pushed by reductions since the last shift that are still on
    /// the stack
    pub reduce_depth: usize,
    pub deleted: bool,
}

impl ParserStack {
    /// A stack right after a shift, or the initial stack.
    #[must_use]
    pub fn shifted(top: ElementId) -> Self {
        Self {
            top,
            source: None,
            derived: SmallVec::new(),
            reduce_depth: 0,
            deleted: false,
        }
    }

    /// A stack produced by a reduction of `source`.
    #[must_use]
    pub fn reduced(top: ElementId, source: StackId, reduce_depth: usize) -> Self {
        Self {
            top,
            source: Some(source),
            derived: SmallVec::new(),
            reduce_depth,
            deleted: false,
        }
    }
}

/// All stacks of one token position.
///
/// Stacks are only ever flagged as deleted, never removed, so a [`StackId`]
/// stays valid until [`clear`](Self::clear). An index from chain hash to
/// stacks finds the stack equal to a candidate.
#[derive(Debug, Default)]
pub struct StacksList {
    stacks: Vec<ParserStack>,
    by_top: HashMap<u64, SmallVec<[StackId; 2]>, ahash::RandomState>,
}

impl StacksList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.stacks.clear();
        self.by_top.clear();
    }

    /// Number of stacks, deleted ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued since the last [`clear`](Self::clear).
    #[must_use]
    pub fn stack(&self, id: StackId) -> &ParserStack {
        &self.stacks[id.index()]
    }

    /// Stacks that are not deleted.
    pub fn live(&self) -> impl Iterator<Item = (StackId, &ParserStack)> {
        self.stacks
            .iter()
            .enumerate()
            .filter(|(_, stack)| !stack.deleted)
            .map(|(index, stack)| (StackId::from_index(index), stack))
    }

    /// The indexed stack whose chain equals the chain ending at `top`.
    #[must_use]
    pub fn find_equal(&self, arena: &StackArena, top: ElementId) -> Option<StackId> {
        self.by_top
            .get(&arena.node(top).hash)?
            .iter()
            .copied()
            .find(|&id| arena.same_chain(self.stacks[id.index()].top, top))
    }

    /// Add a stack. It takes over the index entry of an equal stack and is
    /// registered as derived from its source.
    pub fn push(&mut self, arena: &StackArena, stack: ParserStack) -> StackId {
        let id = StackId::from_index(self.stacks.len());
        let top = stack.top;
        let source = stack.source;
        let equal = self.find_equal(arena, top);
        self.stacks.push(stack);

        let bucket = self.by_top.entry(arena.node(top).hash).or_default();
        match equal.and_then(|equal| bucket.iter().position(|&other| other == equal)) {
            Some(slot) => bucket[slot] = id,
            None => bucket.push(id),
        }
        if let Some(source) = source {
            self.stacks[source.index()].derived.push(id);
        }
        id
    }

    /// Flag `id` and every stack derived from it, transitively, as deleted.
    pub fn delete_cascade(&mut self, id: StackId) -> usize {
        let mut work = vec![id];
        let mut deleted = 0;
        while let Some(id) = work.pop() {
            let stack = &mut self.stacks[id.index()];
            if stack.deleted {
                continue;
            }
            stack.deleted = true;
            deleted += 1;
            work.extend(stack.derived.iter().copied());
        }
        deleted
    }

    /// True if a stack on the source chain starting at `source` already
    /// has a chain equal to the one ending at `top`.
    #[must_use]
    pub fn is_recursive(&self, arena: &StackArena, top: ElementId, source: Option<StackId>) -> bool {
        let mut current = source;
        while let Some(id) = current {
            let stack = &self.stacks[id.index()];
            if arena.same_chain(stack.top, top) {
                return true;
            }
            current = stack.source;
        }
        false
    }

    /// True if a state repeats among the top `reduce_depth` elements of the
    /// chain ending at `top`.
    #[must_use]
    pub fn is_cycled(arena: &StackArena, top: ElementId, reduce_depth: usize) -> bool {
        let mut seen: SmallVec<[StateId; 8]> = SmallVec::new();
        let mut current = Some(top);
        for _ in 0..reduce_depth {
            let Some(id) = current else {
                break;
            };
            let node = arena.node(id);
            if seen.contains(&node.state) {
                return true;
            }
            seen.push(node.state);
            current = node.prev;
        }
        false
    }
}
