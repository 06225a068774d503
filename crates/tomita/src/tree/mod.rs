//! # Output Trees
//!
//! What the engine produces once a parse is accepted.
//!
//! Each production carries an [`Action`] describing the node it stands for.
//! A [`NodeBuilder`] turns accepted tokens and reductions into nodes of its
//! own type; [`TreeBuilder`] is the default one and builds [`ParseNode`]s.
//!
//! Nodes are only built for the accepted parse, bottom-up, after the input
//! has been consumed. Discarded alternatives never reach the builder.

use crate::grammar::BnfProduction;
use crate::lexer::Token;
use compact_str::CompactString;
use std::fmt;

/// Node-building instruction attached to a production.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    /// A named node over all children
    Node(CompactString),
    /// The single child, unchanged
    PassThrough,
    /// An anonymous node over all children
    Group,
    /// Nothing was matched
    Absent,
    /// A list without items
    ListEmpty,
    /// A list of the children; with `separated`, every other child is a
    /// separator and is dropped
    ListNew { separated: bool },
    /// The first child is a list; append the last child to it
    ListAppend { separated: bool },
    /// The extended start production `@Start : Start`
    Accept,
}

/// Builds output nodes for an accepted parse.
///
/// ```rust
/// use tomita::grammar::{BnfProduction, Expr, Grammar};
/// use tomita::lexer::Token;
/// use tomita::table::ParserConfiguration;
/// use tomita::tree::NodeBuilder;
/// use tomita::ParserEngine;
///
/// /// Counts the tokens under each node.
/// struct Counter;
///
/// impl NodeBuilder for Counter {
///     type Node = usize;
///
///     fn terminal(&self, _token: &Token) -> usize {
///         1
///     }
///
///     fn reduce(&self, _production: &BnfProduction, children: Vec<usize>) -> usize {
///         children.into_iter().sum()
///     }
/// }
///
/// let grammar = Grammar::builder()
///     .start("Words")
///     .rule("Words", Expr::some(Expr::identifier()))
///     .build()?;
/// let configuration = ParserConfiguration::build(&grammar)?;
/// let engine = ParserEngine::new(&configuration);
///
/// let mut tokens = tomita::lexer::Scanner::new("a b c", configuration.tokens());
/// let output = engine.parse("Words", &mut tokens, &Counter)?;
/// assert_eq!(output.root, 3);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait NodeBuilder {
    type Node;

    /// Node for a shifted token.
    fn terminal(&self, token: &Token) -> Self::Node;

    /// Node for a completed production; `children` holds one node per
    /// element, left to right.
    fn reduce(&self, production: &BnfProduction, children: Vec<Self::Node>) -> Self::Node;
}

/// The default output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum ParseNode {
    Token(Token),
    Node {
        name: CompactString,
        children: Vec<ParseNode>,
    },
    List(Vec<ParseNode>),
    Group(Vec<ParseNode>),
    Absent,
}

impl ParseNode {
    /// Rule name of a [`ParseNode::Node`].
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Node { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Children of a node, list or group; empty for tokens and absent nodes.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Node { children, .. } | Self::List(children) | Self::Group(children) => children,
            Self::Token(_) | Self::Absent => &[],
        }
    }

    #[must_use]
    pub fn child(&self, index: usize) -> Option<&Self> {
        self.children().get(index)
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub const fn token(&self) -> Option<&Token> {
        match self {
            Self::Token(token) => Some(token),
            _ => None,
        }
    }

    /// Source text of a token node.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.token().map(|token| token.text.as_str())
    }

    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// S-expression rendering: `(Name a b)`, lists as `[a b]`, groups as
/// `{a b}` and absent nodes as `_`.
impl fmt::Display for ParseNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn sequence(f: &mut fmt::Formatter<'_>, nodes: &[ParseNode]) -> fmt::Result {
            for (index, node) in nodes.iter().enumerate() {
                if index > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{node}")?;
            }
            Ok(())
        }

        match self {
            Self::Token(token) => f.write_str(&token.text),
            Self::Node { name, children } => {
                write!(f, "({name}")?;
                if !children.is_empty() {
                    f.write_str(" ")?;
                    sequence(f, children)?;
                }
                f.write_str(")")
            }
            Self::List(items) => {
                f.write_str("[")?;
                sequence(f, items)?;
                f.write_str("]")
            }
            Self::Group(items) => {
                f.write_str("{")?;
                sequence(f, items)?;
                f.write_str("}")
            }
            Self::Absent => f.write_str("_"),
        }
    }
}

/// Builds [`ParseNode`] trees from production actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeBuilder;

impl NodeBuilder for TreeBuilder {
    type Node = ParseNode;

    fn terminal(&self, token: &Token) -> ParseNode {
        ParseNode::Token(token.clone())
    }

    fn reduce(&self, production: &BnfProduction, children: Vec<ParseNode>) -> ParseNode {
        match &production.action {
            Action::Node(name) => ParseNode::Node {
                name: name.clone(),
                children,
            },
            Action::PassThrough | Action::Accept => {
                children.into_iter().next().unwrap_or(ParseNode::Absent)
            }
            Action::Group => ParseNode::Group(children),
            Action::Absent => ParseNode::Absent,
            Action::ListEmpty => ParseNode::List(Vec::new()),
            Action::ListNew { separated } => {
                let step = if *separated { 2 } else { 1 };
                ParseNode::List(children.into_iter().step_by(step).collect())
            }
            Action::ListAppend { separated } => {
                let mut children = children.into_iter();
                let mut items = match children.next() {
                    Some(ParseNode::List(items)) => items,
                    Some(other) => vec![other],
                    None => Vec::new(),
                };
                items.extend(children.skip(usize::from(*separated)));
                ParseNode::List(items)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Element, NonterminalId, ProductionId, TokenId};
    use crate::index::Indexed;
    use crate::lexer::Position;
    use smallvec::SmallVec;

    fn production(action: Action) -> BnfProduction {
        BnfProduction {
            id: ProductionId::from_index(0),
            nonterminal: NonterminalId::from_index(0),
            elements: SmallVec::from_elem(Element::Terminal(TokenId::from_index(1)), 3),
            action,
        }
    }

    fn leaf(text: &str) -> ParseNode {
        ParseNode::Token(Token::new(TokenId::from_index(1), text, Position::start()))
    }

    #[test]
    fn separated_lists_drop_separators() {
        let builder = TreeBuilder;
        let new = builder.reduce(
            &production(Action::ListNew { separated: true }),
            vec![leaf("a"), leaf(","), leaf("b")],
        );
        assert_eq!(new.to_string(), "[a b]");
        let appended = builder.reduce(
            &production(Action::ListAppend { separated: true }),
            vec![new, leaf(","), leaf("c")],
        );
        assert_eq!(appended.to_string(), "[a b c]");
        assert_eq!(appended.as_list().map(<[ParseNode]>::len), Some(3));
    }

    #[test]
    fn named_nodes_and_pass_through() {
        let builder = TreeBuilder;
        let node = builder.reduce(
            &production(Action::Node("Call".into())),
            vec![leaf("f"), ParseNode::Absent, ParseNode::Group(vec![leaf("x")])],
        );
        assert_eq!(node.name(), Some("Call"));
        assert_eq!(node.to_string(), "(Call f _ {x})");
        assert!(node.child(1).is_some_and(ParseNode::is_absent));
        let inner = builder.reduce(&production(Action::PassThrough), vec![node.clone()]);
        assert_eq!(inner, node);
        assert_eq!(inner.child(0).and_then(ParseNode::text), Some("f"));
    }
}
