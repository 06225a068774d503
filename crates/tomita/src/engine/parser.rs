//! The reduce/shift loop of one parse run.

use crate::engine::ambiguity::{StackDerivation, prefer};
use crate::engine::stack::{ElementId, ParserStack, StackArena, StackId, StacksList};
use crate::engine::{EngineConfig, ParseOutput, ParseStats};
use crate::error::ParseError;
use crate::grammar::{ProductionId, TokenDescriptor};
use crate::index::Indexed;
use crate::lexer::{Position, Token, TokenStream};
use crate::table::{ParserConfiguration, StateId};
use crate::tree::{Action, NodeBuilder};
use log::{debug, trace};
use std::cmp::Ordering;
use std::time::Instant;

/// State of a single parse: the element arena and the stacks of the
/// current token position.
pub(crate) struct Run<'c> {
    configuration: &'c ParserConfiguration,
    config: &'c EngineConfig,
    arena: StackArena,
    frontier: StacksList,
    /// End of the last shifted token
    position: Position,
    stats: ParseStats,
}

impl<'c> Run<'c> {
    pub(crate) fn new(configuration: &'c ParserConfiguration, config: &'c EngineConfig) -> Self {
        Self {
            configuration,
            config,
            arena: StackArena::new(),
            frontier: StacksList::new(),
            position: Position::start(),
            stats: ParseStats::default(),
        }
    }

    pub(crate) fn parse<B, S>(
        mut self,
        start: StateId,
        tokens: &mut S,
        builder: &B,
    ) -> Result<ParseOutput<B::Node>, ParseError>
    where
        B: NodeBuilder,
        S: TokenStream + ?Sized,
    {
        let started = Instant::now();
        let root = self.arena.push_start(start);
        self.frontier.push(&self.arena, ParserStack::shifted(root));

        loop {
            self.reduce_all()?;
            let result = self.result_stack()?;
            let token = tokens.next_token()?;
            if token.is_eof()
                && let Some(result) = result
            {
                self.stats.end_position = token.position;
                self.stats.parse_time = started.elapsed();
                let root = self.build(result, builder)?;
                debug!(
                    "parsed {} tokens in {:?}: {} reductions, peak {} stacks, {} ambiguities resolved",
                    self.stats.tokens_consumed,
                    self.stats.parse_time,
                    self.stats.reductions,
                    self.stats.peak_stacks,
                    self.stats.ambiguities_resolved
                );
                return Ok(ParseOutput {
                    root,
                    stats: self.stats,
                });
            }
            self.shift(&token, result.is_some())?;
        }
    }

    /// Apply reductions to every live stack, including the ones reductions
    /// create, until nothing new appears.
    fn reduce_all(&mut self) -> Result<(), ParseError> {
        let configuration = self.configuration;
        let mut next = 0;
        while next < self.frontier.len() {
            let id = StackId::from_index(next);
            next += 1;
            let top = self.frontier.stack(id).top;
            let state = configuration.state(self.arena.node(top).state);
            // Final states reduce too: an accepted prefix may still be the
            // left part of a longer derivation. Only `Accept` is skipped.
            for &production in state.reduces() {
                if self.frontier.stack(id).deleted {
                    break;
                }
                self.reduce(id, production)?;
            }
        }
        Ok(())
    }

    fn reduce(&mut self, id: StackId, production: ProductionId) -> Result<(), ParseError> {
        let configuration = self.configuration;
        let production = configuration.production(production);
        if matches!(production.action, Action::Accept) {
            return Ok(());
        }

        let stack = self.frontier.stack(id);
        let (top, reduce_depth) = (stack.top, stack.reduce_depth);
        let Some((exposed, children)) = self.arena.pop(top, production.len()) else {
            return Err(ParseError::Internal(format!(
                "reducing `{}` pops below the start of the stack",
                configuration.grammar().describe_production(production.id)
            )));
        };
        let exposed_state = self.arena.node(exposed).state;
        let Some(target) = configuration
            .state(exposed_state)
            .goto(production.nonterminal)
        else {
            return Err(ParseError::Internal(format!(
                "{exposed_state} has no goto on {}",
                configuration.grammar().nonterminal(production.nonterminal).name
            )));
        };

        let element = self
            .arena
            .push_nonterminal(target, exposed, production.id, children);
        debug_assert_eq!(
            self.arena.node(element).depth + production.len(),
            self.arena.node(top).depth + 1
        );
        self.stats.reductions += 1;
        trace!(
            "reduce `{}` on {id}: {exposed_state} -> {target}",
            configuration.grammar().describe_production(production.id)
        );

        let reduce_depth = reduce_depth.saturating_sub(production.len()) + 1;
        self.offer(ParserStack::reduced(element, id, reduce_depth))
    }

    /// Add a reduced stack to the frontier, unless it duplicates, loops, or
    /// loses an ambiguity against a stack already there.
    fn offer(&mut self, candidate: ParserStack) -> Result<(), ParseError> {
        let Some(existing) = self.frontier.find_equal(&self.arena, candidate.top) else {
            if StacksList::is_cycled(&self.arena, candidate.top, candidate.reduce_depth) {
                debug!(
                    "rejected cycled stack ending in {} at {}",
                    self.arena.node(candidate.top).state,
                    self.position
                );
            } else {
                self.frontier.push(&self.arena, candidate);
            }
            return Ok(());
        };

        let existing_stack = self.frontier.stack(existing);
        if existing_stack.deleted {
            self.frontier.push(&self.arena, candidate);
            return Ok(());
        }
        if self
            .frontier
            .is_recursive(&self.arena, candidate.top, candidate.source)
        {
            debug!(
                "rejected recursive stack ending in {} at {}",
                self.arena.node(candidate.top).state,
                self.position
            );
            return Ok(());
        }

        let (kept, challenger) = self
            .arena
            .divergent_segments(existing_stack.top, candidate.top);
        if self.config.strict_ambiguity {
            return Err(ParseError::Ambiguity {
                position: self.position,
                alternatives: vec![self.describe(&kept), self.describe(&challenger)],
            });
        }

        self.stats.ambiguities_resolved += 1;
        let preference = prefer(
            StackDerivation::segment(&self.arena, &challenger),
            StackDerivation::segment(&self.arena, &kept),
        );
        if preference == Ordering::Greater {
            let deleted = self.frontier.delete_cascade(existing);
            debug!(
                "ambiguity at {}: {} replaces {} ({deleted} stacks deleted)",
                self.position,
                self.describe(&challenger),
                self.describe(&kept)
            );
            self.frontier.push(&self.arena, candidate);
        } else {
            debug!(
                "ambiguity at {}: kept {} over {}",
                self.position,
                self.describe(&kept),
                self.describe(&challenger)
            );
        }
        Ok(())
    }

    /// The live stack whose top state is final, if any.
    fn result_stack(&self) -> Result<Option<StackId>, ParseError> {
        let mut accepting = self
            .frontier
            .live()
            .filter(|(_, stack)| {
                self.configuration
                    .state(self.arena.node(stack.top).state)
                    .is_final()
            })
            .map(|(id, _)| id);
        let result = accepting.next();
        if let (Some(first), Some(second)) = (result, accepting.next()) {
            return Err(ParseError::Internal(format!(
                "stacks {first} and {second} are both accepting at {}",
                self.position
            )));
        }
        Ok(result)
    }

    /// Move every live stack that can shift `token` into a fresh frontier.
    fn shift(&mut self, token: &Token, accepted: bool) -> Result<(), ParseError> {
        let configuration = self.configuration;
        let targets: Vec<(ElementId, StateId)> = self
            .frontier
            .live()
            .filter_map(|(_, stack)| {
                configuration
                    .state(self.arena.node(stack.top).state)
                    .shift(token.kind)
                    .map(|target| (stack.top, target))
            })
            .collect();
        if targets.is_empty() {
            return Err(self.syntax_error(token, accepted));
        }

        trace!(
            "shift {} at {} on {} stack(s)",
            self.found(token),
            token.position,
            targets.len()
        );
        self.frontier.clear();
        for (top, target) in targets {
            let element = self.arena.push_terminal(target, top, token.clone());
            self.frontier.push(&self.arena, ParserStack::shifted(element));
        }
        self.stats.tokens_consumed += 1;
        self.stats.peak_stacks = self.stats.peak_stacks.max(self.frontier.len());
        self.position = token.end();
        Ok(())
    }

    fn syntax_error(&self, token: &Token, accepted: bool) -> ParseError {
        let tokens = self.configuration.tokens();
        let mut expected: Vec<TokenDescriptor> = self
            .frontier
            .live()
            .flat_map(|(_, stack)| {
                self.configuration
                    .state(self.arena.node(stack.top).state)
                    .shifts()
            })
            .map(|shift| tokens.descriptor(shift.token).clone())
            .collect();
        if accepted {
            expected.push(TokenDescriptor::Eof);
        }
        expected.sort();
        expected.dedup();

        if token.is_eof() {
            ParseError::UnexpectedEof {
                position: token.position,
                expected,
            }
        } else {
            ParseError::UnexpectedToken {
                found: self.found(token),
                position: token.position,
                expected,
            }
        }
    }

    /// `"else"` for literals, ``<identifier> `x` `` for token classes.
    fn found(&self, token: &Token) -> String {
        match self.configuration.tokens().get_descriptor(token.kind) {
            Some(descriptor) if descriptor.is_literal() => descriptor.to_string(),
            Some(descriptor) => format!("{descriptor} `{}`", token.text),
            None => format!("token `{}`", token.text),
        }
    }

    /// S-expression dump of a stack segment for diagnostics.
    fn describe(&self, segment: &[ElementId]) -> String {
        let grammar = self.configuration.grammar();
        segment
            .iter()
            .filter_map(|&element| {
                self.arena.fold(
                    element,
                    |token| token.text.to_string(),
                    |production, children| {
                        let name = &grammar
                            .nonterminal(grammar.production(production).nonterminal)
                            .name;
                        if children.is_empty() {
                            format!("({name})")
                        } else {
                            format!("({name} {})", children.join(" "))
                        }
                    },
                )
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build<B: NodeBuilder>(&self, result: StackId, builder: &B) -> Result<B::Node, ParseError> {
        let grammar = self.configuration.grammar();
        self.arena
            .fold(
                self.frontier.stack(result).top,
                |token| builder.terminal(token),
                |production, children| builder.reduce(grammar.production(production), children),
            )
            .ok_or_else(|| ParseError::Internal("accepting stack holds no derivation".into()))
    }
}
