//! A small path-query language evaluated over a parsed HTML tree
//!
//! Supported syntax:
//!
//! - `/name` selects matching element children of the context
//! - `//name` selects matching elements anywhere below the context
//! - `*` matches any element name
//! - `[@attr]`, `[@attr="v"]`, `[contains(@attr, "v")]` filter on attributes
//! - `[n]` keeps the n-th match (1-based) under each parent
//!
//! Results are returned in document order without duplicates.

use super::ExtractError;
use ego_tree::{NodeId, NodeRef};
use scraper::{Html, Node};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Any,
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    HasAttr(String),
    AttrEquals(String, String),
    AttrContains(String, String),
    Position(usize),
}

impl Predicate {
    fn matches(&self, node: &NodeRef<'_, Node>) -> bool {
        let Some(element) = node.value().as_element() else {
            return false;
        };

        match self {
            Self::HasAttr(name) => element.attr(name).is_some(),
            Self::AttrEquals(name, value) => element.attr(name) == Some(value.as_str()),
            Self::AttrContains(name, value) => {
                element.attr(name).is_some_and(|v| v.contains(value.as_str()))
            }
            Self::Position(_) => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NameTest,
    predicates: Vec<Predicate>,
}

impl Step {
    /// Applies the name test and predicates to the children of one parent
    fn apply<'a>(&self, parent: NodeRef<'a, Node>) -> Vec<NodeRef<'a, Node>> {
        let mut current: Vec<NodeRef<'a, Node>> = parent
            .children()
            .filter(|child| self.test_name(child))
            .collect();

        for predicate in &self.predicates {
            current = match predicate {
                Predicate::Position(n) => current.get(n - 1).copied().into_iter().collect(),
                other => current.into_iter().filter(|c| other.matches(c)).collect(),
            };
        }

        current
    }

    fn test_name(&self, node: &NodeRef<'_, Node>) -> bool {
        match (node.value().as_element(), &self.test) {
            (Some(_), NameTest::Any) => true,
            (Some(element), NameTest::Name(name)) => element.name().eq_ignore_ascii_case(name),
            (None, _) => false,
        }
    }
}

/// A parsed path query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathQuery {
    source: String,
    steps: Vec<Step>,
}

impl PathQuery {
    /// Parses a query, rejecting anything outside the supported subset
    pub fn parse(query: &str) -> Result<Self, ExtractError> {
        let mut cursor = Cursor::new(query);
        cursor.skip_ws();

        if cursor.at_end() {
            return Err(cursor.error("query is empty"));
        }
        if cursor.peek() != Some('/') {
            return Err(cursor.error("query must start with '/' or '//'"));
        }

        let mut steps = Vec::new();
        while !cursor.at_end() {
            steps.push(cursor.step()?);
            cursor.skip_ws();
        }

        Ok(Self {
            source: query.to_string(),
            steps,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluates the query against a document
    pub fn select(&self, document: &Html) -> Vec<NodeId> {
        let mut context: Vec<NodeRef<'_, Node>> = vec![document.tree.root()];

        for step in &self.steps {
            let mut seen = HashSet::new();
            let mut next = Vec::new();

            for node in &context {
                let parents: Vec<NodeRef<'_, Node>> = match step.axis {
                    Axis::Child => vec![*node],
                    Axis::Descendant => node.descendants().collect(),
                };

                for parent in parents {
                    for matched in step.apply(parent) {
                        if seen.insert(matched.id()) {
                            next.push(matched);
                        }
                    }
                }
            }

            context = next;
        }

        let order: HashMap<NodeId, usize> = document
            .tree
            .root()
            .descendants()
            .enumerate()
            .map(|(index, node)| (node.id(), index))
            .collect();

        let mut ids: Vec<NodeId> = context.iter().map(|node| node.id()).collect();
        ids.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
        ids
    }
}

struct Cursor<'q> {
    query: &'q str,
    chars: Vec<char>,
    pos: usize,
}

impl<'q> Cursor<'q> {
    fn new(query: &'q str) -> Self {
        Self {
            query,
            chars: query.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), ExtractError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", c)))
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn error(&self, message: &str) -> ExtractError {
        ExtractError::InvalidQuery {
            query: self.query.to_string(),
            message: format!("{} at position {}", message, self.pos),
        }
    }

    fn name(&mut self) -> Option<String> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.pos += 1,
            _ => return None,
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            self.pos += 1;
        }
        Some(self.chars[start..self.pos].iter().collect::<String>().to_ascii_lowercase())
    }

    fn number(&mut self) -> Option<usize> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.chars[start..self.pos]
            .iter()
            .collect::<String>()
            .parse()
            .ok()
    }

    fn string(&mut self) -> Result<String, ExtractError> {
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("expected quoted string")),
        };
        self.pos += 1;

        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == quote {
                let value = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                return Ok(value);
            }
            self.pos += 1;
        }

        Err(self.error("unterminated string"))
    }

    fn step(&mut self) -> Result<Step, ExtractError> {
        self.expect('/')?;
        let axis = if self.eat('/') {
            Axis::Descendant
        } else {
            Axis::Child
        };

        let test = if self.eat('*') {
            NameTest::Any
        } else {
            match self.name() {
                Some(name) => NameTest::Name(name),
                None => return Err(self.error("expected element name or '*'")),
            }
        };

        let mut predicates = Vec::new();
        while self.eat('[') {
            self.skip_ws();
            predicates.push(self.predicate()?);
            self.skip_ws();
            self.expect(']')?;
        }

        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn predicate(&mut self) -> Result<Predicate, ExtractError> {
        if self.eat('@') {
            let attr = self
                .name()
                .ok_or_else(|| self.error("expected attribute name"))?;
            self.skip_ws();
            if self.eat('=') {
                self.skip_ws();
                let value = self.string()?;
                return Ok(Predicate::AttrEquals(attr, value));
            }
            return Ok(Predicate::HasAttr(attr));
        }

        if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            return match self.number() {
                Some(n) if n >= 1 => Ok(Predicate::Position(n)),
                _ => Err(self.error("position must be a positive integer")),
            };
        }

        match self.name().as_deref() {
            Some("contains") => {
                self.skip_ws();
                self.expect('(')?;
                self.skip_ws();
                self.expect('@')?;
                let attr = self
                    .name()
                    .ok_or_else(|| self.error("expected attribute name"))?;
                self.skip_ws();
                self.expect(',')?;
                self.skip_ws();
                let value = self.string()?;
                self.skip_ws();
                self.expect(')')?;
                Ok(Predicate::AttrContains(attr, value))
            }
            Some(other) => Err(self.error(&format!("unsupported function '{}'", other))),
            None => Err(self.error("expected predicate")),
        }
    }
}
