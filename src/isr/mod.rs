//! Index Stream Readers
//!
//! An ISR is a forward-only cursor yielding `Match`es in increasing Location
//! order. Leaves read a single posting list; combinators own their children
//! and align them. Every match carries the window of the document it falls
//! in, so callers can jump to the next document without re-deriving
//! boundaries.
//!
//! Cursor contract:
//! - `seek(t)` returns the first match at or after `t`; seeking to or before
//!   the current match returns the current match
//! - `next()` is `seek(current + 1)`, or `seek(0)` before the first seek
//! - `next_document()` is `seek(window.end + 1)`
//! - once a seek returns `None` the ISR stays exhausted

mod combinators;
mod leaf;

pub use combinators::{AndNode, AndNotNode, OrNode, PhraseNode};
pub use leaf::{DocBoundaries, EndDocNode, PostingCursor, WordNode};

use crate::index::{ChunkView, Location};
use crate::Result;

/// Location span of one document: words in `[start, end)`, EndDoc at `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocWindow {
    pub index: u64,
    pub start: Location,
    pub end: Location,
}

impl DocWindow {
    pub fn contains(&self, location: Location) -> bool {
        location >= self.start && location < self.end
    }

    /// Number of word Locations in the document
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub location: Location,
    pub window: DocWindow,
}

#[derive(Debug)]
pub enum IsrNode<'a> {
    Word(WordNode<'a>),
    EndDoc(EndDocNode<'a>),
    And(AndNode<'a>),
    Or(OrNode<'a>),
    Phrase(PhraseNode<'a>),
    AndNot(AndNotNode<'a>),
}

#[derive(Debug)]
pub struct Isr<'a> {
    node: IsrNode<'a>,
    current: Option<Match>,
    exhausted: bool,
}

impl<'a> Isr<'a> {
    fn from_node(node: IsrNode<'a>) -> Self {
        Self {
            node,
            current: None,
            exhausted: false,
        }
    }

    pub fn word(chunk: &ChunkView<'a>, term: &str) -> Result<Self> {
        Ok(Self::from_node(IsrNode::Word(WordNode::new(chunk, term)?)))
    }

    pub fn end_doc(chunk: &ChunkView<'a>) -> Result<Self> {
        Ok(Self::from_node(IsrNode::EndDoc(EndDocNode::new(chunk)?)))
    }

    pub fn and(chunk: &ChunkView<'a>, children: Vec<Isr<'a>>) -> Result<Self> {
        Ok(Self::from_node(IsrNode::And(AndNode {
            children,
            docs: DocBoundaries::new(chunk)?,
        })))
    }

    pub fn or(chunk: &ChunkView<'a>, children: Vec<Isr<'a>>) -> Result<Self> {
        Ok(Self::from_node(IsrNode::Or(OrNode {
            children,
            docs: DocBoundaries::new(chunk)?,
        })))
    }

    pub fn phrase(chunk: &ChunkView<'a>, children: Vec<Isr<'a>>) -> Result<Self> {
        Ok(Self::from_node(IsrNode::Phrase(PhraseNode {
            children,
            docs: DocBoundaries::new(chunk)?,
        })))
    }

    /// Documents matching all of `include` and none of `exclude`
    pub fn and_not(chunk: &ChunkView<'a>, mut include: Vec<Isr<'a>>, exclude: Vec<Isr<'a>>) -> Result<Self> {
        let include = if include.len() == 1 {
            include.remove(0)
        } else {
            Self::and(chunk, include)?
        };
        Ok(Self::from_node(IsrNode::AndNot(AndNotNode {
            include: Box::new(include),
            exclude,
        })))
    }

    pub fn node(&self) -> &IsrNode<'a> {
        &self.node
    }

    pub fn current(&self) -> Option<Match> {
        self.current
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn seek(&mut self, target: Location) -> Option<Match> {
        if self.exhausted {
            return None;
        }
        if let Some(current) = self.current {
            if current.location >= target {
                return Some(current);
            }
        }

        let found = match &mut self.node {
            IsrNode::Word(node) => node.seek(target),
            IsrNode::EndDoc(node) => node.seek(target),
            IsrNode::And(node) => node.seek(target),
            IsrNode::Or(node) => node.seek(target),
            IsrNode::Phrase(node) => node.seek(target),
            IsrNode::AndNot(node) => node.seek(target),
        };

        self.current = found;
        self.exhausted = found.is_none();
        found
    }

    pub fn next(&mut self) -> Option<Match> {
        let target = match self.current {
            Some(current) => current.location.checked_add(1)?,
            None => 0,
        };
        self.seek(target)
    }

    pub fn next_document(&mut self) -> Option<Match> {
        let target = match self.current {
            Some(current) => current.window.end.checked_add(1)?,
            None => 0,
        };
        self.seek(target)
    }
}
