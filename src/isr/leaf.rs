//! Leaf cursors over single posting lists

use super::{DocWindow, Match};
use crate::index::{ChunkView, Location};
use crate::storage::{PostingListView, SeekResult};
use crate::Result;

/// Forward-only cursor over one posting list
///
/// A list that turns out to be corrupt mid-query is logged once and then
/// behaves as exhausted.
#[derive(Debug, Clone)]
pub struct PostingCursor<'a> {
    term: String,
    list: Option<PostingListView<'a>>,
    current: Option<SeekResult>,
    exhausted: bool,
}

impl<'a> PostingCursor<'a> {
    pub fn new(chunk: &ChunkView<'a>, term: &str) -> Result<Self> {
        Ok(Self::from_list(term, chunk.postings(term)?))
    }

    pub fn from_list(term: &str, list: Option<PostingListView<'a>>) -> Self {
        Self {
            term: term.to_string(),
            exhausted: list.map_or(true, |l| l.is_empty()),
            list,
            current: None,
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// Postings in the whole chunk
    pub fn len(&self) -> u64 {
        self.list.map_or(0, |l| l.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn current(&self) -> Option<SeekResult> {
        self.current
    }

    /// First posting at or after `target`; never moves backward
    pub fn seek(&mut self, target: Location) -> Option<SeekResult> {
        if self.exhausted {
            return None;
        }
        if let Some(current) = self.current {
            if current.location >= target {
                return Some(current);
            }
        }
        let list = self.list?;

        match list.find_after(target, self.current.as_ref()) {
            Ok(Some(hit)) => {
                self.current = Some(hit);
                Some(hit)
            }
            Ok(None) => {
                self.current = None;
                self.exhausted = true;
                None
            }
            Err(e) => {
                log::warn!("[PostingCursor] corrupt posting list for {:?}, treating as exhausted: {}", self.term, e);
                self.current = None;
                self.exhausted = true;
                None
            }
        }
    }

    /// Every posting in `[start, end)`, in order
    pub fn collect_range(&mut self, start: Location, end: Location) -> Vec<Location> {
        let mut out = Vec::new();
        let mut hit = self.seek(start);
        while let Some(h) = hit {
            if h.location >= end {
                break;
            }
            out.push(h.location);
            hit = self.seek(h.location + 1);
        }
        out
    }
}

/// Maps Locations to the document window containing them
///
/// Backed by the EndDoc list. Unlike an ISR it may be asked about an
/// earlier Location, in which case it restarts the lookup from the list.
#[derive(Debug, Clone)]
pub struct DocBoundaries<'a> {
    list: Option<PostingListView<'a>>,
    cached: Option<SeekResult>,
}

impl<'a> DocBoundaries<'a> {
    pub fn new(chunk: &ChunkView<'a>) -> Result<Self> {
        Ok(Self {
            list: chunk.end_docs()?,
            cached: None,
        })
    }

    /// Window of the document containing `location`
    pub fn window_for(&mut self, location: Location) -> Option<DocWindow> {
        let list = self.list?;

        if let Some(cached) = self.cached {
            let start = cached.previous.map_or(0, |p| p + 1);
            if location >= start && location <= cached.location {
                return Some(window_of(&cached));
            }
        }
        let from = self.cached.filter(|c| c.location < location);

        match list.find_after(location, from.as_ref()) {
            Ok(Some(end)) => {
                self.cached = Some(end);
                Some(window_of(&end))
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("[DocBoundaries] corrupt EndDoc list: {}", e);
                self.list = None;
                None
            }
        }
    }
}

fn window_of(end: &SeekResult) -> DocWindow {
    DocWindow {
        index: end.index,
        start: end.previous.map_or(0, |p| p + 1),
        end: end.location,
    }
}

/// Occurrences of one word, each reported with its document window
#[derive(Debug, Clone)]
pub struct WordNode<'a> {
    postings: PostingCursor<'a>,
    docs: DocBoundaries<'a>,
}

impl<'a> WordNode<'a> {
    pub fn new(chunk: &ChunkView<'a>, term: &str) -> Result<Self> {
        Ok(Self {
            postings: PostingCursor::new(chunk, term)?,
            docs: DocBoundaries::new(chunk)?,
        })
    }

    pub fn term(&self) -> &str {
        self.postings.term()
    }

    pub fn posting_count(&self) -> u64 {
        self.postings.len()
    }

    pub(super) fn seek(&mut self, target: Location) -> Option<Match> {
        let hit = self.postings.seek(target)?;
        let window = self.docs.window_for(hit.location)?;
        Some(Match {
            location: hit.location,
            window,
        })
    }
}

/// Document boundaries themselves; each match is an EndDoc Location
#[derive(Debug, Clone)]
pub struct EndDocNode<'a> {
    ends: PostingCursor<'a>,
}

impl<'a> EndDocNode<'a> {
    pub fn new(chunk: &ChunkView<'a>) -> Result<Self> {
        Ok(Self {
            ends: PostingCursor::from_list(crate::index::END_DOC_TERM, chunk.end_docs()?),
        })
    }

    pub(super) fn seek(&mut self, target: Location) -> Option<Match> {
        let end = self.ends.seek(target)?;
        Some(Match {
            location: end.location,
            window: window_of(&end),
        })
    }
}
