//! Composite ISRs: AND, OR, PHRASE, AND-NOT
//!
//! Children are owned by value and only ever sought forward. A combinator
//! reports exhaustion as soon as any child it needs is exhausted.

use super::leaf::DocBoundaries;
use super::{Isr, Match};
use crate::index::Location;

/// Documents containing every child
#[derive(Debug)]
pub struct AndNode<'a> {
    pub(super) children: Vec<Isr<'a>>,
    pub(super) docs: DocBoundaries<'a>,
}

impl<'a> AndNode<'a> {
    /// Fixed point: all children inside the window of the farthest one
    pub(super) fn seek(&mut self, target: Location) -> Option<Match> {
        if self.children.is_empty() {
            return None;
        }

        let mut farthest = target;
        for child in &mut self.children {
            farthest = farthest.max(child.seek(target)?.location);
        }

        'align: loop {
            let window = self.docs.window_for(farthest)?;
            let mut nearest = Location::MAX;

            for child in &mut self.children {
                let hit = child.seek(window.start)?;
                if !window.contains(hit.location) {
                    farthest = hit.location;
                    continue 'align;
                }
                nearest = nearest.min(hit.location);
            }

            return Some(Match {
                location: nearest,
                window,
            });
        }
    }
}

/// Documents containing any child
#[derive(Debug)]
pub struct OrNode<'a> {
    pub(super) children: Vec<Isr<'a>>,
    pub(super) docs: DocBoundaries<'a>,
}

impl<'a> OrNode<'a> {
    pub(super) fn seek(&mut self, target: Location) -> Option<Match> {
        let nearest = self
            .children
            .iter_mut()
            .filter_map(|child| child.seek(target))
            .map(|hit| hit.location)
            .min()?;
        let window = self.docs.window_for(nearest)?;
        Some(Match {
            location: nearest,
            window,
        })
    }
}

/// Children at consecutive Locations, in child order
///
/// Child `i` is compared by its phrase-relative position `location - i`.
/// The match Location is that of the first child.
#[derive(Debug)]
pub struct PhraseNode<'a> {
    pub(super) children: Vec<Isr<'a>>,
    pub(super) docs: DocBoundaries<'a>,
}

impl<'a> PhraseNode<'a> {
    pub(super) fn seek(&mut self, target: Location) -> Option<Match> {
        if self.children.is_empty() {
            return None;
        }

        let mut anchor = target;
        for (i, child) in self.children.iter_mut().enumerate() {
            let offset = i as Location;
            let hit = child.seek(target.saturating_add(offset))?;
            anchor = anchor.max(hit.location - offset);
        }

        'align: loop {
            for (i, child) in self.children.iter_mut().enumerate() {
                let offset = i as Location;
                let wanted = anchor.checked_add(offset)?;
                let hit = child.seek(wanted)?;
                if hit.location > wanted {
                    anchor = hit.location - offset;
                    continue 'align;
                }
            }
            break;
        }

        let window = self.docs.window_for(anchor)?;
        Some(Match {
            location: anchor,
            window,
        })
    }
}

/// Documents matching `include` with no occurrence of any excluded child
#[derive(Debug)]
pub struct AndNotNode<'a> {
    pub(super) include: Box<Isr<'a>>,
    pub(super) exclude: Vec<Isr<'a>>,
}

impl<'a> AndNotNode<'a> {
    pub(super) fn seek(&mut self, target: Location) -> Option<Match> {
        let mut target = target;
        loop {
            let hit = self.include.seek(target)?;
            let window = hit.window;

            let excluded = self.exclude.iter_mut().any(|child| {
                child
                    .seek(window.start)
                    .is_some_and(|x| window.contains(x.location))
            });
            if !excluded {
                return Some(hit);
            }
            target = window.end.checked_add(1)?;
        }
    }
}
