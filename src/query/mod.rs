//! Constraint trees
//!
//! A `Constraint` is the parsed form of a query. Compiling it against a chunk
//! produces two things:
//! - the ISR tree that enumerates matching documents
//! - term groups: one group per word sequence or phrase, holding fresh
//!   cursors for each literal word, used only by the ranker to rescan a
//!   matched document without disturbing the boolean cursors
//!
//! Words on the excluded side of an `AndNot` are not ranked.

use crate::index::{title_term, ChunkView};
use crate::isr::{Isr, PostingCursor};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Any of the words; a single word is a plain word match
    SequenceOfWords(Vec<String>),
    And(Box<Constraint>, Box<Constraint>),
    Or(Box<Constraint>, Box<Constraint>),
    /// The words at consecutive Locations
    Phrase(Vec<String>),
    /// Documents matching `include` that contain nothing matching `exclude`
    AndNot {
        include: Box<Constraint>,
        exclude: Box<Constraint>,
    },
}

impl Constraint {
    pub fn word(word: impl Into<String>) -> Self {
        Constraint::SequenceOfWords(vec![word.into()])
    }

    pub fn words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Constraint::SequenceOfWords(words.into_iter().map(Into::into).collect())
    }

    pub fn phrase<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Constraint::Phrase(words.into_iter().map(Into::into).collect())
    }

    pub fn and(left: Constraint, right: Constraint) -> Self {
        Constraint::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Constraint, right: Constraint) -> Self {
        Constraint::Or(Box::new(left), Box::new(right))
    }

    pub fn and_not(include: Constraint, exclude: Constraint) -> Self {
        Constraint::AndNot {
            include: Box::new(include),
            exclude: Box::new(exclude),
        }
    }

    /// The tree an unparsable query becomes; matches nothing
    pub fn empty() -> Self {
        Constraint::SequenceOfWords(Vec::new())
    }

    /// True if no literal word can ever match
    pub fn is_empty(&self) -> bool {
        match self {
            Constraint::SequenceOfWords(words) | Constraint::Phrase(words) => words.is_empty(),
            Constraint::And(left, right) => left.is_empty() || right.is_empty(),
            Constraint::Or(left, right) => left.is_empty() && right.is_empty(),
            Constraint::AndNot { include, .. } => include.is_empty(),
        }
    }

    /// Distinct literal words on the matching side, in query order
    pub fn literal_words(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_words(&mut out);
        out
    }

    fn collect_words<'q>(&'q self, out: &mut Vec<&'q str>) {
        match self {
            Constraint::SequenceOfWords(words) | Constraint::Phrase(words) => {
                for word in words {
                    if !out.contains(&word.as_str()) {
                        out.push(word);
                    }
                }
            }
            Constraint::And(left, right) | Constraint::Or(left, right) => {
                left.collect_words(out);
                right.collect_words(out);
            }
            Constraint::AndNot { include, .. } => include.collect_words(out),
        }
    }

    /// Build the ISR tree and ranking term groups for one chunk
    pub fn compile<'a>(&self, chunk: &ChunkView<'a>) -> Result<CompiledQuery<'a>> {
        let mut term_groups = Vec::new();
        let isr = self.eval(chunk, &mut term_groups, true)?;
        Ok(CompiledQuery { isr, term_groups })
    }

    fn eval<'a>(&self, chunk: &ChunkView<'a>, groups: &mut Vec<TermGroup<'a>>, rank: bool) -> Result<Isr<'a>> {
        match self {
            Constraint::SequenceOfWords(words) => {
                if rank && !words.is_empty() {
                    groups.push(TermGroup::new(chunk, GroupKind::Sequence, words)?);
                }
                match words.as_slice() {
                    [single] => Isr::word(chunk, single),
                    _ => Isr::or(chunk, word_isrs(chunk, words)?),
                }
            }
            Constraint::Phrase(words) => {
                if words.is_empty() {
                    return Isr::or(chunk, Vec::new());
                }
                if rank {
                    groups.push(TermGroup::new(chunk, GroupKind::Phrase, words)?);
                }
                Isr::phrase(chunk, word_isrs(chunk, words)?)
            }
            Constraint::And(..) => {
                let mut operands = Vec::new();
                self.flatten(&mut operands, |c| match c {
                    Constraint::And(l, r) => Some((l.as_ref(), r.as_ref())),
                    _ => None,
                });
                let children = operands
                    .into_iter()
                    .map(|c| c.eval(chunk, groups, rank))
                    .collect::<Result<Vec<_>>>()?;
                Isr::and(chunk, children)
            }
            Constraint::Or(..) => {
                let mut operands = Vec::new();
                self.flatten(&mut operands, |c| match c {
                    Constraint::Or(l, r) => Some((l.as_ref(), r.as_ref())),
                    _ => None,
                });
                let children = operands
                    .into_iter()
                    .map(|c| c.eval(chunk, groups, rank))
                    .collect::<Result<Vec<_>>>()?;
                Isr::or(chunk, children)
            }
            Constraint::AndNot { include, exclude } => {
                let include = include.eval(chunk, groups, rank)?;
                let exclude = exclude.eval(chunk, groups, false)?;
                Isr::and_not(chunk, vec![include], vec![exclude])
            }
        }
    }

    /// Collect the operands of a left/right-nested chain of the same operator
    fn flatten<'q, F>(&'q self, out: &mut Vec<&'q Constraint>, split: F)
    where
        F: Fn(&'q Constraint) -> Option<(&'q Constraint, &'q Constraint)> + Copy,
    {
        match split(self) {
            Some((left, right)) => {
                left.flatten(out, split);
                right.flatten(out, split);
            }
            None => out.push(self),
        }
    }
}

fn word_isrs<'a>(chunk: &ChunkView<'a>, words: &[String]) -> Result<Vec<Isr<'a>>> {
    words.iter().map(|w| Isr::word(chunk, w)).collect()
}

/// Output of `Constraint::compile`
#[derive(Debug)]
pub struct CompiledQuery<'a> {
    pub isr: Isr<'a>,
    pub term_groups: Vec<TermGroup<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Sequence,
    Phrase,
}

/// Ranking cursors for the words of one sequence or phrase
#[derive(Debug)]
pub struct TermGroup<'a> {
    pub kind: GroupKind,
    pub terms: Vec<RankTerm<'a>>,
}

impl<'a> TermGroup<'a> {
    fn new(chunk: &ChunkView<'a>, kind: GroupKind, words: &[String]) -> Result<Self> {
        let terms = words
            .iter()
            .map(|w| RankTerm::new(chunk, w))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { kind, terms })
    }
}

/// Independent cursors over one word's body and title postings
#[derive(Debug)]
pub struct RankTerm<'a> {
    pub body: PostingCursor<'a>,
    pub title: PostingCursor<'a>,
}

impl<'a> RankTerm<'a> {
    fn new(chunk: &ChunkView<'a>, word: &str) -> Result<Self> {
        Ok(Self {
            body: PostingCursor::new(chunk, word)?,
            title: PostingCursor::new(chunk, &title_term(word))?,
        })
    }

    pub fn word(&self) -> &str {
        self.body.term()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{ChunkReader, IndexChunk, IndexFile};
    use crate::isr::IsrNode;

    fn corpus() -> ChunkReader {
        let mut chunk = IndexChunk::with_strides(2, 2);
        let docs: [(&str, &str); 4] = [
            ("rust guide", "learn rust the hard way"),
            ("", "rust and go compared"),
            ("go tour", "a tour of go"),
            ("", "cooking with cast iron"),
        ];
        for (i, (title, body)) in docs.iter().enumerate() {
            chunk.add_url(&format!("http://site{}.com/", i), 0).unwrap();
            for word in title.split_whitespace() {
                chunk.add_word(word, true).unwrap();
            }
            for word in body.split_whitespace() {
                chunk.add_word(word, false).unwrap();
            }
            chunk.add_end_doc().unwrap();
        }
        ChunkReader::from_serialized(0, IndexFile::serialize(&chunk).unwrap()).unwrap()
    }

    fn documents(query: &Constraint, chunk: &ChunkReader) -> Vec<u64> {
        let view = chunk.view().unwrap();
        let mut isr = query.compile(&view).unwrap().isr;
        let mut out = Vec::new();
        let mut hit = isr.seek(0);
        while let Some(m) = hit {
            out.push(m.window.index);
            hit = isr.next_document();
        }
        out
    }

    #[test]
    fn test_sequence_is_or() {
        let chunk = corpus();
        assert_eq!(documents(&Constraint::word("rust"), &chunk), vec![0, 1]);
        assert_eq!(documents(&Constraint::words(["iron", "tour"]), &chunk), vec![2, 3]);
    }

    #[test]
    fn test_boolean_operators() {
        let chunk = corpus();
        let rust_and_go = Constraint::and(Constraint::word("rust"), Constraint::word("go"));
        assert_eq!(documents(&rust_and_go, &chunk), vec![1]);

        let chain = Constraint::and(
            Constraint::and(Constraint::word("a"), Constraint::word("tour")),
            Constraint::word("go"),
        );
        assert_eq!(documents(&chain, &chunk), vec![2]);

        let either = Constraint::or(Constraint::word("cooking"), Constraint::word("learn"));
        assert_eq!(documents(&either, &chunk), vec![0, 3]);

        let rust_not_go = Constraint::and_not(Constraint::word("rust"), Constraint::word("go"));
        assert_eq!(documents(&rust_not_go, &chunk), vec![0]);
    }

    #[test]
    fn test_phrase_and_title_words() {
        let chunk = corpus();
        assert_eq!(documents(&Constraint::phrase(["rust", "and", "go"]), &chunk), vec![1]);
        // Title words match like body words
        assert_eq!(documents(&Constraint::phrase(["go", "tour"]), &chunk), vec![2]);
        assert_eq!(documents(&Constraint::word("guide"), &chunk), vec![0]);
    }

    #[test]
    fn test_empty_queries_match_nothing() {
        let chunk = corpus();
        assert!(Constraint::empty().is_empty());
        assert!(documents(&Constraint::empty(), &chunk).is_empty());
        assert!(documents(&Constraint::phrase(Vec::<String>::new()), &chunk).is_empty());

        let half_empty = Constraint::and(Constraint::word("rust"), Constraint::empty());
        assert!(half_empty.is_empty());
        assert!(documents(&half_empty, &chunk).is_empty());
        assert!(!Constraint::or(Constraint::word("rust"), Constraint::empty()).is_empty());
    }

    #[test]
    fn test_compiled_node_shapes() {
        let chunk = corpus();
        let view = chunk.view().unwrap();
        let root = |query: Constraint| query.compile(&view).unwrap().isr;

        assert!(matches!(root(Constraint::word("rust")).node(), IsrNode::Word(_)));
        assert!(matches!(root(Constraint::words(["rust", "go"])).node(), IsrNode::Or(_)));
        assert!(matches!(root(Constraint::phrase(["go", "tour"])).node(), IsrNode::Phrase(_)));
        assert!(matches!(
            root(Constraint::and(Constraint::word("a"), Constraint::word("b"))).node(),
            IsrNode::And(_)
        ));
        assert!(matches!(
            root(Constraint::and_not(Constraint::word("a"), Constraint::word("b"))).node(),
            IsrNode::AndNot(_)
        ));
    }

    #[test]
    fn test_term_groups() {
        let chunk = corpus();
        let view = chunk.view().unwrap();
        let query = Constraint::and_not(
            Constraint::and(Constraint::words(["rust", "go"]), Constraint::phrase(["tour", "of"])),
            Constraint::word("cooking"),
        );

        let compiled = query.compile(&view).unwrap();
        let groups: Vec<(GroupKind, Vec<&str>)> = compiled
            .term_groups
            .iter()
            .map(|g| (g.kind, g.terms.iter().map(RankTerm::word).collect()))
            .collect();
        assert_eq!(
            groups,
            vec![
                (GroupKind::Sequence, vec!["rust", "go"]),
                (GroupKind::Phrase, vec!["tour", "of"]),
            ]
        );

        let rust = &compiled.term_groups[0].terms[0];
        // Title words are posted under both the word and its title term
        assert_eq!(rust.body.len(), 3);
        assert_eq!(rust.title.len(), 1);
        assert_eq!(query.literal_words(), vec!["rust", "go", "tour", "of"]);
    }
}
