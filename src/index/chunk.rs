//! Build-time accumulator for one index chunk
//!
//! Documents are fed in order: `add_url`, any number of `add_word`, then
//! `add_end_doc`. Every call that records a posting consumes one Location,
//! so Locations are dense and strictly increasing across the chunk.

use super::{title_term, Location, END_DOC_TERM};
use crate::config::{IndexConfig, StaticRankWeights};
use crate::rank::static_rank;
use crate::storage::{DocumentDirectoryBuilder, PostingListBuilder};
use crate::{IndexError, Result};
use ahash::AHashMap;

pub struct IndexChunk {
    posting_stride: usize,
    /// term -> slot in `postings`
    terms: AHashMap<String, usize>,
    postings: Vec<(String, PostingListBuilder)>,
    documents: DocumentDirectoryBuilder,
    next_location: Location,
    open_document: bool,
    end_docs: u64,
    static_weights: StaticRankWeights,
}

impl IndexChunk {
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            static_weights: config.static_rank,
            ..Self::with_strides(config.posting_seek_stride, config.doc_seek_stride)
        }
    }

    pub fn with_strides(posting_stride: usize, doc_stride: usize) -> Self {
        Self {
            posting_stride: posting_stride.max(1),
            terms: AHashMap::new(),
            postings: Vec::new(),
            documents: DocumentDirectoryBuilder::new(doc_stride),
            next_location: 0,
            open_document: false,
            end_docs: 0,
            static_weights: StaticRankWeights::default(),
        }
    }

    /// Start a new document, returning its index within the chunk
    pub fn add_url(&mut self, url: &str, static_rank: u64) -> Result<u64> {
        if self.open_document {
            return Err(IndexError::InvalidArgument(format!(
                "add_url({:?}) while document {} is still open",
                url,
                self.documents.len() - 1
            )));
        }
        self.open_document = true;
        Ok(self.documents.add(url, static_rank))
    }

    /// Record one word of the open document
    ///
    /// Title words are also posted under their title-section term at the
    /// same Location.
    pub fn add_word(&mut self, word: &str, is_title: bool) -> Result<Location> {
        self.require_open("add_word")?;
        check_word(word)?;

        let location = self.next_location;
        self.post(word, location)?;
        if is_title {
            self.post(&title_term(word), location)?;
        }
        self.next_location += 1;
        Ok(location)
    }

    /// Close the open document, returning the Location of its EndDoc posting
    pub fn add_end_doc(&mut self) -> Result<Location> {
        self.require_open("add_end_doc")?;
        let location = self.next_location;
        self.post(END_DOC_TERM, location)?;
        self.next_location += 1;
        self.end_docs += 1;
        self.open_document = false;
        Ok(location)
    }

    /// Add a whole document, ranking it with the chunk's static rank weights
    ///
    /// Every word is checked before anything is recorded, so a rejected
    /// document leaves the chunk unchanged.
    pub fn add_document(&mut self, url: &str, title: &[&str], body: &[&str]) -> Result<u64> {
        for word in title.iter().chain(body) {
            check_word(word)?;
        }

        let rank = static_rank(url, body.len() as u64, &self.static_weights);
        let index = self.add_url(url, rank)?;
        for word in title {
            self.add_word(word, true)?;
        }
        for word in body {
            self.add_word(word, false)?;
        }
        self.add_end_doc()?;
        Ok(index)
    }

    fn require_open(&self, op: &str) -> Result<()> {
        if self.open_document {
            Ok(())
        } else {
            Err(IndexError::InvalidArgument(format!("{} without an open document (call add_url first)", op)))
        }
    }

    fn post(&mut self, term: &str, location: Location) -> Result<()> {
        let slot = match self.terms.get(term) {
            Some(&slot) => slot,
            None => {
                let slot = self.postings.len();
                self.postings
                    .push((term.to_string(), PostingListBuilder::new(self.posting_stride)));
                self.terms.insert(term.to_string(), slot);
                slot
            }
        };
        let document = self.documents.len().saturating_sub(1);
        self.postings[slot].1.add_post(location, document)
    }

    /// Next Location to be assigned
    pub fn location(&self) -> Location {
        self.next_location
    }

    pub fn document_count(&self) -> u64 {
        self.documents.len()
    }

    /// Distinct terms, including title and EndDoc pseudo-terms
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn has_open_document(&self) -> bool {
        self.open_document
    }

    /// Posting count for `term`, 0 if never seen
    pub fn term_frequency(&self, term: &str) -> u64 {
        self.terms
            .get(term)
            .map(|&slot| self.postings[slot].1.len())
            .unwrap_or(0)
    }

    /// Number of documents containing `term`, 0 if never seen
    pub fn document_frequency(&self, term: &str) -> u64 {
        self.terms
            .get(term)
            .map(|&slot| self.postings[slot].1.document_frequency())
            .unwrap_or(0)
    }

    /// Fail unless every document has been closed by exactly one EndDoc
    pub(crate) fn check_complete(&self) -> Result<()> {
        if self.open_document || self.end_docs != self.documents.len() {
            return Err(IndexError::InvalidData(format!(
                "{} documents but {} EndDoc postings",
                self.documents.len(),
                self.end_docs
            )));
        }
        Ok(())
    }

    pub(crate) fn documents(&self) -> &DocumentDirectoryBuilder {
        &self.documents
    }

    pub(crate) fn postings(&self) -> impl Iterator<Item = (&str, &PostingListBuilder)> {
        self.postings.iter().map(|(term, list)| (term.as_str(), list))
    }
}

fn check_word(word: &str) -> Result<()> {
    if word.is_empty() {
        return Err(IndexError::InvalidArgument("empty word".into()));
    }
    if word.chars().any(char::is_control) {
        return Err(IndexError::InvalidArgument(format!(
            "word {:?} contains control characters",
            word
        )));
    }
    Ok(())
}

impl Default for IndexChunk {
    fn default() -> Self {
        Self::new(&IndexConfig::default())
    }
}

impl std::fmt::Debug for IndexChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexChunk")
            .field("documents", &self.documents.len())
            .field("terms", &self.postings.len())
            .field("next_location", &self.next_location)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{ChunkReader, IndexFile};

    #[test]
    fn test_locations_are_dense() {
        let mut chunk = IndexChunk::with_strides(4, 2);
        chunk.add_url("http://a", 0).unwrap();
        assert_eq!(chunk.add_word("apple", false).unwrap(), 0);
        assert_eq!(chunk.add_word("pie", true).unwrap(), 1);
        assert_eq!(chunk.add_end_doc().unwrap(), 2);

        chunk.add_url("http://b", 0).unwrap();
        assert_eq!(chunk.add_word("apple", false).unwrap(), 3);
        assert_eq!(chunk.add_end_doc().unwrap(), 4);

        assert_eq!(chunk.location(), 5);
        assert_eq!(chunk.document_count(), 2);
        assert_eq!(chunk.term_frequency("apple"), 2);
        assert_eq!(chunk.term_frequency("pie"), 1);
        assert_eq!(chunk.term_frequency("pie!"), 1);
        assert_eq!(chunk.term_frequency(END_DOC_TERM), 2);
        assert!(chunk.check_complete().is_ok());
    }

    #[test]
    fn test_document_frequency_counts_documents_once() {
        let mut chunk = IndexChunk::with_strides(4, 2);
        chunk.add_document("http://a", &["tea"], &["tea", "and", "tea"]).unwrap();
        chunk.add_document("http://b", &[], &["coffee"]).unwrap();
        chunk.add_document("http://c", &[], &["tea"]).unwrap();

        // Title occurrences share the body term
        assert_eq!(chunk.term_frequency("tea"), 4);
        assert_eq!(chunk.document_frequency("tea"), 2);
        assert_eq!(chunk.document_frequency("tea!"), 1);
        assert_eq!(chunk.document_frequency("coffee"), 1);
        assert_eq!(chunk.document_frequency(END_DOC_TERM), 3);
        assert_eq!(chunk.document_frequency("absent"), 0);
    }

    #[test]
    fn test_add_document_static_rank() {
        let config = IndexConfig::for_testing();
        let mut chunk = IndexChunk::new(&config);
        let body = vec!["word"; 300];
        assert_eq!(chunk.add_document("http://a.io/", &["title"], &body).unwrap(), 0);
        assert!(!chunk.has_open_document());
        assert!(chunk.check_complete().is_ok());

        let expected = static_rank("http://a.io/", 300, &config.static_rank);
        let reader = ChunkReader::from_serialized(0, IndexFile::serialize(&chunk).unwrap()).unwrap();
        let doc = reader.view().unwrap().find_doc(0).unwrap().unwrap();
        assert_eq!(doc.static_rank, expected);

        // A bad word rejects the document before anything is recorded
        assert!(chunk.add_document("http://b.io/", &[], &["ok", "bad\u{1}"]).is_err());
        assert!(!chunk.has_open_document());
        assert_eq!(chunk.document_count(), 1);
        assert_eq!(chunk.location(), 302);
    }

    #[test]
    fn test_sequencing_errors() {
        let mut chunk = IndexChunk::default();
        assert!(chunk.add_word("orphan", false).is_err());
        assert!(chunk.add_end_doc().is_err());

        chunk.add_url("http://a", 0).unwrap();
        assert!(chunk.has_open_document());
        assert!(chunk.add_url("http://b", 0).is_err());
        assert!(chunk.check_complete().is_err());

        chunk.add_end_doc().unwrap();
        assert!(chunk.check_complete().is_ok());
    }

    #[test]
    fn test_rejects_reserved_words() {
        let mut chunk = IndexChunk::default();
        chunk.add_url("http://a", 0).unwrap();
        assert!(chunk.add_word("", false).is_err());
        assert!(chunk.add_word(END_DOC_TERM, false).is_err());
        assert!(chunk.add_word("nul\0byte", false).is_err());
        // A rejected word does not consume a Location
        assert_eq!(chunk.add_word("ok", false).unwrap(), 0);
    }
}
