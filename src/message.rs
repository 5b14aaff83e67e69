//! Typed messages on top of the page assembler.

use crate::error::Result;
use crate::grammar::PageGrammar;
use crate::page::{Page, PageReader};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::marker::PhantomData;
use std::path::Path;

/// A message type decoded from one assembled page.
pub trait Message: Sized {
    /// Grammar the pages of this message type follow.
    fn grammar() -> &'static PageGrammar;

    /// Decode the fields of a page.
    fn from_page(page: Page) -> Result<Self>;
}

/// Lazily reads typed messages of type `M`.
///
/// Like the underlying [`PageReader`], the first error ends the sequence.
pub struct MessageReader<R, M> {
    pages: PageReader<R>,
    failed: bool,
    message: PhantomData<fn() -> M>,
}

impl<M: Message> MessageReader<BufReader<File>, M> {
    /// Open a file of messages.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_pages(PageReader::open(path, M::grammar())?))
    }
}

impl<R: BufRead, M: Message> MessageReader<R, M> {
    pub fn new(reader: R) -> Self {
        Self::from_pages(PageReader::new(reader, M::grammar()))
    }

    fn from_pages(pages: PageReader<R>) -> Self {
        MessageReader {
            pages,
            failed: false,
            message: PhantomData,
        }
    }

    /// Read the next message, `None` at the end of the input.
    pub fn read(&mut self) -> Result<Option<M>> {
        if self.failed {
            return Ok(None);
        }
        let decoded = match self.pages.read() {
            Ok(Some(page)) => M::from_page(page).map(Some),
            other => other.map(|_| None),
        };
        self.failed = decoded.is_err();
        decoded
    }

    /// Read every remaining message.
    pub fn read_all(self) -> Result<Vec<M>> {
        self.collect()
    }
}

impl<R: BufRead, M: Message> Iterator for MessageReader<R, M> {
    type Item = Result<M>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read().transpose()
    }
}
