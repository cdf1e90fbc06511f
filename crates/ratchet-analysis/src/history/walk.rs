//! Lazy, paged, restartable first-parent commit sequence.

use std::collections::VecDeque;

use ratchet_core::errors::HistoryError;
use ratchet_core::types::CommitRecord;

use super::collaborator::GitCollaborator;

/// Pages commits from the collaborator on demand. Each page continues from
/// the first parent of the previous page's last commit, so history is
/// never re-walked.
pub struct CommitWalk<'a> {
    git: &'a dyn GitCollaborator,
    next_from: Option<String>,
    buffer: VecDeque<CommitRecord>,
    page_size: usize,
    yielded: usize,
}

impl<'a> CommitWalk<'a> {
    pub fn new(git: &'a dyn GitCollaborator, from_ref: &str, page_size: usize) -> Self {
        Self {
            git,
            next_from: Some(from_ref.to_string()),
            buffer: VecDeque::new(),
            page_size: page_size.max(1),
            yielded: 0,
        }
    }

    /// Start over from `from_ref`.
    pub fn restart(&mut self, from_ref: &str) {
        self.next_from = Some(from_ref.to_string());
        self.buffer.clear();
        self.yielded = 0;
    }

    /// Commits returned so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    fn fill(&mut self) -> Result<(), HistoryError> {
        if !self.buffer.is_empty() {
            return Ok(());
        }
        let Some(from) = self.next_from.take() else {
            return Ok(());
        };
        let page = self.git.log(&from, self.page_size)?;
        tracing::debug!(from = %from, commits = page.len(), "fetched history page");

        if page.len() == self.page_size {
            self.next_from = page.last().and_then(|c| c.parents.first().cloned());
        }
        self.buffer.extend(page);
        Ok(())
    }

    /// The next commit without consuming it.
    pub fn peek(&mut self) -> Result<Option<&CommitRecord>, HistoryError> {
        self.fill()?;
        Ok(self.buffer.front())
    }

    pub fn next_commit(&mut self) -> Result<Option<CommitRecord>, HistoryError> {
        self.fill()?;
        let next = self.buffer.pop_front();
        if next.is_some() {
            self.yielded += 1;
        }
        Ok(next)
    }
}

impl Iterator for CommitWalk<'_> {
    type Item = Result<CommitRecord, HistoryError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_commit() {
            Ok(next) => next.map(Ok),
            Err(e) => {
                self.next_from = None;
                self.buffer.clear();
                Some(Err(e))
            }
        }
    }
}
