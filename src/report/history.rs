use serde::Serialize;

use super::ReportContent;

/// Reports produced during one run, owned by the caller.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ReportHistory {
    entries: Vec<ReportContent>,
}

impl ReportHistory {
    pub fn push(&mut self, content: ReportContent) {
        self.entries.push(content);
    }

    pub fn latest(&self) -> Option<&ReportContent> {
        self.entries.last()
    }

    /// Chronological order.
    pub fn iter(&self) -> std::slice::Iter<'_, ReportContent> {
        self.entries.iter()
    }

    pub fn iter_newest_first(&self) -> impl Iterator<Item = &ReportContent> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
