//! Per-stream teletext capture state.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;

use recorder_protocol::TeletextPage;

#[derive(Debug, Default)]
struct CachedPage {
    sub_pages: BTreeMap<u16, Bytes>,
    sub_page_count: u32,
}

/// Pages fetched so far while capturing, keyed by page/subpage.
#[derive(Debug, Default)]
pub struct TeletextCaptureState {
    pages: HashMap<u16, CachedPage>,
}

impl TeletextCaptureState {
    /// Remember a page delivered by the backend.
    pub fn store(&mut self, page: u16, sub_page: u16, fetched: &TeletextPage) {
        let entry = self.pages.entry(page).or_default();
        if let Some(content) = &fetched.content {
            entry.sub_pages.insert(sub_page, content.clone());
        }
        let known = u32::try_from(entry.sub_pages.len()).unwrap_or(u32::MAX);
        entry.sub_page_count = entry.sub_page_count.max(fetched.sub_page_count).max(known);
    }

    /// Cached content of a page; `content` is `None` while not captured.
    pub fn page(&self, page: u16, sub_page: u16) -> TeletextPage {
        match self.pages.get(&page) {
            Some(entry) => TeletextPage {
                content: entry.sub_pages.get(&sub_page).cloned(),
                sub_page_count: entry.sub_page_count,
            },
            None => TeletextPage::not_ready(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_page_is_not_ready() {
        let state = TeletextCaptureState::default();
        assert_eq!(state.page(100, 1), TeletextPage::not_ready());
    }

    #[test]
    fn test_store_and_subpage_count() {
        let mut state = TeletextCaptureState::default();
        state.store(
            100,
            1,
            &TeletextPage {
                content: Some(Bytes::from_static(b"one")),
                sub_page_count: 3,
            },
        );

        let hit = state.page(100, 1);
        assert_eq!(hit.content, Some(Bytes::from_static(b"one")));
        assert_eq!(hit.sub_page_count, 3);

        // Known page, subpage not captured yet.
        let miss = state.page(100, 2);
        assert!(miss.content.is_none());
        assert_eq!(miss.sub_page_count, 3);

        // Other pages stay unknown.
        assert_eq!(state.page(101, 1), TeletextPage::not_ready());
    }
}
