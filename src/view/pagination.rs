/// Growing prefix of a projection: page 1 shows `page_size` photos, each
/// "load more" reveals another page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page_size: usize,
    current_page: usize,
}

pub const DEFAULT_PAGE_SIZE: usize = 20;

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current_page: 1,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn visible_count(&self) -> usize {
        self.page_size * self.current_page
    }

    pub fn has_more(&self, total: usize) -> bool {
        self.visible_count() < total
    }

    /// Reveal the next page. Does nothing once everything is visible.
    pub fn advance(&mut self, total: usize) -> bool {
        if !self.has_more(total) {
            return false;
        }
        self.current_page += 1;
        true
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    /// The visible prefix of `items`.
    pub fn window<'s, T>(&self, items: &'s [T]) -> &'s [T] {
        &items[..self.visible_count().min(items.len())]
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}
