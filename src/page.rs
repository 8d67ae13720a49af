//! A bounded slice of an ordered result set plus total-count metadata.

#[derive(Clone, Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub per_page: u32,
    /// 1-indexed.
    pub current_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, per_page: u32, current_page: u32) -> Self {
        Page {
            items,
            total,
            per_page: per_page.max(1),
            current_page: current_page.max(1),
        }
    }

    pub fn last_page(&self) -> u32 {
        let pages = self.total.div_ceil(self.per_page as u64).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// 1-based position of the first item, `None` on an empty page.
    pub fn from(&self) -> Option<u64> {
        if self.items.is_empty() {
            return None;
        }
        Some((self.current_page as u64 - 1) * self.per_page as u64 + 1)
    }

    pub fn to(&self) -> Option<u64> {
        self.from().map(|f| f + self.items.len() as u64 - 1)
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            per_page: self.per_page,
            current_page: self.current_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds() {
        let p = Page::new(vec![6, 7, 8, 9, 10], 20, 5, 2);
        assert_eq!(p.last_page(), 4);
        assert_eq!((p.from(), p.to()), (Some(6), Some(10)));
    }

    #[test]
    fn empty_page_has_one_page_and_no_range() {
        let p: Page<u8> = Page::new(Vec::new(), 0, 15, 1);
        assert_eq!(p.last_page(), 1);
        assert_eq!(p.from(), None);
        assert_eq!(p.map(|x| x as u32).items.len(), 0);
    }
}
