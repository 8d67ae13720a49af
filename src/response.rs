//! Standard response envelopes for single resources and paginated collections.

use crate::page::Page;
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
}

#[derive(Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct PageMeta {
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub last_page: u32,
    pub from: Option<u64>,
    pub to: Option<u64>,
}

pub fn success_one<T: Serialize>(data: T) -> SuccessOne<T> {
    SuccessOne { data }
}

pub fn paginated<T: Serialize>(page: Page<T>) -> Paginated<T> {
    let meta = PageMeta {
        current_page: page.current_page,
        per_page: page.per_page,
        total: page.total,
        last_page: page.last_page(),
        from: page.from(),
        to: page.to(),
    };
    Paginated {
        data: page.items,
        meta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paginated_envelope() {
        let body = serde_json::to_value(paginated(Page::new(vec!["a", "b"], 7, 5, 2))).unwrap();
        assert_eq!(
            body,
            json!({
                "data": ["a", "b"],
                "meta": {"current_page": 2, "per_page": 5, "total": 7, "last_page": 2, "from": 6, "to": 7}
            })
        );
    }

    #[test]
    fn empty_page_has_no_bounds() {
        let body = serde_json::to_value(paginated(Page::<u8>::new(vec![], 0, 15, 1))).unwrap();
        assert_eq!(body["meta"]["from"], json!(null));
        assert_eq!(body["meta"]["last_page"], json!(1));
    }
}
