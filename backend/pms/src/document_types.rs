//! Travel-document-type catalog.
//!
//! The PMS names its document types in the operator's locale, so the lookup
//! goes through keyword lists instead of exact names.

use crate::client::CatalogEntry;
use innkeep_core::DocumentKind;

#[derive(Debug, Default)]
pub struct DocumentTypeCatalog {
    entries: Vec<CatalogEntry>,
}

impl DocumentTypeCatalog {
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(&self, kind: DocumentKind) -> Option<i64> {
        let keywords: &[&str] = match kind {
            DocumentKind::IdCard => &["osobna", "identity", "id card", "iskaznica"],
            DocumentKind::Passport => &["putovnica", "passport"],
        };
        self.entries.iter().find_map(|entry| {
            let name = entry.name.to_lowercase();
            keywords
                .iter()
                .any(|kw| name.contains(kw))
                .then_some(entry.id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_localized_names() {
        let catalog = DocumentTypeCatalog::from_entries(vec![
            CatalogEntry { id: 10, name: "Osobna iskaznica".into() },
            CatalogEntry { id: 11, name: "Putovnica".into() },
            CatalogEntry { id: 12, name: "Vozačka dozvola".into() },
        ]);
        assert_eq!(catalog.resolve(DocumentKind::IdCard), Some(10));
        assert_eq!(catalog.resolve(DocumentKind::Passport), Some(11));
    }

    #[test]
    fn resolves_english_names() {
        let catalog = DocumentTypeCatalog::from_entries(vec![
            CatalogEntry { id: 1, name: "Identity card".into() },
            CatalogEntry { id: 2, name: "Passport".into() },
        ]);
        assert_eq!(catalog.resolve(DocumentKind::IdCard), Some(1));
        assert_eq!(catalog.resolve(DocumentKind::Passport), Some(2));
    }

    #[test]
    fn empty_catalog_resolves_nothing() {
        assert_eq!(
            DocumentTypeCatalog::default().resolve(DocumentKind::Passport),
            None
        );
    }
}
