use std::collections::HashMap;
use std::path::Path;

use tower_lsp::lsp_types::Url;

use crate::session::normalize;

/// State for each open document
#[derive(Debug, Clone)]
pub struct DocumentState {
    pub content: String,
    pub language_id: String,
    pub version: i32,
}

/// Documents the client reported open, plus the one it touched last
#[derive(Debug, Default)]
pub struct Documents {
    docs: HashMap<Url, DocumentState>,
    active: Option<Url>,
}

impl Documents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, uri: Url, state: DocumentState) {
        self.docs.insert(uri.clone(), state);
        self.active = Some(uri);
    }

    pub fn change(&mut self, uri: &Url, content: String, version: i32) {
        if let Some(doc) = self.docs.get_mut(uri) {
            doc.content = content;
            doc.version = version;
        }
        self.active = Some(uri.clone());
    }

    pub fn close(&mut self, uri: &Url) -> Option<DocumentState> {
        if self.active.as_ref() == Some(uri) {
            self.active = None;
        }
        self.docs.remove(uri)
    }

    pub fn get(&self, uri: &Url) -> Option<&DocumentState> {
        self.docs.get(uri)
    }

    pub fn active(&self) -> Option<&Url> {
        self.active.as_ref()
    }

    /// Find an open document by filesystem path, ignoring case
    pub fn find_by_path(&self, path: &Path) -> Option<(&Url, &DocumentState)> {
        let wanted = normalize(path);
        self.docs.iter().find(|(uri, _)| {
            uri.to_file_path()
                .map(|p| normalize(&p) == wanted)
                .unwrap_or(false)
        })
    }

    pub fn set_language(&mut self, uri: &Url, language_id: &str) {
        if let Some(doc) = self.docs.get_mut(uri) {
            doc.language_id = language_id.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(language_id: &str) -> DocumentState {
        DocumentState {
            content: String::new(),
            language_id: language_id.to_string(),
            version: 1,
        }
    }

    #[test]
    fn test_active_follows_open_and_close() {
        let mut docs = Documents::new();
        let a = Url::parse("file:///app/a.component.ts").unwrap();
        let b = Url::parse("file:///app/b.component.ts").unwrap();

        docs.open(a.clone(), state("typescript"));
        docs.open(b.clone(), state("typescript"));
        assert_eq!(docs.active(), Some(&b));

        docs.change(&a, "x".to_string(), 2);
        assert_eq!(docs.active(), Some(&a));

        docs.close(&a);
        assert_eq!(docs.active(), None);
        assert!(docs.get(&b).is_some());
    }

    #[test]
    fn test_find_by_path_ignores_case() {
        let mut docs = Documents::new();
        let uri = Url::parse("file:///App/Foo-1.ts").unwrap();
        docs.open(uri.clone(), state("typescript"));

        let (found, _) = docs.find_by_path(Path::new("/app/foo-1.ts")).unwrap();
        assert_eq!(found, &uri);
        assert!(docs.find_by_path(Path::new("/app/bar-1.ts")).is_none());
    }
}
