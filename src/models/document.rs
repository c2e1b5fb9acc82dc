use serde::{Deserialize, Serialize};

/// Stable document identifier: hex MD5 of `title|url|abstract`.
pub type DocId = String;

/// A wiki abstract dump entry. Opaque to the index engines; only the
/// identifier matters to them, the abstract is consumed token by token.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub url: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

impl Document {
    pub fn new(title: String, url: String, abstract_text: String) -> Self {
        let mut doc = Self {
            id: String::new(),
            title,
            url,
            abstract_text,
        };
        doc.id = doc.derive_id();
        doc
    }

    /// Identifiers are content-derived so re-loading the same dump maps
    /// each entry onto the same document.
    fn derive_id(&self) -> DocId {
        let digest = md5::compute(format!(
            "{}|{}|{}",
            self.title, self.url, self.abstract_text
        ));
        format!("{:x}", digest)
    }
}
