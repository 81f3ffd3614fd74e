//! Page fingerprinting.
//!
//! Turns a fetched page body into a [`Fingerprint`]: the sorted set of
//! linked PDF documents when there are any, otherwise the page's visible
//! text.

use scraper::Html;

use crate::error::{AppError, Result};
use crate::models::Fingerprint;
use crate::utils::html::{anchor_hrefs, visible_text};
use crate::utils::{absolutize_site_relative, origin_of};

/// Case-insensitive suffix identifying document links.
const DOCUMENT_SUFFIX: &str = ".pdf";

/// Derives fingerprints from page bodies.
#[derive(Debug, Clone, Default)]
pub struct Fingerprinter {
    /// Fixed origin for site-relative links; derived from the target when unset
    site_origin: Option<String>,
}

impl Fingerprinter {
    pub fn new(site_origin: Option<String>) -> Self {
        Self { site_origin }
    }

    /// Fingerprint the body fetched from `target`.
    pub fn fingerprint(&self, target: &str, body: &str) -> Result<Fingerprint> {
        let origin = match &self.site_origin {
            Some(origin) => origin.clone(),
            None => origin_of(target).map_err(|e| AppError::parse(target, e))?,
        };

        let document = Html::parse_document(body);
        let documents = extract_documents(anchor_hrefs(&document), &origin);

        Ok(Fingerprint::from_documents(documents)
            .unwrap_or_else(|| Fingerprint::from_text(&visible_text(&document))))
    }
}

/// Normalize hrefs and keep the ones pointing at PDF documents.
pub fn extract_documents<I>(hrefs: I, origin: &str) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    hrefs
        .into_iter()
        .map(|href| absolutize_site_relative(href.trim(), origin))
        .filter(|href| href.to_ascii_lowercase().ends_with(DOCUMENT_SUFFIX))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FingerprintKind;

    const TARGET: &str = "https://www.gov.br/ebserh/convocacoes/hc-ufpe";

    fn page(links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|href| format!(r#"<li><a href="{href}">doc</a></li>"#))
            .collect();
        format!("<html><body><h1>Convocações</h1><ul>{anchors}</ul></body></html>")
    }

    #[test]
    fn test_extract_documents_filters_and_absolutizes() {
        let hrefs = vec![
            "/files/Edital.PDF".to_string(),
            "https://cdn.test/a.pdf".to_string(),
            "/about".to_string(),
            "https://cdn.test/a.pdf?download=1".to_string(),
        ];

        assert_eq!(
            extract_documents(hrefs, "https://www.gov.br"),
            vec!["https://www.gov.br/files/Edital.PDF", "https://cdn.test/a.pdf"]
        );
    }

    #[test]
    fn test_anchor_order_does_not_change_fingerprint() {
        let fingerprinter = Fingerprinter::default();
        let first = fingerprinter
            .fingerprint(TARGET, &page(&["/b.pdf", "/a.pdf"]))
            .unwrap();
        let second = fingerprinter
            .fingerprint(TARGET, &page(&["/a.pdf", "/b.pdf", "/a.pdf"]))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.documents,
            vec!["https://www.gov.br/a.pdf", "https://www.gov.br/b.pdf"]
        );
        assert_eq!(first.kind, FingerprintKind::DocumentSet);
    }

    #[test]
    fn test_falls_back_to_text_without_documents() {
        let fingerprinter = Fingerprinter::default();
        let fp = fingerprinter
            .fingerprint(TARGET, "<html><body><p>No  files\nyet</p></body></html>")
            .unwrap();

        assert_eq!(fp.kind, FingerprintKind::Text);
        assert!(fp.documents.is_empty());
        assert_eq!(fp, Fingerprint::from_text("No files yet"));
    }

    #[test]
    fn test_configured_origin_wins() {
        let fingerprinter = Fingerprinter::new(Some("https://mirror.test".to_string()));
        let fp = fingerprinter.fingerprint(TARGET, &page(&["/x.pdf"])).unwrap();

        assert_eq!(fp.documents, vec!["https://mirror.test/x.pdf"]);
    }

    #[test]
    fn test_invalid_target_is_parse_error() {
        let err = Fingerprinter::default()
            .fingerprint("not-a-url", &page(&["/x.pdf"]))
            .unwrap_err();

        assert_eq!(err.kind(), "parse");
    }
}
