use lopdf::Document;
use tracing::debug;

/// Extracts text page by page. Pages without a text layer are skipped and the
/// remaining pages are joined with a single space, in page order.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, lopdf::Error> {
    let doc = Document::load_mem(bytes)?;

    // get_pages is keyed by page number, so iteration is already in order
    let pages = doc.get_pages();
    let page_count = pages.len();

    let page_texts = pages.keys().map(|page_num| {
        doc.extract_text(&[*page_num]).unwrap_or_else(|e| {
            debug!("No text extracted from page {page_num}: {e}");
            String::new()
        })
    });

    let text = join_pages(page_texts);
    debug!("Extracted {} chars from {} PDF pages", text.len(), page_count);
    Ok(text)
}

fn join_pages(pages: impl IntoIterator<Item = String>) -> String {
    pages
        .into_iter()
        .map(|page| page.trim().to_string())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
