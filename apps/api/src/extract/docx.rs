use docx_rs::{read_docx, DocumentChild, Paragraph, ParagraphChild, RunChild};
use tracing::debug;

/// Extracts the text of every body paragraph, one line per paragraph.
/// Empty paragraphs are kept so blank lines survive.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, docx_rs::ReaderError> {
    let docx = read_docx(bytes)?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => Some(paragraph_text(p)),
            _ => None,
        })
        .collect();

    debug!("Extracted {} DOCX paragraphs", paragraphs.len());
    Ok(paragraphs.join("\n"))
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    push_children(&paragraph.children, &mut text);
    text
}

fn push_children(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    match run_child {
                        RunChild::Text(t) => out.push_str(&t.text),
                        RunChild::Tab(_) => out.push('\t'),
                        RunChild::Break(_) => out.push('\n'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_children(&link.children, out),
            _ => {}
        }
    }
}
