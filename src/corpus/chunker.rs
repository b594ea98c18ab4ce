//! Header-driven document chunking
//!
//! Splits a markdown document into passages along `## ` headers. The single
//! `# ` document title is captured as context only and never starts a chunk;
//! `### ` subsection headers stay verbatim inside the enclosing chunk.

/// A contiguous passage of a document bounded by its structural headers.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Document-scoped identifier, stable across reloads of identical input
    pub id: String,
    /// Nearest enclosing header
    pub title: String,
    pub content: String,
    /// Document-level `# ` title
    pub parent: String,
    pub line_start: usize,
    pub line_end: usize,
}

/// Split raw document text into ordered chunks.
///
/// Every `## ` header starts a new chunk and the final chunk captures all
/// trailing text. Whitespace-only segments are dropped. Line ranges are
/// recorded for traceability; identical input always yields identical chunks.
pub fn chunk_document(content: &str, doc_id: &str) -> Vec<Chunk> {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut chunks: Vec<Chunk> = Vec::new();

    let mut current_h1 = String::new();
    let mut current_h2 = String::new();
    let mut current: Vec<&str> = Vec::new();
    let mut chunk_start = 0usize;

    for (i, &line) in lines.iter().enumerate() {
        if let Some(title) = line.strip_prefix("# ") {
            // Document title: context only, stays inside the enclosing range
            current_h1 = title.trim().to_string();
        } else if let Some(title) = line.strip_prefix("## ") {
            if !current.is_empty() {
                push_chunk(
                    &mut chunks,
                    doc_id,
                    &current_h1,
                    &current_h2,
                    &current,
                    chunk_start,
                    i.saturating_sub(1),
                );
            }
            current_h2 = title.trim().to_string();
            current = vec![line];
            chunk_start = i;
        } else {
            // Includes `### ` subsection headers, kept verbatim in the body
            current.push(line);
        }
    }

    if !current.is_empty() {
        push_chunk(
            &mut chunks,
            doc_id,
            &current_h1,
            &current_h2,
            &current,
            chunk_start,
            lines.len().saturating_sub(1),
        );
    }

    chunks
}

fn push_chunk(
    chunks: &mut Vec<Chunk>,
    doc_id: &str,
    h1: &str,
    h2: &str,
    lines: &[&str],
    line_start: usize,
    line_end: usize,
) {
    let text = lines.join("\n");
    let text = text.trim();
    if text.is_empty() {
        return;
    }

    let title = if h2.is_empty() { h1 } else { h2 };
    chunks.push(Chunk {
        id: format!("{}_{}", doc_id, chunks.len()),
        title: title.to_string(),
        content: text.to_string(),
        parent: h1.to_string(),
        line_start,
        line_end,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Quy định lao động

## Điều 1: Phạm vi

Áp dụng cho toàn bộ nhân viên.

## Điều 2: Giờ làm việc

### Khoản 2.1

Làm việc từ 8h00 đến 17h30.

## Điều 3: Nghỉ phép

Mỗi năm 12 ngày phép.";

    #[test]
    fn test_chunks_split_on_level_two_headers() {
        let chunks = chunk_document(SAMPLE, "quy_dinh");
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].title, "Điều 1: Phạm vi");
        assert_eq!(chunks[1].title, "Điều 2: Giờ làm việc");
        assert_eq!(chunks[2].title, "Điều 3: Nghỉ phép");
    }

    #[test]
    fn test_document_title_is_context_not_boundary() {
        let chunks = chunk_document(SAMPLE, "quy_dinh");
        for chunk in &chunks {
            assert_eq!(chunk.parent, "Quy định lao động");
            assert!(!chunk.content.contains("# Quy định lao động"));
        }
    }

    #[test]
    fn test_subsection_headers_stay_inline() {
        let chunks = chunk_document(SAMPLE, "quy_dinh");
        assert!(chunks[1].content.contains("### Khoản 2.1"));
        assert!(chunks[1].content.contains("8h00"));
    }

    #[test]
    fn test_final_chunk_captures_trailing_text() {
        let chunks = chunk_document(SAMPLE, "quy_dinh");
        let last = chunks.last().unwrap();
        assert!(last.content.contains("12 ngày phép"));
        assert_eq!(last.line_end, SAMPLE.split('\n').count() - 1);
    }

    #[test]
    fn test_ids_are_document_scoped_and_sequential() {
        let chunks = chunk_document(SAMPLE, "quy_dinh");
        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["quy_dinh_0", "quy_dinh_1", "quy_dinh_2"]);
    }

    #[test]
    fn test_line_ranges_are_exhaustive() {
        let chunks = chunk_document(SAMPLE, "quy_dinh");
        let total_lines = SAMPLE.split('\n').count();

        // Contiguous: each chunk starts right after the previous one ends
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].line_start, pair[0].line_end + 1);
        }
        assert_eq!(chunks.last().unwrap().line_end, total_lines - 1);
    }

    #[test]
    fn test_deterministic() {
        let a = chunk_document(SAMPLE, "quy_dinh");
        let b = chunk_document(SAMPLE, "quy_dinh");
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_document() {
        assert!(chunk_document("", "doc").is_empty());
        assert!(chunk_document("   \n\n  ", "doc").is_empty());
    }

    #[test]
    fn test_preamble_before_first_header_becomes_chunk() {
        let text = "# Title\n\nIntro paragraph.\n\n## Section A\n\nBody.";
        let chunks = chunk_document(text, "doc");
        assert_eq!(chunks.len(), 2);
        // No `## ` seen yet, so the preamble takes the document title
        assert_eq!(chunks[0].title, "Title");
        assert!(chunks[0].content.contains("Intro paragraph."));
    }

    #[test]
    fn test_whitespace_only_preamble_dropped() {
        let text = "# Title\n\n   \n## A\n\nBody.";
        let chunks = chunk_document(text, "doc");
        // The blank preamble between the title and the first section is gone
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].title, "A");
    }
}
