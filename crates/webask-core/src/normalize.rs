//! Provider output -> flat display text.
//!
//! Everything here is pure and total: any `SearchAnswer` or list of hits renders.

use crate::{DirectHit, ProviderOutput, SearchAnswer};

/// Shown instead of an empty string when the direct provider has nothing to render.
pub const NO_RESULTS: &str = "No results found for your query.";
pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_CONTENT: &str = "No content";
/// Appended to every direct-search markdown body (content is usually a page excerpt).
pub const ELLIPSIS: &str = "...";
pub const SEARCH_QUERIES_LABEL: &str = "Search Queries Used";

pub fn render(output: &ProviderOutput) -> String {
    match output {
        ProviderOutput::Agentic(a) => render_agentic(a),
        ProviderOutput::Direct(d) => d.text.clone(),
    }
}

pub fn render_agentic(a: &SearchAnswer) -> String {
    let mut out = format!("Answer:\n{}\n\n", a.answer);
    if !a.sources.is_empty() {
        out.push_str("Sources:\n");
        for s in &a.sources {
            out.push_str(&format!("- {}: {}\n", s.title, s.url));
        }
    }
    if !a.search_queries.is_empty() {
        out.push_str(&format!(
            "\n{SEARCH_QUERIES_LABEL}: {}\n",
            a.search_queries.join(", ")
        ));
    }
    out
}

fn render_hit(h: &DirectHit) -> String {
    let title = h.title.as_deref().unwrap_or(NOT_AVAILABLE);
    let url = h.url.as_deref().unwrap_or(NOT_AVAILABLE);
    let markdown = h.markdown.as_deref().unwrap_or(NO_CONTENT);
    format!("TITLE: {title}\nURL: {url}\nMARKDOWN: {markdown}{ELLIPSIS}")
}

/// Blocks are separated by one blank line, in result order.
pub fn render_direct_hits(hits: &[DirectHit]) -> String {
    if hits.is_empty() {
        return NO_RESULTS.to_string();
    }
    hits.iter().map(render_hit).collect::<Vec<_>>().join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DirectAnswer, Source};
    use proptest::prelude::*;

    #[test]
    fn bare_answer_has_no_trailing_sections() {
        let a = SearchAnswer {
            answer: "X".to_string(),
            ..SearchAnswer::default()
        };
        assert_eq!(render_agentic(&a), "Answer:\nX\n\n");
    }

    #[test]
    fn empty_answer_still_renders_header() {
        assert_eq!(render_agentic(&SearchAnswer::default()), "Answer:\n\n\n");
    }

    #[test]
    fn sources_and_queries_sections() {
        let a = SearchAnswer {
            answer: "Paris.".to_string(),
            sources: vec![
                Source {
                    url: "https://en.wikipedia.org/wiki/Paris".to_string(),
                    title: "Paris - Wikipedia".to_string(),
                },
                Source {
                    url: "https://example.com/france".to_string(),
                    title: "France Facts".to_string(),
                },
            ],
            search_queries: vec!["capital of France".to_string(), "Paris".to_string()],
            ..SearchAnswer::default()
        };
        assert_eq!(
            render_agentic(&a),
            "Answer:\nParis.\n\n\
             Sources:\n\
             - Paris - Wikipedia: https://en.wikipedia.org/wiki/Paris\n\
             - France Facts: https://example.com/france\n\
             \nSearch Queries Used: capital of France, Paris\n"
        );
    }

    #[test]
    fn queries_without_sources() {
        let a = SearchAnswer {
            answer: "A".to_string(),
            search_queries: vec!["q".to_string()],
            ..SearchAnswer::default()
        };
        assert_eq!(render_agentic(&a), "Answer:\nA\n\n\nSearch Queries Used: q\n");
    }

    #[test]
    fn direct_hits_use_placeholders() {
        let hits = vec![DirectHit::default()];
        assert_eq!(
            render_direct_hits(&hits),
            "TITLE: N/A\nURL: N/A\nMARKDOWN: No content..."
        );
    }

    #[test]
    fn direct_hits_empty_is_sentinel() {
        assert_eq!(render_direct_hits(&[]), NO_RESULTS);
    }

    #[test]
    fn direct_output_passes_through() {
        let out = ProviderOutput::Direct(DirectAnswer {
            text: "already final".to_string(),
            ..DirectAnswer::default()
        });
        assert_eq!(render(&out), "already final");
    }

    #[test]
    fn two_hits_are_separated_by_one_blank_line() {
        let hits = vec![
            DirectHit {
                title: Some("Paris - Wikipedia".to_string()),
                url: Some("https://en.wikipedia.org/wiki/Paris".to_string()),
                markdown: Some("# Paris".to_string()),
            },
            DirectHit {
                title: Some("France Facts".to_string()),
                url: Some("https://example.com/france".to_string()),
                markdown: Some("Capital: Paris".to_string()),
            },
        ];
        let s = render_direct_hits(&hits);
        let blocks: Vec<&str> = s.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("TITLE: Paris - Wikipedia\n"));
        assert!(blocks[1].starts_with("TITLE: France Facts\n"));
        assert!(blocks.iter().all(|b| b.ends_with(ELLIPSIS)));
    }

    fn line_text() -> impl Strategy<Value = String> {
        "[A-Za-z0-9 ./:-]{1,24}"
    }

    proptest! {
        #[test]
        fn every_source_is_listed_in_order(
            answer in line_text(),
            pairs in prop::collection::vec((line_text(), line_text()), 1..8),
        ) {
            let sources: Vec<Source> = pairs
                .into_iter()
                .map(|(title, url)| Source { url, title })
                .collect();
            let a = SearchAnswer { answer, sources: sources.clone(), ..SearchAnswer::default() };
            let s = render_agentic(&a);
            let block = s.split("Sources:\n").nth(1).unwrap_or("");
            let lines: Vec<&str> = block.lines().collect();
            prop_assert_eq!(lines.len(), sources.len());
            for (line, src) in lines.iter().zip(&sources) {
                prop_assert_eq!(line.to_string(), format!("- {}: {}", src.title, src.url));
            }
        }

        #[test]
        fn no_query_line_when_log_is_empty(
            answer in line_text(),
            titles in prop::collection::vec(line_text(), 0..4),
        ) {
            let sources = titles
                .into_iter()
                .map(|t| Source { url: format!("https://x/{}", t.len()), title: t })
                .collect();
            let a = SearchAnswer { answer, sources, ..SearchAnswer::default() };
            prop_assert!(!render_agentic(&a).contains(SEARCH_QUERIES_LABEL));
        }
    }
}
