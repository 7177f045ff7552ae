use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use super::{Backend, DocumentQuery, QueryContext, sub_scrape};

/// What to read from each element matched by a CSS selector.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Text,
    Attr(String),
}

impl Target {
    fn extract(&self, element: ElementRef<'_>) -> Option<String> {
        let value = match self {
            Target::Text => element.text().collect::<String>(),
            Target::Attr(name) => element.value().attr(name)?.to_string(),
        };

        let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
        if value.is_empty() { None } else { Some(value) }
    }
}

/// Splits `div.name::attr(href)` into the CSS part and the target.
fn parse_selector(selector: &str) -> (&str, Target) {
    if let Some(idx) = selector.rfind("::attr(") {
        let (css, rest) = selector.split_at(idx);
        let name = rest.trim_start_matches("::attr(").trim_end().trim_end_matches(')');
        return (css.trim(), Target::Attr(name.trim().to_string()));
    }

    let css = selector
        .strip_suffix("::text()")
        .or_else(|| selector.strip_suffix("::text"))
        .unwrap_or(selector);

    (css.trim(), Target::Text)
}

/// HTML document query using CSS selectors.
///
/// Selectors select element text by default; append `::attr(name)` to select an
/// attribute instead.
pub struct HtmlQuery<'a> {
    doc: Html,
    url: String,
    ctx: QueryContext<'a>,
}

impl<'a> HtmlQuery<'a> {
    /// Parses `payload` as an HTML document. Parsing is lenient and never fails.
    pub fn from_payload(payload: &str, url: &str, ctx: QueryContext<'a>) -> Self {
        Self { doc: Html::parse_document(payload), url: url.to_string(), ctx }
    }
}

impl DocumentQuery for HtmlQuery<'_> {
    fn run_query(&self, selector: &str) -> Vec<String> {
        let (css, target) = parse_selector(selector);

        let parsed = match Selector::parse(css) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Invalid CSS selector '{}': {}", selector, e);
                return Vec::new();
            }
        };

        let values: Vec<String> = self.doc.select(&parsed).filter_map(|el| target.extract(el)).collect();

        if values.is_empty() {
            warn!("Could not find selector '{}' in html document", selector);
        }

        values
    }

    fn sub_scrape(&self, value: &str) -> Option<Box<dyn DocumentQuery + '_>> {
        sub_scrape(Backend::Html, &self.url, value, self.ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchConfig, StaticFetcher};

    const SAMPLE_HTML: &str = r#"
        <html>
        <body>
            <h1 class="title">
                A   Scene
                Title
            </h1>
            <ul class="tags">
                <li><a href="/tags/1">First</a></li>
                <li><a href="/tags/2">Second</a></li>
                <li><a href="/tags/3">  </a></li>
            </ul>
            <img class="cover" src="https://cdn.example.com/cover.jpg">
        </body>
        </html>
    "#;

    #[test]
    fn test_text_is_collapsed() {
        let fetcher = StaticFetcher::new();
        let config = FetchConfig::default();
        let q = HtmlQuery::from_payload(SAMPLE_HTML, "https://example.com/", QueryContext::new(&fetcher, &config));

        assert_eq!(q.run_query("h1.title"), vec!["A Scene Title"]);
        assert_eq!(q.run_query("h1.title::text"), vec!["A Scene Title"]);
    }

    #[test]
    fn test_inline_markup_keeps_words_whole() {
        let fetcher = StaticFetcher::new();
        let config = FetchConfig::default();
        let html = "<html><body><p class='d'>Hello <b>W</b>orld, it<i>'s</i>\n  fine</p></body></html>";
        let q = HtmlQuery::from_payload(html, "https://example.com/", QueryContext::new(&fetcher, &config));

        assert_eq!(q.run_query("p.d"), vec!["Hello World, it's fine"]);
    }

    #[test]
    fn test_multiple_matches_in_order_skip_empty() {
        let fetcher = StaticFetcher::new();
        let config = FetchConfig::default();
        let q = HtmlQuery::from_payload(SAMPLE_HTML, "https://example.com/", QueryContext::new(&fetcher, &config));

        assert_eq!(q.run_query("ul.tags a"), vec!["First", "Second"]);
    }

    #[test]
    fn test_attribute_target() {
        let fetcher = StaticFetcher::new();
        let config = FetchConfig::default();
        let q = HtmlQuery::from_payload(SAMPLE_HTML, "https://example.com/", QueryContext::new(&fetcher, &config));

        assert_eq!(q.run_query("ul.tags a::attr(href)"), vec!["/tags/1", "/tags/2", "/tags/3"]);
        assert_eq!(q.run_query("img.cover::attr(src)"), vec!["https://cdn.example.com/cover.jpg"]);
        assert!(q.run_query("img.cover::attr(alt)").is_empty());
    }

    #[test]
    fn test_invalid_or_missing_selector_is_empty() {
        let fetcher = StaticFetcher::new();
        let config = FetchConfig::default();
        let q = HtmlQuery::from_payload(SAMPLE_HTML, "https://example.com/", QueryContext::new(&fetcher, &config));

        assert!(q.run_query("[[invalid").is_empty());
        assert!(q.run_query("div.missing").is_empty());
    }

    #[test]
    fn test_parse_selector() {
        assert_eq!(parse_selector("a.link::attr(href)"), ("a.link", Target::Attr("href".to_string())));
        assert_eq!(parse_selector("h1::text()"), ("h1", Target::Text));
        assert_eq!(parse_selector("h1"), ("h1", Target::Text));
    }

    #[test]
    fn test_sub_scrape_relative_link() {
        let fetcher = StaticFetcher::new().with_document(
            "https://example.com/tags/1",
            "<html><body><p class='desc'>Tag page</p></body></html>",
        );
        let config = FetchConfig::default();
        let q = HtmlQuery::from_payload(
            SAMPLE_HTML,
            "https://example.com/scenes/5",
            QueryContext::new(&fetcher, &config),
        );

        let sub = q.sub_scrape("/tags/1").expect("sub document");
        assert_eq!(sub.run_query("p.desc"), vec!["Tag page"]);
    }
}
