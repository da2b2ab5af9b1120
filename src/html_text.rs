//! Plain text from Mastodon status HTML.
//!
//! Status content arrives as an HTML fragment (`<p>`, `<a>`, `<span class="h-card">`
//! and friends). For speech we only want the text, so the fragment is parsed
//! into a DOM and every text node is concatenated in document order.

use scraper::Html;

/// Extract the text content of an HTML fragment, trimmed.
///
/// Tag structure is ignored entirely: `<p>a</p><p>b</p>` becomes `ab`.
/// html5ever recovers from any malformed markup, so input that is not really
/// HTML (`a < b`) comes back as its literal text.
pub fn extract_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);

    let text: String = fragment
        .tree
        .root()
        .descendants()
        .filter_map(|node| node.value().as_text())
        .map(|text| &**text)
        .collect();

    text.trim().to_string()
}
