//! Text and markup rendering for captured fragments

use scraper::{ElementRef, Html, Node};

/// Elements whose content never counts as visible text
pub const NON_CONTENT: &[&str] = &["script", "style", "noscript", "iframe"];

/// Heading elements, dropped from captured description sections
pub const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Renders an HTML fragment as plain text
///
/// Script, style, noscript and iframe content is dropped, text nodes are
/// concatenated in document order, and whitespace runs collapse to one space.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    element_text(fragment.root_element())
}

/// Visible text of an element, whitespace-collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    collapse_whitespace(&raw)
}

/// Visible text of an element, or None when it is empty
pub fn non_empty_text(element: ElementRef<'_>) -> Option<String> {
    let text = element_text(element);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Collapses whitespace runs to single spaces and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercases with Turkish dotted capital I folded to a plain `i`
pub fn fold_case(text: &str) -> String {
    text.replace('İ', "i").to_lowercase()
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if NON_CONTENT.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

/// Serializes the children of `element`, leaving out any subtree rooted at
/// one of the `skip` tag names
pub fn inner_html_without(element: ElementRef<'_>, skip: &[&str]) -> String {
    let mut fragment = Html::parse_fragment(&element.inner_html());
    let skipped: Vec<_> = fragment
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| skip.contains(&el.value().name()))
        .map(|el| el.id())
        .collect();

    for id in skipped {
        if let Some(mut node) = fragment.tree.get_mut(id) {
            node.detach();
        }
    }

    fragment.root_element().inner_html().trim().to_string()
}
