//! Extraction of structured page records from rendered HTML
//!
//! This module turns a rendered document into a `PageRecord`:
//! - Title and meta description
//! - Paragraph texts
//! - Every anchor (absolute href plus text)
//! - Every image (absolute src, alt text and size)
//!
//! Extraction never fails. A missing element or attribute becomes its
//! default (`""` or `0`) and the rest of the page is still recorded.

use crate::crawler::renderer::RenderedDocument;
use crate::storage::{ImageEntry, LinkEntry, PageRecord};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Builds the page record for a rendered document
///
/// Relative `href` and `src` values resolve against the document base
/// (`<base href>` when present, otherwise the final URL), the way a browser
/// reports `element.href`. An anchor without `href` records `""`.
///
/// # Example
///
/// ```
/// use page_harvest::crawler::{extract, RenderedDocument};
/// use url::Url;
///
/// let doc = RenderedDocument {
///     final_url: Url::parse("https://example.com/page").unwrap(),
///     title: None,
///     html: r#"<title>Test</title><p> Hello </p><a href="/next">Next</a>"#.to_string(),
///     image_sizes: None,
/// };
/// let record = extract(&doc);
/// assert_eq!(record.title, "Test");
/// assert_eq!(record.paragraphs, vec!["Hello"]);
/// assert_eq!(record.links[0].href, "https://example.com/next");
/// ```
pub fn extract(document: &RenderedDocument) -> PageRecord {
    let html = Html::parse_document(&document.html);
    let base = document_base(&html, &document.final_url);

    let title = match &document.title {
        Some(title) => collapse_whitespace(title),
        None => extract_title(&html),
    };

    PageRecord {
        url: document.final_url.to_string(),
        title,
        meta_description: extract_meta_description(&html),
        paragraphs: extract_paragraphs(&html),
        links: extract_links(&html, &base),
        images: extract_images(&html, &base, document.image_sizes.as_deref()),
    }
}

fn select_all<'a>(document: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn text_of(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn document_base(document: &Html, final_url: &Url) -> Url {
    select_all(document, "base[href]")
        .first()
        .and_then(|base| base.value().attr("href"))
        .and_then(|href| final_url.join(href.trim()).ok())
        .unwrap_or_else(|| final_url.clone())
}

fn extract_title(document: &Html) -> String {
    select_all(document, "title")
        .first()
        .map(|title| collapse_whitespace(&title.text().collect::<String>()))
        .unwrap_or_default()
}

fn extract_meta_description(document: &Html) -> String {
    select_all(document, r#"meta[name="description"]"#)
        .first()
        .and_then(|meta| meta.value().attr("content"))
        .map(str::to_string)
        .unwrap_or_default()
}

fn extract_paragraphs(document: &Html) -> Vec<String> {
    select_all(document, "p").iter().map(text_of).collect()
}

/// Resolves an attribute value the way the DOM reflects URL attributes
///
/// Unresolvable values are kept verbatim; a missing attribute is `""`.
fn resolve(value: Option<&str>, base: &Url) -> String {
    match value {
        None => String::new(),
        Some(raw) => {
            let raw = raw.trim();
            base.join(raw)
                .map(|url| url.to_string())
                .unwrap_or_else(|_| raw.to_string())
        }
    }
}

fn extract_links(document: &Html, base: &Url) -> Vec<LinkEntry> {
    select_all(document, "a")
        .iter()
        .map(|anchor| LinkEntry {
            href: resolve(anchor.value().attr("href"), base),
            text: text_of(anchor),
        })
        .collect()
}

/// Parses a dimension attribute like `120` or `120px`
fn parse_dimension(value: Option<&str>) -> u32 {
    value
        .map(|v| {
            v.trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect::<String>()
        })
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

fn extract_images(document: &Html, base: &Url, rendered: Option<&[(u32, u32)]>) -> Vec<ImageEntry> {
    let images = select_all(document, "img");

    // Rendered sizes are positional; only trust them when they line up
    let rendered = rendered.filter(|sizes| sizes.len() == images.len());

    images
        .iter()
        .enumerate()
        .map(|(i, img)| {
            let element = img.value();
            let (width, height) = match rendered {
                Some(sizes) => sizes[i],
                None => (
                    parse_dimension(element.attr("width")),
                    parse_dimension(element.attr("height")),
                ),
            };

            ImageEntry {
                src: resolve(element.attr("src"), base),
                alt: element.attr("alt").unwrap_or_default().to_string(),
                width,
                height,
            }
        })
        .collect()
}
