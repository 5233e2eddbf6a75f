//! Detail page parsing
//!
//! A detail page carries:
//! - the record name in `#lblTitle`
//! - one rating image per classification inside `div#content`, with the
//!   decision in the table cell after the image's cell
//! - its own address in the `action` of `#form1`, relative to the site base

use crate::scrape::title::{Rating, Title};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Returns the trimmed `#lblTitle` text, or `None` if it is missing or blank
///
/// Expired sessions are answered with a page whose title is empty, so a
/// `None` here means the page is not a real record.
pub fn detail_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    title_text(&document).filter(|s| !s.is_empty())
}

/// Parses a saved detail page into a [`Title`]
///
/// # Arguments
///
/// * `html` - Raw page body
/// * `base_url` - Site base the form action is resolved against
///
/// # Errors
///
/// Returns a description of the problem if a rating image has no `alt`
/// text or the form has no `action`.
///
/// # Example
///
/// ```
/// use suger::scrape::parse_detail_page;
/// use url::Url;
///
/// let html = br#"<form id="form1" action="Details.aspx?id=9"><span id="lblTitle">Up</span></form>"#;
/// let base = Url::parse("https://example.com/Search/Film/").unwrap();
/// let title = parse_detail_page(html, &base).unwrap();
/// assert_eq!(title.name, "Up");
/// assert_eq!(title.url, "https://example.com/Search/Film/Details.aspx?id=9");
/// ```
pub fn parse_detail_page(html: &[u8], base_url: &Url) -> Result<Title, String> {
    let html = String::from_utf8_lossy(html);
    let document = Html::parse_document(&html);

    let name = title_text(&document).unwrap_or_default();
    let ratings = extract_ratings(&document)?;
    let url = extract_url(&document, base_url)?;

    Ok(Title { name, ratings, url })
}

fn selector(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("invalid selector {}: {}", css, e))
}

fn title_text(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("#lblTitle").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
}

fn extract_ratings(document: &Html) -> Result<Vec<Rating>, String> {
    let img_selector = selector("div#content td img")?;
    let mut ratings = Vec::new();

    for img in document.select(&img_selector) {
        let rating = img
            .value()
            .attr("alt")
            .ok_or_else(|| "rating image has no 'alt' attribute".to_string())?;

        ratings.push(Rating {
            rating: rating.trim().to_string(),
            decision: decision_for(img).unwrap_or_default(),
        });
    }

    Ok(ratings)
}

/// Text of the cell following the one that holds `img`
fn decision_for(img: ElementRef<'_>) -> Option<String> {
    let cell = img
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "td")?;

    cell.next_siblings()
        .filter_map(ElementRef::wrap)
        .next()
        .map(|next| next.text().collect::<String>().trim().to_string())
}

fn extract_url(document: &Html, base_url: &Url) -> Result<String, String> {
    let form_selector = selector("#form1")?;

    let action = document
        .select(&form_selector)
        .next()
        .and_then(|form| form.value().attr("action"))
        .ok_or_else(|| "form has no 'action' attribute".to_string())?;

    base_url
        .join(action)
        .map(String::from)
        .map_err(|e| format!("invalid form action {}: {}", action, e))
}
