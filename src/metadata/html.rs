use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::types::PageMeta;

static META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta").expect("Failed to compile meta selector"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("Failed to compile title selector"));

const TITLE_KEYS: [&str; 2] = ["og:title", "twitter:title"];
const DESCRIPTION_KEYS: [&str; 3] = ["og:description", "twitter:description", "description"];
const IMAGE_KEYS: [&str; 3] = ["og:image", "twitter:image", "twitter:image:src"];

/// Pull social preview tags out of a page. Each field is resolved on its own:
/// the first key in priority order with a non-blank value wins.
pub fn parse_page_meta(html: &str) -> PageMeta {
    let document = Html::parse_document(html);

    PageMeta {
        title: first_meta(&document, &TITLE_KEYS).or_else(|| document_title(&document)),
        description: first_meta(&document, &DESCRIPTION_KEYS),
        image: first_meta(&document, &IMAGE_KEYS),
    }
}

fn first_meta(document: &Html, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| meta_content(document, key))
}

// publishers mix `property` and `name` freely, accept either
fn meta_content(document: &Html, key: &str) -> Option<String> {
    document
        .select(&META_SELECTOR)
        .filter(|element| {
            let element = element.value();
            ["property", "name"].into_iter().any(|attr| {
                element
                    .attr(attr)
                    .is_some_and(|value| value.trim().eq_ignore_ascii_case(key))
            })
        })
        .filter_map(|element| element.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

fn document_title(document: &Html) -> Option<String> {
    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
}
