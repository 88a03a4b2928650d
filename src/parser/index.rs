use reqwest::Url;
use scraper::{Html, Selector};
use tracing::warn;

/// Detail page locators listed on a gallery index page, in document order, at most `limit`.
pub fn scan_index(html: &str, selector: &Selector, base: &Url, limit: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(selector)
        .filter_map(|anchor| {
            let Some(href) = anchor.value().attr("href") else {
                warn!(text = %anchor.text().collect::<String>().trim(), "gallery link without href");
                return None;
            };
            match base.join(href.trim()) {
                Ok(url) => Some(url.to_string()),
                Err(e) => {
                    warn!(href, error = %e, "unresolvable gallery link");
                    None
                }
            }
        })
        .take(limit)
        .collect()
}
