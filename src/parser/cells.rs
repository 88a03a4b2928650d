use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

static IMAGE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());

/// One table cell of a detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    /// `data-src` of the first lazily loaded image inside the cell.
    pub image: Option<String>,
}

/// Flatten a detail document into its ordered cell sequence.
pub fn split_cells(html: &str, selector: &Selector) -> Vec<Cell> {
    let document = Html::parse_document(html);
    document.select(selector).map(to_cell).collect()
}

fn to_cell(element: ElementRef<'_>) -> Cell {
    let image = element
        .select(&IMAGE_SELECTOR)
        .next()
        .and_then(|img| img.value().attr("data-src"))
        .map(str::to_string);
    Cell {
        text: element.text().collect(),
        image,
    }
}
