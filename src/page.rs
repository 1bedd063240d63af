use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::extract::parse_selector;

#[derive(Debug)]
pub struct PageSelectors {
    works: Selector,
    next: Selector,
}

impl PageSelectors {
    pub fn new() -> Self {
        Self {
            works: parse_selector("li.work"),
            next: parse_selector("li.next > a[href]"),
        }
    }
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self::new()
    }
}

/// One parsed listing page.
pub struct ListingPage {
    document: Html,
}

impl ListingPage {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// Work nodes in document order.
    pub fn work_nodes<'a>(
        &'a self,
        selectors: &'a PageSelectors,
    ) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.document.select(&selectors.works)
    }

    /// Address of the next page, resolved against `base`. `None` means the
    /// listing ends here.
    pub fn next_page(&self, selectors: &PageSelectors, base: &Url) -> Option<Url> {
        let link = self.document.select(&selectors.next).next()?;
        let href = link.value().attr("href")?.trim();
        match base.join(href) {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::warn!(href, %base, %err, "next page link does not resolve; stopping");
                None
            }
        }
    }
}
