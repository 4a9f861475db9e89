//! Holdings-page adapter.
//!
//! The remote page exposes no stable markup hooks, so holdings are located
//! positionally: the fifth `<table>` in the document, first cell of every row
//! after the header. Markup changes on the remote site should only ever touch
//! this module.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::constants::HOLDINGS_TABLE_INDEX;
use crate::errors::{OverlapError, Result};

fn selector(url: &str, css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| OverlapError::schema(url, format!("invalid selector '{}': {:?}", css, e)))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Extract stock names from a fund holdings page.
///
/// Returns `Schema` when the page has fewer than `HOLDINGS_TABLE_INDEX + 1` tables.
/// Rows without any `<td>` are skipped.
pub fn extract_holdings(url: &str, html: &str) -> Result<Vec<String>> {
    let table_selector = selector(url, "table")?;
    let row_selector = selector(url, "tr")?;
    let cell_selector = selector(url, "td")?;

    let document = Html::parse_document(html);
    let tables: Vec<ElementRef<'_>> = document.select(&table_selector).collect();

    let Some(table) = tables.get(HOLDINGS_TABLE_INDEX) else {
        return Err(OverlapError::schema(
            url,
            format!(
                "page has {} table(s), holdings expected in table #{}",
                tables.len(),
                HOLDINGS_TABLE_INDEX + 1
            ),
        ));
    };

    let holdings: Vec<String> = table
        .select(&row_selector)
        .skip(1)
        .filter_map(|row| row.select(&cell_selector).next())
        .map(cell_text)
        .collect();

    debug!("Parsed {} holdings from {}", holdings.len(), url);
    Ok(holdings)
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Page with `filler` decoy tables followed by a holdings table.
    pub fn holdings_page(filler: usize, rows: &[&str]) -> String {
        let mut html = String::from("<html><body>");
        for i in 0..filler {
            html.push_str(&format!("<table><tr><td>decoy {}</td></tr></table>", i));
        }
        html.push_str("<table><tr><th>Stock</th><th>Sector</th><th>% of assets</th></tr>");
        for row in rows {
            html.push_str(&format!("<tr><td> {} </td><td>Financial</td><td>5.1%</td></tr>", row));
        }
        html.push_str("</table></body></html>");
        html
    }

    pub fn page_with_tables(count: usize) -> String {
        let mut html = String::from("<html><body>");
        for i in 0..count {
            html.push_str(&format!("<table><tr><td>table {}</td></tr></table>", i));
        }
        html.push_str("</body></html>");
        html
    }
}
