use crate::config::DetailConfig;
use crate::error::ConfigError;
use crate::parsers::html::{self, collapse_text, element_text, first_text, following_text, own_text};
use crate::results::ProductRecord;
use scraper::{Html, Selector};

/// Compiled selectors for the detail page probes
#[derive(Debug)]
pub struct DetailSelectors {
    name: Selector,
    price: Selector,
    previous_price: Selector,
    discount: Selector,
    model_scope: Selector,
    model_label: String,
    brand: Selector,
    description: Selector,
}

impl DetailSelectors {
    pub fn from_config(config: &DetailConfig) -> Result<Self, ConfigError> {
        let brand = format!(
            "a[href*=\"{}\"]",
            config.brand_path_marker.replace('"', "\\\"")
        );
        let description = format!("[id=\"{}\"]", config.description_id.replace('"', "\\\""));

        Ok(Self {
            name: html::selector(&config.name)?,
            price: html::selector(&config.price)?,
            previous_price: html::selector(&config.previous_price)?,
            discount: html::selector(&config.discount)?,
            model_scope: html::selector(&config.model_scope)?,
            model_label: config.model_label.trim().to_string(),
            brand: html::selector(&brand)?,
            description: html::selector(&description)?,
        })
    }
}

/// Extracts a product record from a detail page.
///
/// Never fails: each field is probed on its own and comes back `None` when
/// its element is missing or empty.
pub fn extract_details(html: &str, url: &str, selectors: &DetailSelectors) -> ProductRecord {
    let doc = Html::parse_document(html);

    let record = ProductRecord {
        name: first_text(&doc, &selectors.name),
        price: first_text(&doc, &selectors.price),
        previous_price: first_text(&doc, &selectors.previous_price),
        discount_percent: first_text(&doc, &selectors.discount),
        brand: first_text(&doc, &selectors.brand),
        model: probe_model(&doc, selectors),
        description: first_text(&doc, &selectors.description),
        url: url.to_string(),
    };

    if record.name.is_none() {
        ::log::debug!("No product name found on {}", url);
    }

    record
}

/// The model follows a label such as "MPN:". The value is either inline after
/// the label or in the next sibling node.
fn probe_model(doc: &Html, selectors: &DetailSelectors) -> Option<String> {
    let label = selectors.model_label.as_str();

    doc.select(&selectors.model_scope)
        .filter(|element| own_text(*element).contains(label))
        .find_map(|element| {
            let inline = element_text(element).and_then(|text| {
                text.rsplit(label).next().and_then(|after| collapse_text([after]))
            });
            inline.or_else(|| following_text(element))
        })
}
