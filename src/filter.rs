use crate::config::ScraperConfig;
use crate::error::ConfigError;
use regex::Regex;
use url::Url;

/// Decides which hrefs on a listing page are product links and turns them
/// into absolute URLs.
///
/// URLs are compared as plain strings afterwards, so nothing here normalizes
/// case, trailing slashes, query order or fragments.
#[derive(Debug)]
pub struct LinkFilter {
    site_base: Url,
    product_path_marker: String,
    allow_external: bool,
    exclude_regexes: Vec<Regex>,
}

impl LinkFilter {
    /// Create a new link filter
    pub fn new(
        site_base: Url,
        product_path_marker: &str,
        allow_external: bool,
        exclude_patterns: &[String],
    ) -> Result<Self, regex::Error> {
        let mut exclude_regexes = Vec::with_capacity(exclude_patterns.len());
        for pattern in exclude_patterns {
            exclude_regexes.push(Regex::new(pattern)?);
        }

        Ok(Self {
            site_base,
            product_path_marker: product_path_marker.to_string(),
            allow_external,
            exclude_regexes,
        })
    }

    /// Build the filter from scraper configuration
    pub fn from_config(config: &ScraperConfig) -> Result<Self, ConfigError> {
        let filter = Self::new(
            config.site_base()?,
            &config.product_path_marker,
            config.allow_external,
            &config.exclude_patterns,
        )?;
        Ok(filter)
    }

    /// Returns the absolute product URL for an href, or `None` if it is not a
    /// product link
    pub fn accept(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if !href.contains(&self.product_path_marker) {
            return None;
        }

        let absolute = self.absolutize(href);

        if !self.is_in_domain_scope(&absolute) {
            ::log::trace!("Link filter rejected external link: {}", absolute);
            return None;
        }

        for regex in &self.exclude_regexes {
            if regex.is_match(&absolute) {
                ::log::trace!("Link filter excluded: {}", absolute);
                return None;
            }
        }

        Some(absolute)
    }

    /// Prefix relative hrefs with the site base
    fn absolutize(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            return href.to_string();
        }
        if let Some(rest) = href.strip_prefix("//") {
            return format!("{}://{}", self.site_base.scheme(), rest);
        }

        let base = self.site_base.as_str().trim_end_matches('/');
        if href.starts_with('/') {
            format!("{}{}", base, href)
        } else {
            format!("{}/{}", base, href)
        }
    }

    /// Check if a URL is on the site's host
    fn is_in_domain_scope(&self, url: &str) -> bool {
        if self.allow_external {
            return true;
        }
        match Url::parse(url) {
            Ok(parsed) => parsed.host_str() == self.site_base.host_str(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(exclude: &[&str]) -> LinkFilter {
        let exclude: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
        LinkFilter::new(
            Url::parse("https://platanitos.com").unwrap(),
            "/pe/producto/",
            false,
            &exclude,
        )
        .unwrap()
    }

    #[test]
    fn test_relative_product_link() {
        let filter = filter(&[]);
        assert_eq!(
            filter.accept("/pe/producto/zapatilla-x-123"),
            Some("https://platanitos.com/pe/producto/zapatilla-x-123".to_string())
        );
    }

    #[test]
    fn test_absolute_and_protocol_relative_links() {
        let filter = filter(&[]);
        assert_eq!(
            filter.accept("https://platanitos.com/pe/producto/a"),
            Some("https://platanitos.com/pe/producto/a".to_string())
        );
        assert_eq!(
            filter.accept("//platanitos.com/pe/producto/b"),
            Some("https://platanitos.com/pe/producto/b".to_string())
        );
    }

    #[test]
    fn test_non_product_links_rejected() {
        let filter = filter(&[]);
        assert_eq!(filter.accept("/pe/productos?page=2"), None);
        assert_eq!(filter.accept("/pe/marca/under-armour"), None);
        assert_eq!(filter.accept("#top"), None);
    }

    #[test]
    fn test_external_host_rejected() {
        let filter = filter(&[]);
        assert_eq!(filter.accept("https://other.example/pe/producto/a"), None);

        let open = LinkFilter::new(
            Url::parse("https://platanitos.com").unwrap(),
            "/pe/producto/",
            true,
            &[],
        )
        .unwrap();
        assert!(open.accept("https://other.example/pe/producto/a").is_some());
    }

    #[test]
    fn test_exclude_patterns() {
        let filter = filter(&[r"/pe/producto/gift-card"]);
        assert_eq!(filter.accept("/pe/producto/gift-card-50"), None);
        assert!(filter.accept("/pe/producto/polo-1").is_some());
    }

    #[test]
    fn test_no_normalization() {
        let filter = filter(&[]);
        let a = filter.accept("/pe/producto/polo-1").unwrap();
        let b = filter.accept("/pe/producto/polo-1/").unwrap();
        let c = filter.accept("/pe/producto/polo-1?color=rojo").unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_invalid_pattern() {
        let result = LinkFilter::new(
            Url::parse("https://platanitos.com").unwrap(),
            "/pe/producto/",
            false,
            &["(".to_string()],
        );
        assert!(result.is_err());
    }
}
