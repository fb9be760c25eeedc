use crate::error::FetchError;
use async_trait::async_trait;

/// Anything that can turn a URL into page markup.
///
/// The pipeline only talks to this trait, so listing and detail extraction
/// work the same over plain HTTP, a real browser, or a test double.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Load `url` and return its markup.
    ///
    /// `ready_selector` names an element that must be present before the
    /// markup is read. Sources that receive fully rendered markup may ignore
    /// it.
    async fn fetch_page(&self, url: &str, ready_selector: Option<&str>)
    -> Result<String, FetchError>;

    /// Release any held resources (sessions, connections)
    async fn close(&self) {}
}
