pub mod crawler;
pub mod http;
pub mod web;

pub use crawler::PageSource;
pub use http::HttpSource;
pub use web::BrowserSource;
