pub mod detail;
pub mod html;
pub mod listing;


pub use detail::{DetailSelectors, extract_details};
pub use listing::{SummaryMatcher, discover_total_count, extract_links};
