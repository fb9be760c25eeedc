use chrono::NaiveDateTime;

/// Prefix of every exported file name
pub const EXPORT_FILE_PREFIX: &str = "Detalles_Productos";

/// Timestamped output file name, e.g. `Detalles_Productos_2024-05-01_13-45-09.csv`
pub fn export_file_name(generated_at: NaiveDateTime, extension: &str) -> String {
    format!(
        "{}_{}.{}",
        EXPORT_FILE_PREFIX,
        generated_at.format("%Y-%m-%d_%H-%M-%S"),
        extension
    )
}

/// Appends the `start` offset parameter to a listing URL
pub fn with_offset(listing_url: &str, offset: usize) -> String {
    let separator = if listing_url.contains('?') { '&' } else { '?' };
    format!("{}{}start={}", listing_url, separator, offset)
}
