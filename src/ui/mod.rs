pub mod browser;
pub mod popup;

// Re-export commonly used items for convenience
pub use browser::{draw_footer, draw_header, draw_listing, draw_log, entry_label};
pub use popup::{draw_error_popup, draw_info_popup};
