// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

pub use handlers::{
    build_controller, error_message, expand_path, form_from_args, handle_download, handle_scrape,
    render_output, write_output, OutputFormat, ScrapeOptions,
};
