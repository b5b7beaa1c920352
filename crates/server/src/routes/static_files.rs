//! The bundled single-page app.
//!
//! Existing files are served as-is. Any other path gets the index document so
//! the client-side router can take over. If the index is missing the response
//! is a bare 404 that the error renderer turns into a page.

use tower_http::services::{ServeDir, ServeFile};

use crate::config::ServerConfig;

/// Static file service with index fallback.
pub fn service(config: &ServerConfig) -> ServeDir<ServeFile> {
    ServeDir::new(&config.static_dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(config.index_path()))
}
