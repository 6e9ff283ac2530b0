//! HTTP API handlers for ssa-dash

pub mod buildinfo;
pub mod charts;
pub mod error;
pub mod export;
pub mod health;
pub mod options;
pub mod reload;
pub mod ssa;
pub mod summary;
pub mod table;
pub mod ui;
pub mod validation;

pub use buildinfo::get_build_info;
pub use charts::get_chart;
pub use error::ApiError;
pub use export::{export_html, export_xlsx};
pub use health::health_routes;
pub use options::get_options;
pub use reload::{event_stream, post_reload};
pub use ssa::get_ssa;
pub use summary::get_summary;
pub use table::get_table;
pub use ui::{serve_app_js, serve_index};
pub use validation::get_validation;
