//! HTML rendering of the dashboard model.

pub mod html;

pub use html::render_dashboard;
