//! Page templates and the data they are rendered with.

mod data;
mod engine;

pub use data::TemplateData;
pub use engine::{PAGES, ThemeEngine, human_date};
