//! Tera template cache.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use tera::Tera;
use tracing::debug;

use super::TemplateData;

/// Pages the application renders. All must be present at start-up.
pub const PAGES: [&str; 5] = [
    "pages/home.html",
    "pages/view.html",
    "pages/create.html",
    "pages/signup.html",
    "pages/login.html",
];

/// Compiled templates, built once and shared read-only.
pub struct ThemeEngine {
    tera: Tera,
}

impl ThemeEngine {
    /// Compile every template under `template_dir`.
    ///
    /// Fails if a template does not parse or a page is missing, so a broken
    /// theme stops the server at start-up instead of on first request.
    pub fn new(template_dir: &Path) -> Result<Self> {
        let pattern = template_dir.join("**/*.html");
        let pattern_str = pattern
            .to_str()
            .context("invalid template directory path")?;

        let mut tera = Tera::new(pattern_str).context("failed to initialize Tera templates")?;
        Self::register_filters(&mut tera);

        let names: Vec<_> = tera.get_template_names().collect();
        debug!(count = names.len(), "loaded templates");

        for page in PAGES {
            if !names.contains(&page) {
                bail!("template {page} not found in {}", template_dir.display());
            }
        }

        Ok(Self { tera })
    }

    fn register_filters(tera: &mut Tera) {
        tera.register_filter(
            "human_date",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let formatted = value.as_str().map(human_date).unwrap_or_default();
                Ok(tera::Value::String(formatted))
            },
        );
    }

    /// Render a page with the given data.
    pub fn render(&self, page: &str, data: &TemplateData) -> tera::Result<String> {
        let context = tera::Context::from_serialize(data)?;
        self.tera.render(page, &context)
    }
}

/// Format an RFC 3339 timestamp as e.g. `17 Mar 2024 at 10:15` (UTC).
///
/// Unparseable input renders as an empty string.
pub fn human_date(value: &str) -> String {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| {
            dt.with_timezone(&Utc)
                .format("%d %b %Y at %H:%M")
                .to_string()
        })
        .unwrap_or_default()
}
