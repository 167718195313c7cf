//! Data handed to page templates.

use chrono::{Datelike, Utc};
use serde::Serialize;

use crate::middleware::RequestContext;
use crate::models::Snippet;

/// Everything a page may display. Rebuilt for every response.
#[derive(Debug, Default, Serialize)]
pub struct TemplateData {
    pub current_year: i32,
    pub snippet: Option<Snippet>,
    pub snippets: Vec<Snippet>,
    pub form: Option<serde_json::Value>,
    pub flash: Option<String>,
    pub is_authenticated: bool,
    pub csrf_token: String,
}

impl TemplateData {
    pub fn new(ctx: &RequestContext, flash: Option<String>) -> Self {
        Self {
            current_year: Utc::now().year(),
            flash,
            is_authenticated: ctx.is_authenticated,
            csrf_token: ctx.csrf_token.clone(),
            ..Self::default()
        }
    }

    /// Attach a form (its values and validation messages).
    pub fn with_form<F: Serialize>(mut self, form: &F) -> serde_json::Result<Self> {
        self.form = Some(serde_json::to_value(form)?);
        Ok(self)
    }
}
