//! Typed forms submitted by the application's pages.
//!
//! Each form owns a [`Validator`] as its `validation` member. Field values are
//! echoed back into templates when a submission fails, except passwords.

use serde::{Deserialize, Serialize};

use super::validator::{self, EMAIL_RX, Validator};

/// Lifetimes, in days, a snippet may be created with.
pub const PERMITTED_EXPIRY_DAYS: [i32; 3] = [1, 7, 365];

/// Minimum password length for new accounts.
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Maximum snippet title length.
pub const MAX_TITLE_CHARS: usize = 100;

const BLANK: &str = "This field cannot be blank";

/// Snippet creation form.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SnippetCreateForm {
    pub title: String,
    pub content: String,
    pub expires: i32,
    #[serde(skip_deserializing)]
    pub validation: Validator,
}

impl SnippetCreateForm {
    /// An empty form with the longest lifetime preselected.
    pub fn blank() -> Self {
        Self {
            expires: 365,
            ..Self::default()
        }
    }

    pub fn validate(&mut self) {
        let v = &mut self.validation;
        v.check_field(validator::not_blank(&self.title), "title", BLANK);
        v.check_field(
            validator::max_chars(&self.title, MAX_TITLE_CHARS),
            "title",
            "This field cannot be more than 100 characters long",
        );
        v.check_field(validator::not_blank(&self.content), "content", BLANK);
        v.check_field(
            validator::permitted_value(&self.expires, &PERMITTED_EXPIRY_DAYS),
            "expires",
            "This field must equal 1, 7 or 365",
        );
    }
}

/// Account signup form.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UserSignupForm {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_deserializing)]
    pub validation: Validator,
}

impl UserSignupForm {
    pub fn validate(&mut self) {
        let v = &mut self.validation;
        v.check_field(validator::not_blank(&self.name), "name", BLANK);
        v.check_field(validator::not_blank(&self.email), "email", BLANK);
        v.check_field(
            validator::matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(validator::not_blank(&self.password), "password", BLANK);
        v.check_field(
            validator::min_chars(&self.password, MIN_PASSWORD_CHARS),
            "password",
            "This field must be at least 8 characters long",
        );
    }
}

/// Login form.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UserLoginForm {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_deserializing)]
    pub validation: Validator,
}

impl UserLoginForm {
    pub fn validate(&mut self) {
        let v = &mut self.validation;
        v.check_field(validator::not_blank(&self.email), "email", BLANK);
        v.check_field(
            validator::matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(validator::not_blank(&self.password), "password", BLANK);
    }
}
