//! Form handling: binding, validation and CSRF tokens.

pub mod binder;
pub mod csrf;
pub mod types;
pub mod validator;

pub use binder::{BindError, PostForm};
pub use csrf::{rotate_csrf_token, session_csrf_token, verify_csrf_token};
pub use types::{SnippetCreateForm, UserLoginForm, UserSignupForm};
pub use validator::Validator;
