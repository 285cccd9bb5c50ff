//! User registration payload and its validation rules.
//!
//! Every string is trimmed and lowercased before the length checks
//! (3..=256 characters); `username` needs at least 5 and `email` must look
//! like an address. All failing fields are reported together.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FieldError;

pub const MIN_LEN: usize = 3;
pub const MAX_LEN: usize = 256;
pub const USERNAME_MIN_LEN: usize = 5;

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9](?:[a-z0-9-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]*[a-z0-9])?)+$").ok());

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn check_len(field: &str, value: &str, min: usize, errors: &mut Vec<FieldError>) {
    let n = value.chars().count();
    if n < min {
        errors.push(FieldError::new(field, format!("must have at least {min} characters")));
    } else if n > MAX_LEN {
        errors.push(FieldError::new(field, format!("must have at most {MAX_LEN} characters")));
    }
}

impl NewUser {
    /// Normalized user, or every violated rule.
    pub fn validate(self) -> Result<User, Vec<FieldError>> {
        let mut errors = Vec::new();

        let username = normalize(&self.username);
        check_len("username", &username, USERNAME_MIN_LEN, &mut errors);

        let email = normalize(&self.email);
        check_len("email", &email, MIN_LEN, &mut errors);
        if !EMAIL_RE.as_ref().is_some_and(|re| re.is_match(&email)) {
            errors.push(FieldError::new("email", "value is not a valid email address"));
        }

        let first_name = self.first_name.as_deref().map(normalize);
        let last_name = self.last_name.as_deref().map(normalize);
        for (field, value) in [("first_name", &first_name), ("last_name", &last_name)] {
            if let Some(v) = value {
                check_len(field, v, MIN_LEN, &mut errors);
            }
        }

        if errors.is_empty() {
            Ok(User { username, email, first_name, last_name })
        } else {
            Err(errors)
        }
    }
}
