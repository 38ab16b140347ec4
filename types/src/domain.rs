use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use validator::{Validate, ValidationErrors};

use crate::error::Error;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    #[default]
    Admin,
    Student,
    Company,
}

pub const ROLES: [Role; 3] = [Role::Admin, Role::Student, Role::Company];

impl Role {
    pub fn login_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin_login",
            Role::Student => "/student_login",
            Role::Company => "/company_login",
        }
    }

    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin-dashboard",
            Role::Student => "/student-dashboard",
            Role::Company => "/company-dashboard",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Student => "Student",
            Role::Company => "Company",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Role::Admin => Role::Student,
            Role::Student => Role::Company,
            Role::Company => Role::Admin,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Role::Admin => Role::Company,
            Role::Student => Role::Admin,
            Role::Company => Role::Student,
        }
    }
}

/// Credentials collected by the sign-in tab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    pub role: Role,
}

impl LoginRequest {
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    pub fn check(&self) -> Result<(), Error> {
        self.validate().map_err(|e| Error::InvalidInput(first_message(&e)))
    }

    pub fn payload(&self) -> LoginPayload<'_> {
        LoginPayload {
            email: &self.email,
            password: &self.password,
            user_type: self.role,
        }
    }
}

/// Wire body of the role login endpoints.
#[derive(Debug, Serialize)]
pub struct LoginPayload<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(rename = "userType")]
    pub user_type: Role,
}

/// Registration data collected by the sign-up tab.
///
/// The role is only used to preselect the picker; the provider does not
/// receive it.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    pub confirm_password: String,
    pub role: Role,
}

impl Default for SignupRequest {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            full_name: String::new(),
            confirm_password: String::new(),
            role: Role::Student,
        }
    }
}

impl SignupRequest {
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    pub fn set_full_name(&mut self, full_name: impl Into<String>) {
        self.full_name = full_name.into();
    }

    pub fn set_confirm_password(&mut self, confirm_password: impl Into<String>) {
        self.confirm_password = confirm_password.into();
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    pub fn passwords_match(&self) -> bool {
        self.password == self.confirm_password
    }

    /// Mismatch is reported before any other field problem.
    pub fn check(&self) -> Result<(), Error> {
        if !self.passwords_match() {
            return Err(Error::PasswordMismatch);
        }
        self.validate().map_err(|e| Error::InvalidInput(first_message(&e)))
    }
}

/// Body returned by the backend, on failure it may carry a `message`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MessageBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// What the session collaborator reports when the form mounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user: Option<User>,
    pub loading: bool,
}

impl Session {
    pub fn loading() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    pub fn resolved(user: Option<User>) -> Self {
        Self {
            user,
            loading: false,
        }
    }
}

fn first_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(ToString::to_string))
        .unwrap_or_else(|| "Please fill in all fields".to_string())
}
