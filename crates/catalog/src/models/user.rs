use crate::validation::{self, MAX_NAME_LEN, ValidationErrors};
use serde::Deserialize;

/// A registered borrower.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Raw user form values, exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserInput {
    pub name: String,
    pub email: String,
}
impl UserInput {
    pub fn validate(&self) -> Result<NewUser, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = validation::text(&mut errors, "name", &self.name, MAX_NAME_LEN);
        let email = validation::email(&mut errors, "email", &self.email);
        errors.into_result(|| NewUser { name, email })
    }
}
impl From<&User> for UserInput {
    fn from(user: &User) -> Self {
        Self { name: user.name.clone(), email: user.email.clone() }
    }
}

/// A validated user, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}
