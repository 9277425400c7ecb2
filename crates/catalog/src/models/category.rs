use crate::validation::{self, MAX_NAME_LEN, ValidationErrors};
use serde::Deserialize;

/// A shelf grouping; every book belongs to exactly one.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// Raw category form values, exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CategoryInput {
    pub name: String,
    pub description: String,
}
impl CategoryInput {
    pub fn validate(&self) -> Result<NewCategory, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = validation::text(&mut errors, "name", &self.name, MAX_NAME_LEN);
        let description = validation::text(&mut errors, "description", &self.description, usize::MAX);
        errors.into_result(|| NewCategory { name, description })
    }
}
impl From<&Category> for CategoryInput {
    fn from(category: &Category) -> Self {
        Self { name: category.name.clone(), description: category.description.clone() }
    }
}

/// A validated category, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
}
