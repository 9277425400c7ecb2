mod book;
mod category;
mod user;

pub use self::book::{Book, BookDetails, BookInput, NewBook};
pub(crate) use self::book::{BookDetailsRow, BookRow};
pub use self::category::{Category, CategoryInput, NewCategory};
pub use self::user::{NewUser, User, UserInput};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// The persisted record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Book,
    Category,
    User,
}
impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Book => "book",
            Entity::Category => "category",
            Entity::User => "user",
        }
    }

    /// The column that must be unique across all records, besides the id.
    pub fn unique_field(&self) -> Option<&'static str> {
        match self {
            Entity::Book => None,
            Entity::Category => Some("name"),
            Entity::User => Some("email"),
        }
    }
}
impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
