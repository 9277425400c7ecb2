use crate::error::{Error, ErrorKind};
use crate::validation::{self, MAX_NAME_LEN, ValidationErrors};
use exn::{OptionExt, ResultExt};
use serde::Deserialize;
use time::Date;

/// A catalogued book.
///
/// `user_id` is the current borrower; `None` means the book is on the shelf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: i64,
    pub name: String,
    pub author: String,
    pub category_id: i64,
    pub publication_date: Date,
    pub user_id: Option<i64>,
}
impl Book {
    pub fn is_borrowed(&self) -> bool {
        self.user_id.is_some()
    }
}

/// A book together with the names of the records it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDetails {
    pub book: Book,
    pub category: String,
    pub borrower: Option<String>,
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookRow {
    id: i64,
    name: String,
    author: String,
    category_id: i64,
    publication_date: String,
    user_id: Option<i64>,
}
impl TryFrom<BookRow> for Book {
    type Error = Error;
    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            author: row.author,
            category_id: row.category_id,
            publication_date: validation::parse_date(&row.publication_date)
                .ok_or_raise(|| ErrorKind::InvalidData("publication date"))?,
            user_id: row.user_id,
        })
    }
}

/// Result of selecting `b.*` joined with the category and borrower names.
#[derive(sqlx::FromRow)]
pub(crate) struct BookDetailsRow {
    #[sqlx(flatten)]
    book: BookRow,
    category_name: String,
    borrower_name: Option<String>,
}
impl TryFrom<BookDetailsRow> for BookDetails {
    type Error = Error;
    fn try_from(row: BookDetailsRow) -> Result<Self, Self::Error> {
        Ok(Self { book: Book::try_from(row.book)?, category: row.category_name, borrower: row.borrower_name })
    }
}

/// Raw book form values, exactly as submitted.
///
/// Identifiers and dates stay as text here so that a bad value becomes a
/// field error instead of a rejected request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BookInput {
    pub name: String,
    pub author: String,
    pub category_id: String,
    pub publication_date: String,
    pub user_id: String,
}
impl BookInput {
    pub fn validate(&self) -> Result<NewBook, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = validation::text(&mut errors, "name", &self.name, MAX_NAME_LEN);
        let author = validation::text(&mut errors, "author", &self.author, MAX_NAME_LEN);
        let category_id = validation::id(&mut errors, "category_id", &self.category_id);
        let publication_date = validation::date(&mut errors, "publication_date", &self.publication_date);
        let user_id = validation::optional_id(&mut errors, "user_id", &self.user_id);
        // `date` pushed a field error for every `None`.
        let Some(publication_date) = publication_date else {
            return Err(errors);
        };
        errors.into_result(|| NewBook { name, author, category_id, publication_date, user_id })
    }
}
impl From<&Book> for BookInput {
    fn from(book: &Book) -> Self {
        Self {
            name: book.name.clone(),
            author: book.author.clone(),
            category_id: book.category_id.to_string(),
            // Left blank if it cannot be written out; the form then asks for it.
            publication_date: validation::format_date(book.publication_date).unwrap_or_default(),
            user_id: book.user_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }
}

/// A validated book, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub name: String,
    pub author: String,
    pub category_id: i64,
    pub publication_date: Date,
    pub user_id: Option<i64>,
}
impl NewBook {
    pub(crate) fn publication_date_text(&self) -> crate::error::Result<String> {
        validation::format_date(self.publication_date).or_raise(|| ErrorKind::InvalidData("publication date"))
    }
}
