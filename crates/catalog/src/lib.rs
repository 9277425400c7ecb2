//! Library catalog: books, the categories they are filed under, and the users
//! who borrow them.
//!
//! # Architecture
//! - [`Database`] owns the SQLite pool and the embedded migrations.
//! - One repository per entity ([`BookRepository`], [`CategoryRepository`],
//!   [`UserRepository`]) performs the reads and writes.
//! - Every entity has a raw `*Input` (form values as text) whose `validate()`
//!   produces the typed `New*` value the repositories accept, or the full set
//!   of [`ValidationErrors`].
//! - [`pagination`] slices listings into fixed-size pages.

mod db;
pub mod error;
mod models;
pub mod pagination;
mod repo;
pub mod validation;

pub use crate::db::{DEFAULT_MAX_CONNECTIONS, Database, IN_MEMORY};
pub use crate::models::{
    Book, BookDetails, BookInput, Category, CategoryInput, Entity, NewBook, NewCategory, NewUser, User, UserInput,
};
pub use crate::pagination::{DEFAULT_PAGE_SIZE, Page, PageRequest, paginate};
pub use crate::repo::{BookRepository, CategoryRepository, UserRepository};
pub use crate::validation::{FieldError, ValidationErrors};
