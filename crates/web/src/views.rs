//! HTML views.
//!
//! Templates are embedded into the binary at compile time using
//! [`rust-embed`](rust_embed) and compiled once into an [`upon`] engine when
//! the application starts. Every expression is HTML-escaped unless a template
//! asks otherwise.
//!
//! Views receive plain serializable view models, never catalog types, so the
//! templates only see display-ready text.

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use rust_embed::Embed;
use serde::Serialize;
use shelf_catalog::validation::FORM;
use shelf_catalog::{BookDetails, Category, Page, User, ValidationErrors};
use tracing::instrument;
use upon::Engine;

const INDEX: &str = "index.html";
const FORM_PAGE: &str = "form.html";

#[derive(Embed)]
#[folder = "templates/"]
struct Templates;

/// The compiled page templates.
pub struct Views {
    engine: Engine<'static>,
}
impl Views {
    /// Compile every embedded template.
    ///
    /// Fails fast on a template syntax error so a broken build never serves.
    pub fn load() -> Result<Self> {
        let mut engine = Engine::new();
        engine.set_default_formatter(&upon::fmt::escape_html);
        for name in Templates::iter() {
            let file = Templates::get(&name).ok_or_raise(|| ErrorKind::TemplateNotFound(name.to_string()))?;
            let source = String::from_utf8(file.data.into_owned()).or_raise(|| ErrorKind::Template(name.to_string()))?;
            engine.add_template(name.to_string(), source).or_raise(|| ErrorKind::Template(name.to_string()))?;
        }
        Ok(Self { engine })
    }

    pub fn index(&self, view: &IndexView) -> Result<String> {
        self.render(INDEX, view)
    }

    pub fn form(&self, view: &FormView) -> Result<String> {
        self.render(FORM_PAGE, view)
    }

    #[instrument(level = "trace", skip(self, context))]
    fn render(&self, name: &str, context: impl Serialize) -> Result<String> {
        self.engine
            .get_template(name)
            .ok_or_raise(|| ErrorKind::TemplateNotFound(name.to_string()))?
            .render(context)
            .to_string()
            .or_raise(|| ErrorKind::Template(name.to_string()))
    }
}

/// The catalog overview: one page of books plus every category and user.
#[derive(Debug, Serialize)]
pub struct IndexView {
    pub books: Vec<BookView>,
    pub page: u32,
    pub pages: u32,
    pub total: u64,
    pub prev: Option<u32>,
    pub next: Option<u32>,
    pub categories: Vec<CategoryView>,
    pub users: Vec<UserView>,
}
impl IndexView {
    pub fn new(books: Page<BookDetails>, categories: &[Category], users: &[User]) -> Self {
        Self {
            page: books.page,
            pages: books.pages(),
            total: books.total,
            prev: books.prev(),
            next: books.next(),
            books: books.items.iter().map(BookView::from).collect(),
            categories: categories.iter().map(CategoryView::from).collect(),
            users: users.iter().map(UserView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookView {
    pub id: i64,
    pub name: String,
    pub author: String,
    pub category: String,
    pub publication_date: String,
    pub borrower: Option<String>,
}
impl From<&BookDetails> for BookView {
    fn from(details: &BookDetails) -> Self {
        Self {
            id: details.book.id,
            name: details.book.name.clone(),
            author: details.book.author.clone(),
            category: details.category.clone(),
            publication_date: details.book.publication_date.to_string(),
            borrower: details.borrower.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryView {
    pub id: i64,
    pub name: String,
    pub description: String,
}
impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self { id: category.id, name: category.name.clone(), description: category.description.clone() }
    }
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub email: String,
}
impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self { id: user.id, name: user.name.clone(), email: user.email.clone() }
    }
}

/// How a form field is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Date,
    TextArea,
    Select,
}
impl FieldKind {
    fn input_type(&self) -> &'static str {
        match self {
            Self::Text | Self::TextArea | Self::Select => "text",
            Self::Email => "email",
            Self::Date => "date",
        }
    }
}

/// A generic create/edit form.
#[derive(Debug, Serialize)]
pub struct FormView {
    pub title: String,
    pub action: String,
    /// Problems that do not belong to a single field.
    pub errors: Vec<String>,
    pub fields: Vec<FieldView>,
}
impl FormView {
    pub fn new(title: impl Into<String>, action: impl Into<String>) -> Self {
        Self { title: title.into(), action: action.into(), errors: Vec::new(), fields: Vec::new() }
    }

    /// Add a field showing `value` and the first error recorded against `name`.
    pub fn field(
        mut self,
        name: &'static str,
        label: &'static str,
        kind: FieldKind,
        value: &str,
        errors: &ValidationErrors,
    ) -> Self {
        self.fields.push(FieldView {
            name,
            label,
            input_type: kind.input_type(),
            is_textarea: kind == FieldKind::TextArea,
            is_select: kind == FieldKind::Select,
            value: value.to_string(),
            error: errors.get(name).map(str::to_string),
            options: Vec::new(),
        });
        self
    }

    /// Add a drop-down whose selected option is the one matching `value`.
    ///
    /// With `blank` set, an empty first option allows choosing nothing.
    pub fn select(
        self,
        name: &'static str,
        label: &'static str,
        value: &str,
        errors: &ValidationErrors,
        blank: Option<&str>,
        choices: impl IntoIterator<Item = (i64, String)>,
    ) -> Self {
        let mut form = self.field(name, label, FieldKind::Select, value, errors);
        let selected = value.trim();
        let mut options: Vec<_> = blank
            .map(|label| OptionView { value: String::new(), label: label.to_string(), selected: selected.is_empty() })
            .into_iter()
            .collect();
        options.extend(choices.into_iter().map(|(id, label)| {
            let value = id.to_string();
            OptionView { selected: value == selected, value, label }
        }));
        if let Some(field) = form.fields.last_mut() {
            field.options = options;
        }
        form
    }

    /// Collect the errors no field claimed, for display above the form.
    pub fn with_form_errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = errors
            .iter()
            .filter(|error| error.field == FORM || !self.fields.iter().any(|field| field.name == error.field))
            .map(|error| match error.field {
                FORM => error.reason.clone(),
                field => format!("{field} {}", error.reason),
            })
            .collect();
        self
    }
}

#[derive(Debug, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub is_textarea: bool,
    pub is_select: bool,
    pub value: String,
    pub error: Option<String>,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Serialize)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_catalog::{Book, FieldError};
    use time::{Date, Month};

    fn details(name: &str, borrower: Option<&str>) -> BookDetails {
        BookDetails {
            book: Book {
                id: 1,
                name: name.to_string(),
                author: "Herbert".to_string(),
                category_id: 1,
                publication_date: Date::from_calendar_date(1965, Month::August, 1).unwrap(),
                user_id: borrower.map(|_| 1),
            },
            category: "Fiction".to_string(),
            borrower: borrower.map(str::to_string),
        }
    }

    fn index(books: Vec<BookDetails>) -> IndexView {
        IndexView::new(shelf_catalog::paginate(books, 1, 5), &[], &[])
    }

    #[test]
    fn test_templates_compile() {
        Views::load().unwrap();
    }

    #[test]
    fn test_index_lists_books() {
        let views = Views::load().unwrap();
        let html = views.index(&index(vec![details("Dune", Some("Ada"))])).unwrap();
        assert!(html.contains("Dune"));
        assert!(html.contains("Herbert"));
        assert!(html.contains("1965-08-01"));
        assert!(html.contains("Ada"));
        assert!(html.contains("/libro/edit/1"));
    }

    #[test]
    fn test_index_escapes_html() {
        let views = Views::load().unwrap();
        let html = views.index(&index(vec![details("<script>alert(1)</script>", None)])).unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_form_shows_errors_and_values() {
        let views = Views::load().unwrap();
        let mut errors = ValidationErrors::new();
        errors.push("name", "is required");
        errors.push(FORM, "this category is still used by books");
        let form = FormView::new("New category", "/categoria/create")
            .field("name", "Name", FieldKind::Text, "", &errors)
            .field("description", "Description", FieldKind::TextArea, "Stories", &errors)
            .with_form_errors(&errors);
        assert_eq!(form.errors, ["this category is still used by books"]);
        let html = views.form(&form).unwrap();
        assert!(html.contains("is required"));
        assert!(html.contains("Stories"));
        assert!(html.contains("action=\"/categoria/create\""));
    }

    #[test]
    fn test_select_marks_current_choice() {
        let errors = ValidationErrors::from(FieldError { field: "user_id", reason: "does not exist".to_string() });
        let form = FormView::new("Edit book", "/libro/edit/1").select(
            "user_id",
            "Borrower",
            "2",
            &errors,
            Some("(on the shelf)"),
            [(1, "Ada".to_string()), (2, "Grace".to_string())],
        );
        let field = &form.fields[0];
        assert_eq!(field.error.as_deref(), Some("does not exist"));
        let selected: Vec<_> = field.options.iter().filter(|o| o.selected).map(|o| o.label.as_str()).collect();
        assert_eq!(selected, ["Grace"]);
        assert_eq!(field.options.len(), 3);
    }

    #[test]
    fn test_blank_option_selected_when_empty() {
        let form = FormView::new("New book", "/libro/create").select(
            "user_id",
            "Borrower",
            "",
            &ValidationErrors::new(),
            Some("(on the shelf)"),
            [(1, "Ada".to_string())],
        );
        assert!(form.fields[0].options[0].selected);
        assert!(!form.fields[0].options[1].selected);
    }
}
