use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An account. The stored password is an argon2 encoded hash and never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    #[serde(skip)]
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: i64,
    pub name: String,
}

/// A named collection of words owned by one user, in one language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub id: i64,
    pub name: String,
    pub language_id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    pub id: i64,
    pub catalog_id: i64,
    pub name: String,
    pub pronunciation: Option<String>,
    pub value: Option<String>,
    pub date: NaiveDate,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub users: i64,
    pub languages: i64,
    pub catalogs: i64,
    pub words: i64,
}

// -- Request payloads --
//
// Every field is optional so a missing field surfaces as a 400 from the
// handler instead of a deserializer rejection.

#[derive(Debug, Default, Deserialize)]
pub struct NewUser {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserChanges {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewLanguage {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewCatalog {
    pub name: Option<String>,
    pub language_id: Option<i64>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogChanges {
    pub name: Option<String>,
    pub language_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewWord {
    pub name: Option<String>,
    pub pronunciation: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WordChanges {
    pub name: Option<String>,
    pub pronunciation: Option<String>,
    pub value: Option<String>,
}

impl WordChanges {
    pub fn is_empty(&self) -> bool {
        present(self.name.as_deref()).is_none()
            && present(self.pronunciation.as_deref()).is_none()
            && present(self.value.as_deref()).is_none()
    }
}

/// Filters accepted by the catalog listing.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct CatalogFilter {
    pub user_id: Option<i64>,
    pub language_id: Option<i64>,
}

/// A field counts as present only when it is a non-empty string.
pub fn present(field: Option<&str>) -> Option<&str> {
    field.filter(|s| !s.is_empty())
}
