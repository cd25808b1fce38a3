use askama::Template;
use axum::{
    extract::{Path, State, rejection::PathRejection},
    response::Html,
};

use super::AppState;
use super::errors::AppError;
use crate::models::{Catalog, Word};

struct WordRow {
    name: String,
    pronunciation: String,
    value: String,
}

impl From<Word> for WordRow {
    fn from(word: Word) -> Self {
        WordRow {
            name: word.name,
            pronunciation: word.pronunciation.unwrap_or_default(),
            value: word.value.unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "catalog.html")]
struct CatalogPage {
    catalog: Catalog,
    language: String,
    owner: String,
    words: Vec<WordRow>,
}

/// GET /catalogs/{id}: printable word list for one catalog.
pub async fn catalog(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Html<String>, AppError> {
    let Path(id) = id?;
    let page = {
        let db = state.db()?;
        let catalog = db
            .get_catalog(id)?
            .ok_or_else(|| AppError::NotFound(format!("catalog not found: {id}")))?;
        let language = db
            .get_language(catalog.language_id)?
            .map(|l| l.name)
            .unwrap_or_default();
        let owner = db
            .get_user(catalog.user_id)?
            .map(|u| u.name)
            .unwrap_or_default();
        let words = db.list_words(id)?.into_iter().map(WordRow::from).collect();
        CatalogPage {
            catalog,
            language,
            owner,
            words,
        }
    };
    Ok(Html(page.render()?))
}
