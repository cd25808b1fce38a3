use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};

use super::AppState;
use super::errors::AppError;
use crate::db::{DbError, password};
use crate::models::{
    Catalog, CatalogChanges, CatalogFilter, Counts, Language, NewCatalog, NewLanguage, NewUser,
    NewWord, User, UserChanges, Word, WordChanges, present,
};

type JsonBody<T> = Result<Json<T>, JsonRejection>;
type IdPath = Result<Path<i64>, PathRejection>;

/// Hash off the async workers and before the database lock is taken.
async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_string();
    let hashed = tokio::task::spawn_blocking(move || password::hash(&password))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))??;
    Ok(hashed)
}

// -- Users --

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    id: IdPath,
) -> Result<Json<User>, AppError> {
    let Path(id) = id?;
    let user = state
        .db()?
        .get_user(id)?
        .ok_or_else(|| AppError::NotFound(format!("user not found: {id}")))?;
    Ok(Json(user))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    body: JsonBody<NewUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let Json(req) = body?;
    let (Some(name), Some(password)) = (
        present(req.name.as_deref()),
        present(req.password.as_deref()),
    ) else {
        return Err(AppError::BadRequest(
            "name and password are required".to_string(),
        ));
    };

    let password_hash = hash_password(password).await?;
    let user = state.db()?.insert_user(name, &password_hash)?;
    tracing::info!(user_id = user.id, "created user");
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    id: IdPath,
    body: JsonBody<UserChanges>,
) -> Result<Json<User>, AppError> {
    let Path(id) = id?;
    let Json(req) = body?;
    let name = present(req.name.as_deref());
    let password = present(req.password.as_deref());
    if name.is_none() && password.is_none() {
        return Err(AppError::BadRequest(
            "name or password is required".to_string(),
        ));
    }

    let password_hash = match password {
        Some(password) => Some(hash_password(password).await?),
        None => None,
    };
    let user = state
        .db()?
        .update_user(id, name, password_hash.as_deref())?;
    tracing::info!(user_id = id, "updated user");
    Ok(Json(user))
}

/// DELETE /api/users/{id}
///
/// Unknown ids are a bad request here, not a 404.
pub async fn delete_user(
    State(state): State<AppState>,
    id: IdPath,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    match state.db()?.delete_user(id) {
        Ok(()) => {
            tracing::info!(user_id = id, "deleted user");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(DbError::NotFound { .. }) => {
            Err(AppError::BadRequest(format!("user not found: {id}")))
        }
        Err(e) => Err(e.into()),
    }
}

// -- Languages --

pub async fn list_languages(State(state): State<AppState>) -> Result<Json<Vec<Language>>, AppError> {
    Ok(Json(state.db()?.list_languages()?))
}

pub async fn create_language(
    State(state): State<AppState>,
    body: JsonBody<NewLanguage>,
) -> Result<(StatusCode, Json<Language>), AppError> {
    let Json(req) = body?;
    let name = present(req.name.as_deref())
        .ok_or_else(|| AppError::BadRequest("name is required".to_string()))?;
    let language = state.db()?.insert_language(name)?;
    tracing::info!(language_id = language.id, name, "created language");
    Ok((StatusCode::CREATED, Json(language)))
}

pub async fn get_language(
    State(state): State<AppState>,
    id: IdPath,
) -> Result<Json<Language>, AppError> {
    let Path(id) = id?;
    let language = state
        .db()?
        .get_language(id)?
        .ok_or_else(|| AppError::NotFound(format!("language not found: {id}")))?;
    Ok(Json(language))
}

pub async fn delete_language(
    State(state): State<AppState>,
    id: IdPath,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    state.db()?.delete_language(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Catalogs --

/// GET /api/catalogs?user_id=&language_id=
pub async fn list_catalogs(
    State(state): State<AppState>,
    filter: Result<Query<CatalogFilter>, QueryRejection>,
) -> Result<Json<Vec<Catalog>>, AppError> {
    let Query(filter) = filter?;
    Ok(Json(state.db()?.list_catalogs(filter)?))
}

pub async fn create_catalog(
    State(state): State<AppState>,
    body: JsonBody<NewCatalog>,
) -> Result<(StatusCode, Json<Catalog>), AppError> {
    let Json(req) = body?;
    let (Some(name), Some(language_id), Some(user_id)) =
        (present(req.name.as_deref()), req.language_id, req.user_id)
    else {
        return Err(AppError::BadRequest(
            "name, language_id and user_id are required".to_string(),
        ));
    };

    let catalog = state.db()?.insert_catalog(name, language_id, user_id)?;
    tracing::info!(catalog_id = catalog.id, user_id, "created catalog");
    Ok((StatusCode::CREATED, Json(catalog)))
}

pub async fn get_catalog(
    State(state): State<AppState>,
    id: IdPath,
) -> Result<Json<Catalog>, AppError> {
    let Path(id) = id?;
    let catalog = state
        .db()?
        .get_catalog(id)?
        .ok_or_else(|| AppError::NotFound(format!("catalog not found: {id}")))?;
    Ok(Json(catalog))
}

pub async fn update_catalog(
    State(state): State<AppState>,
    id: IdPath,
    body: JsonBody<CatalogChanges>,
) -> Result<Json<Catalog>, AppError> {
    let Path(id) = id?;
    let Json(req) = body?;
    let name = present(req.name.as_deref());
    if name.is_none() && req.language_id.is_none() {
        return Err(AppError::BadRequest(
            "name or language_id is required".to_string(),
        ));
    }
    let catalog = state.db()?.update_catalog(id, name, req.language_id)?;
    Ok(Json(catalog))
}

pub async fn delete_catalog(
    State(state): State<AppState>,
    id: IdPath,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    state.db()?.delete_catalog(id)?;
    tracing::info!(catalog_id = id, "deleted catalog");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/catalogs/{id}/words
pub async fn list_words(
    State(state): State<AppState>,
    catalog_id: IdPath,
) -> Result<Json<Vec<Word>>, AppError> {
    let Path(catalog_id) = catalog_id?;
    let db = state.db()?;
    if db.get_catalog(catalog_id)?.is_none() {
        return Err(AppError::NotFound(format!(
            "catalog not found: {catalog_id}"
        )));
    }
    Ok(Json(db.list_words(catalog_id)?))
}

/// POST /api/catalogs/{id}/words
pub async fn create_word(
    State(state): State<AppState>,
    catalog_id: IdPath,
    body: JsonBody<NewWord>,
) -> Result<(StatusCode, Json<Word>), AppError> {
    let Path(catalog_id) = catalog_id?;
    let Json(req) = body?;
    let name = present(req.name.as_deref())
        .ok_or_else(|| AppError::BadRequest("name is required".to_string()))?;

    let word = state.db()?.insert_word(
        catalog_id,
        name,
        present(req.pronunciation.as_deref()),
        present(req.value.as_deref()),
    )?;
    tracing::debug!(word_id = word.id, catalog_id, "created word");
    Ok((StatusCode::CREATED, Json(word)))
}

// -- Words --

pub async fn get_word(
    State(state): State<AppState>,
    id: IdPath,
) -> Result<Json<Word>, AppError> {
    let Path(id) = id?;
    let word = state
        .db()?
        .get_word(id)?
        .ok_or_else(|| AppError::NotFound(format!("word not found: {id}")))?;
    Ok(Json(word))
}

pub async fn update_word(
    State(state): State<AppState>,
    id: IdPath,
    body: JsonBody<WordChanges>,
) -> Result<Json<Word>, AppError> {
    let Path(id) = id?;
    let Json(req) = body?;
    if req.is_empty() {
        return Err(AppError::BadRequest(
            "name, pronunciation or value is required".to_string(),
        ));
    }
    let word = state.db()?.update_word(
        id,
        present(req.name.as_deref()),
        present(req.pronunciation.as_deref()),
        present(req.value.as_deref()),
    )?;
    Ok(Json(word))
}

pub async fn delete_word(
    State(state): State<AppState>,
    id: IdPath,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    state.db()?.delete_word(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Stats --

pub async fn stats(State(state): State<AppState>) -> Result<Json<Counts>, AppError> {
    Ok(Json(state.db()?.counts()?))
}

pub async fn health() -> &'static str {
    "ok"
}
