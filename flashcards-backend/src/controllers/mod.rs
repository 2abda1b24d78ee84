pub mod cards;
pub mod errors;
pub mod health;

use actix_web::http::header;
use actix_web::{HttpResponse, web};
use std::sync::Arc;

use crate::AppState;
use crate::db::{Database, StoreError, StoreResult};

/// Run a storage call on the blocking thread pool so the worker stays free
pub(crate) async fn with_db<T, F>(state: &web::Data<AppState>, f: F) -> StoreResult<T>
where
    F: FnOnce(&Database) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let db = Arc::clone(&state.db);
    web::block(move || f(&db))
        .await
        .map_err(|e| StoreError::Blocking(e.to_string()))?
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}
