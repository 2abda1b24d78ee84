//! Card pages: list, show, new, create, edit, update, delete.
//!
//! Mutating operations always end in a redirect with exactly one flash
//! message; read operations render a page, or flash and redirect to the list
//! when the card cannot be loaded.

use actix_web::{HttpResponse, web};
use minijinja::{Value, context};

use super::{redirect, with_db};
use crate::AppState;
use crate::db::StoreError;
use crate::error::AppError;
use crate::models::{CardForm, FlashMessage, TagOption};
use crate::session::FlashSession;
use crate::templates::render_page;

const CARDS_PATH: &str = "/cards";

const CARD_NOT_FOUND: &str = "Can't find that card";
const CREATE_FAILED: &str = "Failed to create card";
const UPDATE_FAILED: &str = "Failed to update card";
const DELETE_FAILED: &str = "Failed to delete card";
const TAGS_UNAVAILABLE: &str = "Failed to load tags";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index));
    cfg.service(
        web::scope(CARDS_PATH)
            .route("", web::get().to(list))
            .route("", web::post().to(create))
            .route("/new", web::get().to(new))
            .route("/{card_id}", web::get().to(show))
            .route("/{card_id}", web::put().to(update))
            .route("/{card_id}", web::patch().to(update))
            .route("/{card_id}", web::delete().to(delete))
            .route("/{card_id}/edit", web::get().to(edit)),
    );
}

fn parse_card_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

fn card_path(raw_id: &str) -> String {
    format!("{}/{}", CARDS_PATH, urlencoding::encode(raw_id.trim()))
}

fn render(
    state: &web::Data<AppState>,
    flash: &FlashSession,
    template_name: &str,
    page: Value,
) -> Result<HttpResponse, AppError> {
    let html = render_page(state.templates.as_ref(), template_name, flash, page)?;
    Ok(flash.finish(
        HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(html),
    ))
}

async fn index() -> HttpResponse {
    redirect(CARDS_PATH)
}

/// All cards, ordered by front
async fn list(state: web::Data<AppState>, flash: FlashSession) -> Result<HttpResponse, AppError> {
    let cards = with_db(&state, |db| db.list_cards()).await?;
    render(&state, &flash, "cards/list.html", context! { cards => cards })
}

/// Creation form
async fn new(state: web::Data<AppState>, mut flash: FlashSession) -> Result<HttpResponse, AppError> {
    match with_db(&state, |db| db.list_tags()).await {
        Ok(tags) => {
            let tags = TagOption::from_tags(&tags, &[]);
            render(&state, &flash, "cards/new.html", context! { tags => tags })
        }
        Err(e) => {
            log::error!("Failed to load tags for new card form: {}", e);
            flash.push(FlashMessage::fail(TAGS_UNAVAILABLE));
            Ok(flash.finish(redirect(CARDS_PATH)))
        }
    }
}

async fn create(
    state: web::Data<AppState>,
    mut flash: FlashSession,
    body: web::Bytes,
) -> HttpResponse {
    let form = CardForm::parse(&body);
    let result = match form.to_new_card() {
        Ok(new_card) => with_db(&state, move |db| db.create_card(&new_card)).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(card) => {
            log::info!("Created card {} ('{}')", card.id, card.front);
            flash.push(FlashMessage::success(format!("Card '{}' created", card.front)));
        }
        Err(e) => {
            log::warn!("Failed to create card: {}", e);
            flash.push(FlashMessage::fail(CREATE_FAILED));
        }
    }

    flash.finish(redirect(CARDS_PATH))
}

/// One card with its tags
async fn show(
    state: web::Data<AppState>,
    mut flash: FlashSession,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let raw_id = path.into_inner();
    let lookup = match parse_card_id(&raw_id) {
        Some(id) => with_db(&state, move |db| db.get_card_with_tags(id)).await,
        None => Err(StoreError::NotFound),
    };

    match lookup {
        Ok(card) => render(&state, &flash, "cards/show.html", context! { card => card }),
        Err(e) => {
            log_lookup_failure(&raw_id, &e);
            flash.push(FlashMessage::fail(CARD_NOT_FOUND));
            Ok(flash.finish(redirect(CARDS_PATH)))
        }
    }
}

/// Edit form, with every tag offered and the card's own tags preselected
async fn edit(
    state: web::Data<AppState>,
    mut flash: FlashSession,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let raw_id = path.into_inner();
    let lookup = match parse_card_id(&raw_id) {
        Some(id) => {
            with_db(&state, move |db| {
                let card = db.get_card_with_tags(id)?;
                let tags = db.list_tags()?;
                Ok((card, tags))
            })
            .await
        }
        None => Err(StoreError::NotFound),
    };

    match lookup {
        Ok((card, tags)) => {
            let tags = TagOption::from_tags(&tags, &card.tag_ids());
            render(
                &state,
                &flash,
                "cards/edit.html",
                context! { card => card, tags => tags },
            )
        }
        Err(e) => {
            log_lookup_failure(&raw_id, &e);
            flash.push(FlashMessage::fail(CARD_NOT_FOUND));
            Ok(flash.finish(redirect(CARDS_PATH)))
        }
    }
}

/// Apply the submitted fields and replace the tag set. The identifier in the
/// body wins over the path; the redirect always targets that identifier.
async fn update(
    state: web::Data<AppState>,
    mut flash: FlashSession,
    path: web::Path<String>,
    body: web::Bytes,
) -> HttpResponse {
    let form = CardForm::parse(&body);
    let raw_id = form
        .id()
        .map(str::to_string)
        .unwrap_or_else(|| path.into_inner());

    let result = match (parse_card_id(&raw_id), form.to_changes()) {
        (Some(id), Ok(changes)) => with_db(&state, move |db| db.update_card(id, &changes)).await,
        (None, _) => Err(StoreError::NotFound),
        (_, Err(e)) => Err(e.into()),
    };

    match result {
        Ok(card) => {
            log::info!("Updated card {}", card.id);
            flash.push(FlashMessage::success("Card updated"));
        }
        Err(e) => {
            log::warn!("Failed to update card {}: {}", raw_id, e);
            flash.push(FlashMessage::fail(UPDATE_FAILED));
        }
    }

    flash.finish(redirect(&card_path(&raw_id)))
}

async fn delete(
    state: web::Data<AppState>,
    mut flash: FlashSession,
    path: web::Path<String>,
) -> HttpResponse {
    let raw_id = path.into_inner();
    let result = match parse_card_id(&raw_id) {
        Some(id) => with_db(&state, move |db| db.delete_card(id)).await,
        None => Err(StoreError::NotFound),
    };

    match result {
        Ok(()) => {
            log::info!("Deleted card {}", raw_id);
            flash.push(FlashMessage::success("Card deleted"));
        }
        Err(e) => {
            log::warn!("Failed to delete card {}: {}", raw_id, e);
            flash.push(FlashMessage::fail(DELETE_FAILED));
        }
    }

    flash.finish(redirect(CARDS_PATH))
}

fn log_lookup_failure(raw_id: &str, error: &StoreError) {
    if error.is_not_found() {
        log::warn!("Card {} not found", raw_id);
    } else {
        log::error!("Failed to load card {}: {}", raw_id, error);
    }
}
