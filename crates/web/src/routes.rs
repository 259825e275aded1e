//! Request handlers.
//!
//! Page handlers load the caller's session, run one workflow step, queue its notices and
//! redirect back to `/`. The JSON handlers are read-only.

use crate::error::WebError;
use crate::pages::{self, PageBody, PageContext, PlanningRow};
use crate::sessions::Visit;
use crate::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::HeaderMap,
    response::{Html, Json, Redirect, Response},
    Form,
};
use repas_core::{
    DaySlot, NewRecipe, Notice, Page, PlanningAssignment, RecipeView, RepasError, Session,
    UploadedFile,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
    /// `connected` or `unconfigured`.
    pub backend: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipeRes {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub pdf_url: Option<String>,
    pub created_at: Option<String>,
}

impl From<RecipeView> for RecipeRes {
    fn from(view: RecipeView) -> Self {
        Self {
            id: view.id,
            name: view.name,
            image_url: view.image_url,
            pdf_url: view.pdf_url,
            created_at: view.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlanningRes {
    pub week_label: String,
    pub day_slot: String,
    pub recipe_id: String,
}

impl From<PlanningAssignment> for PlanningRes {
    fn from(assignment: PlanningAssignment) -> Self {
        Self {
            week_label: assignment.week_label,
            day_slot: assignment.day_slot.to_string(),
            recipe_id: assignment.recipe_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NavigateForm {
    page: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmForm {
    #[serde(default)]
    recipe_id: Option<String>,
}

fn parse_slot(slot: &str) -> Result<DaySlot, WebError> {
    slot.parse()
        .map_err(|_| WebError::NotFound(format!("unknown slot '{}'", slot)))
}

/// Renders the session's current page.
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut visit = Visit::start(state.sessions(), &headers);

    let body = match visit.session.page() {
        Page::Home => PageBody::Home,
        Page::Recettes => match state.recipes().list().await {
            Ok(recipes) => PageBody::Recettes(recipes),
            Err(e) => {
                tracing::error!("could not list recipes: {}", e);
                visit.session.notify(Notice::error(e.to_string()));
                PageBody::Recettes(Vec::new())
            }
        },
        Page::Planning => PageBody::Planning(planning_rows(&state, &mut visit.session).await),
        Page::Liste => PageBody::Liste,
    };

    let ctx = PageContext {
        configured: state.backend().is_configured(),
        notices: visit.session.take_notices(),
        body,
    };
    let html = Html(pages::render(&ctx));
    visit.finish(state.sessions(), html)
}

async fn planning_rows(state: &AppState, session: &mut Session) -> Vec<PlanningRow> {
    let slots = state.planning().slots();

    let choices = if slots.iter().any(|slot| session.is_assigning(*slot)) {
        match state.recipes().choices().await {
            Ok(choices) => choices,
            Err(e) => {
                tracing::error!("could not load recipe choices: {}", e);
                session.notify(Notice::error(e.to_string()));
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let assignments = match state.planning().assignments().await {
        Ok(assignments) => assignments,
        Err(e) => {
            tracing::error!("could not load planning: {}", e);
            session.notify(Notice::error(e.to_string()));
            Vec::new()
        }
    };

    slots
        .iter()
        .map(|slot| PlanningRow {
            slot: *slot,
            assigned: assignments.iter().filter(|a| a.day_slot == *slot).count(),
            picker: session.is_assigning(*slot).then(|| choices.clone()),
        })
        .collect()
}

pub async fn navigate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<NavigateForm>,
) -> Result<Response, WebError> {
    let page: Page = form.page.parse()?;
    let mut visit = Visit::start(state.sessions(), &headers);
    visit.session.navigate(page);
    Ok(visit.finish(state.sessions(), Redirect::to("/")))
}

async fn read_recipe_form(mut multipart: Multipart) -> Result<NewRecipe, WebError> {
    let bad_request = |e: axum::extract::multipart::MultipartError| WebError::BadRequest(e.to_string());
    let mut form = NewRecipe::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "name" => form.name = field.text().await.map_err(bad_request)?,
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(bad_request)?;
                form.file = Some(UploadedFile {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            other => tracing::debug!("ignoring form field '{}'", other),
        }
    }
    Ok(form)
}

pub async fn create_recipe(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, WebError> {
    let form = read_recipe_form(multipart).await?;
    let mut visit = Visit::start(state.sessions(), &headers);

    match state.recipes().create(form).await {
        Ok(outcome) => visit.session.notify_all(outcome.notices()),
        Err(RepasError::InvalidInput(_)) => {}
        Err(e @ RepasError::UnsupportedExtension(_)) => {
            tracing::warn!("rejected upload: {}", e);
            visit.session.notify(Notice::error(e.to_string()));
        }
        Err(e) => {
            tracing::error!("recipe creation failed: {}", e);
            visit.session.notify(Notice::error(e.to_string()));
        }
    }

    Ok(visit.finish(state.sessions(), Redirect::to("/")))
}

pub async fn begin_assign(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slot): Path<String>,
) -> Result<Response, WebError> {
    let slot = parse_slot(&slot)?;
    let mut visit = Visit::start(state.sessions(), &headers);
    state.planning().begin_assign(&mut visit.session, slot);
    Ok(visit.finish(state.sessions(), Redirect::to("/")))
}

pub async fn confirm_assign(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slot): Path<String>,
    Form(form): Form<ConfirmForm>,
) -> Result<Response, WebError> {
    let slot = parse_slot(&slot)?;
    let mut visit = Visit::start(state.sessions(), &headers);

    match state
        .planning()
        .confirm(&mut visit.session, slot, form.recipe_id)
        .await
    {
        Ok(outcome) => visit.session.notify_all(outcome.notices()),
        Err(e) => visit.session.notify(Notice::error(e.to_string())),
    }

    Ok(visit.finish(state.sessions(), Redirect::to("/")))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint, reporting whether a backend is configured.
pub async fn health(State(state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Repas is alive".into(),
        backend: state.backend().mode_label().into(),
    })
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    responses(
        (status = 200, description = "Recipes, newest first, with signed links", body = [RecipeRes]),
        (status = 502, description = "Backend query failed")
    )
)]
/// List every recipe.
///
/// Links are signed on each call and omitted when signing fails.
pub async fn list_recipes(State(state): State<AppState>) -> Result<Json<Vec<RecipeRes>>, WebError> {
    let recipes = state.recipes().list().await?;
    Ok(Json(recipes.into_iter().map(RecipeRes::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/planning",
    responses(
        (status = 200, description = "Assignments for the configured week", body = [PlanningRes]),
        (status = 502, description = "Backend query failed")
    )
)]
pub async fn list_planning(
    State(state): State<AppState>,
) -> Result<Json<Vec<PlanningRes>>, WebError> {
    let assignments = state.planning().assignments().await?;
    Ok(Json(assignments.into_iter().map(PlanningRes::from).collect()))
}
