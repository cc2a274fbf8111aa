use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::api::extract::{AppJson, AppPath};
use crate::api::response::ApiResponse;
use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::{Villa, VillaCreateDto, VillaDto, VillaUpdateDto};
use crate::patch::{self, Patch};
use crate::repository::{Filter, Repository, RepositoryError, VillaRepository};

const BASE_PATH: &str = "/api/VillaAPI";
const DUPLICATE_NAME: &str = "Villa already exist";

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Villa with Id = {} Not Found!", id))
}

fn name_conflict(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::Conflict { .. } => AppError::Conflict(DUPLICATE_NAME.to_string()),
        other => other.into(),
    }
}

/// Fails when another villa already uses `name`, ignoring case.
async fn ensure_unique_name(
    repo: &dyn VillaRepository,
    name: &str,
    except: Option<i32>,
) -> Result<()> {
    let mut filter = Filter::eq_ignore_case(Villa::NAME, name);
    if let Some(id) = except {
        filter = filter.and(Filter::ne(Villa::ID, id));
    }
    if repo.get(Some(filter), false).await?.is_some() {
        return Err(AppError::Conflict(DUPLICATE_NAME.to_string()));
    }
    Ok(())
}

fn reject_zero_id(id: i32) -> Result<()> {
    if id == 0 {
        return Err(AppError::BadRequest("Villa id must not be 0".to_string()));
    }
    Ok(())
}

/// List all villas
#[utoipa::path(get, path = "/api/VillaAPI", tag = "Villas",
    responses((status = 200, description = "All villas", body = ApiResponse)))]
pub async fn get_villas(State(state): State<AppState>) -> Result<ApiResponse> {
    tracing::info!("Getting all villas");

    let villas = state.store.villas().get_all(None).await?;
    let dtos: Vec<VillaDto> = villas.into_iter().map(VillaDto::from).collect();

    ApiResponse::with_result(StatusCode::OK, &dtos)
}

/// Fetch one villa by id
#[utoipa::path(get, path = "/api/VillaAPI/{id}", tag = "Villas",
    params(("id" = i32, Path, description = "Villa id")),
    responses(
        (status = 200, description = "The villa", body = ApiResponse),
        (status = 400, description = "Id is 0", body = ApiResponse),
        (status = 404, description = "No such villa", body = ApiResponse)))]
pub async fn get_villa(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse> {
    reject_zero_id(id)?;

    let villa = state
        .store
        .villas()
        .get(Some(Filter::eq(Villa::ID, id)), false)
        .await?
        .ok_or_else(|| not_found(id))?;

    ApiResponse::with_result(StatusCode::OK, &VillaDto::from(villa))
}

/// Create a villa
#[utoipa::path(post, path = "/api/VillaAPI", tag = "Villas",
    request_body = VillaCreateDto,
    responses(
        (status = 201, description = "Villa created", body = ApiResponse),
        (status = 400, description = "Invalid or duplicate villa", body = ApiResponse)))]
pub async fn create_villa(
    State(state): State<AppState>,
    AppJson(dto): AppJson<VillaCreateDto>,
) -> Result<Response> {
    dto.validate().map_err(AppError::Validation)?;

    let repo = state.store.villas();
    ensure_unique_name(repo.as_ref(), &dto.name, None).await?;

    let villa = repo.create(Villa::from(dto)).await.map_err(name_conflict)?;
    repo.save().await.map_err(name_conflict)?;

    tracing::info!(villa_id = villa.id, name = %villa.name, "Created villa");

    let location = format!("{}/{}", BASE_PATH, villa.id);
    let envelope = ApiResponse::with_result(StatusCode::CREATED, &VillaDto::from(villa))?;
    Ok(([(header::LOCATION, location)], envelope).into_response())
}

/// Delete a villa
#[utoipa::path(delete, path = "/api/VillaAPI/{id}", tag = "Villas",
    params(("id" = i32, Path, description = "Villa id")),
    responses(
        (status = 200, description = "Deleted; envelope status 204", body = ApiResponse),
        (status = 400, description = "Id is 0", body = ApiResponse),
        (status = 404, description = "No such villa", body = ApiResponse)))]
pub async fn delete_villa(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse> {
    reject_zero_id(id)?;

    let repo = state.store.villas();
    let villa = repo
        .get(Some(Filter::eq(Villa::ID, id)), true)
        .await?
        .ok_or_else(|| not_found(id))?;

    repo.remove(&villa).await?;
    repo.save().await?;

    tracing::info!(villa_id = id, "Deleted villa");

    Ok(ApiResponse::success(StatusCode::NO_CONTENT))
}

/// Replace a villa's editable fields
#[utoipa::path(put, path = "/api/VillaAPI/{id}", tag = "Villas",
    params(("id" = i32, Path, description = "Villa id")),
    request_body = VillaUpdateDto,
    responses(
        (status = 200, description = "Updated; envelope status 204", body = ApiResponse),
        (status = 400, description = "Id mismatch, invalid body or duplicate name", body = ApiResponse),
        (status = 404, description = "No such villa", body = ApiResponse)))]
pub async fn update_villa(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(dto): AppJson<VillaUpdateDto>,
) -> Result<ApiResponse> {
    if id != dto.id {
        return Err(AppError::BadRequest(
            "Villa id in the path does not match the body".to_string(),
        ));
    }
    dto.validate().map_err(AppError::Validation)?;

    let repo = state.store.villas();
    let mut villa = repo
        .get(Some(Filter::eq(Villa::ID, id)), true)
        .await?
        .ok_or_else(|| not_found(id))?;
    ensure_unique_name(repo.as_ref(), &dto.name, Some(id)).await?;

    villa.apply(dto);
    repo.update(villa).await.map_err(name_conflict)?;
    repo.save().await.map_err(name_conflict)?;

    tracing::info!(villa_id = id, "Updated villa");

    Ok(ApiResponse::success(StatusCode::NO_CONTENT))
}

/// Apply a JSON Patch to a villa
#[utoipa::path(patch, path = "/api/VillaAPI/{id}", tag = "Villas",
    params(("id" = i32, Path, description = "Villa id")),
    responses(
        (status = 200, description = "Patched; envelope status 204", body = ApiResponse),
        (status = 400, description = "Patch failed, result invalid or duplicate name", body = ApiResponse),
        (status = 404, description = "No such villa", body = ApiResponse)))]
pub async fn patch_villa(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(patch_doc): AppJson<Patch>,
) -> Result<ApiResponse> {
    reject_zero_id(id)?;

    let repo = state.store.villas();
    let mut villa = repo
        .get(Some(Filter::eq(Villa::ID, id)), true)
        .await?
        .ok_or_else(|| not_found(id))?;

    let current = VillaUpdateDto::from(villa.clone());
    let patched = patch::apply_to(&current, &patch_doc)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if patched.id != id {
        return Err(AppError::BadRequest("Villa id cannot be changed".to_string()));
    }
    patched.validate().map_err(AppError::Validation)?;
    ensure_unique_name(repo.as_ref(), &patched.name, Some(id)).await?;

    villa.apply(patched);
    repo.update(villa).await.map_err(name_conflict)?;
    repo.save().await.map_err(name_conflict)?;

    tracing::info!(villa_id = id, operations = patch_doc.0.len(), "Patched villa");

    Ok(ApiResponse::success(StatusCode::NO_CONTENT))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(BASE_PATH, get(get_villas).post(create_villa))
        .route(
            "/api/VillaAPI/:id",
            get(get_villa)
                .put(update_villa)
                .patch(patch_villa)
                .delete(delete_villa),
        )
}
