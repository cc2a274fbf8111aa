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
use crate::models::{VillaNumber, VillaNumberCreateDto, VillaNumberDto, VillaNumberUpdateDto};
use crate::repository::{Filter, Repository, RepositoryError, VillaNumberRepository};

const BASE_PATH: &str = "/api/VillaNumberAPI";
const DUPLICATE_NUMBER: &str = "Villa with same villa id already exist!";

fn by_villa_no(villa_no: i32) -> Option<Filter> {
    Some(Filter::eq(VillaNumber::VILLA_NO, villa_no))
}

fn number_conflict(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::Conflict { .. } => AppError::Conflict(DUPLICATE_NUMBER.to_string()),
        other => other.into(),
    }
}

/// List all villa numbers
#[utoipa::path(get, path = "/api/VillaNumberAPI", tag = "Villa numbers",
    responses((status = 200, description = "All villa numbers", body = ApiResponse)))]
pub async fn get_villa_numbers(State(state): State<AppState>) -> Result<ApiResponse> {
    tracing::info!("Getting all villa numbers");

    let numbers = state.store.villa_numbers().get_all(None).await?;
    let dtos: Vec<VillaNumberDto> = numbers.into_iter().map(VillaNumberDto::from).collect();

    ApiResponse::with_result(StatusCode::OK, &dtos)
}

/// Fetch one villa number
#[utoipa::path(get, path = "/api/VillaNumberAPI/{villa_no}", tag = "Villa numbers",
    params(("villa_no" = i32, Path, description = "Villa number")),
    responses(
        (status = 200, description = "The villa number", body = ApiResponse),
        (status = 404, description = "No such villa number", body = ApiResponse)))]
pub async fn get_villa_number(
    State(state): State<AppState>,
    AppPath(villa_no): AppPath<i32>,
) -> Result<ApiResponse> {
    tracing::info!(villa_no, "Getting villa number");

    let number = state
        .store
        .villa_numbers()
        .get(by_villa_no(villa_no), false)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Villa number with VillaNo = {} Not Found!", villa_no))
        })?;

    ApiResponse::with_result(StatusCode::OK, &VillaNumberDto::from(number))
}

/// Create a villa number
#[utoipa::path(post, path = "/api/VillaNumberAPI", tag = "Villa numbers",
    request_body = VillaNumberCreateDto,
    responses(
        (status = 201, description = "Villa number created", body = ApiResponse),
        (status = 400, description = "Invalid or duplicate villa number", body = ApiResponse)))]
pub async fn create_villa_number(
    State(state): State<AppState>,
    AppJson(dto): AppJson<VillaNumberCreateDto>,
) -> Result<Response> {
    tracing::info!(villa_no = dto.villa_no, "Creating villa number");
    dto.validate().map_err(AppError::Validation)?;

    let repo = state.store.villa_numbers();
    if repo.get(by_villa_no(dto.villa_no), false).await?.is_some() {
        return Err(AppError::Conflict(DUPLICATE_NUMBER.to_string()));
    }

    let number = repo
        .create(VillaNumber::from(dto))
        .await
        .map_err(number_conflict)?;
    repo.save().await.map_err(number_conflict)?;

    let location = format!("{}/{}", BASE_PATH, number.villa_no);
    let envelope = ApiResponse::with_result(StatusCode::CREATED, &VillaNumberDto::from(number))?;
    Ok(([(header::LOCATION, location)], envelope).into_response())
}

/// Delete a villa number
#[utoipa::path(delete, path = "/api/VillaNumberAPI/{villa_no}", tag = "Villa numbers",
    params(("villa_no" = i32, Path, description = "Villa number")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse),
        (status = 404, description = "No such villa number", body = ApiResponse)))]
pub async fn delete_villa_number(
    State(state): State<AppState>,
    AppPath(villa_no): AppPath<i32>,
) -> Result<ApiResponse> {
    tracing::info!(villa_no, "Deleting villa number");

    let repo = state.store.villa_numbers();
    let number = repo
        .get(by_villa_no(villa_no), true)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Villa number with VillaNo = {} Not Found!", villa_no))
        })?;

    repo.remove(&number).await?;
    repo.save().await?;

    Ok(ApiResponse::success(StatusCode::OK))
}

/// Replace a villa number's details
#[utoipa::path(put, path = "/api/VillaNumberAPI/{villa_no}", tag = "Villa numbers",
    params(("villa_no" = i32, Path, description = "Villa number")),
    request_body = VillaNumberUpdateDto,
    responses(
        (status = 200, description = "Updated", body = ApiResponse),
        (status = 400, description = "Villa numbers differ or body invalid", body = ApiResponse),
        (status = 404, description = "No such villa number", body = ApiResponse)))]
pub async fn update_villa_number(
    State(state): State<AppState>,
    AppPath(villa_no): AppPath<i32>,
    AppJson(dto): AppJson<VillaNumberUpdateDto>,
) -> Result<ApiResponse> {
    tracing::info!(villa_no, "Updating villa number");

    if dto.villa_no != villa_no {
        return Err(AppError::BadRequest(
            "Provided VillaNo's are not same!".to_string(),
        ));
    }
    dto.validate().map_err(AppError::Validation)?;

    let repo = state.store.villa_numbers();
    let mut number = repo
        .get(by_villa_no(villa_no), true)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Villa with VillaNo = {} Not Found!", villa_no))
        })?;

    number.apply(dto);
    repo.update(number).await?;
    repo.save().await?;

    Ok(ApiResponse::success(StatusCode::OK))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(BASE_PATH, get(get_villa_numbers).post(create_villa_number))
        .route(
            "/api/VillaNumberAPI/:villa_no",
            get(get_villa_number)
                .put(update_villa_number)
                .delete(delete_villa_number),
        )
}
