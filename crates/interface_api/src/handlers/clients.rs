//! Client (insurer) handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use core_kernel::ClientId;
use domain_cases::Client;

use crate::{AppState, error::ApiError};
use crate::auth::CurrentUser;
use crate::dto::clients::*;

pub async fn list_clients(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ClientListQuery>,
) -> Result<Json<Vec<Client>>, ApiError> {
    current.require_admin()?;
    Ok(Json(state.clients().list(query.active_only).await?))
}

pub async fn create_client(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    current.require_admin()?;
    request.validate()?;

    let mut client = Client::new(&request.client_code, &request.client_name)?;
    client.location = request.location.filter(|l| !l.trim().is_empty());
    client.date_of_commencement = request.date_of_commencement;
    client.rates = request.rates;
    state.clients().insert(&client).await?;

    info!(by = %current.user.username, client_code = %client.client_code, "client created");
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn get_client(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Client>, ApiError> {
    current.require_admin()?;
    Ok(Json(state.clients().get_by_id(ClientId::from_uuid(id)).await?))
}

pub async fn update_client(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateClientRequest>,
) -> Result<Json<Client>, ApiError> {
    current.require_admin()?;
    request.validate()?;

    let clients = state.clients();
    let mut client = clients.get_by_id(ClientId::from_uuid(id)).await?;
    if let Some(name) = request.client_name {
        client.client_name = name.trim().to_string();
    }
    if let Some(location) = request.location {
        client.location = Some(location).filter(|l| !l.trim().is_empty());
    }
    if request.date_of_commencement.is_some() {
        client.date_of_commencement = request.date_of_commencement;
    }
    if let Some(rates) = request.rates {
        client.rates = rates;
    }
    if let Some(is_active) = request.is_active {
        client.is_active = is_active;
    }
    client.updated_at = Utc::now();
    clients.update(&client).await?;

    info!(by = %current.user.username, client_code = %client.client_code, "client updated");
    Ok(Json(client))
}
