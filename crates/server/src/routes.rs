// Copyright 2024 tison <wander4096@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP handlers and route assembly for both daemon roles: a flat one-route-per-operation style
//! rather than a RESTful resource hierarchy.

use std::sync::Arc;

use graphd_kvstore::PartitionStore;
use graphd_processor::TwoPhasePartStore;
use graphd_protos::ids::PartId;
use graphd_protos::ids::SchemaId;
use graphd_protos::request::AddEdgesRequest;
use graphd_protos::request::AddEdgesResponse;
use graphd_protos::request::AlterTagRequest;
use graphd_protos::request::CreateEdgeTypeRequest;
use graphd_protos::request::CreateIndexRequest;
use graphd_protos::request::CreateIndexResponse;
use graphd_protos::request::CreateSpaceRequest;
use graphd_protos::request::CreateSpaceResponse;
use graphd_protos::request::CreateTagRequest;
use graphd_protos::request::CreateUserRequest;
use graphd_protos::request::DropIndexRequest;
use graphd_protos::request::DropSpaceRequest;
use graphd_protos::request::ListHostsResponse;
use graphd_protos::request::ListIndexesResponse;
use graphd_protos::request::ListSpacesResponse;
use graphd_protos::request::ListUsersResponse;
use graphd_protos::request::LookupIndexRequest;
use graphd_protos::request::LookupIndexResponse;
use graphd_protos::request::RegisterHostRequest;
use graphd_protos::request::SpaceDesc;
use graphd_protos::request::UpdateVertexRequest;
use graphd_protos::request::UpdateVertexResponse;
use graphd_protos::request::UserRecord;
use graphd_protos::result::PartitionResult;
use graphd_protos::schema::SchemaVersion;
use poem::http::StatusCode;
use poem::middleware::AddData;
use poem::web::Data;
use poem::web::Json;
use poem::EndpointExt;
use poem::Route;
use serde::Deserialize;
use serde::Serialize;

use crate::error::HttpError;
use crate::state::AppState;
use crate::state::Role;

fn internal<E: std::fmt::Debug>(report: error_stack::Report<E>) -> HttpError {
    HttpError::from_report(StatusCode::INTERNAL_SERVER_ERROR)(report)
}

fn bad_request<E: std::fmt::Debug>(report: error_stack::Report<E>) -> HttpError {
    HttpError::from_report(StatusCode::BAD_REQUEST)(report)
}

#[poem::handler]
pub async fn health_check() -> poem::Result<String> {
    Ok("OK".to_string())
}

// -------------------------------------------------------------------------------------------
// Storage daemon: lookupIndex, addEdgesAtomic, updateVertex
// -------------------------------------------------------------------------------------------

/// Runs `request`'s plan over every partition the space is registered under and merges the
/// per-partition responses: rows are concatenated, a partition that errors contributes one
/// `PartitionResult` to `failures` rather than failing the whole request (spec §4.6's "only
/// failures are reported" rule, generalized from writes to this read fan-out).
async fn fanout_lookup_index(state: &AppState, request: &LookupIndexRequest) -> LookupIndexResponse {
    let catalog = match state.catalog().await {
        Ok(catalog) => catalog,
        Err(err) => {
            log::error!(err:?; "failed to load catalog snapshot for lookupIndex");
            return LookupIndexResponse::default();
        }
    };

    let parts = state.manager.parts(request.space_id).await;
    let mut column_names = Vec::new();
    let mut rows = Vec::new();
    let mut failures = Vec::new();

    for part in parts {
        match graphd_planner::execute_on_partition(request, &catalog.planner, state.store.as_ref(), part).await {
            Ok(response) => {
                if column_names.is_empty() {
                    column_names = response.column_names;
                }
                rows.extend(response.rows);
            }
            Err(err) => {
                failures.push(PartitionResult::new(err.to_error_code(), part));
            }
        }
    }

    LookupIndexResponse {
        column_names,
        rows,
        failures,
    }
}

#[poem::handler]
pub async fn lookup_index(
    Data(state): Data<&Arc<AppState>>,
    Json(request): Json<LookupIndexRequest>,
) -> poem::Result<Json<LookupIndexResponse>> {
    Ok(Json(fanout_lookup_index(state, &request).await))
}

#[poem::handler]
pub async fn add_edges_atomic(
    Data(state): Data<&Arc<AppState>>,
    Json(request): Json<AddEdgesRequest>,
) -> poem::Result<Json<AddEdgesResponse>> {
    let catalog = state.catalog().await.map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.0))?;
    let txn = TwoPhasePartStore::new(state.store.as_ref());
    let response =
        graphd_processor::add_edges_atomic(state.store.as_ref(), &state.manager, &catalog.processor, &txn, request)
            .await;
    Ok(Json(response))
}

#[poem::handler]
pub async fn update_vertex(
    Data(state): Data<&Arc<AppState>>,
    Json(request): Json<UpdateVertexRequest>,
) -> poem::Result<Json<UpdateVertexResponse>> {
    let catalog = state.catalog().await.map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.0))?;
    let response = graphd_processor::update_vertex(state.store.as_ref(), &catalog.processor, request).await;
    Ok(Json(response))
}

// -------------------------------------------------------------------------------------------
// Meta daemon: spaces, tags, edge types, indexes, hosts, users
// -------------------------------------------------------------------------------------------

/// Provisions the partitions a freshly created space owns, in both the partition store and the
/// partition manager, with this daemon's own address as the sole replica. A real deployment would
/// place replicas across the registered host set; single-replica placement is this stand-in's
/// simplification.
async fn provision_space_parts(state: &AppState, desc: &SpaceDesc) {
    let peers = vec![state.self_addr.clone()];
    for part in 1..=desc.part_count {
        state.store.add_part(desc.space_id, PartId(part), peers.clone()).await;
        state.manager.add_part(desc.space_id, PartId(part), peers.clone()).await;
    }
}

#[poem::handler]
pub async fn create_space(
    Data(state): Data<&Arc<AppState>>,
    Json(request): Json<CreateSpaceRequest>,
) -> poem::Result<Json<CreateSpaceResponse>> {
    let response = graphd_meta::create_space(state.store.as_ref(), request.clone())
        .await
        .map_err(bad_request)?;
    let desc = SpaceDesc {
        space_id: response.space_id,
        name: request.name,
        part_count: request.part_count,
        replica_factor: request.replica_factor,
        vid_len: request.vid_len,
    };
    provision_space_parts(state, &desc).await;
    Ok(Json(response))
}

#[poem::handler]
pub async fn drop_space(
    Data(state): Data<&Arc<AppState>>,
    Json(request): Json<DropSpaceRequest>,
) -> poem::Result<Json<()>> {
    graphd_meta::drop_space(state.store.as_ref(), request).await.map_err(bad_request)?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
pub struct GetSpaceRequest {
    pub name: String,
}

#[poem::handler]
pub async fn get_space(
    Data(state): Data<&Arc<AppState>>,
    Json(request): Json<GetSpaceRequest>,
) -> poem::Result<Json<Option<SpaceDesc>>> {
    let space = graphd_meta::get_space(state.store.as_ref(), &request.name)
        .await
        .map_err(internal)?;
    Ok(Json(space))
}

#[poem::handler]
pub async fn list_spaces(Data(state): Data<&Arc<AppState>>) -> poem::Result<Json<ListSpacesResponse>> {
    let response = graphd_meta::list_spaces(state.store.as_ref()).await.map_err(internal)?;
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
pub struct SchemaIdResponse {
    pub schema_id: SchemaId,
}

#[poem::handler]
pub async fn create_tag(
    Data(state): Data<&Arc<AppState>>,
    Json(request): Json<CreateTagRequest>,
) -> poem::Result<Json<SchemaIdResponse>> {
    let schema_id = graphd_meta::create_tag(state.store.as_ref(), request).await.map_err(bad_request)?;
    Ok(Json(SchemaIdResponse { schema_id }))
}

#[poem::handler]
pub async fn create_edge_type(
    Data(state): Data<&Arc<AppState>>,
    Json(request): Json<CreateEdgeTypeRequest>,
) -> poem::Result<Json<SchemaIdResponse>> {
    let schema_id = graphd_meta::create_edge_type(state.store.as_ref(), request)
        .await
        .map_err(bad_request)?;
    Ok(Json(SchemaIdResponse { schema_id }))
}

#[poem::handler]
pub async fn alter_tag(
    Data(state): Data<&Arc<AppState>>,
    Json(request): Json<AlterTagRequest>,
) -> poem::Result<Json<()>> {
    graphd_meta::alter_tag(state.store.as_ref(), request).await.map_err(bad_request)?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
pub struct ListSchemaRequest {
    pub space_id: graphd_protos::ids::SpaceId,
}

#[poem::handler]
pub async fn list_tags(
    Data(state): Data<&Arc<AppState>>,
    Json(request): Json<ListSchemaRequest>,
) -> poem::Result<Json<Vec<SchemaVersion>>> {
    let tags = graphd_meta::list_tags(state.store.as_ref(), request.space_id)
        .await
        .map_err(internal)?;
    Ok(Json(tags))
}

#[poem::handler]
pub async fn list_edge_types(
    Data(state): Data<&Arc<AppState>>,
    Json(request): Json<ListSchemaRequest>,
) -> poem::Result<Json<Vec<SchemaVersion>>> {
    let edges = graphd_meta::list_edge_types(state.store.as_ref(), request.space_id)
        .await
        .map_err(internal)?;
    Ok(Json(edges))
}

#[poem::handler]
pub async fn create_tag_index(
    Data(state): Data<&Arc<AppState>>,
    Json(request): Json<CreateIndexRequest>,
) -> poem::Result<Json<CreateIndexResponse>> {
    let response = graphd_meta::create_tag_index(state.store.as_ref(), request)
        .await
        .map_err(bad_request)?;
    Ok(Json(response))
}

#[poem::handler]
pub async fn create_edge_index(
    Data(state): Data<&Arc<AppState>>,
    Json(request): Json<CreateIndexRequest>,
) -> poem::Result<Json<CreateIndexResponse>> {
    let response = graphd_meta::create_edge_index(state.store.as_ref(), request)
        .await
        .map_err(bad_request)?;
    Ok(Json(response))
}

#[poem::handler]
pub async fn drop_index(
    Data(state): Data<&Arc<AppState>>,
    Json(request): Json<DropIndexRequest>,
) -> poem::Result<Json<()>> {
    graphd_meta::drop_index(state.store.as_ref(), request).await.map_err(bad_request)?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
pub struct ListIndexesRequest {
    pub space_id: graphd_protos::ids::SpaceId,
}

#[poem::handler]
pub async fn list_indexes(
    Data(state): Data<&Arc<AppState>>,
    Json(request): Json<ListIndexesRequest>,
) -> poem::Result<Json<ListIndexesResponse>> {
    let response = graphd_meta::list_indexes(state.store.as_ref(), request.space_id)
        .await
        .map_err(internal)?;
    Ok(Json(response))
}

#[poem::handler]
pub async fn register_host(
    Data(state): Data<&Arc<AppState>>,
    Json(request): Json<RegisterHostRequest>,
) -> poem::Result<Json<()>> {
    graphd_meta::register_host(state.store.as_ref(), request).await.map_err(internal)?;
    Ok(Json(()))
}

#[poem::handler]
pub async fn list_hosts(Data(state): Data<&Arc<AppState>>) -> poem::Result<Json<ListHostsResponse>> {
    let response = graphd_meta::list_hosts(state.store.as_ref()).await.map_err(internal)?;
    Ok(Json(response))
}

#[poem::handler]
pub async fn create_user(
    Data(state): Data<&Arc<AppState>>,
    Json(request): Json<CreateUserRequest>,
) -> poem::Result<Json<()>> {
    graphd_meta::create_user(state.store.as_ref(), request).await.map_err(bad_request)?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
pub struct GetUserRequest {
    pub username: String,
}

#[poem::handler]
pub async fn get_user(
    Data(state): Data<&Arc<AppState>>,
    Json(request): Json<GetUserRequest>,
) -> poem::Result<Json<Option<UserRecord>>> {
    let user = graphd_meta::get_user(state.store.as_ref(), &request.username)
        .await
        .map_err(internal)?;
    Ok(Json(user))
}

#[poem::handler]
pub async fn list_users(Data(state): Data<&Arc<AppState>>) -> poem::Result<Json<ListUsersResponse>> {
    let response = graphd_meta::list_users(state.store.as_ref()).await.map_err(internal)?;
    Ok(Json(response))
}

/// Builds the `v1`-nested route for `role`, wiring `state` in via [`AddData`].
pub fn build_route(role: Role, state: Arc<AppState>) -> Route {
    let mut v1 = Route::new().at("/health", poem::get(health_check));

    v1 = match role {
        Role::Storage => v1
            .at("/lookup-index", poem::post(lookup_index))
            .at("/add-edges-atomic", poem::post(add_edges_atomic))
            .at("/update-vertex", poem::post(update_vertex)),
        Role::Meta => v1
            .at("/spaces/create", poem::post(create_space))
            .at("/spaces/drop", poem::post(drop_space))
            .at("/spaces/get", poem::post(get_space))
            .at("/spaces/list", poem::get(list_spaces))
            .at("/tags/create", poem::post(create_tag))
            .at("/tags/alter", poem::post(alter_tag))
            .at("/tags/list", poem::post(list_tags))
            .at("/edges/create", poem::post(create_edge_type))
            .at("/edges/list", poem::post(list_edge_types))
            .at("/indexes/create-tag", poem::post(create_tag_index))
            .at("/indexes/create-edge", poem::post(create_edge_index))
            .at("/indexes/drop", poem::post(drop_index))
            .at("/indexes/list", poem::post(list_indexes))
            .at("/hosts/register", poem::post(register_host))
            .at("/hosts/list", poem::get(list_hosts))
            .at("/users/create", poem::post(create_user))
            .at("/users/get", poem::post(get_user))
            .at("/users/list", poem::get(list_users)),
    };

    Route::new().nest("v1", v1.with(AddData::new(state)))
}
