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

//! The meta CRUD surface: spaces, tags, edge types, indexes, hosts, and users, all
//! stored as `serde_json`-encoded records under fixed key prefixes in the reserved meta partition
//! `(SpaceId(0), PartId(0))`. Every write here goes through the same [`graphd_kvstore::PartitionStore`]
//! the storage daemon uses for ordinary partitions — the meta partition is simply partition zero
//! of space zero, replicated the same way.

use error_stack::Result;
use error_stack::ResultExt;
use graphd_kvstore::PartitionStore;
use graphd_protos::ids::IndexId;
use graphd_protos::ids::SchemaId;
use graphd_protos::ids::SpaceId;
use graphd_protos::request::CreateEdgeTypeRequest;
use graphd_protos::request::CreateIndexRequest;
use graphd_protos::request::CreateIndexResponse;
use graphd_protos::request::CreateSpaceRequest;
use graphd_protos::request::CreateSpaceResponse;
use graphd_protos::request::CreateTagRequest;
use graphd_protos::request::CreateUserRequest;
use graphd_protos::request::DropIndexRequest;
use graphd_protos::request::DropSpaceRequest;
use graphd_protos::request::AlterTagRequest;
use graphd_protos::request::HostRecord;
use graphd_protos::request::ListHostsResponse;
use graphd_protos::request::ListIndexesResponse;
use graphd_protos::request::ListSpacesResponse;
use graphd_protos::request::ListUsersResponse;
use graphd_protos::request::RegisterHostRequest;
use graphd_protos::request::SpaceDesc;
use graphd_protos::request::UserRecord;
use graphd_protos::request::META_PART_ID;
use graphd_protos::request::META_SPACE_ID;
use graphd_protos::schema::IndexItem;
use graphd_protos::schema::SchemaVersion;

use crate::error::MetaError;
use crate::keys;

/// The root user seeded at first boot. A real deployment rotates this immediately after bootstrap;
/// this crate only guarantees the account exists, not that its password stays a secret.
const DEFAULT_ROOT_PASSWORD_HASH: &str = "root";

async fn get_record<S: PartitionStore, T: serde::de::DeserializeOwned>(
    store: &S,
    key: Vec<u8>,
) -> Result<Option<T>, MetaError> {
    let bytes = store
        .get(META_SPACE_ID, META_PART_ID, key)
        .await
        .change_context_lazy(|| MetaError("failed to read meta record".to_string()))?;
    bytes
        .map(|bytes| {
            serde_json::from_slice(&bytes)
                .change_context_lazy(|| MetaError("failed to decode meta record".to_string()))
        })
        .transpose()
}

async fn put_record<S: PartitionStore, T: serde::Serialize>(
    store: &S,
    key: Vec<u8>,
    value: &T,
) -> Result<(), MetaError> {
    let bytes = serde_json::to_vec(value)
        .change_context_lazy(|| MetaError("failed to encode meta record".to_string()))?;
    let code = store.multi_put(META_SPACE_ID, META_PART_ID, vec![(key, bytes)]).await;
    if !code.is_success() {
        return Err(MetaError(format!("meta write rejected: {code:?}")).into());
    }
    Ok(())
}

async fn remove_record<S: PartitionStore>(store: &S, key: Vec<u8>) -> Result<(), MetaError> {
    let code = store.multi_remove(META_SPACE_ID, META_PART_ID, vec![key]).await;
    if !code.is_success() {
        return Err(MetaError(format!("meta remove rejected: {code:?}")).into());
    }
    Ok(())
}

async fn scan_prefix<S: PartitionStore, T: serde::de::DeserializeOwned>(
    store: &S,
    prefix: Vec<u8>,
) -> Result<Vec<T>, MetaError> {
    let mut out = Vec::new();
    let mut resume_after = None;
    loop {
        let request = graphd_kvstore::ScanRequest {
            prefix: prefix.clone(),
            resume_after: resume_after.take(),
            limit: 256,
        };
        let result = store
            .scan(META_SPACE_ID, META_PART_ID, request)
            .await
            .change_context_lazy(|| MetaError("failed to scan meta records".to_string()))?;
        for (key, bytes) in result.entries {
            let value = serde_json::from_slice(&bytes)
                .change_context_lazy(|| MetaError("failed to decode meta record".to_string()))?;
            out.push(value);
            resume_after = Some(key);
        }
        if result.next_bookmark.is_none() {
            break;
        }
    }
    Ok(out)
}

/// Reads `counter_key`, defaulting to `1` when absent (ids `0` are reserved), and persists
/// `value + 1` back before returning `value`. Not linearizable against concurrent callers on
/// different replicas, but every write here only ever runs on the meta partition's leader, so
/// there is exactly one writer at a time.
async fn allocate_id<S: PartitionStore>(store: &S, counter_key: &str) -> Result<u32, MetaError> {
    let current: u32 = match get_record::<S, u32>(store, counter_key.as_bytes().to_vec()).await? {
        Some(value) => value,
        None => 1,
    };
    put_record(store, counter_key.as_bytes().to_vec(), &(current + 1)).await?;
    Ok(current)
}

// ---------------------------------------------------------------------------------------------
// Spaces
// ---------------------------------------------------------------------------------------------

pub async fn create_space<S: PartitionStore>(
    store: &S,
    request: CreateSpaceRequest,
) -> Result<CreateSpaceResponse, MetaError> {
    if get_record::<S, SpaceDesc>(store, keys::space_by_name_key(&request.name))
        .await?
        .is_some()
    {
        return Err(MetaError(format!("space {} already exists", request.name)).into());
    }

    let id = allocate_id(store, keys::NEXT_SPACE_ID_KEY).await?;
    let space_id = SpaceId(id);
    let desc = SpaceDesc {
        space_id,
        name: request.name.clone(),
        part_count: request.part_count,
        replica_factor: request.replica_factor,
        vid_len: request.vid_len,
    };
    put_record(store, keys::space_by_name_key(&request.name), &desc).await?;
    put_record(store, keys::space_by_id_key(space_id), &desc).await?;
    Ok(CreateSpaceResponse { space_id })
}

pub async fn drop_space<S: PartitionStore>(store: &S, request: DropSpaceRequest) -> Result<(), MetaError> {
    let Some(desc) = get_record::<S, SpaceDesc>(store, keys::space_by_name_key(&request.name)).await? else {
        return Err(MetaError(format!("space {} not found", request.name)).into());
    };
    remove_record(store, keys::space_by_name_key(&request.name)).await?;
    remove_record(store, keys::space_by_id_key(desc.space_id)).await?;
    Ok(())
}

pub async fn get_space<S: PartitionStore>(store: &S, name: &str) -> Result<Option<SpaceDesc>, MetaError> {
    get_record(store, keys::space_by_name_key(name)).await
}

pub async fn list_spaces<S: PartitionStore>(store: &S) -> Result<ListSpacesResponse, MetaError> {
    let spaces = scan_prefix(store, keys::spaces_by_id_prefix()).await?;
    Ok(ListSpacesResponse { spaces })
}

// ---------------------------------------------------------------------------------------------
// Tags and edge types
// ---------------------------------------------------------------------------------------------

async fn create_schema<S: PartitionStore>(
    store: &S,
    space_id: SpaceId,
    name: &str,
    is_edge: bool,
    columns: Vec<graphd_protos::property::ColumnDef>,
) -> Result<SchemaId, MetaError> {
    let name_key = if is_edge {
        keys::edge_by_name_key(space_id, name)
    } else {
        keys::tag_by_name_key(space_id, name)
    };
    if get_record::<S, SchemaVersion>(store, name_key.clone()).await?.is_some() {
        return Err(MetaError(format!("schema {name} already exists in space {space_id}")).into());
    }

    let id = allocate_id(store, keys::NEXT_SCHEMA_ID_KEY).await?;
    let schema_id = SchemaId(id as i32);
    let version = SchemaVersion {
        schema_id,
        version: 1,
        name: name.to_string(),
        is_edge,
        columns,
    };
    let id_key = if is_edge {
        keys::edge_by_id_key(space_id, schema_id)
    } else {
        keys::tag_by_id_key(space_id, schema_id)
    };
    put_record(store, name_key, &version).await?;
    put_record(store, id_key, &version).await?;
    Ok(schema_id)
}

pub async fn create_tag<S: PartitionStore>(store: &S, request: CreateTagRequest) -> Result<SchemaId, MetaError> {
    create_schema(store, request.space_id, &request.name, false, request.columns).await
}

pub async fn create_edge_type<S: PartitionStore>(
    store: &S,
    request: CreateEdgeTypeRequest,
) -> Result<SchemaId, MetaError> {
    create_schema(store, request.space_id, &request.name, true, request.columns).await
}

/// Appends a new schema version with `add_columns` merged in and `drop_columns` removed. Schemas
/// are append-only: earlier versions are never mutated in place.
pub async fn alter_tag<S: PartitionStore>(store: &S, request: AlterTagRequest) -> Result<(), MetaError> {
    let id_key = keys::tag_by_id_key(request.space_id, request.tag_id);
    let Some(current) = get_record::<S, SchemaVersion>(store, id_key.clone()).await? else {
        return Err(MetaError(format!("tag {} not found", request.tag_id.0)).into());
    };

    let mut columns: Vec<_> = current
        .columns
        .into_iter()
        .filter(|c| !request.drop_columns.contains(&c.name))
        .collect();
    columns.extend(request.add_columns);

    let next = SchemaVersion {
        schema_id: current.schema_id,
        version: current.version + 1,
        name: current.name.clone(),
        is_edge: false,
        columns,
    };
    put_record(store, id_key, &next).await?;
    put_record(store, keys::tag_by_name_key(request.space_id, &next.name), &next).await?;
    Ok(())
}

pub async fn list_tags<S: PartitionStore>(store: &S, space_id: SpaceId) -> Result<Vec<SchemaVersion>, MetaError> {
    scan_prefix(store, keys::tags_by_id_prefix(space_id)).await
}

pub async fn list_edge_types<S: PartitionStore>(
    store: &S,
    space_id: SpaceId,
) -> Result<Vec<SchemaVersion>, MetaError> {
    scan_prefix(store, keys::edges_by_id_prefix(space_id)).await
}

// ---------------------------------------------------------------------------------------------
// Indexes
// ---------------------------------------------------------------------------------------------

async fn create_index_impl<S: PartitionStore>(
    store: &S,
    request: CreateIndexRequest,
) -> Result<CreateIndexResponse, MetaError> {
    let schema = if request.is_edge {
        get_record::<S, SchemaVersion>(store, keys::edge_by_id_key(request.space_id, request.schema_id)).await?
    } else {
        get_record::<S, SchemaVersion>(store, keys::tag_by_id_key(request.space_id, request.schema_id)).await?
    };
    let Some(schema) = schema else {
        return Err(MetaError(format!("schema {} not found", request.schema_id.0)).into());
    };

    let fields = request
        .field_names
        .iter()
        .map(|name| {
            schema
                .column(name)
                .cloned()
                .ok_or_else(|| MetaError(format!("column {name} not found on schema {}", schema.name)))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let id = allocate_id(store, keys::NEXT_INDEX_ID_KEY).await?;
    let index_id = IndexId(id as i32);
    let item = IndexItem::new(index_id, request.schema_id, request.is_edge, fields);
    put_record(store, keys::index_by_id_key(request.space_id, index_id), &item).await?;
    Ok(CreateIndexResponse { index_id })
}

pub async fn create_tag_index<S: PartitionStore>(
    store: &S,
    request: CreateIndexRequest,
) -> Result<CreateIndexResponse, MetaError> {
    debug_assert!(!request.is_edge, "create_tag_index called with an edge request");
    create_index_impl(store, request).await
}

pub async fn create_edge_index<S: PartitionStore>(
    store: &S,
    request: CreateIndexRequest,
) -> Result<CreateIndexResponse, MetaError> {
    debug_assert!(request.is_edge, "create_edge_index called with a tag request");
    create_index_impl(store, request).await
}

pub async fn drop_index<S: PartitionStore>(store: &S, request: DropIndexRequest) -> Result<(), MetaError> {
    remove_record(store, keys::index_by_id_key(request.space_id, request.index_id)).await
}

pub async fn list_indexes<S: PartitionStore>(
    store: &S,
    space_id: SpaceId,
) -> Result<ListIndexesResponse, MetaError> {
    let indexes = scan_prefix(store, keys::indexes_prefix(space_id)).await?;
    Ok(ListIndexesResponse { indexes })
}

// ---------------------------------------------------------------------------------------------
// Hosts
// ---------------------------------------------------------------------------------------------

pub async fn register_host<S: PartitionStore>(store: &S, request: RegisterHostRequest) -> Result<(), MetaError> {
    let record = HostRecord {
        addr: request.addr.clone(),
        last_heartbeat_ms: request.heartbeat_ms,
    };
    put_record(store, keys::host_key(&request.addr.host, request.addr.port), &record).await
}

pub async fn list_hosts<S: PartitionStore>(store: &S) -> Result<ListHostsResponse, MetaError> {
    let hosts = scan_prefix(store, keys::hosts_prefix()).await?;
    Ok(ListHostsResponse { hosts })
}

// ---------------------------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------------------------

async fn put_user<S: PartitionStore>(store: &S, record: &UserRecord) -> Result<(), MetaError> {
    put_record(store, keys::user_key(&record.username), record).await
}

pub async fn create_user<S: PartitionStore>(store: &S, request: CreateUserRequest) -> Result<(), MetaError> {
    if get_record::<S, UserRecord>(store, keys::user_key(&request.username))
        .await?
        .is_some()
    {
        return Err(MetaError(format!("user {} already exists", request.username)).into());
    }
    put_user(
        store,
        &UserRecord {
            username: request.username,
            password_hash: request.password_hash,
            is_root: false,
        },
    )
    .await
}

pub async fn get_user<S: PartitionStore>(store: &S, username: &str) -> Result<Option<UserRecord>, MetaError> {
    get_record(store, keys::user_key(username)).await
}

pub async fn list_users<S: PartitionStore>(store: &S) -> Result<ListUsersResponse, MetaError> {
    let users = scan_prefix(store, keys::users_prefix()).await?;
    Ok(ListUsersResponse { users })
}

/// Seeds the `root` account on first boot. A no-op on non-leader replicas and a no-op once `root`
/// already exists, so every daemon can call this unconditionally on every startup.
pub async fn bootstrap_root_user<S: PartitionStore>(store: &S, is_leader: bool) -> Result<(), MetaError> {
    if !is_leader {
        return Ok(());
    }
    if get_record::<S, UserRecord>(store, keys::user_key("root")).await?.is_some() {
        return Ok(());
    }
    put_user(
        store,
        &UserRecord {
            username: "root".to_string(),
            password_hash: DEFAULT_ROOT_PASSWORD_HASH.to_string(),
            is_root: true,
        },
    )
    .await
}

/// A meta-v1 space record, from before `vid_len` was tracked per space. Any space created before
/// this field existed defaults to an 8-byte vertex id, the size the original single-vid-length
/// deployments used.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct LegacySpaceDescV1 {
    space_id: SpaceId,
    name: String,
    part_count: u32,
    replica_factor: u32,
}

const LEGACY_VID_LEN_DEFAULT: u32 = 8;

/// Idempotently rewrites every space record that still lacks `vid_len` with the default, run once
/// by the leader on startup. Safe to call repeatedly: spaces already on the current shape decode
/// successfully up front and are left untouched.
pub async fn upgrade_meta_v1_to_v2<S: PartitionStore>(store: &S, is_leader: bool) -> Result<(), MetaError> {
    if !is_leader {
        return Ok(());
    }

    let request = graphd_kvstore::ScanRequest::prefix(keys::spaces_by_id_prefix(), usize::MAX);
    let result = store
        .scan(META_SPACE_ID, META_PART_ID, request)
        .await
        .change_context_lazy(|| MetaError("failed to scan spaces for meta upgrade".to_string()))?;

    for (key, bytes) in result.entries {
        if serde_json::from_slice::<SpaceDesc>(&bytes).is_ok() {
            continue;
        }
        let legacy: LegacySpaceDescV1 = serde_json::from_slice(&bytes)
            .change_context_lazy(|| MetaError("unrecognized space record during meta upgrade".to_string()))?;
        let upgraded = SpaceDesc {
            space_id: legacy.space_id,
            name: legacy.name.clone(),
            part_count: legacy.part_count,
            replica_factor: legacy.replica_factor,
            vid_len: LEGACY_VID_LEN_DEFAULT,
        };
        put_record(store, key, &upgraded).await?;
        put_record(store, keys::space_by_name_key(&upgraded.name), &upgraded).await?;
        log::info!("upgraded space {} to meta v2 (vid_len={LEGACY_VID_LEN_DEFAULT})", upgraded.name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use graphd_kvstore::MemoryPartitionStore;
    use graphd_protos::ids::HostAddr;
    use graphd_protos::property::ColumnDef;
    use graphd_protos::property::ColumnType;
    use graphd_protos::request::CreateIndexRequest;

    use super::*;

    async fn seeded_store() -> MemoryPartitionStore {
        let store = MemoryPartitionStore::new();
        store.add_part(META_SPACE_ID, META_PART_ID, vec![HostAddr::new("h", 9000)]).await;
        store
    }

    fn space_request(name: &str) -> CreateSpaceRequest {
        CreateSpaceRequest {
            name: name.to_string(),
            part_count: 4,
            replica_factor: 1,
            vid_len: 8,
        }
    }

    #[tokio::test]
    async fn test_create_space_rejects_duplicate_name() {
        let store = seeded_store().await;
        create_space(&store, space_request("social")).await.unwrap();
        let second = create_space(&store, space_request("social")).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_list_spaces_reflects_creation_and_drop() {
        let store = seeded_store().await;
        create_space(&store, space_request("social")).await.unwrap();
        assert_eq!(list_spaces(&store).await.unwrap().spaces.len(), 1);

        drop_space(&store, DropSpaceRequest { name: "social".to_string() }).await.unwrap();
        assert_eq!(list_spaces(&store).await.unwrap().spaces.len(), 0);
    }

    #[tokio::test]
    async fn test_alter_tag_appends_new_version_with_merged_columns() {
        let store = seeded_store().await;
        let space = create_space(&store, space_request("social")).await.unwrap().space_id;
        let tag_id = create_tag(
            &store,
            CreateTagRequest {
                space_id: space,
                name: "person".to_string(),
                columns: vec![ColumnDef::new("name", ColumnType::String, false)],
            },
        )
        .await
        .unwrap();

        alter_tag(
            &store,
            AlterTagRequest {
                space_id: space,
                tag_id,
                add_columns: vec![ColumnDef::new("age", ColumnType::Int, true)],
                drop_columns: vec![],
            },
        )
        .await
        .unwrap();

        let tags = list_tags(&store, space).await.unwrap();
        let tag = tags.iter().find(|t| t.schema_id == tag_id).unwrap();
        assert_eq!(tag.version, 2);
        assert_eq!(tag.columns.len(), 2);
    }

    #[tokio::test]
    async fn test_create_index_resolves_named_columns() {
        let store = seeded_store().await;
        let space = create_space(&store, space_request("social")).await.unwrap().space_id;
        let tag_id = create_tag(
            &store,
            CreateTagRequest {
                space_id: space,
                name: "person".to_string(),
                columns: vec![
                    ColumnDef::new("name", ColumnType::String, false),
                    ColumnDef::new("age", ColumnType::Int, true),
                ],
            },
        )
        .await
        .unwrap();

        let response = create_tag_index(
            &store,
            CreateIndexRequest {
                space_id: space,
                schema_id: tag_id,
                is_edge: false,
                name: "person_by_name".to_string(),
                field_names: vec!["name".to_string()],
            },
        )
        .await
        .unwrap();

        let indexes = list_indexes(&store, space).await.unwrap();
        let index = indexes.indexes.iter().find(|i| i.index_id == response.index_id).unwrap();
        assert_eq!(index.fields.len(), 1);
        assert_eq!(index.fields[0].name, "name");
    }

    #[tokio::test]
    async fn test_bootstrap_root_user_is_idempotent_and_leader_only() {
        let store = seeded_store().await;

        bootstrap_root_user(&store, false).await.unwrap();
        assert!(get_user(&store, "root").await.unwrap().is_none());

        bootstrap_root_user(&store, true).await.unwrap();
        let root = get_user(&store, "root").await.unwrap().unwrap();
        assert!(root.is_root);

        bootstrap_root_user(&store, true).await.unwrap();
        assert_eq!(list_users(&store).await.unwrap().users.len(), 1);
    }

    #[tokio::test]
    async fn test_upgrade_meta_v1_to_v2_backfills_vid_len() {
        let store = seeded_store().await;
        let legacy = LegacySpaceDescV1 {
            space_id: SpaceId(7),
            name: "legacy".to_string(),
            part_count: 2,
            replica_factor: 1,
        };
        put_record(&store, keys::space_by_id_key(legacy.space_id), &legacy).await.unwrap();

        upgrade_meta_v1_to_v2(&store, true).await.unwrap();

        let upgraded: SpaceDesc = get_record(&store, keys::space_by_id_key(legacy.space_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(upgraded.vid_len, LEGACY_VID_LEN_DEFAULT);

        // re-running is a no-op: the record now decodes as current-shape and is skipped.
        upgrade_meta_v1_to_v2(&store, true).await.unwrap();
        let unchanged: SpaceDesc = get_record(&store, keys::space_by_id_key(legacy.space_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged, upgraded);
    }
}
