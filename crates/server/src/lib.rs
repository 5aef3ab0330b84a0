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

//! Binds the meta or storage daemon's HTTP listener, bootstraps the cluster id and (for the meta
//! role) the root user and the v1-to-v2 meta upgrade, and hands back a [`ServerState`] the owning
//! binary holds onto for the process lifetime.

mod error;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use error_stack::Result;
use error_stack::ResultExt;
use graphd_kvstore::MemoryPartitionStore;
use graphd_kvstore::PartitionManager;
use graphd_kvstore::PartitionStore;
use graphd_protos::config::DaemonConfig;
use graphd_protos::ids::HostAddr;
use graphd_protos::request::META_PART_ID;
use graphd_protos::request::META_SPACE_ID;
use graphd_runtime::wait_group::WaitGroup;
use poem::listener::Acceptor;
use poem::listener::Listener;

pub use error::ServerError;
pub use state::AppState;
pub use state::Role;

type ServerFuture = graphd_runtime::JoinHandle<Result<(), ServerError>>;

#[derive(Debug)]
pub struct ServerState {
    addr: SocketAddr,
    cluster_id: u64,
    fut: ServerFuture,
    shutdown: Arc<mea::latch::Latch>,
}

impl ServerState {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn cluster_id(&self) -> u64 {
        self.cluster_id
    }

    pub fn shutdown_handle(&self) -> impl Fn() {
        let shutdown = self.shutdown.clone();
        move || shutdown.count_down()
    }

    pub fn shutdown(&self) {
        self.shutdown_handle()();
    }

    pub async fn await_shutdown(self) {
        self.shutdown.wait().await;
        match flatten(self.fut).await {
            Ok(()) => log::info!("graphd server stopped."),
            Err(err) => log::error!(err:?; "graphd server failed."),
        }
    }
}

fn parse_host_addr(addr: &str) -> Option<HostAddr> {
    let (host, port) = addr.rsplit_once(':')?;
    let port: u16 = port.parse().ok()?;
    Some(HostAddr::new(host, port))
}

/// Binds `config`'s listener, races the meta peer set for the cluster id, runs the meta-only
/// bootstrap steps when `role` is [`Role::Meta`], and spawns the daemon's HTTP server on
/// `graphd_runtime::io_runtime()`.
pub async fn start(
    config: &DaemonConfig,
    role: Role,
    store: Arc<MemoryPartitionStore>,
) -> Result<ServerState, ServerError> {
    let make_error = || ServerError("failed to start server".to_string());

    let self_addr = HostAddr::new(config.bind_host(), config.port);
    let peers: Vec<HostAddr> = config
        .meta_peers()
        .iter()
        .filter_map(|addr| parse_host_addr(addr))
        .collect();

    store.init().await.change_context_lazy(make_error)?;
    store.add_part(META_SPACE_ID, META_PART_ID, peers.clone()).await;

    let manager = Arc::new(PartitionManager::new());
    manager.add_part(META_SPACE_ID, META_PART_ID, peers.clone()).await;

    let cluster_id = graphd_clusterid::bootstrap_cluster_id(store.as_ref(), &self_addr, &peers)
        .await
        .change_context_lazy(make_error)?;

    let leader = store
        .part_leader(META_SPACE_ID, META_PART_ID)
        .await
        .change_context_lazy(make_error)?;
    let is_leader = leader == self_addr;

    if role == Role::Meta {
        graphd_meta::bootstrap_root_user(store.as_ref(), is_leader)
            .await
            .change_context_lazy(make_error)?;
        graphd_meta::upgrade_meta_v1_to_v2(store.as_ref(), is_leader)
            .await
            .change_context_lazy(make_error)?;
    }

    let state = Arc::new(AppState {
        store,
        manager,
        role,
        cluster_id,
        self_addr: self_addr.clone(),
    });

    let bind_addr = format!("{}:{}", config.bind_host(), config.port);
    let acceptor = poem::listener::TcpListener::bind(&bind_addr)
        .into_acceptor()
        .await
        .change_context_lazy(|| ServerError(format!("failed to listen on {bind_addr}")))?;
    let addr = acceptor.local_addr()[0]
        .as_socket_addr()
        .cloned()
        .ok_or_else(|| ServerError("failed to get local server address".to_string()))?;

    let shutdown = Arc::new(mea::latch::Latch::new(1));
    let wg = WaitGroup::new();
    let route = routes::build_route(role, state);

    let fut = {
        let shutdown_clone = shutdown.clone();
        let wg_clone = wg.clone();
        let signal = async move {
            log::info!("graphd {role:?} daemon has started on [{addr}]");
            drop(wg_clone);
            shutdown_clone.wait().await;
            log::info!("graphd {role:?} daemon is closing");
        };
        graphd_runtime::io_runtime().spawn(async move {
            poem::Server::new_with_acceptor(acceptor)
                .run_with_graceful_shutdown(route, signal, Some(Duration::from_secs(30)))
                .await
                .change_context_lazy(make_error)
        })
    };

    wg.await;
    Ok(ServerState {
        addr,
        cluster_id,
        fut,
        shutdown,
    })
}

async fn flatten(fut: ServerFuture) -> Result<(), ServerError> {
    let make_error = || ServerError("failed to join server future".to_string());
    fut.await.change_context_lazy(make_error)?
}
