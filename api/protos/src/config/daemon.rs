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

use serde::Deserialize;
use serde::Serialize;

/// The CLI-flag shape shared by the meta and storage daemons: only the defaults
/// differ between the two roles, not the field set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Bind address; empty means "use the hostname".
    pub local_ip: String,
    pub port: u16,
    /// Required; root data directory for this replica's partition log and state machine.
    pub data_path: String,
    /// Comma-separated `host:port` list of meta peers; empty means single-node.
    pub meta_server_addrs: String,
    pub num_io_threads: usize,
    pub num_worker_threads: usize,
    pub pid_file: String,
    pub daemonize: bool,
}

impl DaemonConfig {
    /// Parses [`Self::meta_server_addrs`] into the canonical peer list used by cluster bootstrap
    ///. Single-node mode (empty string) yields a one-element list of this daemon's own
    /// advertised address.
    pub fn meta_peers(&self) -> Vec<String> {
        if self.meta_server_addrs.trim().is_empty() {
            vec![format!("{}:{}", self.bind_host(), self.port)]
        } else {
            self.meta_server_addrs
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        }
    }

    pub fn bind_host(&self) -> &str {
        if self.local_ip.is_empty() {
            "localhost"
        } else {
            &self.local_ip
        }
    }
}

/// Meta-daemon-specific defaults.
pub fn meta_daemon_defaults() -> DaemonConfig {
    DaemonConfig {
        local_ip: String::new(),
        port: 45500,
        data_path: String::new(),
        meta_server_addrs: String::new(),
        num_io_threads: 16,
        num_worker_threads: 32,
        pid_file: "pids/nebula-metad.pid".to_string(),
        daemonize: true,
    }
}

/// Storage-daemon-specific defaults.
pub fn storage_daemon_defaults() -> DaemonConfig {
    DaemonConfig {
        local_ip: String::new(),
        port: 44500,
        data_path: String::new(),
        meta_server_addrs: String::new(),
        num_io_threads: 16,
        num_worker_threads: 32,
        pid_file: "pids/nebula-storaged.pid".to_string(),
        daemonize: true,
    }
}
