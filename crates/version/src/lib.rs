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

use const_format::formatcp;

shadow_rs::shadow!(build);

/// Short version string, e.g. `0.1.0 (a1b2c3d 2026-07-20)`.
pub const SHORT_VERSION: &str = formatcp!("{} ({} {})", build::PKG_VERSION, build::SHORT_COMMIT, build::BUILD_TIME);

/// Long version string including the Rust compiler and build target, printed by `--version`.
pub const LONG_VERSION: &str = formatcp!(
    "{}\n\nbranch: {}\ncommit: {}\nbuild-time: {}\nrust-version: {}\ntarget: {}",
    SHORT_VERSION,
    build::BRANCH,
    build::COMMIT_HASH,
    build::BUILD_TIME,
    build::RUST_VERSION,
    build::BUILD_TARGET,
);

/// Returns the long-form version string used by CLI `--version` output.
pub fn version() -> &'static str {
    LONG_VERSION
}

/// Returns the short-form version string, e.g. for inclusion in log banners.
pub fn short_version() -> &'static str {
    SHORT_VERSION
}
