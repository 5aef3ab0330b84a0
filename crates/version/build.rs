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

fn main() {
    build_data::set_GIT_DIRTY();
    build_data::no_debug_rebuilds();

    // `gix_discover` just confirms we're inside a worktree; shadow-rs falls back to "unknown"
    // build info gracefully when it isn't (e.g. building from a source tarball).
    if gix_discover::upwards(&std::env::current_dir().unwrap()).is_err() {
        println!("cargo:warning=not inside a git worktree, version info will be incomplete");
    }

    shadow_rs::new().expect("failed to generate shadow-rs build info");
}
