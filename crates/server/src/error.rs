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

//! Translates this crate's internal error types into HTTP responses. Every handler's `Result`
//! error side funnels through [`HttpError`] so the wire format stays a single `{"message": ...}`
//! JSON body regardless of which sibling crate raised the failure.

use poem::http::StatusCode;
use poem::web::Json;
use poem::IntoResponse;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ServerError(pub String);

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Builds a closure suitable for `.map_err(...)` on a fallible handler body: renders an
    /// `error_stack::Report`'s chain into the message and tags the response with `status`.
    pub fn from_report<E>(status: StatusCode) -> impl FnOnce(error_stack::Report<E>) -> HttpError
    where
        E: std::fmt::Debug,
    {
        move |report| HttpError::new(status, format!("{report:?}"))
    }

}

impl IntoResponse for HttpError {
    fn into_response(self) -> poem::Response {
        Json(ErrorBody {
            message: self.message,
        })
        .with_status(self.status)
        .into_response()
    }
}

impl From<HttpError> for poem::Error {
    fn from(value: HttpError) -> Self {
        poem::Error::from_response(value.into_response())
    }
}
