//! Repository authentication.
//!
//! Credentials live on `RemoteRepository` (interpolated from session
//! configuration before resolution starts); this module just applies them
//! to an outgoing request.

use reqwest::RequestBuilder;

use resolver_model::RemoteRepository;

/// Apply authentication to a request if the repository has credentials.
pub fn apply_auth(request: RequestBuilder, repo: &RemoteRepository) -> RequestBuilder {
    match (&repo.username, &repo.password) {
        (Some(user), Some(pass)) => request.basic_auth(user, Some(pass)),
        (Some(user), None) => request.basic_auth(user, None::<&str>),
        (None, Some(token)) => request.bearer_auth(token),
        (None, None) => request,
    }
}
