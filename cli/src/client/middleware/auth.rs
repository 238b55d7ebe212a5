//! Authentication middleware for injecting Bearer tokens.

use std::sync::Arc;

use async_trait::async_trait;
use http::header::{HeaderValue, AUTHORIZATION};
use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result};
use tokio::sync::RwLock;

use crate::auth::Credential;

/// Credential shared between the executor and the middleware.
pub type SessionHandle = Arc<RwLock<Option<Credential>>>;

/// Middleware that injects the current session's Bearer token into requests.
///
/// The header is derived when the request is sent, so replacing the session
/// credential affects every later request, including retries.
pub struct AuthMiddleware {
    session: SessionHandle,
}

impl AuthMiddleware {
    /// Create a new authentication middleware.
    #[must_use]
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Middleware for AuthMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        if let Some(credential) = self.session.read().await.as_ref() {
            match HeaderValue::from_str(&format!("Bearer {}", credential.access_token)) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    req.headers_mut().insert(AUTHORIZATION, value);
                }
                Err(_) => tracing::warn!("access token is not a valid header value; sending unauthenticated"),
            }
        } else {
            req.headers_mut().remove(AUTHORIZATION);
        }

        next.run(req, extensions).await
    }
}
