//! Session middleware configuration and the shopper extractor.
//!
//! The HTTP session holds one serialized [`ShopperSession`]: the logged-in
//! account id and the cart. Sessions live in memory, so carts do not survive
//! a restart.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::MarketConfig;
use crate::error::AppError;
use crate::models::{ShopperSession, session_keys};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "hh_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &MarketConfig) -> SessionManagerLayer<MemoryStore> {
    // Determine if we're in production (HTTPS)
    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Extractor for the shopper state of the current HTTP session.
///
/// Handlers mutate [`Shopper::state`] through the engine and then call
/// [`Shopper::save`].
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(State(state): State<AppState>, mut shopper: Shopper) -> Result<()> {
///     state.market().clear_cart(&mut shopper.state);
///     shopper.save().await
/// }
/// ```
pub struct Shopper {
    session: Session,
    pub state: ShopperSession,
}

impl Shopper {
    /// Write the shopper state back to the session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session store fails.
    pub async fn save(&self) -> Result<(), AppError> {
        self.session.insert(session_keys::SHOPPER, &self.state).await?;
        Ok(())
    }

    /// Rotate the session id, on login and logout.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session store fails.
    pub async fn cycle_id(&self) -> Result<(), AppError> {
        self.session.cycle_id().await?;
        Ok(())
    }
}

impl<S> FromRequestParts<S> for Shopper
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let state = session
            .get::<ShopperSession>(session_keys::SHOPPER)
            .await?
            .unwrap_or_default();

        Ok(Self { session, state })
    }
}
