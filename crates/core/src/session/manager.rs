use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    api::{ApiClient, SignupForm},
    error::SessionError,
    models::{Role, UserProfile},
    notice::Notifier,
};

use super::store::TokenStore;

/// Bearer token plus the profile fetched with it.
///
/// `user` is only ever set while `token` is set. The reverse does not hold:
/// a token can be present while its profile fetch is still pending.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Session {
    /// Current bearer token.
    pub token: Option<String>,
    /// Profile for the token, once fetched.
    pub user: Option<UserProfile>,
}

impl Session {
    /// Token present and profile fetched.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    /// Derived from the profile role; false while anonymous.
    pub fn is_owner(&self) -> bool {
        self.user.as_ref().map(UserProfile::is_owner).unwrap_or(false)
    }
}

/// Successful login result.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginSuccess {
    /// Freshly fetched profile.
    pub user: UserProfile,
    /// Whether the user manages hotels.
    pub is_owner: bool,
}

/// Owns the session and keeps the API client's token slot in step with it.
///
/// Transitions: anonymous -> authenticated on login or restore, back to
/// anonymous on logout or any 401.
pub struct SessionManager {
    api: ApiClient,
    store: Arc<dyn TokenStore>,
    notifier: Notifier,
    session: Session,
    loading: bool,
    sign_out: Option<JoinHandle<()>>,
}

impl SessionManager {
    /// Anonymous manager. Call [`SessionManager::restore`] to pick up a saved token.
    pub fn new(api: ApiClient, store: Arc<dyn TokenStore>, notifier: Notifier) -> Self {
        Self {
            api,
            store,
            notifier,
            session: Session::default(),
            loading: false,
            sign_out: None,
        }
    }

    /// Load the saved token, if any, and fetch its profile.
    pub async fn restore(&mut self) {
        let saved = match self.store.load() {
            Ok(saved) => saved,
            Err(err) => {
                warn!(?err, "failed to read saved session");
                None
            }
        };
        match saved {
            Some(token) => {
                info!("restoring saved session");
                self.apply_token(Some(token));
                self.fetch_profile().await;
            }
            None => debug!("no saved session"),
        }
    }

    /// Sign in with email and password.
    ///
    /// The credential exchange only returns a token, so the profile is
    /// fetched with it before anything is stored. Failures are reported as
    /// a notice and returned; nothing is stored.
    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<LoginSuccess, SessionError> {
        match self.try_login(email.trim(), password).await {
            Ok(success) => {
                info!(user = %success.user.id, owner = success.is_owner, "logged in");
                self.notifier.success("Logged in successfully");
                Ok(success)
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                self.notifier.error(err.to_string());
                Err(err)
            }
        }
    }

    async fn try_login(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<LoginSuccess, SessionError> {
        let token = self
            .api
            .sign_in(email, password)
            .await
            .map_err(SessionError::from_login)?;
        let details = self
            .api
            .user_details_with(&token)
            .await
            .map_err(SessionError::from_login)?;

        self.apply_token(Some(token));
        let is_owner = details.profile.is_owner();
        self.session.user = Some(details.profile.clone());
        Ok(LoginSuccess {
            user: details.profile,
            is_owner,
        })
    }

    /// Create an account. The user still has to log in afterwards.
    pub async fn signup(&self, form: &SignupForm) -> Result<(), SessionError> {
        let missing = form.missing_fields();
        if !missing.is_empty() {
            let err = SessionError::Validation {
                message: "Please fill in all required fields.".to_string(),
                fields: missing,
            };
            self.notifier.error(err.to_string());
            return Err(err);
        }

        match self.api.sign_up(form).await {
            Ok(_) => {
                info!("account created");
                self.notifier
                    .success("Account created successfully! Please login.");
                Ok(())
            }
            Err(err) => {
                let err = SessionError::from_signup(err);
                warn!(error = %err, "signup failed");
                self.notifier.error(err.to_string());
                Err(err)
            }
        }
    }

    /// End the session.
    ///
    /// Local state is cleared first so readers see an anonymous session
    /// immediately. The backend is then told in the background; its
    /// outcome is never awaited here nor reported.
    pub fn logout(&mut self) {
        let token = self.session.token.take();
        self.clear_local();
        self.notifier.success("Logged out successfully");
        info!("logged out");

        if let Some(token) = token {
            self.sign_out = notify_sign_out(self.api.clone(), token);
        }
    }

    /// Fetch the profile for the current token.
    ///
    /// A 401 means the token expired: the session is cleared without a
    /// notice. Any other failure is reported and the cached profile is kept.
    pub async fn fetch_profile(&mut self) {
        let Some(token) = self.session.token.clone() else {
            self.session.user = None;
            return;
        };

        self.loading = true;
        let result = self.api.user_details().await;
        self.loading = false;

        match result {
            Ok(details) => {
                if let Some(fresh) = details.access_token.filter(|fresh| *fresh != token) {
                    debug!("backend rotated the access token");
                    self.apply_token(Some(fresh));
                }
                self.session.user = Some(details.profile);
            }
            Err(err) if err.is_unauthorized() => {
                debug!("saved token rejected; clearing session");
                self.expire();
            }
            Err(err) => {
                warn!(error = %err, "profile fetch failed; keeping cached profile");
                self.notifier.error(err.user_message("Failed to fetch user"));
            }
        }
    }

    /// Drop the session after the backend rejected the token.
    pub fn expire(&mut self) {
        self.session.token = None;
        self.clear_local();
    }

    /// Record that the user now owns a hotel.
    pub fn mark_owner(&mut self) {
        if let Some(user) = self.session.user.as_mut() {
            user.role = Role::HotelOwner;
        }
    }

    /// Current bearer token, for authorizing calls elsewhere.
    pub fn token(&self) -> Option<&str> {
        self.session.token.as_deref()
    }

    /// Current profile.
    pub fn user(&self) -> Option<&UserProfile> {
        self.session.user.as_ref()
    }

    /// Token and profile are both present.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// The signed-in user is a hotel owner.
    pub fn is_owner(&self) -> bool {
        self.session.is_owner()
    }

    /// A profile fetch is in flight.
    ///
    /// `fetch_profile` holds `&mut self` for the whole request, so this is
    /// only ever observed as `true` from inside that call. Callers reading
    /// the manager between operations always see `false`.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Give a pending sign-out notification up to `grace` to finish.
    pub async fn settle(&mut self, grace: Duration) {
        if let Some(handle) = self.sign_out.take() {
            if tokio::time::timeout(grace, handle).await.is_err() {
                debug!("sign-out notification still pending at shutdown");
            }
        }
    }

    fn apply_token(&mut self, token: Option<String>) {
        let persisted = match token.as_deref() {
            Some(token) => self.store.save(token),
            None => self.store.clear(),
        };
        if let Err(err) = persisted {
            warn!(?err, "failed to persist session token");
        }
        self.api.set_token(token.clone());
        self.session.token = token;
    }

    fn clear_local(&mut self) {
        self.session.user = None;
        self.loading = false;
        self.apply_token(None);
    }
}

/// Best-effort sign-out ping: spawned, never awaited by the caller, errors dropped.
fn notify_sign_out(api: ApiClient, token: String) -> Option<JoinHandle<()>> {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        debug!("no async runtime; skipping sign-out notification");
        return None;
    };
    Some(runtime.spawn(async move {
        if let Err(err) = api.sign_out(&token).await {
            debug!(error = %err, "sign-out notification failed");
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    use crate::{
        config::AppConfig,
        notice::{Notice, NoticeLevel},
        session::store::MemoryTokenStore,
    };

    fn unreachable_config() -> AppConfig {
        AppConfig {
            backend_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 1,
            ..AppConfig::default()
        }
    }

    fn manager_with(store: Arc<MemoryTokenStore>) -> (SessionManager, UnboundedReceiver<Notice>) {
        let api = ApiClient::new(&unreachable_config()).expect("client");
        let (notifier, receiver) = Notifier::channel();
        (SessionManager::new(api, store, notifier), receiver)
    }

    fn profile(role: Role) -> UserProfile {
        UserProfile {
            id: "u1".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            role,
            image: None,
        }
    }

    #[test]
    fn session_flags_derive_from_state() {
        let mut session = Session::default();
        assert!(!session.is_authenticated());
        assert!(!session.is_owner());

        session.token = Some("t".to_string());
        assert!(!session.is_authenticated());

        session.user = Some(profile(Role::HotelOwner));
        assert!(session.is_authenticated());
        assert!(session.is_owner());
    }

    #[test]
    fn logout_clears_token_without_a_runtime() {
        let store = Arc::new(MemoryTokenStore::with_token("saved"));
        let (mut manager, mut notices) = manager_with(store.clone());
        manager.apply_token(Some("saved".to_string()));
        manager.session.user = Some(profile(Role::Guest));

        manager.logout();

        assert!(manager.token().is_none());
        assert!(manager.user().is_none());
        assert!(manager.api.token().is_none());
        assert_eq!(store.load().expect("load"), None);
        assert!(manager.sign_out.is_none());
        let notice = notices.try_recv().expect("logout notice");
        assert_eq!(notice.level, NoticeLevel::Success);
    }

    #[tokio::test]
    async fn logout_with_unreachable_backend_still_clears_token() {
        let store = Arc::new(MemoryTokenStore::default());
        let (mut manager, _notices) = manager_with(store);
        manager.apply_token(Some("t".to_string()));

        manager.logout();
        assert!(manager.token().is_none());

        manager.settle(Duration::from_secs(2)).await;
        assert!(manager.token().is_none());
    }

    #[tokio::test]
    async fn non_auth_profile_failure_keeps_cached_profile() {
        let store = Arc::new(MemoryTokenStore::default());
        let (mut manager, mut notices) = manager_with(store);
        manager.apply_token(Some("t".to_string()));
        manager.session.user = Some(profile(Role::HotelOwner));

        manager.fetch_profile().await;

        assert_eq!(manager.token(), Some("t"));
        assert!(manager.is_owner());
        assert!(!manager.is_loading());
        let notice = notices.try_recv().expect("error notice");
        assert_eq!(notice.level, NoticeLevel::Error);
    }

    #[test]
    fn mark_owner_promotes_current_user() {
        let (mut manager, _notices) = manager_with(Arc::new(MemoryTokenStore::default()));
        manager.mark_owner();
        assert!(!manager.is_owner());

        manager.apply_token(Some("t".to_string()));
        manager.session.user = Some(profile(Role::Guest));
        manager.mark_owner();
        assert!(manager.is_owner());
    }
}
