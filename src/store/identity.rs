//! Accounts, credential checks and bearer-token rotation.

use super::{normalize, Store, StoreState};
use crate::auth::{hash_password, issue_token, verify_password};
use crate::error::{Result, StoreError};
use crate::models::{BootstrapInfo, SignupRequest, User, UserRole};
use tracing::{debug, info, warn};
use uuid::Uuid;

impl StoreState {
    pub(super) fn insert_user(&mut self, user: User) {
        self.usernames.insert(normalize(&user.username), user.id);
        self.emails.insert(normalize(&user.email), user.id);
        self.tokens.insert(user.token.clone(), user.id);
        self.user_order.push(user.id);
        self.users.insert(user.id, user);
    }

    pub(super) fn user_by_username(&self, username: &str) -> Option<&User> {
        self.usernames
            .get(&normalize(username))
            .and_then(|id| self.users.get(id))
    }

    fn user_by_token(&self, token: &str) -> Option<&User> {
        self.tokens.get(token).and_then(|id| self.users.get(id))
    }

    /// Replace the user's token; the previous one is unindexed immediately.
    fn rotate_token(&mut self, user_id: Uuid) -> Option<User> {
        let user = self.users.get_mut(&user_id)?;
        let token = issue_token();
        self.tokens.remove(&user.token);
        self.tokens.insert(token.clone(), user_id);
        user.token = token;
        Some(user.clone())
    }

    pub(super) fn users_in_order(&self) -> impl Iterator<Item = &User> {
        self.user_order.iter().filter_map(|id| self.users.get(id))
    }
}

impl Store {
    pub fn bootstrap_info(&self) -> BootstrapInfo {
        BootstrapInfo {
            platform_name: self.settings.platform_name.clone(),
            has_default_admin: self.has_admin(),
        }
    }

    pub fn has_admin(&self) -> bool {
        self.read().users.values().any(User::is_admin)
    }

    /// Check credentials and rotate the bearer token. Unknown usernames and
    /// wrong passwords are indistinguishable to the caller.
    pub fn login(&self, username: &str, password: &str) -> Result<User> {
        let candidate = self
            .read()
            .user_by_username(username)
            .map(|user| (user.id, user.password_hash.clone()));

        let Some((user_id, password_hash)) = candidate else {
            warn!("login rejected: unknown username");
            return Err(StoreError::InvalidCredentials);
        };
        if !verify_password(password, &password_hash)? {
            warn!(%user_id, "login rejected: wrong password");
            return Err(StoreError::InvalidCredentials);
        }

        let user = self
            .write()
            .rotate_token(user_id)
            .ok_or(StoreError::InvalidCredentials)?;
        info!(%user_id, "login succeeded, token rotated");
        Ok(user)
    }

    /// Register a new account and enroll it in the requested (or default)
    /// community.
    ///
    /// Checks run in order: username, email, admin invite code, community.
    /// Nothing is committed until all of them pass, so a missing community
    /// never consumes an invite use.
    pub fn signup(&self, request: SignupRequest) -> Result<User> {
        let password_hash = hash_password(&request.password, self.settings.bcrypt_cost)?;

        let mut state = self.write();
        if state.usernames.contains_key(&normalize(&request.username)) {
            return Err(StoreError::DuplicateUsername);
        }
        if state.emails.contains_key(&normalize(&request.email)) {
            return Err(StoreError::DuplicateEmail);
        }

        let invite_code = match request.role {
            UserRole::Admin => {
                let code = request
                    .admin_invite_code
                    .as_deref()
                    .map(str::trim)
                    .filter(|code| !code.is_empty())
                    .ok_or(StoreError::InvalidInviteCode)?;
                if !state.invite_is_active(code) {
                    warn!(username = %request.username, "admin signup rejected: invalid invite code");
                    return Err(StoreError::InvalidInviteCode);
                }
                Some(code.to_string())
            }
            UserRole::Learner => None,
        };

        let slug = request
            .community_slug
            .as_deref()
            .map(str::trim)
            .filter(|slug| !slug.is_empty())
            .unwrap_or(self.settings.default_community_slug.as_str());
        let community_id = state
            .community_by_slug(slug)
            .map(|community| community.id)
            .ok_or(StoreError::CommunityNotFound)?;

        if let Some(code) = invite_code {
            state.consume_invite(&code);
        }
        let user = User {
            id: Uuid::new_v4(),
            username: request.username,
            email: request.email,
            name: request.name,
            role: request.role,
            level: request.level,
            token: issue_token(),
            password_hash,
        };
        state.insert_user(user.clone());
        state.insert_membership(community_id, user.id, user.role);

        info!(user_id = %user.id, role = ?user.role, community = %slug, "user signed up");
        Ok(user)
    }

    /// Exact bearer-token lookup.
    pub fn resolve(&self, token: &str) -> Option<User> {
        let user = self.read().user_by_token(token).cloned();
        debug!(found = user.is_some(), "token resolved");
        user
    }

    pub fn authenticate(&self, token: Option<&str>) -> Result<User> {
        token
            .and_then(|token| self.resolve(token))
            .ok_or(StoreError::Unauthenticated)
    }

    /// Admin-only guard. A missing or stale token is still `Unauthenticated`.
    pub fn require_admin(&self, token: Option<&str>) -> Result<User> {
        let user = self.authenticate(token)?;
        if !user.is_admin() {
            return Err(StoreError::Forbidden);
        }
        Ok(user)
    }
}
