//! Limited-use admin invite codes. Codes are only redeemed through signup.

use super::{now, Store, StoreState};
use crate::models::InviteCode;
use tracing::info;
use uuid::Uuid;

const CODE_PREFIX: &str = "WRENCH";

impl StoreState {
    pub(super) fn invite_is_active(&self, code: &str) -> bool {
        self.invite_codes.get(code).is_some_and(InviteCode::is_active)
    }

    /// Spend one use. Returns false if the code is unknown or exhausted.
    pub(super) fn consume_invite(&mut self, code: &str) -> bool {
        match self.invite_codes.get_mut(code) {
            Some(invite) if invite.is_active() => {
                invite.uses_remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn generate_invite_code(&self) -> String {
        loop {
            let suffix: String = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
            let code = format!("{CODE_PREFIX}-{suffix}");
            if !self.invite_codes.contains_key(&code) {
                return code;
            }
        }
    }

    pub(super) fn invites_in_order(&self) -> impl Iterator<Item = &InviteCode> {
        self.invite_order.iter().filter_map(|code| self.invite_codes.get(code))
    }
}

impl Store {
    /// Create an invite code. `uses` below 1 is raised to 1.
    pub fn create_invite_code(&self, uses: i64, creator_id: Uuid) -> InviteCode {
        let uses_remaining = u32::try_from(uses.max(1)).unwrap_or(u32::MAX);

        let mut state = self.write();
        let invite = InviteCode {
            id: Uuid::new_v4(),
            code: state.generate_invite_code(),
            uses_remaining,
            created_by_admin_id: creator_id,
            created_at: now(),
        };
        state.invite_order.push(invite.code.clone());
        state.invite_codes.insert(invite.code.clone(), invite.clone());

        info!(%creator_id, uses = uses_remaining, "invite code created");
        invite
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::error::StoreError;
    use crate::models::{SkillLevel, UserRole};

    #[test]
    fn test_uses_are_clamped_to_at_least_one() {
        let store = test_store();
        let creator = admin(&store).id;
        assert_eq!(store.create_invite_code(0, creator).uses_remaining, 1);
        assert_eq!(store.create_invite_code(-5, creator).uses_remaining, 1);
        assert_eq!(store.create_invite_code(3, creator).uses_remaining, 3);
    }

    #[test]
    fn test_codes_are_unique_and_prefixed() {
        let store = test_store();
        let creator = admin(&store).id;
        let a = store.create_invite_code(1, creator);
        let b = store.create_invite_code(1, creator);
        assert_ne!(a.code, b.code);
        assert!(a.code.starts_with("WRENCH-"));
        assert_eq!(a.code.len(), "WRENCH-".len() + 8);
    }

    #[test]
    fn test_single_use_code_is_exhausted_after_one_signup() {
        let store = test_store();
        let invite = store.create_invite_code(1, admin(&store).id);

        let mut first = signup_request("boss1", SkillLevel::Advanced, UserRole::Admin);
        first.admin_invite_code = Some(invite.code.clone());
        store.signup(first).expect("first admin signup");

        let mut second = signup_request("boss2", SkillLevel::Advanced, UserRole::Admin);
        second.admin_invite_code = Some(invite.code.clone());
        assert!(matches!(store.signup(second), Err(StoreError::InvalidInviteCode)));

        let overview = store.admin_overview();
        let stored = overview.invite_codes.iter().find(|c| c.code == invite.code).unwrap();
        assert_eq!(stored.uses_remaining, 0);
        assert!(!stored.is_active());
    }

    #[test]
    fn test_failed_community_lookup_keeps_invite_use() {
        let store = test_store();
        let invite = store.create_invite_code(1, admin(&store).id);

        let mut request = signup_request("boss1", SkillLevel::Advanced, UserRole::Admin);
        request.admin_invite_code = Some(invite.code.clone());
        request.community_slug = Some("missing".to_string());
        assert!(matches!(store.signup(request.clone()), Err(StoreError::CommunityNotFound)));

        request.community_slug = None;
        store.signup(request).expect("invite still has its use");
    }

    #[test]
    fn test_concurrent_signups_cannot_overspend_a_code() {
        let store = test_store();
        let invite = store.create_invite_code(1, admin(&store).id);

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let store = store.clone();
                let code = invite.code.clone();
                std::thread::spawn(move || {
                    let mut request = signup_request(&format!("boss{i}"), SkillLevel::Advanced, UserRole::Admin);
                    request.admin_invite_code = Some(code);
                    store.signup(request).is_ok()
                })
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
    }
}
