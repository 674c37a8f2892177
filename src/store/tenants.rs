//! Communities (tenants) and memberships.

use super::{normalize, now, Store, StoreState};
use crate::error::{Result, StoreError};
use crate::models::{Community, CommunityMember, CreateCommunityMemberRequest, CreateCommunityRequest, User, UserRole};
use tracing::info;
use uuid::Uuid;

impl StoreState {
    pub(super) fn insert_community(&mut self, community: Community) {
        self.slugs.insert(normalize(&community.slug), community.id);
        self.community_order.push(community.id);
        self.communities.insert(community.id, community);
    }

    pub(super) fn community_by_slug(&self, slug: &str) -> Option<&Community> {
        self.slugs
            .get(&normalize(slug))
            .and_then(|id| self.communities.get(id))
    }

    pub(super) fn communities_in_order(&self) -> impl Iterator<Item = &Community> {
        self.community_order.iter().filter_map(|id| self.communities.get(id))
    }

    /// Caller guarantees the (community, user) pair is not yet a member.
    pub(super) fn insert_membership(&mut self, community_id: Uuid, user_id: Uuid, role: UserRole) -> CommunityMember {
        let membership = CommunityMember {
            id: Uuid::new_v4(),
            community_id,
            user_id,
            role,
            joined_at: now(),
        };
        self.member_keys.insert((community_id, user_id));
        self.members.push(membership.clone());
        membership
    }

    fn is_member(&self, community_id: Uuid, user_id: Uuid) -> bool {
        self.member_keys.contains(&(community_id, user_id))
    }

    fn accessible_community(&self, user_id: Uuid, slug: Option<&str>) -> Option<&Community> {
        if !self.members.iter().any(|m| m.user_id == user_id) {
            return None;
        }
        match slug {
            Some(slug) => self
                .community_by_slug(slug)
                .filter(|community| self.is_member(community.id, user_id)),
            None => self
                .communities_in_order()
                .find(|community| self.is_member(community.id, user_id)),
        }
    }
}

impl Store {
    pub fn find_community(&self, slug: &str) -> Option<Community> {
        self.read().community_by_slug(slug).cloned()
    }

    /// Create a community. The slug is stored lowercased and must be unique
    /// under that normalization.
    pub fn create_community(&self, request: CreateCommunityRequest) -> Result<Community> {
        let slug = normalize(request.slug.trim());
        if slug.is_empty() {
            return Err(StoreError::EmptySlug);
        }

        let mut state = self.write();
        if state.slugs.contains_key(&slug) {
            return Err(StoreError::SlugAlreadyExists);
        }
        let community = Community {
            id: Uuid::new_v4(),
            slug,
            name: request.name,
            description: request.description,
            branding: request.branding,
            status: request.status,
        };
        state.insert_community(community.clone());

        info!(community_id = %community.id, slug = %community.slug, "community created");
        Ok(community)
    }

    pub fn add_member(&self, request: CreateCommunityMemberRequest) -> Result<CommunityMember> {
        let mut state = self.write();
        let community_id = state
            .community_by_slug(&request.community_slug)
            .map(|community| community.id)
            .ok_or(StoreError::CommunityNotFound)?;
        let user_id = state
            .user_by_username(&request.username)
            .map(|user| user.id)
            .ok_or(StoreError::UserNotFound)?;
        if state.is_member(community_id, user_id) {
            return Err(StoreError::MembershipAlreadyExists);
        }
        let membership = state.insert_membership(community_id, user_id, request.role);

        info!(%community_id, %user_id, role = ?request.role, "community member added");
        Ok(membership)
    }

    /// The community `user` is acting in. With a slug, that community if the
    /// user belongs to it; without one, the first joined community in
    /// registry order. `None` means no access.
    pub fn accessible_community(&self, user: &User, slug: Option<&str>) -> Option<Community> {
        self.read().accessible_community(user.id, slug).cloned()
    }

    pub fn communities_for(&self, user: &User) -> Vec<Community> {
        let state = self.read();
        state
            .communities_in_order()
            .filter(|community| state.is_member(community.id, user.id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::models::{CommunityStatus, SkillLevel};
    use std::collections::BTreeMap;

    fn create_request(slug: &str) -> CreateCommunityRequest {
        CreateCommunityRequest {
            slug: slug.to_string(),
            name: "HVAC".to_string(),
            description: String::new(),
            branding: BTreeMap::new(),
            status: CommunityStatus::Active,
        }
    }

    #[test]
    fn test_slug_is_normalized_and_unique() {
        let store = test_store();
        let created = store.create_community(create_request("HVAC")).unwrap();
        assert_eq!(created.slug, "hvac");
        assert!(matches!(
            store.create_community(create_request("hvac")),
            Err(StoreError::SlugAlreadyExists)
        ));
        assert!(matches!(
            store.create_community(create_request("Automotive")),
            Err(StoreError::SlugAlreadyExists)
        ));
        assert_eq!(store.find_community("HvAc").map(|c| c.id), Some(created.id));
    }

    #[test]
    fn test_empty_slug_is_rejected() {
        let store = test_store();
        assert!(matches!(store.create_community(create_request("")), Err(StoreError::EmptySlug)));
        assert!(matches!(store.create_community(create_request("   ")), Err(StoreError::EmptySlug)));
    }

    #[test]
    fn test_membership_is_unique_per_pair() {
        let store = test_store();
        community(&store, "hvac");
        learner(&store, "tech1", SkillLevel::Beginner);

        join(&store, "hvac", "tech1");
        let again = store.add_member(CreateCommunityMemberRequest {
            community_slug: "HVAC".to_string(),
            username: "TECH1".to_string(),
            role: UserRole::Learner,
        });
        assert!(matches!(again, Err(StoreError::MembershipAlreadyExists)));
    }

    #[test]
    fn test_add_member_requires_community_and_user() {
        let store = test_store();
        learner(&store, "tech1", SkillLevel::Beginner);

        let missing_community = store.add_member(CreateCommunityMemberRequest {
            community_slug: "hvac".to_string(),
            username: "tech1".to_string(),
            role: UserRole::Learner,
        });
        assert!(matches!(missing_community, Err(StoreError::CommunityNotFound)));

        let missing_user = store.add_member(CreateCommunityMemberRequest {
            community_slug: "automotive".to_string(),
            username: "ghost".to_string(),
            role: UserRole::Learner,
        });
        assert!(matches!(missing_user, Err(StoreError::UserNotFound)));
    }

    #[test]
    fn test_accessible_community_resolution() {
        let store = test_store();
        let hvac = community(&store, "hvac");
        community(&store, "plumbing");
        let tech = learner(&store, "tech1", SkillLevel::Beginner);
        join(&store, "hvac", "tech1");

        // First membership in registry order
        assert_eq!(store.accessible_community(&tech, None).unwrap().slug, "automotive");
        assert_eq!(store.accessible_community(&tech, Some("HVAC")).map(|c| c.id), Some(hvac.id));
        assert!(store.accessible_community(&tech, Some("plumbing")).is_none());
        assert!(store.accessible_community(&tech, Some("unknown")).is_none());

        let slugs: Vec<_> = store.communities_for(&tech).into_iter().map(|c| c.slug).collect();
        assert_eq!(slugs, vec!["automotive", "hvac"]);
    }

    #[test]
    fn test_user_without_memberships_has_no_community() {
        let store = test_store();
        let stranger = User {
            id: Uuid::new_v4(),
            username: "stranger".to_string(),
            email: "stranger@example.com".to_string(),
            name: "Stranger".to_string(),
            role: UserRole::Learner,
            level: SkillLevel::Beginner,
            token: String::new(),
            password_hash: String::new(),
        };
        assert!(store.accessible_community(&stranger, None).is_none());
        assert!(store.accessible_community(&stranger, Some("automotive")).is_none());
        assert!(store.communities_for(&stranger).is_empty());
    }
}
