//! Read-only views composed from the other components.

use super::Store;
use crate::models::{AdminOverview, Community, DashboardResponse, User};
use tracing::debug;

impl Store {
    /// Learner view of one community. All parts are taken under the same
    /// read guard so they agree with each other.
    pub fn dashboard(&self, user: &User, community: &Community) -> DashboardResponse {
        let state = self.read();
        debug!(user_id = %user.id, community = %community.slug, "dashboard");
        DashboardResponse {
            user: user.profile(),
            active_community: community.clone(),
            courses: state.access_list(user, community.id),
            attempts: state.attempts_in(user.id, community.id),
            announcements: state.announcements_in(community.id),
        }
    }

    /// Cross-tenant aggregate. Callers are responsible for restricting this
    /// to administrators.
    pub fn admin_overview(&self) -> AdminOverview {
        let state = self.read();
        AdminOverview {
            communities: state.communities_in_order().cloned().collect(),
            community_members: state.members.clone(),
            users: state.users_in_order().map(User::profile).collect(),
            courses: state.courses_in_order().cloned().collect(),
            tests: state.tests_in_order().cloned().collect(),
            tools: state.tools.clone(),
            invite_codes: state.invites_in_order().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use crate::models::{CreateAnnouncementRequest, SkillLevel, SubmitTestRequest};

    #[test]
    fn test_dashboard_is_scoped_to_community() {
        let store = test_store();
        let automotive = store.find_community("automotive").unwrap();
        let hvac = community(&store, "hvac");
        let tech = learner(&store, "tech1", SkillLevel::Beginner);
        join(&store, "hvac", "tech1");

        let auto_course = course(&store, "automotive", SkillLevel::Beginner, vec![]);
        let auto_test = test_for(&store, "automotive", auto_course.id, 50.0, vec![question(0)]);
        let hvac_course = course(&store, "hvac", SkillLevel::Beginner, vec![]);
        let hvac_test = test_for(&store, "hvac", hvac_course.id, 50.0, vec![question(1)]);

        for (test_id, community_id) in [(auto_test.id, automotive.id), (hvac_test.id, hvac.id)] {
            store
                .submit_test(
                    &tech,
                    SubmitTestRequest {
                        test_id,
                        selected_option_indexes: vec![0],
                    },
                    community_id,
                )
                .unwrap();
        }
        store
            .add_announcement(CreateAnnouncementRequest {
                community_slug: "hvac".to_string(),
                title: "HVAC news".to_string(),
                message: "Filters".to_string(),
            })
            .unwrap();

        let dashboard = store.dashboard(&tech, &hvac);
        assert_eq!(dashboard.user.username, "tech1");
        assert_eq!(dashboard.active_community.id, hvac.id);
        assert_eq!(dashboard.courses.len(), 1);
        assert_eq!(dashboard.courses[0].course.id, hvac_course.id);
        assert_eq!(dashboard.attempts.len(), 1);
        assert_eq!(dashboard.attempts[0].test_id, hvac_test.id);
        assert_eq!(dashboard.announcements.len(), 1);

        let auto_dashboard = store.dashboard(&tech, &automotive);
        assert_eq!(auto_dashboard.attempts[0].test_id, auto_test.id);
        assert!(auto_dashboard.announcements.is_empty());
    }

    #[test]
    fn test_profile_projection_is_redacted() {
        let store = test_store();
        let tech = learner(&store, "tech1", SkillLevel::Beginner);
        let community = store.find_community("automotive").unwrap();

        let json = serde_json::to_value(store.dashboard(&tech, &community)).unwrap();
        let profile = json["user"].as_object().unwrap();
        assert!(!profile.contains_key("token"));
        assert!(!profile.contains_key("password_hash"));
        assert_eq!(profile["username"], "tech1");
    }

    #[test]
    fn test_admin_overview_spans_all_communities() {
        let store = test_store();
        community(&store, "hvac");
        learner(&store, "tech1", SkillLevel::Beginner);
        join(&store, "hvac", "tech1");
        course(&store, "automotive", SkillLevel::Beginner, vec![]);
        course(&store, "hvac", SkillLevel::Beginner, vec![]);
        store.create_invite_code(2, admin(&store).id);

        let overview = store.admin_overview();
        let slugs: Vec<_> = overview.communities.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["automotive", "hvac"]);
        // admin + tech1 in automotive, tech1 in hvac
        assert_eq!(overview.community_members.len(), 3);
        assert_eq!(overview.users.len(), 2);
        assert_eq!(overview.users[0].username, "wrenchadmin");
        assert_eq!(overview.courses.len(), 2);
        assert_eq!(overview.invite_codes.len(), 1);
        assert_eq!(overview.invite_codes[0].uses_remaining, 2);
    }
}
