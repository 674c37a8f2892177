//! In-memory training platform store.
//!
//! All collections live in one [`StoreState`] behind a single lock. Every
//! mutating operation holds the write guard from its first check to its last
//! insert, so concurrent signups, invite redemptions and submissions are
//! serialized. Reads share the read guard and never see a half-applied
//! mutation. Derived state (course unlocks) is recomputed on every read.
//!
//! Entities are kept in id-keyed maps with a separate insertion-order index
//! so listings come out in registry order.

mod assessment;
mod catalog;
mod identity;
mod invites;
mod overview;
mod tenants;

pub use assessment::score_answers;

use crate::auth::{hash_password, issue_token};
use crate::config::Config;
use crate::error::Result;
use crate::models::{
    Announcement, Community, CommunityMember, CommunityStatus, Course, InviteCode, SkillLevel, Test,
    TestAttempt, ToolResource, User, UserRole,
};
use chrono::Utc;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Store-level settings taken from [`Config`].
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub platform_name: String,
    pub default_community_slug: String,
    pub bcrypt_cost: u32,
}

impl From<&Config> for StoreSettings {
    fn from(config: &Config) -> Self {
        Self {
            platform_name: config.platform_name.clone(),
            default_community_slug: config.default_community_slug.clone(),
            bcrypt_cost: config.bcrypt_cost,
        }
    }
}

#[derive(Default)]
struct StoreState {
    users: HashMap<Uuid, User>,
    user_order: Vec<Uuid>,
    // Lowercased username/email -> user id
    usernames: HashMap<String, Uuid>,
    emails: HashMap<String, Uuid>,
    tokens: HashMap<String, Uuid>,

    communities: HashMap<Uuid, Community>,
    community_order: Vec<Uuid>,
    slugs: HashMap<String, Uuid>,

    members: Vec<CommunityMember>,
    // (community id, user id)
    member_keys: HashSet<(Uuid, Uuid)>,

    courses: HashMap<Uuid, Course>,
    course_order: Vec<Uuid>,
    tests: HashMap<Uuid, Test>,
    test_order: Vec<Uuid>,
    tools: Vec<ToolResource>,
    announcements: Vec<Announcement>,

    invite_codes: HashMap<String, InviteCode>,
    invite_order: Vec<String>,

    // Append-only
    attempts: Vec<TestAttempt>,
}

/// Shared handle to the platform state. Cloning is cheap and every clone
/// sees the same collections.
#[derive(Clone)]
pub struct Store {
    inner: Arc<RwLock<StoreState>>,
    settings: Arc<StoreSettings>,
}

impl Store {
    /// Empty store: no communities, no users.
    pub fn new(settings: StoreSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreState::default())),
            settings: Arc::new(settings),
        }
    }

    /// Store seeded with the default community and one administrator who is
    /// an admin member of it.
    pub fn bootstrap(config: &Config) -> Result<Self> {
        let store = Store::new(StoreSettings::from(config));
        let password_hash = hash_password(&config.admin_password, config.bcrypt_cost)?;

        {
            let mut state = store.write();
            let community = Community {
                id: Uuid::new_v4(),
                slug: config.default_community_slug.clone(),
                name: "Automotive".to_string(),
                description: "Automotive diagnostics and technician training campus.".to_string(),
                branding: BTreeMap::from([
                    ("primaryColor".to_string(), "#2563eb".to_string()),
                    ("logo".to_string(), "wrench".to_string()),
                ]),
                status: CommunityStatus::Active,
            };
            let community_id = community.id;
            state.insert_community(community);

            let admin = User {
                id: Uuid::new_v4(),
                username: config.admin_username.clone(),
                email: config.admin_email.clone(),
                name: format!("{} Owner", config.platform_name),
                role: UserRole::Admin,
                level: SkillLevel::Advanced,
                token: issue_token(),
                password_hash,
            };
            let admin_id = admin.id;
            state.insert_user(admin);
            state.insert_membership(community_id, admin_id, UserRole::Admin);
        }

        info!(
            community = %config.default_community_slug,
            admin = %config.admin_username,
            "store bootstrapped"
        );
        Ok(store)
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.inner.read()
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.inner.write()
    }
}

/// Uniqueness key for usernames, emails and slugs.
fn normalize(value: &str) -> String {
    value.to_lowercase()
}

fn now() -> chrono::DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::models::{
        CreateCommunityMemberRequest, CreateCommunityRequest, CreateCourseRequest, CreateTestRequest,
        SignupRequest, TestQuestion,
    };

    pub const ADMIN_USERNAME: &str = "wrenchadmin";
    pub const ADMIN_PASSWORD: &str = "ChangeMeNow!123";

    pub fn test_config() -> Config {
        Config {
            bcrypt_cost: 4,
            ..Config::default()
        }
    }

    pub fn test_store() -> Store {
        Store::bootstrap(&test_config()).expect("bootstrap store")
    }

    pub fn signup_request(username: &str, level: SkillLevel, role: UserRole) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            password: "pass123".to_string(),
            email: format!("{username}@example.com"),
            name: format!("Tech {username}"),
            level,
            role,
            admin_invite_code: None,
            community_slug: None,
        }
    }

    pub fn learner(store: &Store, username: &str, level: SkillLevel) -> User {
        store
            .signup(signup_request(username, level, UserRole::Learner))
            .expect("learner signup")
    }

    pub fn admin(store: &Store) -> User {
        store.login(ADMIN_USERNAME, ADMIN_PASSWORD).expect("admin login")
    }

    pub fn community(store: &Store, slug: &str) -> Community {
        store
            .create_community(CreateCommunityRequest {
                slug: slug.to_string(),
                name: slug.to_uppercase(),
                description: format!("{slug} campus"),
                branding: BTreeMap::new(),
                status: CommunityStatus::Active,
            })
            .expect("community creation")
    }

    pub fn join(store: &Store, slug: &str, username: &str) -> CommunityMember {
        store
            .add_member(CreateCommunityMemberRequest {
                community_slug: slug.to_string(),
                username: username.to_string(),
                role: UserRole::Learner,
            })
            .expect("membership creation")
    }

    pub fn course(store: &Store, slug: &str, level: SkillLevel, prerequisites: Vec<Uuid>) -> Course {
        store
            .add_course(CreateCourseRequest {
                community_slug: slug.to_string(),
                title: format!("{slug} course"),
                category: slug.to_string(),
                description: "fundamentals".to_string(),
                required_starting_level: level,
                required_passed_test_ids: prerequisites,
                sections: vec![],
                is_published: true,
            })
            .expect("course creation")
    }

    pub fn question(correct: usize) -> TestQuestion {
        TestQuestion {
            id: Uuid::new_v4(),
            prompt: "Q".to_string(),
            options: vec!["A".to_string(), "B".to_string()],
            correct_option_index: correct,
        }
    }

    pub fn test_for(store: &Store, slug: &str, course_id: Uuid, passing_score: f64, questions: Vec<TestQuestion>) -> Test {
        store
            .add_test(CreateTestRequest {
                community_slug: slug.to_string(),
                course_id,
                title: format!("{slug} test"),
                passing_score,
                questions,
            })
            .expect("test creation")
    }
}
