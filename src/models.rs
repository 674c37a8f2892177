use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Learner,
}

/// Ordered skill levels; variant order is the gating order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub fn label(self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stored account. Never serialized directly; see [`UserProfile`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub level: SkillLevel,
    pub token: String,
    pub password_hash: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            level: self.level,
        }
    }
}

/// Redacted user projection (no secret, no token).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub level: SkillLevel,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommunityStatus {
    #[default]
    Active,
    Archived,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Community {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub branding: BTreeMap<String, String>,
    pub status: CommunityStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CommunityMember {
    pub id: Uuid,
    pub community_id: Uuid,
    pub user_id: Uuid,
    pub role: UserRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolResource {
    pub id: Uuid,
    pub community_id: Uuid,
    pub name: String,
    pub description: String,
    pub link: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Chapter {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub content_markdown: String,
    #[serde(default)]
    pub tool_ids: Vec<Uuid>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Section {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Course {
    pub id: Uuid,
    pub community_id: Uuid,
    pub title: String,
    pub category: String,
    pub description: String,
    pub required_starting_level: SkillLevel,
    pub required_passed_test_ids: Vec<Uuid>,
    pub sections: Vec<Section>,
    pub is_published: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TestQuestion {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option_index: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Test {
    pub id: Uuid,
    pub community_id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub passing_score: f64,
    pub questions: Vec<TestQuestion>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TestAttempt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub test_id: Uuid,
    pub score: f64,
    pub passed: bool,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Announcement {
    pub id: Uuid,
    pub community_id: Uuid,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InviteCode {
    pub id: Uuid,
    pub code: String,
    pub uses_remaining: u32,
    pub created_by_admin_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl InviteCode {
    pub fn is_active(&self) -> bool {
        self.uses_remaining > 0
    }
}

// --- Requests ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub name: String,
    pub level: SkillLevel,
    pub role: UserRole,
    #[serde(default)]
    pub admin_invite_code: Option<String>,
    #[serde(default)]
    pub community_slug: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateInviteCodeRequest {
    pub uses: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateToolRequest {
    pub community_slug: String,
    pub name: String,
    pub description: String,
    pub link: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateCourseRequest {
    pub community_slug: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub required_starting_level: SkillLevel,
    #[serde(default)]
    pub required_passed_test_ids: Vec<Uuid>,
    #[serde(default)]
    pub sections: Vec<Section>,
    pub is_published: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateTestRequest {
    pub community_slug: String,
    pub course_id: Uuid,
    pub title: String,
    pub passing_score: f64,
    pub questions: Vec<TestQuestion>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateAnnouncementRequest {
    pub community_slug: String,
    pub title: String,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateCommunityRequest {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub branding: BTreeMap<String, String>,
    #[serde(default)]
    pub status: CommunityStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateCommunityMemberRequest {
    pub community_slug: String,
    pub username: String,
    pub role: UserRole,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SubmitTestRequest {
    pub test_id: Uuid,
    pub selected_option_indexes: Vec<usize>,
}

// --- Responses ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub token: String,
    pub role: UserRole,
    pub name: String,
    pub username: String,
    pub level: SkillLevel,
}

impl From<&User> for LoginResponse {
    fn from(user: &User) -> Self {
        Self {
            token: user.token.clone(),
            role: user.role,
            name: user.name.clone(),
            username: user.username.clone(),
            level: user.level,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BootstrapInfo {
    pub platform_name: String,
    pub has_default_admin: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CourseAccess {
    pub course: Course,
    pub unlocked: bool,
    pub reason: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DashboardResponse {
    pub user: UserProfile,
    pub active_community: Community,
    pub courses: Vec<CourseAccess>,
    pub attempts: Vec<TestAttempt>,
    pub announcements: Vec<Announcement>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AdminOverview {
    pub communities: Vec<Community>,
    pub community_members: Vec<CommunityMember>,
    pub users: Vec<UserProfile>,
    pub courses: Vec<Course>,
    pub tests: Vec<Test>,
    pub tools: Vec<ToolResource>,
    pub invite_codes: Vec<InviteCode>,
}
