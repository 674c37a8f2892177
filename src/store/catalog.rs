//! Courses, tools, announcements and the prerequisite gate.
//!
//! Unlock decisions are derived on every call from the current attempts and
//! are never cached. Passed tests only count inside the community that owns
//! the test, so a pass in one tenant cannot unlock a course in another.

use super::{now, Store, StoreState};
use crate::error::{Result, StoreError};
use crate::models::{
    Announcement, Course, CourseAccess, CreateAnnouncementRequest, CreateCourseRequest, CreateToolRequest,
    ToolResource, User,
};
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

const ADMIN_ACCESS: &str = "Admin access";
const UNLOCKED: &str = "Unlocked";
const MISSING_PREREQUISITES: &str = "Requires passing prerequisite tests";

impl StoreState {
    fn community_id_for_slug(&self, slug: &str) -> Result<Uuid> {
        self.community_by_slug(slug)
            .map(|community| community.id)
            .ok_or(StoreError::CommunityNotFound)
    }

    pub(super) fn courses_in(&self, community_id: Uuid) -> impl Iterator<Item = &Course> {
        self.course_order
            .iter()
            .filter_map(|id| self.courses.get(id))
            .filter(move |course| course.community_id == community_id)
    }

    pub(super) fn courses_in_order(&self) -> impl Iterator<Item = &Course> {
        self.course_order.iter().filter_map(|id| self.courses.get(id))
    }

    fn courses_visible(&self, user: &User, community_id: Uuid) -> impl Iterator<Item = &Course> {
        let admin = user.is_admin();
        self.courses_in(community_id)
            .filter(move |course| admin || course.is_published)
    }

    fn passed_test_ids(&self, user_id: Uuid, community_id: Uuid) -> HashSet<Uuid> {
        self.attempts
            .iter()
            .filter(|attempt| attempt.user_id == user_id && attempt.passed)
            .filter(|attempt| {
                self.tests
                    .get(&attempt.test_id)
                    .is_some_and(|test| test.community_id == community_id)
            })
            .map(|attempt| attempt.test_id)
            .collect()
    }

    fn can_access(&self, course: &Course, user: &User, community_id: Uuid) -> (bool, String) {
        if user.is_admin() {
            return (true, ADMIN_ACCESS.to_string());
        }
        if user.level < course.required_starting_level {
            return (false, format!("Requires {} level", course.required_starting_level));
        }
        let passed = self.passed_test_ids(user.id, community_id);
        if course
            .required_passed_test_ids
            .iter()
            .any(|test_id| !passed.contains(test_id))
        {
            return (false, MISSING_PREREQUISITES.to_string());
        }
        (true, UNLOCKED.to_string())
    }

    pub(super) fn access_list(&self, user: &User, community_id: Uuid) -> Vec<CourseAccess> {
        self.courses_visible(user, community_id)
            .map(|course| {
                let (unlocked, reason) = self.can_access(course, user, community_id);
                CourseAccess {
                    course: course.clone(),
                    unlocked,
                    reason,
                }
            })
            .collect()
    }

    /// Newest first; ties keep the later insertion first.
    pub(super) fn announcements_in(&self, community_id: Uuid) -> Vec<Announcement> {
        let mut items: Vec<Announcement> = self
            .announcements
            .iter()
            .rev()
            .filter(|item| item.community_id == community_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }
}

impl Store {
    /// Prerequisite ids are stored as given; they only ever count when the
    /// referenced test belongs to the course's community.
    pub fn add_course(&self, request: CreateCourseRequest) -> Result<Course> {
        let mut state = self.write();
        let community_id = state.community_id_for_slug(&request.community_slug)?;
        let course = Course {
            id: Uuid::new_v4(),
            community_id,
            title: request.title,
            category: request.category,
            description: request.description,
            required_starting_level: request.required_starting_level,
            required_passed_test_ids: request.required_passed_test_ids,
            sections: request.sections,
            is_published: request.is_published,
        };
        state.course_order.push(course.id);
        state.courses.insert(course.id, course.clone());

        info!(course_id = %course.id, %community_id, "course created");
        Ok(course)
    }

    pub fn add_tool(&self, request: CreateToolRequest) -> Result<ToolResource> {
        let mut state = self.write();
        let community_id = state.community_id_for_slug(&request.community_slug)?;
        let tool = ToolResource {
            id: Uuid::new_v4(),
            community_id,
            name: request.name,
            description: request.description,
            link: request.link,
        };
        state.tools.push(tool.clone());

        info!(tool_id = %tool.id, %community_id, "tool created");
        Ok(tool)
    }

    pub fn add_announcement(&self, request: CreateAnnouncementRequest) -> Result<Announcement> {
        let mut state = self.write();
        let community_id = state.community_id_for_slug(&request.community_slug)?;
        let announcement = Announcement {
            id: Uuid::new_v4(),
            community_id,
            title: request.title,
            message: request.message,
            created_at: now(),
        };
        state.announcements.push(announcement.clone());

        info!(announcement_id = %announcement.id, %community_id, "announcement created");
        Ok(announcement)
    }

    /// Published courses in the community, or all of them for admins.
    pub fn courses_visible(&self, user: &User, community_id: Uuid) -> Vec<Course> {
        self.read().courses_visible(user, community_id).cloned().collect()
    }

    /// Tests the user has passed at least once, restricted to tests owned by
    /// `community_id`.
    pub fn passed_test_ids(&self, user: &User, community_id: Uuid) -> HashSet<Uuid> {
        self.read().passed_test_ids(user.id, community_id)
    }

    /// Unlock decision and its reason for one course.
    pub fn can_access(&self, course: &Course, user: &User, community_id: Uuid) -> (bool, String) {
        self.read().can_access(course, user, community_id)
    }

    pub fn access_list(&self, user: &User, community_id: Uuid) -> Vec<CourseAccess> {
        self.read().access_list(user, community_id)
    }

    pub fn tools_in(&self, community_id: Uuid) -> Vec<ToolResource> {
        self.read()
            .tools
            .iter()
            .filter(|tool| tool.community_id == community_id)
            .cloned()
            .collect()
    }

    pub fn announcements_in(&self, community_id: Uuid) -> Vec<Announcement> {
        self.read().announcements_in(community_id)
    }
}
