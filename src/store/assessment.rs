//! Tests, scoring and the append-only attempt log.

use super::{now, Store};
use crate::error::{Result, StoreError};
use crate::models::{CreateTestRequest, SubmitTestRequest, Test, TestAttempt, TestQuestion, User};
use tracing::{info, warn};
use uuid::Uuid;

/// Percentage of answers matching the correct option, position by position.
/// A test without questions scores 0.
pub fn score_answers(questions: &[TestQuestion], answers: &[usize]) -> f64 {
    let correct = questions
        .iter()
        .zip(answers)
        .filter(|(question, answer)| question.correct_option_index == **answer)
        .count();
    correct as f64 / questions.len().max(1) as f64 * 100.0
}

fn validate_questions(questions: &[TestQuestion]) -> Result<()> {
    for (index, question) in questions.iter().enumerate() {
        if question.options.len() < 2 {
            return Err(StoreError::InvalidTest(format!(
                "question {} needs at least two options",
                index + 1
            )));
        }
        if question.correct_option_index >= question.options.len() {
            return Err(StoreError::InvalidTest(format!(
                "question {} has no option at index {}",
                index + 1,
                question.correct_option_index
            )));
        }
    }
    Ok(())
}

impl Store {
    /// Add a test to a course. The course must belong to the same community.
    pub fn add_test(&self, request: CreateTestRequest) -> Result<Test> {
        let mut state = self.write();
        let community_id = state
            .community_by_slug(&request.community_slug)
            .map(|community| community.id)
            .ok_or(StoreError::CommunityNotFound)?;
        if !state
            .courses
            .get(&request.course_id)
            .is_some_and(|course| course.community_id == community_id)
        {
            return Err(StoreError::CourseNotFound);
        }
        if !(0.0..=100.0).contains(&request.passing_score) {
            return Err(StoreError::InvalidPassingScore);
        }
        validate_questions(&request.questions)?;

        let test = Test {
            id: Uuid::new_v4(),
            community_id,
            course_id: request.course_id,
            title: request.title,
            passing_score: request.passing_score,
            questions: request.questions,
        };
        state.test_order.push(test.id);
        state.tests.insert(test.id, test.clone());

        info!(test_id = %test.id, course_id = %test.course_id, %community_id, "test created");
        Ok(test)
    }

    /// Score a submission and append it to the attempt log. Submissions for
    /// a test outside `community_id` are rejected.
    pub fn submit_test(&self, user: &User, payload: SubmitTestRequest, community_id: Uuid) -> Result<TestAttempt> {
        let mut state = self.write();
        let test = state.tests.get(&payload.test_id).ok_or(StoreError::TestNotFound)?;
        if test.community_id != community_id {
            warn!(user_id = %user.id, test_id = %test.id, "submission rejected: test outside active community");
            return Err(StoreError::WrongTenant);
        }
        if payload.selected_option_indexes.len() != test.questions.len() {
            return Err(StoreError::AnswerCountMismatch {
                expected: test.questions.len(),
                got: payload.selected_option_indexes.len(),
            });
        }

        let score = score_answers(&test.questions, &payload.selected_option_indexes);
        let attempt = TestAttempt {
            id: Uuid::new_v4(),
            user_id: user.id,
            test_id: test.id,
            score,
            passed: score >= test.passing_score,
            submitted_at: now(),
        };
        state.attempts.push(attempt.clone());

        info!(
            user_id = %user.id,
            test_id = %attempt.test_id,
            score = attempt.score,
            passed = attempt.passed,
            "test submitted"
        );
        Ok(attempt)
    }

    pub fn tests_in(&self, community_id: Uuid) -> Vec<Test> {
        let state = self.read();
        state
            .test_order
            .iter()
            .filter_map(|id| state.tests.get(id))
            .filter(|test| test.community_id == community_id)
            .cloned()
            .collect()
    }

    /// The user's attempts on tests owned by `community_id`, newest first.
    pub fn attempts_for(&self, user: &User, community_id: Uuid) -> Vec<TestAttempt> {
        self.read().attempts_in(user.id, community_id)
    }
}

impl super::StoreState {
    pub(super) fn attempts_in(&self, user_id: Uuid, community_id: Uuid) -> Vec<TestAttempt> {
        let mut attempts: Vec<TestAttempt> = self
            .attempts
            .iter()
            .rev()
            .filter(|attempt| attempt.user_id == user_id)
            .filter(|attempt| {
                self.tests
                    .get(&attempt.test_id)
                    .is_some_and(|test| test.community_id == community_id)
            })
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        attempts
    }

    pub(super) fn tests_in_order(&self) -> impl Iterator<Item = &Test> {
        self.test_order.iter().filter_map(|id| self.tests.get(id))
    }
}
