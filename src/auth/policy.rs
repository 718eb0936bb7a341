//! Role-based guards applied before any protected mutation or listing.
//!
//! Every guarded action maps to exactly one rule in [`POLICY_TABLE`]; callers
//! go through [`AccessGate::authorize`] instead of checking roles themselves.

use std::fmt;

use crate::{
    auth::Principal,
    errors::{AppError, AppResult},
    services::notifier::{Notification, Notifier},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    AddUser,
    ImportUsers,
    CreateCourse,
    EditCourse,
    DeleteCourse,
    ViewCourseManagement,
    ViewUserManagement,
    ManageLearningPaths,
    AwardPoints,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::AddUser => "add_user",
            Action::ImportUsers => "import_users",
            Action::CreateCourse => "create_course",
            Action::EditCourse => "edit_course",
            Action::DeleteCourse => "delete_course",
            Action::ViewCourseManagement => "view_course_management",
            Action::ViewUserManagement => "view_user_management",
            Action::ManageLearningPaths => "manage_learning_paths",
            Action::AwardPoints => "award_points",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Rule = fn(&Principal) -> bool;

fn admin(principal: &Principal) -> bool {
    principal.is_admin()
}

fn admin_or_publisher(principal: &Principal) -> bool {
    principal.is_admin() || principal.is_publisher()
}

const POLICY_TABLE: &[(Action, Rule, &str)] = &[
    (Action::AddUser, admin, "only admins can add users"),
    (Action::ImportUsers, admin, "only admins can import users"),
    (Action::CreateCourse, admin_or_publisher, "only admins and publishers can create courses"),
    (Action::EditCourse, admin_or_publisher, "only admins and publishers can edit courses"),
    (Action::DeleteCourse, admin_or_publisher, "only admins and publishers can delete courses"),
    (Action::ViewCourseManagement, admin_or_publisher, "only admins and publishers can manage courses"),
    (Action::ViewUserManagement, admin, "only admins can manage users"),
    (Action::ManageLearningPaths, admin_or_publisher, "only admins and publishers can manage learning paths"),
    (Action::AwardPoints, admin, "only admins can award points directly"),
];

pub struct AccessPolicy;

impl AccessPolicy {
    pub fn allows(principal: &Principal, action: Action) -> bool {
        POLICY_TABLE
            .iter()
            .find(|(a, _, _)| *a == action)
            .map(|(_, rule, _)| rule(principal))
            .unwrap_or(false)
    }

    pub fn check(principal: &Principal, action: Action) -> AppResult<()> {
        if Self::allows(principal, action) {
            return Ok(());
        }

        let reason = POLICY_TABLE
            .iter()
            .find(|(a, _, _)| *a == action)
            .map(|(_, _, reason)| *reason)
            .unwrap_or("action is not permitted");

        Err(AppError::PermissionDenied(reason.to_string()))
    }
}

/// Applies [`AccessPolicy`] and reports denials on the notification surface.
#[derive(Clone)]
pub struct AccessGate {
    notifier: Notifier,
}

impl AccessGate {
    pub fn new(notifier: Notifier) -> Self {
        Self { notifier }
    }

    pub fn authorize(&self, principal: &Principal, action: Action) -> AppResult<()> {
        AccessPolicy::check(principal, action).inspect_err(|_| {
            log::warn!(
                "denied {} for user {} (role {})",
                action,
                principal.id(),
                principal.role()
            );
            self.notifier.publish(Notification::AccessDenied {
                user_id: principal.id().to_string(),
                action: action.as_str().to_string(),
            });
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::domain::UserRole, test_utils::fixtures::principal};

    const ALL_ACTIONS: [Action; 9] = [
        Action::AddUser,
        Action::ImportUsers,
        Action::CreateCourse,
        Action::EditCourse,
        Action::DeleteCourse,
        Action::ViewCourseManagement,
        Action::ViewUserManagement,
        Action::ManageLearningPaths,
        Action::AwardPoints,
    ];

    #[test]
    fn test_every_action_has_a_rule() {
        for action in ALL_ACTIONS {
            assert!(
                POLICY_TABLE.iter().any(|(a, _, _)| *a == action),
                "missing rule for {action}"
            );
        }
    }

    #[test]
    fn test_admin_is_allowed_everything() {
        let admin = principal(UserRole::Admin);
        for action in ALL_ACTIONS {
            assert!(AccessPolicy::allows(&admin, action), "{action}");
        }
    }

    #[test]
    fn test_publisher_manages_courses_but_not_users() {
        let publisher = principal(UserRole::Publisher);

        assert!(AccessPolicy::check(&publisher, Action::CreateCourse).is_ok());
        assert!(AccessPolicy::check(&publisher, Action::DeleteCourse).is_ok());
        assert!(AccessPolicy::check(&publisher, Action::ViewCourseManagement).is_ok());
        assert!(matches!(
            AccessPolicy::check(&publisher, Action::AddUser),
            Err(AppError::PermissionDenied(_))
        ));
        assert!(AccessPolicy::check(&publisher, Action::ViewUserManagement).is_err());
    }

    #[test]
    fn test_learner_and_sme_are_denied_guarded_actions() {
        for role in [UserRole::Learner, UserRole::Sme] {
            let user = principal(role);
            for action in ALL_ACTIONS {
                assert!(!AccessPolicy::allows(&user, action), "{role} {action}");
            }
        }
    }

    #[tokio::test]
    async fn test_gate_publishes_denial() {
        let notifier = Notifier::new(8);
        let mut events = notifier.subscribe();
        let gate = AccessGate::new(notifier);

        let learner = principal(UserRole::Learner);
        let result = gate.authorize(&learner, Action::CreateCourse);

        assert!(matches!(result, Err(AppError::PermissionDenied(_))));
        match events.try_recv() {
            Ok(Notification::AccessDenied { action, .. }) => assert_eq!(action, "create_course"),
            other => panic!("expected AccessDenied, got {:?}", other),
        }
    }
}
