//! Authorization rules.
//!
//! Handlers describe what is being attempted ([`Action`]) and what they know
//! about the target ([`Target`]); [`authorize`] decides by looking the action
//! up in [`RULES`]. Role-specific behavior lives in the role→permission data
//! seeded into `role_permission`, not here.

use crate::error::AppError;
use crate::extractors::auth::AuthUser;

pub mod perm {
    pub const USER_MANAGE: &str = "user:manage";
    pub const ACADEMIC_MANAGE: &str = "academic:manage";
    pub const ROOM_CREATE: &str = "room:create";
    pub const ROOM_MODERATE: &str = "room:moderate";
    pub const CLASSROOM_TEACH: &str = "classroom:teach";
    pub const CLASSROOM_SUBMIT: &str = "classroom:submit";
    pub const RESOURCE_MODERATE: &str = "resource:moderate";
    pub const STUDENT_PROFILE: &str = "student:profile";
    pub const TEACHER_PROFILE: &str = "teacher:profile";
    pub const STUDENT_MANAGE: &str = "student:manage";
    pub const SCHEDULE_MODERATE: &str = "schedule:moderate";
}

/// Anything that can be authorized: HTTP callers and chat connections.
pub trait Principal {
    fn principal_id(&self) -> i32;
    fn has_permission(&self, permission: &str) -> bool;
}

impl Principal for AuthUser {
    fn principal_id(&self) -> i32 {
        self.user_id
    }

    fn has_permission(&self, permission: &str) -> bool {
        AuthUser::has_permission(self, permission)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    ManageUsers,
    ManageAcademic,
    CreateRoom,
    ViewRoom,
    DeleteRoom,
    /// Subscribe to a room's live chat.
    JoinChat,
    SendChat,
    ReadChatHistory,
    ListPosts,
    CreatePost,
    ListAssignments,
    CreateAssignment,
    DeleteAssignment,
    /// See every assignment of a room regardless of `assigned_to`.
    SeeAllAssignments,
    Submit,
    ListSubmissions,
    Grade,
    ListResources,
    ShareResource,
    DeleteResource,
    /// Create or edit the caller's own student profile.
    FillStudentProfile,
    FillTeacherProfile,
    UpdateStudent,
    /// Delete student profiles and approve their accounts.
    ManageStudents,
    CreateSchedule,
    EditSchedule,
    ManageCoursework,
}

/// One way of satisfying an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grant {
    /// The principal holds this permission.
    Permission(&'static str),
    /// The principal owns the target.
    Owner,
    /// The principal is a member of the target's room.
    Member,
    /// Member of the target's room and holds this permission.
    MemberWith(&'static str),
}

use Action::*;
use Grant::*;

/// Every action with the grants that allow it. Any one grant suffices.
pub const RULES: &[(Action, &[Grant])] = &[
    (ManageUsers, &[Permission(perm::USER_MANAGE)]),
    (ManageAcademic, &[Permission(perm::ACADEMIC_MANAGE)]),
    (CreateRoom, &[Permission(perm::ROOM_CREATE)]),
    (ViewRoom, &[Member, Permission(perm::ROOM_MODERATE)]),
    (DeleteRoom, &[Owner, Permission(perm::ROOM_MODERATE)]),
    (JoinChat, &[Member, Permission(perm::ROOM_MODERATE)]),
    (SendChat, &[Member, Permission(perm::ROOM_MODERATE)]),
    (ReadChatHistory, &[Member, Permission(perm::ROOM_MODERATE)]),
    (ListPosts, &[Member, Permission(perm::ROOM_MODERATE)]),
    (CreatePost, &[Member, Permission(perm::ROOM_MODERATE)]),
    (ListAssignments, &[Member, Permission(perm::ROOM_MODERATE)]),
    (
        CreateAssignment,
        &[
            MemberWith(perm::CLASSROOM_TEACH),
            Permission(perm::ROOM_MODERATE),
        ],
    ),
    (DeleteAssignment, &[Owner, Permission(perm::ROOM_MODERATE)]),
    (
        SeeAllAssignments,
        &[
            MemberWith(perm::CLASSROOM_TEACH),
            Permission(perm::ROOM_MODERATE),
        ],
    ),
    (Submit, &[MemberWith(perm::CLASSROOM_SUBMIT)]),
    (
        ListSubmissions,
        &[
            MemberWith(perm::CLASSROOM_TEACH),
            Permission(perm::ROOM_MODERATE),
        ],
    ),
    (
        Grade,
        &[
            MemberWith(perm::CLASSROOM_TEACH),
            Permission(perm::ROOM_MODERATE),
        ],
    ),
    (ListResources, &[Member, Permission(perm::ROOM_MODERATE)]),
    (ShareResource, &[Member, Permission(perm::ROOM_MODERATE)]),
    (DeleteResource, &[Owner, Permission(perm::RESOURCE_MODERATE)]),
    (FillStudentProfile, &[Permission(perm::STUDENT_PROFILE)]),
    (FillTeacherProfile, &[Permission(perm::TEACHER_PROFILE)]),
    (UpdateStudent, &[Owner, Permission(perm::STUDENT_MANAGE)]),
    (ManageStudents, &[Permission(perm::STUDENT_MANAGE)]),
    (CreateSchedule, &[Permission(perm::CLASSROOM_TEACH)]),
    (EditSchedule, &[Owner, Permission(perm::SCHEDULE_MODERATE)]),
    (ManageCoursework, &[Permission(perm::CLASSROOM_TEACH)]),
];

/// What the caller knows about the object being acted on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Target {
    pub owner_id: Option<i32>,
    pub is_member: bool,
}

impl Target {
    /// For actions that are not about a particular object.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn room(is_member: bool) -> Self {
        Self {
            owner_id: None,
            is_member,
        }
    }

    pub fn owned_by(owner_id: i32) -> Self {
        Self {
            owner_id: Some(owner_id),
            is_member: false,
        }
    }

    pub fn with_membership(mut self, is_member: bool) -> Self {
        self.is_member = is_member;
        self
    }
}

fn grants_for(action: Action) -> &'static [Grant] {
    RULES
        .iter()
        .find(|(a, _)| *a == action)
        .map(|(_, grants)| *grants)
        .unwrap_or(&[])
}

pub fn is_allowed<P: Principal + ?Sized>(principal: &P, action: Action, target: Target) -> bool {
    grants_for(action).iter().any(|grant| match grant {
        Permission(p) => principal.has_permission(p),
        Owner => target.owner_id == Some(principal.principal_id()),
        Member => target.is_member,
        MemberWith(p) => target.is_member && principal.has_permission(p),
    })
}

pub fn authorize<P: Principal + ?Sized>(
    principal: &P,
    action: Action,
    target: Target,
) -> Result<(), AppError> {
    if is_allowed(principal, action, target) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}
