use chrono::Utc;
use sea_orm::sea_query::{
    Index, IndexCreateStatement, OnConflict, PostgresQueryBuilder, SqliteQueryBuilder,
};
use sea_orm::*;
use tracing::info;

use crate::config::AuthConfig;
use crate::entity::{
    chat_message, class_routine, role, role_permission, room_member, submission, user,
};
use crate::utils::hash;

/// Default roles seeded on startup.
const DEFAULT_ROLES: &[&str] = &[role::ADMIN, role::TEACHER, role::STUDENT];

/// Default role-permission mappings seeded on startup.
const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    ("admin", "user:manage"),
    ("admin", "academic:manage"),
    ("admin", "room:moderate"),
    ("admin", "classroom:teach"),
    ("admin", "resource:moderate"),
    ("admin", "student:manage"),
    ("admin", "schedule:moderate"),
    ("teacher", "room:create"),
    ("teacher", "academic:manage"),
    ("teacher", "classroom:teach"),
    ("teacher", "resource:moderate"),
    ("teacher", "student:manage"),
    ("teacher", "teacher:profile"),
    ("student", "classroom:submit"),
    ("student", "student:profile"),
];

/// Seed the `role` and `role_permission` tables with defaults.
pub async fn seed_role_permissions(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut roles_inserted = 0u32;
    for &name in DEFAULT_ROLES {
        let model = role::ActiveModel {
            name: Set(name.to_string()),
        };

        let result = role::Entity::insert(model)
            .on_conflict(OnConflict::column(role::Column::Name).do_nothing().to_owned())
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) if n > 0 => roles_inserted += 1,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if roles_inserted > 0 {
        info!("Seeded {} new roles", roles_inserted);
    }

    let mut perms_inserted = 0u32;
    for &(role, permission) in DEFAULT_MAPPINGS {
        let model = role_permission::ActiveModel {
            role: Set(role.to_string()),
            permission: Set(permission.to_string()),
        };

        let result = role_permission::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    role_permission::Column::Role,
                    role_permission::Column::Permission,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) if n > 0 => perms_inserted += 1,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if perms_inserted > 0 {
        info!("Seeded {} new role-permission mappings", perms_inserted);
    }

    Ok(())
}

/// Create the configured bootstrap administrator if it does not exist yet.
pub async fn seed_admin(db: &DatabaseConnection, auth: &AuthConfig) -> Result<(), DbErr> {
    let (Some(email), Some(password)) = (&auth.admin_email, &auth.admin_password) else {
        return Ok(());
    };
    let email = email.trim().to_lowercase();

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let password_hash =
        hash::hash_password(password).map_err(|e| DbErr::Custom(e.to_string()))?;
    let now = Utc::now();
    user::ActiveModel {
        email: Set(email.clone()),
        password: Set(password_hash),
        role: Set(role::ADMIN.to_string()),
        full_name: Set("Administrator".to_string()),
        bio: Set(String::new()),
        avatar_url: Set(String::new()),
        details_filled: Set(false),
        is_active: Set(true),
        is_approved: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(email = %email, "Created bootstrap administrator");
    Ok(())
}

/// Permissions granted to `role`, as seeded into `role_permission`.
pub async fn permissions_for_role(
    db: &impl ConnectionTrait,
    role: &str,
) -> Result<Vec<String>, DbErr> {
    let rows = role_permission::Entity::find()
        .filter(role_permission::Column::Role.eq(role))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|r| r.permission).collect())
}

fn build_index(db: &DatabaseConnection, stmt: &IndexCreateStatement) -> String {
    match db.get_database_backend() {
        DbBackend::Sqlite => stmt.to_string(SqliteQueryBuilder),
        _ => stmt.to_string(PostgresQueryBuilder),
    }
}

/// Ensure required database indexes exist.
///
/// Schema sync only knows single-column uniqueness, so compound indexes
/// are created here. The submission index backs the resubmission upsert
/// and the routine index keeps a section from holding two classes in one
/// period, so failing to create either aborts start-up.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let stmt = Index::create()
        .if_not_exists()
        .unique()
        .name("uq_submission_assignment_student")
        .table(submission::Entity)
        .col(submission::Column::AssignmentId)
        .col(submission::Column::StudentId)
        .to_owned();
    db.execute_unprepared(&build_index(db, &stmt)).await?;
    info!("Ensured index uq_submission_assignment_student exists");

    let stmt = Index::create()
        .if_not_exists()
        .unique()
        .name("uq_class_routine_slot")
        .table(class_routine::Entity)
        .col(class_routine::Column::Day)
        .col(class_routine::Column::Period)
        .col(class_routine::Column::DepartmentId)
        .col(class_routine::Column::SectionId)
        .to_owned();
    db.execute_unprepared(&build_index(db, &stmt)).await?;
    info!("Ensured index uq_class_routine_slot exists");

    // History reads: WHERE room_id = ? ORDER BY created_at DESC LIMIT ?
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_chat_message_room_created")
        .table(chat_message::Entity)
        .col(chat_message::Column::RoomId)
        .col(chat_message::Column::CreatedAt)
        .to_owned();
    match db.execute_unprepared(&build_index(db, &stmt)).await {
        Ok(_) => info!("Ensured index idx_chat_message_room_created exists"),
        Err(e) => tracing::warn!("Failed to create index idx_chat_message_room_created: {}", e),
    }

    let stmt = Index::create()
        .if_not_exists()
        .name("idx_room_member_user")
        .table(room_member::Entity)
        .col(room_member::Column::UserId)
        .to_owned();
    match db.execute_unprepared(&build_index(db, &stmt)).await {
        Ok(_) => info!("Ensured index idx_room_member_user exists"),
        Err(e) => tracing::warn!("Failed to create index idx_room_member_user: {}", e),
    }

    Ok(())
}
