use crate::model::{
    ApplicantRow, Application, ApplicationId, ApplicationStatus, Difficulty, Project, ProjectId,
    ProjectType, User, UserId, UserType,
};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, SqlitePool};
use std::str::FromStr;

/// The relational schema. The UNIQUE index on (student_id, project_id) is
/// what makes a duplicate apply an atomic check-and-insert failure instead
/// of a read-then-write race.
const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    usertype TEXT NOT NULL,
    fullname TEXT NOT NULL,
    university TEXT,
    batch INTEGER,
    department TEXT
);

CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    duration TEXT NOT NULL,
    difficulty TEXT NOT NULL DEFAULT 'Intermediate',
    type TEXT NOT NULL DEFAULT 'ai',
    department TEXT NOT NULL,
    professor_id INTEGER NOT NULL REFERENCES users (id),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS applications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id INTEGER NOT NULL REFERENCES users (id),
    project_id INTEGER NOT NULL REFERENCES projects (id),
    status TEXT NOT NULL DEFAULT 'pending',
    previous_experience TEXT NOT NULL,
    why_join TEXT NOT NULL,
    applied_at TEXT NOT NULL,
    UNIQUE (student_id, project_id)
);
";

const USER_COLUMNS: &str =
    "id, username, password, usertype, fullname, university, batch, department";

const APPLICATION_COLUMNS: &str =
    "id, student_id, project_id, status, previous_experience, why_join, applied_at";

/// Everything a decision notification needs to know about one application.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DecisionContext {
    pub email: String,
    pub student_name: String,
    pub project_title: String,
    pub professor_name: String,
}

pub struct ProjectDraft<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub duration: &'a str,
    pub difficulty: Difficulty,
    pub kind: ProjectType,
    pub department: &'a str,
    pub professor: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn open(url: &str) -> sqlx::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        Self::with_options(options, 5).await
    }

    /// A private in-memory database for tests. One connection, since every
    /// `:memory:` connection is its own database.
    #[cfg(test)]
    pub(crate) async fn open_in_memory() -> sqlx::Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        Self::with_options(options, 1).await
    }

    async fn with_options(options: SqliteConnectOptions, connections: u32) -> sqlx::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(connections)
            .connect_with(options)
            .await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn user_by_username(&self, username: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn insert_user(
        &self,
        username: &str,
        password: &str,
        usertype: UserType,
        fullname: &str,
    ) -> sqlx::Result<User> {
        sqlx::query_as(&format!(
            "INSERT INTO users (username, password, usertype, fullname) \
             VALUES (?, ?, ?, ?) RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(password)
        .bind(usertype)
        .bind(fullname)
        .fetch_one(&self.pool)
        .await
    }

    /// Overwrite the profile fields of one account. A `None` batch leaves
    /// the stored value untouched. Returns `None` for an unknown username.
    pub async fn update_profile(
        &self,
        username: &str,
        fullname: &str,
        university: &str,
        department: &str,
        batch: Option<i64>,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as(&format!(
            "UPDATE users SET fullname = ?, university = ?, department = ?, \
             batch = COALESCE(?, batch) WHERE username = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(fullname)
        .bind(university)
        .bind(department)
        .bind(batch)
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn insert_project(&self, draft: &ProjectDraft<'_>) -> sqlx::Result<ProjectId> {
        sqlx::query_scalar(
            "INSERT INTO projects \
             (title, description, duration, difficulty, type, department, professor_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(draft.title)
        .bind(draft.description)
        .bind(draft.duration)
        .bind(draft.difficulty)
        .bind(draft.kind)
        .bind(draft.department)
        .bind(draft.professor)
        .bind(draft.created_at)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn project(&self, id: ProjectId) -> sqlx::Result<Option<Project>> {
        sqlx::query_as(
            "SELECT p.id, p.title, u.fullname AS professor, p.department, p.description, \
             p.type, p.duration, p.difficulty \
             FROM projects p JOIN users u ON u.id = p.professor_id WHERE p.id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn project_exists(&self, id: ProjectId) -> sqlx::Result<bool> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM projects WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
    }

    /// List projects newest-first, optionally narrowed by type or owner.
    /// With `exclude_applicant`, skip every project that student has an
    /// application for, whatever its status.
    pub async fn projects(
        &self,
        kind: Option<ProjectType>,
        professor: Option<UserId>,
        exclude_applicant: Option<UserId>,
    ) -> sqlx::Result<Vec<Project>> {
        let mut query = QueryBuilder::new(
            "SELECT p.id, p.title, u.fullname AS professor, p.department, p.description, \
             p.type, p.duration, p.difficulty \
             FROM projects p JOIN users u ON u.id = p.professor_id WHERE 1 = 1",
        );
        if let Some(kind) = kind {
            query.push(" AND p.type = ").push_bind(kind);
        }
        if let Some(professor) = professor {
            query.push(" AND p.professor_id = ").push_bind(professor);
        }
        if let Some(student) = exclude_applicant {
            query
                .push(" AND p.id NOT IN (SELECT project_id FROM applications WHERE student_id = ")
                .push_bind(student)
                .push(")");
        }
        query.push(" ORDER BY p.created_at DESC, p.id DESC");
        query.build_query_as().fetch_all(&self.pool).await
    }

    /// Projects a student has applied to, annotated with the application
    /// status, oldest application first. `only` narrows to one status.
    pub async fn applied_projects(
        &self,
        student: UserId,
        only: Option<ApplicationStatus>,
    ) -> sqlx::Result<Vec<Project>> {
        let mut query = QueryBuilder::new(
            "SELECT p.id, p.title, u.fullname AS professor, p.department, p.description, \
             p.type, p.duration, p.difficulty, a.status AS application_status \
             FROM applications a \
             JOIN projects p ON p.id = a.project_id \
             JOIN users u ON u.id = p.professor_id \
             WHERE a.student_id = ",
        );
        query.push_bind(student);
        if let Some(status) = only {
            query.push(" AND a.status = ").push_bind(status);
        }
        query.push(" ORDER BY a.id");
        query.build_query_as().fetch_all(&self.pool).await
    }

    /// Atomic check-and-insert: a second application for the same
    /// (student, project) pair fails on the unique index.
    pub async fn insert_application(
        &self,
        student: UserId,
        project: ProjectId,
        previous_experience: &str,
        why_join: &str,
        applied_at: DateTime<Utc>,
    ) -> sqlx::Result<Application> {
        sqlx::query_as(&format!(
            "INSERT INTO applications \
             (student_id, project_id, status, previous_experience, why_join, applied_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {APPLICATION_COLUMNS}"
        ))
        .bind(student)
        .bind(project)
        .bind(ApplicationStatus::Pending)
        .bind(previous_experience)
        .bind(why_join)
        .bind(applied_at)
        .fetch_one(&self.pool)
        .await
    }

    /// Unconditional status overwrite; no prior-state check by design.
    /// Returns `None` for an unknown application.
    pub async fn set_application_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> sqlx::Result<Option<Application>> {
        sqlx::query_as(&format!(
            "UPDATE applications SET status = ? WHERE id = ? RETURNING {APPLICATION_COLUMNS}"
        ))
        .bind(status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn decision_context(
        &self,
        id: ApplicationId,
    ) -> sqlx::Result<Option<DecisionContext>> {
        sqlx::query_as(
            "SELECT s.username AS email, s.fullname AS student_name, \
             p.title AS project_title, prof.fullname AS professor_name \
             FROM applications a \
             JOIN users s ON s.id = a.student_id \
             JOIN projects p ON p.id = a.project_id \
             JOIN users prof ON prof.id = p.professor_id \
             WHERE a.id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Every application on every project a professor owns, flattened to
    /// one row per application, stable by application id.
    pub async fn applicants_for(&self, professor: UserId) -> sqlx::Result<Vec<ApplicantRow>> {
        sqlx::query_as(
            "SELECT a.id, s.fullname AS name, s.username AS email, a.project_id, \
             p.title AS project_title, a.status, date(a.applied_at) AS applied_date, \
             s.university, s.batch, s.department, a.previous_experience, a.why_join \
             FROM applications a \
             JOIN projects p ON p.id = a.project_id \
             JOIN users s ON s.id = a.student_id \
             WHERE p.professor_id = ? \
             ORDER BY a.id",
        )
        .bind(professor)
        .fetch_all(&self.pool)
        .await
    }
}

pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(e) if e.is_unique_violation())
}
