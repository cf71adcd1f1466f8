use crate::error::{Error, Result};
use crate::model::{
    ApplicationStatus, Difficulty, Project, ProjectId, ProjectType, UserId, UserType,
};
use crate::ops::present;
use crate::store::{ProjectDraft, Store};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct NewProject {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub difficulty: Option<Difficulty>,
    #[serde(rename = "type")]
    pub kind: Option<ProjectType>,
    pub username: Option<String>,
}

pub async fn create(store: &Store, request: NewProject) -> Result<Project> {
    let (Some(title), Some(description), Some(duration), Some(username)) = (
        present(&request.title),
        present(&request.description),
        present(&request.duration),
        present(&request.username),
    ) else {
        return Err(Error::validation("Missing required fields"));
    };
    let professor = match store.user_by_username(username).await? {
        Some(user) if user.usertype == UserType::Professor => user,
        _ => return Err(Error::authorization("Only professors can create projects")),
    };
    // The department is snapshotted onto the project at creation time.
    let Some(department) = professor
        .department
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
    else {
        return Err(Error::validation(
            "Please update your profile with department information before creating projects",
        ));
    };
    let id = store
        .insert_project(&ProjectDraft {
            title,
            description,
            duration,
            difficulty: request.difficulty.unwrap_or_default(),
            kind: request.kind.unwrap_or_default(),
            department,
            professor: professor.id,
            created_at: Utc::now(),
        })
        .await?;
    let project = store
        .project(id)
        .await?
        .ok_or_else(|| Error::Internal(eyre::eyre!("project {} vanished after insert", id.0)))?;
    info!(project = %project.title, professor = %professor.username, "project created");
    Ok(project)
}

/// Dashboard views a student can request over the project list.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Applied,
    Working,
    Available,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectQuery {
    pub project_id: Option<ProjectId>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub professor_id: Option<UserId>,
    pub student_id: Option<UserId>,
    pub view: Option<View>,
}

pub async fn single(store: &Store, id: ProjectId) -> Result<Project> {
    store
        .project(id)
        .await?
        .ok_or_else(|| Error::not_found("Project not found"))
}

/// Derive the requested project list. `applied` and `working` are keyed on
/// the student's applications alone; `available` is everything the student
/// has no application for, further narrowed by the plain filters.
pub async fn list(store: &Store, query: ProjectQuery) -> Result<Vec<Project>> {
    let kind = match query.kind.as_deref() {
        None | Some("all") => None,
        Some(t) => Some(
            t.parse::<ProjectType>()
                .map_err(|()| Error::validation("Invalid project type"))?,
        ),
    };
    let projects = match (query.student_id, query.view) {
        (Some(student), Some(View::Applied)) => store.applied_projects(student, None).await?,
        (Some(student), Some(View::Working)) => {
            store
                .applied_projects(student, Some(ApplicationStatus::Accepted))
                .await?
        }
        (Some(student), Some(View::Available)) => {
            store
                .projects(kind, query.professor_id, Some(student))
                .await?
        }
        _ => store.projects(kind, query.professor_id, None).await?,
    };
    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserType;

    fn new_project(title: &str, username: &str) -> NewProject {
        NewProject {
            title: Some(title.into()),
            description: Some("A research project".into()),
            duration: Some("3 months".into()),
            difficulty: None,
            kind: None,
            username: Some(username.into()),
        }
    }

    async fn professor_with_department(store: &Store, username: &str) {
        store
            .insert_user(username, "hash", UserType::Professor, "Dr. Chen")
            .await
            .unwrap();
        store
            .update_profile(username, "Dr. Chen", "MIT", "Biology", None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn creation_is_professor_only() {
        let store = Store::open_in_memory().await.unwrap();
        store
            .insert_user("alice", "hash", UserType::Student, "Alice")
            .await
            .unwrap();
        assert!(matches!(
            create(&store, new_project("Folding", "alice")).await,
            Err(Error::Authorization(_))
        ));
        assert!(matches!(
            create(&store, new_project("Folding", "ghost")).await,
            Err(Error::Authorization(_))
        ));
    }

    #[tokio::test]
    async fn creation_requires_a_department_on_file() {
        let store = Store::open_in_memory().await.unwrap();
        store
            .insert_user("chen", "hash", UserType::Professor, "Dr. Chen")
            .await
            .unwrap();
        assert!(matches!(
            create(&store, new_project("Folding", "chen")).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn creation_snapshots_department_and_applies_defaults() {
        let store = Store::open_in_memory().await.unwrap();
        professor_with_department(&store, "chen").await;
        let project = create(&store, new_project("Folding", "chen")).await.unwrap();
        assert_eq!(project.department, "Biology");
        assert_eq!(project.professor, "Dr. Chen");
        assert_eq!(project.difficulty, Difficulty::Intermediate);
        assert_eq!(project.kind, ProjectType::Ai);

        // A later profile edit must not rewrite the snapshot.
        store
            .update_profile("chen", "Dr. Chen", "MIT", "Chemistry", None)
            .await
            .unwrap();
        let kept = single(&store, project.id).await.unwrap();
        assert_eq!(kept.department, "Biology");
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_filterable() {
        let store = Store::open_in_memory().await.unwrap();
        professor_with_department(&store, "chen").await;
        let first = create(&store, new_project("First", "chen")).await.unwrap();
        let second = create(
            &store,
            NewProject {
                kind: Some(ProjectType::Physics),
                ..new_project("Second", "chen")
            },
        )
        .await
        .unwrap();

        let all = list(&store, ProjectQuery::default()).await.unwrap();
        assert_eq!(
            all.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );

        let physics = list(
            &store,
            ProjectQuery {
                kind: Some("physics".into()),
                ..ProjectQuery::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(physics.len(), 1);
        assert_eq!(physics[0].id, second.id);

        // "all" is a pass-through filter, not a type.
        let everything = list(
            &store,
            ProjectQuery {
                kind: Some("all".into()),
                ..ProjectQuery::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(everything.len(), 2);

        assert!(matches!(
            list(
                &store,
                ProjectQuery {
                    kind: Some("alchemy".into()),
                    ..ProjectQuery::default()
                },
            )
            .await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn missing_project_is_not_found() {
        let store = Store::open_in_memory().await.unwrap();
        assert!(matches!(
            single(&store, ProjectId(42)).await,
            Err(Error::NotFound(_))
        ));
    }
}
