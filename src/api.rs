use crate::error::{Error, Result};
use crate::mail::Notify;
use crate::model::User;
use crate::ops::{accounts, applications, projects};
use crate::store::Store;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Clone)]
struct App {
    store: Store,
    notify: Arc<dyn Notify>,
}

pub fn router(store: Store, notify: Arc<dyn Notify>) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/user", get(profile).patch(update_profile))
        .route("/projects", get(list_projects).post(create_project))
        .route("/applications", get(applicants).post(apply).patch(decide))
        .with_state(App { store, notify })
}

/// Malformed bodies and query strings take the same envelope as any other
/// validation failure.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| Error::validation(rejection.body_text()))
}

fn params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| Error::validation(rejection.body_text()))
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    username: Option<String>,
}

async fn signup(
    State(app): State<App>,
    payload: Result<Json<accounts::Signup>, JsonRejection>,
) -> Result<Json<Value>> {
    accounts::signup(&app.store, body(payload)?).await?;
    Ok(Json(json!({ "message": "You have been signed up" })))
}

async fn signin(
    State(app): State<App>,
    payload: Result<Json<accounts::Signin>, JsonRejection>,
) -> Result<Json<Value>> {
    let user = accounts::signin(&app.store, body(payload)?).await?;
    Ok(Json(json!({ "message": "Login successful", "user": user })))
}

async fn profile(
    State(app): State<App>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<User>> {
    let user = accounts::get_user(&app.store, params(query)?.username).await?;
    Ok(Json(user))
}

async fn update_profile(
    State(app): State<App>,
    payload: Result<Json<accounts::ProfileUpdate>, JsonRejection>,
) -> Result<Json<Value>> {
    let user = accounts::update_profile(&app.store, body(payload)?).await?;
    Ok(Json(
        json!({ "message": "Profile updated successfully", "user": user }),
    ))
}

async fn list_projects(
    State(app): State<App>,
    query: Result<Query<projects::ProjectQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let query = params(query)?;
    if let Some(id) = query.project_id {
        let project = projects::single(&app.store, id).await?;
        return Ok(Json(json!(project)));
    }
    let projects = projects::list(&app.store, query).await?;
    Ok(Json(json!(projects)))
}

async fn create_project(
    State(app): State<App>,
    payload: Result<Json<projects::NewProject>, JsonRejection>,
) -> Result<Json<Value>> {
    let project = projects::create(&app.store, body(payload)?).await?;
    Ok(Json(
        json!({ "message": "Project created successfully", "project": project }),
    ))
}

async fn applicants(
    State(app): State<App>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let rows = applications::applicants(&app.store, params(query)?.username).await?;
    Ok(Json(json!(rows)))
}

async fn apply(
    State(app): State<App>,
    payload: Result<Json<applications::Apply>, JsonRejection>,
) -> Result<Json<Value>> {
    let application = applications::apply(&app.store, body(payload)?).await?;
    Ok(Json(json!({
        "message": "Application submitted successfully",
        "application": application,
    })))
}

async fn decide(
    State(app): State<App>,
    payload: Result<Json<applications::Decide>, JsonRejection>,
) -> Result<Json<Value>> {
    let application = applications::decide(&app.store, &*app.notify, body(payload)?).await?;
    Ok(Json(json!({
        "message": "Application status updated",
        "application": application,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::NoMailer;
    use crate::model::{ApplicationId, ProjectId, UserId};

    async fn app() -> App {
        App {
            store: Store::open_in_memory().await.unwrap(),
            notify: Arc::new(NoMailer),
        }
    }

    fn signup_body(username: &str, usertype: &str, fullname: &str) -> accounts::Signup {
        accounts::Signup {
            username: Some(username.into()),
            password: Some("hunter2".into()),
            usertype: Some(usertype.into()),
            fullname: Some(fullname.into()),
        }
    }

    /// The whole surface, driven through the handlers: a professor posts a
    /// project, a student applies, the professor accepts, and every
    /// response envelope comes out the way the dashboards consume it.
    #[tokio::test]
    async fn dashboard_walkthrough_over_the_handlers() {
        let app = app().await;

        let signed = signup(
            State(app.clone()),
            Ok(Json(signup_body("chen", "professor", "Dr. Chen"))),
        )
        .await
        .unwrap();
        assert_eq!(signed.0["message"], "You have been signed up");

        update_profile(
            State(app.clone()),
            Ok(Json(accounts::ProfileUpdate {
                username: Some("chen".into()),
                fullname: Some("Dr. Chen".into()),
                university: Some("MIT".into()),
                department: Some("Biology".into()),
                batch: None,
            })),
        )
        .await
        .unwrap();

        let created = create_project(
            State(app.clone()),
            Ok(Json(projects::NewProject {
                title: Some("Protein folding".into()),
                description: Some("Fold proteins".into()),
                duration: Some("3 months".into()),
                difficulty: None,
                kind: None,
                username: Some("chen".into()),
            })),
        )
        .await
        .unwrap();
        assert_eq!(created.0["message"], "Project created successfully");
        let project_id = created.0["project"]["id"].as_i64().unwrap();

        signup(
            State(app.clone()),
            Ok(Json(signup_body("alice", "student", "Alice"))),
        )
        .await
        .unwrap();
        let login = signin(
            State(app.clone()),
            Ok(Json(accounts::Signin {
                username: Some("alice".into()),
                password: Some("hunter2".into()),
            })),
        )
        .await
        .unwrap();
        assert_eq!(login.0["message"], "Login successful");
        assert!(login.0["user"].get("password").is_none());
        let alice = login.0["user"]["id"].as_i64().unwrap();

        let fetched = profile(
            State(app.clone()),
            Ok(Query(UserQuery {
                username: Some("alice".into()),
            })),
        )
        .await
        .unwrap();
        assert_eq!(fetched.0.username, "alice");

        let applied = apply(
            State(app.clone()),
            Ok(Json(applications::Apply {
                project_id: Some(ProjectId(project_id)),
                username: Some("alice".into()),
                previous_experience: Some("none".into()),
                why_join: Some("curious".into()),
            })),
        )
        .await
        .unwrap();
        assert_eq!(applied.0["message"], "Application submitted successfully");
        assert_eq!(applied.0["application"]["status"], "pending");
        let application_id = applied.0["application"]["id"].as_i64().unwrap();

        let available = list_projects(
            State(app.clone()),
            Ok(Query(projects::ProjectQuery {
                student_id: Some(UserId(alice)),
                view: Some(projects::View::Available),
                ..projects::ProjectQuery::default()
            })),
        )
        .await
        .unwrap();
        assert_eq!(available.0.as_array().unwrap().len(), 0);

        let decided = decide(
            State(app.clone()),
            Ok(Json(applications::Decide {
                application_id: Some(ApplicationId(application_id)),
                status: Some("accepted".into()),
            })),
        )
        .await
        .unwrap();
        assert_eq!(decided.0["message"], "Application status updated");

        let working = list_projects(
            State(app.clone()),
            Ok(Query(projects::ProjectQuery {
                student_id: Some(UserId(alice)),
                view: Some(projects::View::Working),
                ..projects::ProjectQuery::default()
            })),
        )
        .await
        .unwrap();
        let rows = working.0;
        assert_eq!(rows.as_array().unwrap().len(), 1);
        assert_eq!(rows[0]["applicationStatus"], "accepted");

        let single = list_projects(
            State(app.clone()),
            Ok(Query(projects::ProjectQuery {
                project_id: Some(ProjectId(project_id)),
                ..projects::ProjectQuery::default()
            })),
        )
        .await
        .unwrap();
        assert_eq!(single.0["professor"], "Dr. Chen");
        assert_eq!(single.0["department"], "Biology");

        let applicants = applicants(
            State(app),
            Ok(Query(UserQuery {
                username: Some("chen".into()),
            })),
        )
        .await
        .unwrap();
        assert_eq!(applicants.0.as_array().unwrap().len(), 1);
        assert_eq!(applicants.0[0]["name"], "Alice");
        assert_eq!(applicants.0[0]["projectTitle"], "Protein folding");
    }
}
