use crate::error::{Error, Result};
use crate::mail::{Decision, Notify};
use crate::model::{
    ApplicantRow, Application, ApplicationId, ApplicationStatus, ProjectId, UserType,
};
use crate::ops::present;
use crate::store::{Store, is_unique_violation};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Apply {
    pub project_id: Option<ProjectId>,
    pub username: Option<String>,
    pub previous_experience: Option<String>,
    pub why_join: Option<String>,
}

pub async fn apply(store: &Store, request: Apply) -> Result<Application> {
    let (Some(project), Some(username), Some(previous_experience), Some(why_join)) = (
        request.project_id,
        present(&request.username),
        present(&request.previous_experience),
        present(&request.why_join),
    ) else {
        return Err(Error::validation("Missing required fields"));
    };
    let student = match store.user_by_username(username).await? {
        Some(user) if user.usertype == UserType::Student => user,
        _ => return Err(Error::authorization("Only students can apply to projects")),
    };
    if !store.project_exists(project).await? {
        return Err(Error::not_found("Project not found"));
    }
    match store
        .insert_application(student.id, project, previous_experience, why_join, Utc::now())
        .await
    {
        Ok(application) => {
            info!(student = %student.username, project = project.0, "application submitted");
            Ok(application)
        }
        Err(e) if is_unique_violation(&e) => {
            Err(Error::conflict("Already applied to this project"))
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decide {
    pub application_id: Option<ApplicationId>,
    pub status: Option<String>,
}

/// Overwrite an application's status. Re-asserting `pending` is legal and
/// notifies nobody; accepted and rejected trigger the decision
/// notification, whose failure never surfaces here.
pub async fn decide(store: &Store, notify: &dyn Notify, request: Decide) -> Result<Application> {
    let (Some(id), Some(status)) = (request.application_id, present(&request.status)) else {
        return Err(Error::validation("Missing required fields"));
    };
    let status = status
        .parse::<ApplicationStatus>()
        .map_err(|()| Error::validation("Invalid status"))?;
    let application = store
        .set_application_status(id, status)
        .await?
        .ok_or_else(|| Error::not_found("Application not found"))?;
    info!(application = id.0, status = %status, "application decided");
    if status != ApplicationStatus::Pending {
        notify_student(store, notify, &application).await;
    }
    Ok(application)
}

async fn notify_student(store: &Store, notify: &dyn Notify, application: &Application) {
    let context = match store.decision_context(application.id).await {
        Ok(Some(context)) => context,
        Ok(None) => return,
        Err(error) => {
            warn!(
                %error,
                application = application.id.0,
                "cannot load decision notification context",
            );
            return;
        }
    };
    let decision = Decision {
        to: context.email,
        student_name: context.student_name,
        project_title: context.project_title,
        status: application.status,
        professor_name: context.professor_name,
    };
    if let Err(error) = notify.send_decision(&decision).await {
        warn!(%error, to = %decision.to, "decision notification failed");
    }
}

pub async fn applicants(store: &Store, username: Option<String>) -> Result<Vec<ApplicantRow>> {
    let Some(username) = present(&username) else {
        return Err(Error::validation("Username is required"));
    };
    let Some(user) = store.user_by_username(username).await? else {
        return Err(Error::not_found("User not found"));
    };
    Ok(store.applicants_for(user.id).await?)
}
