use super::ApplicationStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ProjectId(pub i64);

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize, sqlx::Type)]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ProjectType {
    #[default]
    Ai,
    Physics,
    Engineering,
    Biology,
    Chemistry,
}

impl FromStr for ProjectType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ai" => Ok(ProjectType::Ai),
            "physics" => Ok(ProjectType::Physics),
            "engineering" => Ok(ProjectType::Engineering),
            "biology" => Ok(ProjectType::Biology),
            "chemistry" => Ok(ProjectType::Chemistry),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProjectType::Ai => "ai",
            ProjectType::Physics => "physics",
            ProjectType::Engineering => "engineering",
            ProjectType::Biology => "biology",
            ProjectType::Chemistry => "chemistry",
        })
    }
}

/// A posting as every dashboard renders it: the owning professor appears by
/// display name, the department is the snapshot taken at creation time.
/// `application_status` is only present on the applied/working views.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub professor: String,
    pub department: String,
    pub description: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: ProjectType,
    pub duration: String,
    pub difficulty: Difficulty,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[sqlx(default)]
    pub application_status: Option<ApplicationStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_posting_form() {
        assert_eq!(Difficulty::default(), Difficulty::Intermediate);
        assert_eq!(ProjectType::default(), ProjectType::Ai);
    }

    #[test]
    fn project_type_wire_format_is_lowercase() {
        assert_eq!(
            serde_json::to_value(ProjectType::Engineering).unwrap(),
            "engineering"
        );
        assert_eq!("chemistry".parse(), Ok(ProjectType::Chemistry));
        assert!("Ai".parse::<ProjectType>().is_err());
    }

    #[test]
    fn plain_listing_omits_application_status() {
        let project = Project {
            id: ProjectId(7),
            title: "Protein folding".into(),
            professor: "Dr. Chen".into(),
            department: "Biology".into(),
            description: "Fold proteins".into(),
            kind: ProjectType::Biology,
            duration: "3 months".into(),
            difficulty: Difficulty::Advanced,
            application_status: None,
        };
        let json = serde_json::to_value(&project).unwrap();
        assert!(json.get("applicationStatus").is_none());
        assert_eq!(json["type"], "biology");
        assert_eq!(json["difficulty"], "Advanced");
    }
}
