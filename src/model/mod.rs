pub use self::application::{ApplicantRow, Application, ApplicationId, ApplicationStatus};
pub use self::project::{Difficulty, Project, ProjectId, ProjectType};
pub use self::user::{User, UserId, UserSummary, UserType};

mod application;
mod project;
mod user;
