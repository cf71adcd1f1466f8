use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct UserId(pub i64);

/// Role discriminator. Immutable once the account exists.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UserType {
    Student,
    Professor,
}

impl FromStr for UserType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(UserType::Student),
            "professor" => Ok(UserType::Professor),
            _ => Err(()),
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UserType::Student => "student",
            UserType::Professor => "professor",
        })
    }
}

/// A stored account. `password` holds the argon2 PHC string, never the
/// plaintext, and is excluded from every serialized form.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub usertype: UserType,
    pub fullname: String,
    pub university: Option<String>,
    pub batch: Option<i64>,
    pub department: Option<String>,
}

/// What signin hands back to the client.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub usertype: UserType,
    pub university: Option<String>,
    pub batch: Option<i64>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            usertype: user.usertype,
            university: user.university,
            batch: user.batch,
        }
    }
}
