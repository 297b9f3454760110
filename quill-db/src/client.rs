use quill_common::model::{Id, comment::CommentMarker, post::PostMarker, user::UserMarker};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, query_scalar};
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Email {0} is already in use")]
    DuplicateEmail(String),
    #[error("Referenced {0} does not exist")]
    MissingReference(Reference),
    #[error("The {0} is still referenced by other rows")]
    HasDependents(Reference),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// How references between users, posts and comments are treated.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferencePolicy {
    /// References are stored as given and deletes leave dependent rows behind.
    #[default]
    Unchecked,
    /// Inserts must reference existing rows and deletes are refused while
    /// other rows still point at the target.
    Enforced,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Reference {
    User(Id<UserMarker>),
    Post(Id<PostMarker>),
    Comment(Id<CommentMarker>),
}

impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Reference::User(id) => write!(f, "user {id}"),
            Reference::Post(id) => write!(f, "post {id}"),
            Reference::Comment(id) => write!(f, "comment {id}"),
        }
    }
}

#[derive(Debug)]
pub struct DbClient {
    pool: PgPool,
    reference_policy: ReferencePolicy,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool, reference_policy: ReferencePolicy) -> Self {
        Self {
            pool,
            reference_policy,
        }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[must_use]
    pub fn reference_policy(&self) -> ReferencePolicy {
        self.reference_policy
    }

    pub(crate) fn enforces_references(&self) -> bool {
        self.reference_policy == ReferencePolicy::Enforced
    }

    /// Fails with [`DbError::MissingReference`] if the policy is enforced and
    /// the target row does not exist.
    pub(crate) async fn require(&self, reference: Reference) -> Result<()> {
        if !self.enforces_references() {
            return Ok(());
        }

        let (sql, id) = match reference {
            Reference::User(id) => (
                "SELECT EXISTS (SELECT 1 FROM users WHERE users.id = $1)",
                id.get(),
            ),
            Reference::Post(id) => (
                "SELECT EXISTS (SELECT 1 FROM posts WHERE posts.id = $1)",
                id.get(),
            ),
            Reference::Comment(id) => (
                "SELECT EXISTS (SELECT 1 FROM comments WHERE comments.id = $1)",
                id.get(),
            ),
        };

        let exists = query_scalar::<Postgres, bool>(sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if exists {
            Ok(())
        } else {
            Err(DbError::MissingReference(reference))
        }
    }

    /// Fails with [`DbError::HasDependents`] if the policy is enforced and
    /// deleting the target would orphan other rows.
    pub(crate) async fn guard_delete(&self, reference: Reference) -> Result<()> {
        if !self.enforces_references() {
            return Ok(());
        }

        let (sql, id) = match reference {
            Reference::User(id) => (
                "
                SELECT
                    EXISTS (SELECT 1 FROM posts WHERE posts.user_id = $1)
                    OR EXISTS (SELECT 1 FROM comments WHERE comments.user_id = $1)
                ",
                id.get(),
            ),
            Reference::Post(id) => (
                "SELECT EXISTS (SELECT 1 FROM comments WHERE comments.post_id = $1)",
                id.get(),
            ),
            Reference::Comment(id) => (
                "SELECT EXISTS (SELECT 1 FROM comments WHERE comments.reply_to = $1)",
                id.get(),
            ),
        };

        let has_dependents = query_scalar::<Postgres, bool>(sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if has_dependents {
            Err(DbError::HasDependents(reference))
        } else {
            Ok(())
        }
    }
}
