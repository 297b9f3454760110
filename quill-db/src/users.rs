use crate::{
    client::{DbClient, DbError, Reference, Result},
    record::UserRecord,
};
use quill_common::model::{
    Id,
    user::{User, UserDetails, UserMarker},
};
use sqlx::{query, query_as, query_scalar};

const EMAIL_CONSTRAINT: &str = "users_email_unique";

fn map_email_conflict(err: sqlx::Error, email: &str) -> DbError {
    let is_email_conflict = err.as_database_error().is_some_and(|db_err| {
        db_err.is_unique_violation() && db_err.constraint() == Some(EMAIL_CONSTRAINT)
    });

    if is_email_conflict {
        DbError::DuplicateEmail(email.to_owned())
    } else {
        DbError::Sqlx(err)
    }
}

impl DbClient {
    pub async fn create_user(&self, user: &UserDetails) -> Result<Id<UserMarker>> {
        let id: i64 = query_scalar(
            "
            INSERT INTO users (name, email)
            VALUES ($1, $2)
            RETURNING users.id
            ",
        )
        .bind(&user.name)
        .bind(&user.email)
        .fetch_one(self.pool())
        .await
        .map_err(|err| map_email_conflict(err, &user.email))?;

        Ok(id.into())
    }

    pub async fn fetch_users(&self) -> Result<Vec<User>> {
        let records: Vec<UserRecord> = query_as(
            "
            SELECT
                users.id,
                users.name,
                users.email
            FROM
                users
            ORDER BY
                users.id
            ",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(records.into_iter().map(User::from).collect())
    }

    pub async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record: Option<UserRecord> = query_as(
            "
            SELECT
                users.id,
                users.name,
                users.email
            FROM
                users
            WHERE
                users.id = $1
            ",
        )
        .bind(user_id.get())
        .fetch_optional(self.pool())
        .await?;

        Ok(record.map(User::from))
    }

    /// Replaces name and email. Returns `false` if no user has this id.
    pub async fn update_user(
        &self,
        user_id: Id<UserMarker>,
        user: &UserDetails,
    ) -> Result<bool> {
        let result = query(
            "
            UPDATE users
            SET name = $1, email = $2
            WHERE users.id = $3
            ",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(user_id.get())
        .execute(self.pool())
        .await
        .map_err(|err| map_email_conflict(err, &user.email))?;

        Ok(result.rows_affected() > 0)
    }

    /// Deleting an id that does not exist is not an error. Posts and comments
    /// by the user are left in place unless the reference policy is enforced,
    /// in which case the delete is refused while they exist.
    pub async fn delete_user(&self, user_id: Id<UserMarker>) -> Result<()> {
        self.guard_delete(Reference::User(user_id)).await?;

        query("DELETE FROM users WHERE users.id = $1")
            .bind(user_id.get())
            .execute(self.pool())
            .await?;

        Ok(())
    }
}
