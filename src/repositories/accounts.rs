use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Account;

const COLUMNS: &str = "email, name, hashed_password, created_at";

pub(crate) async fn find_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!("SELECT {COLUMNS} FROM accounts WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateAccount<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub hashed_password: String,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateAccount<'_>,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "INSERT INTO accounts (email, name, hashed_password, created_at)
         VALUES ($1, $2, $3, $4)
         RETURNING {COLUMNS}",
    ))
    .bind(params.email)
    .bind(params.name)
    .bind(params.hashed_password)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}
