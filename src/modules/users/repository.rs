use async_trait::async_trait;
use sales_db::{DbError, PgPool, execute, query_many, query_one};
use uuid::Uuid;

use super::model::User;

/// Persistence for users. Implementations report a missing row as
/// [`DbError::NotFound`] and a taken email as [`DbError::Duplicate`].
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<(), DbError>;
    async fn update(&self, user: &User) -> Result<(), DbError>;
    async fn delete(&self, id: Uuid) -> Result<(), DbError>;
    async fn query(&self, offset: i64, limit: i64) -> Result<Vec<User>, DbError>;
    async fn query_by_id(&self, id: Uuid) -> Result<User, DbError>;
    async fn query_by_email(&self, email: &str) -> Result<User, DbError>;
}

pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &User) -> Result<(), DbError> {
        let q = sqlx::query(
            r#"
            INSERT INTO users
                (user_id, name, email, password_hash, roles, date_created, date_updated)
            VALUES
                ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.roles)
        .bind(user.date_created)
        .bind(user.date_updated);

        execute(&self.db, q).await.map(|_| ())
    }

    async fn update(&self, user: &User) -> Result<(), DbError> {
        let q = sqlx::query(
            r#"
            UPDATE users SET
                name = $2,
                email = $3,
                roles = $4,
                password_hash = $5,
                date_updated = $6
            WHERE user_id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.roles)
        .bind(&user.password_hash)
        .bind(user.date_updated);

        match execute(&self.db, q).await? {
            0 => Err(DbError::NotFound),
            _ => Ok(()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let q = sqlx::query("DELETE FROM users WHERE user_id = $1").bind(id);
        execute(&self.db, q).await.map(|_| ())
    }

    async fn query(&self, offset: i64, limit: i64) -> Result<Vec<User>, DbError> {
        let q = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            ORDER BY user_id
            OFFSET $1 ROWS FETCH NEXT $2 ROWS ONLY
            "#,
        )
        .bind(offset)
        .bind(limit);

        query_many(&self.db, q).await
    }

    async fn query_by_id(&self, id: Uuid) -> Result<User, DbError> {
        let q = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1").bind(id);
        query_one(&self.db, q).await
    }

    async fn query_by_email(&self, email: &str) -> Result<User, DbError> {
        let q = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email.to_owned());
        query_one(&self.db, q).await
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryUserRepository;

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use parking_lot::RwLock;
    use sales_db::DbError;
    use uuid::Uuid;

    use super::UserRepository;
    use crate::modules::users::model::User;

    /// In-process repository with the same not-found and uniqueness rules
    /// as the PostgreSQL one.
    #[derive(Default)]
    pub struct MemoryUserRepository {
        users: RwLock<HashMap<Uuid, User>>,
    }

    impl MemoryUserRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn len(&self) -> usize {
            self.users.read().len()
        }

        pub fn is_empty(&self) -> bool {
            self.users.read().is_empty()
        }

        fn email_taken(users: &HashMap<Uuid, User>, email: &str, except: Uuid) -> bool {
            users.values().any(|u| u.email == email && u.id != except)
        }
    }

    #[async_trait]
    impl UserRepository for MemoryUserRepository {
        async fn create(&self, user: &User) -> Result<(), DbError> {
            let mut users = self.users.write();
            if users.contains_key(&user.id) {
                return Err(DbError::Duplicate("users_pkey".into()));
            }
            if Self::email_taken(&users, &user.email, user.id) {
                return Err(DbError::Duplicate("users_email_key".into()));
            }
            users.insert(user.id, user.clone());
            Ok(())
        }

        async fn update(&self, user: &User) -> Result<(), DbError> {
            let mut users = self.users.write();
            if !users.contains_key(&user.id) {
                return Err(DbError::NotFound);
            }
            if Self::email_taken(&users, &user.email, user.id) {
                return Err(DbError::Duplicate("users_email_key".into()));
            }
            users.insert(user.id, user.clone());
            Ok(())
        }

        async fn delete(&self, id: Uuid) -> Result<(), DbError> {
            self.users.write().remove(&id);
            Ok(())
        }

        async fn query(&self, offset: i64, limit: i64) -> Result<Vec<User>, DbError> {
            let mut users: Vec<User> = self.users.read().values().cloned().collect();
            users.sort_by_key(|u| u.id);
            Ok(users
                .into_iter()
                .skip(offset.max(0) as usize)
                .take(limit.max(0) as usize)
                .collect())
        }

        async fn query_by_id(&self, id: Uuid) -> Result<User, DbError> {
            self.users.read().get(&id).cloned().ok_or(DbError::NotFound)
        }

        async fn query_by_email(&self, email: &str) -> Result<User, DbError> {
            self.users
                .read()
                .values()
                .find(|u| u.email == email)
                .cloned()
                .ok_or(DbError::NotFound)
        }
    }
}
