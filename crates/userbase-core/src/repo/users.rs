//! User repository.

use std::sync::Arc;

use async_stream::try_stream;
use chrono::{DateTime, Timelike, Utc};
use futures_core::Stream;
use tracing::{debug, instrument};

use crate::Result;
use crate::cursor::{self, PageToken};
use crate::datasource::{Datasource, TableMapper};
use crate::error::{NotFoundError, QueryError};
use crate::mapping::{self, USER_COLUMNS, USERS_TABLE};
use crate::model::{NewUser, User, UserPatch};
use crate::query::{Filter, PredicateBuilder, statement};
use crate::traits::{QueryOptions, StoreClient};
use crate::types::UserId;

use super::Page;

const ENTITY: &str = "User";

/// CRUD, listing and counting for users.
///
/// The repository holds no state beyond the shared client handle; clones
/// of it are cheap and may be used concurrently.
#[derive(Debug)]
pub struct UserRepository<C: StoreClient> {
    client: Arc<C>,
    users: TableMapper<C>,
    predicates: PredicateBuilder,
}

impl<C: StoreClient> Clone for UserRepository<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            users: self.users.clone(),
            predicates: self.predicates,
        }
    }
}

impl<C: StoreClient> UserRepository<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            users: TableMapper::new(Arc::clone(&client), USERS_TABLE),
            client,
            predicates: PredicateBuilder::new(USER_COLUMNS),
        }
    }

    pub fn from_datasource(datasource: &Datasource<C>) -> Self {
        Self {
            client: datasource.client(),
            users: datasource.table(USERS_TABLE),
            predicates: PredicateBuilder::new(USER_COLUMNS),
        }
    }

    /// Create the users table if it does not exist.
    #[instrument(skip(self), fields(keyspace = self.client.keyspace()))]
    pub async fn init_schema(&self) -> Result<()> {
        self.client.ensure_table(&mapping::users_schema()).await
    }

    /// Persist a new user with a freshly generated id.
    ///
    /// `createdAt` defaults to now and is truncated to millisecond precision,
    /// the precision the store keeps.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error if `name` or `email` is blank.
    #[instrument(skip(self, new_user))]
    pub async fn create(&self, new_user: NewUser) -> Result<User> {
        new_user.validate()?;

        let user = User {
            id: UserId::generate(),
            name: new_user.name,
            email: new_user.email,
            age: new_user.age,
            created_at: truncate_to_millis(new_user.created_at.unwrap_or_else(Utc::now)),
        };

        self.users.insert(&mapping::to_row(&user)).await?;
        debug!(id = %user.id, "Created user");
        Ok(user)
    }

    /// Fetch a user by id.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if no row has this id.
    #[instrument(skip(self), fields(%id))]
    pub async fn find_by_id(&self, id: &UserId) -> Result<User> {
        let row = self
            .users
            .get(&mapping::id_value(id))
            .await?
            .ok_or_else(|| NotFoundError::new(ENTITY, id.to_string()))?;
        mapping::to_entity(&row)
    }

    #[instrument(skip(self), fields(%id))]
    pub async fn exists_by_id(&self, id: &UserId) -> Result<bool> {
        Ok(self.users.get(&mapping::id_value(id)).await?.is_some())
    }

    /// List one page of users matching `filter`.
    ///
    /// `limit` bounds the rows in this page. Pass the returned
    /// `next_page_state` back, with the same filter, to continue.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error for an untranslatable filter or a
    /// malformed token, before any store round trip.
    #[instrument(skip(self, filter, token), fields(resumed = token.is_some()))]
    pub async fn list(&self, filter: Option<&Filter>, token: Option<&PageToken>) -> Result<Page> {
        let predicate = self.predicates.build(filter)?;
        let paging_state = cursor::decode(token)?;
        let fetch_size = match filter {
            Some(filter) => filter.page_size()?,
            None => None,
        };

        let query = statement::select_all(USERS_TABLE, &predicate);
        let options = QueryOptions {
            fetch_size,
            paging_state,
            prepare: true,
        };

        debug!(%query, params = predicate.params().len(), "Listing users");
        let result = self
            .client
            .execute(&query, predicate.params(), &options)
            .await?;

        let users = result
            .rows
            .iter()
            .map(mapping::to_entity)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page {
            users,
            next_page_state: cursor::encode(result.paging_state.as_ref()),
        })
    }

    /// Stream every user matching `filter`, following page tokens until
    /// the final page. `limit` sets the page size of each round trip.
    pub fn stream(&self, filter: Option<Filter>) -> impl Stream<Item = Result<User>> + Send + '_ {
        try_stream! {
            let mut token: Option<PageToken> = None;
            loop {
                let page = self.list(filter.as_ref(), token.as_ref()).await?;
                for user in page.users {
                    yield user;
                }
                match page.next_page_state {
                    Some(next) => token = Some(next),
                    None => break,
                }
            }
        }
    }

    /// Apply a partial update.
    ///
    /// Read-modify-write: fields absent from the patch keep their stored
    /// values. Concurrent updates to the same id are last-write-wins.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if no row has this id.
    #[instrument(skip(self, patch), fields(%id))]
    pub async fn update_by_id(&self, id: &UserId, patch: UserPatch) -> Result<()> {
        patch.validate()?;
        let current = self.find_by_id(id).await?;
        if patch.is_empty() {
            debug!("Empty patch, nothing to write");
            return Ok(());
        }
        let updated = patch.apply(current);
        self.users.update(&mapping::to_row(&updated)).await?;
        debug!("Updated user");
        Ok(())
    }

    /// Remove a user. Removing a missing id succeeds.
    #[instrument(skip(self), fields(%id))]
    pub async fn delete_by_id(&self, id: &UserId) -> Result<()> {
        self.users.remove(&mapping::id_value(id)).await?;
        debug!("Deleted user");
        Ok(())
    }

    /// Count all users.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::AggregateEmpty`] if the store returns no row.
    #[instrument(skip(self))]
    pub async fn count(&self) -> Result<u64> {
        let query = statement::count_all(USERS_TABLE);
        let options = QueryOptions {
            prepare: true,
            ..Default::default()
        };
        let result = self.client.execute(&query, &[], &options).await?;
        let row = result
            .rows
            .first()
            .ok_or_else(|| QueryError::AggregateEmpty {
                query: query.clone(),
            })?;
        let count = mapping::count_from_row(row)?;
        debug!(count, "Counted users");
        Ok(count)
    }
}

fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_nanosecond(ts.nanosecond() / 1_000_000 * 1_000_000)
        .unwrap_or(ts)
}
