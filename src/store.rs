//! Persistence seam.
//!
//! The tracker only ever talks to [`ExpenseStore`]; durability, transactions
//! and retries belong to the implementation behind it. [`MemoryStore`] is the
//! reference implementation used by tests and the harness server.

use crate::error::{ExpenseTrackerError, Result};
use crate::model::{Expense, NewExpense};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Persists a validated expense and returns it with its generated id.
    async fn create(&self, new_expense: NewExpense) -> Result<Expense>;

    /// Every expense the user owns. No server-side date filtering is assumed;
    /// callers filter the full set themselves.
    async fn find_all_for_user(&self, user_id: &str) -> Result<Vec<Expense>>;

    /// Removes an expense only if it belongs to the user. `None` when the
    /// expense does not exist or is owned by someone else.
    async fn delete_for_user(&self, id: Uuid, user_id: &str) -> Result<Option<Expense>>;
}

/// In-process store backed by a mutex-guarded vector.
#[derive(Default)]
pub struct MemoryStore {
    expenses: Mutex<Vec<Expense>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Expense>>> {
        self.expenses
            .lock()
            .map_err(|_| ExpenseTrackerError::Store("expense store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn create(&self, new_expense: NewExpense) -> Result<Expense> {
        let expense = Expense {
            id: Uuid::new_v4(),
            user_id: new_expense.user_id,
            amount_cents: new_expense.amount_cents,
            description: new_expense.description,
            payment_method: new_expense.payment_method,
            date: new_expense.date,
            raw_text: new_expense.raw_text,
        };
        self.lock()?.push(expense.clone());
        Ok(expense)
    }

    async fn find_all_for_user(&self, user_id: &str) -> Result<Vec<Expense>> {
        Ok(self
            .lock()?
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_for_user(&self, id: Uuid, user_id: &str) -> Result<Option<Expense>> {
        let mut expenses = self.lock()?;
        let position = expenses
            .iter()
            .position(|e| e.id == id && e.user_id == user_id);
        Ok(position.map(|i| expenses.remove(i)))
    }
}

/// Explicit legacy-id to current-id lookup, passed into the request context
/// instead of living as module-level global state.
#[derive(Debug, Clone, Default)]
pub struct UserIdAliases {
    aliases: HashMap<String, String>,
}

impl UserIdAliases {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        Self { aliases }
    }

    /// Maps a possibly-legacy identifier to the current one. Unknown ids pass
    /// through unchanged.
    pub fn resolve<'a>(&'a self, user_id: &'a str) -> &'a str {
        self.aliases.get(user_id).map(String::as_str).unwrap_or(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const USER: &str = "550e8400-e29b-41d4-a716-446655440000";
    const OTHER: &str = "650e8400-e29b-41d4-a716-446655440111";

    fn new_expense(user_id: &str) -> NewExpense {
        NewExpense {
            user_id: user_id.to_string(),
            amount_cents: 1870,
            description: "Bus ticket".to_string(),
            payment_method: "Cash".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            raw_text: Some("bus 18,70 cash".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_find_scopes_by_user() {
        let store = MemoryStore::new();
        let created = store.create(new_expense(USER)).await.unwrap();
        store.create(new_expense(OTHER)).await.unwrap();

        let mine = store.find_all_for_user(USER).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, created.id);
        assert_eq!(mine[0].raw_text.as_deref(), Some("bus 18,70 cash"));
    }

    #[tokio::test]
    async fn test_delete_verifies_ownership() {
        let store = MemoryStore::new();
        let created = store.create(new_expense(USER)).await.unwrap();

        assert!(store
            .delete_for_user(created.id, OTHER)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .delete_for_user(created.id, USER)
            .await
            .unwrap()
            .is_some());
        assert!(store.find_all_for_user(USER).await.unwrap().is_empty());
    }

    #[test]
    fn test_alias_resolution() {
        let aliases = UserIdAliases::new(HashMap::from([(
            "legacy-42".to_string(),
            USER.to_string(),
        )]));
        assert_eq!(aliases.resolve("legacy-42"), USER);
        assert_eq!(aliases.resolve(USER), USER);
        assert_eq!(aliases.resolve("unknown"), "unknown");
    }
}
