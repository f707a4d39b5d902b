//! Search history persistence.
//!
//! History rows are a side record of who searched for what. Writes are
//! fire-and-forget from the orchestrator's point of view.

use super::connection::CacheDb;
use crate::{Error, RankingType};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// One recorded search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchHistoryEntry {
    pub id: i64,
    pub user_id: i64,
    pub website: String,
    pub query: String,
    pub ranking_type: String,
    pub created_at: String,
}

impl CacheDb {
    /// Record a search for `user_id`. Returns the new row id.
    pub async fn record_history(
        &self, user_id: i64, website: &str, query: &str, ranking: RankingType,
    ) -> Result<i64, Error> {
        let website = website.to_string();
        let query = query.to_string();
        let ranking = ranking.as_str();
        let created_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        self.conn
            .call(move |conn| -> Result<i64, Error> {
                conn.execute(
                    "INSERT INTO search_history (user_id, website, query, ranking_type, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![user_id, website, query, ranking, created_at],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(Error::from)
    }

    /// List a user's searches, newest first.
    pub async fn list_history(&self, user_id: i64, limit: usize, offset: usize) -> Result<Vec<SearchHistoryEntry>, Error> {
        let limit = limit as i64;
        let offset = offset as i64;
        self.conn
            .call(move |conn| -> Result<Vec<SearchHistoryEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, website, query, ranking_type, created_at
                     FROM search_history WHERE user_id = ?1
                     ORDER BY created_at DESC, id DESC
                     LIMIT ?2 OFFSET ?3",
                )?;

                let rows = stmt.query_map(params![user_id, limit, offset], |row| {
                    Ok(SearchHistoryEntry {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        website: row.get(2)?,
                        query: row.get(3)?,
                        ranking_type: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?;

                let mut entries = Vec::new();
                for row in rows {
                    entries.push(row?);
                }
                Ok(entries)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete one history row, only if it belongs to `user_id`.
    ///
    /// Returns whether a row was removed.
    pub async fn delete_history(&self, user_id: i64, id: i64) -> Result<bool, Error> {
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count =
                    conn.execute("DELETE FROM search_history WHERE id = ?1 AND user_id = ?2", params![id, user_id])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_and_list_history() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.record_history(1, "allrecipes.com", "cookies", RankingType::Relevance)
            .await
            .unwrap();
        db.record_history(1, "allrecipes.com", "brownies", RankingType::Ratings)
            .await
            .unwrap();
        db.record_history(2, "bbc.co.uk", "scones", RankingType::Relevance)
            .await
            .unwrap();

        let history = db.list_history(1, 10, 0).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].query, "brownies");
        assert_eq!(history[0].ranking_type, "ratings");
        assert_eq!(history[1].query, "cookies");
    }

    #[tokio::test]
    async fn test_history_pagination() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for i in 0..5 {
            db.record_history(7, "example.com", &format!("query {i}"), RankingType::Relevance)
                .await
                .unwrap();
        }

        let page = db.list_history(7, 2, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].query, "query 2");
    }

    #[tokio::test]
    async fn test_delete_history_checks_owner() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let id = db
            .record_history(1, "allrecipes.com", "cookies", RankingType::Relevance)
            .await
            .unwrap();

        assert!(!db.delete_history(2, id).await.unwrap());
        assert!(db.delete_history(1, id).await.unwrap());
        assert!(db.list_history(1, 10, 0).await.unwrap().is_empty());
    }
}
