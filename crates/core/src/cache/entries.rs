//! Cached request/response entries.
//!
//! Writes are upserts keyed by (partition, request hash), so concurrent
//! writers of the same key resolve as last-write-wins.

use super::connection::CacheDb;
use super::hash::RequestKey;
use crate::Error;
use crate::http::HttpResponse;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

fn row_to_response(row: &rusqlite::Row<'_>) -> rusqlite::Result<(u16, String, String, Vec<u8>)> {
    Ok((row.get::<_, i64>(0)? as u16, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn decode(raw: (u16, String, String, Vec<u8>)) -> Result<HttpResponse, Error> {
    let (status, status_text, headers_json, body) = raw;
    let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
    Ok(HttpResponse { status, status_text, headers, body })
}

impl CacheDb {
    /// Store a response under `key` in `partition`.
    ///
    /// Only 2xx responses are accepted. The partition is created on demand.
    pub async fn put(&self, partition: &str, key: &RequestKey, response: &HttpResponse) -> Result<(), Error> {
        if !response.is_success() {
            return Err(Error::InvalidInput(format!(
                "refusing to cache status {} for {}",
                response.status, key.url
            )));
        }

        let partition = partition.to_string();
        let key_hash = key.hash();
        let method = key.method.clone();
        let url = key.url.clone();
        let status = response.status as i64;
        let status_text = response.status_text.clone();
        let headers_json = serde_json::to_string(&response.headers)?;
        let body = response.body.clone();
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO partitions (name, created_at) VALUES (?1, ?2)
                     ON CONFLICT(name) DO NOTHING",
                    params![partition, now],
                )?;
                tx.execute(
                    "INSERT INTO entries (
                        partition, key_hash, method, url, status, status_text, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(partition, key_hash) DO UPDATE SET
                        status = excluded.status,
                        status_text = excluded.status_text,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![partition, key_hash, method, url, status, status_text, headers_json, body, now],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up `key` in a single partition.
    pub async fn match_in(&self, partition: &str, key: &RequestKey) -> Result<Option<HttpResponse>, Error> {
        let partition = partition.to_string();
        let key_hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<HttpResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, status_text, headers_json, body
                     FROM entries WHERE partition = ?1 AND key_hash = ?2",
                )?;

                match stmt.query_row(params![partition, key_hash], row_to_response) {
                    Ok(raw) => decode(raw).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Look up `key` across every partition, oldest partition first.
    pub async fn match_any(&self, key: &RequestKey) -> Result<Option<HttpResponse>, Error> {
        let key_hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<HttpResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.status, e.status_text, e.headers_json, e.body
                     FROM entries e
                     JOIN partitions p ON p.name = e.partition
                     WHERE e.key_hash = ?1
                     ORDER BY p.rowid ASC
                     LIMIT 1",
                )?;

                match stmt.query_row(params![key_hash], row_to_response) {
                    Ok(raw) => decode(raw).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// URLs stored in a partition, in insertion order.
    pub async fn entry_urls(&self, partition: &str) -> Result<Vec<String>, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE partition = ?1 ORDER BY rowid ASC")?;
                let urls = stmt
                    .query_map(params![partition], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_response(body: &str) -> HttpResponse {
        HttpResponse::new(200, "OK", body.as_bytes().to_vec()).with_header("content-type", "text/css")
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = RequestKey::get("https://example.com/static/style.css");

        db.put("v1-static", &key, &ok_response("body{}")).await.unwrap();

        let cached = db.match_in("v1-static", &key).await.unwrap().unwrap();
        assert_eq!(cached.text(), "body{}");
        assert_eq!(cached.content_type(), Some("text/css"));
        assert_eq!(db.partition_names().await.unwrap(), vec!["v1-static".to_string()]);
    }

    #[tokio::test]
    async fn test_match_is_partition_scoped() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = RequestKey::get("https://example.com/dashboard");
        db.put("v1-dynamic", &key, &ok_response("page")).await.unwrap();

        assert!(db.match_in("v1-static", &key).await.unwrap().is_none());
        assert!(db.match_any(&key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_method_is_part_of_identity() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("p", &RequestKey::get("https://example.com/x"), &ok_response("x"))
            .await
            .unwrap();

        let head = RequestKey::new("HEAD", "https://example.com/x");
        assert!(db.match_in("p", &head).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_rejects_non_success() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = RequestKey::get("https://example.com/missing.js");
        let result = db.put("p", &key, &HttpResponse::new(404, "Not Found", Vec::new())).await;

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(db.match_in("p", &key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = RequestKey::get("https://example.com/api/campaigns");
        db.put("api", &key, &ok_response("first")).await.unwrap();
        db.put("api", &key, &ok_response("second")).await.unwrap();

        assert_eq!(db.match_in("api", &key).await.unwrap().unwrap().text(), "second");
        assert_eq!(db.entry_urls("api").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_partition_removes_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = RequestKey::get("https://example.com/a.png");
        db.put("old", &key, &ok_response("png")).await.unwrap();
        db.delete_partition("old").await.unwrap();

        assert!(db.match_any(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stats_count_entries_and_bytes() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("s", &RequestKey::get("https://example.com/a"), &ok_response("1234"))
            .await
            .unwrap();
        db.put("s", &RequestKey::get("https://example.com/b"), &ok_response("56"))
            .await
            .unwrap();

        let stats = db.partition_stats().await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].entries, 2);
        assert_eq!(stats[0].bytes, 6);
    }
}
