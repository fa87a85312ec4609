//! SQLite record store: one table per record kind keyed by record id, filled with
//! insert-if-absent semantics, plus the SQL form of the per-author aggregation.

use crate::aggregate::AuthorCounts;
use crate::batch::for_each_batch;
use crate::config::{AuthorFilter, RunOptions};
use crate::records::{
    bool_to_sql, Comment, Record, RecordKind, Submission, DELETED_AUTHOR, MISSING_FLOAT, MISSING_INT, UNKNOWN,
};
use anyhow::{Context, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use std::path::{Path, PathBuf};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS comments (
        id TEXT PRIMARY KEY,
        author TEXT,
        subreddit TEXT,
        link_id TEXT,
        parent_id TEXT,
        score INTEGER,
        ups REAL,
        downs REAL,
        created_utc INTEGER,
        body TEXT,
        author_flair_text TEXT,
        controversiality INTEGER,
        subreddit_id TEXT,
        retrieved_on REAL,
        edited INTEGER
    );

    CREATE TABLE IF NOT EXISTS posts (
        id TEXT PRIMARY KEY,
        author TEXT,
        subreddit TEXT,
        subreddit_id TEXT,
        title TEXT,
        selftext TEXT,
        url TEXT,
        permalink TEXT,
        created_utc INTEGER,
        score INTEGER,
        num_comments INTEGER,
        ups REAL,
        downs REAL,
        author_flair_text TEXT,
        is_self INTEGER,
        domain TEXT,
        over_18 INTEGER,
        media TEXT,
        edited INTEGER,
        stickied INTEGER,
        distinguished TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_comments_author ON comments(author);
    CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author);
";

const COMMENT_INSERT: &str = "
    INSERT OR IGNORE INTO comments
        (id, author, subreddit, link_id, parent_id, score, ups, downs, created_utc, body,
         author_flair_text, controversiality, subreddit_id, retrieved_on, edited)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const POST_INSERT: &str = "
    INSERT OR IGNORE INTO posts
        (id, author, subreddit, subreddit_id, title, selftext, url, permalink, created_utc, score,
         num_comments, ups, downs, author_flair_text, is_self, domain, over_18, media, edited,
         stickied, distinguished)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

fn text(v: &Option<String>, absent: &str) -> SqlValue {
    SqlValue::Text(v.clone().unwrap_or_else(|| absent.to_string()))
}

/// Grouping columns keep SQL NULL for absent values so the SQL aggregation skips
/// exactly the records the in-memory one skips.
fn key(v: &Option<String>) -> SqlValue {
    v.clone().map_or(SqlValue::Null, SqlValue::Text)
}

fn int(v: Option<i64>) -> SqlValue {
    SqlValue::Integer(v.unwrap_or(MISSING_INT))
}

fn real(v: Option<f64>) -> SqlValue {
    SqlValue::Real(v.unwrap_or(MISSING_FLOAT))
}

/// A record kind that maps onto a fixed table row.
pub trait Loadable: Record {
    const INSERT_SQL: &'static str;

    /// Column values in `INSERT_SQL` order, sentinels substituted.
    fn row(&self) -> Vec<SqlValue>;
}

impl Loadable for Comment {
    const INSERT_SQL: &'static str = COMMENT_INSERT;

    fn row(&self) -> Vec<SqlValue> {
        vec![
            text(&self.id, UNKNOWN),
            key(&self.author),
            text(&self.subreddit, UNKNOWN),
            key(&self.link_id),
            text(&self.parent_id, UNKNOWN),
            int(self.score),
            real(self.ups),
            real(self.downs),
            int(self.created_utc),
            text(&self.body, ""),
            text(&self.author_flair_text, ""),
            int(self.controversiality),
            text(&self.subreddit_id, ""),
            real(self.retrieved_on),
            SqlValue::Integer(self.edited.as_ref().map_or(MISSING_INT, |e| e.as_sql_int())),
        ]
    }
}

impl Loadable for Submission {
    const INSERT_SQL: &'static str = POST_INSERT;

    fn row(&self) -> Vec<SqlValue> {
        vec![
            text(&self.id, UNKNOWN),
            key(&self.author),
            text(&self.subreddit, UNKNOWN),
            text(&self.subreddit_id, ""),
            text(&self.title, ""),
            text(&self.selftext, ""),
            text(&self.url, ""),
            text(&self.permalink, ""),
            int(self.created_utc),
            int(self.score),
            int(self.num_comments),
            real(self.ups),
            real(self.downs),
            text(&self.author_flair_text, ""),
            SqlValue::Integer(bool_to_sql(self.is_self)),
            text(&self.domain, ""),
            SqlValue::Integer(bool_to_sql(self.over_18)),
            text(&self.media_text(), UNKNOWN),
            SqlValue::Integer(self.edited.as_ref().map_or(MISSING_INT, |e| e.as_sql_int())),
            SqlValue::Integer(bool_to_sql(self.stickied)),
            text(&self.distinguished, ""),
        ]
    }
}

/// Rows read vs. rows actually inserted by one load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub read: u64,
    pub inserted: u64,
}

impl LoadStats {
    /// Records dropped because their id was already present.
    pub fn ignored(&self) -> u64 {
        self.read - self.inserted
    }
}

pub struct RecordStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl RecordStore {
    /// Open or create the database at `path` and ensure both tables exist.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).with_context(|| format!("open database {}", path.display()))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        let store = Self { conn, path: Some(path.to_path_buf()) };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn, path: None };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA)
            .with_context(|| format!("create tables in {}", self.display_path()))
    }

    fn display_path(&self) -> String {
        self.path.as_ref().map_or_else(|| ":memory:".to_string(), |p| p.display().to_string())
    }

    /// Insert `records` in one transaction; existing ids are left untouched.
    /// Returns the number of rows actually inserted.
    pub fn insert_batch<R: Loadable>(&mut self, records: &[R]) -> Result<u64> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0u64;
        {
            let mut stmt = tx.prepare_cached(R::INSERT_SQL)?;
            for rec in records {
                inserted += stmt.execute(params_from_iter(rec.row()))? as u64;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Stream a JSONL file into the table for `R`, one transaction per batch.
    /// Batches committed before a failure stay committed; replaying the same input
    /// is a no-op at the row level.
    pub fn load_file<R: Loadable>(&mut self, path: &Path, opts: &RunOptions) -> Result<LoadStats> {
        let mut inserted = 0u64;
        let batches = for_each_batch::<R, _>(path, opts, |batch| {
            inserted += self
                .insert_batch(&batch)
                .with_context(|| format!("insert into {}", R::KIND.table()))?;
            Ok(())
        })?;
        let stats = LoadStats { read: batches.records, inserted };
        tracing::info!(
            table = R::KIND.table(),
            db = %self.display_path(),
            read = stats.read,
            inserted = stats.inserted,
            ignored = stats.ignored(),
            "records loaded"
        );
        Ok(stats)
    }

    pub fn row_count(&self, kind: RecordKind) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        let n: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Per-author `COUNT(*)` and `COUNT(DISTINCT secondary)` computed by SQLite.
    ///
    /// Rows without an author, and comments without a `link_id`, are never grouped.
    /// With `ExcludeDeleted`, empty and `[deleted]` authors are skipped as well. This
    /// is the same rule set the in-memory aggregation applies under either filter.
    pub fn author_stats(&self, kind: RecordKind, filter: AuthorFilter) -> Result<Vec<AuthorCounts>> {
        let (table, secondary) = match kind {
            RecordKind::Comment => ("comments", "link_id"),
            RecordKind::Submission => ("posts", "id"),
        };
        let mut clause = String::from("WHERE author IS NOT NULL");
        let mut bind: Vec<&str> = Vec::new();
        if filter == AuthorFilter::ExcludeDeleted {
            clause.push_str(" AND author NOT IN ('', ?1)");
            bind.push(DELETED_AUTHOR);
        }
        if kind == RecordKind::Comment {
            clause.push_str(" AND link_id IS NOT NULL AND link_id <> ''");
        }
        let sql = format!(
            "SELECT author, COUNT(*), COUNT(DISTINCT {secondary}) FROM {table} {clause} \
             GROUP BY author ORDER BY author"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(bind), |row| {
                let author: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                let distinct: i64 = row.get(2)?;
                Ok(AuthorCounts::new(author, count as u64, distinct as u64))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
