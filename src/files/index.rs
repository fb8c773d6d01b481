use super::mimetype::MimeFilter;
use super::pattern::Pattern;
use super::schema::{
    ContentKind, Context, CourseModule, FileRecord, FileScope, NewFile, CONTEXT_COURSE,
};
use crate::error::Result;
use anyhow::Context as _;
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

/// Components produced by the assignment submission plugins.
pub const SUBMISSION_COMPONENTS: &str = "assign%";

/// Restriction on the component column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentFilter {
    /// Matches the given component key (trailing `%` allowed).
    Only(String),
    /// Drops everything produced by submission plugins.
    WithoutSubmissions,
}

/// Predicate set shared by the page query and its count query.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    pub component: Option<ComponentFilter>,
    pub mimetype: Option<MimeFilter>,
}

/// SQLite-backed view over the host's file metadata tables.
#[derive(Clone)]
pub struct FileIndex {
    conn: Arc<Mutex<Connection>>,
}

impl FileIndex {
    pub fn open(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open {}", db_path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             PRAGMA cache_size   = -2000;
             PRAGMA temp_store   = MEMORY;",
        )?;

        Self::init_schema(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    fn init_schema(conn: &Connection) -> anyhow::Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS context (
                id              INTEGER PRIMARY KEY,
                contextlevel    INTEGER NOT NULL,
                instanceid      INTEGER NOT NULL,
                path            TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS users (
                id              INTEGER PRIMARY KEY,
                firstname       TEXT NOT NULL DEFAULT '',
                lastname        TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS files (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                contextid       INTEGER NOT NULL,
                component       TEXT NOT NULL,
                filearea        TEXT NOT NULL,
                itemid          INTEGER NOT NULL DEFAULT 0,
                filepath        TEXT NOT NULL DEFAULT '/',
                filename        TEXT NOT NULL,
                userid          INTEGER,
                filesize        INTEGER NOT NULL DEFAULT 0,
                mimetype        TEXT,
                license         TEXT,
                author          TEXT,
                timemodified    INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS course_modules (
                id              INTEGER PRIMARY KEY,
                course          INTEGER NOT NULL,
                modname         TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS embedded_content (
                kind            TEXT NOT NULL,
                itemid          INTEGER NOT NULL,
                body            TEXT NOT NULL,
                PRIMARY KEY (kind, itemid)
            );

            CREATE INDEX IF NOT EXISTS idx_files_context ON files(contextid);
            CREATE INDEX IF NOT EXISTS idx_files_component ON files(component, filename);
            CREATE INDEX IF NOT EXISTS idx_context_path ON context(path);
            CREATE INDEX IF NOT EXISTS idx_context_instance ON context(contextlevel, instanceid);",
        )
        .context("Failed to init file metadata schema")?;
        Ok(())
    }

    // Host-side writes. The listing core never calls these; imports and
    // fixtures do.

    pub fn insert_context(&self, context: &Context) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO context (id, contextlevel, instanceid, path) VALUES (?1, ?2, ?3, ?4)",
            params![context.id, context.level, context.instance_id, context.path],
        )?;
        Ok(())
    }

    pub fn insert_user(&self, id: i64, firstname: &str, lastname: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO users (id, firstname, lastname) VALUES (?1, ?2, ?3)",
            params![id, firstname, lastname],
        )?;
        Ok(())
    }

    /// Store a file row, returning its id.
    pub fn insert_file(&self, file: &NewFile) -> Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO files (contextid, component, filearea, itemid, filepath, filename,
             userid, filesize, mimetype, license, author, timemodified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                file.context_id, file.component, file.filearea, file.item_id,
                file.filepath, file.filename, file.user_id, file.filesize as i64,
                file.mimetype, file.license, file.author, file.time_modified,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_course_module(&self, module: &CourseModule) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO course_modules (id, course, modname) VALUES (?1, ?2, ?3)",
            params![module.id, module.course_id, module.modname],
        )?;
        Ok(())
    }

    pub fn set_embedded_content(&self, kind: ContentKind, item_id: i64, body: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO embedded_content (kind, itemid, body) VALUES (?1, ?2, ?3)",
            params![kind.as_str(), item_id, body],
        )?;
        Ok(())
    }

    // Reads.

    pub fn context(&self, id: i64) -> Result<Option<Context>> {
        let conn = self.conn.lock();
        let context = conn
            .query_row(
                "SELECT id, contextlevel, instanceid, path FROM context WHERE id = ?1",
                params![id],
                Self::row_to_context,
            )
            .optional()?;
        Ok(context)
    }

    pub fn course_context(&self, course_id: i64) -> Result<Option<Context>> {
        let conn = self.conn.lock();
        let context = conn
            .query_row(
                "SELECT id, contextlevel, instanceid, path FROM context
                 WHERE contextlevel = ?1 AND instanceid = ?2",
                params![CONTEXT_COURSE, course_id],
                Self::row_to_context,
            )
            .optional()?;
        Ok(context)
    }

    /// Files below `scope`, filtered and sorted by component, filename, id.
    pub fn list(
        &self,
        scope: &Context,
        filter: &FileFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<FileRecord>> {
        // SQLite reads a negative OFFSET as zero; no row sits past i64::MAX.
        let Ok(offset) = i64::try_from(offset) else {
            return Ok(Vec::new());
        };
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let (where_sql, mut query_params) = Self::build_filter(scope, filter);
        query_params.push(Value::Integer(limit));
        query_params.push(Value::Integer(offset));

        let sql = format!(
            "SELECT f.id, f.contextid, f.component, f.filearea, f.itemid, f.filepath,
             f.filename, f.userid, f.filesize, f.mimetype, f.license, f.author,
             f.timemodified, c.contextlevel, c.instanceid,
             CASE WHEN u.id IS NULL THEN NULL ELSE trim(u.firstname || ' ' || u.lastname) END
             FROM files f
             LEFT JOIN context c ON c.id = f.contextid
             LEFT JOIN users u ON u.id = f.userid
             {where_sql}
             ORDER BY f.component, f.filename, f.id
             LIMIT ? OFFSET ?"
        );
        tracing::debug!(%sql, "listing files");

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(query_params.iter()), Self::row_to_record)?;
        let files = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(files)
    }

    /// Number of rows `list` would yield without offset and limit.
    pub fn count(&self, scope: &Context, filter: &FileFilter) -> Result<usize> {
        let (where_sql, count_params) = Self::build_filter(scope, filter);
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM files f
                 LEFT JOIN context c ON c.id = f.contextid
                 {where_sql}"
            ),
            params_from_iter(count_params.iter()),
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Distinct components of the files below `scope`.
    pub fn components(&self, scope: &Context) -> Result<Vec<String>> {
        let (where_sql, params) = Self::build_filter(scope, &FileFilter::default());
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT f.component FROM files f
             LEFT JOIN context c ON c.id = f.contextid
             {where_sql}
             GROUP BY f.component"
        ))?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| row.get(0))?;
        let components = rows.collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(components)
    }

    /// Stored context id and path of the given files. Unknown ids are absent.
    pub fn file_scopes(&self, ids: &[i64]) -> Result<Vec<FileScope>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT f.id, f.contextid, c.path FROM files f
             JOIN context c ON c.id = f.contextid
             WHERE f.id IN ({})",
            placeholders(ids.len())
        ))?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), |row| {
            Ok(FileScope {
                id: row.get(0)?,
                context_id: row.get(1)?,
                path: row.get(2)?,
            })
        })?;
        let scopes = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(scopes)
    }

    /// Set `license` on exactly `ids` in one transaction. Nothing is written
    /// unless the whole statement succeeds.
    pub fn update_license(&self, ids: &[i64], license: &str) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut values: Vec<Value> = Vec::with_capacity(ids.len() + 1);
        values.push(Value::Text(license.to_string()));
        values.extend(ids.iter().map(|id| Value::Integer(*id)));
        let changed = tx.execute(
            &format!(
                "UPDATE files SET license = ? WHERE id IN ({})",
                placeholders(ids.len())
            ),
            params_from_iter(values.iter()),
        )?;
        tx.commit()?;
        Ok(changed)
    }

    pub fn file_license(&self, id: i64) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let license: Option<Option<String>> = conn
            .query_row("SELECT license FROM files WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(license.flatten())
    }

    pub fn course_modules(&self, course_id: i64) -> Result<Vec<CourseModule>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT id, course, modname FROM course_modules WHERE course = ?1")?;
        let rows = stmt.query_map(params![course_id], |row| {
            Ok(CourseModule {
                id: row.get(0)?,
                course_id: row.get(1)?,
                modname: row.get(2)?,
            })
        })?;
        let modules = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(modules)
    }

    pub fn embedded_content(&self, kind: ContentKind, item_id: i64) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM embedded_content WHERE kind = ?1 AND itemid = ?2",
                params![kind.as_str(), item_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(body)
    }

    /// Raw access for host-side maintenance such as migrations.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(sql)?;
        Ok(())
    }

    // Helper: build WHERE clause and params for list(), count() and
    // components(). `.` rows are directory markers, never real files.
    fn build_filter(scope: &Context, filter: &FileFilter) -> (String, Vec<Value>) {
        let scope_prefix = format!("{}/", scope.path);
        let (path_sql, path_value) = Pattern::Prefix(&scope_prefix).to_sql("c.path");
        let mut clauses = vec![
            "f.filename <> '.'".to_string(),
            format!("({path_sql} OR c.id = ?)"),
        ];
        let mut params = vec![path_value, Value::Integer(scope.id)];

        match &filter.component {
            Some(ComponentFilter::WithoutSubmissions) => {
                let (sql, value) = Pattern::parse(SUBMISSION_COMPONENTS).to_sql("f.component");
                clauses.push(format!("NOT ({sql})"));
                params.push(value);
            }
            Some(ComponentFilter::Only(component)) => {
                let (sql, value) = Pattern::parse(component).to_sql("f.component");
                clauses.push(sql);
                params.push(value);
            }
            None => {}
        }

        if let Some(mime) = &filter.mimetype {
            let (sql, values) = mime.to_sql("f.mimetype");
            clauses.push(sql);
            params.extend(values);
        }

        (format!("WHERE {}", clauses.join(" AND ")), params)
    }

    fn row_to_context(row: &rusqlite::Row) -> rusqlite::Result<Context> {
        Ok(Context {
            id: row.get(0)?,
            level: row.get(1)?,
            instance_id: row.get(2)?,
            path: row.get(3)?,
        })
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<FileRecord> {
        Ok(FileRecord {
            id: row.get(0)?,
            context_id: row.get(1)?,
            component: row.get(2)?,
            filearea: row.get(3)?,
            item_id: row.get(4)?,
            filepath: row.get(5)?,
            filename: row.get(6)?,
            user_id: row.get(7)?,
            filesize: row.get::<_, i64>(8)? as u64,
            mimetype: row.get(9)?,
            license: row.get(10)?,
            author: row.get(11)?,
            time_modified: row.get(12)?,
            context_level: row.get(13)?,
            instance_id: row.get(14)?,
            user_fullname: row.get(15)?,
        })
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::files::schema::CONTEXT_MODULE;
    use tempfile::TempDir;

    pub(crate) fn open_index() -> (TempDir, FileIndex) {
        let dir = TempDir::new().unwrap();
        let index = FileIndex::open(&dir.path().join("files.db")).unwrap();
        (dir, index)
    }

    pub(crate) fn ctx(id: i64, level: i64, instance_id: i64, path: &str) -> Context {
        Context {
            id,
            level,
            instance_id,
            path: path.to_string(),
        }
    }

    pub(crate) fn file(
        context_id: i64,
        component: &str,
        area: &str,
        name: &str,
        mime: &str,
    ) -> NewFile {
        NewFile {
            context_id,
            component: component.to_string(),
            filearea: area.to_string(),
            filepath: "/".to_string(),
            filename: name.to_string(),
            mimetype: Some(mime.to_string()),
            license: Some("unknown".to_string()),
            ..NewFile::default()
        }
    }

    #[test]
    fn list_joins_context_and_user() {
        let (_dir, index) = open_index();
        let course = ctx(17, CONTEXT_COURSE, 4, "/1/17");
        index.insert_context(&course).unwrap();
        index.insert_context(&ctx(40, CONTEXT_MODULE, 9, "/1/17/40")).unwrap();
        index.insert_user(2, "Ada", "Lovelace").unwrap();
        let mut new = file(40, "mod_folder", "content", "notes.pdf", "application/pdf");
        new.user_id = Some(2);
        index.insert_file(&new).unwrap();

        let files = index.list(&course, &FileFilter::default(), 0, 10).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].context_level, Some(CONTEXT_MODULE));
        assert_eq!(files[0].instance_id, Some(9));
        assert_eq!(files[0].user_fullname.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn directory_markers_are_never_listed() {
        let (_dir, index) = open_index();
        let course = ctx(17, CONTEXT_COURSE, 4, "/1/17");
        index.insert_context(&course).unwrap();
        index.insert_file(&file(17, "course", "section", ".", "")).unwrap();
        index.insert_file(&file(17, "course", "section", "a.txt", "text/plain")).unwrap();

        let files = index.list(&course, &FileFilter::default(), 0, 10).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(index.count(&course, &FileFilter::default()).unwrap(), 1);
    }

    #[test]
    fn scope_excludes_sibling_with_shared_digit_prefix() {
        let (_dir, index) = open_index();
        let course = ctx(17, CONTEXT_COURSE, 4, "/1/17");
        index.insert_context(&course).unwrap();
        index.insert_context(&ctx(170, CONTEXT_COURSE, 5, "/1/170")).unwrap();
        index.insert_file(&file(170, "course", "section", "x.txt", "text/plain")).unwrap();

        assert!(index.list(&course, &FileFilter::default(), 0, 10).unwrap().is_empty());
    }

    #[test]
    fn update_license_rolls_back_on_failure() {
        let (_dir, index) = open_index();
        index.insert_context(&ctx(17, CONTEXT_COURSE, 4, "/1/17")).unwrap();
        let a = index.insert_file(&file(17, "course", "section", "a.txt", "text/plain")).unwrap();
        let b = index.insert_file(&file(17, "course", "section", "b.txt", "text/plain")).unwrap();
        index
            .execute_batch(&format!(
                "CREATE TRIGGER refuse BEFORE UPDATE ON files WHEN NEW.id = {b}
                 BEGIN SELECT RAISE(ABORT, 'refused'); END;"
            ))
            .unwrap();

        assert!(index.update_license(&[a, b], "cc").is_err());
        assert_eq!(index.file_license(a).unwrap().as_deref(), Some("unknown"));
        assert_eq!(index.file_license(b).unwrap().as_deref(), Some("unknown"));
    }

    #[test]
    fn file_scopes_skips_unknown_ids() {
        let (_dir, index) = open_index();
        index.insert_context(&ctx(17, CONTEXT_COURSE, 4, "/1/17")).unwrap();
        let a = index.insert_file(&file(17, "course", "section", "a.txt", "text/plain")).unwrap();

        let scopes = index.file_scopes(&[a, 9999]).unwrap();
        assert_eq!(
            scopes,
            vec![FileScope {
                id: a,
                context_id: 17,
                path: "/1/17".into()
            }]
        );
    }
}
