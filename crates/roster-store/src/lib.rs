//! Roster Storage Layer
//!
//! Implements the [`CohortSource`] and [`RunSink`] traits on top of SQLite.
//!
//! # Architecture
//!
//! - `members` / `relationship_edges` hold cohort snapshots (read-only for a run)
//! - `runs`, `allocations`, `preservation`, `intra_group_edges` and
//!   `group_averages` hold run output, written in one transaction per run
//! - Member attributes are kept as a JSON document per row
//!
//! # Examples
//!
//! ```no_run
//! use roster_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for cohort and run operations
//! ```

#![warn(missing_docs)]

use roster_domain::traits::{CohortSource, RunQuery, RunSink};
use roster_domain::{
    Assignment, AttributeValue, GroupId, IntraGroupEdge, Member, MemberId, PreservationRecord,
    RelationType, RelationshipEdge, Run, RunId, RunRecord,
};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Attribute document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// How long a writer waits for another connection's lock
const BUSY_TIMEOUT_SECS: u64 = 10;

/// Row counts per table, mostly useful for diagnostics and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Members across all cohorts
    pub members: usize,
    /// Relationship edges across all cohorts
    pub edges: usize,
    /// Persisted runs
    pub runs: usize,
    /// Assignment rows
    pub allocation_rows: usize,
    /// Preservation rows
    pub preservation_rows: usize,
    /// Intra-group edge rows
    pub intra_group_edge_rows: usize,
}

/// SQLite-based implementation of the cohort source and run sink
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each worker should open its own
/// `SqliteStore` on the same database file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use roster_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("roster.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        // Concurrent workers open their own connection to the same file
        conn.busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS))?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Insert or replace a member
    pub fn insert_member(&mut self, member: &Member) -> Result<(), StoreError> {
        let attributes = Self::attributes_to_json(&member.attributes)?;
        self.conn.execute(
            "INSERT INTO members (id, cohort, attributes) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET cohort = excluded.cohort, attributes = excluded.attributes",
            params![member.id.value() as i64, &member.cohort, attributes],
        )?;
        Ok(())
    }

    /// Insert a relationship edge for a cohort
    ///
    /// Endpoints are not checked against the member table; the graph builder
    /// is responsible for dropping edges with unknown endpoints.
    pub fn insert_edge(&mut self, cohort: &str, edge: &RelationshipEdge) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO relationship_edges (cohort, relation_type, source_id, target_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                cohort,
                edge.relation.as_str(),
                edge.source.value() as i64,
                edge.target.value() as i64,
            ],
        )?;
        Ok(())
    }

    /// Import a whole cohort snapshot in one transaction
    ///
    /// The snapshot replaces the cohort: its previous member and edge rows
    /// are removed first. A member id already filed under another cohort
    /// moves to this one. Stored runs are not touched.
    pub fn import_cohort(
        &mut self,
        cohort: &str,
        members: &[Member],
        edges: &[RelationshipEdge],
    ) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let cleared_edges = tx.execute("DELETE FROM relationship_edges WHERE cohort = ?1", params![cohort])?;
        let cleared_members = tx.execute("DELETE FROM members WHERE cohort = ?1", params![cohort])?;
        if cleared_members > 0 || cleared_edges > 0 {
            debug!(cohort, cleared_members, cleared_edges, "Replacing existing cohort snapshot");
        }
        for member in members {
            let attributes = Self::attributes_to_json(&member.attributes)?;
            tx.execute(
                "INSERT INTO members (id, cohort, attributes) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET cohort = excluded.cohort, attributes = excluded.attributes",
                params![member.id.value() as i64, cohort, attributes],
            )?;
        }
        for edge in edges {
            tx.execute(
                "INSERT INTO relationship_edges (cohort, relation_type, source_id, target_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    cohort,
                    edge.relation.as_str(),
                    edge.source.value() as i64,
                    edge.target.value() as i64,
                ],
            )?;
        }
        tx.commit()?;
        debug!(cohort, members = members.len(), edges = edges.len(), "Imported cohort snapshot");
        Ok(())
    }

    /// Row counts per table
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let count = |table: &str| -> Result<usize, StoreError> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
            Ok(n as usize)
        };
        Ok(StoreStats {
            members: count("members")?,
            edges: count("relationship_edges")?,
            runs: count("runs")?,
            allocation_rows: count("allocations")?,
            preservation_rows: count("preservation")?,
            intra_group_edge_rows: count("intra_group_edges")?,
        })
    }

    /// Convert RunId to bytes for storage
    fn run_id_to_bytes(id: RunId) -> Vec<u8> {
        id.value().to_be_bytes().to_vec()
    }

    /// Convert bytes to RunId
    fn bytes_to_run_id(bytes: &[u8]) -> Result<RunId, StoreError> {
        if bytes.len() != 16 {
            return Err(StoreError::InvalidData(format!(
                "Expected 16 bytes for RunId, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(RunId::from_value(u128::from_be_bytes(arr)))
    }

    fn group_from_i64(value: i64) -> Result<GroupId, StoreError> {
        u32::try_from(value)
            .ok()
            .and_then(GroupId::new)
            .ok_or_else(|| StoreError::InvalidData(format!("Invalid group id: {}", value)))
    }

    fn relation_from_str(s: &str) -> Result<RelationType, StoreError> {
        RelationType::parse(s)
            .ok_or_else(|| StoreError::InvalidData(format!("Unknown relation type: {}", s)))
    }

    fn attributes_to_json(
        attributes: &BTreeMap<String, AttributeValue>,
    ) -> Result<String, StoreError> {
        let map: serde_json::Map<String, serde_json::Value> = attributes
            .iter()
            .map(|(name, value)| {
                let json = match value {
                    AttributeValue::Number(n) => serde_json::Number::from_f64(*n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null),
                    AttributeValue::Text(s) => serde_json::Value::String(s.clone()),
                    AttributeValue::Missing => serde_json::Value::Null,
                };
                (name.clone(), json)
            })
            .collect();
        Ok(serde_json::to_string(&map)?)
    }

    fn attributes_from_json(
        document: &str,
    ) -> Result<BTreeMap<String, AttributeValue>, StoreError> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(document)?;
        Ok(map
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    serde_json::Value::Number(n) => {
                        n.as_f64().map(AttributeValue::Number).unwrap_or(AttributeValue::Missing)
                    }
                    serde_json::Value::String(s) => AttributeValue::Text(s),
                    serde_json::Value::Bool(b) => AttributeValue::Number(if b { 1.0 } else { 0.0 }),
                    _ => AttributeValue::Missing,
                };
                (name, value)
            })
            .collect())
    }

    fn conversion_error(column: usize, ty: rusqlite::types::Type, e: StoreError) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(column, ty, Box::new(e))
    }

    fn row_to_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<Run> {
        use rusqlite::types::Type;

        let id_bytes: Vec<u8> = row.get(0)?;
        let id = Self::bytes_to_run_id(&id_bytes).map_err(|e| Self::conversion_error(0, Type::Blob, e))?;
        let parent_bytes: Option<Vec<u8>> = row.get(5)?;
        let parent = parent_bytes
            .map(|bytes| Self::bytes_to_run_id(&bytes))
            .transpose()
            .map_err(|e| Self::conversion_error(5, Type::Blob, e))?;

        Ok(Run::restore(
            id,
            row.get(1)?,
            row.get::<_, i64>(2)? as u64,
            row.get::<_, i64>(3)? as usize,
            row.get(4)?,
            parent,
        ))
    }

    fn load_assignment(&self, run: &Run) -> Result<Assignment, StoreError> {
        let mut assignment = Assignment::new(run.group_count)
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;

        let mut stmt = self.conn.prepare(
            "SELECT member_id, group_id FROM allocations WHERE run_id = ?1 ORDER BY member_id",
        )?;
        let rows = stmt
            .query_map(params![Self::run_id_to_bytes(run.id)], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        for (member, group) in rows {
            assignment
                .insert(MemberId::new(member as u64), Self::group_from_i64(group)?)
                .map_err(|e| StoreError::InvalidData(e.to_string()))?;
        }
        Ok(assignment)
    }

    fn load_preservation(&self, id: RunId) -> Result<Vec<PreservationRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT group_id, relation_type, preserved_count, total_count
             FROM preservation WHERE run_id = ?1 ORDER BY group_id, relation_type",
        )?;
        let rows = stmt
            .query_map(params![Self::run_id_to_bytes(id)], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = rows
            .into_iter()
            .map(|(group, relation, preserved, total)| {
                Ok(PreservationRecord::new(
                    Self::group_from_i64(group)?,
                    Self::relation_from_str(&relation)?,
                    preserved as usize,
                    total as usize,
                ))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        records.sort_by_key(|r| (r.group, r.relation));
        Ok(records)
    }

    fn load_intra_group_edges(&self, id: RunId) -> Result<Vec<IntraGroupEdge>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT relation_type, group_id, source_id, target_id
             FROM intra_group_edges WHERE run_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![Self::run_id_to_bytes(id)], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut edges = rows
            .into_iter()
            .map(|(relation, group, source, target)| {
                Ok(IntraGroupEdge {
                    relation: Self::relation_from_str(&relation)?,
                    group: Self::group_from_i64(group)?,
                    source: MemberId::new(source as u64),
                    target: MemberId::new(target as u64),
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        edges.sort_by_key(|e| (e.relation, e.group, e.source, e.target));
        Ok(edges)
    }

    fn load_group_averages(
        &self,
        id: RunId,
    ) -> Result<BTreeMap<GroupId, BTreeMap<String, f64>>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT group_id, attribute, value FROM group_averages WHERE run_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![Self::run_id_to_bytes(id)], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut averages: BTreeMap<GroupId, BTreeMap<String, f64>> = BTreeMap::new();
        for (group, attribute, value) in rows {
            averages
                .entry(Self::group_from_i64(group)?)
                .or_default()
                .insert(attribute, value);
        }
        Ok(averages)
    }
}

impl CohortSource for SqliteStore {
    type Error = StoreError;

    fn get_members(&self, cohort: &str) -> Result<Vec<Member>, Self::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, cohort, attributes FROM members WHERE cohort = ?1 ORDER BY id")?;
        let rows = stmt
            .query_map(params![cohort], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, cohort, document)| {
                let mut member = Member::new(MemberId::new(id as u64), cohort);
                member.attributes = Self::attributes_from_json(&document)?;
                Ok(member)
            })
            .collect()
    }

    fn get_relationship_edges(
        &self,
        relation: RelationType,
        cohort: &str,
    ) -> Result<Vec<(MemberId, MemberId)>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT source_id, target_id FROM relationship_edges
             WHERE cohort = ?1 AND relation_type = ?2
             ORDER BY rowid",
        )?;
        let edges = stmt
            .query_map(params![cohort, relation.as_str()], |row| {
                Ok((
                    MemberId::new(row.get::<_, i64>(0)? as u64),
                    MemberId::new(row.get::<_, i64>(1)? as u64),
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(edges)
    }
}

impl RunSink for SqliteStore {
    type Error = StoreError;

    fn persist_run(&mut self, record: &RunRecord) -> Result<(), Self::Error> {
        let run = &record.run;
        let id_bytes = Self::run_id_to_bytes(run.id);

        // Dropping the transaction without commit rolls back every row below
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO runs (id, cohort, created_at, group_count, policy, parent_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &id_bytes,
                &run.cohort,
                run.created_at as i64,
                run.group_count as i64,
                &run.policy,
                run.parent.map(Self::run_id_to_bytes),
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO allocations (run_id, group_id, member_id) VALUES (?1, ?2, ?3)",
            )?;
            for (_, group, member) in record.assignment_rows() {
                stmt.execute(params![&id_bytes, group.value() as i64, member.value() as i64])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO preservation (run_id, group_id, relation_type, preserved_count, total_count)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for row in &record.preservation {
                stmt.execute(params![
                    &id_bytes,
                    row.group.value() as i64,
                    row.relation.as_str(),
                    row.preserved as i64,
                    row.total as i64,
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO intra_group_edges (run_id, relation_type, group_id, source_id, target_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for edge in &record.intra_group_edges {
                stmt.execute(params![
                    &id_bytes,
                    edge.relation.as_str(),
                    edge.group.value() as i64,
                    edge.source.value() as i64,
                    edge.target.value() as i64,
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO group_averages (run_id, group_id, attribute, value) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (group, averages) in &record.group_averages {
                for (attribute, value) in averages {
                    stmt.execute(params![&id_bytes, group.value() as i64, attribute, value])?;
                }
            }
        }

        tx.commit()?;

        debug!(
            run_id = %run.id,
            cohort = %run.cohort,
            members = record.assignment.len(),
            preservation_rows = record.preservation.len(),
            intra_group_edges = record.intra_group_edges.len(),
            "Persisted run"
        );
        Ok(())
    }

    fn load_run(&self, id: RunId) -> Result<Option<RunRecord>, Self::Error> {
        let run = self
            .conn
            .query_row(
                "SELECT id, cohort, created_at, group_count, policy, parent_id FROM runs WHERE id = ?1",
                params![Self::run_id_to_bytes(id)],
                Self::row_to_run,
            )
            .optional()?;

        let Some(run) = run else {
            return Ok(None);
        };

        Ok(Some(RunRecord {
            assignment: self.load_assignment(&run)?,
            preservation: self.load_preservation(id)?,
            intra_group_edges: self.load_intra_group_edges(id)?,
            group_averages: self.load_group_averages(id)?,
            run,
        }))
    }

    fn list_runs(&self, query: &RunQuery) -> Result<Vec<Run>, Self::Error> {
        let mut sql = String::from(
            "SELECT id, cohort, created_at, group_count, policy, parent_id FROM runs WHERE 1=1",
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(cohort) = &query.cohort {
            sql.push_str(" AND cohort = ?");
            params.push(Box::new(cohort.clone()));
        }

        // UUIDv7 bytes sort chronologically, which breaks ties within a millisecond
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let runs = stmt
            .query_map(&param_refs[..], Self::row_to_run)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }
}
