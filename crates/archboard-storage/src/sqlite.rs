//! SQLite implementation of the store traits.
//!
//! [`SqliteStore`] persists diagrams, templates and environment variables
//! in a SQLite database with WAL mode, a transaction around every write that
//! reads before it writes, and automatic schema migrations. Node and edge
//! collections are stored as JSON TEXT columns via serde_json.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use archboard_core::{DiagramGraph, DiagramKind, Edge, Node, ProjectId};

use crate::error::StorageError;
use crate::hash::graph_digest;
use crate::schema::{connect, Location};
use crate::traits::{DiagramStore, EnvConfigStore, TemplateStore};
use crate::types::{
    DiagramKey, EnvDraft, EnvVarId, EnvVariable, SaveCondition, SaveReceipt, StoredDiagram,
    Template, TemplateId, UserId,
};

/// SQLite-backed store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a SQLite database at `path`.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = connect(Location::File(path))?;
        Ok(SqliteStore { conn })
    }

    /// Opens an in-memory SQLite database (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = connect(Location::Memory)?;
        Ok(SqliteStore { conn })
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn graph_columns(graph: &DiagramGraph) -> Result<(String, String), StorageError> {
        let nodes: Vec<&Node> = graph.nodes().collect();
        let edges: Vec<&Edge> = graph.edges().collect();
        Ok((serde_json::to_string(&nodes)?, serde_json::to_string(&edges)?))
    }

    fn graph_from_columns(nodes: &str, edges: &str) -> Result<DiagramGraph, StorageError> {
        let nodes: Vec<Node> = serde_json::from_str(nodes)?;
        let edges: Vec<Edge> = serde_json::from_str(edges)?;
        DiagramGraph::from_parts(nodes, edges).map_err(|e| StorageError::Corrupt {
            reason: e.to_string(),
        })
    }

    fn parse_time(raw: &str) -> Result<DateTime<Utc>, StorageError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| StorageError::Corrupt {
                reason: format!("bad timestamp '{}': {}", raw, e),
            })
    }

    fn parse_kind(raw: &str) -> Result<DiagramKind, StorageError> {
        raw.parse().map_err(|e: archboard_core::UnknownDiagramKind| StorageError::Corrupt {
            reason: e.to_string(),
        })
    }

    fn env_from_row(row: &Row<'_>) -> rusqlite::Result<EnvVariable> {
        Ok(EnvVariable {
            id: EnvVarId(row.get(0)?),
            project_id: ProjectId(row.get(1)?),
            name: row.get(2)?,
            development: row.get(3)?,
            staging: row.get(4)?,
            production: row.get(5)?,
            is_secret: row.get::<_, i64>(6)? != 0,
        })
    }

    fn name_taken(
        conn: &Connection,
        project: &ProjectId,
        name: &str,
        except: Option<&EnvVarId>,
    ) -> Result<bool, StorageError> {
        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM env_config WHERE project_id = ?1 AND name = ?2 AND id IS NOT ?3)",
            params![project.0, name, except.map(|id| id.0.as_str())],
            |row| row.get(0),
        )?;
        Ok(taken)
    }
}

impl DiagramStore for SqliteStore {
    fn load_diagram(&self, key: &DiagramKey) -> Result<Option<StoredDiagram>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT nodes, edges, revision, content_hash, updated_at
                 FROM project_diagrams WHERE project_id = ?1 AND diagram_type = ?2",
                params![key.project.0, key.kind.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((nodes, edges, revision, content_hash, updated_at)) = row else {
            return Ok(None);
        };
        Ok(Some(StoredDiagram {
            graph: Self::graph_from_columns(&nodes, &edges)?,
            revision: revision as u64,
            content_hash,
            updated_at: Self::parse_time(&updated_at)?,
        }))
    }

    fn save_diagram(
        &mut self,
        key: &DiagramKey,
        graph: &DiagramGraph,
        condition: SaveCondition,
    ) -> Result<SaveReceipt, StorageError> {
        let (nodes, edges) = Self::graph_columns(graph)?;
        let content_hash = graph_digest(graph)?;
        let now = Utc::now();
        let stamp = now.to_rfc3339();

        let tx = self.conn.transaction()?;
        let current: Option<i64> = tx
            .query_row(
                "SELECT revision FROM project_diagrams WHERE project_id = ?1 AND diagram_type = ?2",
                params![key.project.0, key.kind.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        condition.check(key, current.map(|r| r as u64))?;
        let revision = current.map_or(1, |r| r + 1);

        tx.execute(
            "INSERT INTO project_diagrams
                 (project_id, diagram_type, nodes, edges, revision, content_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             ON CONFLICT(project_id, diagram_type) DO UPDATE SET
                 nodes = excluded.nodes,
                 edges = excluded.edges,
                 revision = excluded.revision,
                 content_hash = excluded.content_hash,
                 updated_at = excluded.updated_at",
            params![
                key.project.0,
                key.kind.as_str(),
                nodes,
                edges,
                revision,
                content_hash,
                stamp,
            ],
        )?;
        tx.commit()?;

        Ok(SaveReceipt {
            revision: revision as u64,
            content_hash,
            updated_at: now,
        })
    }
}

impl TemplateStore for SqliteStore {
    fn list_templates(
        &self,
        user: &UserId,
        kind: DiagramKind,
    ) -> Result<Vec<Template>, StorageError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, name, diagram_type, nodes, edges, created_at
             FROM diagram_templates
             WHERE user_id = ?1 AND diagram_type = ?2
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map(params![user.0, kind.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (id, name, kind, nodes, edges, created_at) = row?;
            result.push(Template {
                id: TemplateId(id),
                user_id: user.clone(),
                name,
                kind: Self::parse_kind(&kind)?,
                graph: Self::graph_from_columns(&nodes, &edges)?,
                created_at: Self::parse_time(&created_at)?,
            });
        }
        Ok(result)
    }

    fn insert_template(
        &mut self,
        user: &UserId,
        name: &str,
        kind: DiagramKind,
        graph: &DiagramGraph,
    ) -> Result<Template, StorageError> {
        let (nodes, edges) = Self::graph_columns(graph)?;
        let id = TemplateId::generate();
        let created_at = Utc::now();

        self.conn.execute(
            "INSERT INTO diagram_templates (id, user_id, name, diagram_type, nodes, edges, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id.0,
                user.0,
                name,
                kind.as_str(),
                nodes,
                edges,
                created_at.to_rfc3339(),
            ],
        )?;

        Ok(Template {
            id,
            user_id: user.clone(),
            name: name.to_string(),
            kind,
            graph: graph.clone(),
            created_at,
        })
    }

    fn delete_template(&mut self, user: &UserId, id: &TemplateId) -> Result<(), StorageError> {
        let deleted = self.conn.execute(
            "DELETE FROM diagram_templates WHERE id = ?1 AND user_id = ?2",
            params![id.0, user.0],
        )?;
        if deleted == 0 {
            return Err(StorageError::TemplateNotFound(id.to_string()));
        }
        Ok(())
    }
}

impl EnvConfigStore for SqliteStore {
    fn list_env(&self, project: &ProjectId) -> Result<Vec<EnvVariable>, StorageError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, project_id, name, development, staging, production, is_secret
             FROM env_config WHERE project_id = ?1 ORDER BY name",
        )?;
        let rows = stmt.query_map(params![project.0], Self::env_from_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    fn insert_env(
        &mut self,
        project: &ProjectId,
        draft: EnvDraft,
    ) -> Result<EnvVariable, StorageError> {
        let stamp = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        if Self::name_taken(&tx, project, &draft.name, None)? {
            return Err(StorageError::DuplicateName { name: draft.name });
        }
        let var = draft.into_variable(EnvVarId::generate(), project);
        tx.execute(
            "INSERT INTO env_config
                 (id, project_id, name, development, staging, production, is_secret, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                var.id.0,
                project.0,
                var.name,
                var.development,
                var.staging,
                var.production,
                var.is_secret as i64,
                stamp,
            ],
        )?;
        tx.commit()?;
        Ok(var)
    }

    fn update_env(
        &mut self,
        project: &ProjectId,
        id: &EnvVarId,
        draft: EnvDraft,
    ) -> Result<EnvVariable, StorageError> {
        let stamp = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        if Self::name_taken(&tx, project, &draft.name, Some(id))? {
            return Err(StorageError::DuplicateName { name: draft.name });
        }
        let var = draft.into_variable(id.clone(), project);
        let updated = tx.execute(
            "UPDATE env_config
             SET name = ?3, development = ?4, staging = ?5, production = ?6, is_secret = ?7, updated_at = ?8
             WHERE id = ?1 AND project_id = ?2",
            params![
                id.0,
                project.0,
                var.name,
                var.development,
                var.staging,
                var.production,
                var.is_secret as i64,
                stamp,
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::EnvVarNotFound(id.to_string()));
        }
        tx.commit()?;
        Ok(var)
    }

    fn delete_env(&mut self, project: &ProjectId, id: &EnvVarId) -> Result<(), StorageError> {
        let deleted = self.conn.execute(
            "DELETE FROM env_config WHERE id = ?1 AND project_id = ?2",
            params![id.0, project.0],
        )?;
        if deleted == 0 {
            return Err(StorageError::EnvVarNotFound(id.to_string()));
        }
        Ok(())
    }
}
