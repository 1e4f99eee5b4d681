//! In-memory implementation of the store traits.
//!
//! [`InMemoryStore`] is a first-class backend for tests and ephemeral
//! sessions. It keeps identical semantics to the SQLite backend: upsert by
//! key, revision checks, newest-first template listing, unique variable
//! names per project.

use std::collections::HashMap;

use chrono::Utc;

use archboard_core::{DiagramGraph, DiagramKind, ProjectId};

use crate::error::StorageError;
use crate::hash::graph_digest;
use crate::traits::{DiagramStore, EnvConfigStore, TemplateStore};
use crate::types::{
    DiagramKey, EnvDraft, EnvVarId, EnvVariable, SaveCondition, SaveReceipt, StoredDiagram,
    Template, TemplateId, UserId,
};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    diagrams: HashMap<DiagramKey, StoredDiagram>,
    /// Insertion order; listing reverses it.
    templates: Vec<Template>,
    env: Vec<EnvVariable>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore::default()
    }

    fn ensure_unique_name(
        &self,
        project: &ProjectId,
        name: &str,
        except: Option<&EnvVarId>,
    ) -> Result<(), StorageError> {
        let taken = self.env.iter().any(|v| {
            &v.project_id == project && v.name == name && Some(&v.id) != except
        });
        if taken {
            return Err(StorageError::DuplicateName {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

impl DiagramStore for InMemoryStore {
    fn load_diagram(&self, key: &DiagramKey) -> Result<Option<StoredDiagram>, StorageError> {
        Ok(self.diagrams.get(key).cloned())
    }

    fn save_diagram(
        &mut self,
        key: &DiagramKey,
        graph: &DiagramGraph,
        condition: SaveCondition,
    ) -> Result<SaveReceipt, StorageError> {
        let current = self.diagrams.get(key).map(|d| d.revision);
        condition.check(key, current)?;

        let receipt = SaveReceipt {
            revision: current.map_or(1, |r| r + 1),
            content_hash: graph_digest(graph)?,
            updated_at: Utc::now(),
        };
        self.diagrams.insert(
            key.clone(),
            StoredDiagram {
                graph: graph.clone(),
                revision: receipt.revision,
                content_hash: receipt.content_hash.clone(),
                updated_at: receipt.updated_at,
            },
        );
        Ok(receipt)
    }
}

impl TemplateStore for InMemoryStore {
    fn list_templates(
        &self,
        user: &UserId,
        kind: DiagramKind,
    ) -> Result<Vec<Template>, StorageError> {
        Ok(self
            .templates
            .iter()
            .rev()
            .filter(|t| &t.user_id == user && t.kind == kind)
            .cloned()
            .collect())
    }

    fn insert_template(
        &mut self,
        user: &UserId,
        name: &str,
        kind: DiagramKind,
        graph: &DiagramGraph,
    ) -> Result<Template, StorageError> {
        let template = Template {
            id: TemplateId::generate(),
            user_id: user.clone(),
            name: name.to_string(),
            kind,
            graph: graph.clone(),
            created_at: Utc::now(),
        };
        self.templates.push(template.clone());
        Ok(template)
    }

    fn delete_template(&mut self, user: &UserId, id: &TemplateId) -> Result<(), StorageError> {
        let pos = self
            .templates
            .iter()
            .position(|t| &t.id == id && &t.user_id == user)
            .ok_or_else(|| StorageError::TemplateNotFound(id.to_string()))?;
        self.templates.remove(pos);
        Ok(())
    }
}

impl EnvConfigStore for InMemoryStore {
    fn list_env(&self, project: &ProjectId) -> Result<Vec<EnvVariable>, StorageError> {
        let mut vars: Vec<EnvVariable> = self
            .env
            .iter()
            .filter(|v| &v.project_id == project)
            .cloned()
            .collect();
        vars.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(vars)
    }

    fn insert_env(
        &mut self,
        project: &ProjectId,
        draft: EnvDraft,
    ) -> Result<EnvVariable, StorageError> {
        self.ensure_unique_name(project, &draft.name, None)?;
        let var = draft.into_variable(EnvVarId::generate(), project);
        self.env.push(var.clone());
        Ok(var)
    }

    fn update_env(
        &mut self,
        project: &ProjectId,
        id: &EnvVarId,
        draft: EnvDraft,
    ) -> Result<EnvVariable, StorageError> {
        self.ensure_unique_name(project, &draft.name, Some(id))?;
        let slot = self
            .env
            .iter_mut()
            .find(|v| &v.id == id && &v.project_id == project)
            .ok_or_else(|| StorageError::EnvVarNotFound(id.to_string()))?;
        *slot = draft.into_variable(id.clone(), project);
        Ok(slot.clone())
    }

    fn delete_env(&mut self, project: &ProjectId, id: &EnvVarId) -> Result<(), StorageError> {
        let pos = self
            .env
            .iter()
            .position(|v| &v.id == id && &v.project_id == project)
            .ok_or_else(|| StorageError::EnvVarNotFound(id.to_string()))?;
        self.env.remove(pos);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archboard_core::{NodeKind, Position};

    fn key() -> DiagramKey {
        DiagramKey::new("p1", DiagramKind::Architecture)
    }

    fn sample_graph() -> DiagramGraph {
        let mut graph = DiagramGraph::new();
        let a = graph.add_node(NodeKind::Client, Position::new(0.0, 0.0));
        let b = graph.add_node(NodeKind::Server, Position::new(1.0, 0.0));
        graph
            .connect(&a, &b, None, None, DiagramKind::Architecture)
            .unwrap();
        graph
    }

    #[test]
    fn load_of_unsaved_key_is_none() {
        let store = InMemoryStore::new();
        assert!(store.load_diagram(&key()).unwrap().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut store = InMemoryStore::new();
        let graph = sample_graph();
        let receipt = store
            .save_diagram(&key(), &graph, SaveCondition::Absent)
            .unwrap();
        assert_eq!(receipt.revision, 1);

        let loaded = store.load_diagram(&key()).unwrap().unwrap();
        assert_eq!(loaded.graph, graph);
        assert_eq!(loaded.revision, 1);
        assert_eq!(loaded.content_hash, receipt.content_hash);
    }

    #[test]
    fn stale_revision_is_rejected() {
        let mut store = InMemoryStore::new();
        let graph = sample_graph();
        store.save_diagram(&key(), &graph, SaveCondition::Absent).unwrap();
        store
            .save_diagram(&key(), &DiagramGraph::new(), SaveCondition::Revision(1))
            .unwrap();
        let err = store
            .save_diagram(&key(), &graph, SaveCondition::Revision(1))
            .unwrap_err();
        assert!(matches!(err, StorageError::RevisionConflict { .. }));
        assert!(store.load_diagram(&key()).unwrap().unwrap().graph.is_empty());
    }

    #[test]
    fn templates_are_scoped_by_user_and_kind() {
        let mut store = InMemoryStore::new();
        let alice = UserId("alice".into());
        let bob = UserId("bob".into());
        let graph = sample_graph();
        store.insert_template(&alice, "first", DiagramKind::Database, &graph).unwrap();
        store.insert_template(&alice, "second", DiagramKind::Database, &graph).unwrap();
        store.insert_template(&alice, "other", DiagramKind::Frontend, &graph).unwrap();
        store.insert_template(&bob, "bob's", DiagramKind::Database, &graph).unwrap();

        let names: Vec<String> = store
            .list_templates(&alice, DiagramKind::Database)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["second".to_string(), "first".to_string()]);
    }

    #[test]
    fn delete_template_requires_ownership() {
        let mut store = InMemoryStore::new();
        let alice = UserId("alice".into());
        let t = store
            .insert_template(&alice, "mine", DiagramKind::Database, &DiagramGraph::new())
            .unwrap();
        assert!(matches!(
            store.delete_template(&UserId("mallory".into()), &t.id),
            Err(StorageError::TemplateNotFound(_))
        ));
        store.delete_template(&alice, &t.id).unwrap();
        assert!(store.list_templates(&alice, DiagramKind::Database).unwrap().is_empty());
    }

    #[test]
    fn env_names_are_unique_per_project() {
        let mut store = InMemoryStore::new();
        let p1 = ProjectId::from("p1");
        let p2 = ProjectId::from("p2");
        let draft = EnvDraft {
            name: "DATABASE_URL".into(),
            ..EnvDraft::default()
        };
        let var = store.insert_env(&p1, draft.clone()).unwrap();
        assert!(matches!(
            store.insert_env(&p1, draft.clone()),
            Err(StorageError::DuplicateName { .. })
        ));
        store.insert_env(&p2, draft.clone()).unwrap();

        let updated = store
            .update_env(
                &p1,
                &var.id,
                EnvDraft {
                    production: "postgres://prod".into(),
                    is_secret: true,
                    ..draft
                },
            )
            .unwrap();
        assert!(updated.is_secret);
        assert_eq!(store.list_env(&p1).unwrap(), vec![updated]);

        store.delete_env(&p1, &var.id).unwrap();
        assert!(store.list_env(&p1).unwrap().is_empty());
        assert_eq!(store.list_env(&p2).unwrap().len(), 1);
    }
}
