//! KnowledgeGraph — edge lifecycle and evolution semantics over the edge
//! store.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use engram_core::graph::{EdgeType, KnowledgeEdge, NewEdge};
use engram_core::memory::MemoryStatus;
use engram_core::models::{ChangeKind, DateRange, EntityRelationship, EvolutionEvent};
use engram_core::traits::{IEdgeStorage, IMemoryStorage, MemoryListQuery};
use engram_core::validate;
use engram_core::{EngramError, EngramResult};

use crate::traversal::{IndexedGraph, TraversalNode};

/// Manages the knowledge graph of memory relationships.
pub struct KnowledgeGraph {
    edges: Arc<dyn IEdgeStorage>,
    memories: Arc<dyn IMemoryStorage>,
}

impl KnowledgeGraph {
    pub fn new(edges: Arc<dyn IEdgeStorage>, memories: Arc<dyn IMemoryStorage>) -> Self {
        Self { edges, memories }
    }

    /// Create an edge after validating its shape and endpoints.
    pub fn create_edge(&self, edge: NewEdge) -> EngramResult<KnowledgeEdge> {
        self.validate_edge(&edge)?;
        let created = self.edges.insert(&edge)?;
        info!(
            edge_id = %created.id,
            edge_type = %created.edge_type,
            from = %created.from_id,
            to = %created.to_id,
            "edge created"
        );
        Ok(created)
    }

    /// Upsert variant used by consolidation: collisions update strength and
    /// keep the higher confidence.
    pub fn upsert_edge(&self, edge: NewEdge) -> EngramResult<KnowledgeEdge> {
        self.validate_edge(&edge)?;
        self.edges.upsert(&edge)
    }

    fn validate_edge(&self, edge: &NewEdge) -> EngramResult<()> {
        if edge.is_self_edge() {
            return Err(EngramError::Conflict {
                message: "edge cannot reference the same memory".to_string(),
            });
        }
        validate::unit_interval("strength", edge.strength)?;
        validate::unit_interval("confidence", edge.confidence)?;
        for endpoint in [edge.from_id, edge.to_id] {
            if self.memories.get(edge.user_id, endpoint)?.is_none() {
                return Err(EngramError::not_found("memory", endpoint));
            }
        }
        Ok(())
    }

    /// Materialise LLM-inferred entity relationships as edges between the
    /// memories holding those entities. Self-edges and unknown entities
    /// are skipped; collisions upsert.
    pub fn create_edges_from_relationships(
        &self,
        user_id: Uuid,
        relationships: &[EntityRelationship],
        entity_to_memory: &HashMap<String, Uuid>,
    ) -> EngramResult<Vec<KnowledgeEdge>> {
        let mut created = Vec::new();

        for relationship in relationships {
            let Some(&from_id) = entity_to_memory.get(&relationship.from_entity) else {
                continue;
            };
            let Some(&to_id) = entity_to_memory.get(&relationship.to_entity) else {
                continue;
            };
            if from_id == to_id {
                continue;
            }

            let mut edge = NewEdge::new(user_id, from_id, to_id, relationship.edge_type);
            edge.strength = validate::clamp_unit(relationship.confidence);
            edge.confidence = validate::clamp_unit(relationship.confidence);
            edge.reason = Some(format!(
                "Inferred from entities: {} -> {}",
                relationship.from_entity, relationship.to_entity
            ));
            created.push(self.edges.upsert(&edge)?);
        }

        info!(count = created.len(), "edges created from relationships");
        Ok(created)
    }

    pub fn edges_from(
        &self,
        user_id: Uuid,
        memory_id: Uuid,
        edge_type: Option<EdgeType>,
    ) -> EngramResult<Vec<KnowledgeEdge>> {
        self.edges.edges_from(user_id, memory_id, edge_type)
    }

    pub fn edges_to(
        &self,
        user_id: Uuid,
        memory_id: Uuid,
        edge_type: Option<EdgeType>,
    ) -> EngramResult<Vec<KnowledgeEdge>> {
        self.edges.edges_to(user_id, memory_id, edge_type)
    }

    pub fn all_edges_for(&self, user_id: Uuid, memory_id: Uuid) -> EngramResult<Vec<KnowledgeEdge>> {
        self.edges.all_edges_for(user_id, memory_id)
    }

    /// Load the user's full edge set into a traversal graph.
    pub fn traversal_graph(&self, user_id: Uuid) -> EngramResult<IndexedGraph> {
        Ok(IndexedGraph::build(self.edges.all_for_user(user_id)?))
    }

    /// Memories related to `memory_id` within `depth` hops at or above
    /// `min_strength`.
    pub fn related(
        &self,
        user_id: Uuid,
        memory_id: Uuid,
        depth: usize,
        min_strength: f64,
    ) -> EngramResult<Vec<TraversalNode>> {
        let graph = self.traversal_graph(user_id)?;
        Ok(graph.related(memory_id, depth, min_strength))
    }

    /// Shortest path between two memories, if one exists within
    /// `max_depth` hops.
    pub fn find_path(
        &self,
        user_id: Uuid,
        from: Uuid,
        to: Uuid,
        max_depth: usize,
    ) -> EngramResult<Vec<KnowledgeEdge>> {
        let graph = self.traversal_graph(user_id)?;
        Ok(graph.find_path(from, to, max_depth))
    }

    /// Edges asserting contradiction in either direction.
    pub fn find_contradictions(
        &self,
        user_id: Uuid,
        memory_id: Uuid,
    ) -> EngramResult<Vec<KnowledgeEdge>> {
        let mut edges = self
            .edges
            .edges_from(user_id, memory_id, Some(EdgeType::Contradicts))?;
        edges.extend(
            self.edges
                .edges_to(user_id, memory_id, Some(EdgeType::Contradicts))?,
        );
        Ok(edges)
    }

    /// Mark `old` as superseded by `new`: the old memory transitions to
    /// `superseded` pointing at the replacement, and an evolution edge
    /// records the lineage.
    pub fn mark_superseded(
        &self,
        user_id: Uuid,
        old_id: Uuid,
        new_id: Uuid,
        reason: Option<&str>,
    ) -> EngramResult<KnowledgeEdge> {
        let replacement = self
            .memories
            .get(user_id, new_id)?
            .ok_or_else(|| EngramError::not_found("memory", new_id))?;
        if replacement.status != MemoryStatus::Active {
            return Err(EngramError::validation(format!(
                "superseding memory must be active, found {}",
                replacement.status
            )));
        }

        let mut edge = NewEdge::new(user_id, old_id, new_id, EdgeType::EvolvesInto);
        edge.strength = 1.0;
        edge.confidence = 0.95;
        edge.reason = Some(
            reason
                .unwrap_or("Memory superseded by newer version")
                .to_string(),
        );
        let created = self.upsert_edge(edge)?;

        if !self
            .memories
            .set_status(user_id, old_id, MemoryStatus::Superseded, Some(new_id))?
        {
            return Err(EngramError::not_found("memory", old_id));
        }

        debug!(old = %old_id, new = %new_id, "memory superseded");
        Ok(created)
    }

    /// Remove every edge touching a memory. Returns the removed count.
    pub fn delete_edges_for_memory(&self, user_id: Uuid, memory_id: Uuid) -> EngramResult<u64> {
        let count = self.edges.delete_for_memory(user_id, memory_id)?;
        info!(memory_id = %memory_id, count, "edges deleted for memory");
        Ok(count)
    }

    /// Build the evolution timeline for an entity: every non-deleted
    /// memory mentioning it, in creation order, annotated with how each
    /// mention relates to the previous one.
    pub fn evolution_timeline(
        &self,
        user_id: Uuid,
        entity_name: &str,
        window: DateRange,
    ) -> EngramResult<Vec<EvolutionEvent>> {
        let cutoff = window.cutoff(Utc::now());
        let entity_lower = entity_name.to_lowercase();

        // Superseded rows are the history the timeline exists to show, so
        // they are fetched alongside the living set.
        let mut all = self.memories.list_by_user(
            user_id,
            &MemoryListQuery {
                limit: 500,
                offset: 0,
                memory_type: None,
                status: None,
            },
        )?;
        all.extend(self.memories.list_by_user(
            user_id,
            &MemoryListQuery {
                limit: 500,
                offset: 0,
                memory_type: None,
                status: Some(MemoryStatus::Superseded),
            },
        )?);

        let mut relevant: Vec<_> = all
            .into_iter()
            .filter(|m| {
                let mentions = m
                    .entities
                    .iter()
                    .any(|e| e.to_lowercase().contains(&entity_lower))
                    || m.content.to_lowercase().contains(&entity_lower);
                let in_window = cutoff.map(|c| m.created_at >= c).unwrap_or(true);
                mentions && in_window
            })
            .collect();
        relevant.sort_by_key(|m| m.created_at);

        let mut timeline = Vec::with_capacity(relevant.len());
        let mut previous: Option<&engram_core::memory::Memory> = None;

        for memory in &relevant {
            let change = match previous {
                None => ChangeKind::Introduced,
                Some(prev) => {
                    let evolved = self
                        .edges
                        .edges_from(user_id, prev.id, Some(EdgeType::EvolvesInto))?
                        .iter()
                        .any(|e| e.to_id == memory.id);
                    if evolved {
                        ChangeKind::Evolved
                    } else if memory.importance > prev.importance {
                        ChangeKind::Strengthened
                    } else if memory.importance < prev.importance {
                        ChangeKind::Weakened
                    } else {
                        ChangeKind::Mentioned
                    }
                }
            };

            timeline.push(EvolutionEvent {
                date: memory.created_at,
                memory_id: memory.id,
                content_summary: memory.content_preview().to_string(),
                memory_type: memory.memory_type,
                importance: memory.importance,
                change,
            });
            previous = Some(memory);
        }

        Ok(timeline)
    }
}
