use crate::domain::{Metadata, State, StatesPage, Twin, TwinId, TwinsPage};
use crate::error::{TwinError, TwinResult};
use crate::ports::{StateRepository, TwinRepository};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

fn page_bounds(total: usize, offset: u64, limit: u64) -> (usize, usize) {
    let start = usize::try_from(offset).unwrap_or(usize::MAX).min(total);
    let len = usize::try_from(limit).unwrap_or(usize::MAX);
    (start, start.saturating_add(len).min(total))
}

fn metadata_matches(stored: &Metadata, filter: &Metadata) -> bool {
    filter
        .iter()
        .all(|(key, value)| stored.get(key) == Some(value))
}

/// In-memory implementation of TwinRepository
///
/// Writes are serialized behind one lock, which gives per-id atomicity
/// for free.
#[derive(Default)]
pub struct InMemoryTwinRepository {
    twins: RwLock<HashMap<TwinId, Twin>>,
}

impl InMemoryTwinRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.twins.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.twins.read().is_empty()
    }
}

#[async_trait]
impl TwinRepository for InMemoryTwinRepository {
    async fn save(&self, twin: Twin) -> TwinResult<TwinId> {
        let mut twins = self.twins.write();
        if twins.contains_key(&twin.id) {
            return Err(TwinError::Conflict);
        }
        let id = twin.id.clone();
        twins.insert(id.clone(), twin);
        Ok(id)
    }

    async fn update(&self, twin: Twin) -> TwinResult<()> {
        let mut twins = self.twins.write();
        let stored = twins.get_mut(&twin.id).ok_or(TwinError::NotFound)?;
        *stored = twin;
        Ok(())
    }

    async fn retrieve_by_id(&self, id: &str) -> TwinResult<Twin> {
        self.twins.read().get(id).cloned().ok_or(TwinError::NotFound)
    }

    async fn retrieve_by_thing(&self, thing_id: &str) -> TwinResult<Twin> {
        // Most recently created wins when several twins claim the thing
        self.twins
            .read()
            .values()
            .filter(|twin| twin.thing_id == thing_id)
            .max_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)))
            .cloned()
            .ok_or(TwinError::NotFound)
    }

    async fn retrieve_all(
        &self,
        owner: &str,
        offset: u64,
        limit: u64,
        name: &str,
        metadata: &Metadata,
    ) -> TwinResult<TwinsPage> {
        let twins = self.twins.read();
        let mut matching: Vec<&Twin> = twins
            .values()
            .filter(|twin| twin.owner == owner)
            .filter(|twin| name.is_empty() || twin.name == name)
            .filter(|twin| metadata_matches(&twin.metadata, metadata))
            .collect();
        matching.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));

        let (start, end) = page_bounds(matching.len(), offset, limit);
        Ok(TwinsPage {
            total: matching.len() as u64,
            offset,
            limit,
            twins: matching[start..end].iter().map(|twin| (*twin).clone()).collect(),
        })
    }

    async fn remove(&self, id: &str) -> TwinResult<()> {
        self.twins.write().remove(id);
        Ok(())
    }
}

/// In-memory implementation of StateRepository, one append log per twin
#[derive(Default)]
pub struct InMemoryStateRepository {
    states: RwLock<HashMap<TwinId, Vec<State>>>,
}

impl InMemoryStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of states stored for a twin.
    pub fn count(&self, twin_id: &str) -> usize {
        self.states.read().get(twin_id).map_or(0, Vec::len)
    }
}

#[async_trait]
impl StateRepository for InMemoryStateRepository {
    async fn save(&self, state: State) -> TwinResult<()> {
        let mut states = self.states.write();
        let log = states.entry(state.twin_id.clone()).or_default();
        if let Some(last) = log.last() {
            if state.id <= last.id {
                return Err(TwinError::Conflict);
            }
        }
        log.push(state);
        Ok(())
    }

    async fn retrieve_last(&self, twin_id: &str) -> TwinResult<State> {
        Ok(self
            .states
            .read()
            .get(twin_id)
            .and_then(|log| log.last().cloned())
            .unwrap_or_default())
    }

    async fn retrieve_all(&self, offset: u64, limit: u64, twin_id: &str) -> TwinResult<StatesPage> {
        let states = self.states.read();
        let log = states.get(twin_id).map(Vec::as_slice).unwrap_or_default();

        let (start, end) = page_bounds(log.len(), offset, limit);
        Ok(StatesPage {
            total: log.len() as u64,
            offset,
            limit,
            states: log[start..end].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Definition, TwinDraft};
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn twin(id: &str, owner: &str, name: &str, thing: &str) -> Twin {
        let draft = TwinDraft {
            name: name.to_string(),
            thing_id: thing.to_string(),
            metadata: Metadata::new(),
        };
        Twin::new(id.into(), owner.into(), draft, Definition::empty(), Utc::now())
    }

    fn state(twin_id: &str, id: u64) -> State {
        State {
            twin_id: twin_id.to_string(),
            id,
            ..State::default()
        }
    }

    #[tokio::test]
    async fn test_twin_crud() {
        let repo = InMemoryTwinRepository::new();
        let mut stored = twin("t1", "alice", "pump", "thing-1");

        assert_eq!(repo.save(stored.clone()).await.unwrap(), "t1");
        assert!(matches!(repo.save(stored.clone()).await, Err(TwinError::Conflict)));

        stored.name = "valve".to_string();
        repo.update(stored.clone()).await.unwrap();
        assert_eq!(repo.retrieve_by_id("t1").await.unwrap().name, "valve");

        repo.remove("t1").await.unwrap();
        assert!(matches!(repo.retrieve_by_id("t1").await, Err(TwinError::NotFound)));
        assert!(matches!(repo.update(stored).await, Err(TwinError::NotFound)));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_by_thing_prefers_most_recent() {
        let repo = InMemoryTwinRepository::new();
        let mut older = twin("t1", "alice", "old", "thing-1");
        older.created = Utc::now() - Duration::seconds(60);
        repo.save(older).await.unwrap();
        repo.save(twin("t2", "alice", "new", "thing-1")).await.unwrap();

        assert_eq!(repo.retrieve_by_thing("thing-1").await.unwrap().id, "t2");
        assert!(matches!(repo.retrieve_by_thing("thing-9").await, Err(TwinError::NotFound)));
    }

    #[tokio::test]
    async fn test_retrieve_all_filters_and_pages() {
        let repo = InMemoryTwinRepository::new();
        let base = Utc::now();
        for (i, name) in ["pump", "pump", "valve"].iter().enumerate() {
            let mut t = twin(&format!("t{i}"), "alice", name, "");
            t.created = base + Duration::seconds(i as i64);
            if i == 1 {
                t.metadata.insert("site".to_string(), json!("north"));
            }
            repo.save(t).await.unwrap();
        }
        repo.save(twin("t9", "bob", "pump", "")).await.unwrap();

        let all = repo.retrieve_all("alice", 0, 10, "", &Metadata::new()).await.unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.twins.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), ["t0", "t1", "t2"]);

        let pumps = repo.retrieve_all("alice", 1, 10, "pump", &Metadata::new()).await.unwrap();
        assert_eq!(pumps.total, 2);
        assert_eq!(pumps.twins.len(), 1);
        assert_eq!(pumps.twins[0].id, "t1");

        let filter = Metadata::from([("site".to_string(), json!("north"))]);
        let north = repo.retrieve_all("alice", 0, 10, "", &filter).await.unwrap();
        assert_eq!(north.total, 1);

        let beyond = repo.retrieve_all("alice", 10, 10, "", &Metadata::new()).await.unwrap();
        assert!(beyond.twins.is_empty());
        assert_eq!(beyond.total, 3);
    }

    #[tokio::test]
    async fn test_retrieve_last_defaults_to_empty_state() {
        let repo = InMemoryStateRepository::new();
        let last = repo.retrieve_last("t1").await.unwrap();
        assert!(last.is_initial());
    }

    #[tokio::test]
    async fn test_state_log_is_append_only() {
        let repo = InMemoryStateRepository::new();
        repo.save(state("t1", 1)).await.unwrap();
        repo.save(state("t1", 2)).await.unwrap();

        assert!(matches!(repo.save(state("t1", 2)).await, Err(TwinError::Conflict)));
        assert_eq!(repo.retrieve_last("t1").await.unwrap().id, 2);
        assert_eq!(repo.count("t1"), 2);

        let page = repo.retrieve_all(1, 5, "t1").await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.states.len(), 1);
        assert_eq!(page.states[0].id, 2);
    }
}
