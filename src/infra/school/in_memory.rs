// In-memory implementation of SchoolStore.
//
// School data is deliberately not persisted: the Discord roles are the durable
// record, and the model is rebuilt as commands run.

use crate::core::school::{School, SchoolError, SchoolStore};
use async_trait::async_trait;
use dashmap::DashMap;

/// Maps guild_id -> School.
pub struct InMemorySchoolStore {
    schools: DashMap<u64, School>,
}

impl InMemorySchoolStore {
    pub fn new() -> Self {
        Self {
            schools: DashMap::new(),
        }
    }
}

impl Default for InMemorySchoolStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SchoolStore for InMemorySchoolStore {
    async fn load(&self, guild_id: u64) -> Result<Option<School>, SchoolError> {
        Ok(self.schools.get(&guild_id).map(|entry| entry.clone()))
    }

    async fn save(&self, school: School) -> Result<(), SchoolError> {
        self.schools.insert(school.guild_id, school);
        Ok(())
    }

    async fn remove(&self, guild_id: u64) -> Result<bool, SchoolError> {
        Ok(self.schools.remove(&guild_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemorySchoolStore::new();
        assert!(store.load(1).await.unwrap().is_none());

        store.save(School::new(1, "One")).await.unwrap();
        store.save(School::new(2, "Two")).await.unwrap();

        let school = store.load(1).await.unwrap().unwrap();
        assert_eq!(school.name, "One");

        assert!(store.remove(1).await.unwrap());
        assert!(store.load(1).await.unwrap().is_none());
        assert!(store.load(2).await.unwrap().is_some());
    }
}
