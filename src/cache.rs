use crate::types::Record;

/// The session's in-memory copy of every known record, in display order.
///
/// Only two mutations exist: a wholesale replace after a reload and a
/// prepend after a successful create.
#[derive(Debug, Default)]
pub struct RecordCache {
    records: Vec<Record>,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replace the whole sequence with the store's current contents.
    pub fn replace_all(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    /// Drop everything. Used when a load fails so stale rows are not shown as fresh.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Prepend a freshly persisted record. It becomes index 0 and the rest keep their order.
    pub fn record_created(&mut self, record: Record) {
        self.records.insert(0, record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordId;

    fn record(id: &str, name: &str) -> Record {
        Record {
            id: Some(RecordId(id.to_string())),
            name: name.to_string(),
            category: "Food".to_string(),
            location: "Main St".to_string(),
            description: None,
        }
    }

    #[test]
    fn created_record_lands_first_on_an_empty_cache() {
        let mut cache = RecordCache::new();
        cache.record_created(record("1", "Joe's Cafe"));
        assert_eq!(cache.records()[0].name, "Joe's Cafe");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn created_record_lands_first_and_others_keep_order() {
        let mut cache = RecordCache::new();
        cache.replace_all(vec![record("1", "A"), record("2", "B"), record("3", "C")]);
        cache.record_created(record("4", "D"));
        let names: Vec<&str> = cache.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["D", "A", "B", "C"]);
    }

    #[test]
    fn replace_and_clear_drop_earlier_rows() {
        let mut cache = RecordCache::new();
        cache.record_created(record("1", "A"));
        cache.replace_all(vec![record("2", "B")]);
        assert_eq!(cache.records()[0].name, "B");
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
