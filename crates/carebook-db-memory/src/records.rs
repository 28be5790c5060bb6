use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use carebook_storage::{Embed, Filter, Query, RecordStore, StorageError};
use papaya::HashMap as PapayaHashMap;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::faults::{FailPoint, Faults};
use crate::ordering::compare_rows;

pub type StorageKey = String; // Format: "collection/id"

fn make_storage_key(collection: &str, id: &str) -> StorageKey {
    format!("{collection}/{id}")
}

/// Value the store fills in when an inserted row leaves a column unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generated {
    /// Random v4 UUID string.
    Uuid,
    /// Current time as an RFC 3339 string.
    Now,
}

impl Generated {
    fn produce(&self) -> Value {
        match self {
            Generated::Uuid => Value::String(uuid::Uuid::new_v4().to_string()),
            Generated::Now => Value::String(
                OffsetDateTime::now_utc()
                    .format(&Rfc3339)
                    .unwrap_or_default(),
            ),
        }
    }
}

/// A remote procedure served by the in-memory store.
pub type Procedure =
    Arc<dyn Fn(&InMemoryRecordStore, &Value) -> Result<Value, StorageError> + Send + Sync>;

#[derive(Debug, Clone)]
struct ForeignKey {
    column: String,
    target: String,
}

#[derive(Debug, Clone)]
struct StoredRow {
    /// Insertion sequence, the default order of `select`.
    seq: u64,
    row: Value,
}

/// In-memory record store using papaya lock-free HashMap.
///
/// Rows are JSON objects keyed by their `id` column, which is generated as a
/// UUID when the inserted row has none. Schema behaviour (generated columns,
/// foreign keys, procedures) is configured with the `with_*` builders before
/// the store is shared.
pub struct InMemoryRecordStore {
    data: Arc<PapayaHashMap<StorageKey, StoredRow>>,
    sequence: AtomicU64,
    generated: HashMap<String, Vec<(String, Generated)>>,
    foreign_keys: HashMap<String, Vec<ForeignKey>>,
    procedures: HashMap<String, Procedure>,
    faults: Faults,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InMemoryRecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRecordStore")
            .field("rows", &self.data.len())
            .field("generated", &self.generated)
            .field("foreign_keys", &self.foreign_keys)
            .field("procedures", &self.procedures.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl InMemoryRecordStore {
    /// Creates an empty store with no schema behaviour.
    pub fn new() -> Self {
        Self {
            data: Arc::new(PapayaHashMap::new()),
            sequence: AtomicU64::new(1),
            generated: HashMap::new(),
            foreign_keys: HashMap::new(),
            procedures: HashMap::new(),
            faults: Faults::default(),
        }
    }

    /// Fills `column` of inserted `collection` rows when it is missing or null.
    pub fn with_generated(
        mut self,
        collection: impl Into<String>,
        column: impl Into<String>,
        generated: Generated,
    ) -> Self {
        self.generated
            .entry(collection.into())
            .or_default()
            .push((column.into(), generated));
        self
    }

    /// Requires `collection.column` to name an existing row of `target` on
    /// insert and update.
    pub fn with_foreign_key(
        mut self,
        collection: impl Into<String>,
        column: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.foreign_keys
            .entry(collection.into())
            .or_default()
            .push(ForeignKey {
                column: column.into(),
                target: target.into(),
            });
        self
    }

    pub fn with_procedure(mut self, name: impl Into<String>, procedure: Procedure) -> Self {
        self.procedures.insert(name.into(), procedure);
        self
    }

    /// Registers a procedure that adds one to `collection.column` on the row
    /// whose id is passed as the `id_arg` argument.
    pub fn with_counter_procedure(
        self,
        name: impl Into<String>,
        collection: impl Into<String>,
        id_arg: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        let collection = collection.into();
        let id_arg = id_arg.into();
        let column = column.into();
        let procedure: Procedure = Arc::new(move |store, args| {
            let id = args
                .get(&id_arg)
                .and_then(Value::as_str)
                .ok_or_else(|| StorageError::invalid_record(format!("missing argument {id_arg}")))?;
            store.increment(&collection, id, &column)?;
            Ok(Value::Null)
        });
        self.with_procedure(name, procedure)
    }

    /// Makes every call matching `point` fail until cleared.
    pub fn fail_on(&self, point: FailPoint) {
        self.faults.arm(point);
    }

    pub fn clear_fault(&self, point: &FailPoint) {
        self.faults.disarm(point);
    }

    pub fn clear_faults(&self) {
        self.faults.clear();
    }

    /// Reads a row directly, bypassing fault injection.
    pub fn row(&self, collection: &str, id: &str) -> Option<Value> {
        let key = make_storage_key(collection, id);
        self.data.pin().get(&key).map(|stored| stored.row.clone())
    }

    /// All rows of a collection in insertion order, bypassing fault injection.
    pub fn rows(&self, collection: &str) -> Vec<Value> {
        let mut stored = self.collect(collection, &[]);
        stored.sort_by_key(|s| s.seq);
        stored.into_iter().map(|s| s.row).collect()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collect(collection, &[]).len()
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn collect(&self, collection: &str, filters: &[Filter]) -> Vec<StoredRow> {
        let prefix = format!("{collection}/");
        let guard = self.data.pin();
        guard
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .filter(|(_, stored)| filters.iter().all(|f| matches_filter(&stored.row, f)))
            .map(|(_, stored)| stored.clone())
            .collect()
    }

    fn increment(&self, collection: &str, id: &str, column: &str) -> Result<(), StorageError> {
        let key = make_storage_key(collection, id);
        let guard = self.data.pin();
        let column = column.to_string();
        guard
            .update(key, |stored| {
                let mut next = stored.clone();
                let current = next.row.get(&column).and_then(Value::as_i64).unwrap_or(0);
                if let Some(obj) = next.row.as_object_mut() {
                    obj.insert(column.clone(), Value::from(current + 1));
                }
                next
            })
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(collection, id))
    }

    fn check_foreign_keys(
        &self,
        collection: &str,
        row: &Map<String, Value>,
    ) -> Result<(), StorageError> {
        let Some(keys) = self.foreign_keys.get(collection) else {
            return Ok(());
        };
        let guard = self.data.pin();
        for fk in keys {
            let Some(value) = row.get(&fk.column).filter(|v| !v.is_null()) else {
                continue;
            };
            let id = value_as_key(value);
            if !guard.contains_key(&make_storage_key(&fk.target, &id)) {
                return Err(StorageError::constraint(format!(
                    "{collection}.{} references missing {} row {id}",
                    fk.column, fk.target
                )));
            }
        }
        Ok(())
    }

    fn attach_embed(&self, row: &mut Value, embed: &Embed) {
        let nested = row
            .get(&embed.foreign_key)
            .filter(|v| !v.is_null())
            .and_then(|fk| self.row(&embed.collection, &value_as_key(fk)))
            .map(|target| project(&target, &embed.columns))
            .unwrap_or(Value::Null);
        if let Some(obj) = row.as_object_mut() {
            obj.insert(embed.collection.clone(), nested);
        }
    }
}

fn value_as_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches_filter(row: &Value, filter: &Filter) -> bool {
    match row.get(&filter.column) {
        Some(Value::Null) | None => false,
        Some(value) => value_as_key(value) == filter.value,
    }
}

fn project(row: &Value, columns: &[String]) -> Value {
    if columns.iter().any(|c| c == "*") {
        return row.clone();
    }
    let projected: Map<String, Value> = columns
        .iter()
        .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
        .collect();
    Value::Object(projected)
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>, StorageError> {
    value
        .as_object()
        .ok_or_else(|| StorageError::invalid_record(format!("{what} must be a JSON object")))
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, StorageError> {
        self.faults.check(FailPoint::select(&query.collection))?;

        let mut stored = self.collect(&query.collection, &query.filters);
        stored.sort_by_key(|s| s.seq);
        stored.sort_by(|a, b| compare_rows(&a.row, &b.row, &query.order));

        let mut rows: Vec<Value> = stored.into_iter().map(|s| s.row).collect();
        if let Some(embed) = &query.embed {
            for row in &mut rows {
                self.attach_embed(row, embed);
            }
        }
        Ok(rows)
    }

    async fn select_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Value>, StorageError> {
        self.faults.check(FailPoint::select_by_id(collection))?;
        Ok(self.row(collection, id))
    }

    async fn insert(&self, collection: &str, row: &Value) -> Result<Value, StorageError> {
        self.faults.check(FailPoint::insert(collection))?;

        let mut obj = as_object(row, "inserted row")?.clone();
        if let Some(columns) = self.generated.get(collection) {
            for (column, generated) in columns {
                if obj.get(column).is_none_or(Value::is_null) {
                    obj.insert(column.clone(), generated.produce());
                }
            }
        }
        let id = match obj.get("id").filter(|v| !v.is_null()) {
            Some(id) => value_as_key(id),
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                obj.insert("id".into(), Value::String(id.clone()));
                id
            }
        };
        self.check_foreign_keys(collection, &obj)?;

        let row = Value::Object(obj);
        let stored = StoredRow {
            seq: self.sequence.fetch_add(1, Ordering::SeqCst),
            row: row.clone(),
        };
        let guard = self.data.pin();
        if guard.try_insert(make_storage_key(collection, &id), stored).is_err() {
            return Err(StorageError::already_exists(
                collection,
                format!("duplicate id {id}"),
            ));
        }
        tracing::debug!(collection, id = %id, "in-memory insert");
        Ok(row)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        changes: &Value,
    ) -> Result<Option<Value>, StorageError> {
        self.faults.check(FailPoint::update(collection))?;

        let mut changes = as_object(changes, "update payload")?.clone();
        // The primary key is immutable.
        changes.remove("id");
        self.check_foreign_keys(collection, &changes)?;

        let key = make_storage_key(collection, id);
        let guard = self.data.pin();
        let updated = guard.update(key, |stored| {
            let mut next = stored.clone();
            if let Some(obj) = next.row.as_object_mut() {
                for (column, value) in &changes {
                    obj.insert(column.clone(), value.clone());
                }
            }
            next
        });
        Ok(updated.map(|stored| stored.row.clone()))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Value>, StorageError> {
        self.faults.check(FailPoint::delete(collection))?;

        let key = make_storage_key(collection, id);
        let guard = self.data.pin();
        Ok(guard.remove(&key).map(|stored| stored.row.clone()))
    }

    async fn call(&self, procedure: &str, args: &Value) -> Result<Value, StorageError> {
        self.faults.check(FailPoint::call(procedure))?;

        let handler = self
            .procedures
            .get(procedure)
            .ok_or_else(|| StorageError::not_found("rpc", procedure))?;
        handler(self, args)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
