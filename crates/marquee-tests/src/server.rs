//! In-memory server standing in for the admin backend.
//!
//! Implements [`ResourceClient`] over a plain `Vec`, with hooks for the
//! behaviours tests need to script: injected failures, response gating so
//! a call can be held open while assertions run, and per-resource filter,
//! sort, and reorder behaviour.

use async_trait::async_trait;
use marquee_core::params::ListParams;
use marquee_core::{
    EntityId, Error, Ordered, OrderMapping, Page, Record, ResourceClient, Result,
};
use std::cmp::Ordering as CmpOrdering;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{RwLock, Semaphore};
use tracing::debug;

type FilterFn<T> = Arc<dyn Fn(&T, &ListParams) -> bool + Send + Sync>;
type SortFn<T> = Arc<dyn Fn(&T, &T) -> CmpOrdering + Send + Sync>;
type ReorderFn<T> = Arc<dyn Fn(&mut Vec<T>, &OrderMapping) + Send + Sync>;
type GateFilter = Arc<dyn Fn(&CallRecord) -> bool + Send + Sync>;

/// One call the server received, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum CallRecord {
    List(ListParams),
    Get(EntityId),
    Create,
    Update(EntityId),
    Delete(EntityId),
    Reorder,
}

struct Gate {
    semaphore: Arc<Semaphore>,
    applies: GateFilter,
}

/// Handle for releasing calls held at the server gate. Released calls
/// proceed in arrival order.
pub struct ServerGate {
    semaphore: Arc<Semaphore>,
}

impl ServerGate {
    /// Let `n` held calls proceed.
    pub fn release(&self, n: usize) {
        self.semaphore.add_permits(n);
    }

    /// Let every held and future call proceed.
    pub fn open(&self) {
        self.semaphore.add_permits(1_000_000);
    }
}

/// In-memory [`ResourceClient`] for one entity type.
pub struct InMemoryServer<T: Record> {
    records: RwLock<Vec<T>>,
    next_id: AtomicI64,
    fail_next: Mutex<VecDeque<Error>>,
    gate: Mutex<Option<Gate>>,
    calls: Mutex<Vec<CallRecord>>,
    filter: Option<FilterFn<T>>,
    sort: Option<SortFn<T>>,
    reorder: Option<ReorderFn<T>>,
}

impl<T: Record> InMemoryServer<T> {
    pub fn new(seed: Vec<T>) -> Self {
        let next_id = seed.iter().map(|r| r.id().raw()).max().unwrap_or(0) + 1;
        Self {
            records: RwLock::new(seed),
            next_id: AtomicI64::new(next_id),
            fail_next: Mutex::new(VecDeque::new()),
            gate: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            filter: None,
            sort: None,
            reorder: None,
        }
    }

    /// Restrict list results, the way the real backend applies query
    /// parameters.
    pub fn with_filter(
        mut self,
        filter: impl Fn(&T, &ListParams) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Sort list results before pagination.
    pub fn with_sort(
        mut self,
        sort: impl Fn(&T, &T) -> CmpOrdering + Send + Sync + 'static,
    ) -> Self {
        self.sort = Some(Arc::new(sort));
        self
    }

    /// Accept reorder calls by writing mapped positions onto the rows.
    pub fn with_reorder(mut self) -> Self
    where
        T: Ordered,
    {
        self.reorder = Some(Arc::new(|records: &mut Vec<T>, mapping: &OrderMapping| {
            for record in records.iter_mut() {
                if let Some(position) = mapping.position(record.id()) {
                    *record = record.with_order(position);
                }
            }
        }));
        self
    }

    /// Current server-side rows.
    pub async fn records(&self) -> Vec<T> {
        self.records.read().await.clone()
    }

    /// Seed a row after construction, keeping the id counter ahead of it.
    pub async fn insert(&self, record: T) {
        self.next_id.fetch_max(record.id().raw() + 1, Ordering::Relaxed);
        self.records.write().await.push(record);
    }

    /// Fail the next call with `error` (queued; one failure per call).
    pub fn fail_next(&self, error: Error) {
        self.fail_next.lock().unwrap().push_back(error);
    }

    /// Hold every call at the gate until released.
    pub fn hold(&self) -> ServerGate {
        self.hold_where(|_| true)
    }

    /// Hold calls matched by `applies` at the gate; others pass freely.
    pub fn hold_where(
        &self,
        applies: impl Fn(&CallRecord) -> bool + Send + Sync + 'static,
    ) -> ServerGate {
        let semaphore = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(Gate {
            semaphore: Arc::clone(&semaphore),
            applies: Arc::new(applies),
        });
        ServerGate { semaphore }
    }

    /// Calls received so far, in arrival order.
    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// How many list calls arrived so far.
    pub fn list_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| matches!(call, CallRecord::List(_)))
            .count()
    }

    /// How many get calls arrived so far.
    pub fn get_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| matches!(call, CallRecord::Get(_)))
            .count()
    }

    fn note(&self, call: CallRecord) {
        debug!(resource = %T::RESOURCE, ?call, "In-memory server call");
        self.calls.lock().unwrap().push(call);
    }

    async fn gate_wait(&self, call: &CallRecord) -> Result<()> {
        let held = {
            let gate = self.gate.lock().unwrap();
            match &*gate {
                Some(g) if (g.applies)(call) => Some(Arc::clone(&g.semaphore)),
                _ => None,
            }
        };
        if let Some(semaphore) = held {
            match semaphore.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => return Err(Error::Internal("Server gate closed".into())),
            }
        }
        Ok(())
    }

    fn take_failure(&self) -> Result<()> {
        match self.fail_next.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<T: Record> ResourceClient<T> for InMemoryServer<T> {
    async fn list(&self, params: &ListParams) -> Result<Page<T>> {
        let call = CallRecord::List(params.clone());
        self.note(call.clone());
        // Snapshot rows at arrival, so a gated response carries the data
        // the server had when the request came in.
        let mut rows: Vec<T> = {
            let records = self.records.read().await;
            records
                .iter()
                .filter(|record| match &self.filter {
                    Some(filter) => filter(record, params),
                    None => true,
                })
                .cloned()
                .collect()
        };
        if let Some(sort) = &self.sort {
            rows.sort_by(|a, b| sort(a, b));
        }
        let total_count = rows.len() as u64;
        let page_size = params.page_size.max(1) as usize;
        let start = (params.page.max(1) as usize - 1) * page_size;
        let items: Vec<T> = rows.into_iter().skip(start).take(page_size).collect();
        let end = start + items.len();
        let page = Page {
            items,
            total_count,
            has_next: (end as u64) < total_count,
            has_previous: start > 0,
        };

        self.gate_wait(&call).await?;
        self.take_failure()?;
        Ok(page)
    }

    async fn get(&self, id: EntityId) -> Result<T> {
        let call = CallRecord::Get(id);
        self.note(call.clone());
        let found = {
            let records = self.records.read().await;
            records.iter().find(|record| record.id() == id).cloned()
        };
        self.gate_wait(&call).await?;
        self.take_failure()?;
        found.ok_or(Error::NotFound {
            resource: T::RESOURCE,
            id,
        })
    }

    async fn create(&self, draft: &T::Draft) -> Result<T> {
        let call = CallRecord::Create;
        self.note(call.clone());
        self.gate_wait(&call).await?;
        self.take_failure()?;
        let id = EntityId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let record = T::from_draft(draft, id);
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: EntityId, patch: &T::Patch) -> Result<T> {
        let call = CallRecord::Update(id);
        self.note(call.clone());
        self.gate_wait(&call).await?;
        self.take_failure()?;
        let mut records = self.records.write().await;
        match records.iter_mut().find(|record| record.id() == id) {
            Some(slot) => {
                *slot = slot.with_patch(patch);
                Ok(slot.clone())
            }
            None => Err(Error::NotFound {
                resource: T::RESOURCE,
                id,
            }),
        }
    }

    async fn delete(&self, id: EntityId) -> Result<()> {
        let call = CallRecord::Delete(id);
        self.note(call.clone());
        self.gate_wait(&call).await?;
        self.take_failure()?;
        let mut records = self.records.write().await;
        match records.iter().position(|record| record.id() == id) {
            Some(index) => {
                records.remove(index);
                Ok(())
            }
            None => Err(Error::NotFound {
                resource: T::RESOURCE,
                id,
            }),
        }
    }

    async fn reorder(&self, mapping: &OrderMapping) -> Result<()> {
        let call = CallRecord::Reorder;
        self.note(call.clone());
        self.gate_wait(&call).await?;
        self.take_failure()?;
        let Some(reorder) = &self.reorder else {
            return Err(Error::Internal(format!(
                "Reorder not supported for {}",
                T::RESOURCE
            )));
        };
        let mut records = self.records.write().await;
        reorder(&mut records, mapping);
        Ok(())
    }
}
