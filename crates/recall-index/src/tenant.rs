//! Logical tenant isolation over a shared index.
//!
//! Ids are namespaced as `"<tenant>::<raw_id>"` and every read/write goes
//! through a `tenant_id` metadata filter. Results are re-checked on the way
//! out: a foreign entry aborts the request with `CrossTenantViolation` and
//! is logged as a security event, never silently filtered.

use std::sync::Arc;

use recall_core::error::{EngineError, Result};
use recall_core::predicate::Predicate;
use recall_core::traits::VectorIndex;
use recall_core::types::{IndexEntry, QueryResult};

const SEP: &str = "::";

pub struct TenantScope<I: VectorIndex> {
    inner: Arc<I>,
    tenant_id: String,
}

impl<I: VectorIndex> TenantScope<I> {
    /// Tenant ids must be non-empty and must not contain the namespace
    /// separator, otherwise one tenant could forge another's prefix.
    pub fn new(inner: Arc<I>, tenant_id: impl Into<String>) -> Result<Self> {
        let tenant_id = tenant_id.into();
        if tenant_id.is_empty() {
            return Err(EngineError::InvalidInput("tenant id must not be empty".to_string()));
        }
        if tenant_id.contains(SEP) {
            return Err(EngineError::InvalidInput(format!(
                "tenant id must not contain '{}'",
                SEP
            )));
        }
        Ok(Self { inner, tenant_id })
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    fn qualify(&self, raw_id: &str) -> String {
        format!("{}{}{}", self.tenant_id, SEP, raw_id)
    }

    /// Strip the namespace from an id returned by the inner index. An id
    /// outside this tenant's namespace is a cross-tenant leak.
    fn strip(&self, id: &str) -> Result<String> {
        let prefix = format!("{}{}", self.tenant_id, SEP);
        match id.strip_prefix(&prefix) {
            Some(raw) => Ok(raw.to_string()),
            None => Err(self.violation(id)),
        }
    }

    fn violation(&self, id: &str) -> EngineError {
        tracing::error!(
            tenant = %self.tenant_id,
            id = %id,
            "cross-tenant entry surfaced through tenant scope"
        );
        EngineError::CrossTenantViolation { tenant: self.tenant_id.clone(), id: id.to_string() }
    }

    fn scoped(&self, filter: &Predicate) -> Predicate {
        filter.clone().and(Predicate::eq("tenant_id", self.tenant_id.as_str()))
    }

    fn verify_entry(&self, entry: &IndexEntry) -> Result<()> {
        if entry.tenant_id != self.tenant_id {
            return Err(self.violation(&entry.id));
        }
        Ok(())
    }
}

impl<I: VectorIndex> VectorIndex for TenantScope<I> {
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn upsert(&self, entries: Vec<IndexEntry>) -> Result<()> {
        let mut qualified = Vec::with_capacity(entries.len());
        for mut entry in entries {
            // Writing on behalf of another tenant is a violation, not a
            // silent rewrite.
            if !entry.tenant_id.is_empty() && entry.tenant_id != self.tenant_id {
                return Err(self.violation(&entry.id));
            }
            entry.id = self.qualify(&entry.id);
            entry.tenant_id = self.tenant_id.clone();
            entry
                .metadata
                .insert("tenant_id".to_string(), self.tenant_id.as_str().into());
            qualified.push(entry);
        }
        self.inner.upsert(qualified)
    }

    fn query(&self, vector: &[f32], top_k: usize, filter: &Predicate) -> Result<Vec<QueryResult>> {
        let results = self.inner.query(vector, top_k, &self.scoped(filter))?;
        let mut out = Vec::with_capacity(results.len());
        for mut result in results {
            let tenant = result.metadata.get("tenant_id").and_then(|v| v.as_str());
            if tenant != Some(self.tenant_id.as_str()) {
                return Err(self.violation(&result.id));
            }
            result.id = self.strip(&result.id)?;
            out.push(result);
        }
        Ok(out)
    }

    fn fetch(&self, id: &str) -> Result<Option<IndexEntry>> {
        let Some(mut entry) = self.inner.fetch(&self.qualify(id))? else {
            return Ok(None);
        };
        self.verify_entry(&entry)?;
        entry.id = self.strip(&entry.id)?;
        Ok(Some(entry))
    }

    fn find_ids(&self, filter: &Predicate) -> Result<Vec<String>> {
        let ids = self.inner.find_ids(&self.scoped(filter))?;
        ids.into_iter().map(|id| self.strip(&id)).collect()
    }

    fn delete(&self, ids: &[String]) -> Result<usize> {
        let qualified: Vec<String> = ids.iter().map(|id| self.qualify(id)).collect();
        self.inner.delete(&qualified)
    }
}
