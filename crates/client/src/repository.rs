//! Resilient CRUD over one resource.
//!
//! Every operation tries the API first. When the call fails at the transport
//! level the same operation is applied to the local store instead; rejections
//! are returned untouched and the local store is left alone.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{RemoteError, ShimError};
use crate::offline::OfflineMode;
use crate::record::Record;
use crate::remote::{ApiRequest, Remote, fetch};
use crate::store::MockDb;

/// Run `remote`; on a transport failure mark `resource` offline and run
/// `local` instead.
pub(crate) async fn with_fallback<T, Fut, L>(
    offline: &OfflineMode,
    resource: &'static str,
    op: &'static str,
    remote: Fut,
    local: L,
) -> Result<T, ShimError>
where
    Fut: Future<Output = Result<T, RemoteError>>,
    L: FnOnce() -> Result<T, ShimError>,
{
    match remote.await {
        Ok(value) => Ok(value),
        Err(err) if err.is_transport() => {
            tracing::warn!(resource, op, error = %err, "remote call failed; serving from local store");
            offline.set_offline(resource);
            local()
        }
        Err(err) => {
            tracing::debug!(resource, op, error = %err, "remote call rejected; propagating");
            Err(err.into())
        }
    }
}

pub struct ResilientRepository<R> {
    remote: Arc<dyn Remote>,
    db: Arc<MockDb>,
    offline: Arc<OfflineMode>,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for ResilientRepository<R> {
    fn clone(&self) -> Self {
        Self {
            remote: self.remote.clone(),
            db: self.db.clone(),
            offline: self.offline.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: Record> ResilientRepository<R> {
    pub fn new(remote: Arc<dyn Remote>, db: Arc<MockDb>, offline: Arc<OfflineMode>) -> Self {
        Self {
            remote,
            db,
            offline,
            _record: PhantomData,
        }
    }

    fn item_path(id: R::Id) -> String {
        format!("{}/{}", R::RESOURCE, id)
    }

    pub async fn list(&self, filter: &R::Filter) -> Result<Vec<R>, ShimError> {
        let request = ApiRequest::get(R::RESOURCE).with_query(R::query(filter));
        with_fallback(
            &self.offline,
            R::RESOURCE,
            "list",
            fetch(self.remote.as_ref(), request),
            || {
                Ok(R::store(&self.db)
                    .snapshot()
                    .into_iter()
                    .filter(|r| r.matches(filter))
                    .collect())
            },
        )
        .await
    }

    pub async fn get(&self, id: R::Id) -> Result<R, ShimError> {
        let request = ApiRequest::get(Self::item_path(id));
        with_fallback(
            &self.offline,
            R::RESOURCE,
            "get",
            fetch(self.remote.as_ref(), request),
            || {
                let raw: u64 = id.into();
                let store = R::store(&self.db);
                store
                    .find(raw)
                    .ok_or_else(|| formadmin_core::DomainError::not_found(store.entity(), raw).into())
            },
        )
        .await
    }

    pub async fn create(&self, draft: R::Draft) -> Result<R, ShimError> {
        let request = ApiRequest::post(R::RESOURCE).with_json(&draft)?;
        with_fallback(
            &self.offline,
            R::RESOURCE,
            "create",
            fetch(self.remote.as_ref(), request),
            || {
                R::validate_draft(&draft)?;
                let db = self.db.as_ref();
                let created = R::store(db).insert_with(|id| R::materialize(id, draft, db));
                tracing::debug!(resource = R::RESOURCE, id = created.key(), "created locally");
                Ok(created)
            },
        )
        .await
    }

    pub async fn update(&self, id: R::Id, patch: R::Patch) -> Result<R, ShimError> {
        let request = ApiRequest::put(Self::item_path(id)).with_json(&patch)?;
        with_fallback(
            &self.offline,
            R::RESOURCE,
            "update",
            fetch(self.remote.as_ref(), request),
            || {
                let db = self.db.as_ref();
                R::store(db).update(id.into(), |record: &mut R| {
                    record.validate_patch(&patch)?;
                    record.merge(&patch, db);
                    Ok::<(), ShimError>(())
                })
            },
        )
        .await
    }

    /// Delete by id. Deleting an id the local store does not hold succeeds.
    pub async fn delete(&self, id: R::Id) -> Result<(), ShimError> {
        let request = ApiRequest::delete(Self::item_path(id));
        let remote = self.remote.as_ref();
        with_fallback(
            &self.offline,
            R::RESOURCE,
            "delete",
            async move { remote.send(request).await.map(|_| ()) },
            || {
                let raw: u64 = id.into();
                if R::store(&self.db).remove(raw) {
                    R::on_local_delete(raw, &self.db);
                }
                Ok(())
            },
        )
        .await
    }
}
