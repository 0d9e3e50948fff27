//! Scripted [`Remote`] double for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RemoteError;
use crate::remote::{ApiRequest, Remote};

/// Answers queued responses in order, then repeats a default answer.
pub(crate) struct ScriptedRemote {
    queued: Mutex<VecDeque<Result<Value, RemoteError>>>,
    default: Result<Value, RemoteError>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedRemote {
    pub(crate) fn always(result: Result<Value, RemoteError>) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            default: result,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails as if the backend were down.
    pub(crate) fn unreachable() -> Self {
        Self::always(Err(RemoteError::Network("connection refused".to_string())))
    }

    pub(crate) fn then(self, result: Result<Value, RemoteError>) -> Self {
        self.queued.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Remote for ScriptedRemote {
    async fn send(&self, request: ApiRequest) -> Result<Value, RemoteError> {
        self.requests.lock().unwrap().push(request);
        let next = self.queued.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.default.clone())
    }
}
