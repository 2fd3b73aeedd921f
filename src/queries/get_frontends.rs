use crate::domain::Frontend;
use crate::error::ProxyError;
use crate::interfaces::FrontendRepository;
use std::sync::Arc;

/// Read-only query returning the full description of every frontend in the
/// catalog. Unlike the reconciliation loop this surface is caller-facing:
/// the first repository failure aborts and is returned.
pub struct Query {
    repository: Arc<dyn FrontendRepository>,
}

impl Query {
    pub fn new(repository: Option<Arc<dyn FrontendRepository>>) -> Result<Self, ProxyError> {
        Ok(Self {
            repository: repository.ok_or(ProxyError::FrontendRepositoryMissing)?,
        })
    }

    pub async fn execute(&self) -> Result<Vec<Frontend>, ProxyError> {
        let names = self.repository.list_frontends().await?;

        let mut frontends = Vec::with_capacity(names.len());
        for name in names {
            frontends.push(self.repository.describe_frontend(&name).await?);
        }

        Ok(frontends)
    }
}
