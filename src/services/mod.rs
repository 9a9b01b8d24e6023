//! Business logic services

pub mod catalog;
pub mod loans;
pub mod sessions;
pub mod users;

use std::sync::Arc;

use crate::{clock::Clock, config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub users: users::UsersService,
    pub sessions: Arc<dyn sessions::SessionStore>,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        sessions: Arc<dyn sessions::SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone(), clock.clone()),
            loans: loans::LoansService::new(repository.clone(), clock),
            users: users::UsersService::new(repository, auth_config),
            sessions,
        }
    }
}
