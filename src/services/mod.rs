//! Business logic services

pub mod catalog;
pub mod lending;

use crate::{policy::LendingRules, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub lending: lending::LendingService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, rules: LendingRules) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            lending: lending::LendingService::new(repository, rules),
        }
    }
}
