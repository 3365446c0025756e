//! External collaborator contract for the scraper business configuration
//! (`spec.md` §1 Out of scope, §4.1), grounded in
//! `orchestrators/scraping/scraper_configuration.get_scrapers_configuration`.
//! This crate never implements scraping business logic; it only needs the
//! set of repositories that configuration names.

use async_trait::async_trait;

use crate::domain::ports::ScraperConfigProvider;

/// A static stand-in for the external scraper configuration service. A
/// production deployment would replace this with a client for whatever
/// actually serves `ScraperConfiguration` (e.g. an HTTP call or a second
/// local file); this crate treats that service as out of scope and wires
/// a fixed module list instead of inventing its wire contract.
pub struct StaticScraperConfigProvider {
    module_list: Vec<String>,
}

impl StaticScraperConfigProvider {
    pub fn new(module_list: Vec<String>) -> Self {
        Self { module_list }
    }
}

#[async_trait]
impl ScraperConfigProvider for StaticScraperConfigProvider {
    async fn module_list(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.module_list.clone())
    }
}
