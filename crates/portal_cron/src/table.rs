//! Static name -> constructor table that replaces runtime class lookup.

use crate::context::JobContext;
use crate::job::CronJob;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Builds a fresh job instance for one run.
pub type JobConstructor = Arc<dyn Fn(&JobContext) -> Box<dyn CronJob> + Send + Sync>;

/// Every job the runner can instantiate, keyed by bare job name.
///
/// Each job module exposes a `register` function that adds itself here, so
/// adding a job means writing the module, calling its `register` from
/// [`crate::jobs::register_builtin`], and dropping a descriptor file in the
/// jobs directory.
#[derive(Default, Clone)]
pub struct JobTable {
    constructors: BTreeMap<String, JobConstructor>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constructor under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: &str, constructor: F) -> &mut Self
    where
        F: Fn(&JobContext) -> Box<dyn CronJob> + Send + Sync + 'static,
    {
        if self
            .constructors
            .insert(name.to_string(), Arc::new(constructor))
            .is_some()
        {
            warn!("Job {} registered twice, keeping the last constructor", name);
        }
        self
    }

    /// Builds the job called `name`, or `None` when nothing is registered
    /// under that name.
    pub fn instantiate(&self, name: &str, ctx: &JobContext) -> Option<Box<dyn CronJob>> {
        self.constructors.get(name).map(|constructor| constructor(ctx))
    }

    /// Registered job names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }
}
