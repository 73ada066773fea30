use std::time::Duration;

/// What happened to one discovered job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// A descriptor file exists but no job is registered under its name.
    NotFound,
    /// `run` returned an error or panicked; carries the error description.
    Failed(String),
}

impl RunOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Completed => "completed",
            RunOutcome::NotFound => "not found",
            RunOutcome::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobReport {
    pub name: String,
    pub qualified_name: String,
    pub outcome: RunOutcome,
    pub elapsed: Duration,
}

/// Summary of one runner invocation, in processing order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub jobs: Vec<JobReport>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn completed(&self) -> usize {
        self.count(|o| matches!(o, RunOutcome::Completed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RunOutcome::Failed(_)))
    }

    pub fn not_found(&self) -> usize {
        self.count(|o| matches!(o, RunOutcome::NotFound))
    }

    pub fn outcome_of(&self, name: &str) -> Option<&RunOutcome> {
        self.jobs.iter().find(|j| j.name == name).map(|j| &j.outcome)
    }

    /// True when every discovered job completed.
    pub fn is_clean(&self) -> bool {
        self.completed() == self.jobs.len()
    }

    fn count(&self, predicate: impl Fn(&RunOutcome) -> bool) -> usize {
        self.jobs.iter().filter(|j| predicate(&j.outcome)).count()
    }
}
