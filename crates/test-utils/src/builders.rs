#![allow(dead_code)]

use batchrun::executor::TranslationError;
use batchrun::job::{CommandSpec, Job};
use batchrun::producer::JobList;

/// Build a `JobList` of `count` jobs named `job-1` .. `job-{count}`.
pub fn numbered_jobs(count: usize) -> JobList {
    JobList::new((1..=count).map(|i| Job::new(format!("job-{i}"))).collect())
}

/// Executor that maps every job to the same trivial command.
///
/// Only useful together with fake runners, which never look at the command.
pub fn echo_executor(job: &Job) -> Result<CommandSpec, TranslationError> {
    Ok(CommandSpec::new("echo").arg(&job.id))
}

/// Executor that refuses to translate the listed job ids.
pub struct FailingExecutor {
    untranslatable: Vec<String>,
}

impl FailingExecutor {
    pub fn new<I, S>(untranslatable: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            untranslatable: untranslatable.into_iter().map(Into::into).collect(),
        }
    }
}

impl batchrun::executor::JobExecutor for FailingExecutor {
    fn build_command(&self, job: &Job) -> Result<CommandSpec, TranslationError> {
        if self.untranslatable.iter().any(|id| id == &job.id) {
            Err(TranslationError(format!(
                "no command known for job {}",
                job.id
            )))
        } else {
            echo_executor(job)
        }
    }
}

/// Producer that yields `good` jobs and then fails, simulating e.g. a
/// directory listing that breaks mid-iteration.
pub struct BrokenProducer {
    remaining: usize,
    next_id: usize,
}

impl BrokenProducer {
    pub fn new(good: usize) -> Self {
        Self {
            remaining: good,
            next_id: 1,
        }
    }
}

impl batchrun::producer::JobProducer for BrokenProducer {
    fn next_job(&mut self) -> anyhow::Result<Option<Job>> {
        if self.remaining == 0 {
            anyhow::bail!("listing failed after {} entries", self.next_id - 1)
        }
        self.remaining -= 1;
        let id = self.next_id;
        self.next_id += 1;
        Ok(Some(Job::new(format!("job-{id}"))))
    }
}
