//! Host-visible job progress for one run.

use crate::submit::{JobProgress, Submitter};

const INDETERMINATE: i32 = -1;
const DONE: i32 = 100;

/// Progress updates are best effort; a failed update is only traced.
pub(crate) struct Job<'a> {
    id: String,
    plugin: &'a str,
    submitter: &'a dyn Submitter,
}

impl<'a> Job<'a> {
    pub(crate) async fn open(
        submitter: &'a dyn Submitter,
        plugin: &'a str,
        label: String,
    ) -> Job<'a> {
        let job = Job {
            id: uuid::Uuid::new_v4().to_string(),
            plugin,
            submitter,
        };
        job.send(label, INDETERMINATE).await;
        job
    }

    pub(crate) async fn update(&self, label: String) {
        self.send(label, INDETERMINATE).await;
    }

    pub(crate) async fn close(self) {
        self.send(String::new(), DONE).await;
    }

    async fn send(&self, label: String, progress: i32) {
        let update = JobProgress {
            id: self.id.clone(),
            label,
            progress,
            plugin: self.plugin.to_string(),
        };
        if let Err(e) = self.submitter.show_job_progress(update).await {
            tracing::warn!(job = %self.id, error = %e, "Failed to report job progress");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submit::MemorySubmitter;

    #[tokio::test]
    async fn test_job_opens_updates_and_closes_under_one_id() {
        let sink = MemorySubmitter::new();
        let job = Job::open(&sink, "Kraken", "Fetching".to_string()).await;
        job.update("Fetched 3".to_string()).await;
        job.close().await;

        let progress = sink.snapshot().progress;
        assert_eq!(progress.len(), 3);
        assert!(progress.iter().all(|p| p.id == progress[0].id));
        assert_eq!(progress[0].progress, -1);
        assert_eq!(progress[1].label, "Fetched 3");
        assert_eq!(progress[2].progress, 100);
        assert_eq!(progress[2].plugin, "Kraken");
    }
}
