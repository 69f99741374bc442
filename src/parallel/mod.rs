//! Parallel dispatch of conversion jobs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::processing::{ConversionStatus, Converter, Job, JobOutcome};

/// Runs one converter invocation per job, at most `max_concurrent` at a time
pub struct ParallelProcessor<C> {
    converter: Arc<C>,
    max_concurrent: usize,
    semaphore: Arc<Semaphore>,
    announce: bool,
}

impl<C: Converter> ParallelProcessor<C> {
    /// Create a new parallel processor
    pub fn new(converter: C, max_concurrent: Option<usize>) -> Self {
        // One converter process per logical CPU unless told otherwise
        let max_concurrent = max_concurrent.unwrap_or_else(num_cpus::get).max(1);

        info!("Initializing parallel processor with {} concurrent workers", max_concurrent);

        Self {
            converter: Arc::new(converter),
            max_concurrent,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            announce: true,
        }
    }

    /// Print `Finished processing <name>` as each job returns
    pub fn announce(mut self, announce: bool) -> Self {
        self.announce = announce;
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Run every job and wait for all of them.
    ///
    /// Individual failures never abort the batch; they are recorded in the
    /// returned outcomes. Outcomes are in job order, whatever order the
    /// converters finished in.
    pub async fn process_batch(&self, jobs: Vec<Job>) -> BatchProcessingResult {
        let start_time = Instant::now();
        let total = jobs.len();

        info!("Starting parallel processing of {} files", total);

        let mut tasks: Vec<(PathBuf, PathBuf, JoinHandle<JobOutcome>)> = Vec::with_capacity(total);

        for job in jobs {
            let converter = Arc::clone(&self.converter);
            let semaphore = Arc::clone(&self.semaphore);
            let announce = self.announce;
            let source = job.source().to_path_buf();
            let output = job.output().to_path_buf();

            let task = tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return JobOutcome::new(&job, ConversionStatus::SpawnFailed {
                        message: "worker pool closed".to_string(),
                    });
                };

                let status = converter.convert(&job).await;

                match &status {
                    ConversionStatus::Succeeded => debug!("Converted {:?}", job.source()),
                    ConversionStatus::Failed { exit_code } => {
                        warn!("Converter failed on {:?} (exit code {:?})", job.source(), exit_code)
                    }
                    ConversionStatus::SpawnFailed { message } => {
                        warn!("Could not convert {:?}: {}", job.source(), message)
                    }
                }

                if announce {
                    println!("Finished processing {}", job.display_name());
                }

                JobOutcome::new(&job, status)
            });

            tasks.push((source, output, task));
        }

        let (paths, handles): (Vec<_>, Vec<_>) = tasks
            .into_iter()
            .map(|(source, output, handle)| ((source, output), handle))
            .unzip();

        // Wait for all tasks to complete
        let results = futures::future::join_all(handles).await;

        let outcomes = results
            .into_iter()
            .zip(paths)
            .map(|(result, (source, output))| {
                result.unwrap_or_else(|e| JobOutcome {
                    source,
                    output,
                    status: ConversionStatus::SpawnFailed {
                        message: format!("Task join error: {}", e),
                    },
                })
            })
            .collect();

        let processing_time = start_time.elapsed();
        info!("Parallel processing completed in {:.2}s", processing_time.as_secs_f64());

        BatchProcessingResult {
            outcomes,
            processing_time,
        }
    }
}

/// Result of batch processing operation
#[derive(Debug, Clone)]
pub struct BatchProcessingResult {
    pub outcomes: Vec<JobOutcome>,
    pub processing_time: Duration,
}

impl BatchProcessingResult {
    /// Jobs that ran, whatever their outcome
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.processed() - self.succeeded()
    }

    /// Outcomes whose conversion did not succeed
    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| !o.status.is_success())
    }

    pub fn files_per_second(&self) -> f64 {
        let secs = self.processing_time.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.processed() as f64 / secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NamingConfig, ResizeConfig};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records every job it sees and tracks peak concurrency
    #[derive(Default)]
    struct RecordingConverter {
        seen: Mutex<Vec<PathBuf>>,
        active: AtomicUsize,
        peak: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    impl Converter for RecordingConverter {
        async fn convert(&self, job: &Job) -> ConversionStatus {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(20)).await;
            self.seen.lock().unwrap().push(job.output().to_path_buf());

            self.active.fetch_sub(1, Ordering::SeqCst);

            match self.fail_on {
                Some(name) if job.display_name() == name => ConversionStatus::Failed { exit_code: Some(1) },
                _ => ConversionStatus::Succeeded,
            }
        }

        fn describe(&self, job: &Job) -> String {
            format!("record {}", job.source().display())
        }
    }

    fn jobs(count: usize) -> Vec<Job> {
        let sources: Vec<PathBuf> = (0..count).map(|i| PathBuf::from(format!("img{}.jpg", i))).collect();
        Job::batch(&sources, Path::new("out"), &ResizeConfig::default(), &NamingConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_parallel_processor_creation() {
        let processor = ParallelProcessor::new(RecordingConverter::default(), Some(4));
        assert_eq!(processor.max_concurrent(), 4);

        let auto_processor = ParallelProcessor::new(RecordingConverter::default(), None);
        assert_eq!(auto_processor.max_concurrent(), num_cpus::get().max(1));

        let clamped = ParallelProcessor::new(RecordingConverter::default(), Some(0));
        assert_eq!(clamped.max_concurrent(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_job_runs_exactly_once() {
        let processor = ParallelProcessor::new(RecordingConverter::default(), Some(3)).announce(false);
        let result = processor.process_batch(jobs(10)).await;

        assert_eq!(result.processed(), 10);
        assert_eq!(result.succeeded(), 10);
        assert_eq!(result.failed(), 0);

        let mut seen = processor.converter().seen.lock().unwrap().clone();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let processor = ParallelProcessor::new(RecordingConverter::default(), Some(2)).announce(false);
        processor.process_batch(jobs(8)).await;

        let peak = processor.converter().peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= 2, "peak concurrency was {}", peak);
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_batch() {
        let converter = RecordingConverter {
            fail_on: Some("img1.jpg"),
            ..Default::default()
        };
        let processor = ParallelProcessor::new(converter, Some(2)).announce(false);
        let result = processor.process_batch(jobs(3)).await;

        assert_eq!(result.processed(), 3);
        assert_eq!(result.failed(), 1);
        let failed: Vec<_> = result.failures().map(|o| o.source.clone()).collect();
        assert_eq!(failed, vec![PathBuf::from("img1.jpg")]);
        // Outcomes come back in job order
        assert_eq!(result.outcomes[2].output, PathBuf::from("out/img2_resized.jpg"));
    }

    /// Panics on one named job, succeeds on the rest
    struct PanickingConverter {
        panic_on: &'static str,
    }

    impl Converter for PanickingConverter {
        async fn convert(&self, job: &Job) -> ConversionStatus {
            if job.display_name() == self.panic_on {
                panic!("converter blew up on {}", self.panic_on);
            }
            ConversionStatus::Succeeded
        }

        fn describe(&self, job: &Job) -> String {
            format!("panic {}", job.source().display())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panicking_job_becomes_spawn_failure() {
        let processor = ParallelProcessor::new(PanickingConverter { panic_on: "img2.jpg" }, Some(2))
            .announce(false);
        let result = processor.process_batch(jobs(5)).await;

        assert_eq!(result.processed(), 5);
        assert_eq!(result.succeeded(), 4);

        let failed: Vec<_> = result.failures().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].source, PathBuf::from("img2.jpg"));
        assert_eq!(failed[0].output, PathBuf::from("out/img2_resized.jpg"));
        assert!(matches!(
            &failed[0].status,
            ConversionStatus::SpawnFailed { message } if message.contains("join error")
        ));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let processor = ParallelProcessor::new(RecordingConverter::default(), Some(2));
        let result = processor.process_batch(Vec::new()).await;
        assert_eq!(result.processed(), 0);
        assert_eq!(result.failed(), 0);
        assert!(processor.converter().seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_batch_processing_result() {
        let outcome = |name: &str, status| JobOutcome {
            source: PathBuf::from(name),
            output: PathBuf::from(format!("out/{}", name)),
            status,
        };
        let result = BatchProcessingResult {
            outcomes: vec![
                outcome("a.jpg", ConversionStatus::Succeeded),
                outcome("b.jpg", ConversionStatus::Failed { exit_code: None }),
                outcome("c.jpg", ConversionStatus::SpawnFailed { message: "gone".into() }),
                outcome("d.jpg", ConversionStatus::Succeeded),
            ],
            processing_time: Duration::from_secs(2),
        };

        assert_eq!(result.processed(), 4);
        assert_eq!(result.succeeded(), 2);
        assert_eq!(result.failed(), 2);
        assert_eq!(result.files_per_second(), 2.0);
    }
}
