//! Cooperative cancellation behavior.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use kiln::config::Config;
use kiln::log::Logger;
use kiln::orchestration::{Pipeline, TaskProducer};
use kiln::{Error, Result, Task, WorkItem, WorkQueue};

/// A task whose run is long enough that an interrupt lands mid-attempt.
struct SlowTask {
    name: String,
    runs: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
    succeeded: bool,
}

impl Task for SlowTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(300));
        self.finished.fetch_add(1, Ordering::SeqCst);
        self.succeeded = true;
        Ok(())
    }

    fn success(&self) -> bool {
        self.succeeded
    }

    fn reset(&mut self) {
        self.succeeded = false;
    }
}

struct SlowProducer {
    count: usize,
    runs: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
    build_queue: Option<WorkQueue>,
    push_queue: Option<WorkQueue>,
}

impl TaskProducer for SlowProducer {
    fn populate(&mut self, build_queue: &WorkQueue, push_queue: &WorkQueue) -> Result<()> {
        self.build_queue = Some(build_queue.clone());
        self.push_queue = Some(push_queue.clone());
        for n in 0..self.count {
            build_queue.put(WorkItem::Task(Box::new(SlowTask {
                name: format!("slow-{}", n),
                runs: Arc::clone(&self.runs),
                finished: Arc::clone(&self.finished),
                succeeded: false,
            })));
        }
        Ok(())
    }
}

/// Given 5 queued tasks with 2 in flight
/// When the pipeline is interrupted
/// Then the in-flight attempts complete, nothing further is dequeued, and
/// the pipeline reports the interruption
#[test]
fn test_interrupt_finishes_in_flight_work_only() {
    let runs = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));
    let mut producer = SlowProducer {
        count: 5,
        runs: Arc::clone(&runs),
        finished: Arc::clone(&finished),
        build_queue: None,
        push_queue: None,
    };

    let config = Config {
        threads: 2,
        push_threads: 1,
        retries: 0,
        ..Config::default()
    };
    let pipeline = Pipeline::new(&config, Logger::disabled());
    let handle = pipeline.handle();

    let trigger = thread::spawn({
        let runs = Arc::clone(&runs);
        move || {
            while runs.load(Ordering::SeqCst) < 2 {
                thread::sleep(Duration::from_millis(5));
            }
            handle.interrupt();
        }
    });

    let result = pipeline.run(&mut producer);
    trigger.join().unwrap();

    assert!(matches!(result, Err(Error::Interrupted)));

    // Both in-flight attempts ran to completion, never preempted.
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(finished.load(Ordering::SeqCst), 2);

    // Three tasks were abandoned on the queue; the shutdown sentinel placed
    // during interruption is still outstanding as well.
    let build_queue = producer.build_queue.unwrap();
    assert_eq!(build_queue.pending(), 4);

    // The push queue received its sentinel too.
    let push_queue = producer.push_queue.unwrap();
    assert_eq!(push_queue.pending(), 1);
}

/// Given an interrupted pipeline
/// When interrupt is requested again via a second handle
/// Then the handle keeps reporting the interrupted state
#[test]
fn test_interrupt_is_idempotent() {
    let config = Config {
        threads: 1,
        push_threads: 1,
        retries: 0,
        ..Config::default()
    };
    let pipeline = Pipeline::new(&config, Logger::disabled());
    let first = pipeline.handle();
    let second = pipeline.handle();

    first.interrupt();
    second.interrupt();
    assert!(first.is_interrupted());
    assert!(second.is_interrupted());
}
