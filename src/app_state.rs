use std::sync::Arc;

use chime_core::context::SchedulerConfig;
use chime_core::dispatch::{self, DispatchError};
use chime_core::scheduler::{Scheduler, TickDriver, Tickable};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

/// Shared state for the interactive shell.
/// Timer arguments are the messages printed when a timer fires.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<RwLock<SchedulerConfig>>,
    pub scheduler: Arc<Scheduler<String>>,
    /// None while paused
    driver: Arc<Mutex<Option<TickDriver>>>,
}

impl AppContext {
    /// Build the dispatcher and scheduler from `config` and start ticking.
    /// Must be called from within a tokio runtime.
    pub fn new(config: SchedulerConfig) -> Result<Self, DispatchError> {
        let dispatcher = dispatch::from_config(&config)?;
        info!(
            dispatcher = dispatcher.name(),
            tick_ms = config.tick_interval_ms,
            "Starting scheduler"
        );

        let scheduler = Arc::new(Scheduler::with_dispatcher(dispatcher));
        let driver = spawn_driver(&scheduler, &config);

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            scheduler,
            driver: Arc::new(Mutex::new(Some(driver))),
        })
    }

    pub async fn is_running(&self) -> bool {
        self.driver
            .lock()
            .await
            .as_ref()
            .is_some_and(TickDriver::is_running)
    }

    /// Stop sweeping. Timers keep their deadlines and fire late on resume.
    pub async fn pause(&self) -> bool {
        match self.driver.lock().await.take() {
            Some(mut driver) => {
                driver.stop();
                true
            }
            None => false,
        }
    }

    pub async fn resume(&self) -> bool {
        let mut driver = self.driver.lock().await;
        if driver.is_some() {
            return false;
        }
        let config = self.config.read().await;
        *driver = Some(spawn_driver(&self.scheduler, &config));
        true
    }

    /// Stop the driver and every timer. Returns how many timers were stopped.
    pub async fn shutdown(&self) -> usize {
        self.pause().await;
        self.scheduler.shutdown()
    }
}

fn spawn_driver(scheduler: &Arc<Scheduler<String>>, config: &SchedulerConfig) -> TickDriver {
    TickDriver::spawn(
        config.tick_interval(),
        vec![Arc::clone(scheduler) as Arc<dyn Tickable>],
    )
}
