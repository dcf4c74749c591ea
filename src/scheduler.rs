use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::mpsc::Receiver;
use tokio::task;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::config::{DownloadPeriod, RefreshPeriod, ScheduleConfig};
use crate::feed::Fetch;
use crate::rotator::{Rotate, Rotation};
use crate::shutdown::Shutdown;
use crate::signals::Signal;

/// Input of the dispatcher loop
#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    /// Refresh timer fired
    Refresh,

    /// Download timer fired
    Download,

    /// Client sent a command
    Signal(Signal),
}

struct Timers {
    refresh: Interval,
    download: Interval,
}

enum State {
    Stopped,
    Running(Timers),
}

/// Owns both timers and runs every operation, one event at a time
pub struct Scheduler<R, F> {
    rotator: Arc<R>,
    feed: F,
    schedule: ScheduleConfig,
    state: State,
    signals: Option<Receiver<Signal>>,
}

/// Interval whose first tick comes one full period from now
fn repeating(period: Duration) -> Interval {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Listing the store and running the setter block, so both happen off the async workers
async fn rotate<R: Rotate + Send + Sync + 'static>(rotator: &Arc<R>) {
    let rotator = Arc::clone(rotator);
    match task::spawn_blocking(move || rotator.rotate()).await {
        Ok(Ok(Rotation::Applied(file))) => info!("Wallpaper changed to: {}", file.name),
        Ok(Ok(Rotation::NoImagesAvailable)) => info!("No wallpapers available to set."),
        Ok(Err(why)) => error!("Failed to change wallpaper: {why}"),
        Err(why) => error!(target: "scheduler_task", "Rotation task failed: {why}"),
    }
}

async fn download<F: Fetch>(feed: &F) {
    info!("Starting wallpaper download...");
    match feed.fetch_and_store().await {
        Ok(file) => info!("Downloaded new wallpaper: {}", file.name),
        Err(why) => error!("Failed to download wallpaper: {why}"),
    }
}

async fn recv(signals: &mut Option<Receiver<Signal>>) -> Option<Signal> {
    match signals {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

impl<R: Rotate + Send + Sync + 'static, F: Fetch> Scheduler<R, F> {
    pub fn new(rotator: R, feed: F, schedule: ScheduleConfig, signals: Receiver<Signal>) -> Self {
        Self {
            rotator: Arc::new(rotator),
            feed,
            schedule,
            state: State::Stopped,
            signals: Some(signals),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running(_))
    }

    pub fn schedule(&self) -> ScheduleConfig {
        self.schedule
    }

    /// Periods of the armed (refresh, download) timers
    pub fn periods(&self) -> Option<(Duration, Duration)> {
        match &self.state {
            State::Running(timers) => Some((timers.refresh.period(), timers.download.period())),
            State::Stopped => None,
        }
    }

    /// Rearms both timers, taking the new periods into account
    pub fn restart(&mut self, refresh: Option<RefreshPeriod>, download: Option<DownloadPeriod>) {
        self.schedule.merge(refresh, download);

        self.state = State::Running(Timers {
            refresh: repeating(self.schedule.refresh.duration()),
            download: repeating(self.schedule.download.duration()),
        });

        info!(
            "Started with refresh interval {} and download interval {}.",
            self.schedule.refresh, self.schedule.download
        );
    }

    /// Waits for whichever timer or client command comes first
    pub async fn next_event(&mut self) -> Event {
        loop {
            let signals = &mut self.signals;
            let received = match &mut self.state {
                State::Running(timers) => tokio::select! {
                    _ = timers.refresh.tick() => return Event::Refresh,
                    _ = timers.download.tick() => return Event::Download,
                    received = recv(signals) => received,
                },
                State::Stopped => recv(signals).await,
            };

            match received {
                Some(signal) => return Event::Signal(signal),
                None => {
                    warn!(target: "scheduler_task", "Client channel closed, only timers are left");
                    *signals = None;
                }
            }
        }
    }

    pub async fn handle(&mut self, event: Event) {
        debug!(target: "scheduler_task", "Handling {event:?}");
        match event {
            Event::Refresh | Event::Signal(Signal::Refresh) => rotate(&self.rotator).await,
            Event::Download | Event::Signal(Signal::Download) => download(&self.feed).await,
            Event::Signal(Signal::Restart { refresh, download }) => self.restart(refresh, download),
        }
    }

    /// Arms the timers and dispatches events until shutdown
    pub async fn run(mut self, mut shutdown: Shutdown) {
        self.restart(None, None);

        while !shutdown.is_shutdown() {
            let event = tokio::select! {
                event = self.next_event() => event,
                _ = shutdown.recv() => {
                    warn!(target: "scheduler_task", "received shutdown");
                    break
                }
            };
            self.handle(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::image_store::WallpaperFile;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{broadcast, mpsc};

    #[derive(Clone, Default)]
    struct Counter(Arc<AtomicUsize>);

    impl Counter {
        fn bump(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        fn get(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    impl Rotate for Counter {
        fn rotate(&self) -> Result<Rotation> {
            self.bump();
            Ok(Rotation::NoImagesAvailable)
        }
    }

    impl Fetch for Counter {
        async fn fetch_and_store(&self) -> Result<WallpaperFile> {
            self.bump();
            Err(Error::Parse("offline".to_string()))
        }
    }

    fn scheduler() -> (Scheduler<Counter, Counter>, Counter, Counter, mpsc::Sender<Signal>) {
        let rotations = Counter::default();
        let downloads = Counter::default();
        let (tx, rx) = mpsc::channel(4);
        let scheduler = Scheduler::new(rotations.clone(), downloads.clone(), ScheduleConfig::default(), rx);
        (scheduler, rotations, downloads, tx)
    }

    #[tokio::test(start_paused = true)]
    async fn starts_stopped() {
        let (scheduler, ..) = scheduler();
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.periods(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_arms_both_timers() {
        let (mut scheduler, ..) = scheduler();

        scheduler.restart(Some(RefreshPeriod::ThirtyMinutes), Some(DownloadPeriod::OneDay));

        let (refresh, download) = scheduler.periods().unwrap();
        assert_eq!(refresh.as_millis(), 1_800_000);
        assert_eq!(download.as_millis(), 86_400_000);
    }

    #[tokio::test(start_paused = true)]
    async fn timers_only_trigger_their_own_operation() {
        let (mut scheduler, rotations, downloads, _tx) = scheduler();
        let started = Instant::now();
        scheduler.restart(Some(RefreshPeriod::ThirtyMinutes), Some(DownloadPeriod::OneDay));

        let first = scheduler.next_event().await;
        assert_eq!(first, Event::Refresh);
        assert_eq!(started.elapsed(), Duration::from_secs(30 * 60));
        scheduler.handle(first).await;
        assert_eq!((rotations.get(), downloads.get()), (1, 0));

        loop {
            let event = scheduler.next_event().await;
            let is_download = event == Event::Download;
            scheduler.handle(event).await;
            if is_download {
                break;
            }
            assert_eq!(downloads.get(), 0);
        }

        assert_eq!(started.elapsed(), Duration::from_secs(24 * 60 * 60));
        assert_eq!(downloads.get(), 1);
        // the 48th refresh is due at the same instant as the download
        assert!((47..=48).contains(&rotations.get()));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_signal_keeps_unset_period() {
        let (mut scheduler, rotations, downloads, tx) = scheduler();
        scheduler.restart(None, Some(DownloadPeriod::ThreeDays));

        tx.send(Signal::Restart {
            refresh: Some(RefreshPeriod::OneHour),
            download: None,
        })
        .await
        .unwrap();
        let event = scheduler.next_event().await;
        scheduler.handle(event).await;

        assert_eq!(
            scheduler.schedule(),
            ScheduleConfig::new(RefreshPeriod::OneHour, DownloadPeriod::ThreeDays)
        );
        assert_eq!(
            scheduler.periods(),
            Some((Duration::from_secs(60 * 60), Duration::from_secs(3 * 24 * 60 * 60)))
        );
        assert_eq!((rotations.get(), downloads.get()), (0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn manual_signals_run_one_operation_each() {
        let (mut scheduler, rotations, downloads, tx) = scheduler();

        tx.send(Signal::Download).await.unwrap();
        let event = scheduler.next_event().await;
        assert_eq!(event, Event::Signal(Signal::Download));
        scheduler.handle(event).await;
        assert_eq!((rotations.get(), downloads.get()), (0, 1));

        tx.send(Signal::Refresh).await.unwrap();
        let event = scheduler.next_event().await;
        scheduler.handle(event).await;
        assert_eq!((rotations.get(), downloads.get()), (1, 1));

        // manual triggers work while stopped and do not start the timers
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_client_channel_leaves_timers_running() {
        let (mut scheduler, rotations, _, tx) = scheduler();
        drop(tx);
        scheduler.restart(Some(RefreshPeriod::ThirtyMinutes), None);

        assert_eq!(scheduler.next_event().await, Event::Refresh);
        assert_eq!(rotations.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_on_shutdown() {
        let (scheduler, rotations, _, _tx) = scheduler();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = tokio::spawn(scheduler.run(Shutdown::new(shutdown_rx)));
        time::sleep(Duration::from_secs(4 * 60 * 60 + 1)).await;
        shutdown_tx.send(()).unwrap();
        task.await.unwrap();

        assert_eq!(rotations.get(), 1);
    }

    struct ThreadRecorder(std::sync::Mutex<Option<std::thread::ThreadId>>);

    impl Rotate for ThreadRecorder {
        fn rotate(&self) -> Result<Rotation> {
            *self.0.lock().unwrap() = Some(std::thread::current().id());
            Err(Error::Parse("no setter".to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rotation_runs_off_the_async_thread() {
        let (_tx, rx) = mpsc::channel(1);
        let mut scheduler = Scheduler::new(
            ThreadRecorder(Default::default()),
            Counter::default(),
            ScheduleConfig::default(),
            rx,
        );

        scheduler.handle(Event::Refresh).await;

        let rotated_on = scheduler.rotator.0.lock().unwrap().expect("rotation ran");
        assert_ne!(rotated_on, std::thread::current().id());
    }
}
