use std::fs::File;
use std::io;
use std::path::Path;
use std::pin::Pin;

use bincode::config::Configuration;
use futures::stream::{Stream, StreamExt};
use futures::task::{Context, Poll};
use futures::{ready, Future};
use log::{debug, error, info, warn};
use scopeguard::defer;
use signal_hook::{consts::{SIGINT, SIGQUIT, SIGTERM}, iterator::Signals};
use tokio::sync::broadcast;
use tokio::sync::mpsc::{self, Sender};
use tokio::task;
use tokio::time::{Instant, Sleep};

use super::config::{Config, ScheduleConfig};
use super::consts::{PIPE_POLL_INTERVAL, SIGNAL_CHANNEL_CAPACITY, UNIX_PIPE_FILE_NAME};
use super::feed::FeedClient;
use super::image_store::ImageStore;
use super::rotator::Rotator;
use super::scheduler::Scheduler;
use super::setter::CommandSetter;
use super::shutdown::Shutdown;
use super::signals::Signal;

/// PipeStream is a structure which hides the logic of reading file in a loop
///
/// It implements Stream, so it can be processed asynchronously
struct PipeStream {
    /// Unix named pipe file
    f: File,

    /// Configuration of bincode that is used to encode/decode data sent by client
    config: Configuration,

    /// Delay before the pipe is read again after it turned out empty
    delay: Pin<Box<Sleep>>,
}

impl PipeStream {
    fn new(f: File, config: Configuration) -> Self {
        Self {
            f,
            config,
            delay: Box::pin(tokio::time::sleep(PIPE_POLL_INTERVAL)),
        }
    }
}

impl Stream for PipeStream {
    type Item = Signal;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let slf = self.get_mut();

        loop {
            if let Ok(s) = bincode::decode_from_std_read(&mut slf.f, slf.config) {
                return Poll::Ready(Some(s));
            }

            // Nothing written yet, come back once the delay elapses
            ready!(slf.delay.as_mut().poll(cx));
            slf.delay.as_mut().reset(Instant::now() + PIPE_POLL_INTERVAL);
        }
    }
}

/// Forwards signals invoked by client to the scheduler
async fn client_signal_handler(mut pipe_stream: PipeStream, signals: Sender<Signal>, mut shutdown: Shutdown) {
    loop {
        let signal = tokio::select! {
            output = pipe_stream.next() => {
                match output {
                    Some(s) => s,
                    None => return
                }
            },
            _ = shutdown.recv() => {
                warn!(target: "client_task", "received shutdown");
                return
            }
        };
        info!("Client invoked {signal:?}");
        if signals.send(signal).await.is_err() {
            warn!(target: "client_task", "Scheduler is gone");
            return;
        }
    }
}

/// Blocks until one of the termination signals arrives
fn wait_for_termination(mut shutdown_signals: Signals) {
    if let Some(signal) = shutdown_signals.forever().next() {
        warn!("Shutting down the daemon with signal: {signal}");
    }
}

/// Starts asynchronous tasks:
///
/// * scheduler changing and downloading wallpapers
/// * listener of client events which can be triggered by the user
/// * watcher of termination signals
async fn start(config: Config, schedule: ScheduleConfig, pipe_path: &Path) -> io::Result<()> {
    let (tx, _) = broadcast::channel(1);
    let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_CHANNEL_CAPACITY);

    let store = ImageStore::new(config.wallpapers_dir.clone());
    if let Err(why) = store.ensure_directory() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("could not create {}: {why}", store.dir().display()),
        ));
    }
    info!("Wallpapers are stored in {}", store.dir().display());

    let rotator = Rotator::new(store.clone(), CommandSetter::new(config.setter));
    let feed = FeedClient::new(config, store);
    let scheduler = Scheduler::new(rotator, feed, schedule, signal_rx);

    let read = unix_named_pipe::open_read(pipe_path)?;
    let pipe_stream = PipeStream::new(read, bincode::config::standard());

    let client_task = task::spawn(client_signal_handler(
        pipe_stream,
        signal_tx,
        Shutdown::new(tx.subscribe()),
    ));

    let scheduler_task = task::spawn(scheduler.run(Shutdown::new(tx.subscribe())));

    let shutdown_signals = Signals::new([SIGINT, SIGTERM, SIGQUIT])?;
    let signals_handle = shutdown_signals.handle();
    let shutdown_signal_watcher = task::spawn_blocking(move || wait_for_termination(shutdown_signals));

    tokio::select! {
        _ = shutdown_signal_watcher => { },
        _ = scheduler_task => {
            warn!(target: "scheduler_task", "Shutting down");
        },
        _ = client_task => {
            warn!(target: "client_task", "Shutting down");
        },
    }

    // Unblocks the watcher thread when another task ended first
    signals_handle.close();
    let _ = tx.send(());
    Ok(())
}

/// Creates the pipe clients write to, an existing one means the daemon is already up
fn create_pipe(pipe_path: &Path) -> io::Result<()> {
    unix_named_pipe::create(pipe_path, Some(0o740)).map_err(|why| {
        io::Error::new(
            why.kind(),
            format!("could not create pipe {} ({why}), is another daemon running?", pipe_path.display()),
        )
    })?;
    info!("Pipe has been created at: {}", pipe_path.display());
    Ok(())
}

/// Initializing unix named pipe and daemon. It is also responsible for removing named piped after
/// terminating the program
pub async fn init(config: Config, schedule: ScheduleConfig) -> io::Result<()> {
    let pipe_path = UNIX_PIPE_FILE_NAME.as_path();
    create_pipe(pipe_path)?;

    defer! {
        match std::fs::remove_file(pipe_path) {
            Ok(()) => info!("Removed pipe {} successfully", pipe_path.display()),
            Err(why) => error!("Could not remove pipe {}: {why}", pipe_path.display()),
        }
    }

    debug!("Starting with {schedule:?}");
    start(config, schedule, pipe_path).await
}
