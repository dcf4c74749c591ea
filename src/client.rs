use std::io;
use std::path::Path;

use super::consts::UNIX_PIPE_FILE_NAME;
use super::signals::Signal;
use log::debug;

/// Writes signal invoked in the client to the pipe
pub fn invoke(signal: Signal) -> io::Result<()> {
    send(UNIX_PIPE_FILE_NAME.as_path(), &signal)?;
    client_info_signal_invoked(&signal);
    Ok(())
}

fn send(pipe_path: &Path, signal: &Signal) -> io::Result<()> {
    let config = bincode::config::standard();

    // Opening for writing fails when nobody reads the other end
    let mut writer = unix_named_pipe::open_write(pipe_path).map_err(|why| {
        io::Error::new(
            why.kind(),
            format!("could not open {} ({why}), is the daemon running?", pipe_path.display()),
        )
    })?;

    let len = bincode::encode_into_std_write(signal, &mut writer, config)
        .map_err(|why| io::Error::new(io::ErrorKind::Other, why.to_string()))?;

    debug!("Sent {signal:?} to the daemon with len {len}");
    Ok(())
}

/// Wrapper to print nicely
fn client_info_signal_invoked(signal: &Signal) {
    let str_to_print = match signal {
        Signal::Refresh => "Changing the wallpaper".to_string(),
        Signal::Download => "Downloading the wallpaper of the day".to_string(),
        Signal::Restart { refresh, download } => {
            let describe = |period: Option<String>| period.unwrap_or_else(|| "unchanged".to_string());
            format!(
                "Restarting timers (refresh: {}, download: {})",
                describe(refresh.map(|p| p.to_string())),
                describe(download.map(|p| p.to_string())),
            )
        }
    };

    println!("{str_to_print}");
}
