use std::io::{Read, Write};
use std::sync::{Arc, Mutex};

use portable_pty::{native_pty_system, Child, MasterPty, PtySize};
use tokio::sync::broadcast;

use crate::error::{Error, Result};
use crate::shell::Shell;

const OUTPUT_CHANNEL_CAPACITY: usize = 256;
const READ_CHUNK: usize = 4096;

/// One item out of the PTY reader thread: either a chunk of output, or the
/// terminal event that ended the stream.
#[derive(Debug, Clone)]
pub enum PtyEvent {
    Output(Vec<u8>),
    /// The reader hit an I/O error (maps to WebSocket close code 4002).
    ReadError,
    /// The shell process exited cleanly (maps to WebSocket close code 4000).
    Exited,
}

/// One spawned shell living behind a PTY. The reader side runs on a
/// blocking thread and fans bytes out over a broadcast channel so that a
/// WebSocket reconnect can resubscribe without respawning the shell.
pub struct PtySession {
    master: Box<dyn MasterPty + Send>,
    child: Mutex<Box<dyn Child + Send + Sync>>,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    output_tx: broadcast::Sender<PtyEvent>,
}

impl PtySession {
    pub fn spawn(shell: &Shell, cols: u16, rows: u16, workdir: Option<&str>) -> Result<Self> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| Error::Pty(e.to_string()))?;

        let mut cmd = shell.command();
        if let Some(dir) = workdir {
            cmd.cwd(dir);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| Error::Spawn(e.to_string()))?;

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| Error::Pty(e.to_string()))?;
        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| Error::Pty(e.to_string()))?;

        let (output_tx, _) = broadcast::channel::<PtyEvent>(OUTPUT_CHANNEL_CAPACITY);
        let tx_for_reader = output_tx.clone();

        tokio::task::spawn_blocking(move || {
            let mut reader = reader;
            let mut buf = [0u8; READ_CHUNK];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => {
                        let _ = tx_for_reader.send(PtyEvent::Exited);
                        break;
                    }
                    Ok(n) => {
                        let _ = tx_for_reader.send(PtyEvent::Output(buf[..n].to_vec()));
                    }
                    Err(_) => {
                        let _ = tx_for_reader.send(PtyEvent::ReadError);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            master: pair.master,
            child: Mutex::new(child),
            writer: Arc::new(Mutex::new(writer)),
            output_tx,
        })
    }

    /// Signal the shell to terminate on cancellation. The reader thread
    /// unblocks on its own once the process exits or its pipe closes; the
    /// caller is responsible for the 1-2s grace period before treating the
    /// session as gone.
    pub fn shutdown(&self) -> Result<()> {
        let mut child = self.child.lock().expect("pty child mutex poisoned");
        child.kill().map_err(|e| Error::Pty(e.to_string()))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PtyEvent> {
        self.output_tx.subscribe()
    }

    pub fn write_input(&self, data: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock().expect("pty writer mutex poisoned");
        writer.write_all(data)?;
        writer.flush()?;
        Ok(())
    }

    pub fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        self.master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| Error::Pty(e.to_string()))
    }
}
