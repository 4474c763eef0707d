use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// External player invocation: `program args... <cid>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCommand {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    Started { cid: u64, position: usize, total: usize },
    Failed { cid: u64, reason: String },
    QueueFinished { played: usize, failed: usize, stopped: bool },
}

/// A running queue. Only one is expected at a time.
pub struct PlaybackHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PlayerCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn command_for(&self, cid: u64) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(cid.to_string())
            // the terminal belongs to the browser
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        command
    }
}

impl PlaybackHandle {
    /// Play `queue` one CID at a time in the background, reporting through `events`.
    pub fn spawn(
        player: PlayerCommand,
        queue: Vec<u64>,
        events: mpsc::UnboundedSender<PlayerEvent>,
    ) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        info!("Dispatching {} item(s) to {}", queue.len(), player.program);
        let task = tokio::spawn(run_queue(player, queue, events, stop_rx));
        Self { stop_tx, task }
    }

    /// Kill the current player process and drop the rest of the queue.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    pub async fn join(self) {
        let _ = self.task.await;
    }
}

async fn run_queue(
    player: PlayerCommand,
    queue: Vec<u64>,
    events: mpsc::UnboundedSender<PlayerEvent>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let total = queue.len();
    let mut played = 0;
    let mut failed = 0;
    let mut stopped = false;

    for (position, cid) in queue.into_iter().enumerate() {
        if *stop_rx.borrow() {
            stopped = true;
            break;
        }

        let mut child = match player.command_for(cid).spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to start player for cid {}: {}", cid, e);
                failed += 1;
                let _ = events.send(PlayerEvent::Failed {
                    cid,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        debug!(cid, position, total, "player started");
        let _ = events.send(PlayerEvent::Started { cid, position, total });

        tokio::select! {
            status = child.wait() => match status {
                Ok(status) if status.success() => played += 1,
                Ok(status) => {
                    warn!("Player exited with {} for cid {}", status, cid);
                    failed += 1;
                    let _ = events.send(PlayerEvent::Failed { cid, reason: status.to_string() });
                }
                Err(e) => {
                    warn!("Lost track of player for cid {}: {}", cid, e);
                    failed += 1;
                    let _ = events.send(PlayerEvent::Failed { cid, reason: e.to_string() });
                }
            },
            // a dropped handle counts as a stop request too
            _ = stop_rx.changed() => {
                let _ = child.kill().await;
                stopped = true;
                break;
            }
        }
    }

    info!(played, failed, stopped, "Playback queue finished");
    let _ = events.send(PlayerEvent::QueueFinished {
        played,
        failed,
        stopped,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn drain(rx: &mut mpsc::UnboundedReceiver<PlayerEvent>) -> Vec<PlayerEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test]
    async fn plays_every_cid_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = PlaybackHandle::spawn(PlayerCommand::new("true", vec![]), vec![5, 6], tx);
        handle.join().await;

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                PlayerEvent::Started { cid: 5, position: 0, total: 2 },
                PlayerEvent::Started { cid: 6, position: 1, total: 2 },
                PlayerEvent::QueueFinished { played: 2, failed: 0, stopped: false },
            ]
        );
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_queue() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = PlaybackHandle::spawn(PlayerCommand::new("false", vec![]), vec![1, 2, 3], tx);
        handle.join().await;

        let events = drain(&mut rx);
        assert!(matches!(
            events.last(),
            Some(PlayerEvent::QueueFinished { played: 0, failed: 3, stopped: false })
        ));
    }

    #[tokio::test]
    async fn missing_player_is_reported_per_item() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let player = PlayerCommand::new("./definitely-not-a-player", vec![]);
        PlaybackHandle::spawn(player, vec![1, 2], tx).join().await;

        let events = drain(&mut rx);
        let failures = events
            .iter()
            .filter(|e| matches!(e, PlayerEvent::Failed { .. }))
            .count();
        assert_eq!(failures, 2);
    }

    #[tokio::test]
    async fn stop_kills_the_running_player() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let player = PlayerCommand::new("sh", vec!["-c".into(), "sleep 30".into()]);
        let handle = PlaybackHandle::spawn(player, vec![1, 2], tx);

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stop();
        tokio::time::timeout(Duration::from_secs(5), handle.join())
            .await
            .expect("queue should stop promptly");

        let events = drain(&mut rx);
        assert!(matches!(
            events.last(),
            Some(PlayerEvent::QueueFinished { played: 0, stopped: true, .. })
        ));
    }
}
