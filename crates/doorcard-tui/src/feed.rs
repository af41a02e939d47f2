//! JSON-lines snapshot feed.
//!
//! Each non-blank line is a partial snapshot (`{ "<entity>": { "state": .. } }`)
//! merged into the loopback host. Lines starting with `#` are comments.
//! Updates are released one per interval so bursts and debouncing can be
//! watched on screen.

use std::path::PathBuf;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use doorcard_core::StateSnapshot;

/// Parse one feed line. Blank lines and comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<StateSnapshot>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Stream the feed file into `tx`, pausing `interval` between updates.
pub fn spawn_feed(
    path: PathBuf,
    interval: Duration,
    tx: mpsc::UnboundedSender<StateSnapshot>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot open snapshot feed");
                return;
            }
        };
        info!(path = %path.display(), "snapshot feed started");

        let mut lines = BufReader::new(file).lines();
        let mut number = 0usize;
        loop {
            let line = tokio::select! {
                () = cancel.cancelled() => break,
                line = lines.next_line() => line,
            };
            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "snapshot feed read failed");
                    break;
                }
            };
            number += 1;

            let update = match parse_line(&line) {
                Ok(Some(update)) => update,
                Ok(None) => continue,
                Err(err) => {
                    warn!(line = number, error = %err, "skipping malformed feed line");
                    continue;
                }
            };
            if tx.send(update).is_err() {
                break;
            }
            debug!(line = number, "feed update sent");

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
            }
        }
        info!("snapshot feed finished");
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use doorcard_core::EntityId;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn skips_blank_and_comment_lines() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   ").unwrap().is_none());
        assert!(parse_line("# door opens").unwrap().is_none());
    }

    #[test]
    fn parses_partial_snapshots() {
        let update = parse_line(r#"{"binary_sensor.front_door": {"state": "on"}}"#)
            .unwrap()
            .unwrap();
        let sensor = EntityId::parse("binary_sensor.front_door").unwrap();
        assert_eq!(update.state_of(&sensor), Some("on"));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_line("{not json").is_err());
        assert!(parse_line(r#"{"no_domain": {"state": "on"}}"#).is_err());
    }

    #[tokio::test]
    async fn streams_valid_lines_in_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# scripted door").unwrap();
        writeln!(file, r#"{{"binary_sensor.front_door": {{"state": "on"}}}}"#).unwrap();
        writeln!(file, "garbage").unwrap();
        writeln!(file, r#"{{"binary_sensor.front_door": {{"state": "off"}}}}"#).unwrap();
        file.flush().unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_feed(
            file.path().to_path_buf(),
            Duration::from_millis(1),
            tx,
            CancellationToken::new(),
        );
        handle.await.unwrap();

        let sensor = EntityId::parse("binary_sensor.front_door").unwrap();
        let states: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|update| update.state_of(&sensor).unwrap().to_owned())
            .collect();
        assert_eq!(states, vec!["on".to_owned(), "off".to_owned()]);
    }
}
