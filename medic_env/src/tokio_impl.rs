//! Production implementations backed by Tokio.

use crate::{DrillClock, EnvError, InputEvent, InputSource, TraineeId};
use crate::input::parse_line;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::{error, warn};

/// Production clock backed by the Tokio timer.
pub struct TokioClock {
    /// Start time for monotonic duration calculations
    start: Instant,
}

impl TokioClock {
    /// Creates a new TokioClock.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Creates an Arc-wrapped clock for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DrillClock for TokioClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn seed(&self) -> u64 {
        // Production is not seeded
        0
    }
}

/// Trainee input read line-by-line, from the terminal by default.
///
/// Unparseable lines are logged and skipped.
pub struct StdinInput<R = BufReader<Stdin>> {
    trainee: TraineeId,
    lines: Mutex<Lines<R>>,
}

impl StdinInput {
    /// Creates an input source over the process's stdin.
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> StdinInput<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    /// Creates an input source over any buffered reader.
    pub fn from_reader(reader: R) -> Self {
        Self {
            trainee: TraineeId::new(),
            lines: Mutex::new(reader.lines()),
        }
    }

    /// Reads the next raw line, mapping EOF to `InputClosed`.
    async fn read_line(&self) -> Result<String, EnvError> {
        let mut lines = self.lines.lock().await;
        match lines.next_line().await? {
            Some(line) => Ok(line),
            None => Err(EnvError::InputClosed),
        }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R> InputSource for StdinInput<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn next_event(&self) -> Result<Option<InputEvent>, EnvError> {
        loop {
            let line = match self.read_line().await {
                Ok(line) => line,
                Err(EnvError::InputClosed) => return Ok(None),
                Err(e) => {
                    error!("trainee {} input failed: {}", self.trainee, e);
                    return Err(e);
                }
            };

            match parse_line(&line) {
                Ok(event) => return Ok(Some(event)),
                Err(e) => warn!("{}", e),
            }
        }
    }

    fn trainee(&self) -> TraineeId {
        self.trainee
    }
}
