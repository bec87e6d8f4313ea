use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use apphost_core::{globals, UiError, UiRoot, UiSession};

use crate::greeting::GreetingService;
use crate::settings::Settings;

const ROOT_NAME: &str = "console";

/// How often the session checks for a close request while waiting for input
const POLL_INTERVAL: Duration = Duration::from_millis(100);

type InputSource = Box<dyn BufRead + Send>;

/// A line-oriented console front end.
///
/// Input is read on a helper thread so the session loop can keep polling for
/// close requests. The loop ends on `quit`, end of input, or a close request.
pub struct ConsoleUiRoot {
    source: Option<InputSource>,
    output: Box<dyn Write>,
    title: String,
    greeter: Option<Arc<GreetingService>>,
    input: Option<Receiver<String>>,
}

impl ConsoleUiRoot {
    /// Reads stdin and writes stdout; settings and services come from the process host.
    pub fn from_stdin() -> Self {
        Self {
            source: Some(Box::new(io::BufReader::new(io::stdin()))),
            output: Box::new(io::stdout()),
            title: String::new(),
            greeter: None,
            input: None,
        }
    }

    /// A root with explicit input, output and greeter.
    pub fn with_parts(
        title: impl Into<String>,
        greeter: Arc<GreetingService>,
        source: InputSource,
        output: Box<dyn Write>,
    ) -> Self {
        Self {
            source: Some(source),
            output,
            title: title.into(),
            greeter: Some(greeter),
            input: None,
        }
    }

    fn resolve_from_host(&mut self) -> Result<(), UiError> {
        let services = globals::services().map_err(|e| UiError::message(ROOT_NAME, "initialize", e.to_string()))?;
        let greeter = services
            .require::<GreetingService>()
            .map_err(|e| UiError::root_failed(ROOT_NAME, "initialize", e))?;
        let settings = services
            .require::<Settings>()
            .map_err(|e| UiError::root_failed(ROOT_NAME, "initialize", e))?;
        self.title = settings.title.clone();
        self.greeter = Some(greeter);
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<(), UiError> {
        writeln!(self.output, "{}", line)
            .and_then(|_| self.output.flush())
            .map_err(|e| UiError::root_failed(ROOT_NAME, "run", e))
    }
}

impl UiRoot for ConsoleUiRoot {
    fn name(&self) -> &str {
        ROOT_NAME
    }

    fn initialize(&mut self) -> Result<(), UiError> {
        if self.greeter.is_none() {
            self.resolve_from_host()?;
        }

        let Some(source) = self.source.take() else {
            return Ok(());
        };
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("console-input".to_string())
            .spawn(move || {
                for line in source.lines() {
                    match line {
                        Ok(line) => {
                            if tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
            })
            .map_err(|e| UiError::root_failed(ROOT_NAME, "initialize", e))?;
        self.input = Some(rx);
        Ok(())
    }

    fn run(&mut self, session: &UiSession) -> Result<(), UiError> {
        let (Some(greeter), Some(input)) = (self.greeter.clone(), self.input.take()) else {
            return Err(UiError::message(ROOT_NAME, "run", "root was not initialized"));
        };

        let banner = format!("{} (type a name, or 'quit' to exit)", self.title);
        self.write_line(&banner)?;
        loop {
            if session.close_requested() {
                self.write_line("Close requested")?;
                break;
            }
            match input.recv_timeout(POLL_INTERVAL) {
                Ok(line) => {
                    let line = line.trim();
                    if line.eq_ignore_ascii_case("quit") {
                        break;
                    }
                    if !line.is_empty() {
                        let reply = greeter.greet(line);
                        self.write_line(&reply)?;
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        self.write_line("Session ended")
    }
}
