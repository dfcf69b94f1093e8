//! Buffered stage logging for the connected-components engine.
//!
//! The engine reports its work as a sequence of [`StageEvent`] records,
//! one per pipeline stage. A [`StageLogger`] buffers events and hands full
//! batches to an action; the stock action renders each event as one
//! CSV-flavored line `operation,input_size,output_size,micros` on standard
//! output, which is the machine-readable run log the command-line tools
//! emit.
//!
//! Loggers are cheap to clone and share a buffer, so the recursive engine
//! can hold one per level without coordinating flushes.

#![forbid(missing_docs)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use serde::Serialize;

/// One completed pipeline stage.
#[derive(Clone, Debug, Serialize)]
pub struct StageEvent {
    /// The stage name, e.g. `"contraction"` or `"basecase"`.
    pub operation: &'static str,
    /// Records entering the stage.
    pub input_size: u64,
    /// Records leaving the stage.
    pub output_size: u64,
    /// Wall-clock duration of the stage in microseconds.
    pub micros: u128,
}

type Action = Box<dyn Fn(&[StageEvent])>;

/// A buffering logger bound to an action on event batches.
///
/// Events are delivered to the action when the buffer fills and on drop of
/// the last clone. A disabled logger drops everything without formatting.
pub struct StageLogger {
    inner: Option<Rc<Shared>>,
}

struct Shared {
    action: Action,
    buffer: RefCell<Vec<StageEvent>>,
}

const BUFFER_EVENTS: usize = 256;

impl StageLogger {
    /// A logger delivering batches to `action`.
    pub fn new(action: Action) -> Self {
        StageLogger {
            inner: Some(Rc::new(Shared {
                action,
                buffer: RefCell::new(Vec::with_capacity(BUFFER_EVENTS)),
            })),
        }
    }

    /// A logger printing CSV lines on standard output.
    pub fn stdout_csv() -> Self {
        StageLogger::new(Box::new(|events| {
            for event in events {
                println!(
                    "{},{},{},{}",
                    event.operation, event.input_size, event.output_size, event.micros
                );
            }
        }))
    }

    /// A logger that discards everything.
    pub fn disabled() -> Self {
        StageLogger { inner: None }
    }

    /// Records one event; may trigger a flush.
    pub fn log(&self, event: StageEvent) {
        if let Some(ref shared) = self.inner {
            let mut buffer = shared.buffer.borrow_mut();
            buffer.push(event);
            if buffer.len() >= BUFFER_EVENTS {
                (shared.action)(&buffer);
                buffer.clear();
            }
        }
    }

    /// Delivers all buffered events to the action.
    pub fn flush(&self) {
        if let Some(ref shared) = self.inner {
            let mut buffer = shared.buffer.borrow_mut();
            if !buffer.is_empty() {
                (shared.action)(&buffer);
                buffer.clear();
            }
        }
    }

    /// Starts timing a stage that saw `input_size` records.
    pub fn stage(&self, operation: &'static str, input_size: u64) -> StageTimer<'_> {
        StageTimer {
            logger: self,
            operation,
            input_size,
            begin: Instant::now(),
        }
    }
}

impl Clone for StageLogger {
    fn clone(&self) -> Self {
        StageLogger {
            inner: self.inner.clone(),
        }
    }
}

impl Drop for StageLogger {
    fn drop(&mut self) {
        // Only the last clone delivers what is left.
        if let Some(ref shared) = self.inner {
            if Rc::strong_count(shared) == 1 {
                let mut buffer = shared.buffer.borrow_mut();
                if !buffer.is_empty() {
                    (shared.action)(&buffer);
                    buffer.clear();
                }
            }
        }
    }
}

/// Times one stage; [`finish`](StageTimer::finish) records the event.
pub struct StageTimer<'a> {
    logger: &'a StageLogger,
    operation: &'static str,
    input_size: u64,
    begin: Instant,
}

impl StageTimer<'_> {
    /// Ends the stage, reporting how many records it produced.
    pub fn finish(self, output_size: u64) {
        self.logger.log(StageEvent {
            operation: self.operation,
            input_size: self.input_size,
            output_size,
            micros: self.begin.elapsed().as_micros(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn batches_reach_the_action() {
        let (sender, receiver) = mpsc::channel();
        {
            let logger = StageLogger::new(Box::new(move |events| {
                for event in events {
                    sender.send((event.operation, event.input_size)).unwrap();
                }
            }));
            logger.log(StageEvent {
                operation: "sample",
                input_size: 10,
                output_size: 5,
                micros: 1,
            });
            logger.flush();
            let timer = logger.stage("basecase", 3);
            timer.finish(3);
        }
        let seen: Vec<_> = receiver.try_iter().collect();
        assert_eq!(seen, vec![("sample", 10), ("basecase", 3)]);
    }

    #[test]
    fn disabled_logger_is_inert() {
        let logger = StageLogger::disabled();
        logger.log(StageEvent {
            operation: "noop",
            input_size: 0,
            output_size: 0,
            micros: 0,
        });
        logger.flush();
    }
}
