use std::time::Duration;

use crate::{Category, Event, EventPattern};

// `tracing` levels must be known at compile time, so verbose mode picks the
// macro at the call site.
macro_rules! emit {
    ($verbose:expr, $quiet:ident, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+)
        } else {
            tracing::$quiet!($($arg)+)
        }
    };
}

/// Logs what a wait does with each event it pops.
///
/// Levels:
/// - `trace` - wait started, event popped
/// - `debug` - event matched or discarded
/// - `warn` - forbidden event, timeout
///
/// With `verbose` set, everything below `warn` is lifted to `info`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tracer {
    verbose: bool,
}

impl Tracer {
    pub(crate) fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub(crate) fn waiting(&self, categories: &[Category], timeout: Duration) {
        emit!(
            self.verbose,
            trace,
            categories = ?categories.iter().map(Category::as_str).collect::<Vec<_>>(),
            timeout = ?timeout,
            "waiting for events"
        );
    }

    pub(crate) fn popped(&self, event: &Event) {
        emit!(
            self.verbose,
            trace,
            event_id = %event.id().short(),
            category = %event.category(),
            event = %event,
            "event popped"
        );
    }

    pub(crate) fn matched(&self, event: &Event, pattern: &EventPattern) {
        emit!(
            self.verbose,
            debug,
            event_id = %event.id().short(),
            pattern = %pattern,
            "event matched"
        );
    }

    pub(crate) fn discarded(&self, event: &Event) {
        emit!(
            self.verbose,
            debug,
            event_id = %event.id().short(),
            event = %event,
            "event discarded"
        );
    }

    pub(crate) fn forbidden(&self, event: &Event, pattern: &EventPattern) {
        tracing::warn!(
            event_id = %event.id().short(),
            event = %event,
            pattern = %pattern,
            "forbidden event occurred"
        );
    }

    pub(crate) fn timed_out(&self, categories: &[Category], timeout: Duration) {
        tracing::warn!(
            categories = ?categories.iter().map(Category::as_str).collect::<Vec<_>>(),
            timeout = ?timeout,
            "timed out"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::{Arc, Mutex},
    };

    use tracing::Level;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(max_level: Level, f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(max_level)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn event() -> Event {
        Event::new("dbus-signal").unwrap().with_attr("signal", "Foo")
    }

    #[test]
    fn verbose_lifts_quiet_records_to_info() {
        let out = capture(Level::INFO, || {
            let tracer = Tracer::new(true);
            tracer.popped(&event());
            tracer.discarded(&event());
        });
        assert!(out.contains("INFO"), "{out}");
        assert!(out.contains("event popped"), "{out}");
        assert!(out.contains("event discarded"), "{out}");
    }

    #[test]
    fn quiet_records_stay_below_info() {
        let out = capture(Level::INFO, || {
            let tracer = Tracer::new(false);
            tracer.popped(&event());
            tracer.discarded(&event());
        });
        assert!(out.is_empty(), "{out}");

        let out = capture(Level::TRACE, || Tracer::new(false).discarded(&event()));
        assert!(out.contains("DEBUG"), "{out}");
        assert!(!out.contains("INFO"), "{out}");
    }

    #[test]
    fn warnings_ignore_verbosity() {
        let pattern = EventPattern::new("dbus-signal").unwrap();
        for verbose in [false, true] {
            let out = capture(Level::WARN, || {
                Tracer::new(verbose).forbidden(&event(), &pattern);
            });
            assert!(out.contains("WARN"), "{out}");
            assert!(out.contains("forbidden event occurred"), "{out}");
        }
    }
}
