/// Logs a line tagged with a component name instead of the module path.
/// Usage:
/// ```rust
/// use log::Level;
/// ticket_scanner::checkin_log!(Level::Info, "scanner", "Session started");
/// ticket_scanner::checkin_log!(Level::Error, "config", "Config load failed: {}", "boom");
/// ```
/// With the binary's fern format this renders as
/// [2025-04-25T16:32:10+02:00][INFO ][scanner][pid=4568][tid=ThreadId(1)] Session started
#[macro_export]
macro_rules! checkin_log {
    ($level:expr, $component:expr, $($arg:tt)+) => {
        ::log::log!(target: $component, $level, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use log::{Level, LevelFilter, Log, Metadata, Record};
    use std::sync::Mutex;

    /// Keeps `(level, target, message)` for every record at DEBUG or above.
    struct Capture(Mutex<Vec<(Level, String, String)>>);

    static CAPTURE: Capture = Capture(Mutex::new(Vec::new()));

    impl Log for Capture {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= Level::Debug
        }
        fn log(&self, record: &Record) {
            if self.enabled(record.metadata()) {
                self.0.lock().unwrap().push((
                    record.level(),
                    record.target().to_owned(),
                    record.args().to_string(),
                ));
            }
        }
        fn flush(&self) {}
    }

    #[test]
    fn component_becomes_the_target() {
        log::set_logger(&CAPTURE).unwrap();
        log::set_max_level(LevelFilter::Debug);

        checkin_log!(Level::Debug, "macro-probe", "allocated {} after {} attempt(s)", "AB12C", 2);
        checkin_log!(Level::Trace, "macro-probe", "too chatty");

        // other tests log concurrently; keep only this one's records
        let seen: Vec<_> = CAPTURE.0.lock().unwrap()
            .iter()
            .filter(|(_, target, _)| target == "macro-probe")
            .cloned()
            .collect();
        assert_eq!(
            seen,
            vec![(Level::Debug, "macro-probe".to_owned(), "allocated AB12C after 2 attempt(s)".to_owned())]
        );
    }
}
