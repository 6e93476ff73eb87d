use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("palaver.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("palaver.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("palaver.client.request_duration_seconds");

pub(crate) static STREAM_FRAGMENTS: Counter = Counter::new("palaver.stream.fragments");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("palaver.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("palaver.stream.bytes");
pub(crate) static STREAM_TTFB: Moments = Moments::new("palaver.stream.ttfb_seconds");
pub(crate) static STREAM_DURATION: Moments = Moments::new("palaver.stream.duration_seconds");

pub(crate) static SESSION_TURNS: Counter = Counter::new("palaver.session.turns");
pub(crate) static SESSION_TRUNCATED_TURNS: Counter =
    Counter::new("palaver.session.truncated_turns");
pub(crate) static SESSION_RESETS: Counter = Counter::new("palaver.session.resets");
pub(crate) static ARCHIVED_ROWS: Counter = Counter::new("palaver.archive.rows");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_FRAGMENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_moments(&STREAM_TTFB);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&SESSION_TURNS);
    collector.register_counter(&SESSION_TRUNCATED_TURNS);
    collector.register_counter(&SESSION_RESETS);
    collector.register_counter(&ARCHIVED_ROWS);
}

#[cfg(test)]
mod tests {
    use biometrics::Sensor;

    use super::*;

    #[test]
    fn counters_accumulate() {
        let before = ARCHIVED_ROWS.read();
        ARCHIVED_ROWS.click();
        assert!(ARCHIVED_ROWS.read() > before);
    }

    #[test]
    fn registers_with_collector() {
        register_biometrics(Collector::new());
    }
}
