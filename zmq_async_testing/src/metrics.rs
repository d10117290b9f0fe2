//! Counter inspection on top of `metrics_util`'s debugging recorder.

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use rstest::fixture;
use zmq_async::metrics::Direction;

/// A local recorder plus the snapshotter reading it.
pub struct CounterProbe {
    recorder: DebuggingRecorder,
    snapshotter: Snapshotter,
}

impl CounterProbe {
    /// A probe with no recorded values.
    #[must_use]
    pub fn new() -> Self {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        Self {
            recorder,
            snapshotter,
        }
    }

    /// Run `f` with this probe installed as the thread's recorder.
    ///
    /// Only metrics recorded on the calling thread are captured, so the
    /// code under test must complete synchronously.
    pub fn record<T>(&self, f: impl FnOnce() -> T) -> T { metrics::with_local_recorder(&self.recorder, f) }

    /// Value of counter `name` for `direction`, or zero if never touched.
    #[must_use]
    pub fn counter(&self, name: &str, direction: Direction) -> u64 {
        self.snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter(|(key, _, _, _)| {
                key.key().name() == name
                    && key
                        .key()
                        .labels()
                        .any(|l| l.key() == "direction" && l.value() == direction.as_str())
            })
            .map(|(_, _, _, value)| match value {
                DebugValue::Counter(c) => c,
                _ => 0,
            })
            .sum()
    }
}

impl Default for CounterProbe {
    fn default() -> Self { Self::new() }
}

#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn counter_probe() -> CounterProbe { CounterProbe::new() }
