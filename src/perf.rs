//! Core Web Vitals collection over a snapshot performance timeline.
//!
//! The timeline owns the buffered entries plus the only piece of shared
//! state in the engine: live LCP subscriptions. A subscription replays
//! buffered entries on attach, receives later `push_entry` notifications,
//! and auto-disconnects past its deadline. Disposal is idempotent since
//! page-hide and visibility-hidden may both trigger finalization.

use crate::models::snapshot::PerfEntry;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// How long (in timeline milliseconds) an auto-managed LCP subscription
/// stays live before it detaches itself.
pub const OBSERVER_WINDOW_MS: f64 = 10_000.0;

/// One Core Web Vitals snapshot. `None` means "not yet measurable",
/// distinct from zero. All values are milliseconds except `cls`.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct PerformanceMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lcp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fid: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cls: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tti: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tbt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub si: Option<f64>,
}

/// Qualitative rating against the fixed Core Web Vitals thresholds.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Rating {
    Good,
    NeedsImprovement,
    Poor,
    Unknown,
}

impl Rating {
    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Good => "good",
            Rating::NeedsImprovement => "needs-improvement",
            Rating::Poor => "poor",
            Rating::Unknown => "unknown",
        }
    }
}

fn rate(value: Option<f64>, good: f64, needs_improvement: f64) -> Rating {
    match value {
        None => Rating::Unknown,
        Some(v) if v < good => Rating::Good,
        Some(v) if v < needs_improvement => Rating::NeedsImprovement,
        Some(_) => Rating::Poor,
    }
}

pub fn rate_lcp(value: Option<f64>) -> Rating {
    rate(value, 2500.0, 4000.0)
}

pub fn rate_fcp(value: Option<f64>) -> Rating {
    rate(value, 1800.0, 3000.0)
}

pub fn rate_cls(value: Option<f64>) -> Rating {
    rate(value, 0.1, 0.25)
}

#[derive(Serialize, Clone, Copy, Debug)]
/// Ratings for the three metrics the collector can actually measure.
pub struct PerformanceRatings {
    pub lcp: Rating,
    pub fcp: Rating,
    pub cls: Rating,
}

#[derive(Serialize, Clone, Copy, Debug)]
/// Metrics plus their ratings, as rendered into the report.
pub struct PerformanceReport {
    pub metrics: PerformanceMetrics,
    pub ratings: PerformanceRatings,
}

struct LcpSink {
    callback: Box<dyn Fn(f64) + Send + Sync>,
    active: AtomicBool,
    /// Absolute timeline timestamp after which pushes are dropped and the
    /// subscription detaches itself.
    deadline: Option<f64>,
}

/// Cancellation handle for one LCP subscription.
///
/// The creating call owns the subscription until `dispose` runs or the
/// deadline elapses; disposing twice is a no-op.
pub struct LcpSubscription {
    sink: Arc<LcpSink>,
}

impl LcpSubscription {
    pub fn dispose(&self) {
        self.sink.active.store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.sink.active.load(Ordering::SeqCst)
    }
}

/// A performance timeline backed by snapshot entries.
///
/// `push_entry` models late-arriving observer notifications; reads are
/// always over the full buffer.
pub struct SnapshotTimeline {
    entries: Mutex<Vec<PerfEntry>>,
    observers: Mutex<Vec<Arc<LcpSink>>>,
    observer_supported: bool,
}

impl SnapshotTimeline {
    pub fn new(entries: Vec<PerfEntry>, observer_supported: bool) -> Self {
        SnapshotTimeline {
            entries: Mutex::new(entries),
            observers: Mutex::new(Vec::new()),
            observer_supported,
        }
    }

    pub fn observer_supported(&self) -> bool {
        self.observer_supported
    }

    /// `startTime` of the most recent largest-contentful-paint entry.
    pub fn lcp(&self) -> Option<f64> {
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .filter_map(|e| match e {
                PerfEntry::LargestContentfulPaint { start_time } => Some(*start_time),
                _ => None,
            })
            .last()
    }

    /// `startTime` of the paint entry named `first-contentful-paint`.
    pub fn fcp(&self) -> Option<f64> {
        let entries = self.entries.lock().unwrap();
        entries.iter().find_map(|e| match e {
            PerfEntry::Paint { name, start_time } if name == "first-contentful-paint" => {
                Some(*start_time)
            }
            _ => None,
        })
    }

    /// Running sum over layout-shift entries without recent input; entries
    /// with recent input are dropped entirely, not zeroed. A timeline with
    /// no layout-shift entries sums to zero: a page that never shifted is
    /// measurably stable, not unmeasured.
    pub fn cls(&self) -> Option<f64> {
        let entries = self.entries.lock().unwrap();
        let mut total = 0.0;
        for e in entries.iter() {
            if let PerfEntry::LayoutShift {
                value,
                had_recent_input,
            } = e
            {
                if !had_recent_input {
                    total += value;
                }
            }
        }
        Some(total)
    }

    /// Latest timestamp on the timeline; used to anchor observer deadlines.
    pub fn now(&self) -> f64 {
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .filter_map(|e| match e {
                PerfEntry::Paint { start_time, .. }
                | PerfEntry::LargestContentfulPaint { start_time } => Some(*start_time),
                _ => None,
            })
            .fold(0.0, f64::max)
    }

    /// Append a late entry and notify live LCP subscriptions.
    pub fn push_entry(&self, entry: PerfEntry) {
        let lcp_time = match &entry {
            PerfEntry::LargestContentfulPaint { start_time } => Some(*start_time),
            _ => None,
        };
        self.entries.lock().unwrap().push(entry);
        let Some(t) = lcp_time else { return };

        let mut observers = self.observers.lock().unwrap();
        for sink in observers.iter() {
            if !sink.active.load(Ordering::SeqCst) {
                continue;
            }
            if sink.deadline.is_some_and(|d| t > d) {
                sink.active.store(false, Ordering::SeqCst);
                continue;
            }
            (sink.callback)(t);
        }
        observers.retain(|s| s.active.load(Ordering::SeqCst));
    }
}

/// Attach an LCP observer with buffered replay.
///
/// Returns `None` when the runtime reports no observer support. Otherwise
/// the callback immediately sees the freshest buffered LCP value (if any)
/// and then every live push until disposal or the deadline.
pub fn observe_lcp(
    timeline: &SnapshotTimeline,
    callback: impl Fn(f64) + Send + Sync + 'static,
    deadline: Option<f64>,
) -> Option<LcpSubscription> {
    if !timeline.observer_supported() {
        return None;
    }
    let sink = Arc::new(LcpSink {
        callback: Box::new(callback),
        active: AtomicBool::new(true),
        deadline,
    });
    if let Some(t) = timeline.lcp() {
        (sink.callback)(t);
    }
    timeline.observers.lock().unwrap().push(Arc::clone(&sink));
    Some(LcpSubscription { sink })
}

/// Assemble one metrics snapshot from the timeline.
///
/// With `use_observer`, a short-lived subscription overwrites `lcp` with
/// more accurate late-arriving data; it is disposed before returning so no
/// competing subscription outlives the call.
pub fn collect_performance_metrics(
    timeline: &SnapshotTimeline,
    use_observer: bool,
) -> PerformanceMetrics {
    let mut metrics = PerformanceMetrics {
        lcp: timeline.lcp(),
        fcp: timeline.fcp(),
        cls: timeline.cls(),
        ..PerformanceMetrics::default()
    };

    if use_observer {
        let latest: Arc<Mutex<Option<f64>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&latest);
        let deadline = timeline.now() + OBSERVER_WINDOW_MS;
        if let Some(sub) = observe_lcp(
            timeline,
            move |t| {
                *slot.lock().unwrap() = Some(t);
            },
            Some(deadline),
        ) {
            if let Some(t) = *latest.lock().unwrap() {
                metrics.lcp = Some(t);
            }
            sub.dispose();
        }
    }

    metrics
}

/// Metrics plus ratings, ready for the report.
pub fn collect_performance_report(
    timeline: &SnapshotTimeline,
    use_observer: bool,
) -> PerformanceReport {
    let metrics = collect_performance_metrics(timeline, use_observer);
    PerformanceReport {
        metrics,
        ratings: PerformanceRatings {
            lcp: rate_lcp(metrics.lcp),
            fcp: rate_fcp(metrics.fcp),
            cls: rate_cls(metrics.cls),
        },
    }
}
