//! Display refresh loop: recomputes the response curve on parameter changes
//! and runs the analyzer at a fixed rate on a background thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{info, warn};
use parking_lot::Mutex;

use crate::analysis::analyzer::{Channel, SpectrumAnalyzer};
use crate::analysis::path::{PlotArea, RenderPath};
use crate::analysis::response::ResponseCurve;
use crate::constants::DISPLAY_REFRESH_HZ;
use crate::params::{ChangeFlag, ParameterStore};

/// Everything a view needs to draw one frame.
#[derive(Clone)]
pub struct DisplayFrame {
    pub response_curve: Arc<ResponseCurve>,
    pub left: Arc<RenderPath>,
    pub right: Arc<RenderPath>,
}

/// Timer-driven view model. Independent of audio processing: starting or
/// stopping it never touches the filter chains.
#[derive(Clone)]
pub struct DisplayLoop {
    params: Arc<ParameterStore>,
    changed: Arc<ChangeFlag>,
    analyzer: Arc<Mutex<SpectrumAnalyzer>>,
    plot: PlotArea,
    curve: Arc<Mutex<Arc<ResponseCurve>>>,
    on_frame: Arc<Mutex<dyn FnMut(DisplayFrame) + Send>>,
    interval: Duration,
    finish: Arc<AtomicBool>,
    thread_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl DisplayLoop {
    pub fn new(
        params: Arc<ParameterStore>,
        analyzer: Arc<Mutex<SpectrumAnalyzer>>,
        plot: PlotArea,
        on_frame: Arc<Mutex<dyn FnMut(DisplayFrame) + Send>>,
    ) -> Self {
        let changed = params.subscribe();
        // Draw the initial curve on the first tick.
        changed.mark();
        Self {
            params,
            changed,
            analyzer,
            plot,
            curve: Arc::new(Mutex::new(Arc::new(ResponseCurve::empty()))),
            on_frame,
            interval: Duration::from_secs_f64(1.0 / DISPLAY_REFRESH_HZ as f64),
            finish: Arc::new(AtomicBool::new(false)),
            thread_handle: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run one refresh: rebuild the curve if parameters changed, advance
    /// the analyzer, and hand the frame to the callback.
    pub fn tick(&self) -> DisplayFrame {
        let (left, right) = {
            let mut analyzer = self.analyzer.lock();
            if self.changed.compare_and_clear() {
                let settings = self.params.snapshot();
                let curve = ResponseCurve::compute(&settings, analyzer.sample_rate(), self.plot);
                *self.curve.lock() = Arc::new(curve);
            }
            analyzer.process(self.plot);
            (
                analyzer.latest_path(Channel::Left),
                analyzer.latest_path(Channel::Right),
            )
        };

        let frame = DisplayFrame {
            response_curve: Arc::clone(&self.curve.lock()),
            left,
            right,
        };
        let mut on_frame = self.on_frame.lock();
        (*on_frame)(frame.clone());
        frame
    }

    fn run(&self) {
        while !self.finish.load(Ordering::Relaxed) {
            self.tick();
            std::thread::sleep(self.interval);
        }
    }

    /// Start the background refresh thread.
    pub fn start(&self) {
        self.stop();
        self.finish.store(false, Ordering::Relaxed);
        let this = self.clone();
        let handle = std::thread::spawn(move || this.run());
        *self.thread_handle.lock() = Some(handle);
        info!("display loop started ({:?} interval)", self.interval);
    }

    /// Stop the background refresh thread and wait for it to exit.
    pub fn stop(&self) {
        self.finish.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread_handle.lock().take() {
            if handle.thread().id() == std::thread::current().id() {
                warn!("display loop stop called from its own thread; skipping join");
            } else if handle.join().is_err() {
                warn!("display loop thread panicked during join");
            } else {
                info!("display loop stopped");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle.lock().is_some() && !self.finish.load(Ordering::Relaxed)
    }

    pub fn response_curve(&self) -> Arc<ResponseCurve> {
        Arc::clone(&self.curve.lock())
    }
}
