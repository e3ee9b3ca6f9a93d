//! Five-stage query profiler
//!
//! Every backend splits a query into the same stages so software and hardware
//! runs can be compared line by line. Software backends leave the two
//! transfer stages at zero.

use std::fmt;
use std::time::Instant;

/// Query stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Graph allocation or map packing
    PreProcess,
    /// Copy into the accelerator's map window
    TransferTo,
    /// Relaxation
    Execute,
    /// Copy out of the accelerator's direction window
    TransferFrom,
    /// Path reconstruction
    PostProcess,
}

impl Stage {
    /// All stages in execution order
    pub const ALL: [Self; 5] = [
        Self::PreProcess,
        Self::TransferTo,
        Self::Execute,
        Self::TransferFrom,
        Self::PostProcess,
    ];

    /// Heading used in batch reports
    pub const fn label(self) -> &'static str {
        match self {
            Self::PreProcess => "Pre-processing",
            Self::TransferTo => "Transfer to",
            Self::Execute => "Execution",
            Self::TransferFrom => "Transfer from",
            Self::PostProcess => "Post-processing",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Monotonic stopwatch bracketing one stage.
#[derive(Debug, Clone, Copy)]
pub struct StageTimer {
    started: Instant,
}

impl StageTimer {
    /// Start timing
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Stop timing; elapsed nanoseconds.
    #[allow(clippy::cast_possible_truncation)]
    pub fn end(self) -> u64 {
        // u64 nanoseconds cover ~584 years
        self.started.elapsed().as_nanos() as u64
    }
}

/// Per-stage durations of one query, in nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileSample {
    stages: [u64; 5],
}

impl ProfileSample {
    /// Duration recorded for `stage`
    pub const fn get(&self, stage: Stage) -> u64 {
        self.stages[stage.index()]
    }

    /// Add `ns` to `stage`.
    pub fn add(&mut self, stage: Stage, ns: u64) {
        self.stages[stage.index()] += ns;
    }

    /// Run `f`, charging its wall time to `stage`.
    pub fn time<T>(&mut self, stage: Stage, f: impl FnOnce() -> T) -> T {
        let timer = StageTimer::start();
        let out = f();
        self.add(stage, timer.end());
        out
    }

    /// Sum of all stages
    pub fn total(&self) -> u64 {
        self.stages.iter().sum()
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

impl fmt::Display for ProfileSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const ROWS: [(Stage, &str); 5] = [
            (Stage::PreProcess, "Time to preprocess  "),
            (Stage::TransferTo, "Time to transfer    "),
            (Stage::Execute, "Time to execute     "),
            (Stage::TransferFrom, "Time to receive     "),
            (Stage::PostProcess, "Time to postprocess "),
        ];
        let total = self.total();
        writeln!(f, "Total time          : {total} ns")?;
        for (stage, label) in ROWS {
            let ns = self.get(stage);
            writeln!(f, "{label}: {ns} ns ({:.2}%)", percent(ns, total))?;
        }
        Ok(())
    }
}

/// Summary statistics over a set of nanosecond samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    /// Number of samples
    pub count: usize,
    /// Smallest sample
    pub min: u64,
    /// Largest sample
    pub max: u64,
    /// Arithmetic mean
    pub mean: f64,
    /// Sample standard deviation (N − 1); NaN when `count <= 1`
    pub std_dev: f64,
}

impl Stats {
    /// Statistics over `samples`, `None` if empty.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_samples(samples: &[u64]) -> Option<Self> {
        let min = *samples.iter().min()?;
        let max = *samples.iter().max()?;
        let n = samples.len();
        let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / n as f64;
        let std_dev = if n > 1 {
            let var = samples
                .iter()
                .map(|&s| {
                    let d = s as f64 - mean;
                    d * d
                })
                .sum::<f64>()
                / (n - 1) as f64;
            var.sqrt()
        } else {
            f64::NAN
        };
        Some(Self {
            count: n,
            min,
            max,
            mean,
            std_dev,
        })
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "    Min (ns): {}", self.min)?;
        writeln!(f, "    Max (ns): {}", self.max)?;
        writeln!(f, "    Avg (ns): {:.2}", self.mean)?;
        writeln!(f, "    SD  (ns): {:.2}", self.std_dev)
    }
}

/// Per-stage and total statistics over a batch of queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchStats {
    stages: [Stats; 5],
    total: Stats,
}

impl BatchStats {
    /// Aggregate `samples`, `None` if empty.
    pub fn from_samples(samples: &[ProfileSample]) -> Option<Self> {
        let column = |stage: Stage| -> Option<Stats> {
            let values: Vec<u64> = samples.iter().map(|s| s.get(stage)).collect();
            Stats::from_samples(&values)
        };
        let stages = [
            column(Stage::PreProcess)?,
            column(Stage::TransferTo)?,
            column(Stage::Execute)?,
            column(Stage::TransferFrom)?,
            column(Stage::PostProcess)?,
        ];
        let totals: Vec<u64> = samples.iter().map(ProfileSample::total).collect();
        let total = Stats::from_samples(&totals)?;
        Some(Self { stages, total })
    }

    /// Statistics for one stage
    pub const fn stage(&self, stage: Stage) -> &Stats {
        &self.stages[stage.index()]
    }

    /// Statistics for the per-query total
    pub const fn total(&self) -> &Stats {
        &self.total
    }

    /// Number of queries aggregated
    pub const fn count(&self) -> usize {
        self.total.count
    }

    /// Sample built from each stage's mean, truncated to whole nanoseconds.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn mean_sample(&self) -> ProfileSample {
        let mut sample = ProfileSample::default();
        for stage in Stage::ALL {
            sample.add(stage, self.stage(stage).mean as u64);
        }
        sample
    }
}

impl fmt::Display for BatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Samples taken: {}", self.count())?;
        for stage in Stage::ALL {
            writeln!(f, "{}:", stage.label())?;
            write!(f, "{}", self.stage(stage))?;
        }
        writeln!(f, "Total:")?;
        write!(f, "{}", self.total)?;
        writeln!(f)?;
        writeln!(f, "Average:")?;
        write!(f, "{}", self.mean_sample())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_over_known_samples() {
        let s = Stats::from_samples(&[10, 20, 30, 40, 50]).unwrap();
        assert_eq!(s.count, 5);
        assert_eq!(s.min, 10);
        assert_eq!(s.max, 50);
        assert!((s.mean - 30.0).abs() < 1e-9);
        assert!((s.std_dev - 15.811_388).abs() < 1e-3);
    }

    #[test]
    fn single_sample_has_nan_deviation() {
        let s = Stats::from_samples(&[7]).unwrap();
        assert_eq!((s.min, s.max), (7, 7));
        assert!(s.std_dev.is_nan());
    }

    #[test]
    fn empty_batch_has_no_stats() {
        assert!(Stats::from_samples(&[]).is_none());
        assert!(BatchStats::from_samples(&[]).is_none());
    }

    #[test]
    fn sample_accumulates_per_stage() {
        let mut p = ProfileSample::default();
        p.add(Stage::Execute, 40);
        p.add(Stage::Execute, 20);
        p.add(Stage::PreProcess, 40);
        assert_eq!(p.get(Stage::Execute), 60);
        assert_eq!(p.total(), 100);
    }

    #[test]
    fn display_shows_percentages() {
        let mut p = ProfileSample::default();
        p.add(Stage::PreProcess, 25);
        p.add(Stage::Execute, 75);
        let text = p.to_string();
        assert!(text.starts_with("Total time          : 100 ns\n"));
        assert!(text.contains("Time to preprocess  : 25 ns (25.00%)"));
        assert!(text.contains("Time to execute     : 75 ns (75.00%)"));
        assert!(text.contains("Time to receive     : 0 ns (0.00%)"));
    }

    #[test]
    fn empty_sample_prints_zero_percent() {
        let text = ProfileSample::default().to_string();
        assert!(text.contains("(0.00%)"));
        assert!(!text.contains("NaN"));
    }

    #[test]
    fn batch_mean_sample() {
        let mut a = ProfileSample::default();
        a.add(Stage::Execute, 10);
        let mut b = ProfileSample::default();
        b.add(Stage::Execute, 30);
        let batch = BatchStats::from_samples(&[a, b]).unwrap();
        assert_eq!(batch.count(), 2);
        assert_eq!(batch.mean_sample().get(Stage::Execute), 20);
        assert_eq!(batch.total().max, 30);
    }

    #[test]
    fn timer_measures_something() {
        let mut p = ProfileSample::default();
        let v = p.time(Stage::PostProcess, || {
            std::thread::sleep(std::time::Duration::from_millis(1));
            5
        });
        assert_eq!(v, 5);
        assert!(p.get(Stage::PostProcess) >= 1_000_000);
    }
}
