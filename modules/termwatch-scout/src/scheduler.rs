use std::time::{Duration, Instant};

use tracing::{info, warn};

use termwatch_common::{
    Config, FlaggedItem, FlushPolicy, ScanMode, TermWatchError, Watchlist, WriteMode,
};

use crate::dedup::DedupAccumulator;
use crate::report::ReportWriter;
use crate::run_log::{EventKind, RunLog};
use crate::scanner::SourceScanner;

/// Scheduler knobs, extracted from [`Config`] so tests can build them
/// directly without touching the environment.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub sources: Vec<String>,
    pub watchlist: Watchlist,
    pub scan_mode: ScanMode,
    pub desired_entries: usize,
    pub posts_per_minute: u32,
    pub posts_per_source: u32,
    pub total_post_limit: u32,
    pub cooldown_secs: Option<u64>,
    pub flush_policy: FlushPolicy,
    pub write_mode: WriteMode,
}

impl From<&Config> for PollConfig {
    fn from(config: &Config) -> Self {
        Self {
            sources: config.sources.clone(),
            watchlist: config.watchlist.clone(),
            scan_mode: config.scan_mode,
            desired_entries: config.desired_entries,
            posts_per_minute: config.posts_per_minute,
            posts_per_source: config.posts_per_source,
            total_post_limit: config.total_post_limit,
            cooldown_secs: config.cooldown_secs,
            flush_policy: config.flush_policy,
            write_mode: config.write_mode,
        }
    }
}

/// Stats from a polling run.
#[derive(Debug, Default)]
pub struct PollStats {
    pub cycles: u32,
    pub items_scanned: u32,
    pub items_flagged: u32,
    pub duplicates_dropped: u32,
    pub source_failures: u32,
}

impl std::fmt::Display for PollStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Poll Run Complete ===")?;
        writeln!(f, "Cycles run:         {}", self.cycles)?;
        writeln!(f, "Items scanned:      {}", self.items_scanned)?;
        writeln!(f, "Items flagged:      {}", self.items_flagged)?;
        writeln!(f, "Duplicates dropped: {}", self.duplicates_dropped)?;
        writeln!(f, "Source failures:    {}", self.source_failures)?;
        Ok(())
    }
}

/// Drives repeated scan/evaluate/sleep cycles until the accumulated set
/// crosses the configured threshold, then flushes the report.
///
/// One cycle runs fully before sleeping; the accumulator is owned here
/// and touched by nothing else, so no locking is involved. There is no
/// external cancellation path — the threshold is the only exit.
pub struct Poller {
    config: PollConfig,
    scanner: SourceScanner,
    writer: ReportWriter,
    accumulator: DedupAccumulator,
    run_log: Option<RunLog>,
    next_source: usize,
    flushed: usize,
}

impl Poller {
    pub fn new(config: PollConfig, scanner: SourceScanner, writer: ReportWriter) -> Self {
        Self {
            config,
            scanner,
            writer,
            accumulator: DedupAccumulator::new(),
            run_log: None,
            next_source: 0,
            flushed: 0,
        }
    }

    pub fn with_run_log(mut self, run_log: RunLog) -> Self {
        self.run_log = Some(run_log);
        self
    }

    pub async fn run(mut self) -> Result<PollStats, TermWatchError> {
        let mut stats = PollStats::default();

        if self.config.sources.is_empty() || self.config.watchlist.is_empty() {
            // Degraded configuration: nothing can ever match, so the
            // threshold is unreachable. Complete as an empty run instead
            // of spinning forever.
            warn!(
                sources = self.config.sources.len(),
                terms = self.config.watchlist.len(),
                "No sources or no watchlist terms configured, completing as a no-op run"
            );
            self.finish(&stats)?;
            return Ok(stats);
        }

        info!(
            sources = self.config.sources.len(),
            terms = self.config.watchlist.len(),
            desired_entries = self.config.desired_entries,
            mode = ?self.config.scan_mode,
            "Polling started"
        );

        loop {
            let cycle_started = Instant::now();

            // Scanning
            let cycle_items = self.scan_cycle(&mut stats).await;

            // Evaluating
            let mut new_items = 0u32;
            for item in cycle_items {
                stats.items_scanned += 1;
                if self.accumulator.admit(item.clone()) {
                    new_items += 1;
                    stats.items_flagged += 1;
                    self.notify(&item);
                    self.record(EventKind::ItemFlagged {
                        kind: item.kind.to_string(),
                        source: item.source_name.clone(),
                        url: item.url.clone(),
                    });
                } else {
                    stats.duplicates_dropped += 1;
                }
            }
            stats.cycles += 1;
            info!(
                cycle = stats.cycles,
                new_items,
                total = self.accumulator.len(),
                "Cycle evaluated"
            );
            self.record(EventKind::CycleComplete {
                cycle: stats.cycles,
                new_items,
                accumulated: self.accumulator.len() as u32,
            });

            if self.config.flush_policy == FlushPolicy::PerCycle
                && self.flushed < self.accumulator.len()
            {
                self.flush_pending()?;
            }

            if self.accumulator.len() >= self.config.desired_entries {
                info!(
                    total = self.accumulator.len(),
                    threshold = self.config.desired_entries,
                    "Threshold reached"
                );
                break;
            }

            // Sleeping. A cycle in which every source failed still counts
            // as a completed (short) cycle for pacing.
            let pause = pause_duration(self.target_cycle_period(), cycle_started.elapsed());
            info!(secs = pause.as_secs(), "Sleeping before next cycle");
            tokio::time::sleep(pause).await;
        }

        self.finish(&stats)?;
        Ok(stats)
    }

    /// Done transition: flush per policy, then persist the run log.
    fn finish(&mut self, stats: &PollStats) -> Result<(), TermWatchError> {
        if self.config.flush_policy == FlushPolicy::AtEnd {
            self.writer
                .write(self.accumulator.items(), self.config.write_mode)?;
            self.record(EventKind::ReportFlushed {
                path: self.writer.path().display().to_string(),
                items: self.accumulator.len() as u32,
            });
        }

        if let Some(run_log) = &self.run_log {
            if let Err(e) = run_log.save(stats) {
                warn!(error = %e, "Failed to save run log");
            }
        }
        Ok(())
    }

    async fn scan_cycle(&mut self, stats: &mut PollStats) -> Vec<FlaggedItem> {
        let mut items = Vec::new();
        match self.config.scan_mode {
            ScanMode::AllSources => {
                let per_source = self
                    .config
                    .total_post_limit
                    .div_ceil(self.config.sources.len() as u32);
                let sources = self.config.sources.clone();
                for name in &sources {
                    self.scan_source(name, per_source, stats, &mut items).await;
                }
            }
            ScanMode::RoundRobin => {
                let name = self.config.sources[self.next_source].clone();
                self.next_source = (self.next_source + 1) % self.config.sources.len();
                self.scan_source(&name, self.config.posts_per_source, stats, &mut items)
                    .await;
            }
        }
        items
    }

    async fn scan_source(
        &mut self,
        name: &str,
        limit: u32,
        stats: &mut PollStats,
        items: &mut Vec<FlaggedItem>,
    ) {
        info!(source = name, limit, "Scanning source");
        match self.scanner.scan(name, &self.config.watchlist, limit).await {
            Ok(found) => {
                self.record(EventKind::SourceScanned {
                    source: name.to_string(),
                    matched: found.len() as u32,
                });
                items.extend(found);
            }
            Err(e) => {
                warn!(source = name, error = %e, "Scan failed, skipping source");
                stats.source_failures += 1;
                self.record(EventKind::SourceFailed {
                    source: name.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    /// Append everything admitted since the last flush. The first flush
    /// honors the configured write mode; later ones always append.
    fn flush_pending(&mut self) -> Result<(), TermWatchError> {
        let pending = &self.accumulator.items()[self.flushed..];
        let count = pending.len() as u32;
        let mode = if self.flushed == 0 {
            self.config.write_mode
        } else {
            WriteMode::Append
        };
        self.writer.write(pending, mode)?;
        self.record(EventKind::ReportFlushed {
            path: self.writer.path().display().to_string(),
            items: count,
        });
        self.flushed = self.accumulator.len();
        Ok(())
    }

    fn record(&mut self, kind: EventKind) {
        if let Some(run_log) = self.run_log.as_mut() {
            run_log.log(kind);
        }
    }

    /// Operator-facing notification for a newly flagged item.
    fn notify(&self, item: &FlaggedItem) {
        match &item.parent {
            Some(parent) => info!(
                author = item.author.as_str(),
                url = item.url.as_str(),
                text = item.text.as_str(),
                parent_author = parent.author.as_str(),
                parent_text = parent.text.as_str(),
                parent_url = parent.url.as_str(),
                total = self.accumulator.len(),
                "Flagged new item"
            ),
            None => info!(
                author = item.author.as_str(),
                url = item.url.as_str(),
                text = item.text.as_str(),
                total = self.accumulator.len(),
                "Flagged new item"
            ),
        }
    }

    /// Fixed cooldown when configured; otherwise rate-paced from the
    /// number of posts one cycle may fetch.
    fn target_cycle_period(&self) -> Duration {
        if let Some(secs) = self.config.cooldown_secs {
            return Duration::from_secs(secs);
        }
        let posts_per_cycle = match self.config.scan_mode {
            ScanMode::AllSources => {
                let count = self.config.sources.len().max(1) as u32;
                count * self.config.total_post_limit.div_ceil(count)
            }
            ScanMode::RoundRobin => self.config.posts_per_source,
        };
        let secs = f64::from(posts_per_cycle) / f64::from(self.config.posts_per_minute.max(1)) * 60.0;
        Duration::from_secs_f64(secs)
    }
}

/// `max(1, target − elapsed)` seconds, per the pacing contract.
fn pause_duration(target: Duration, elapsed: Duration) -> Duration {
    target
        .saturating_sub(elapsed)
        .max(Duration::from_secs(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::splitter::WordSplitter;
    use crate::testing::{post, MockSource};

    fn config(sources: &[&str], desired: usize) -> PollConfig {
        PollConfig {
            sources: sources.iter().map(|s| s.to_string()).collect(),
            watchlist: Watchlist::new(["spam"]),
            scan_mode: ScanMode::RoundRobin,
            desired_entries: desired,
            posts_per_minute: 80,
            posts_per_source: 200,
            total_post_limit: 1_000,
            cooldown_secs: Some(0),
            flush_policy: FlushPolicy::AtEnd,
            write_mode: WriteMode::Overwrite,
        }
    }

    fn poller(config: PollConfig, source: MockSource, path: std::path::PathBuf) -> Poller {
        let scanner = SourceScanner::new(Arc::new(source), Arc::new(WordSplitter));
        Poller::new(config, scanner, ReportWriter::new(path))
    }

    #[tokio::test]
    async fn threshold_terminates_and_writes_report_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flagged.txt");
        let source = MockSource::new().on_posts(
            "test",
            vec![
                post("p1", "test", "spam one", ""),
                post("p2", "test", "spam two", ""),
            ],
        );

        let stats = poller(config(&["test"], 2), source, path.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(stats.cycles, 1);
        assert_eq!(stats.items_flagged, 2);

        let report = std::fs::read_to_string(&path).unwrap();
        let p1 = report.find("URL:https://example.com/r/test/p1").unwrap();
        let p2 = report.find("URL:https://example.com/r/test/p2").unwrap();
        assert!(p1 < p2, "admission order preserved in report");
        // Written exactly once: a single Submissions banner
        assert_eq!(report.matches("# Submissions").count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_url_across_cycles_admitted_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flagged.txt");
        let repeat = post("p1", "test", "spam again", "");
        let source = MockSource::new()
            .on_posts("test", vec![repeat.clone()])
            .on_posts("test", vec![repeat, post("p2", "test", "spam fresh", "")]);

        let stats = poller(config(&["test"], 2), source, path.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(stats.cycles, 2);
        assert_eq!(stats.items_flagged, 2);
        assert_eq!(stats.duplicates_dropped, 1);

        let report = std::fs::read_to_string(&path).unwrap();
        assert_eq!(report.matches("URL:https://example.com/r/test/p1").count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn round_robin_rotates_through_sources() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockSource::new()
            .on_posts("s1", vec![post("a", "s1", "spam", "")])
            .on_posts("s2", vec![post("b", "s2", "spam", "")])
            .on_posts("s3", vec![post("c", "s3", "spam", "")]);
        let calls = source.calls();

        let stats = poller(
            config(&["s1", "s2", "s3"], 3),
            source,
            dir.path().join("flagged.txt"),
        )
        .run()
        .await
        .unwrap();

        assert_eq!(stats.cycles, 3);
        let scanned: Vec<String> = calls
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect();
        assert_eq!(scanned, vec!["s1", "s2", "s3"]);
    }

    #[tokio::test]
    async fn failing_source_is_skipped_within_the_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockSource::new()
            .failing("deleted_sub")
            .on_posts("good", vec![post("p1", "good", "spam", "")]);
        let calls = source.calls();

        let mut cfg = config(&["deleted_sub", "good"], 1);
        cfg.scan_mode = ScanMode::AllSources;

        let stats = poller(cfg, source, dir.path().join("flagged.txt"))
            .run()
            .await
            .unwrap();

        assert_eq!(stats.cycles, 1);
        assert_eq!(stats.source_failures, 1);
        assert_eq!(stats.items_flagged, 1);
        // Both sources were attempted in the same cycle
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn all_sources_mode_splits_the_post_limit() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockSource::new()
            .on_posts("s1", vec![post("a", "s1", "spam", "")])
            .on_posts("s2", vec![])
            .on_posts("s3", vec![]);
        let calls = source.calls();

        let mut cfg = config(&["s1", "s2", "s3"], 1);
        cfg.scan_mode = ScanMode::AllSources;
        cfg.total_post_limit = 10;

        poller(cfg, source, dir.path().join("flagged.txt"))
            .run()
            .await
            .unwrap();

        // ceil(10 / 3) = 4 posts per source
        assert!(calls.lock().unwrap().iter().all(|(_, limit)| *limit == 4));
    }

    #[tokio::test(start_paused = true)]
    async fn per_cycle_flush_appends_without_duplication() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flagged.txt");
        let source = MockSource::new()
            .on_posts("test", vec![post("p1", "test", "spam one", "")])
            .on_posts("test", vec![post("p2", "test", "spam two", "")]);

        let mut cfg = config(&["test"], 2);
        cfg.flush_policy = FlushPolicy::PerCycle;

        poller(cfg, source, path.clone()).run().await.unwrap();

        let report = std::fs::read_to_string(&path).unwrap();
        assert_eq!(report.matches("URL:https://example.com/r/test/p1").count(), 1);
        assert_eq!(report.matches("URL:https://example.com/r/test/p2").count(), 1);
    }

    #[tokio::test]
    async fn empty_configuration_completes_as_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flagged.txt");

        let stats = poller(config(&[], 10), MockSource::new(), path.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(stats.cycles, 0);
        assert_eq!(stats.items_flagged, 0);
        // AtEnd still writes the (empty) report exactly once
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn pause_is_at_least_one_second() {
        let target = Duration::from_secs(10);
        assert_eq!(
            pause_duration(target, Duration::from_secs(3)),
            Duration::from_secs(7)
        );
        assert_eq!(
            pause_duration(target, Duration::from_secs(30)),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn rate_paced_period_follows_cycle_volume() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(&["s1"], 1);
        cfg.cooldown_secs = None;
        cfg.posts_per_source = 200;
        cfg.posts_per_minute = 80;
        let p = poller(cfg, MockSource::new(), dir.path().join("f.txt"));
        // 200 posts / 80 per minute = 2.5 minutes
        assert_eq!(p.target_cycle_period(), Duration::from_secs(150));
    }
}
