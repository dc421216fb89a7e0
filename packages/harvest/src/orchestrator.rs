//! Per-store download orchestration.
//!
//! A run is split in two phases. [`DownloadOrchestrator::plan`] resolves
//! every date preset and builds every URL without touching the browser, so
//! all configuration errors surface first. [`DownloadOrchestrator::execute`]
//! then walks the plan strictly in order (presets outer, report types
//! inner), one browser call at a time, and never fails: each attempt ends as
//! an [`AttemptOutcome`].
//!
//! Each attempt moves through four stages:
//!
//! 1. **Navigate** to the report URL, or reload it when the previous attempt
//!    left the browser on the same page, then settle.
//! 2. **Locate** the report's download control and wait for it.
//! 3. **Capture**: arm the download watch, click, wait for the file and
//!    move it into the report directory.
//! 4. **Convert** the raw export to the canonical spreadsheet.
//!
//! After the last attempt every report with at least one artifact is merged
//! into its summary.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use report_harvest_models::{
    AttemptOutcome, AttemptStage, DownloadMeta, DownloadedArtifact, ReportType, RunReport,
    StoreConfig, SummaryFailure,
};
use report_harvest_portal::url::build_report_url;
use report_harvest_portal::{BrowserSession, Control as _, ControlSpec, WaitPolicy};
use report_harvest_tabular::TabularIo;
use report_harvest_tabular::convert::convert_to_canonical;
use report_harvest_tabular::merge::merge_to_summary;

use crate::ConfigError;
use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::date_range::resolve_date_range;
use crate::layout::OutputLayout;
use crate::progress::{ProgressCallback, null_progress};

/// One `(preset, report)` attempt, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAttempt {
    pub meta: DownloadMeta,
    pub report: ReportType,
    pub url: String,
}

/// Every attempt of one store's run, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub store: StoreConfig,
    pub attempts: Vec<PlannedAttempt>,
}

/// Why an attempt stopped early.
struct AttemptFailure {
    stage: AttemptStage,
    reason: String,
}

fn failed_at<E: fmt::Display>(stage: AttemptStage) -> impl FnOnce(E) -> AttemptFailure {
    move |e| AttemptFailure {
        stage,
        reason: e.to_string(),
    }
}

/// Drives one store's downloads through a [`BrowserSession`].
pub struct DownloadOrchestrator<'a, C: Clock, T: TabularIo> {
    catalog: &'a Catalog,
    layout: OutputLayout,
    clock: C,
    tabular: T,
    progress: Arc<dyn ProgressCallback>,
}

impl<'a, C: Clock, T: TabularIo> DownloadOrchestrator<'a, C, T> {
    #[must_use]
    pub fn new(catalog: &'a Catalog, layout: OutputLayout, clock: C, tabular: T) -> Self {
        Self {
            catalog,
            layout,
            clock,
            tabular,
            progress: null_progress(),
        }
    }

    /// Reports one step per attempt to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Resolves every attempt for `store_name`.
    ///
    /// "Today" is read once, so every preset of a run shares the same date.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the store or one of its presets is unknown,
    /// or a preset cannot be resolved.
    pub fn plan(&self, store_name: &str) -> Result<RunPlan, ConfigError> {
        let store = self.catalog.store(store_name)?;
        let portal = self.catalog.portal();
        let today = self.clock.today();

        let mut attempts = Vec::new();
        for preset_key in self.catalog.presets_for(store) {
            let range = resolve_date_range(self.catalog.preset(preset_key)?, today)?;
            for report in self.catalog.reports() {
                attempts.push(PlannedAttempt {
                    meta: DownloadMeta::new(&store.name, &report.key, preset_key, range),
                    url: build_report_url(
                        &portal.base_url,
                        &store.portal_store_id,
                        &report.path,
                        &range,
                    ),
                    report: report.clone(),
                });
            }
        }

        Ok(RunPlan {
            store: store.clone(),
            attempts,
        })
    }

    /// Plans and executes a run for `store_name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] from [`Self::plan`]; `session` is not touched
    /// in that case.
    pub async fn run_store<S: BrowserSession>(
        &self,
        session: &mut S,
        store_name: &str,
    ) -> Result<RunReport, ConfigError> {
        let plan = self.plan(store_name)?;
        Ok(self.execute(session, &plan).await)
    }

    /// Executes every attempt in `plan`, then writes the summaries.
    pub async fn execute<S: BrowserSession>(&self, session: &mut S, plan: &RunPlan) -> RunReport {
        log::info!(
            "{}: {} downloads planned",
            plan.store.name,
            plan.attempts.len()
        );
        self.progress.set_total(plan.attempts.len() as u64);

        let mut report = RunReport {
            store_name: plan.store.name.clone(),
            ..RunReport::default()
        };
        let mut last_url = None;

        for planned in &plan.attempts {
            log::info!("Downloading {}", planned.meta);
            self.progress.set_message(planned.meta.to_string());

            let outcome = match self.attempt(session, planned, &mut last_url).await {
                Ok(artifact) => {
                    log::info!("Downloaded {}", artifact.path.display());
                    AttemptOutcome::Downloaded(artifact)
                }
                Err(AttemptFailure { stage, reason }) => {
                    log::warn!("Skipped {} at {stage}: {reason}", planned.meta);
                    AttemptOutcome::Failed {
                        meta: planned.meta.clone(),
                        stage,
                        reason,
                    }
                }
            };
            report.attempts.push(outcome);
            self.progress.inc(1);
        }

        self.summarize(&mut report);

        self.progress.finish(format!(
            "{}: {} downloaded, {} skipped",
            report.store_name,
            report.succeeded(),
            report.failed()
        ));
        report
    }

    async fn attempt<S: BrowserSession>(
        &self,
        session: &mut S,
        planned: &PlannedAttempt,
        last_url: &mut Option<String>,
    ) -> Result<DownloadedArtifact, AttemptFailure> {
        let portal = self.catalog.portal();
        let meta = &planned.meta;

        // Navigate
        let wait = WaitPolicy::from(portal);
        let loaded = if last_url.as_deref() == Some(planned.url.as_str()) {
            log::debug!("Reloading {} for {}", planned.url, meta.report_key);
            session.reload(&wait).await
        } else {
            session.navigate(&planned.url, &wait).await
        };
        if let Err(e) = loaded {
            *last_url = None;
            return Err(failed_at(AttemptStage::Navigate)(e));
        }
        *last_url = Some(planned.url.clone());
        tokio::time::sleep(Duration::from_millis(portal.settle_ms)).await;

        // Locate
        let spec = ControlSpec::for_report(&planned.report, &portal.download_text);
        let control = session
            .locate_control(&spec)
            .await
            .map_err(failed_at(AttemptStage::Locate))?;
        control
            .wait_visible(Duration::from_secs(portal.control_timeout_secs))
            .await
            .map_err(failed_at(AttemptStage::Locate))?;

        // Capture
        let watch = session
            .prepare_download()
            .await
            .map_err(failed_at(AttemptStage::Capture))?;
        if let Err(e) = control.click(false).await {
            log::debug!("Click on {spec} failed ({e}), forcing");
            control
                .click(true)
                .await
                .map_err(failed_at(AttemptStage::Capture))?;
        }
        let captured = session
            .await_download(watch, Duration::from_secs(portal.download_timeout_secs))
            .await
            .map_err(failed_at(AttemptStage::Capture))?;
        let staged = self
            .layout
            .stage_download(&captured, meta)
            .await
            .map_err(failed_at(AttemptStage::Capture))?;

        // Convert
        let path = convert_to_canonical(&self.tabular, &staged, &self.layout.artifact_path(meta))
            .map_err(failed_at(AttemptStage::Convert))?;

        Ok(DownloadedArtifact {
            path,
            meta: meta.clone(),
        })
    }

    fn summarize(&self, report: &mut RunReport) {
        let mut by_report: BTreeMap<&str, Vec<PathBuf>> = BTreeMap::new();
        for outcome in &report.attempts {
            if let AttemptOutcome::Downloaded(artifact) = outcome {
                by_report
                    .entry(artifact.meta.report_key.as_str())
                    .or_default()
                    .push(artifact.path.clone());
            }
        }

        let mut summaries = Vec::new();
        let mut failures = Vec::new();

        for report_type in self.catalog.reports() {
            let Some(inputs) = by_report.get(report_type.key.as_str()) else {
                log::warn!(
                    "{}: no artifacts for {}, no summary written",
                    report.store_name,
                    report_type.key
                );
                continue;
            };

            let out = self.layout.summary_path(&report.store_name, &report_type.key);
            let constants = [
                ("store".to_owned(), report.store_name.clone()),
                ("report".to_owned(), report_type.key.clone()),
            ];

            match merge_to_summary(&self.tabular, inputs, &out, &constants) {
                Ok(summary) => {
                    log::info!(
                        "Summary {} ({} files)",
                        summary.path.display(),
                        summary.sources.len()
                    );
                    summaries.push(summary);
                }
                Err(e) => {
                    log::warn!("Summary for {} failed: {e}", report_type.key);
                    failures.push(SummaryFailure {
                        report_key: report_type.key.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        report.summaries = summaries;
        report.summary_failures = failures;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::path::Path;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use report_harvest_models::{DatePreset, PortalConfig, PresetKind};
    use report_harvest_portal::{CapturedDownload, DownloadWatch, PortalError};
    use report_harvest_tabular::merge::SOURCE_FILE_COLUMN;
    use report_harvest_tabular::xlsx::XlsxIo;

    use super::*;
    use crate::clock::FixedClock;

    const STORE: &str = "Test Store";

    fn catalog(store_presets: Option<Vec<String>>) -> Catalog {
        let portal = PortalConfig {
            base_url: "https://portal.test/home".to_owned(),
            home_url: "https://portal.test/home".to_owned(),
            content_selector: "main".to_owned(),
            download_text: "Download".to_owned(),
            navigation_timeout_secs: 1,
            control_timeout_secs: 1,
            download_timeout_secs: 1,
            settle_ms: 0,
        };
        let presets = vec![
            DatePreset {
                key: "last_7_days".to_owned(),
                kind: PresetKind::RelativeDays,
                value: Some(7),
                start: None,
                end: None,
            },
            DatePreset {
                key: "last_month".to_owned(),
                kind: PresetKind::LastPeriod,
                value: None,
                start: None,
                end: None,
            },
        ];
        let report = |key: &str, path: &str, label: &str| ReportType {
            key: key.to_owned(),
            path: path.to_owned(),
            label: label.to_owned(),
            control_index: None,
        };
        let reports = vec![
            report("sales", "/analytics/sales", "Download sales"),
            report("sales_conversion", "/analytics/sales", "Download conversion"),
            report("customers", "/analytics/customers", "Download customers"),
        ];
        let stores = vec![StoreConfig {
            name: STORE.to_owned(),
            portal_store_id: "store-1".to_owned(),
            presets: store_presets,
        }];

        Catalog::new(
            portal,
            presets,
            vec!["last_7_days".to_owned(), "last_month".to_owned()],
            reports,
            stores,
        )
        .unwrap()
    }

    /// Scripted session: every download yields a small CSV unless the
    /// control, page or download is configured to fail.
    struct FakeSession {
        calls: Vec<String>,
        download_dir: PathBuf,
        failing_labels: HashSet<String>,
        failing_paths: HashSet<String>,
        /// Labels whose click never produces a file.
        failing_downloads: HashSet<String>,
        /// `(label, url fragment)` pairs whose export no encoding can parse.
        unparseable_exports: Vec<(String, String)>,
        current_url: Option<String>,
        last_label: Option<String>,
        downloads: u32,
    }

    impl FakeSession {
        fn new(download_dir: &Path) -> Self {
            std::fs::create_dir_all(download_dir).unwrap();
            Self {
                calls: Vec::new(),
                download_dir: download_dir.to_path_buf(),
                failing_labels: HashSet::new(),
                failing_paths: HashSet::new(),
                failing_downloads: HashSet::new(),
                unparseable_exports: Vec::new(),
                current_url: None,
                last_label: None,
                downloads: 0,
            }
        }

        fn count(&self, prefix: &str) -> usize {
            self.calls.iter().filter(|c| c.starts_with(prefix)).count()
        }

        fn export_is_unparseable(&self) -> bool {
            let (Some(url), Some(label)) = (&self.current_url, &self.last_label) else {
                return false;
            };
            self.unparseable_exports
                .iter()
                .any(|(l, fragment)| l == label && url.contains(fragment.as_str()))
        }
    }

    struct FakeControl {
        spec: ControlSpec,
        times_out: bool,
    }

    #[async_trait]
    impl report_harvest_portal::Control for FakeControl {
        async fn wait_visible(&self, timeout: Duration) -> Result<(), PortalError> {
            if self.times_out {
                return Err(PortalError::ControlTimeout {
                    control: self.spec.to_string(),
                    timeout,
                });
            }
            Ok(())
        }

        async fn click(&self, _force: bool) -> Result<(), PortalError> {
            Ok(())
        }
    }

    #[async_trait]
    impl BrowserSession for FakeSession {
        type Control = FakeControl;

        async fn navigate(&mut self, url: &str, wait: &WaitPolicy) -> Result<(), PortalError> {
            self.calls.push(format!("navigate {url}"));
            self.current_url = None;
            if self.failing_paths.iter().any(|p| url.contains(p.as_str())) {
                return Err(PortalError::NavigationTimeout {
                    url: url.to_owned(),
                    timeout: wait.timeout,
                });
            }
            self.current_url = Some(url.to_owned());
            Ok(())
        }

        async fn reload(&mut self, _wait: &WaitPolicy) -> Result<(), PortalError> {
            self.calls.push("reload".to_owned());
            Ok(())
        }

        async fn locate_control(&mut self, spec: &ControlSpec) -> Result<FakeControl, PortalError> {
            self.calls.push(format!("locate {spec}"));
            self.last_label = match spec {
                ControlSpec::Labelled(label) => Some(label.clone()),
                _ => None,
            };
            let times_out = matches!(spec, ControlSpec::Labelled(label) if self.failing_labels.contains(label));
            Ok(FakeControl {
                spec: spec.clone(),
                times_out,
            })
        }

        async fn prepare_download(&mut self) -> Result<DownloadWatch, PortalError> {
            self.calls.push("prepare".to_owned());
            Ok(DownloadWatch::default())
        }

        async fn await_download(
            &mut self,
            _watch: DownloadWatch,
            timeout: Duration,
        ) -> Result<CapturedDownload, PortalError> {
            self.calls.push("await".to_owned());
            if self
                .last_label
                .as_ref()
                .is_some_and(|label| self.failing_downloads.contains(label))
            {
                return Err(PortalError::DownloadTimeout { timeout });
            }
            self.downloads += 1;
            let path = self.download_dir.join("export.csv");
            if self.export_is_unparseable() {
                std::fs::write(&path, "date,amount\n2025-01-01,1,2\n")?;
            } else {
                std::fs::write(&path, format!("date,amount\n2025-01-01,{}\n", self.downloads))?;
            }
            Ok(CapturedDownload {
                path,
                suggested_name: "export.csv".to_owned(),
            })
        }

        async fn close(&mut self) -> Result<(), PortalError> {
            self.calls.push("close".to_owned());
            Ok(())
        }
    }

    fn clock() -> FixedClock {
        FixedClock(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
    }

    fn scratch(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&tmp);
        tmp
    }

    #[tokio::test]
    async fn unknown_store_fails_before_any_browser_call() {
        let tmp = scratch("report_harvest_orch_unknown_store");
        let catalog = catalog(None);
        let orchestrator =
            DownloadOrchestrator::new(&catalog, OutputLayout::new(tmp.join("reports")), clock(), XlsxIo);
        let mut session = FakeSession::new(&tmp.join("downloads"));

        let err = orchestrator.run_store(&mut session, "Nope").await.unwrap_err();

        assert!(matches!(err, ConfigError::UnknownStore { .. }));
        assert!(session.calls.is_empty());
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn unknown_preset_fails_before_any_browser_call() {
        let tmp = scratch("report_harvest_orch_unknown_preset");
        let catalog = catalog(Some(vec!["last_7_days".to_owned(), "fortnight".to_owned()]));
        let orchestrator =
            DownloadOrchestrator::new(&catalog, OutputLayout::new(tmp.join("reports")), clock(), XlsxIo);
        let mut session = FakeSession::new(&tmp.join("downloads"));

        let err = orchestrator.run_store(&mut session, STORE).await.unwrap_err();

        assert!(matches!(err, ConfigError::UnknownPreset(key) if key == "fortnight"));
        assert!(session.calls.is_empty());
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn plan_orders_presets_outer_and_reports_inner() {
        let catalog = catalog(None);
        let orchestrator = DownloadOrchestrator::new(&catalog, OutputLayout::new("reports"), clock(), XlsxIo);

        let plan = orchestrator.plan(STORE).unwrap();
        let order: Vec<(&str, &str)> = plan
            .attempts
            .iter()
            .map(|a| (a.meta.preset_key.as_str(), a.meta.report_key.as_str()))
            .collect();

        assert_eq!(
            order,
            [
                ("last_7_days", "sales"),
                ("last_7_days", "sales_conversion"),
                ("last_7_days", "customers"),
                ("last_month", "sales"),
                ("last_month", "sales_conversion"),
                ("last_month", "customers"),
            ]
        );
        assert_eq!(
            plan.attempts[0].url,
            "https://portal.test/home/store-1/analytics/sales?dateRange=custom&start=2025-03-04&end=2025-03-10"
        );
        assert_eq!(
            plan.attempts[3].url,
            "https://portal.test/home/store-1/analytics/sales?dateRange=custom&start=2025-02-01&end=2025-02-28"
        );
    }

    #[tokio::test]
    async fn full_run_reloads_shared_pages_and_writes_summaries() {
        let tmp = scratch("report_harvest_orch_full_run");
        let catalog = catalog(None);
        let layout = OutputLayout::new(tmp.join("reports"));
        let orchestrator = DownloadOrchestrator::new(&catalog, layout.clone(), clock(), XlsxIo);
        let mut session = FakeSession::new(&tmp.join("downloads"));

        let report = orchestrator.run_store(&mut session, STORE).await.unwrap();

        assert_eq!(report.succeeded(), 6);
        assert_eq!(report.failed(), 0);
        assert_eq!(session.count("navigate"), 4);
        assert_eq!(session.count("reload"), 2);
        assert_eq!(session.count("await"), 6);

        for outcome in &report.attempts {
            let AttemptOutcome::Downloaded(artifact) = outcome else {
                panic!("unexpected failure: {outcome:?}");
            };
            assert_eq!(artifact.path, layout.artifact_path(&artifact.meta));
            assert!(artifact.path.exists());
        }
        for planned in &orchestrator.plan(STORE).unwrap().attempts {
            assert!(!layout.staging_path(&planned.meta, "export.csv").exists());
        }

        assert_eq!(report.summaries.len(), 3);
        assert!(report.summary_failures.is_empty());
        let sales = XlsxIo
            .read_spreadsheet(&layout.summary_path(STORE, "sales"))
            .unwrap();
        assert_eq!(sales.len(), 2);
        assert_eq!(
            sales.headers,
            ["date", "amount", SOURCE_FILE_COLUMN, "store", "report"]
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn locate_timeout_skips_only_that_report() {
        let tmp = scratch("report_harvest_orch_locate_timeout");
        let catalog = catalog(None);
        let layout = OutputLayout::new(tmp.join("reports"));
        let orchestrator = DownloadOrchestrator::new(&catalog, layout.clone(), clock(), XlsxIo);
        let mut session = FakeSession::new(&tmp.join("downloads"));
        session.failing_labels.insert("Download customers".to_owned());

        let report = orchestrator.run_store(&mut session, STORE).await.unwrap();

        assert_eq!(report.succeeded(), 4);
        assert_eq!(report.failed(), 2);
        for failure in report.failures() {
            assert_eq!(failure.meta().report_key, "customers");
            assert!(matches!(
                failure,
                AttemptOutcome::Failed {
                    stage: AttemptStage::Locate,
                    ..
                }
            ));
        }

        assert_eq!(report.summaries.len(), 2);
        assert!(!layout.summary_path(STORE, "customers").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn failed_navigation_is_not_followed_by_reload() {
        let tmp = scratch("report_harvest_orch_failed_navigation");
        let catalog = catalog(Some(vec!["last_7_days".to_owned()]));
        let orchestrator =
            DownloadOrchestrator::new(&catalog, OutputLayout::new(tmp.join("reports")), clock(), XlsxIo);
        let mut session = FakeSession::new(&tmp.join("downloads"));
        session.failing_paths.insert("/analytics/sales".to_owned());

        let report = orchestrator.run_store(&mut session, STORE).await.unwrap();

        assert_eq!(report.succeeded(), 1);
        assert_eq!(session.count("reload"), 0);
        assert_eq!(session.count("navigate"), 3);
        assert!(report.failures().all(|f| matches!(
            f,
            AttemptOutcome::Failed {
                stage: AttemptStage::Navigate,
                ..
            }
        )));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn download_timeout_fails_at_capture_and_run_continues() {
        let tmp = scratch("report_harvest_orch_capture_timeout");
        let catalog = catalog(None);
        let layout = OutputLayout::new(tmp.join("reports"));
        let orchestrator = DownloadOrchestrator::new(&catalog, layout.clone(), clock(), XlsxIo);
        let mut session = FakeSession::new(&tmp.join("downloads"));
        session
            .failing_downloads
            .insert("Download conversion".to_owned());

        let report = orchestrator.run_store(&mut session, STORE).await.unwrap();

        assert_eq!(report.succeeded(), 4);
        assert_eq!(report.failed(), 2);
        for failure in report.failures() {
            assert_eq!(failure.meta().report_key, "sales_conversion");
            assert!(matches!(
                failure,
                AttemptOutcome::Failed {
                    stage: AttemptStage::Capture,
                    ..
                }
            ));
        }
        assert_eq!(session.count("await"), 6);
        assert_eq!(session.count("locate"), 6);

        assert_eq!(report.summaries.len(), 2);
        assert!(!layout.summary_path(STORE, "sales_conversion").exists());
        assert!(layout.summary_path(STORE, "customers").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn unparseable_export_fails_at_convert_and_keeps_raw_file() {
        let tmp = scratch("report_harvest_orch_convert_failure");
        let catalog = catalog(None);
        let layout = OutputLayout::new(tmp.join("reports"));
        let orchestrator = DownloadOrchestrator::new(&catalog, layout.clone(), clock(), XlsxIo);
        let mut session = FakeSession::new(&tmp.join("downloads"));
        session
            .unparseable_exports
            .push(("Download customers".to_owned(), "start=2025-02-01".to_owned()));

        let report = orchestrator.run_store(&mut session, STORE).await.unwrap();

        assert_eq!(report.succeeded(), 5);
        assert_eq!(report.failed(), 1);
        let Some(AttemptOutcome::Failed { meta, stage, .. }) = report.failures().next() else {
            panic!("expected one failed attempt");
        };
        assert_eq!(*stage, AttemptStage::Convert);
        assert_eq!(meta.report_key, "customers");
        assert_eq!(meta.preset_key, "last_month");

        let raw = layout.staging_path(meta, "export.csv");
        assert!(raw.exists());
        assert_eq!(
            std::fs::read_to_string(&raw).unwrap(),
            "date,amount\n2025-01-01,1,2\n"
        );
        assert!(!layout.artifact_path(meta).exists());

        assert_eq!(report.summaries.len(), 3);
        let customers = XlsxIo
            .read_spreadsheet(&layout.summary_path(STORE, "customers"))
            .unwrap();
        assert_eq!(customers.len(), 1);

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
