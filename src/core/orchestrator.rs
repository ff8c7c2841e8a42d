use crate::core::aggregator::aggregate;
use crate::core::pager::{ListingPager, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE};
use crate::domain::model::{
    flatten_subcategories, AggregationOutcome, Category, Report, Subcategory,
};
use crate::domain::ports::{CatalogSource, ConfigProvider, ListingSource, PricePublisher};
use crate::utils::error::{EtlError, Result};
use futures::future::join_all;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::{watch, Semaphore};

pub const DEFAULT_MAX_CONCURRENT_PIPELINES: usize = 8;
/// 設定允許的並行上限
pub const MAX_CONCURRENT_PIPELINES_LIMIT: usize = 256;

/// 分頁與並行上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub page_size: usize,
    pub max_pages: usize,
    pub max_concurrent_pipelines: usize,
}

impl PipelineSettings {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            page_size: config.page_size(),
            max_pages: config.max_pages(),
            max_concurrent_pipelines: config.max_concurrent_pipelines(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            max_concurrent_pipelines: DEFAULT_MAX_CONCURRENT_PIPELINES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// 執行期間持有，離開時（含提早返回）將狀態設回 Idle
struct RunGuard<'a> {
    state: &'a watch::Sender<RunState>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state.send_replace(RunState::Idle);
    }
}

/// 為每個子類別並行執行 分頁讀取 → 平均 → 回報，並彙整成報表
///
/// 同一實例同時只允許一個執行；執行中再次呼叫 `run` 會立即回傳
/// `RunInProgress`，不影響正在進行的執行與對外可觀察的狀態。
pub struct AggregationOrchestrator<C, L, P>
where
    C: CatalogSource,
    L: ListingSource + 'static,
    P: PricePublisher + 'static,
{
    catalog: Arc<C>,
    pager: ListingPager<L>,
    publisher: Arc<P>,
    settings: PipelineSettings,
    state: watch::Sender<RunState>,
    last_report: Mutex<Option<Report>>,
    last_error: Mutex<Option<String>>,
}

impl<C, L, P> AggregationOrchestrator<C, L, P>
where
    C: CatalogSource,
    L: ListingSource + 'static,
    P: PricePublisher + 'static,
{
    pub fn new(catalog: Arc<C>, listings: Arc<L>, publisher: Arc<P>, settings: PipelineSettings) -> Self {
        let (state, _) = watch::channel(RunState::Idle);
        Self {
            catalog,
            pager: ListingPager::new(listings, settings.page_size, settings.max_pages),
            publisher,
            settings,
            state,
            last_report: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    pub fn is_busy(&self) -> bool {
        self.state() == RunState::Running
    }

    /// 訂閱執行狀態變化
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    pub fn last_report(&self) -> Option<Report> {
        self.last_report
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// 讀取目錄並攤平子類別，不做分頁或回報
    pub async fn preview(&self) -> Result<Vec<Subcategory>> {
        let categories = self.load_catalog().await?;
        Ok(flatten_subcategories(&categories))
    }

    pub async fn run(&self) -> Result<Report> {
        let _guard = self.begin_run()?;
        let started = Instant::now();
        tracing::info!("🚀 Starting average price aggregation run");

        let result = self.execute().await;
        match &result {
            Ok(report) => {
                tracing::info!(
                    "✅ Run finished in {:?}: {} subcategories, {} succeeded, {} failed, {} partial",
                    started.elapsed(),
                    report.len(),
                    report.success_count(),
                    report.failure_count(),
                    report.partial_count()
                );
                self.record(Some(report.clone()), None);
            }
            Err(e) => {
                tracing::error!("❌ Run aborted: {}", e);
                self.record(None, Some(e.to_string()));
            }
        }
        result
    }

    fn begin_run(&self) -> Result<RunGuard<'_>> {
        let started = self.state.send_if_modified(|state| {
            if *state == RunState::Idle {
                *state = RunState::Running;
                true
            } else {
                false
            }
        });

        if !started {
            tracing::warn!("⚠️ Run requested while another run is in progress, rejecting");
            return Err(EtlError::RunInProgress);
        }
        Ok(RunGuard { state: &self.state })
    }

    fn record(&self, report: Option<Report>, error: Option<String>) {
        *self
            .last_report
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = report;
        *self
            .last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = error;
    }

    async fn load_catalog(&self) -> Result<Vec<Category>> {
        self.catalog.fetch_categories().await.map_err(|e| match e {
            EtlError::CatalogUnavailable { .. } => e,
            other => EtlError::CatalogUnavailable {
                reason: other.to_string(),
            },
        })
    }

    async fn execute(&self) -> Result<Report> {
        let categories = self.load_catalog().await?;
        let subcategories = flatten_subcategories(&categories);
        if subcategories.is_empty() {
            return Err(EtlError::EmptyCatalog);
        }

        tracing::info!(
            "📂 Catalog loaded: {} categories, {} subcategories (max {} concurrent)",
            categories.len(),
            subcategories.len(),
            self.settings.max_concurrent_pipelines
        );

        let permits = self
            .settings
            .max_concurrent_pipelines
            .clamp(1, MAX_CONCURRENT_PIPELINES_LIMIT);
        let semaphore = Arc::new(Semaphore::new(permits));
        let handles: Vec<_> = subcategories
            .iter()
            .cloned()
            .map(|subcategory| {
                let pager = self.pager.clone();
                let publisher = Arc::clone(&self.publisher);
                let semaphore = Arc::clone(&semaphore);

                tokio::spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            return AggregationOutcome::failure(
                                &subcategory.name,
                                format!("Semaphore acquire failed: {}", e),
                            )
                        }
                    };
                    process_subcategory(&pager, publisher.as_ref(), &subcategory).await
                })
            })
            .collect();

        // join_all 依提交順序回傳，報表順序即目錄順序
        let outcomes = join_all(handles)
            .await
            .into_iter()
            .zip(subcategories.iter())
            .map(|(joined, subcategory)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("❌ {}: task aborted: {}", subcategory.name, e);
                    AggregationOutcome::failure(
                        &subcategory.name,
                        format!("Subcategory task aborted: {}", e),
                    )
                }
            })
            .collect();

        Ok(Report::new(outcomes))
    }
}

/// 單一子類別的管線；所有錯誤在此轉為 Failure 結果
async fn process_subcategory<L, P>(
    pager: &ListingPager<L>,
    publisher: &P,
    subcategory: &Subcategory,
) -> AggregationOutcome
where
    L: ListingSource,
    P: PricePublisher,
{
    match run_pipeline(pager, publisher, subcategory).await {
        Ok(outcome) => {
            tracing::info!("📤 {}: {}", subcategory.name, outcome.message);
            outcome
        }
        Err(e) => {
            tracing::warn!("⚠️ {}: {}", subcategory.name, e);
            AggregationOutcome::failure(&subcategory.name, e.to_string())
        }
    }
}

async fn run_pipeline<L, P>(
    pager: &ListingPager<L>,
    publisher: &P,
    subcategory: &Subcategory,
) -> Result<AggregationOutcome>
where
    L: ListingSource,
    P: PricePublisher,
{
    let batch = pager.fetch_all_listings(subcategory.code).await?;
    let (average_price, contributing_count) = aggregate(&batch.listings, &subcategory.name)?;
    publisher.publish(&subcategory.name, average_price).await?;

    Ok(AggregationOutcome::success(
        &subcategory.name,
        average_price,
        contributing_count,
        batch.partial,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CategoryPrice, ListingPage, OutcomeStatus, TeacherListing};
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct MockCatalog {
        categories: Vec<Category>,
        fail_from_call: Option<usize>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl MockCatalog {
        fn new(categories: Vec<Category>) -> Self {
            Self {
                categories,
                fail_from_call: None,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn unavailable() -> Self {
            Self::new(Vec::new()).failing_from_call(0)
        }

        fn failing_from_call(mut self, call: usize) -> Self {
            self.fail_from_call = Some(call);
            self
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl CatalogSource for MockCatalog {
        async fn fetch_categories(&self) -> Result<Vec<Category>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            match self.fail_from_call {
                Some(from) if call >= from => Err(EtlError::CatalogUnavailable {
                    reason: "request failed with status: 503".to_string(),
                }),
                _ => Ok(self.categories.clone()),
            }
        }
    }

    #[derive(Default)]
    struct MockListings {
        pages: HashMap<i64, Vec<Vec<TeacherListing>>>,
        failing_after_first: HashSet<i64>,
        endless: HashSet<i64>,
        delays: HashMap<i64, Duration>,
    }

    #[async_trait]
    impl ListingSource for MockListings {
        async fn fetch_page(&self, code: i64, page: usize, _page_size: usize) -> Result<ListingPage> {
            if let Some(delay) = self.delays.get(&code) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing_after_first.contains(&code) && page > 0 {
                return Err(EtlError::PageFetchFailed {
                    code,
                    page,
                    reason: "Failed to fetch".to_string(),
                });
            }
            if self.endless.contains(&code) {
                return Ok(ListingPage {
                    teachers: vec![listing("endless", "Endless", 1.0)],
                    total_results: None,
                });
            }
            let teachers = self
                .pages
                .get(&code)
                .and_then(|pages| pages.get(page))
                .cloned()
                .unwrap_or_default();
            Ok(ListingPage {
                teachers,
                total_results: None,
            })
        }
    }

    #[derive(Default)]
    struct MockPublisher {
        failing: HashSet<String>,
        panicking: HashSet<String>,
        delay: Duration,
        delays: HashMap<String, Duration>,
        published: Mutex<Vec<(String, f64)>>,
        finished: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockPublisher {
        fn published(&self) -> Vec<(String, f64)> {
            self.published.lock().unwrap().clone()
        }

        fn finished(&self) -> Vec<String> {
            self.finished.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PricePublisher for MockPublisher {
        async fn publish(&self, subcategory_name: &str, average_price: f64) -> Result<()> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let delay = self.delays.get(subcategory_name).copied().unwrap_or(self.delay);
            tokio::time::sleep(delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.finished
                .lock()
                .unwrap()
                .push(subcategory_name.to_string());

            if self.panicking.contains(subcategory_name) {
                panic!("publisher exploded");
            }
            if self.failing.contains(subcategory_name) {
                return Err(EtlError::PublishFailed {
                    subcategory: subcategory_name.to_string(),
                    reason: "request failed with status: 500".to_string(),
                });
            }
            self.published
                .lock()
                .unwrap()
                .push((subcategory_name.to_string(), average_price));
            Ok(())
        }
    }

    fn listing(id: &str, category: &str, price: f64) -> TeacherListing {
        TeacherListing {
            id: id.to_string(),
            categories: vec![CategoryPrice {
                name: category.to_string(),
                price: serde_json::json!(price),
            }],
        }
    }

    fn sub(name: &str, code: Option<i64>) -> Subcategory {
        Subcategory {
            id: name.to_lowercase(),
            name: name.to_string(),
            code,
        }
    }

    fn catalog() -> Vec<Category> {
        vec![
            Category {
                id: "1".to_string(),
                name: "Music".to_string(),
                subcategories: vec![sub("Piano", Some(1)), sub("Guitar", Some(2))],
            },
            Category {
                id: "2".to_string(),
                name: "Languages".to_string(),
                subcategories: vec![sub("French", Some(3)), sub("Latin", None)],
            },
        ]
    }

    fn listings() -> MockListings {
        let mut pages = HashMap::new();
        pages.insert(
            1,
            vec![
                vec![listing("a", "Piano", 20.0), listing("b", "Piano", 30.0)],
                vec![listing("c", "Piano", 40.0)],
            ],
        );
        pages.insert(2, vec![vec![listing("d", "Guitar", 15.5)]]);
        pages.insert(3, vec![vec![listing("e", "Spanish", 99.0)]]);
        MockListings {
            pages,
            ..Default::default()
        }
    }

    fn orchestrator(
        catalog: MockCatalog,
        listings: MockListings,
        publisher: MockPublisher,
        settings: PipelineSettings,
    ) -> (
        AggregationOrchestrator<MockCatalog, MockListings, MockPublisher>,
        Arc<MockPublisher>,
    ) {
        let publisher = Arc::new(publisher);
        let orchestrator = AggregationOrchestrator::new(
            Arc::new(catalog),
            Arc::new(listings),
            Arc::clone(&publisher),
            settings,
        );
        (orchestrator, publisher)
    }

    fn names(report: &Report) -> Vec<&str> {
        report.iter().map(|o| o.subcategory_name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_run_produces_one_outcome_per_subcategory_in_order() {
        let (orchestrator, publisher) = orchestrator(
            MockCatalog::new(catalog()),
            listings(),
            MockPublisher::default(),
            PipelineSettings::default(),
        );

        let report = orchestrator.run().await.unwrap();

        assert_eq!(names(&report), vec!["Piano", "Guitar", "French", "Latin"]);
        assert_eq!(report.outcomes[0].average_price, 30.0);
        assert_eq!(report.outcomes[0].contributing_count, 3);
        assert_eq!(report.outcomes[1].average_price, 15.5);
        assert_eq!(report.success_count(), 4);
        assert_eq!(publisher.published().len(), 4);
    }

    #[tokio::test]
    async fn test_order_independent_of_completion_order() {
        let mut slow_first = listings();
        slow_first.delays.insert(1, Duration::from_millis(80));
        slow_first.delays.insert(2, Duration::from_millis(40));

        let (orchestrator, publisher) = orchestrator(
            MockCatalog::new(catalog()),
            slow_first,
            MockPublisher::default(),
            PipelineSettings::default(),
        );

        let report = orchestrator.run().await.unwrap();

        assert_eq!(names(&report), vec!["Piano", "Guitar", "French", "Latin"]);
        // 完成順序與報表順序不同
        assert_ne!(publisher.published()[0].0, "Piano");
    }

    #[tokio::test]
    async fn test_zero_contributions_is_success_with_zero_average() {
        let (orchestrator, publisher) = orchestrator(
            MockCatalog::new(catalog()),
            listings(),
            MockPublisher::default(),
            PipelineSettings::default(),
        );

        let report = orchestrator.run().await.unwrap();

        for name in ["French", "Latin"] {
            let outcome = report.iter().find(|o| o.subcategory_name == name).unwrap();
            assert_eq!(outcome.status, OutcomeStatus::Success);
            assert_eq!(outcome.average_price, 0.0);
            assert_eq!(outcome.contributing_count, 0);
        }
        assert!(publisher.published().contains(&("Latin".to_string(), 0.0)));
    }

    #[tokio::test]
    async fn test_catalog_failure_is_fatal() {
        let (orchestrator, publisher) = orchestrator(
            MockCatalog::unavailable(),
            listings(),
            MockPublisher::default(),
            PipelineSettings::default(),
        );

        let result = orchestrator.run().await;

        assert!(matches!(result, Err(EtlError::CatalogUnavailable { .. })));
        assert!(orchestrator.last_report().is_none());
        assert!(orchestrator
            .last_error()
            .unwrap()
            .contains("Category catalog unavailable"));
        assert!(!orchestrator.is_busy());
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_empty_catalog_is_distinct_fatal_error() {
        let empty = vec![Category {
            id: "1".to_string(),
            name: "Nothing".to_string(),
            subcategories: vec![],
        }];
        let (orchestrator, _) = orchestrator(
            MockCatalog::new(empty),
            listings(),
            MockPublisher::default(),
            PipelineSettings::default(),
        );

        let result = orchestrator.run().await;

        assert!(matches!(result, Err(EtlError::EmptyCatalog)));
        assert!(orchestrator.last_error().is_some());
        assert_eq!(orchestrator.state(), RunState::Idle);
    }

    #[tokio::test]
    async fn test_publish_failure_is_confined_to_one_subcategory() {
        let publisher = MockPublisher {
            failing: HashSet::from(["Guitar".to_string()]),
            ..Default::default()
        };
        let (orchestrator, publisher) = orchestrator(
            MockCatalog::new(catalog()),
            listings(),
            publisher,
            PipelineSettings::default(),
        );

        let report = orchestrator.run().await.unwrap();

        assert_eq!(report.len(), 4);
        assert_eq!(report.success_count(), 3);
        assert_eq!(report.outcomes[1].status, OutcomeStatus::Failure);
        assert!(report.outcomes[1].message.contains("Guitar"));
        assert_eq!(publisher.published().len(), 3);
    }

    #[tokio::test]
    async fn test_panicking_task_becomes_failure() {
        let publisher = MockPublisher {
            panicking: HashSet::from(["French".to_string()]),
            ..Default::default()
        };
        let (orchestrator, _) = orchestrator(
            MockCatalog::new(catalog()),
            listings(),
            publisher,
            PipelineSettings::default(),
        );

        let report = orchestrator.run().await.unwrap();

        assert_eq!(report.len(), 4);
        assert_eq!(report.outcomes[2].status, OutcomeStatus::Failure);
        assert!(report.outcomes[2].message.contains("task aborted"));
        assert_eq!(report.success_count(), 3);
    }

    #[tokio::test]
    async fn test_partial_pagination_is_flagged() {
        let mut partial = listings();
        partial.failing_after_first.insert(1);

        let (orchestrator, _) = orchestrator(
            MockCatalog::new(catalog()),
            partial,
            MockPublisher::default(),
            PipelineSettings::default(),
        );

        let report = orchestrator.run().await.unwrap();
        let piano = &report.outcomes[0];

        assert_eq!(piano.status, OutcomeStatus::Success);
        assert!(piano.partial);
        assert_eq!(piano.contributing_count, 2);
        assert_eq!(piano.average_price, 25.0);
        assert_eq!(report.partial_count(), 1);
    }

    #[tokio::test]
    async fn test_page_limit_fails_only_that_subcategory() {
        let mut endless = listings();
        endless.endless.insert(2);

        let settings = PipelineSettings {
            max_pages: 5,
            ..Default::default()
        };
        let (orchestrator, publisher) = orchestrator(
            MockCatalog::new(catalog()),
            endless,
            MockPublisher::default(),
            settings,
        );

        let report = orchestrator.run().await.unwrap();

        assert_eq!(report.outcomes[1].status, OutcomeStatus::Failure);
        assert!(report.outcomes[1].message.contains("exceeded 5 pages"));
        assert!(!publisher
            .published()
            .iter()
            .any(|(name, _)| name == "Guitar"));
        assert_eq!(report.success_count(), 3);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let many: Vec<Subcategory> = (0..6).map(|i| sub(&format!("S{}", i), Some(i))).collect();
        let catalog = vec![Category {
            id: "1".to_string(),
            name: "Many".to_string(),
            subcategories: many,
        }];
        let publisher = MockPublisher {
            delay: Duration::from_millis(30),
            ..Default::default()
        };
        let settings = PipelineSettings {
            max_concurrent_pipelines: 2,
            ..Default::default()
        };
        let (orchestrator, publisher) = orchestrator(
            MockCatalog::new(catalog),
            MockListings::default(),
            publisher,
            settings,
        );

        let report = orchestrator.run().await.unwrap();

        assert_eq!(report.len(), 6);
        let peak = publisher.max_in_flight.load(Ordering::SeqCst);
        assert_eq!(peak, 2, "peak in-flight was {}", peak);
    }

    #[tokio::test]
    async fn test_slow_failing_subcategory_does_not_delay_siblings() {
        let publisher = MockPublisher {
            failing: HashSet::from(["Piano".to_string()]),
            delays: HashMap::from([("Piano".to_string(), Duration::from_millis(200))]),
            ..Default::default()
        };
        let (orchestrator, publisher) = orchestrator(
            MockCatalog::new(catalog()),
            listings(),
            publisher,
            PipelineSettings::default(),
        );

        let report = orchestrator.run().await.unwrap();

        let finished = publisher.finished();
        assert_eq!(finished.len(), 4);
        assert_eq!(finished.last().map(String::as_str), Some("Piano"));
        let published: Vec<String> = publisher
            .published()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(published.len(), 3);
        assert!(!published.contains(&"Piano".to_string()));

        assert_eq!(report.outcomes[0].status, OutcomeStatus::Failure);
        assert_eq!(report.success_count(), 3);
        assert_eq!(names(&report), vec!["Piano", "Guitar", "French", "Latin"]);
    }

    #[tokio::test]
    async fn test_oversized_concurrency_setting_is_clamped() {
        let settings = PipelineSettings {
            max_concurrent_pipelines: usize::MAX,
            ..Default::default()
        };
        let (orchestrator, publisher) = orchestrator(
            MockCatalog::new(catalog()),
            listings(),
            MockPublisher::default(),
            settings,
        );

        let report = orchestrator.run().await.unwrap();

        assert_eq!(report.success_count(), 4);
        assert_eq!(publisher.published().len(), 4);
    }

    #[tokio::test]
    async fn test_second_run_while_running_is_rejected() {
        let (orchestrator, _) = orchestrator(
            MockCatalog::new(catalog()).with_delay(Duration::from_millis(50)),
            listings(),
            MockPublisher::default(),
            PipelineSettings::default(),
        );

        let (first, second) = tokio::join!(orchestrator.run(), orchestrator.run());

        assert!(first.is_ok());
        assert!(matches!(second, Err(EtlError::RunInProgress)));
        // 被拒絕的呼叫不覆寫上次結果
        assert!(orchestrator.last_error().is_none());
        assert_eq!(orchestrator.last_report().unwrap().len(), 4);
        assert!(!orchestrator.is_busy());
    }

    #[tokio::test]
    async fn test_state_transitions_are_observable() {
        let (orchestrator, _) = orchestrator(
            MockCatalog::new(catalog()).with_delay(Duration::from_millis(20)),
            listings(),
            MockPublisher::default(),
            PipelineSettings::default(),
        );
        let mut state = orchestrator.subscribe();
        assert_eq!(*state.borrow(), RunState::Idle);

        let observer = async {
            state.changed().await.unwrap();
            let seen = *state.borrow_and_update();
            seen
        };
        let (seen, result) = tokio::join!(observer, orchestrator.run());

        assert_eq!(seen, RunState::Running);
        assert!(result.is_ok());
        assert_eq!(orchestrator.state(), RunState::Idle);
    }

    #[tokio::test]
    async fn test_repeated_runs_are_structurally_equal() {
        let (orchestrator, _) = orchestrator(
            MockCatalog::new(catalog()),
            listings(),
            MockPublisher::default(),
            PipelineSettings::default(),
        );

        let first = orchestrator.run().await.unwrap();
        let second = orchestrator.run().await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_fatal_run_clears_previous_report() {
        let (orchestrator, _) = orchestrator(
            MockCatalog::new(catalog()).failing_from_call(1),
            listings(),
            MockPublisher::default(),
            PipelineSettings::default(),
        );

        orchestrator.run().await.unwrap();
        assert_eq!(orchestrator.last_report().map(|r| r.len()), Some(4));
        assert!(orchestrator.last_error().is_none());

        assert!(orchestrator.run().await.is_err());
        assert!(orchestrator.last_report().is_none());
        assert!(orchestrator.last_error().is_some());
    }

    #[tokio::test]
    async fn test_preview_lists_subcategories_without_publishing() {
        let (orchestrator, publisher) = orchestrator(
            MockCatalog::new(catalog()),
            listings(),
            MockPublisher::default(),
            PipelineSettings::default(),
        );

        let subcategories = orchestrator.preview().await.unwrap();

        assert_eq!(subcategories.len(), 4);
        assert_eq!(subcategories[3].code, None);
        assert!(publisher.published().is_empty());
        assert!(orchestrator.last_report().is_none());
    }
}
