//! Crawler coordinator - main crawl orchestration logic
//!
//! Every node of the hierarchy is handled by its own task:
//! 1. Consult the resume guard for an artifact left by an earlier run
//! 2. On a miss, fetch the node under the global fetch limiter
//! 3. Classify the document as branch, leaf or absent
//! 4. Persist it (skipped on a cache hit)
//! 5. For a branch, spawn one task per child and wait for all of them
//!
//! A parent is only done once every child is done. Fetch failures stay at
//! the node they happened on: a confirmed absence becomes a sentinel artifact,
//! anything else is logged and retried on the next run. Only local I/O errors
//! and panicking tasks end the crawl.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, FetchError, Fetcher};
use crate::crawler::scheduler::FetchLimiter;
use crate::document::{AreaNode, Document, DocumentKind};
use crate::locator::Level;
use crate::mirror::{check_cache, child_dir, persist, ArtifactKind, CacheLookup};
use crate::output::{CrawlCounters, CrawlStatistics};
use crate::state::{NodeOutcome, TaskState};
use crate::MirrorError;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Called once for every node that finishes, in completion order
pub type CompletionCallback = Arc<dyn Fn(&NodeCompletion) + Send + Sync>;

/// Report of one finished node
#[derive(Debug, Clone)]
pub struct NodeCompletion {
    pub code: String,
    pub depth: u32,
    /// The node's mirror directory
    pub mirror_path: PathBuf,
    pub outcome: NodeOutcome,
    /// Document shape, when one was obtained
    pub kind: Option<DocumentKind>,
    pub finished_at: Instant,
}

/// Unit of work for one node
///
/// Created by the parent's task, consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub node: AreaNode,
    pub depth: u32,
    pub parent_path: PathBuf,
    is_root: bool,
}

impl CrawlTask {
    /// The root listing, whose mirror directory is the mirror root itself
    pub fn root(start_code: impl Into<String>, mirror_root: impl Into<PathBuf>) -> Self {
        Self {
            node: AreaNode::new(start_code, ""),
            depth: 0,
            parent_path: mirror_root.into(),
            is_root: true,
        }
    }

    /// Task for a child of this node, one level deeper
    pub fn child(&self, node: AreaNode) -> Self {
        Self {
            node,
            depth: self.depth + 1,
            parent_path: self.mirror_path(),
            is_root: false,
        }
    }

    /// Directory holding this node's artifact and its children
    pub fn mirror_path(&self) -> PathBuf {
        if self.is_root {
            self.parent_path.clone()
        } else {
            child_dir(&self.parent_path, &self.node)
        }
    }

    pub fn level(&self) -> Level {
        Level::from_depth(self.depth)
    }
}

/// Everything a crawl task needs, shared by all of them
struct CrawlContext {
    fetcher: Fetcher,
    counters: CrawlCounters,
    max_depth: u32,
    use_cache: bool,
    on_complete: Option<CompletionCallback>,
}

impl CrawlContext {
    fn finish(
        &self,
        task: &CrawlTask,
        dir: &Path,
        outcome: NodeOutcome,
        kind: Option<DocumentKind>,
    ) {
        self.counters.record_outcome(outcome);
        if let Some(callback) = &self.on_complete {
            callback(&NodeCompletion {
                code: task.node.code.clone(),
                depth: task.depth,
                mirror_path: dir.to_path_buf(),
                outcome,
                kind,
                finished_at: Instant::now(),
            });
        }
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    fetcher: Fetcher,
    root: CrawlTask,
    max_depth: u32,
    use_cache: bool,
    on_complete: Option<CompletionCallback>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(MirrorError)` - Bad endpoints or HTTP client setup failed
    pub fn new(config: Config) -> Result<Self, MirrorError> {
        let endpoints = config.remote.endpoints()?;
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;
        let limiter = FetchLimiter::new(config.crawler.max_concurrent_fetches as usize);
        let fetcher = Fetcher::new(
            client,
            endpoints,
            config.remote.region_kind,
            config.crawler.retry_policy(),
            limiter,
        );

        Ok(Self {
            fetcher,
            root: CrawlTask::root(config.remote.start_code, config.output.mirror_root),
            max_depth: config.crawler.max_depth,
            use_cache: true,
            on_complete: None,
        })
    }

    /// Ignores existing artifacts: every node is fetched and rewritten
    pub fn with_fresh(mut self, fresh: bool) -> Self {
        self.use_cache = !fresh;
        self
    }

    pub fn with_completion_callback(mut self, callback: CompletionCallback) -> Self {
        self.on_complete = Some(callback);
        self
    }

    /// The global fetch limiter; closing it winds the crawl down
    pub fn limiter(&self) -> &FetchLimiter {
        self.fetcher.limiter()
    }

    pub fn root(&self) -> &CrawlTask {
        &self.root
    }

    /// Runs the crawl from the root node until every reachable node is done
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStatistics)` - The crawl finished; some nodes may have
    ///   soft-failed and are counted in `nodes_failed`
    /// * `Err(MirrorError)` - The mirror could not be written, or a task died
    pub async fn run(&self) -> Result<CrawlStatistics, MirrorError> {
        let started_at = Utc::now();
        let clock = Instant::now();
        tracing::info!(
            "Starting {} crawl from code {} into {}",
            self.fetcher.region_kind(),
            self.root.node.code,
            self.root.parent_path.display()
        );

        let context = Arc::new(CrawlContext {
            fetcher: self.fetcher.clone(),
            counters: CrawlCounters::new(),
            max_depth: self.max_depth,
            use_cache: self.use_cache,
            on_complete: self.on_complete.clone(),
        });

        process_node(Arc::clone(&context), self.root.clone()).await?;

        let stats = context.counters.snapshot(
            started_at,
            Utc::now(),
            self.fetcher.limiter().peak_in_flight(),
        );
        tracing::info!(
            "Crawl finished in {:?}: {} cached, {} saved, {} missing, {} errors, {} requests",
            clock.elapsed(),
            stats.nodes_cached,
            stats.nodes_saved,
            stats.nodes_missing,
            stats.nodes_failed,
            stats.requests
        );

        Ok(stats)
    }
}

/// Converts a confirmed absence into the `Absent` document
///
/// Every other fetch error is handed back unchanged.
pub fn absorb_not_found(err: FetchError) -> Result<Document, FetchError> {
    if err.is_not_found() {
        Ok(Document::Absent)
    } else {
        Err(err)
    }
}

fn advance(state: &mut TaskState, next: TaskState, dir: &Path) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal transition {} -> {} for {}",
        state,
        next,
        dir.display()
    );
    tracing::trace!("{}: {} -> {}", dir.display(), state, next);
    *state = next;
}

/// Processes one node and, for branches, its whole subtree
///
/// Boxed because it spawns itself for every child.
fn process_node(
    ctx: Arc<CrawlContext>,
    task: CrawlTask,
) -> BoxFuture<'static, Result<NodeOutcome, MirrorError>> {
    async move {
        let dir = task.mirror_path();
        let code = task.node.code.as_str();
        let mut state = TaskState::Init;

        let lookup = if ctx.use_cache {
            check_cache(&dir, code).await
        } else {
            CacheLookup::NotCached
        };

        let (document, outcome) = match lookup {
            CacheLookup::Hit(document) => {
                advance(&mut state, TaskState::CacheHit, &dir);
                (document, NodeOutcome::Cached)
            }
            CacheLookup::NotCached => {
                advance(&mut state, TaskState::CacheMiss, &dir);
                advance(&mut state, TaskState::Fetching, &dir);

                let fetched = ctx
                    .fetcher
                    .fetch_node(code, task.depth, &ctx.counters)
                    .await
                    .or_else(absorb_not_found);

                match fetched {
                    Ok(Document::Absent) => (Document::Absent, NodeOutcome::Missing),
                    Ok(document) => (document, NodeOutcome::Saved),
                    Err(err) => {
                        advance(&mut state, TaskState::Failed, &dir);
                        tracing::warn!("error   {} [{}]: {}", dir.display(), task.level(), err);
                        ctx.finish(&task, &dir, NodeOutcome::Failed, None);
                        return Ok(NodeOutcome::Failed);
                    }
                }
            }
        };

        let kind = document.kind();
        advance(&mut state, TaskState::Classified(kind), &dir);
        ctx.counters.record_kind(kind);

        let artifact = ArtifactKind::for_document(&document).path_in(&dir, code);
        if outcome != NodeOutcome::Cached {
            advance(&mut state, TaskState::Persisting, &dir);
            persist(&document, &dir, code).await?;
        }

        if let Document::Area(area) = document {
            advance(&mut state, TaskState::Recursing, &dir);
            if task.depth >= ctx.max_depth {
                tracing::warn!(
                    "{} lists {} children below the depth limit {}; not descending",
                    artifact.display(),
                    area.regions.len(),
                    ctx.max_depth
                );
            } else {
                join_children(&ctx, &task, &dir, area.regions).await?;
            }
        }

        advance(&mut state, TaskState::Done, &dir);
        tracing::info!("{:<7} {} [{}]", outcome, artifact.display(), task.level());
        ctx.finish(&task, &dir, outcome, Some(kind));
        Ok(outcome)
    }
    .boxed()
}

/// Spawns a task per child and waits for every one of them
///
/// The first child that fails with a run-ending error is returned; dropping
/// the join set aborts its remaining siblings.
async fn join_children(
    ctx: &Arc<CrawlContext>,
    task: &CrawlTask,
    dir: &Path,
    children: Vec<AreaNode>,
) -> Result<(), MirrorError> {
    let mut set = JoinSet::new();
    for node in children {
        set.spawn(process_node(Arc::clone(ctx), task.child(node)));
    }

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => return Err(err),
            Err(join_err) => {
                return Err(MirrorError::TaskPanicked {
                    path: dir.to_path_buf(),
                    message: join_err.to_string(),
                })
            }
        }
    }

    Ok(())
}
