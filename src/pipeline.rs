//! Pipeline driver: locate → extract → retrieve, then record
//!
//! Stages run strictly in sequence and the first failure stops the run. The
//! status record is written on every run, carrying whatever the stages found
//! before stopping. The artifact is only touched after the content has been
//! validated.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::extractor::{LinkPatterns, ResourceLinkExtractor};
use crate::fetcher::Fetcher;
use crate::locator::{ArticleHeuristics, ArticleLocator};
use crate::recorder::RunRecorder;
use crate::retriever::ResourceRetriever;
use crate::types::{ArticleReference, ContentFormat, ResourceLink, RunStatus};
use chrono::{Local, NaiveDate};
use tracing::{error, info};

/// Outcome of one pipeline run
#[derive(Debug)]
pub struct RunReport {
    /// The status record handed to the recorder
    pub status: RunStatus,
    /// Format of the saved content, when the run got that far
    pub format: Option<ContentFormat>,
    /// First error of the run, or the status-write error
    pub error: Option<Error>,
}

impl RunReport {
    /// True when the artifact and the status record were both written
    pub fn success(&self) -> bool {
        self.status.success && self.error.is_none()
    }
}

/// What the stages produced so far
#[derive(Default)]
struct Progress {
    article: Option<ArticleReference>,
    link: Option<ResourceLink>,
}

/// One crawl pipeline with its own fetcher, rules and recorder
///
/// A pipeline owns a single [`Fetcher`], so two pipelines never share an
/// identity or a cookie jar.
pub struct Pipeline {
    config: Config,
    fetcher: Fetcher,
    heuristics: ArticleHeuristics,
    patterns: LinkPatterns,
    recorder: RunRecorder,
}

impl Pipeline {
    /// Validate `config` and build every stage from it
    ///
    /// # Errors
    /// Returns `Error::Config` for invalid settings, selectors or patterns
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let fetcher = Fetcher::new(config.fetch.clone())?;
        let heuristics = ArticleHeuristics::from_site(&config.site)?;
        let patterns = LinkPatterns::from_site(&config.site)?;
        let recorder = RunRecorder::new(config.output.clone());

        Ok(Self {
            config,
            fetcher,
            heuristics,
            patterns,
            recorder,
        })
    }

    /// Configuration this pipeline was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The fetcher shared by all stages
    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Run once, using today's local date for the listing fallback
    pub async fn run(&self) -> RunReport {
        self.run_on(Local::now().date_naive()).await
    }

    /// Run once, using `today` for the listing fallback
    ///
    /// Never fails: stage errors end up in the report and in the status record.
    pub async fn run_on(&self, today: NaiveDate) -> RunReport {
        let mut progress = Progress::default();

        let (success, format, mut failure) = match self.execute(today, &mut progress).await {
            Ok(format) => (true, Some(format), None),
            Err(e) => {
                match e.stage() {
                    Some(stage) => error!(stage = %stage, error = %e, "Pipeline stopped"),
                    None => error!(error = %e, "Pipeline stopped"),
                }
                (false, None, Some(e))
            }
        };

        let status = RunStatus::now(success, progress.article.as_ref(), progress.link.as_ref());
        if let Err(e) = self.recorder.save_status(&status).await {
            error!(error = %e, "Could not save run status");
            failure.get_or_insert(e);
        }

        info!(
            success,
            article = status.article_url.as_deref().unwrap_or("-"),
            subscription = status.resource_url.as_deref().unwrap_or("-"),
            "Run finished"
        );

        RunReport {
            status,
            format,
            error: failure,
        }
    }

    async fn execute(&self, today: NaiveDate, progress: &mut Progress) -> Result<ContentFormat> {
        let article = ArticleLocator::new(&self.fetcher, &self.heuristics)
            .locate_latest_article_on(today)
            .await?;
        let article = progress.article.insert(article);

        let link = ResourceLinkExtractor::new(&self.fetcher, &self.patterns)
            .extract_resource_link(&article.url)
            .await?;
        let link = progress.link.insert(link);

        let content = ResourceRetriever::new(&self.fetcher, &self.config.site.content)
            .retrieve(link)
            .await?;

        self.recorder.save_artifact(content.body()).await?;
        Ok(content.format())
    }
}

/// Build a pipeline from `config`, run it once and report success
///
/// Invalid configuration is logged and reported as a failed run.
pub async fn run_once(config: Config) -> bool {
    match Pipeline::new(config) {
        Ok(pipeline) => pipeline.run().await.success(),
        Err(e) => {
            error!(error = %e, "Could not start pipeline");
            false
        }
    }
}
