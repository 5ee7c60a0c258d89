use super::*;
use crate::config::{DelayRange, FetchConfig, RetryConfig, SiteConfig};
use crate::types::ArticleHeuristic;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_fetcher() -> Fetcher {
    Fetcher::new(FetchConfig {
        timeout: Duration::from_secs(2),
        request_delay: DelayRange::ZERO,
        retry: RetryConfig {
            max_attempts: 2,
            retry_delay: Duration::from_millis(5),
            blocked_delay: Duration::from_millis(5),
        },
        ..FetchConfig::default()
    })
    .unwrap()
}

fn rules_for(server: &MockServer) -> ArticleHeuristics {
    ArticleHeuristics::from_site(&SiteConfig {
        base_url: server.uri(),
        ..SiteConfig::default()
    })
    .unwrap()
}

fn may_2024() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()
}

#[tokio::test]
async fn test_locates_newest_dated_article() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <a href="/2024/05/20240530-a.html">May 30</a>
                <a href="/2024/04/20240401-b.html">April 1</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = fast_fetcher();
    let rules = rules_for(&mock_server);
    let article = ArticleLocator::new(&fetcher, &rules)
        .locate_latest_article_on(may_2024())
        .await
        .unwrap();

    assert_eq!(
        article.url.as_str(),
        format!("{}/2024/05/20240530-a.html", mock_server.uri())
    );
    assert_eq!(article.date_key.as_str(), "20240530");
}

#[tokio::test]
async fn test_listing_not_requested_when_root_has_candidates() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<h3><a href="/post/hello">hi</a></h3>"#),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2024/05/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let fetcher = fast_fetcher();
    let rules = rules_for(&mock_server);
    let article = ArticleLocator::new(&fetcher, &rules)
        .locate_latest_article_on(may_2024())
        .await
        .unwrap();

    assert_eq!(article.url.path(), "/post/hello");
    assert!(article.date_key.is_oldest());
}

#[tokio::test]
async fn test_falls_back_to_monthly_listing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>maintenance</p>"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2024/05/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="/2024/05/20240531-free.html">free nodes</a>
               <a href="/2024/05/20240530-older.html">older</a>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = fast_fetcher();
    let rules = rules_for(&mock_server);
    let article = ArticleLocator::new(&fetcher, &rules)
        .locate_latest_article_on(may_2024())
        .await
        .unwrap();

    assert_eq!(article.url.path(), "/2024/05/20240531-free.html");
    assert_eq!(article.heuristic, ArticleHeuristic::MonthlyListing);
}

#[tokio::test]
async fn test_not_found_when_listing_missing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>nothing here</p>"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2024/05/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let fetcher = fast_fetcher();
    let rules = rules_for(&mock_server);
    let result = ArticleLocator::new(&fetcher, &rules)
        .locate_latest_article_on(may_2024())
        .await;

    assert!(matches!(
        result,
        Err(Error::NotFound {
            stage: PipelineStage::LocateArticle,
            ..
        })
    ));
}

#[tokio::test]
async fn test_unreachable_root_is_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(403))
        .expect(2)
        .mount(&mock_server)
        .await;

    let fetcher = fast_fetcher();
    let rules = rules_for(&mock_server);
    let result = ArticleLocator::new(&fetcher, &rules)
        .locate_latest_article_on(may_2024())
        .await;

    assert_eq!(
        result.unwrap_err().stage(),
        Some(PipelineStage::LocateArticle)
    );
}
