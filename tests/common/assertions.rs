//! Assertions over the files a run leaves behind

use node_crawler::Pipeline;
use serde_json::Value;

/// Read and parse the status record written by `pipeline`
pub fn read_status(pipeline: &Pipeline) -> Value {
    let path = &pipeline.config().output.status_path;
    let raw = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("status record {} unreadable: {}", path.display(), e));
    serde_json::from_str(&raw).expect("status record is not valid JSON")
}

/// Read the artifact written by `pipeline`, if any
pub fn read_artifact(pipeline: &Pipeline) -> Option<String> {
    std::fs::read_to_string(&pipeline.config().output.artifact_path).ok()
}

/// Assert the status record's success flag and URLs
pub fn assert_status(
    status: &Value,
    success: bool,
    article_url: Option<&str>,
    subscription_url: Option<&str>,
) {
    assert_eq!(status["success"], success, "unexpected success flag");
    match article_url {
        Some(url) => assert_eq!(status["article_url"], url),
        None => assert!(status["article_url"].is_null(), "article_url should be null"),
    }
    match subscription_url {
        Some(url) => assert_eq!(status["subscription_url"], url),
        None => assert!(
            status["subscription_url"].is_null(),
            "subscription_url should be null"
        ),
    }
    assert!(status["last_run"].is_string(), "last_run missing");
}
