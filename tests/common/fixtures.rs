//! Mock-site pages and mount helpers

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path of the newer article on the mock root page
pub const NEW_ARTICLE_PATH: &str = "/2024/05/20240530-a.html";

/// Path of the older article on the mock root page
pub const OLD_ARTICLE_PATH: &str = "/2024/04/20240401-b.html";

/// Path of the subscription file linked from the newer article
pub const RESOURCE_PATH: &str = "/240530/abc123.txt";

/// Subscription body served by the mock resource host
pub const VMESS_BODY: &str = "vmess://eyJ2IjoiMiIsInBzIjoiZnJlZSJ9";

/// Root page with two dated article links, older one first
pub fn root_page() -> String {
    format!(
        r#"<html><body>
            <div class="list">
                <a href="{old}">2024年4月1日 免费节点</a>
                <a href="{new}">2024年5月30日 免费节点</a>
                <a href="/about.html">关于</a>
            </div>
        </body></html>"#,
        old = OLD_ARTICLE_PATH,
        new = NEW_ARTICLE_PATH,
    )
}

/// Article page mentioning a less specific link before the strict one
pub fn article_page(resource_host: &str) -> String {
    format!(
        r#"<html><body>
            <h1 class="post-title">2024年5月30日 免费节点</h1>
            <p>备用: http://{host}/mirror/old.txt</p>
            <p>v2ray订阅链接：http://{host}{path}。</p>
        </body></html>"#,
        host = resource_host,
        path = RESOURCE_PATH,
    )
}

/// Mount a 200 response with `body` on `GET route`
pub async fn mount_page(server: &MockServer, route: &str, body: impl Into<String>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.into()))
        .mount(server)
        .await;
}

/// Mount a bare status response on `GET route`
pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mount the full happy-path site: root, article and subscription
pub async fn mount_happy_site(server: &MockServer, resource_host: &str) {
    mount_page(server, "/", root_page()).await;
    mount_page(server, NEW_ARTICLE_PATH, article_page(resource_host)).await;
    mount_page(server, RESOURCE_PATH, VMESS_BODY).await;
}
