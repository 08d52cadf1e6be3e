//! Releases endpoint contract tests.
//!
//! Verify the exact request shape sent to the GitHub releases API and how the
//! resolver reads its responses.

use inline_updater::{Platform, ReleaseResolver, UpdaterError};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RELEASES_PATH: &str = "/repos/justgo97/electron-update-test/releases";

fn resolver(server: &MockServer, platform: Platform) -> ReleaseResolver {
    ReleaseResolver::new(platform)
        .expect("build resolver")
        .with_api_base(server.uri())
}

async fn serve(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(RELEASES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_request_shape() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(RELEASES_PATH))
        .and(query_param("per_page", "100"))
        .and(header("accept", "application/vnd.github.preview"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let result = resolver(&server, Platform::Windows)
        .resolve("justgo97", "electron-update-test")
        .await;
    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn test_resolves_nupkg_release_on_windows() {
    let server = MockServer::start().await;
    serve(
        &server,
        json!([{
            "tag_name": "v1.0.0",
            "draft": false,
            "prerelease": false,
            "body": "First stable release",
            "assets": [{
                "name": "file.nupkg",
                "browser_download_url": "https://github.com/justgo97/electron-update-test/releases/download/v1.0.0/file.nupkg"
            }]
        }]),
    )
    .await;

    let resolved = resolver(&server, Platform::Windows)
        .resolve("justgo97", "electron-update-test")
        .await
        .expect("resolve")
        .expect("eligible release");

    assert_eq!(resolved.version, "v1.0.0");
    assert_eq!(resolved.notes, "First stable release");
    assert_eq!(
        resolved.download_url,
        "https://github.com/justgo97/electron-update-test/releases/download/v1.0.0"
    );
}

#[tokio::test]
async fn test_nupkg_release_ignored_on_macos() {
    let server = MockServer::start().await;
    serve(
        &server,
        json!([{
            "tag_name": "v1.0.0",
            "assets": [{"name": "file.nupkg", "browser_download_url": ""}]
        }]),
    )
    .await;

    let result = resolver(&server, Platform::MacOs)
        .resolve("justgo97", "electron-update-test")
        .await;
    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn test_macos_picks_darwin_asset_past_newer_windows_only_release() {
    let server = MockServer::start().await;
    serve(
        &server,
        json!([
            {"tag_name": "v1.1.0", "assets": [{"name": "app-1.1.0-full.nupkg"}]},
            {"tag_name": "v1.0.0", "assets": [{"name": "app-darwin-x64-1.0.0.zip"}]}
        ]),
    )
    .await;

    let resolved = resolver(&server, Platform::MacOs)
        .resolve("justgo97", "electron-update-test")
        .await
        .expect("resolve")
        .expect("eligible release");
    assert_eq!(resolved.version, "v1.0.0");
}

#[tokio::test]
async fn test_only_ineligible_releases_yield_none() {
    let server = MockServer::start().await;
    serve(
        &server,
        json!([
            {"tag_name": "v3.0.0", "draft": true, "assets": [{"name": "a.nupkg"}]},
            {"tag_name": "v2.0.0-beta.1", "prerelease": true, "assets": [{"name": "a.nupkg"}]},
            {"tag_name": "nightly", "assets": [{"name": "a.nupkg"}]}
        ]),
    )
    .await;

    let result = resolver(&server, Platform::Windows)
        .resolve("justgo97", "electron-update-test")
        .await;
    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn test_single_object_response_is_one_release() {
    let server = MockServer::start().await;
    serve(
        &server,
        json!({"tag_name": "v2.0.0", "assets": [{"name": "app.nupkg"}], "body": null}),
    )
    .await;

    let releases = resolver(&server, Platform::Windows)
        .fetch_releases("justgo97", "electron-update-test")
        .await
        .expect("fetch");
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].tag_name, "v2.0.0");
    assert_eq!(releases[0].body, "");
}

#[tokio::test]
async fn test_error_status_is_a_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RELEASES_PATH))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"message": "API rate limit exceeded"})),
        )
        .mount(&server)
        .await;

    let err = resolver(&server, Platform::Windows)
        .resolve("justgo97", "electron-update-test")
        .await
        .expect_err("403 must fail");
    assert!(matches!(err, UpdaterError::Fetch(ref m) if m.contains("403")));
}

#[tokio::test]
async fn test_undecodable_body_is_a_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RELEASES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = resolver(&server, Platform::Windows)
        .resolve("justgo97", "electron-update-test")
        .await
        .expect_err("html body must fail");
    assert!(matches!(err, UpdaterError::Fetch(_)));
}

#[tokio::test]
async fn test_unreachable_host_is_a_fetch_failure() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let err = ReleaseResolver::new(Platform::Windows)
        .expect("build resolver")
        .with_api_base(uri)
        .resolve("justgo97", "electron-update-test")
        .await
        .expect_err("closed port must fail");
    assert!(matches!(err, UpdaterError::Fetch(_)));
}
