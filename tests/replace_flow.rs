use mockito::{Matcher, Mock, Server, ServerGuard};
use republish::release::{ErrorKind, Step};
use republish::{
    AssetReplacer, GitHubReleaseClient, ReleaseConfig, ReplaceOptions, ReplacementJob,
};
use serde_json::json;
use std::time::Duration;

const TAG: &str = "msys2-gcc-pkgs";
const BODY: &str = "\
| Package | Date | Build |
|:---|:---:|---:|
| **foo** | 2024-01-01 00:00:00 UTC |    42 |
| **bar** | 2024-01-01 00:00:00 UTC |    42 |
";
const TIME: &str = "2024-06-01 12:00:00 UTC";

fn config_for(server: &ServerGuard) -> ReleaseConfig {
    ReleaseConfig {
        repository: "ruby/setup-msys2-gcc".to_string(),
        token: "test_token".to_string(),
        build_number: 99,
        tag: TAG.to_string(),
        api_url: server.url(),
        upload_url: server.url(),
        server_url: server.url(),
        stabilization_delay: Duration::ZERO,
    }
}

fn replacer_for(server: &ServerGuard) -> AssetReplacer<GitHubReleaseClient> {
    let config = config_for(server);
    AssetReplacer::new(
        GitHubReleaseClient::new(&config),
        ReplaceOptions::from_config(&config),
    )
}

async fn mock_release(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/repos/ruby/setup-msys2-gcc/releases/tags/msys2-gcc-pkgs")
        .with_status(200)
        .with_body(
            json!({
                "id": 500,
                "tag_name": TAG,
                "body": BODY,
                "assets": [
                    { "id": 1, "name": "foo.7z", "size": 3 },
                    { "id": 9, "name": "bar.7z", "size": 3 }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await
}

async fn mock_upload(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/repos/ruby/setup-msys2-gcc/releases/500/assets")
        .match_query(Matcher::UrlEncoded(
            "name".to_string(),
            "foo_new.7z".to_string(),
        ))
        .match_body("new archive")
        .with_status(201)
        .with_body(json!({ "id": 2, "name": "foo_new.7z", "size": 11 }).to_string())
        .create_async()
        .await
}

async fn mock_rename(server: &mut ServerGuard, id: u64, name: &str, status: usize) -> Mock {
    server
        .mock(
            "PATCH",
            format!("/repos/ruby/setup-msys2-gcc/releases/assets/{id}").as_str(),
        )
        .match_body(Matcher::Json(json!({ "name": name })))
        .with_status(status)
        .with_body(json!({ "id": id, "name": name }).to_string())
        .create_async()
        .await
}

fn archive() -> tempfile::NamedTempFile {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), b"new archive").unwrap();
    file
}

#[tokio::test]
async fn test_full_replacement() {
    let mut server = Server::new_async().await;
    let get = mock_release(&mut server).await;
    let upload = mock_upload(&mut server).await;
    let to_old = mock_rename(&mut server, 1, "foo_old.7z", 200).await;
    let to_current = mock_rename(&mut server, 2, "foo.7z", 200).await;
    let delete = server
        .mock("DELETE", "/repos/ruby/setup-msys2-gcc/releases/assets/1")
        .with_status(204)
        .create_async()
        .await;
    let expected_body = BODY.replace(
        "| **foo** | 2024-01-01 00:00:00 UTC |    42 |",
        "| **foo** | 2024-06-01 12:00:00 UTC |     99 |",
    );
    let notes = server
        .mock("PATCH", "/repos/ruby/setup-msys2-gcc/releases/500")
        .match_body(Matcher::Json(json!({ "body": expected_body })))
        .with_status(200)
        .with_body(json!({ "id": 500, "tag_name": TAG, "body": expected_body }).to_string())
        .create_async()
        .await;
    let probe = server
        .mock(
            "HEAD",
            "/ruby/setup-msys2-gcc/releases/download/msys2-gcc-pkgs/foo.7z",
        )
        .with_status(302)
        .create_async()
        .await;

    let archive = archive();
    let job = ReplacementJob::new("foo", archive.path()).with_timestamp(TIME);
    let outcome = replacer_for(&server).run(&job).await.unwrap();

    assert_eq!(outcome.asset.id, 2);
    assert_eq!(outcome.asset.name, "foo.7z");
    assert_eq!(outcome.retired_asset_id, 1);
    assert!(outcome.is_clean());
    assert!(outcome.probe.is_reachable());
    for mock in [get, upload, to_old, to_current, delete, notes, probe] {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_rename_failure_stops_protocol() {
    let mut server = Server::new_async().await;
    let _get = mock_release(&mut server).await;
    let upload = mock_upload(&mut server).await;
    let to_old = mock_rename(&mut server, 1, "foo_old.7z", 500).await;
    let to_current = server
        .mock("PATCH", "/repos/ruby/setup-msys2-gcc/releases/assets/2")
        .expect(0)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let archive = archive();
    let job = ReplacementJob::new("foo", archive.path()).with_timestamp(TIME);
    let err = replacer_for(&server).run(&job).await.unwrap_err();

    assert_eq!(err.step(), Step::RenameCurrentToOld);
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
    assert_eq!(
        err.client_error().and_then(|e| e.status()),
        Some(500)
    );
    upload.assert_async().await;
    to_old.assert_async().await;
    to_current.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn test_stale_new_asset_blocks_upload() {
    let mut server = Server::new_async().await;
    let _get = server
        .mock("GET", "/repos/ruby/setup-msys2-gcc/releases/tags/msys2-gcc-pkgs")
        .with_status(200)
        .with_body(
            json!({
                "id": 500,
                "tag_name": TAG,
                "body": BODY,
                "assets": [
                    { "id": 1, "name": "foo.7z" },
                    { "id": 3, "name": "foo_new.7z" }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;
    let upload = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let archive = archive();
    let job = ReplacementJob::new("foo", archive.path());
    let err = replacer_for(&server).run(&job).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PreconditionViolation);
    assert_eq!(err.to_string(), "new asset foo_new.7z exists");
    upload.assert_async().await;
}
