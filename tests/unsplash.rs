//! Unsplash 客户端集成测试 — 全部请求都发往进程内的模拟服务，不访问外网。

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use backdrop::{ImageRecord, ImageSource, SourceError, UnsplashClient};
use common::{MockServer, SAMPLE_BODY, direct_client};

fn client_for(server: &MockServer) -> UnsplashClient {
    UnsplashClient::new(Some("test-key".into()))
        .with_api_url(server.url.as_str())
        .with_client(direct_client())
}

fn sample_record() -> ImageRecord {
    ImageRecord::new("Ann", "u1", "desc", "p1", "img1")
}

#[tokio::test]
async fn sends_random_photo_request_with_headers() {
    let server = MockServer::respond(200, SAMPLE_BODY).await;
    client_for(&server).random_photo().await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let head = requests[0].to_lowercase();
    assert!(head.starts_with("get /photos/random http/1.1"), "{head}");
    assert!(head.contains("accept-version: v1"), "{head}");
    assert!(head.contains("authorization: client-id test-key"), "{head}");
}

#[tokio::test]
async fn callback_receives_mapped_record_exactly_once() {
    let server = MockServer::respond(200, SAMPLE_BODY).await;
    let calls = Arc::new(AtomicUsize::new(0));
    let received = Arc::new(Mutex::new(Vec::new()));

    let handle = {
        let calls = calls.clone();
        let received = received.clone();
        client_for(&server).fetch_random_with(move |record| {
            calls.fetch_add(1, Ordering::SeqCst);
            received.lock().unwrap().push(record);
        })
    };
    handle.await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*received.lock().unwrap(), vec![sample_record()]);
}

#[tokio::test]
async fn not_found_never_invokes_callback() {
    let server = MockServer::respond(404, r#"{"errors":["Not found"]}"#).await;
    let calls = Arc::new(AtomicUsize::new(0));

    let handle = {
        let calls = calls.clone();
        client_for(&server).fetch_random_with(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    };

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("fetch should settle");
    match result {
        Err(SourceError::Api { status, message }) => {
            assert_eq!(status, 404);
            assert!(message.contains("Not found"));
        }
        other => panic!("expected API error, got {other:?}"),
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn only_status_200_counts_as_success() {
    let server = MockServer::respond(201, SAMPLE_BODY).await;
    let err = client_for(&server).random_photo().await.unwrap_err();
    assert!(matches!(err, SourceError::Api { status: 201, .. }), "{err}");

    let server = MockServer::respond(500, "oops").await;
    let err = client_for(&server).random_photo().await.unwrap_err();
    assert!(matches!(err, SourceError::Api { status: 500, .. }), "{err}");
}

#[tokio::test]
async fn malformed_body_is_a_parse_error() {
    let server = MockServer::respond(200, "{not json").await;
    let err = client_for(&server).random_photo().await.unwrap_err();
    assert!(matches!(err, SourceError::Parse(_)), "{err}");
}

#[tokio::test]
async fn missing_field_is_a_parse_error() {
    let body = r#"{"user":{"name":"Ann","links":{"self":"u1"}},"alt_description":"desc","links":{"html":"p1"}}"#;
    let server = MockServer::respond(200, body).await;
    let err = client_for(&server).fetch_random().await.unwrap_err();
    assert!(matches!(err, SourceError::Parse(_)), "{err}");
}

#[tokio::test]
async fn concurrent_fetches_do_not_mix_results() {
    let other_body = r#"{"user":{"name":"Bob","links":{"self":"u2"}},"alt_description":"other","links":{"html":"p2"},"urls":{"regular":"img2"}}"#;
    let first_server = MockServer::respond(200, SAMPLE_BODY).await;
    let second_server = MockServer::respond(200, other_body).await;

    let (first_tx, first_rx) = tokio::sync::oneshot::channel();
    let (second_tx, second_rx) = tokio::sync::oneshot::channel();

    let first = client_for(&first_server).fetch_random_with(move |record| {
        let _ = first_tx.send(record);
    });
    let second = client_for(&second_server).fetch_random_with(move |record| {
        let _ = second_tx.send(record);
    });

    let (first_done, second_done) = tokio::join!(first, second);
    first_done.unwrap();
    second_done.unwrap();

    assert_eq!(first_rx.await.unwrap(), sample_record());
    assert_eq!(
        second_rx.await.unwrap(),
        ImageRecord::new("Bob", "u2", "other", "p2", "img2")
    );
}

#[tokio::test]
async fn repeated_calls_issue_independent_requests() {
    let server = MockServer::respond(200, SAMPLE_BODY).await;
    let client = client_for(&server);

    let (a, b) = tokio::join!(client.fetch_random(), client.fetch_random());
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(server.requests().len(), 2);
}

#[tokio::test]
async fn abort_before_completion_suppresses_callback() {
    let server = MockServer::silent().await;
    let calls = Arc::new(AtomicUsize::new(0));

    let handle = {
        let calls = calls.clone();
        client_for(&server).fetch_random_with(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    };

    // 等请求真正发出后再取消
    for _ in 0..100 {
        if !server.requests().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(!handle.is_finished());
    handle.abort();

    assert!(matches!(handle.await, Err(SourceError::Cancelled)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn connection_failure_is_a_network_error() {
    // 绑定后立即释放端口，得到一个没有人监听的地址
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = UnsplashClient::new(None)
        .with_api_url(format!("http://{addr}"))
        .with_client(direct_client());
    let err = client.random_photo().await.unwrap_err();
    assert!(matches!(err, SourceError::Network(_)), "{err}");
}

#[tokio::test]
async fn works_behind_image_source_trait() {
    let server = MockServer::respond(200, SAMPLE_BODY).await;
    let source: Box<dyn ImageSource> = Box::new(client_for(&server));
    assert_eq!(source.name(), "unsplash");
    assert_eq!(source.image_record().await.unwrap(), sample_record());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn abort_on_multi_thread_runtime_is_all_or_nothing() {
    // 体积很大的响应体让解析在工作线程上持续一段时间，和 abort() 形成竞争
    let padding = "x".repeat(20 * 1024 * 1024);
    let body = format!(
        r#"{{"padding":"{padding}","user":{{"name":"Ann","links":{{"self":"u1"}}}},"alt_description":"desc","links":{{"html":"p1"}},"urls":{{"regular":"img1"}}}}"#
    );
    let server = MockServer::respond(200, &body).await;
    let calls = Arc::new(AtomicUsize::new(0));

    let handle = {
        let calls = calls.clone();
        client_for(&server).fetch_random_with(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    };

    for _ in 0..500 {
        if !server.requests().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    handle.abort();
    let calls_at_abort = calls.load(Ordering::SeqCst);

    let result = tokio::time::timeout(Duration::from_secs(30), handle)
        .await
        .expect("fetch should settle");

    // abort() 返回后回调不会再被调用，结果与是否已投递一致
    assert_eq!(calls.load(Ordering::SeqCst), calls_at_abort);
    match result {
        Ok(()) => assert_eq!(calls_at_abort, 1),
        Err(SourceError::Cancelled) => assert_eq!(calls_at_abort, 0),
        Err(other) => panic!("unexpected error: {other}"),
    }
}
