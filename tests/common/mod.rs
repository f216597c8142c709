//! 集成测试用的进程内 HTTP 服务
//!
//! 基于 `tokio::net::TcpListener`，对每个请求返回固定的状态码和响应体，
//! 并记录请求头，供断言使用。

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const SAMPLE_BODY: &str = r#"{"user":{"name":"Ann","links":{"self":"u1"}},"alt_description":"desc","links":{"html":"p1"},"urls":{"regular":"img1"}}"#;

pub struct MockServer {
    pub url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockServer {
    /// 对每个请求回复 `status` 和 `body`
    pub async fn respond(status: u16, body: &str) -> Self {
        Self::start(Some((status, body.to_string()))).await
    }

    /// 接受连接、读完请求，但永远不回复
    pub async fn silent() -> Self {
        Self::start(None).await
    }

    /// 已收到的请求头（原文）
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    async fn start(reply: Option<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, reply.clone(), log.clone()));
            }
        });

        Self {
            url: format!("http://{addr}"),
            requests,
        }
    }
}

async fn serve(mut stream: TcpStream, reply: Option<(u16, String)>, log: Arc<Mutex<Vec<String>>>) {
    let head = read_head(&mut stream).await;
    log.lock().unwrap().push(head);

    let Some((status, body)) = reply else {
        // 保持连接不关闭
        std::future::pending::<()>().await;
        return;
    };

    let response = format!(
        "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        reason(status),
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// 读取到请求头结束（GET 请求没有请求体）
async fn read_head(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}

/// 不走系统代理的 HTTP 客户端，避免环境变量把本地请求转发出去
pub fn direct_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
