//! Full-stack tests: raw HTTP/1.1 over TCP against a running trigger.

use std::net::SocketAddr;
use std::sync::Arc;

use quill_response::{CookieOptions, MemoryTransport, PageResult, ResponseBuffer};
use quill_trigger::{HttpTrigger, PageHandler, PageRequest, TriggerOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn site() -> PageHandler {
    Arc::new(|req: &PageRequest, res: &ResponseBuffer<MemoryTransport>| -> PageResult {
        match req.path() {
            "/old" => {
                res.write(&["this never reaches the client"])?;
                res.redirect("/new")
            }
            "/login" => {
                res.set_cookie("sid", "abc", CookieOptions::new().ttl_days(2))?;
                res.set_cookie("flash", "", CookieOptions::new().expire_now())?;
                res.redirect("/")
            }
            _ => {
                res.push();
                res.write(&["body", "of", req.path()])?;
                let body = res.pop()?;
                res.writeln(&["<main>"])?;
                res.write_str(&body)?;
                res.writeln(&["", "</main>"])?;
                Ok(())
            }
        }
    })
}

async fn start() -> (SocketAddr, tokio::sync::watch::Sender<bool>, tokio::task::JoinHandle<anyhow::Result<()>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let trigger = HttpTrigger::new(addr, site(), TriggerOptions::default());
    let (tx, rx) = tokio::sync::watch::channel(false);
    let server = tokio::spawn(async move { trigger.serve_on(listener, rx).await });
    (addr, tx, server)
}

async fn get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    String::from_utf8(raw).unwrap()
}

#[tokio::test]
async fn page_body_is_composed_from_buffers() {
    let (addr, tx, server) = start().await;

    let resp = get(addr, "/docs").await;
    assert!(resp.starts_with("HTTP/1.1 200 OK"), "{resp}");
    assert!(resp.to_ascii_lowercase().contains("content-type: text/html; charset=utf-8"));
    assert!(resp.ends_with("<main>\r\nbody of /docs </main>\r\n"), "{resp}");

    tx.send(true).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn redirect_sends_location_without_aborted_output() {
    let (addr, tx, server) = start().await;

    let resp = get(addr, "/old").await;
    assert!(resp.starts_with("HTTP/1.1 302 Found"), "{resp}");
    assert!(resp.to_ascii_lowercase().contains("location: /new"));
    assert!(!resp.contains("never reaches"));

    tx.send(true).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn cookies_survive_redirect() {
    let (addr, tx, server) = start().await;

    let resp = get(addr, "/login").await;
    let lower = resp.to_ascii_lowercase();
    assert!(lower.contains("set-cookie: sid=abc; max-age=172800; path=/"), "{resp}");
    assert!(lower.contains("set-cookie: flash=; max-age=0; path=/"), "{resp}");
    assert!(lower.contains("location: /\r\n"), "{resp}");

    tx.send(true).unwrap();
    server.await.unwrap().unwrap();
}
