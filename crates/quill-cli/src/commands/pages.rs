//! Demo pages served by `quill serve`.
//!
//! The home page renders its body before the layout that wraps it, which
//! is what the buffer stack is for.

use std::sync::Arc;

use quill_response::{CookieOptions, MemoryTransport, PageResult, ResponseBuffer};
use quill_trigger::{PageHandler, PageRequest};

type Res = ResponseBuffer<MemoryTransport>;

pub fn site() -> PageHandler {
    Arc::new(|req: &PageRequest, res: &Res| -> PageResult {
        match req.path() {
            "/" => home(req, res),
            "/old" => res.redirect("/"),
            "/logout" => {
                res.set_cookie("session", "", CookieOptions::new().expire_now())?;
                res.redirect("/")
            }
            "/plain" => {
                res.set_content_type("text/plain; charset=utf-8");
                res.writeln(&["plain", "text"])?;
                Ok(())
            }
            path => {
                let body = fragment(res, |res| {
                    res.writeln(&["<p>No page at", escape_html(path).as_str(), "</p>"])?;
                    Ok(())
                })?;
                layout(res, "Not found", &body)
            }
        }
    })
}

fn home(req: &PageRequest, res: &Res) -> PageResult {
    res.set_cookie("visited", "1", CookieOptions::new().ttl_days(30))?;

    let sidebar = fragment(res, |res| {
        res.writeln(&["<nav><a href=\"/\">home</a> <a href=\"/old\">old</a></nav>"])?;
        Ok(())
    })?;
    let body = fragment(res, |res| {
        res.writeln(&["<h1>Quill</h1>"])?;
        res.writeln(&["<p>You asked for", escape_html(req.path()).as_str(), "</p>"])?;
        res.write_str(&sidebar)?;
        Ok(())
    })?;
    layout(res, "Home", &body)
}

/// Capture everything `render` writes.
fn fragment(res: &Res, render: impl FnOnce(&Res) -> PageResult) -> PageResult<String> {
    let scope = res.scope();
    render(res)?;
    Ok(scope.finish()?)
}

fn layout(res: &Res, title: &str, body: &str) -> PageResult {
    res.writeln(&["<!doctype html>"])?;
    res.writeln(&[format!(
        "<html><head><title>{}</title></head><body>",
        escape_html(title)
    )])?;
    res.write_str(body)?;
    res.writeln(&["</body></html>"])?;
    Ok(())
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
