// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A line-oriented front end for the request layer. Each input line is one
//! request of the form
//!
//! ```text
//! METHOD PATH [PLAYER] [JSON BODY]
//! ```
//!
//! and each request produces exactly one line of JSON on the output,
//! `{"status": ..., "body": ...}`. A line reading `quit` ends the session.
use std::io::{self, BufRead, Write};

use serde_json::json;

use crate::api::{Api, ApiResponse};

pub struct ConsoleServer {
    api: Api,
}

/// A request line split into its parts.
#[derive(Debug, PartialEq, Eq)]
struct RequestLine<'a> {
    method: &'a str,
    path: &'a str,
    player: Option<&'a str>,
    body: Option<&'a str>,
}

impl<'a> RequestLine<'a> {
    fn parse(line: &'a str) -> Option<RequestLine<'a>> {
        let (method, rest) = split_token(line.trim())?;
        let (path, rest) = split_token(rest)?;

        let (player, body) = if rest.is_empty() {
            (None, None)
        } else if rest.starts_with('{') {
            (None, Some(rest))
        } else {
            match split_token(rest) {
                Some((player, "")) => (Some(player), None),
                Some((player, body)) => (Some(player), Some(body)),
                None => (None, None),
            }
        };

        Some(RequestLine {
            method,
            path,
            player,
            body,
        })
    }
}

/// Splits off the first whitespace-delimited token, returning it and the trimmed remainder.
fn split_token(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }

    match text.find(char::is_whitespace) {
        Some(idx) => Some((&text[..idx], text[idx..].trim())),
        None => Some((text, "")),
    }
}

impl ConsoleServer {
    pub fn new(api: Api) -> ConsoleServer {
        ConsoleServer { api }
    }

    pub fn run<R, W>(&self, reader: R, mut writer: W) -> io::Result<()>
    where
        R: BufRead,
        W: Write,
    {
        for maybe_line in reader.lines() {
            let line = maybe_line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if trimmed == "quit" {
                break;
            }

            self.api.coordinator().sweep();
            let response = match RequestLine::parse(trimmed) {
                Some(req) => self.api.handle(req.method, req.path, req.player, req.body),
                None => ApiResponse {
                    status: 400,
                    body: json!({ "error": {
                        "code": "malformed_request_line",
                        "message": "expected METHOD PATH [PLAYER] [BODY]",
                    }}),
                },
            };

            serde_json::to_writer(&mut writer, &response)?;
            writeln!(&mut writer)?;
            writer.flush()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::Value;

    use crate::coordinator::Coordinator;

    mod parsing {
        use super::*;

        #[test]
        fn bare_request() {
            assert_eq!(
                Some(RequestLine {
                    method: "GET",
                    path: "/session/new",
                    player: None,
                    body: None,
                }),
                RequestLine::parse("GET /session/new")
            );
        }

        #[test]
        fn player_and_body() {
            assert_eq!(
                Some(RequestLine {
                    method: "POST",
                    path: "/session/1/move",
                    player: Some("alice"),
                    body: Some(r#"{"from_row": 6, "piece": "P"}"#),
                }),
                RequestLine::parse(r#"POST /session/1/move alice {"from_row": 6, "piece": "P"}"#)
            );
        }

        #[test]
        fn body_without_player() {
            let req = RequestLine::parse("POST /x {\"a\": 1}").unwrap();
            assert_eq!(None, req.player);
            assert_eq!(Some("{\"a\": 1}"), req.body);
        }

        #[test]
        fn too_short() {
            assert_eq!(None, RequestLine::parse("GET"));
            assert_eq!(None, RequestLine::parse("   "));
        }
    }

    fn run(input: &str) -> Vec<Value> {
        let server = ConsoleServer::new(Api::new(Arc::new(Coordinator::default())));
        let mut output = Vec::new();
        server.run(input.as_bytes(), &mut output).unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn one_response_per_request() {
        let responses = run("GET /session/new\n\nGET /nowhere\nGET\nquit\nGET /session/new\n");
        assert_eq!(3, responses.len());
        assert_eq!(200, responses[0]["status"]);
        assert_eq!(404, responses[1]["status"]);
        assert_eq!(400, responses[2]["status"]);
        assert_eq!("malformed_request_line", responses[2]["body"]["error"]["code"]);
    }
}
