/*
 * Copyright (c) 2021 gematik GmbH
 * 
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 * 
 *    http://www.apache.org/licenses/LICENSE-2.0
 * 
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 */

use std::str::{from_utf8, Utf8Error};

use base64::DecodeError as Base64Error;
use thiserror::Error;
use zeroize::Zeroizing;

/// Single part S/MIME document as written by `SMIME_write_PKCS7`.
///
/// The document consists of a block of RFC 822 style headers, a blank line and
/// the base64 encoded DER structure. Multipart (detached) messages are not
/// supported, because the button pipeline always embeds the content.
pub struct Envelope<'a> {
    headers: Vec<(&'a str, String)>,
    body: &'a str,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("S/MIME document is not valid UTF-8: {0}")]
    Utf8Error(Utf8Error),

    #[error("S/MIME document has no body!")]
    MissingBody,

    #[error("Invalid S/MIME header line: {0}!")]
    InvalidHeader(String),

    #[error("Unsupported S/MIME transfer encoding: {0:?}!")]
    UnsupportedEncoding(Option<String>),

    #[error("S/MIME body is empty!")]
    EmptyBody,

    #[error("Invalid base64 in S/MIME body: {0}")]
    Base64Error(Base64Error),
}

impl<'a> Envelope<'a> {
    pub fn parse(raw: &'a [u8]) -> Result<Self, Error> {
        let raw = from_utf8(raw).map_err(Error::Utf8Error)?;

        let (head, rest) = match raw.find("\n\n") {
            Some(pos) => (&raw[..pos], &raw[pos + 2..]),
            None => return Err(Error::MissingBody),
        };

        let body = match rest.find("\n\n") {
            Some(pos) => &rest[..pos],
            None => rest,
        };
        let body = body.trim_end_matches(|c| c == '\r' || c == '\n');
        if body.trim().is_empty() {
            return Err(Error::EmptyBody);
        }

        let headers = parse_headers(head)?;
        let envelope = Self { headers, body };

        match envelope.header("Content-Transfer-Encoding") {
            Some(encoding) if encoding.eq_ignore_ascii_case("base64") => (),
            encoding => {
                return Err(Error::UnsupportedEncoding(
                    encoding.map(ToOwned::to_owned),
                ))
            }
        }

        Ok(envelope)
    }

    /// Value of the first header with the given name (case insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Base64 body with the line breaks of the writer.
    pub fn body(&self) -> &'a str {
        self.body
    }

    pub fn decode_body(&self) -> Result<Zeroizing<Vec<u8>>, Error> {
        let body = self
            .body
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect::<String>();
        let body = Zeroizing::new(body);

        let data = base64::decode(body.as_bytes()).map_err(Error::Base64Error)?;

        Ok(Zeroizing::new(data))
    }
}

fn parse_headers(head: &str) -> Result<Vec<(&str, String)>, Error> {
    let mut headers: Vec<(&str, String)> = Vec::new();

    for line in head.lines() {
        let line = line.trim_end_matches('\r');

        /* folded header: continuation of the previous value */
        if line.starts_with(' ') || line.starts_with('\t') {
            match headers.last_mut() {
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(line.trim());

                    continue;
                }
                None => return Err(Error::InvalidHeader(line.to_owned())),
            }
        }

        let mut parts = line.splitn(2, ':');
        let name = parts.next().unwrap_or_default().trim();
        let value = match parts.next() {
            Some(value) if !name.is_empty() => value.trim(),
            _ => return Err(Error::InvalidHeader(line.to_owned())),
        };

        headers.push((name, value.to_owned()));
    }

    Ok(headers)
}
