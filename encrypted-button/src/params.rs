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

use zeroize::Zeroizing;

use crate::Error;

const CERT_ID: &str = "cert_id";

/// Builds the line based clear text the payment processor expects.
///
/// The first line carries the certificate id, every parameter follows as
/// `key=value` on its own line, in the order the iterator yields them.
/// Line breaks would inject additional fields, so they are rejected in keys
/// and values. Keys must not contain `=` either, values may.
pub fn clear_text<I, K, V>(certificate_id: &str, params: I) -> Result<Zeroizing<Vec<u8>>, Error>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    check_value(CERT_ID, certificate_id)?;

    let params = params.into_iter().collect::<Vec<_>>();

    let mut len = CERT_ID.len() + 1 + certificate_id.len();
    for (key, value) in &params {
        let key = key.as_ref();
        let value = value.as_ref();

        check_key(key)?;
        check_value(key, value)?;

        len += 1 + key.len() + 1 + value.len();
    }

    /* allocate once, so no unwiped copies are left behind by reallocation */
    let mut text = Zeroizing::new(Vec::with_capacity(len));
    text.extend_from_slice(CERT_ID.as_bytes());
    text.push(b'=');
    text.extend_from_slice(certificate_id.as_bytes());

    for (key, value) in &params {
        text.push(b'\n');
        text.extend_from_slice(key.as_ref().as_bytes());
        text.push(b'=');
        text.extend_from_slice(value.as_ref().as_bytes());
    }

    Ok(text)
}

fn check_key(key: &str) -> Result<(), Error> {
    if key.is_empty() {
        return Err(Error::InvalidParameter("empty key".into()));
    }

    if key.contains(|c| c == '=' || c == '\n' || c == '\r') {
        return Err(Error::InvalidParameter(format!(
            "key {:?} contains '=' or a line break",
            key
        )));
    }

    Ok(())
}

fn check_value(key: &str, value: &str) -> Result<(), Error> {
    if value.contains(|c| c == '\n' || c == '\r') {
        return Err(Error::InvalidParameter(format!(
            "value of {:?} contains a line break",
            key
        )));
    }

    Ok(())
}
