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

use std::io::Error as IoError;

use openssl::error::ErrorStack as OpenSslError;
use thiserror::Error;

use crate::smime::Error as SmimeError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid certificate: {0}")]
    InvalidCertificate(OpenSslError),

    #[error("Invalid private key: {0}")]
    InvalidKey(OpenSslError),

    #[error("Private key does not correspond with the public certificate!")]
    KeyMismatch,

    #[error("Encrypted button is not configured: missing {0}!")]
    NotConfigured(&'static str),

    #[error("Invalid button parameter: {0}!")]
    InvalidParameter(String),

    #[error("Unable to sign button parameters: {0}")]
    SignFailure(OpenSslError),

    #[error("Unexpected format of the signed data: {0}")]
    UnexpectedSignFormat(SmimeError),

    #[error("Unable to encrypt button parameters: {0}")]
    EncryptFailure(OpenSslError),

    #[error("Unexpected format of the encrypted data: {0}")]
    UnexpectedEncryptFormat(SmimeError),

    #[error("Scratch IO Error: {0}")]
    ScratchIo(IoError),
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Self {
        Self::ScratchIo(err)
    }
}
