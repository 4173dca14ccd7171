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

use std::env::temp_dir;
use std::path::PathBuf;

use openssl::symm::Cipher;
use serde::Deserialize;

/// Settings of a [`ButtonEncryptor`](crate::ButtonEncryptor).
///
/// The struct is deserializable so it can be embedded into the configuration
/// of the hosting application. Missing fields fall back to their defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the clear, signed and encrypted artifacts are staged during a
    /// call.
    pub scratch: ScratchStorage,

    /// Symmetric cipher of the PKCS#7 envelope.
    pub cipher: EnvelopeCipher,
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScratchStorage {
    /// Keep the artifacts in memory only.
    Memory,

    /// Stage the artifacts in uniquely named files inside this directory.
    Directory(PathBuf),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
pub enum EnvelopeCipher {
    #[serde(rename = "aes-128-cbc")]
    Aes128Cbc,

    #[serde(rename = "aes-192-cbc")]
    Aes192Cbc,

    #[serde(rename = "aes-256-cbc")]
    Aes256Cbc,

    #[serde(rename = "des-ede3-cbc")]
    Des3Cbc,
}

impl Default for ScratchStorage {
    fn default() -> Self {
        Self::Directory(temp_dir())
    }
}

impl Default for EnvelopeCipher {
    fn default() -> Self {
        Self::Aes128Cbc
    }
}

impl EnvelopeCipher {
    pub fn cipher(self) -> Cipher {
        match self {
            Self::Aes128Cbc => Cipher::aes_128_cbc(),
            Self::Aes192Cbc => Cipher::aes_192_cbc(),
            Self::Aes256Cbc => Cipher::aes_256_cbc(),
            Self::Des3Cbc => Cipher::des_ede3_cbc(),
        }
    }
}
