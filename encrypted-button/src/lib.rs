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

#[cfg(test)]
#[macro_use]
extern crate lazy_static;

mod config;
mod credentials;
mod encryptor;
mod error;
mod params;
mod scratch;
mod smime;

#[cfg(test)]
mod test_utils;

pub use config::{Config, EnvelopeCipher, ScratchStorage};
pub use credentials::MerchantCredentials;
pub use encryptor::{ButtonEncryptor, COMMAND, ENCRYPTED_FIELD};
pub use error::Error;
pub use smime::{Envelope, Error as SmimeError};
