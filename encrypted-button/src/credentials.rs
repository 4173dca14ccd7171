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

use std::fmt::{Debug, Formatter, Result as FmtResult};

use log::debug;
use openssl::{
    pkey::{PKey, PKeyRef, Private},
    x509::{X509Ref, X509},
};

use crate::Error;

/// Private key of the merchant together with the certificate the payment
/// processor has registered for it.
///
/// Both parts are only ever replaced together, and a value of this type
/// always holds a key that belongs to its certificate.
pub struct MerchantCredentials {
    cert: X509,
    key: PKey<Private>,
}

impl MerchantCredentials {
    pub fn from_pem<C, K>(cert: C, key: K) -> Result<Self, Error>
    where
        C: AsRef<[u8]>,
        K: AsRef<[u8]>,
    {
        let cert = parse_certificate(cert)?;
        let key = PKey::private_key_from_pem(key.as_ref()).map_err(Error::InvalidKey)?;

        Self::new(cert, key)
    }

    pub fn from_pem_passphrase<C, K, P>(cert: C, key: K, passphrase: P) -> Result<Self, Error>
    where
        C: AsRef<[u8]>,
        K: AsRef<[u8]>,
        P: AsRef<[u8]>,
    {
        let cert = parse_certificate(cert)?;
        let key = PKey::private_key_from_pem_passphrase(key.as_ref(), passphrase.as_ref())
            .map_err(Error::InvalidKey)?;

        Self::new(cert, key)
    }

    pub fn new(cert: X509, key: PKey<Private>) -> Result<Self, Error> {
        let public_key = cert.public_key().map_err(Error::InvalidCertificate)?;
        if !public_key.public_eq(&key) {
            return Err(Error::KeyMismatch);
        }

        debug!("Loaded merchant credentials for '{}'", subject(&cert));

        Ok(Self { cert, key })
    }

    pub fn cert(&self) -> &X509Ref {
        &self.cert
    }

    pub fn key(&self) -> &PKeyRef<Private> {
        &self.key
    }
}

impl Debug for MerchantCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MerchantCredentials")
            .field("cert", &subject(&self.cert))
            .field("key", &"<redacted>")
            .finish()
    }
}

pub fn parse_certificate<C>(cert: C) -> Result<X509, Error>
where
    C: AsRef<[u8]>,
{
    X509::from_pem(cert.as_ref()).map_err(Error::InvalidCertificate)
}

/// Human readable subject name, used for logging only.
pub fn subject(cert: &X509Ref) -> String {
    cert.subject_name()
        .entries()
        .filter_map(|entry| {
            let name = entry.object().nid().short_name().ok()?;
            let value = String::from_utf8_lossy(entry.data().as_slice());

            Some(format!("{}={}", name, value))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::test_utils::{Identity, MERCHANT, STRANGER};

    #[test]
    fn load_matching_pair() {
        let credentials =
            MerchantCredentials::from_pem(MERCHANT.cert_pem(), MERCHANT.key_pem()).unwrap();

        assert_eq!(
            credentials.cert().to_der().unwrap(),
            MERCHANT.cert.to_der().unwrap()
        );
        assert!(credentials.key().public_eq(&MERCHANT.key));
        assert_eq!(subject(credentials.cert()), "CN=Merchant");
    }

    #[test]
    fn reject_mismatching_pair() {
        let err =
            MerchantCredentials::from_pem(MERCHANT.cert_pem(), STRANGER.key_pem()).unwrap_err();

        assert!(matches!(err, Error::KeyMismatch));
    }

    #[test]
    fn reject_malformed_pem() {
        let err =
            MerchantCredentials::from_pem("no certificate", MERCHANT.key_pem()).unwrap_err();
        assert!(matches!(err, Error::InvalidCertificate(_)));

        let err = MerchantCredentials::from_pem(MERCHANT.cert_pem(), "no key").unwrap_err();
        assert!(matches!(err, Error::InvalidKey(_)));

        /* a key is not a certificate */
        let err =
            MerchantCredentials::from_pem(MERCHANT.key_pem(), MERCHANT.key_pem()).unwrap_err();
        assert!(matches!(err, Error::InvalidCertificate(_)));
    }

    #[test]
    fn load_encrypted_key() {
        let key = MERCHANT.key_pem_with_passphrase(b"secret");

        let credentials =
            MerchantCredentials::from_pem_passphrase(MERCHANT.cert_pem(), &key, "secret").unwrap();
        assert!(credentials.key().public_eq(&MERCHANT.key));

        let err = MerchantCredentials::from_pem_passphrase(MERCHANT.cert_pem(), &key, "wrong")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidKey(_)));
    }

    #[test]
    fn subject_lists_all_entries() {
        let shop = Identity::with_name(&[
            ("C", "DE"),
            ("O", "Example Shop"),
            ("CN", "Checkout"),
        ]);

        assert_eq!(subject(&shop.cert), "C=DE, O=Example Shop, CN=Checkout");
    }

    #[test]
    fn debug_hides_key() {
        let credentials =
            MerchantCredentials::from_pem(MERCHANT.cert_pem(), MERCHANT.key_pem()).unwrap();
        let debug = format!("{:?}", credentials);

        assert!(debug.contains("CN=Merchant"));
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("PRIVATE KEY"));
    }
}
