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

use openssl::{
    asn1::Asn1Time,
    bn::{BigNum, MsbOption},
    hash::MessageDigest,
    pkcs7::{Pkcs7, Pkcs7Flags},
    pkey::{PKey, Private},
    rsa::Rsa,
    stack::Stack,
    symm::Cipher,
    x509::{store::X509StoreBuilder, X509NameBuilder, X509},
};

lazy_static! {
    pub static ref MERCHANT: Identity = Identity::generate("Merchant");
    pub static ref PROCESSOR: Identity = Identity::generate("Payment Processor");
    pub static ref STRANGER: Identity = Identity::generate("Stranger");
}

pub struct Identity {
    pub key: PKey<Private>,
    pub cert: X509,
}

impl Identity {
    /// Self signed RSA identity. Only suitable for tests.
    pub fn generate(common_name: &str) -> Self {
        Self::with_name(&[("CN", common_name)])
    }

    pub fn with_name(entries: &[(&str, &str)]) -> Self {
        let rsa = Rsa::generate(2048).unwrap();
        let key = PKey::from_rsa(rsa).unwrap();

        let mut name = X509NameBuilder::new().unwrap();
        for (field, value) in entries {
            name.append_entry_by_text(field, value).unwrap();
        }
        let name = name.build();

        let mut serial = BigNum::new().unwrap();
        serial.rand(159, MsbOption::MAYBE_ZERO, false).unwrap();
        let serial = serial.to_asn1_integer().unwrap();

        let not_before = Asn1Time::days_from_now(0).unwrap();
        let not_after = Asn1Time::days_from_now(30).unwrap();

        let mut x509 = X509::builder().unwrap();
        x509.set_version(2).unwrap();
        x509.set_serial_number(&serial).unwrap();
        x509.set_subject_name(&name).unwrap();
        x509.set_issuer_name(&name).unwrap();
        x509.set_not_before(&not_before).unwrap();
        x509.set_not_after(&not_after).unwrap();
        x509.set_pubkey(&key).unwrap();
        x509.sign(&key, MessageDigest::sha256()).unwrap();

        let cert = x509.build();

        Self { key, cert }
    }

    pub fn cert_pem(&self) -> Vec<u8> {
        self.cert.to_pem().unwrap()
    }

    pub fn key_pem(&self) -> Vec<u8> {
        self.key.private_key_to_pem_pkcs8().unwrap()
    }

    pub fn key_pem_with_passphrase(&self, passphrase: &[u8]) -> Vec<u8> {
        self.key
            .private_key_to_pem_pkcs8_passphrase(Cipher::aes_256_cbc(), passphrase)
            .unwrap()
    }
}

/// Does what the payment processor does with a button: decrypt the envelope
/// with its own key, verify the inner signature and return the signed text.
pub fn open_button(button: &str, processor: &Identity, merchant: &Identity) -> String {
    let envelope = Pkcs7::from_pem(button.as_bytes()).unwrap();
    let signed = envelope
        .decrypt(&processor.key, &processor.cert, Pkcs7Flags::BINARY)
        .unwrap();
    let signed = Pkcs7::from_der(&signed).unwrap();

    let certs = Stack::new().unwrap();
    let signers = signed.signers(&certs, Pkcs7Flags::empty()).unwrap();
    assert_eq!(signers.len(), 1);
    assert_eq!(
        signers.get(0).unwrap().to_der().unwrap(),
        merchant.cert.to_der().unwrap()
    );

    let store = X509StoreBuilder::new().unwrap().build();

    let mut content = Vec::new();
    signed
        .verify(
            &certs,
            &store,
            None,
            Some(&mut content),
            Pkcs7Flags::NOVERIFY | Pkcs7Flags::BINARY,
        )
        .unwrap();

    String::from_utf8(content).unwrap()
}
