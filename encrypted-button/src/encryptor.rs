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

use log::debug;
use openssl::{
    pkcs7::{Pkcs7, Pkcs7Flags},
    stack::Stack,
    x509::{X509Ref, X509},
};
use zeroize::Zeroizing;

use crate::{
    credentials::{parse_certificate, subject, MerchantCredentials},
    params::clear_text,
    scratch::{Artifact, Scratch},
    smime::Envelope,
    Config, Error, ScratchStorage,
};

/// Value of the `cmd` form field for encrypted buttons.
pub const COMMAND: &str = "_s-xclick";

/// Name of the form field that carries the encrypted button.
pub const ENCRYPTED_FIELD: &str = "encrypted";

const PEM_BEGIN: &str = "-----BEGIN PKCS7-----";
const PEM_END: &str = "-----END PKCS7-----";

/// Creates the encrypted parameter blob of a payment button.
///
/// The parameters are signed with the key of the merchant and afterwards
/// encrypted for the payment processor, so that neither the content can be
/// read nor modified by the buyer.
///
/// Setup happens through `&mut self`, encryption through `&self`. Once set up
/// the encryptor can be shared between threads.
#[derive(Default)]
pub struct ButtonEncryptor {
    config: Config,
    merchant: Option<MerchantCredentials>,
    processor_cert: Option<X509>,
    certificate_id: String,
}

impl ButtonEncryptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn command_name(&self) -> &'static str {
        COMMAND
    }

    /// Sets the certificate and private key of the merchant.
    ///
    /// The stored credentials are only replaced if both parts could be parsed
    /// and the key belongs to the certificate.
    pub fn set_credentials<C, K>(&mut self, public_cert: C, private_key: K) -> Result<(), Error>
    where
        C: AsRef<[u8]>,
        K: AsRef<[u8]>,
    {
        let credentials = MerchantCredentials::from_pem(public_cert, private_key)?;
        self.set_merchant_credentials(credentials);

        Ok(())
    }

    pub fn set_credentials_with_passphrase<C, K, P>(
        &mut self,
        public_cert: C,
        private_key: K,
        passphrase: P,
    ) -> Result<(), Error>
    where
        C: AsRef<[u8]>,
        K: AsRef<[u8]>,
        P: AsRef<[u8]>,
    {
        let credentials =
            MerchantCredentials::from_pem_passphrase(public_cert, private_key, passphrase)?;
        self.set_merchant_credentials(credentials);

        Ok(())
    }

    /// Sets already loaded merchant credentials.
    pub fn set_merchant_credentials(&mut self, credentials: MerchantCredentials) {
        self.merchant = Some(credentials);
    }

    /// Sets the id the payment processor assigned to the merchant certificate.
    /// An empty id is only rejected by [`ButtonEncryptor::encrypt`].
    pub fn set_certificate_id<T>(&mut self, id: T)
    where
        T: Into<String>,
    {
        self.certificate_id = id.into();
    }

    pub fn set_processor_certificate<C>(&mut self, cert: C) -> Result<(), Error>
    where
        C: AsRef<[u8]>,
    {
        let cert = parse_certificate(cert)?;

        debug!("Loaded payment processor certificate '{}'", subject(&cert));

        self.processor_cert = Some(cert);

        Ok(())
    }

    pub fn set_scratch_storage(&mut self, storage: ScratchStorage) {
        self.config.scratch = storage;
    }

    /// Signs and encrypts the passed button parameters.
    ///
    /// The parameters are written in the order the iterator yields them.
    /// The result is the PEM encoded PKCS#7 envelope, ready to be used as
    /// value of the [`ENCRYPTED_FIELD`] form field.
    pub fn encrypt<I, K, V>(&self, params: I) -> Result<String, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut scratch = Scratch::new(&self.config.scratch);

        self.encrypt_staged(&mut scratch, params)
    }

    fn encrypt_staged<I, K, V>(&self, scratch: &mut Scratch, params: I) -> Result<String, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let (merchant, processor_cert) = self.configured()?;

        let clear = clear_text(&self.certificate_id, params)?;
        let clear = scratch.stage(Artifact::Clear, clear)?;

        let signed = sign(merchant, &clear)?;
        let payload = Envelope::parse(&signed)
            .and_then(|envelope| envelope.decode_body())
            .map_err(Error::UnexpectedSignFormat)?;
        let payload = scratch.stage(Artifact::Signed, payload)?;

        debug!("Signed {} bytes of button parameters", clear.len());

        let encrypted = self.envelope(processor_cert, &payload)?;
        let encrypted = scratch.stage(Artifact::Encrypted, encrypted)?;
        let envelope = Envelope::parse(&encrypted).map_err(Error::UnexpectedEncryptFormat)?;

        debug!("Encrypted {} bytes of signed data", payload.len());

        Ok(format!("{}\n{}\n{}", PEM_BEGIN, envelope.body(), PEM_END))
    }

    fn configured(&self) -> Result<(&MerchantCredentials, &X509Ref), Error> {
        if self.certificate_id.is_empty() {
            return Err(Error::NotConfigured("certificate id"));
        }

        let merchant = self
            .merchant
            .as_ref()
            .ok_or(Error::NotConfigured("merchant certificate and private key"))?;

        let processor_cert = self
            .processor_cert
            .as_deref()
            .ok_or(Error::NotConfigured("payment processor certificate"))?;

        Ok((merchant, processor_cert))
    }

    fn envelope(
        &self,
        processor_cert: &X509Ref,
        payload: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, Error> {
        let flags = Pkcs7Flags::BINARY;

        let mut certs = Stack::new().map_err(Error::EncryptFailure)?;
        certs
            .push(processor_cert.to_owned())
            .map_err(Error::EncryptFailure)?;

        let pkcs7 = Pkcs7::encrypt(&certs, payload, self.config.cipher.cipher(), flags)
            .map_err(Error::EncryptFailure)?;
        let smime = pkcs7
            .to_smime(payload, flags)
            .map_err(Error::EncryptFailure)?;

        Ok(Zeroizing::new(smime))
    }
}

fn sign(merchant: &MerchantCredentials, clear: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error> {
    let flags = Pkcs7Flags::BINARY;

    let certs = Stack::new().map_err(Error::SignFailure)?;
    let pkcs7 = Pkcs7::sign(merchant.cert(), merchant.key(), &certs, clear, flags)
        .map_err(Error::SignFailure)?;
    let smime = pkcs7
        .to_smime(clear, flags)
        .map_err(Error::SignFailure)?;

    Ok(Zeroizing::new(smime))
}
