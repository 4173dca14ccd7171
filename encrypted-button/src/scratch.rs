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

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use log::warn;
use tempfile::{Builder, NamedTempFile};
use zeroize::Zeroizing;

use crate::{Error, ScratchStorage};

#[derive(Clone, Copy, Debug)]
pub enum Artifact {
    Clear,
    Signed,
    Encrypted,
}

/// Staging area for the artifacts of a single encryption call.
///
/// Everything handed out by [`Scratch::stage`] is wiped when dropped. Staged
/// files are overwritten and removed when the scratch area is dropped, no
/// matter how the call ends.
pub struct Scratch<'a> {
    storage: &'a ScratchStorage,
    files: Vec<NamedTempFile>,
}

impl Artifact {
    fn prefix(self) -> &'static str {
        match self {
            Self::Clear => "clear_",
            Self::Signed => "signed_",
            Self::Encrypted => "encrypted_",
        }
    }
}

impl<'a> Scratch<'a> {
    pub fn new(storage: &'a ScratchStorage) -> Self {
        Self {
            storage,
            files: Vec::new(),
        }
    }

    /// Stores `data` according to the configured storage and returns the
    /// buffer the next pipeline step has to work on.
    pub fn stage(
        &mut self,
        artifact: Artifact,
        data: Zeroizing<Vec<u8>>,
    ) -> Result<Zeroizing<Vec<u8>>, Error> {
        let dir = match self.storage {
            ScratchStorage::Memory => return Ok(data),
            ScratchStorage::Directory(dir) => dir,
        };

        let mut file = Builder::new()
            .prefix(artifact.prefix())
            .rand_bytes(16)
            .tempfile_in(dir)?;

        let staged = write_and_read(file.as_file_mut(), &data);

        self.files.push(file);

        staged
    }

    /// Content of the file staged for `artifact`, if any.
    #[cfg(test)]
    pub fn staged(&self, artifact: Artifact) -> Option<Vec<u8>> {
        self.files
            .iter()
            .find(|file| {
                let name = file.path().file_name().unwrap().to_string_lossy();

                name.starts_with(artifact.prefix())
            })
            .map(|file| std::fs::read(file.path()).unwrap())
    }
}

impl Drop for Scratch<'_> {
    fn drop(&mut self) {
        for mut file in self.files.drain(..) {
            if let Err(err) = wipe(file.as_file_mut()) {
                warn!(
                    "Unable to wipe scratch file {}: {}",
                    file.path().display(),
                    err
                );
            }

            let path = file.path().to_owned();
            if let Err(err) = file.close() {
                warn!("Unable to remove scratch file {}: {}", path.display(), err);
            }
        }
    }
}

fn write_and_read(file: &mut File, data: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error> {
    file.write_all(data)?;
    file.flush()?;
    file.seek(SeekFrom::Start(0))?;

    let mut staged = Zeroizing::new(Vec::with_capacity(data.len()));
    file.read_to_end(&mut staged)?;

    Ok(staged)
}

fn wipe(file: &mut File) -> Result<(), Error> {
    let len = file.metadata()?.len() as usize;

    file.seek(SeekFrom::Start(0))?;
    file.write_all(&vec![0; len])?;
    file.sync_data()?;

    Ok(())
}
