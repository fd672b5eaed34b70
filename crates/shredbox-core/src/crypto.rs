//! Streaming file cipher (AES-256-CBC, IV-prefixed)
//!
//! Every encrypted blob is self-describing: bytes 0-15 are a fresh random
//! IV, the rest is the CBC ciphertext of the source stream with PKCS#7
//! padding. Encrypt and decrypt are chunked pipe-throughs; neither ever
//! holds a whole file in memory.

use std::fmt;
use std::path::Path;

use aes::cipher::{generic_array::GenericArray, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{BLOCK_LEN, CIPHER_CHUNK_SIZE, IV_LEN, KEY_LEN};
use crate::error::AppError;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Generate a fresh hex-encoded 256-bit key. This is what the one-time
/// key-generation tool calls; the result goes into `ENCRYPTION_KEY`.
pub fn generate_key_hex() -> String {
    let mut key = [0u8; KEY_LEN];
    rand::rng().fill_bytes(&mut key);
    let encoded = hex::encode(key);
    key.zeroize();
    encoded
}

/// 256-bit key material. Zeroized on drop; `Debug` never prints bytes.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AppError> {
        if bytes.len() != KEY_LEN {
            return Err(AppError::InvalidKey(format!(
                "key must be {} bytes (256 bits), got {}",
                KEY_LEN,
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(bytes);
        Ok(EncryptionKey(key))
    }

    pub fn from_hex(encoded: &str) -> Result<Self, AppError> {
        let bytes = hex::decode(encoded)
            .map_err(|e| AppError::InvalidKey(format!("key is not valid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

/// Streaming symmetric cipher bound to one key.
#[derive(Clone)]
pub struct FileCipher {
    key: EncryptionKey,
}

impl FileCipher {
    pub fn new(key: EncryptionKey) -> Self {
        FileCipher { key }
    }

    pub fn from_hex(encoded: &str) -> Result<Self, AppError> {
        Ok(FileCipher::new(EncryptionKey::from_hex(encoded)?))
    }

    /// Encrypt `src` into `dst`: fresh random IV first, CBC body after.
    /// Returns total bytes written to `dst`, IV included. A 0-byte source
    /// still produces a full padding block.
    pub async fn encrypt<R, W>(&self, mut src: R, mut dst: W) -> Result<u64, AppError>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        let mut iv = [0u8; IV_LEN];
        rand::rng().fill_bytes(&mut iv);
        let mut encryptor = Aes256CbcEnc::new(
            GenericArray::from_slice(self.key.as_bytes()),
            GenericArray::from_slice(&iv),
        );

        dst.write_all(&iv).await?;
        let mut written = IV_LEN as u64;

        let mut buf = vec![0u8; CIPHER_CHUNK_SIZE];
        let mut pending: Vec<u8> = Vec::with_capacity(CIPHER_CHUNK_SIZE + BLOCK_LEN);
        loop {
            let n = src.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            pending.extend_from_slice(&buf[..n]);
            let full = pending.len() - pending.len() % BLOCK_LEN;
            if full > 0 {
                for block in pending[..full].chunks_exact_mut(BLOCK_LEN) {
                    encryptor.encrypt_block_mut(GenericArray::from_mut_slice(block));
                }
                dst.write_all(&pending[..full]).await?;
                written += full as u64;
                pending.drain(..full);
            }
        }

        // PKCS#7: the final block always exists, all-padding for aligned input
        let pad = (BLOCK_LEN - pending.len() % BLOCK_LEN) as u8;
        pending.resize(pending.len() + pad as usize, pad);
        for block in pending.chunks_exact_mut(BLOCK_LEN) {
            encryptor.encrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        dst.write_all(&pending).await?;
        written += pending.len() as u64;
        dst.flush().await?;

        // buf and pending held plaintext
        buf.zeroize();
        pending.zeroize();
        Ok(written)
    }

    /// Decrypt `src` (IV prefix + CBC body) into `dst`. Returns plaintext
    /// bytes written. Fails with `CorruptCiphertext` on a short source, a
    /// body that is not whole blocks, or bad padding.
    pub async fn decrypt<R, W>(&self, mut src: R, mut dst: W) -> Result<u64, AppError>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        let mut iv = [0u8; IV_LEN];
        src.read_exact(&mut iv).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                AppError::CorruptCiphertext("ciphertext shorter than the IV header".to_string())
            } else {
                AppError::from(e)
            }
        })?;
        let mut decryptor = Aes256CbcDec::new(
            GenericArray::from_slice(self.key.as_bytes()),
            GenericArray::from_slice(&iv),
        );

        let mut written = 0u64;
        let mut buf = vec![0u8; CIPHER_CHUNK_SIZE];
        let mut pending: Vec<u8> = Vec::with_capacity(CIPHER_CHUNK_SIZE + BLOCK_LEN);
        loop {
            let n = src.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            pending.extend_from_slice(&buf[..n]);
            // hold back one block: the padding lives in the final block and
            // must not be streamed out before EOF is known
            if pending.len() > BLOCK_LEN {
                let mut emit = pending.len() - BLOCK_LEN;
                emit -= emit % BLOCK_LEN;
                if emit > 0 {
                    for block in pending[..emit].chunks_exact_mut(BLOCK_LEN) {
                        decryptor.decrypt_block_mut(GenericArray::from_mut_slice(block));
                    }
                    dst.write_all(&pending[..emit]).await?;
                    written += emit as u64;
                    pending.drain(..emit);
                }
            }
        }

        if pending.len() != BLOCK_LEN {
            return Err(AppError::CorruptCiphertext(format!(
                "ciphertext body length is not a whole number of blocks ({} trailing bytes)",
                pending.len()
            )));
        }

        decryptor.decrypt_block_mut(GenericArray::from_mut_slice(&mut pending[..]));
        let pad = pending[BLOCK_LEN - 1] as usize;
        if pad == 0 || pad > BLOCK_LEN || !pending[BLOCK_LEN - pad..].iter().all(|&b| b == pad as u8)
        {
            pending.zeroize();
            return Err(AppError::CorruptCiphertext(
                "padding validation failed".to_string(),
            ));
        }
        dst.write_all(&pending[..BLOCK_LEN - pad]).await?;
        written += (BLOCK_LEN - pad) as u64;
        dst.flush().await?;

        pending.zeroize();
        Ok(written)
    }

    /// Encrypt the file at `src` into a new file at `dst`, fsynced.
    pub async fn encrypt_file(&self, src: &Path, dst: &Path) -> Result<u64, AppError> {
        let input = fs::File::open(src).await.map_err(|e| {
            AppError::Storage(format!("failed to open {}: {}", src.display(), e))
        })?;
        let output = fs::File::create(dst).await.map_err(|e| {
            AppError::Storage(format!("failed to create {}: {}", dst.display(), e))
        })?;
        let mut writer = BufWriter::new(output);
        let written = self.encrypt(BufReader::new(input), &mut writer).await?;
        writer.flush().await?;
        writer.into_inner().sync_all().await?;
        Ok(written)
    }

    /// Decrypt the file at `src` into a new file at `dst`.
    pub async fn decrypt_file(&self, src: &Path, dst: &Path) -> Result<u64, AppError> {
        let input = fs::File::open(src).await.map_err(|e| {
            AppError::Storage(format!("failed to open {}: {}", src.display(), e))
        })?;
        let output = fs::File::create(dst).await.map_err(|e| {
            AppError::Storage(format!("failed to create {}: {}", dst.display(), e))
        })?;
        let mut writer = BufWriter::new(output);
        let written = self.decrypt(BufReader::new(input), &mut writer).await?;
        writer.flush().await?;
        writer.into_inner().sync_all().await?;
        Ok(written)
    }
}
