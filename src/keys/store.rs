use anyhow::Context;
use std::path::Path;

use crate::callback::{Direction, PassphraseBuf};
use crate::codec::{self, EncodingKind};
use crate::crypto::KdfParams;
use crate::error::KeyphraseError;
use crate::keys::PrivateKey;

/// Passphrase protecting reference key files.
pub const REFERENCE_PASSPHRASE: &[u8] = b"weak_password";

fn reference_passphrase(buf: &mut PassphraseBuf<'_>, _direction: Direction, _: &()) -> i32 {
    match buf.write_prefix(REFERENCE_PASSPHRASE) {
        Some(n) => i32::try_from(n).unwrap_or(-1),
        None => -1,
    }
}

/// Write bytes to disk atomically (write to temp then rename) and set 0600 permissions.
///
/// Uses a temp file in the same directory to ensure atomic replacement on POSIX systems.
/// After a successful rename, the file permissions are explicitly set to 0600 so that
/// the key file is only readable by the owner regardless of the umask.
pub fn write_key_atomic(bytes: &[u8], dest: &Path) -> anyhow::Result<()> {
    let parent = dest
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Key destination path has no parent directory"))?;
    let file_name = dest
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Key destination path has no file name"))?;

    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".tmp");
    let tmp = parent.join(tmp_name);

    std::fs::write(&tmp, bytes).map_err(KeyphraseError::AtomicWriteFailed)?;

    if let Err(e) = std::fs::rename(&tmp, dest) {
        // Attempt cleanup of temp file on rename failure
        let _ = std::fs::remove_file(&tmp);
        return Err(KeyphraseError::AtomicWriteFailed(e).into());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dest, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set 0600 permissions on {}", dest.display()))?;
    }

    Ok(())
}

/// Encrypt `key` with the reference passphrase in the traditional encoding and
/// write it to `dest`.
pub fn write_reference_key(
    key: &PrivateKey,
    dest: &Path,
    kdf: &KdfParams,
) -> anyhow::Result<()> {
    let mut callback = reference_passphrase;
    let encoded = codec::encrypt(EncodingKind::Traditional, key, &mut callback, &(), kdf)
        .context("Failed to encrypt reference key")?;
    write_key_atomic(&encoded, dest)
}

/// Load the reference key from `path`, decrypting it with the reference passphrase.
///
/// Performs a permission check before reading the key file: if the file has permissions
/// other than 0600 the load is rejected with an error that includes the remediation command.
pub fn load_reference_key(path: &Path) -> anyhow::Result<PrivateKey> {
    if !path.exists() {
        return Err(KeyphraseError::KeyFileNotFound(path.to_path_buf()).into());
    }
    check_key_permissions(path)?;
    let encoded = zeroize::Zeroizing::new(
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?,
    );

    let mut callback = reference_passphrase;
    let key = codec::decrypt(EncodingKind::Traditional, &encoded, &mut callback, &()).map_err(
        |source| KeyphraseError::ReferenceKeyUnreadable {
            path: path.to_path_buf(),
            source,
        },
    )?;
    tracing::info!(path = %path.display(), "reference key loaded");
    Ok(key)
}

/// Check that the key file has exactly 0600 permissions (Unix only).
///
/// Returns an error if the file permissions allow group or other access.
/// The error message includes the remediation command (`chmod 600 <path>`).
#[cfg(unix)]
pub fn check_key_permissions(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?;
    let mode = metadata.permissions().mode() & 0o777;
    if mode != 0o600 {
        anyhow::bail!(
            "Key file {} has insecure permissions {:04o} (expected 0600). Fix with: chmod 600 {}",
            path.display(),
            mode,
            path.display()
        );
    }
    Ok(())
}

/// No-op permission check on non-Unix platforms (Windows, WASM, etc.).
#[cfg(not(unix))]
pub fn check_key_permissions(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}
