//! `nativestart keygen`

use anyhow::{Context, Result};
use ed25519_dalek::SigningKey;
use rand::RngCore;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::keyfile;

/// Generate a key pair and write `<name>.key` (secret) and `<name>.pub`
/// into `out_dir`. Returns both paths.
pub fn keygen(out_dir: &Path, name: &str, force: bool) -> Result<(PathBuf, PathBuf)> {
    let secret_path = out_dir.join(format!("{name}.key"));
    let public_path = out_dir.join(format!("{name}.pub"));
    if !force {
        for path in [&secret_path, &public_path] {
            if path.exists() {
                anyhow::bail!("{} already exists (use --force to replace it)", path.display());
            }
        }
    }

    println!("  generating ed25519 keypair");

    let mut secret_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut secret_bytes);
    let signing_key = SigningKey::from_bytes(&secret_bytes);
    let verify_key = signing_key.verifying_key();

    let secret_b64 = keyfile::encode(&signing_key.to_bytes());
    let public_b64 = keyfile::encode(verify_key.as_bytes());

    fs::create_dir_all(out_dir)?;
    write_secret(&secret_path, secret_b64.as_bytes())
        .with_context(|| format!("Failed to write {}", secret_path.display()))?;
    fs::write(&public_path, &public_b64)
        .with_context(|| format!("Failed to write {}", public_path.display()))?;

    println!();
    println!("  public (embedded in signed launchers):");
    println!("  {public_b64}");
    println!();
    println!("  wrote {} (keep safe)", secret_path.display());
    println!("  wrote {}", public_path.display());

    Ok((secret_path, public_path))
}

/// Write the secret key into a freshly created file that only the owner
/// can read. A replaced key file is removed first so its old mode does not
/// carry over.
fn write_secret(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)?.write_all(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_matching_pair() {
        let tmp = tempfile::TempDir::new().unwrap();
        let (secret, public) = keygen(tmp.path(), "demo", false).unwrap();

        let signing = keyfile::read_signing_key(&secret).unwrap();
        let verifying = keyfile::read_public_key(&public).unwrap();
        assert_eq!(signing.verifying_key(), verifying);
    }

    #[test]
    fn refuses_to_overwrite() {
        let tmp = tempfile::TempDir::new().unwrap();
        keygen(tmp.path(), "demo", false).unwrap();
        assert!(keygen(tmp.path(), "demo", false).is_err());
        keygen(tmp.path(), "demo", true).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn secret_key_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let secret = tmp.path().join("demo.key");
        fs::write(&secret, "stale").unwrap();
        fs::set_permissions(&secret, fs::Permissions::from_mode(0o644)).unwrap();

        let (secret, _) = keygen(tmp.path(), "demo", true).unwrap();
        let mode = fs::metadata(&secret).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
