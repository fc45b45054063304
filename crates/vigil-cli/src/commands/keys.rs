//! Keys command - generate document encryption keys.

use vigil_crypto::EncryptionKey;

use crate::theme::Theme;

/// Print a fresh random key. Nothing is written to disk.
pub(crate) fn generate_key() {
    let key = EncryptionKey::generate();
    let hex = key.to_hex();

    println!("{}", Theme::success("New encryption key generated."));
    println!("{}", Theme::kv("Key (hex)", &hex));
    println!();
    println!(
        "{}",
        Theme::warning("Documents encrypted under a key cannot be read without it. Store it safely.")
    );
    println!(
        "{}",
        Theme::info("Set VIGIL_ENCRYPTION_KEY or [crypto] encryption_key in config.toml.")
    );
}
