use dialoguer::Password;

/// Prompt for the vault key.
pub fn prompt_encryption_key(interactive: bool) -> anyhow::Result<String> {
    if !interactive {
        return Err(anyhow::anyhow!(
            "No encryption key provided and no TTY available. Set QWERY_ENCRYPTION_KEY or pass --key."
        ));
    }
    Password::new()
        .with_prompt("Encryption key")
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read encryption key: {}", e))
}
