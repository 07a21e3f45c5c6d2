use qwery_store::vault::is_protected;
use qwery_store::SecretVault;

use crate::app::AppContext;
use crate::cli::SecretArgs;
use crate::helpers::read_value;

pub fn handle_protect(ctx: &AppContext, args: &SecretArgs) -> anyhow::Result<()> {
    let value = read_value(args.value.as_deref())?;
    let vault = ctx.vault()?;
    println!("{}", vault.protect(&value)?);
    Ok(())
}

/// Values that fail to decrypt are an error here, unlike the lenient
/// read path of the repositories.
pub fn handle_reveal(ctx: &AppContext, args: &SecretArgs) -> anyhow::Result<()> {
    let value = read_value(args.value.as_deref())?;
    if !is_protected(&value) {
        return Err(anyhow::anyhow!("Value is not protected (missing \"enc:\" prefix)"));
    }
    let vault = ctx.vault()?;
    let revealed = vault.reveal(&value);
    if revealed == value {
        return Err(anyhow::anyhow!(
            "Failed to reveal value. Hint: Check the encryption key."
        ));
    }
    println!("{}", revealed);
    Ok(())
}
