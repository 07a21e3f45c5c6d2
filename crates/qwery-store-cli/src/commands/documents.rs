use qwery_store::{IdPrefix, StorageKey};

use crate::app::{exit_not_found_with_hint, AppContext};
use crate::cli::{KeyArgs, KeysArgs};
use crate::helpers::{parse_key, parse_prefix};
use crate::output::{print_json, print_keys};

pub fn handle_root(ctx: &AppContext) -> anyhow::Result<()> {
    println!("{}", ctx.storage_root()?.display());
    Ok(())
}

pub async fn handle_keys(ctx: &AppContext<'_>, args: &KeysArgs) -> anyhow::Result<()> {
    let storage = ctx.storage()?;
    let keys = match parse_prefix(&args.prefix)? {
        Some(prefix) => storage.list(&prefix).await?,
        None => {
            let mut keys = Vec::new();
            for prefix in IdPrefix::ALL {
                let prefix = StorageKey::new([prefix.entity_name()])?;
                keys.extend(storage.list(&prefix).await?);
            }
            keys.sort();
            keys
        }
    };

    if args.json {
        let rendered: Vec<String> = keys.iter().map(ToString::to_string).collect();
        print_json(&rendered)
    } else {
        print_keys(&keys, ctx.quiet());
        Ok(())
    }
}

pub async fn handle_get(ctx: &AppContext<'_>, args: &KeyArgs) -> anyhow::Result<()> {
    let key = parse_key(&args.key)?;
    let storage = ctx.storage()?;
    match storage.read(&key).await {
        Ok(document) => print_json(&document),
        Err(err) if err.is_not_found() => exit_not_found_with_hint(
            &format!("Document \"{}\" not found", key),
            "Hint: Run `qwery-store keys` to list document keys.",
        ),
        Err(err) => Err(err.into()),
    }
}

pub async fn handle_rm(ctx: &AppContext<'_>, args: &KeyArgs) -> anyhow::Result<()> {
    let key = parse_key(&args.key)?;
    let storage = ctx.storage()?;
    storage.remove(&key).await?;
    if !ctx.quiet() {
        println!("Removed {}", key);
    }
    Ok(())
}
