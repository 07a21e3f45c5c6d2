use chrono::DateTime;

use qwery_store::id;

use crate::app::AppContext;
use crate::cli::{IdArgs, IdTimeArgs};
use crate::helpers::parse_entity;

pub fn handle_id(_ctx: &AppContext, args: &IdArgs) -> anyhow::Result<()> {
    let prefix = parse_entity(&args.entity)?;
    let value = id::generator().create(prefix, args.descending)?;
    println!("{}", value);
    Ok(())
}

pub fn handle_id_time(ctx: &AppContext, args: &IdTimeArgs) -> anyhow::Result<()> {
    let seconds = id::timestamp(&args.id)?;
    let at = DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| anyhow::anyhow!("Timestamp out of range: {}", seconds))?;
    if ctx.quiet() {
        println!("{}", seconds);
    } else {
        println!("{}", at.to_rfc3339());
    }
    Ok(())
}
