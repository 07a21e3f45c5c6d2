use std::io::{self, IsTerminal, Read};

/// Value from the argument, or stdin with the trailing newline dropped.
pub fn read_value(value: Option<&str>) -> anyhow::Result<String> {
    if let Some(value) = value {
        return Ok(value.to_string());
    }
    if io::stdin().is_terminal() {
        return Err(anyhow::anyhow!(
            "No value provided. Pass VALUE or pipe it on stdin."
        ));
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    let trimmed = buffer.strip_suffix('\n').unwrap_or(&buffer);
    let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
    Ok(trimmed.to_string())
}
