pub mod create_target;
pub mod query;
pub mod refresh;
pub mod save;
pub mod schema;

use crate::Format;
use serde::Serialize;

/// Pretty JSON on stdout, one document per command.
pub(crate) fn print_json<T: Serialize>(value: &T) -> color_eyre::Result<()> {
    serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    println!();
    Ok(())
}

pub(crate) fn is_json(format: Format) -> bool {
    format == Format::Json
}
