use crate::error::CliError;
use engine_core::error::EngineError;
use futures_util::{Stream, TryStreamExt, pin_mut};
use serde::Serialize;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Writes each row of `rows` to stdout as a delimited line, flushing as it goes.
pub async fn print_rows<S>(rows: S) -> Result<usize, CliError>
where
    S: Stream<Item = Result<Vec<String>, EngineError>>,
{
    pin_mut!(rows);
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    let mut written = 0;
    while let Some(row) = rows.try_next().await? {
        writer.write_record(&row)?;
        writer.flush()?;
        written += 1;
    }
    Ok(written)
}
