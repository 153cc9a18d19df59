//! Exportación de la cabecera CSV de un esquema.

use std::borrow::Cow;

use forma_core::{EngineError, RecordStore, SchemaEngine, SchemaStore, TableCatalog};
use forma_domain::Schema;

/// Fila de cabecera (RFC 4180, con salto de línea CRLF) con los nombres de
/// campo en el orden del esquema.
pub fn header_row(schema: &Schema) -> String {
    let cells: Vec<Cow<'_, str>> = schema.fields.iter().map(|f| escape(&f.name)).collect();
    format!("{}\r\n", cells.join(","))
}

pub fn export_fields_csv<S, B>(engine: &SchemaEngine<S, B>, schema_name: &str) -> Result<String, EngineError>
    where S: SchemaStore + ?Sized,
          B: TableCatalog + RecordStore + ?Sized
{
    Ok(header_row(&engine.handle(schema_name)?.schema))
}

fn escape(cell: &str) -> Cow<'_, str> {
    if cell.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", cell.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_only_when_needed() {
        assert_eq!(escape("week"), "week");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
