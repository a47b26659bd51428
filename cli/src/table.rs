//! Translates a `TableConfig` into the model-layer pieces the pipeline
//! needs: a `TableSpec` for DDL, a `CopyOptions` for the writer, and a
//! concrete `Reader` for the source (§6, §4.4).

use connectors::factory::{build_reader, SourceKind};
use connectors::fixed::config::{FieldSpec, FixedWidthConfig};
use connectors::mysql::config::MySqlSourceConfig;
use connectors::reader::Reader;
use engine_config::config::TableConfig;
use model::core::data_type::DataType;
use model::options::CopyOptions;
use model::schema::{ColumnSpec, IndexSpec, TableSpec};

use crate::error::CliError;

pub fn build_table_spec(table: &TableConfig) -> Result<TableSpec, CliError> {
    let (schema, name) = table.target_schema_and_table();
    let columns = table
        .columns
        .iter()
        .map(|c| {
            let target_type = DataType::try_from(c.target_type.as_str())
                .map_err(|e| CliError::Config(format!("column '{}': {e}", c.name)))?;
            Ok(ColumnSpec {
                name: c.name.clone(),
                source_type: c.source_type.clone(),
                target_type,
                nullable: c.nullable,
                default: c.default.clone(),
                transform: None,
            })
        })
        .collect::<Result<Vec<_>, CliError>>()?;

    Ok(TableSpec {
        schema,
        name,
        columns,
        oid: None,
    })
}

/// Translates a table's `[[tables.indexes]]` entries into `IndexSpec`s
/// ready for `engine_runtime::index_kernel::build_indexes` (§4.7).
pub fn build_table_indexes(table: &TableConfig, spec: &TableSpec) -> Vec<IndexSpec> {
    table
        .indexes
        .iter()
        .map(|idx| IndexSpec {
            name: idx.name.clone(),
            table: spec.qualified_name(),
            primary: idx.primary,
            unique: idx.unique || idx.primary,
            sql: planner::ddl::build_index_sql(spec, &idx.columns, idx.unique || idx.primary),
            constraint_name: None,
        })
        .collect()
}

pub fn build_copy_options(table: &TableConfig) -> CopyOptions {
    CopyOptions {
        columns: table.columns.iter().map(|c| c.name.clone()).collect(),
        truncate: table.truncate,
        disable_triggers: table.disable_triggers,
    }
}

/// Builds the concrete reader named by `table.source`'s scheme (§6 Source
/// URIs): `mysql://…#table` selects the MySQL reader, everything else goes
/// through the fixed-width reader (stdin, inline, path, http(s), glob).
pub fn build_table_reader(table: &TableConfig) -> Result<Box<dyn Reader>, CliError> {
    if let Some(rest) = table.source.strip_prefix("mysql://") {
        let (dsn_body, source_table) = rest
            .split_once('#')
            .ok_or_else(|| CliError::Config(format!("mysql source '{}' is missing a #table fragment", table.source)))?;
        let dsn = format!("mysql://{dsn_body}");
        let columns = table.columns.iter().map(|c| c.name.clone()).collect();
        let config = MySqlSourceConfig {
            dsn,
            table: source_table.to_string(),
            columns,
            encoding: table.encoding.clone(),
        };
        return Ok(build_reader(&table.source, SourceKind::MySql(config))?);
    }

    let fields = table
        .fixed_fields
        .iter()
        .map(|f| FieldSpec {
            name: f.name.clone(),
            start: f.start,
            length: f.length,
        })
        .collect();
    let config = FixedWidthConfig {
        encoding: table.encoding.clone(),
        skip_lines: Some(table.skip_lines),
        skip_line: None,
        fields,
    };
    Ok(build_reader(&table.source, SourceKind::Fixed(config))?)
}
