use crate::dialect::Postgres;
use model::schema::TableSpec;

/// `COPY table (col1, …) FROM STDIN` with the double-quoted column list in
/// the order fixed at pipeline construction (§4.3 step 2).
pub fn copy_from_stdin(table: &TableSpec, columns: &[String]) -> String {
    let dialect = Postgres;
    let qualified = dialect.qualified_identifier(&table.schema, &table.name);
    let column_list = columns
        .iter()
        .map(|c| dialect.quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!("COPY {qualified} ({column_list}) FROM STDIN")
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::data_type::DataType;
    use model::schema::ColumnSpec;

    #[test]
    fn renders_quoted_column_list() {
        let table = TableSpec {
            schema: "public".into(),
            name: "users".into(),
            oid: None,
            columns: vec![ColumnSpec {
                name: "id".into(),
                source_type: "INT".into(),
                target_type: DataType::Int,
                nullable: false,
                default: None,
                transform: None,
            }],
        };
        let sql = copy_from_stdin(&table, &["id".to_string(), "name".to_string()]);
        assert_eq!(sql, r#"COPY "public"."users" ("id", "name") FROM STDIN"#);
    }
}
