//! Plain SQL-text builders for the schema orchestrator's prepare/complete
//! phases (§4.7). Unlike the teacher, which builds an AST and renders it,
//! this planner returns ready-to-execute SQL strings directly — there is no
//! downstream dialect to stay polymorphic over, so the AST layer buys
//! nothing.

use crate::dialect::Postgres;
use model::schema::{IndexSpec, TableSpec};

pub fn create_table(table: &TableSpec) -> String {
    let dialect = Postgres;
    let qualified = dialect.qualified_identifier(&table.schema, &table.name);

    // TableSpec carries no per-column PK flag: PKs arrive as IndexSpecs and
    // are promoted from a UNIQUE index in the complete phase (§4.7).
    let column_defs: Vec<String> = table
        .columns
        .iter()
        .map(|col| {
            let mut def = format!(
                "{} {}",
                dialect.quote_identifier(&col.name),
                dialect.render_data_type(&col.target_type)
            );
            if !col.nullable {
                def.push_str(" NOT NULL");
            }
            if let Some(default) = &col.default {
                def.push_str(&format!(" DEFAULT {default}"));
            }
            def
        })
        .collect();

    format!(
        "CREATE TABLE {qualified} (\n  {}\n)",
        column_defs.join(",\n  ")
    )
}

pub fn drop_table(table: &TableSpec, if_exists: bool) -> String {
    let dialect = Postgres;
    let qualified = dialect.qualified_identifier(&table.schema, &table.name);
    if if_exists {
        format!("DROP TABLE IF EXISTS {qualified} CASCADE")
    } else {
        format!("DROP TABLE {qualified} CASCADE")
    }
}

pub fn truncate_table(table: &TableSpec) -> String {
    let dialect = Postgres;
    format!(
        "TRUNCATE TABLE {}",
        dialect.qualified_identifier(&table.schema, &table.name)
    )
}

pub fn disable_triggers(table: &TableSpec) -> String {
    let dialect = Postgres;
    format!(
        "ALTER TABLE {} DISABLE TRIGGER ALL",
        dialect.qualified_identifier(&table.schema, &table.name)
    )
}

pub fn enable_triggers(table: &TableSpec) -> String {
    let dialect = Postgres;
    format!(
        "ALTER TABLE {} ENABLE TRIGGER ALL",
        dialect.qualified_identifier(&table.schema, &table.name)
    )
}

/// Builds the `CREATE [UNIQUE] INDEX {name} ON table (cols…)` text an
/// `IndexSpec.sql` carries, with the name left as the `{name}` placeholder
/// `create_index` substitutes once `uniquify` has run (§4.7).
pub fn build_index_sql(table: &TableSpec, columns: &[String], unique: bool) -> String {
    let dialect = Postgres;
    let qualified = dialect.qualified_identifier(&table.schema, &table.name);
    let quoted_cols = columns
        .iter()
        .map(|c| dialect.quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    let unique_kw = if unique { "UNIQUE " } else { "" };
    format!("CREATE {unique_kw}INDEX {{name}} ON {qualified} ({quoted_cols})")
}

pub fn create_index(index: &IndexSpec) -> String {
    // `index.sql` already carries the full `CREATE INDEX ... ON table (...)`
    // text produced when the index was planned from source metadata; this
    // builder only ever substitutes in the final, possibly oid-suffixed name.
    index.sql.replacen("{name}", &Postgres.quote_identifier(&index.name), 1)
}

/// Promotes a UNIQUE index to the table's PRIMARY KEY without rebuilding it
/// (§4.7 Complete phase): `ALTER TABLE ... ADD PRIMARY KEY USING INDEX ...`.
pub fn add_primary_key_using_index(table: &TableSpec, index: &IndexSpec) -> String {
    let dialect = Postgres;
    let qualified = dialect.qualified_identifier(&table.schema, &table.name);
    let constraint_name = index
        .constraint_name
        .clone()
        .unwrap_or_else(|| format!("{}_pkey", index.name));
    format!(
        "ALTER TABLE {qualified} ADD CONSTRAINT {} PRIMARY KEY USING INDEX {}",
        dialect.quote_identifier(&constraint_name),
        dialect.quote_identifier(&index.name)
    )
}

pub fn add_foreign_key(
    table: &TableSpec,
    constraint_name: &str,
    columns: &[String],
    ref_schema: &str,
    ref_table: &str,
    ref_columns: &[String],
) -> String {
    let dialect = Postgres;
    let qualified = dialect.qualified_identifier(&table.schema, &table.name);
    let cols = columns
        .iter()
        .map(|c| dialect.quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    let ref_cols = ref_columns
        .iter()
        .map(|c| dialect.quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "ALTER TABLE {qualified} ADD CONSTRAINT {} FOREIGN KEY ({cols}) REFERENCES {} ({ref_cols})",
        dialect.quote_identifier(constraint_name),
        dialect.qualified_identifier(ref_schema, ref_table),
    )
}

pub fn drop_foreign_key(table: &TableSpec, constraint_name: &str) -> String {
    let dialect = Postgres;
    format!(
        "ALTER TABLE {} DROP CONSTRAINT IF EXISTS {}",
        dialect.qualified_identifier(&table.schema, &table.name),
        dialect.quote_identifier(constraint_name)
    )
}

/// `COMMENT ON TABLE ... IS $tag$...$tag$` (§4.7): the dollar-quote tag is
/// randomly generated per statement so a comment body containing `$$` can
/// never terminate the quoting early.
pub fn comment_on_table(table: &TableSpec, comment: &str) -> String {
    let dialect = Postgres;
    let tag = crate::sequence_reset::random_dollar_tag();
    format!(
        "COMMENT ON TABLE {} IS ${tag}${comment}${tag}$",
        dialect.qualified_identifier(&table.schema, &table.name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::data_type::DataType;
    use model::schema::ColumnSpec;

    fn sample_table() -> TableSpec {
        TableSpec {
            schema: "public".into(),
            name: "users".into(),
            oid: None,
            columns: vec![
                ColumnSpec {
                    name: "id".into(),
                    source_type: "INT".into(),
                    target_type: DataType::Int,
                    nullable: false,
                    default: None,
                    transform: None,
                },
                ColumnSpec {
                    name: "name".into(),
                    source_type: "VARCHAR".into(),
                    target_type: DataType::VarChar,
                    nullable: true,
                    default: None,
                    transform: None,
                },
            ],
        }
    }

    #[test]
    fn create_table_quotes_identifiers_and_marks_not_null() {
        let sql = create_table(&sample_table());
        assert!(sql.contains(r#""public"."users""#));
        assert!(sql.contains(r#""id" INTEGER NOT NULL"#));
        assert!(sql.contains(r#""name" VARCHAR"#));
        assert!(!sql.contains(r#""name" VARCHAR NOT NULL"#));
    }

    #[test]
    fn drop_table_with_if_exists() {
        assert_eq!(
            drop_table(&sample_table(), true),
            r#"DROP TABLE IF EXISTS "public"."users" CASCADE"#
        );
    }

    #[test]
    fn build_index_sql_leaves_name_placeholder_for_later_substitution() {
        let sql = build_index_sql(&sample_table(), &["name".to_string()], true);
        assert_eq!(sql, r#"CREATE UNIQUE INDEX {name} ON "public"."users" ("name")"#);
    }

    #[test]
    fn comment_uses_matching_dollar_tag_on_both_ends() {
        let sql = comment_on_table(&sample_table(), "a table");
        let first = sql.find('$').unwrap();
        let tag_end = sql[first + 1..].find('$').unwrap() + first + 1;
        let tag = &sql[first..=tag_end];
        assert!(sql.ends_with(&format!("{tag}")));
    }
}
