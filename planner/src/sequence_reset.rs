use model::schema::{ColumnSpec, TableSpec};
use rand::Rng;

/// Builds the per-table sequence-reset procedure (§4.7, resolved Open
/// Question): for every `nextval`-defaulted column, `setval` it to
/// `greatest(max(col), 1)`, then always `pg_notify` the count of sequences
/// touched on channel `"seqs"` — `0` when the table has none, never a
/// skipped notification.
pub fn reset_sequences_block(table: &TableSpec) -> String {
    let dialect = crate::dialect::Postgres;
    let qualified = dialect.qualified_identifier(&table.schema, &table.name);
    let tag = random_dollar_tag();

    let nextval_columns: Vec<&ColumnSpec> = table
        .columns
        .iter()
        .filter(|c| {
            c.default
                .as_deref()
                .map(|d| d.contains("nextval"))
                .unwrap_or(false)
        })
        .collect();

    let mut body = String::new();
    body.push_str("DECLARE\n  touched integer := 0;\nBEGIN\n");
    for col in &nextval_columns {
        let quoted_col = dialect.quote_identifier(&col.name);
        body.push_str(&format!(
            "  PERFORM setval(pg_get_serial_sequence('{qualified}', '{name}'), \
             greatest((SELECT max({quoted_col}) FROM {qualified}), 1));\n  touched := touched + 1;\n",
            name = col.name,
        ));
    }
    body.push_str("  PERFORM pg_notify('seqs', touched::text);\nEND;\n");

    format!("DO ${tag}$\n{body}${tag}$;")
}

/// An 11-character `[A-Z]{{5}}_[A-Z]{{5}}` dollar-quote tag (§4.7), random
/// per statement so a comment or procedure body can never terminate the
/// quoting early by coincidence.
pub fn random_dollar_tag() -> String {
    let mut rng = rand::thread_rng();
    let mut letters = || -> String {
        (0..5)
            .map(|_| (b'A' + rng.gen_range(0..26u8)) as char)
            .collect::<String>()
    };
    let first = letters();
    let second = letters();
    format!("{first}_{second}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::data_type::DataType;

    #[test]
    fn tag_matches_expected_shape() {
        let tag = random_dollar_tag();
        assert_eq!(tag.len(), 11);
        assert_eq!(tag.as_bytes()[5], b'_');
        assert!(tag.chars().all(|c| c == '_' || c.is_ascii_uppercase()));
    }

    #[test]
    fn block_always_notifies_even_with_no_sequences() {
        let table = TableSpec {
            schema: "public".into(),
            name: "plain".into(),
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
        let sql = reset_sequences_block(&table);
        assert!(sql.contains("pg_notify('seqs', touched::text)"));
        assert!(!sql.contains("setval"));
    }

    #[test]
    fn block_counts_nextval_columns() {
        let table = TableSpec {
            schema: "public".into(),
            name: "seq_t".into(),
            oid: None,
            columns: vec![ColumnSpec {
                name: "id".into(),
                source_type: "SERIAL".into(),
                target_type: DataType::Int,
                nullable: false,
                default: Some("nextval('seq_t_id_seq'::regclass)".into()),
                transform: None,
            }],
        };
        let sql = reset_sequences_block(&table);
        assert!(sql.contains("setval(pg_get_serial_sequence"));
        assert!(sql.contains("touched := touched + 1"));
    }
}
