//! The target is always PostgreSQL (§1 Purpose & Scope); unlike the
//! teacher, which renders DDL for either side of a migration, this planner
//! only ever emits Postgres SQL text, so there is a single `Postgres` unit
//! struct rather than a `Dialect` trait with multiple implementors.

use model::core::data_type::DataType;

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Postgres {
    pub fn quote_identifier(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    pub fn qualified_identifier(&self, schema: &str, name: &str) -> String {
        format!(
            "{}.{}",
            self.quote_identifier(schema),
            self.quote_identifier(name)
        )
    }

    pub fn render_data_type(&self, data_type: &DataType) -> String {
        data_type.postgres_name().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_identifier_doubling_embedded_quotes() {
        let pg = Postgres;
        assert_eq!(pg.quote_identifier(r#"weird"name"#), r#""weird""name""#);
    }
}
