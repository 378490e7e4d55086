/// The initial schema, identical to the migration consumed by the external
/// runner. Only the test bootstrap executes it.
pub const SCHEMA: &str = include_str!("../../migrations/0001_initial.up.sql");

/// Tears down everything `SCHEMA` creates.
pub const SCHEMA_DOWN: &str = include_str!("../../migrations/0001_initial.down.sql");

/// Splits a migration script into single statements, dropping `--` comments.
///
/// The scripts contain no string literals with `;` or `--`, so a plain
/// textual split is enough.
pub fn statements(script: &str) -> Vec<String> {
    let stripped: String = script
        .lines()
        .map(|line| match line.find("--") {
            Some(idx) => &line[..idx],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n");

    stripped
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_skip_comments() {
        let parts = statements("-- heading\nCREATE TABLE a (x TEXT); -- trailing\n\nDROP TABLE a;\n");
        assert_eq!(parts, vec!["CREATE TABLE a (x TEXT)", "DROP TABLE a"]);
    }

    #[test]
    fn test_schema_covers_every_table() {
        let creates = statements(SCHEMA)
            .into_iter()
            .filter(|s| s.starts_with("CREATE TABLE"))
            .count();
        let drops = statements(SCHEMA_DOWN).len();
        assert_eq!(creates, 14);
        assert_eq!(drops, creates);
    }
}
