use crate::database::identifier::Identifier;
use crate::database::store::ColumnDefinition;

pub fn generate_columns_names_sql(columns: &[Identifier]) -> String {
    columns.iter().map(Identifier::quoted).collect::<Vec<String>>().join(", ")
}

fn generate_columns_with_data_types_sql(columns: &[ColumnDefinition]) -> String {
    columns
        .iter()
        .map(|column| format!("{} {}", column.name.quoted(), column.column_type.sql_type()))
        .collect::<Vec<String>>()
        .join(", ")
}

pub fn drop_table_sql(table: &Identifier) -> String {
    format!("DROP TABLE IF EXISTS {};", table.quoted())
}

pub fn create_table_sql(table: &Identifier, columns: &[ColumnDefinition]) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({});",
        table.quoted(),
        generate_columns_with_data_types_sql(columns)
    )
}

pub fn add_column_sql(table: &Identifier, column: &ColumnDefinition) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {} {};",
        table.quoted(),
        column.name.quoted(),
        column.column_type.sql_type()
    )
}

/// `$1..$n` placeholders, one per column. A row without any columns falls back to
/// `DEFAULT VALUES` since `INSERT INTO t () VALUES ()` is not valid postgres.
pub fn insert_row_sql(table: &Identifier, columns: &[Identifier]) -> String {
    if columns.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES;", table.quoted());
    }

    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${}", i)).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({});",
        table.quoted(),
        generate_columns_names_sql(columns),
        placeholders.join(", ")
    )
}

pub const COLUMN_NAMES_SQL: &str = r#"
    SELECT column_name::text
    FROM information_schema.columns
    WHERE table_schema = current_schema() AND table_name = $1
    ORDER BY ordinal_position
"#;
