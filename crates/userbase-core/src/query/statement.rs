//! Query text for the statements the repository issues.

use super::Predicate;

/// `SELECT * FROM table` followed by the predicate fragment.
pub fn select_all(table: &str, predicate: &Predicate) -> String {
    format!("SELECT * FROM {}{}", table, predicate.fragment())
}

/// `SELECT COUNT(*) FROM table`.
pub fn count_all(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", table)
}
