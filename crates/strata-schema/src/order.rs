//! Referenced-table-first ordering for DDL emission.

use strata_core::DatabaseModel;

/// Order table indices so that every table is created after the tables its
/// foreign keys reference.
///
/// Ties are broken by declaration order, so the output is deterministic.
/// Self-references impose no ordering. A reference cycle cannot be
/// satisfied; the tables on it are appended in declaration order with a
/// warning, and constraint failures surface at execution.
pub fn creation_order(model: &DatabaseModel) -> Vec<usize> {
    let n = model.tables.len();
    let mut indegree = vec![0usize; n];
    // dependents[p] holds the tables whose foreign keys reference p.
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

    for (i, table) in model.tables.iter().enumerate() {
        for rel in &table.relations {
            if let Some(target) = rel.target {
                if target != i {
                    indegree[i] += 1;
                    dependents[target].push(i);
                }
            }
        }
    }

    let mut order = Vec::with_capacity(n);
    let mut placed = vec![false; n];
    loop {
        // Lowest declaration index among ready tables keeps the output
        // stable across runs.
        let Some(next) = (0..n).find(|&i| !placed[i] && indegree[i] == 0) else {
            break;
        };
        placed[next] = true;
        order.push(next);
        for &dep in &dependents[next] {
            indegree[dep] -= 1;
        }
    }

    if order.len() < n {
        let stuck: Vec<&str> = (0..n)
            .filter(|&i| !placed[i])
            .map(|i| model.tables[i].table_name.as_str())
            .collect();
        tracing::warn!(
            database = %model.name,
            tables = ?stuck,
            "Foreign keys form a cycle; creating the remaining tables in declaration order"
        );
        order.extend((0..n).filter(|&i| !placed[i]));
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::SqliteGenerator;
    use strata_core::metadata::{DatabaseMeta, EntityMeta};
    use strata_core::DatabaseModel;

    fn entity(name: &str) -> EntityMeta {
        EntityMeta::new(name).field("id", "int").primary_key("id")
    }

    #[test]
    fn test_parent_precedes_child() {
        // Post is declared first but references Author.
        let db = DatabaseMeta::new("ord", 1)
            .table(
                entity("Post")
                    .field("author_id", "int")
                    .foreign_key("author_id", "author", "Author"),
                "posts",
            )
            .table(entity("Author"), "authors");
        let model = DatabaseModel::build(&db, &SqliteGenerator).unwrap();

        assert_eq!(creation_order(&model), vec![1, 0]);
    }

    #[test]
    fn test_chain_orders_transitively() {
        let db = DatabaseMeta::new("chain", 1)
            .table(
                entity("Comment")
                    .field("post_id", "int")
                    .foreign_key("post_id", "post", "Post"),
                "comments",
            )
            .table(
                entity("Post")
                    .field("author_id", "int")
                    .foreign_key("author_id", "author", "Author"),
                "posts",
            )
            .table(entity("Author"), "authors");
        let model = DatabaseModel::build(&db, &SqliteGenerator).unwrap();

        assert_eq!(creation_order(&model), vec![2, 1, 0]);
    }

    #[test]
    fn test_independent_tables_keep_declaration_order() {
        let db = DatabaseMeta::new("flat", 1)
            .table(entity("A"), "a")
            .table(entity("B"), "b")
            .table(entity("C"), "c");
        let model = DatabaseModel::build(&db, &SqliteGenerator).unwrap();

        assert_eq!(creation_order(&model), vec![0, 1, 2]);
    }

    #[test]
    fn test_cycle_falls_back_to_declaration_order() {
        let db = DatabaseMeta::new("cyc", 1)
            .table(
                entity("A")
                    .field("b_id", "int")
                    .foreign_key("b_id", "b", "B"),
                "a",
            )
            .table(
                entity("B")
                    .field("a_id", "int")
                    .foreign_key("a_id", "a", "A"),
                "b",
            );
        let model = DatabaseModel::build(&db, &SqliteGenerator).unwrap();

        let order = creation_order(&model);
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn test_self_reference_is_not_a_cycle() {
        let db = DatabaseMeta::new("tree", 1).table(
            entity("Node")
                .field("parent_id", "int")
                .foreign_key("parent_id", "parent", "Node"),
            "nodes",
        );
        let model = DatabaseModel::build(&db, &SqliteGenerator).unwrap();

        assert_eq!(creation_order(&model), vec![0]);
    }
}
