//! Change-tracked table sets and the save pipeline.
//!
//! This crate is the unit-of-work layer: records accumulate in
//! [`TableSet`]s with their statuses and changed-field sets, and one save
//! pass turns the whole accumulated state into INSERT/UPDATE/DELETE
//! statements in dependency order. Statement text comes from the active
//! dialect generator; transport goes through the [`strata_core::Backend`]
//! seam.

pub mod save;
pub mod table_set;

pub use save::{SaveContext, save_one};
pub use table_set::{TableSet, TableSetBase};

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::backend::testing::RecordingBackend;
    use strata_core::metadata::{DatabaseMeta, EntityMeta};
    use strata_core::{
        ChangeTracker, DatabaseModel, Record, Row, RowStatus, Value, row,
    };
    use strata_schema::SqliteGenerator;

    struct Author {
        id: Value,
        name: Value,
        tracker: ChangeTracker,
    }

    impl Author {
        fn create(name: &str) -> Row<Author> {
            let mut author = Author {
                id: Value::Null,
                name: Value::Null,
                tracker: ChangeTracker::new(),
            };
            author.set_field_value("name", Value::from(name));
            row(author)
        }
    }

    impl Record for Author {
        fn entity_name(&self) -> &'static str {
            "Author"
        }
        fn tracker(&self) -> &ChangeTracker {
            &self.tracker
        }
        fn tracker_mut(&mut self) -> &mut ChangeTracker {
            &mut self.tracker
        }
        fn field_value(&self, field: &str) -> Value {
            match field {
                "id" => self.id.clone(),
                "name" => self.name.clone(),
                _ => Value::Null,
            }
        }
        fn set_field_value(&mut self, field: &str, value: Value) {
            match field {
                "name" => {
                    let changed = self.name != value;
                    self.name = value;
                    self.tracker.note_write("name", changed);
                }
                "id" => self.id = value,
                _ => {}
            }
        }
        fn primary_value(&self) -> Value {
            self.id.clone()
        }
        fn set_primary_value(&mut self, value: Value) {
            self.id = value;
        }
    }

    struct Post {
        id: Value,
        title: Value,
        author_id: Value,
        author: Option<Row<Author>>,
        tracker: ChangeTracker,
    }

    impl Post {
        fn create(title: &str, author: &Row<Author>) -> Row<Post> {
            let mut post = Post {
                id: Value::Null,
                title: Value::Null,
                author_id: Value::Null,
                author: Some(author.clone()),
                tracker: ChangeTracker::new(),
            };
            post.set_field_value("title", Value::from(title));
            row(post)
        }
    }

    impl Record for Post {
        fn entity_name(&self) -> &'static str {
            "Post"
        }
        fn tracker(&self) -> &ChangeTracker {
            &self.tracker
        }
        fn tracker_mut(&mut self) -> &mut ChangeTracker {
            &mut self.tracker
        }
        fn field_value(&self, field: &str) -> Value {
            match field {
                "id" => self.id.clone(),
                "title" => self.title.clone(),
                "author_id" => self.author_id.clone(),
                _ => Value::Null,
            }
        }
        fn set_field_value(&mut self, field: &str, value: Value) {
            match field {
                "title" => {
                    let changed = self.title != value;
                    self.title = value;
                    self.tracker.note_write("title", changed);
                }
                "author_id" => {
                    let changed = self.author_id != value;
                    self.author_id = value;
                    self.tracker.note_write("author_id", changed);
                }
                "id" => self.id = value,
                _ => {}
            }
        }
        fn primary_value(&self) -> Value {
            self.id.clone()
        }
        fn set_primary_value(&mut self, value: Value) {
            self.id = value;
        }
        fn parent(&self, relation_name: &str) -> Option<Row<dyn Record>> {
            match relation_name {
                "author" => self.author.clone().map(|a| a as Row<dyn Record>),
                _ => None,
            }
        }
    }

    fn blog_model() -> DatabaseModel {
        let meta = DatabaseMeta::new("blog", 1)
            .table(
                EntityMeta::new("Author")
                    .field("id", "int")
                    .primary_auto_increment("id")
                    .field("name", "text"),
                "authors",
            )
            .table(
                EntityMeta::new("Post")
                    .field("id", "int")
                    .primary_auto_increment("id")
                    .field("title", "text")
                    .field("author_id", "int")
                    .foreign_key("author_id", "author", "Author"),
                "posts",
            );
        DatabaseModel::build(&meta, &SqliteGenerator).unwrap()
    }

    #[test]
    fn test_insert_captures_generated_key() {
        let model = blog_model();
        let g = SqliteGenerator;
        let mut backend = RecordingBackend::new();

        let author = Author::create("Ada");
        let mut authors: TableSet<Author> = TableSet::new();
        authors.append(author.clone());

        let mut ctx = SaveContext {
            model: &model,
            generator: &g,
            backend: &mut backend,
        };
        let affected = authors.save(&mut ctx).unwrap();

        assert_eq!(affected, 1);
        assert_eq!(
            backend.statements,
            vec!["INSERT INTO \"authors\" (\"name\") VALUES ('Ada')"]
        );
        assert_eq!(author.borrow().id, Value::Int(1));
        assert_eq!(author.borrow().tracker().status(), RowStatus::Fetched);
    }

    #[test]
    fn test_parent_saves_before_child_and_key_propagates() {
        let model = blog_model();
        let g = SqliteGenerator;
        let mut backend = RecordingBackend::new();

        let author = Author::create("Ada");
        let post = Post::create("Hello", &author);
        let mut posts: TableSet<Post> = TableSet::new();
        posts.append(post.clone());

        let mut ctx = SaveContext {
            model: &model,
            generator: &g,
            backend: &mut backend,
        };
        posts.save(&mut ctx).unwrap();

        // The referenced author lands first even though only the post set
        // was saved.
        assert!(backend.statements[0].contains("\"authors\""));
        assert!(backend.statements[1].contains("\"posts\""));
        assert_eq!(author.borrow().id, Value::Int(1));
        assert_eq!(post.borrow().author_id, Value::Int(1));
        assert!(backend.statements[1].contains("VALUES ('Hello', 1)"));
    }

    #[test]
    fn test_already_saved_parent_is_not_reinserted() {
        let model = blog_model();
        let g = SqliteGenerator;
        let mut backend = RecordingBackend::new();

        let author = Author::create("Ada");
        author.borrow_mut().set_primary_value(Value::Int(7));
        author.borrow_mut().tracker_mut().mark_saved();

        let post = Post::create("Hello", &author);
        let mut posts: TableSet<Post> = TableSet::new();
        posts.append(post.clone());

        let mut ctx = SaveContext {
            model: &model,
            generator: &g,
            backend: &mut backend,
        };
        posts.save(&mut ctx).unwrap();

        assert_eq!(backend.matching("authors").len(), 0);
        assert_eq!(post.borrow().author_id, Value::Int(7));
    }

    #[test]
    fn test_doomed_parent_is_not_deleted_by_child_insert() {
        let model = blog_model();
        let g = SqliteGenerator;
        let mut backend = RecordingBackend::new();

        // The author is slated for deletion in its own set; inserting a
        // post that still points at it must neither delete it nor lose the
        // foreign-key value.
        let author = Author::create("Ada");
        author.borrow_mut().set_primary_value(Value::Int(4));
        author.borrow_mut().tracker_mut().mark_saved();
        author
            .borrow_mut()
            .tracker_mut()
            .set_status(RowStatus::MarkedForDelete);

        let post = Post::create("Hello", &author);
        let mut posts: TableSet<Post> = TableSet::new();
        posts.append(post.clone());

        let mut ctx = SaveContext {
            model: &model,
            generator: &g,
            backend: &mut backend,
        };
        posts.save(&mut ctx).unwrap();

        assert!(backend.matching("DELETE").is_empty());
        assert_eq!(backend.matching("INSERT INTO \"posts\"").len(), 1);
        assert_eq!(post.borrow().author_id, Value::Int(4));
        assert_eq!(
            author.borrow().tracker().status(),
            RowStatus::MarkedForDelete
        );
    }

    #[test]
    fn test_modified_without_changes_is_noop() {
        let model = blog_model();
        let g = SqliteGenerator;
        let mut backend = RecordingBackend::new();

        let author = Author::create("Ada");
        author.borrow_mut().tracker_mut().mark_saved();
        author
            .borrow_mut()
            .tracker_mut()
            .set_status(RowStatus::Modified);

        let mut authors: TableSet<Author> = TableSet::new();
        authors.append(author.clone());

        let mut ctx = SaveContext {
            model: &model,
            generator: &g,
            backend: &mut backend,
        };
        let affected = authors.save(&mut ctx).unwrap();

        assert_eq!(affected, 0);
        assert!(backend.statements.is_empty());
        assert_eq!(author.borrow().tracker().status(), RowStatus::Fetched);
    }

    #[test]
    fn test_update_emits_only_changed_fields() {
        let model = blog_model();
        let g = SqliteGenerator;
        let mut backend = RecordingBackend::new();

        let author = Author::create("Ada");
        author.borrow_mut().set_primary_value(Value::Int(3));
        author.borrow_mut().tracker_mut().mark_saved();
        author
            .borrow_mut()
            .set_field_value("name", Value::from("Grace"));

        let mut authors: TableSet<Author> = TableSet::new();
        authors.append(author.clone());

        let mut ctx = SaveContext {
            model: &model,
            generator: &g,
            backend: &mut backend,
        };
        authors.save(&mut ctx).unwrap();

        assert_eq!(
            backend.statements,
            vec!["UPDATE \"authors\" SET \"name\" = 'Grace' WHERE \"id\" = 3"]
        );
    }

    #[test]
    fn test_delete_detaches_the_row() {
        let model = blog_model();
        let g = SqliteGenerator;
        let mut backend = RecordingBackend::new();

        let author = Author::create("Ada");
        author.borrow_mut().set_primary_value(Value::Int(5));
        author.borrow_mut().tracker_mut().mark_saved();

        let mut authors: TableSet<Author> = TableSet::new();
        authors.append(author.clone());
        authors.remove(&author);

        let mut ctx = SaveContext {
            model: &model,
            generator: &g,
            backend: &mut backend,
        };
        authors.save(&mut ctx).unwrap();

        assert_eq!(
            backend.statements,
            vec!["DELETE FROM \"authors\" WHERE \"id\" = 5"]
        );
        assert_eq!(authors.row_count(), 0);
    }

    #[test]
    fn test_failed_row_is_skipped_and_kept() {
        let model = blog_model();
        let g = SqliteGenerator;
        let mut backend = RecordingBackend::new();
        backend.fail_on("'Bad'");

        let mut authors: TableSet<Author> = TableSet::new();
        authors.append(Author::create("Bad"));
        authors.append(Author::create("Good"));

        let mut ctx = SaveContext {
            model: &model,
            generator: &g,
            backend: &mut backend,
        };
        let affected = authors.save(&mut ctx).unwrap();

        // The failing row stays attached for a later retry; the good row
        // saved and counted.
        assert_eq!(affected, 1);
        assert_eq!(authors.row_count(), 2);
        assert_eq!(backend.matching("Good").len(), 1);
        let pending = authors
            .rows()
            .iter()
            .filter(|r| r.borrow().tracker().status() == RowStatus::MarkedForInsert)
            .count();
        assert_eq!(pending, 1);
    }

    #[test]
    fn test_clear_rows_touches_nothing() {
        let model = blog_model();
        let g = SqliteGenerator;
        let mut backend = RecordingBackend::new();

        let mut authors: TableSet<Author> = TableSet::new();
        authors.append(Author::create("Ada"));
        authors.clear_rows();

        let mut ctx = SaveContext {
            model: &model,
            generator: &g,
            backend: &mut backend,
        };
        let affected = authors.save(&mut ctx).unwrap();

        assert_eq!(affected, 0);
        assert!(backend.statements.is_empty());
    }
}
