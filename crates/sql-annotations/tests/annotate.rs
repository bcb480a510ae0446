#![allow(unused_crate_dependencies)]

use indoc::indoc;
use rstest::rstest;
use serde_json::json;
use sql_annotations::{
    AnnotatedSchema, AnnotationConfig, AnnotationError, BatchKeys, ColumnList, Convention, FieldConfig,
    FieldDefinition, FragmentContext, PLANNER_NAMESPACE, Schema, SqlFragment, TypeConfig, TypeDefinition,
    TypeDirectives, validate,
};

const SDL: &str = indoc! {"
    type Comment {
      id: Int!,
      body: String!,
      postId: Int,
      authorId: Int,
      archived: Boolean
    }

    type Post {
      id: Int!,
      body: String!,
      authorId: Int,
      numComments: Int!,
      comments: [Comment]
    }

    type User {
      id: Int!,
      email: String!,
      fullName: String!,
      favNums: [Int],
      posts: [Post]
    }

    type Query {
      user(id: Int!): User
    }
"};

const LEGACY_CONFIG: &str = indoc! {r#"
    [Query.fields.user]
    where = "{{table}}.id = {{args.id}}"

    [User]
    sqlTable = "accounts"
    uniqueKey = "id"

    [User.fields.email]
    sqlColumn = "email_address"

    [User.fields.fullName]
    sqlDeps = ["first_name", "last_name"]

    [User.fields.posts]
    sqlJoin = "{{parent}}.id = {{child}}.author_id"

    [Post]
    sqlTable = "posts"
    uniqueKey = "id"

    [Post.fields.numComments]
    sqlExpr = "(SELECT count(*) FROM comments where {{table}}.id = comments.post_id)"

    [Post.fields.comments.sqlBatch]
    thisKey = "post_id"
    parentKey = "id"

    [Comment]
    sqlTable = "comments"
    uniqueKey = "id"

    [Comment.fields.postId]
    sqlColumn = "post_id"

    [Comment.fields.authorId]
    sqlColumn = "author_id"
"#};

const NAMESPACED_CONFIG: &str = indoc! {r#"
    [Query.fields.user.extensions.Planner]
    where = "{{table}}.id = {{args.id}}"

    [User.extensions.Planner]
    sqlTable = "accounts"
    uniqueKey = "id"

    [User.fields.email.extensions.Planner]
    sqlColumn = "email_address"

    [User.fields.fullName.extensions.Planner]
    sqlDeps = ["first_name", "last_name"]

    [User.fields.posts.extensions.Planner]
    sqlJoin = "{{parent}}.id = {{child}}.author_id"

    [Post]
    sqlTable = "posts"
    uniqueKey = "id"

    [Post.fields.numComments.extensions.Planner]
    sqlExpr = "(SELECT count(*) FROM comments where {{table}}.id = comments.post_id)"

    [Post.fields.comments.extensions.Planner.sqlBatch]
    thisKey = "post_id"
    parentKey = "id"

    [Comment.extensions.Planner]
    sqlTable = "comments"
    uniqueKey = "id"

    [Comment.fields.postId.extensions.Planner]
    sqlColumn = "post_id"

    [Comment.fields.authorId.extensions.Planner]
    sqlColumn = "author_id"
"#};

fn schema() -> AnnotatedSchema {
    Schema::from_sdl(SDL).unwrap().into()
}

fn annotated(config: &str) -> AnnotatedSchema {
    schema().annotate(&AnnotationConfig::from_toml_str(config).unwrap()).unwrap()
}

#[test]
fn attaches_type_and_field_metadata() {
    let annotated = annotated(LEGACY_CONFIG);

    let user = annotated.ty("User").unwrap();
    assert_eq!(user.sql_table(), Some("accounts"));
    assert_eq!(user.unique_key(), Some(&ColumnList::from("id")));
    assert_eq!(user.convention(), Some(Convention::Legacy));

    let email = annotated.field("User", "email").unwrap();
    assert_eq!(email.sql_column(), Some("email_address"));
    assert_eq!(email.ty(), "String!");

    let comments = annotated.field("Post", "comments").unwrap();
    assert_eq!(comments.sql_batch(), Some(&BatchKeys::new("post_id", "id")));

    // Fields without configuration carry no metadata.
    let fav_nums = annotated.field("User", "favNums").unwrap();
    assert!(fav_nums.annotation().is_none());
    assert!(fav_nums.effective_directives().is_empty());

    insta::assert_debug_snapshot!(user.effective_directives(), @r#"
    TypeDirectives {
        sql_table: Some(
            "accounts",
        ),
        unique_key: Some(
            One(
                "id",
            ),
        ),
        always_fetch: None,
        type_hint: None,
        resolve_type: None,
    }
    "#);
}

#[test]
fn fragments_render_with_planner_aliases() {
    let annotated = annotated(LEGACY_CONFIG);
    let args = json!({ "id": 1 });

    let filter = annotated.field("Query", "user").unwrap().filter().unwrap();
    insta::assert_snapshot!(
        filter.render(&FragmentContext::table("user_1").with_args(args.as_object().unwrap())),
        @"user_1.id = 1"
    );

    let join = annotated.field("User", "posts").unwrap().sql_join().unwrap();
    insta::assert_snapshot!(join.render(&FragmentContext::join("user_1", "post_2")), @"user_1.id = post_2.author_id");

    let expr = annotated.field("Post", "numComments").unwrap().sql_expr().unwrap();
    insta::assert_snapshot!(
        expr.render(&FragmentContext::table("post_2")),
        @"(SELECT count(*) FROM comments where post_2.id = comments.post_id)"
    );
}

#[test]
fn legacy_and_namespaced_configs_are_equivalent() {
    let legacy = annotated(LEGACY_CONFIG);
    let namespaced = annotated(NAMESPACED_CONFIG);

    for ty in legacy.types() {
        let other = namespaced.ty(ty.name()).unwrap();
        assert_eq!(ty.effective_directives(), other.effective_directives(), "{}", ty.name());

        for field in ty.fields() {
            let other = other.field(field.name()).unwrap();
            assert_eq!(
                field.effective_directives(),
                other.effective_directives(),
                "{}.{}",
                ty.name(),
                field.name()
            );
        }
    }

    assert_eq!(namespaced.ty("User").unwrap().convention(), Some(Convention::Namespaced));
    assert_eq!(namespaced.ty("Post").unwrap().convention(), Some(Convention::Mixed));
}

#[test]
fn configured_field_keys_win_and_others_survive() {
    let first = annotated(LEGACY_CONFIG);

    let config = AnnotationConfig::new().with_type(
        "User",
        TypeConfig::new().field(
            "fullName",
            FieldConfig::new()
                .sql_column("full_name")
                .sql_deps(ColumnList::Many(vec!["given_name".into(), "family_name".into()])),
        ),
    );
    let second = first.annotate(&config).unwrap();

    let full_name = second.field("User", "fullName").unwrap();
    assert_eq!(full_name.sql_column(), Some("full_name"));
    assert_eq!(
        full_name.sql_deps().map(|columns| columns.iter().collect::<Vec<_>>()),
        Some(vec!["given_name", "family_name"])
    );

    // Untouched entries and the previous snapshot are unchanged.
    assert_eq!(second.field("User", "email").unwrap().sql_column(), Some("email_address"));
    assert_eq!(second.ty("User").unwrap().sql_table(), Some("accounts"));
    assert_eq!(first.field("User", "fullName").unwrap().sql_column(), None);
}

#[test]
fn extension_namespaces_are_merged() {
    let schema: AnnotatedSchema = Schema::builder()
        .with_type(
            TypeDefinition::object("Comment")
                .with_extension("Cache", json!({ "maxAge": 60 }))
                .with_extension("Audit", json!({ "owner": "content" })),
        )
        .build()
        .unwrap()
        .into();

    let config = AnnotationConfig::from_toml_str(indoc! {r#"
        [Comment.extensions.Planner]
        sqlTable = "comments"

        [Comment.extensions.Cache]
        scope = "public"
    "#})
    .unwrap();
    let annotated = schema.annotate(&config).unwrap();

    let config = AnnotationConfig::new().with_type(
        "Comment",
        TypeConfig::new().planner(TypeDirectives {
            unique_key: Some("id".into()),
            ..Default::default()
        }),
    );
    let annotated = annotated.annotate(&config).unwrap();

    let comment = annotated.ty("Comment").unwrap();
    assert_eq!(comment.sql_table(), Some("comments"));
    assert_eq!(comment.unique_key(), Some(&ColumnList::from("id")));
    assert_eq!(comment.extension("Cache"), Some(&json!({ "maxAge": 60, "scope": "public" })));
    assert_eq!(comment.extension("Audit"), Some(&json!({ "owner": "content" })));
}

#[test]
fn builder_data_under_the_planner_key_is_kept_apart() {
    let schema: AnnotatedSchema = Schema::builder()
        .with_type(
            TypeDefinition::object("Comment")
                .with_extension(PLANNER_NAMESPACE, json!({ "owner": "content" }))
                .with_field(FieldDefinition::new("id", "Int!"))
                .with_field(
                    FieldDefinition::new("postId", "Int")
                        .with_extension(PLANNER_NAMESPACE, json!({ "deprecated": true }))
                        .with_extension("Cache", json!({ "scope": "public" })),
                ),
        )
        .build()
        .unwrap()
        .into();

    let config = AnnotationConfig::from_toml_str(indoc! {r#"
        [Comment.extensions.Planner]
        sqlTable = "comments"

        [Comment.fields.postId.extensions.Planner]
        sqlColumn = "post_id"

        [Comment.fields.postId.extensions.Cache]
        maxAge = 5
    "#})
    .unwrap();
    let annotated = schema.annotate(&config).unwrap();

    let comment = annotated.ty("Comment").unwrap();
    assert_eq!(comment.extension(PLANNER_NAMESPACE), Some(&json!({ "owner": "content" })));
    assert_eq!(comment.sql_table(), Some("comments"));
    assert_eq!(
        comment.planner().and_then(|planner| planner.sql_table.as_deref()),
        Some("comments")
    );

    let post_id = annotated.field("Comment", "postId").unwrap();
    assert_eq!(post_id.extension(PLANNER_NAMESPACE), Some(&json!({ "deprecated": true })));
    assert_eq!(post_id.sql_column(), Some("post_id"));
    assert_eq!(
        post_id.planner().and_then(|planner| planner.sql_column.as_deref()),
        Some("post_id")
    );
    assert_eq!(post_id.extension("Cache"), Some(&json!({ "scope": "public", "maxAge": 5 })));
}

#[rstest]
#[case::unknown_type(
    AnnotationConfig::new()
        .with_type("Post", TypeConfig::new().sql_table("articles"))
        .with_type("Ghost", TypeConfig::new().sql_table("ghosts")),
    AnnotationError::TypeNotFound { type_name: "Ghost".into() },
)]
#[case::unknown_field(
    AnnotationConfig::new().with_type(
        "Post",
        TypeConfig::new()
            .sql_table("articles")
            .field("body", FieldConfig::new().sql_column("content"))
            .field("nonexistent", FieldConfig::new().sql_column("x")),
    ),
    AnnotationError::FieldNotFound { type_name: "Post".into(), field_name: "nonexistent".into() },
)]
fn dangling_references_fail_without_side_effects(#[case] config: AnnotationConfig, #[case] expected: AnnotationError) {
    let before = annotated(LEGACY_CONFIG);

    let err = before.annotate(&config).unwrap_err();
    assert_eq!(err, expected);

    // Entries applied before the failure are not visible in the input snapshot.
    assert_eq!(before.ty("Post").unwrap().sql_table(), Some("posts"));
    assert!(before.field("Post", "body").unwrap().annotation().is_none());
}

#[test]
fn error_messages_name_the_culprit() {
    let err = schema()
        .annotate(&AnnotationConfig::new().with_type("Ghost", TypeConfig::new()))
        .unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"Type with name Ghost not found in schema.");

    let err = schema()
        .annotate(
            &AnnotationConfig::new().with_type("Post", TypeConfig::new().field("nonexistent", FieldConfig::new())),
        )
        .unwrap_err();
    insta::assert_snapshot!(err.to_string(), @r#"Field "nonexistent" not found in type "Post"."#);
}

#[test]
fn validate_collects_every_error() {
    let config = AnnotationConfig::from_json_str(
        r#"{
            "Ghost": { "sqlTable": "ghosts" },
            "User": { "fields": { "nickname": { "sqlColumn": "nick" }, "email": { "sqlColumn": "email_address" } } },
            "Post": { "fields": { "title": { "sqlColumn": "title" } } }
        }"#,
    )
    .unwrap();

    let schema = schema();
    assert_eq!(
        validate(schema.schema(), &config),
        [
            AnnotationError::TypeNotFound {
                type_name: "Ghost".into()
            },
            AnnotationError::FieldNotFound {
                type_name: "User".into(),
                field_name: "nickname".into()
            },
            AnnotationError::FieldNotFound {
                type_name: "Post".into(),
                field_name: "title".into()
            },
        ]
    );
    assert!(validate(schema.schema(), &AnnotationConfig::from_toml_str(LEGACY_CONFIG).unwrap()).is_empty());
}

#[test]
fn callbacks_can_be_configured_in_code() {
    let config = AnnotationConfig::new().with_type(
        "Query",
        TypeConfig::new().field(
            "user",
            FieldConfig::new().filter(SqlFragment::callback(|ctx| {
                let id = ctx.args.and_then(|args| args.get("id")).cloned().unwrap_or_default();
                format!("{}.id = {id}", ctx.table.unwrap_or_default())
            })),
        ),
    );

    let annotated = schema().annotate(&config).unwrap();
    let args = json!({ "id": 7 });

    let filter = annotated.field("Query", "user").unwrap().filter().unwrap();
    assert!(filter.as_template().is_none());
    insta::assert_snapshot!(
        filter.render(&FragmentContext::table("user_0").with_args(args.as_object().unwrap())),
        @"user_0.id = 7"
    );
}

#[test]
fn snapshots_are_shareable_across_threads() {
    let annotated = annotated(LEGACY_CONFIG);

    std::thread::scope(|scope| {
        let handle = scope.spawn(|| annotated.ty("Comment").and_then(|ty| ty.sql_table()).map(str::to_owned));
        assert_eq!(handle.join().unwrap().as_deref(), Some("comments"));
    });
}
