//! Composition through the public API only.

use pgcompose::{
    Condition, ConditionOperator, Executable, Filter, OptionalCondition, QueryBuilder,
    count_markers, params,
};

fn args(params: &pgcompose::ParamList) -> Vec<String> {
    params.iter().map(|p| format!("{p:?}")).collect()
}

#[test]
fn rights_report_with_cte_and_join() {
    let mut rights = QueryBuilder::new();
    rights
        .from("mv_right")
        .columns(["id", "contract_id", "object_id"])
        .set_pagination(10, 0);
    rights
        .where_clause()
        .add_expression("object_id = ANY(?)", params![vec![1_i64, 2, 3]])
        .add_field_filter("right_type", "=", "license");

    let mut qb = QueryBuilder::new();
    qb.with("mv_right_items", rights)
        .from("mv_object mo")
        .columns(["mo.id", "mo.title", "mr.contract_id"])
        .relate("JOIN mv_right_items AS mr ON mr.object_id = mo.id");
    qb.where_clause()
        .add_expression("mr.object_id IS NOT NULL", params![])
        .add_field_filter("mo.published", "=", true);

    assert_eq!(
        qb.to_sql(),
        "WITH mv_right_items AS (SELECT id, contract_id, object_id FROM mv_right \
         WHERE object_id = ANY(?) AND right_type = ? LIMIT 10 OFFSET 0) \
         SELECT mo.id, mo.title, mr.contract_id FROM mv_object mo \
         JOIN mv_right_items AS mr ON mr.object_id = mo.id \
         WHERE mr.object_id IS NOT NULL AND mo.published = ?"
    );
    assert_eq!(args(&qb.arguments()), ["[1, 2, 3]", "\"license\"", "true"]);

    let (sql, params) = qb.prepare().unwrap();
    assert!(sql.contains("object_id = ANY($1) AND right_type = $2"));
    assert!(sql.ends_with("mo.published = $3"));
    assert_eq!(params.len(), 3);
}

#[test]
fn or_groups_inside_and_condition() {
    let mut admins = Condition::and();
    admins
        .add_field_filter("role", "=", "admin")
        .add_field_filter("active", "=", true);
    let mut owners = Condition::and();
    owners.add_in_filter("team_id", vec![4_i64, 5]);

    let mut qb = QueryBuilder::new();
    qb.from("users").columns(["id"]);
    qb.where_clause()
        .add_field_filter("tenant_id", "=", 9_i64)
        .merge(ConditionOperator::Or, &[admins, owners]);

    assert_eq!(
        qb.to_sql(),
        "SELECT id FROM users WHERE tenant_id = ? \
         AND ((role = ? AND active = ?) OR (team_id IN (?,?)))"
    );
    assert_eq!(
        args(&qb.arguments()),
        ["9", "\"admin\"", "true", "4", "5"]
    );
}

#[test]
fn filter_applied_to_builder_and_standalone() {
    let mut filter = Filter::new();
    filter
        .add_field_filter("type", "=", "color")
        .add_order("type", "ASC")
        .set_pagination(10, 0);

    assert_eq!(
        format!("SELECT * FROM public.dictionary {}", filter.with_where()),
        "SELECT * FROM public.dictionary WHERE type = ? ORDER BY type ASC LIMIT 10 OFFSET 0"
    );

    let mut qb = QueryBuilder::new();
    qb.from("public.dictionary").apply_filter(&filter);
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM public.dictionary WHERE (type = ?) ORDER BY type ASC LIMIT 10 OFFSET 0"
    );
    assert_eq!(args(&qb.arguments()), args(&filter.arguments()));
}

#[test]
fn missing_condition_counts_as_empty() {
    let absent: Option<&Condition> = None;
    assert!(absent.is_empty());
    assert!(Some(&Condition::or()).is_empty());

    let qb = QueryBuilder::new();
    assert!(qb.condition().is_empty());
}

#[test]
fn every_builder_shape_keeps_markers_and_arguments_aligned() {
    let mut shapes = Vec::new();

    let mut plain = QueryBuilder::new();
    plain.from("a");
    plain.where_clause().add_field_filter("x", "=", 1_i32);
    shapes.push(plain.clone());

    let mut with_cte = QueryBuilder::new();
    with_cte.with("p", plain.clone()).from("p");
    with_cte.where_clause().add_in_filter("y", vec![2_i32, 3]);
    shapes.push(with_cte.clone());

    let mut with_ops = with_cte.clone();
    with_ops.union_all(plain.clone()).intersect(with_cte.clone());
    // Only the outermost WITH renders; the INTERSECT operand is its bare body.
    assert_eq!(
        with_ops.to_sql(),
        "WITH p AS (SELECT * FROM a WHERE x = ?) SELECT * FROM p WHERE y IN (?,?) \
         UNION ALL (SELECT * FROM a WHERE x = ?) \
         INTERSECT (SELECT * FROM p WHERE y IN (?,?))"
    );
    assert_eq!(
        args(&with_ops.arguments()),
        ["1", "2", "3", "1", "2", "3"]
    );
    shapes.push(with_ops.clone());

    let mut wrapped = with_ops.clone();
    wrapped.sub_query(true);
    let mut outer = QueryBuilder::new();
    outer.from("b");
    outer
        .where_clause()
        .push(wrapped.to_expression().with_prefix("EXISTS"))
        .add_not_in_filter("z", vec!["q"]);
    shapes.push(outer);

    for qb in &shapes {
        let (sql, params) = qb.build();
        assert_eq!(count_markers(&sql), params.len(), "{sql}");
        assert!(qb.validate().is_ok());
    }
}
