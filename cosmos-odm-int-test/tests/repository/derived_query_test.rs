use cosmos_odm::errors::ErrorKind;
use cosmos_odm::operations::CosmosOperations;
use cosmos_odm::params;
use cosmos_odm::query::{CosmosPageRequest, Criteria, DocumentQuery, Sort};
use cosmos_odm::repository::query::{CosmosQuery, ReturnShape};
use cosmos_odm::repository::{CosmosRepository, SimpleCosmosRepository};
use cosmos_odm_int_test::fixtures::{generate_people, Person, PurchaseOrder};
use cosmos_odm_int_test::test_util::{cleanup, create_test_context, run_test, TestContext};
use std::collections::HashSet;

fn seeded(ctx: &TestContext) -> cosmos_odm::errors::CosmosResult<SimpleCosmosRepository<Person>> {
    let repo = ctx.repositories().repository::<Person>()?;
    let mut ann = Person::new("1", "Ann", "Smith", 30);
    ann.hobbies = vec!["golf".into(), "chess".into()];
    let mut bob = Person::new("2", "Bob", "Smith", 45);
    bob.hobbies = vec!["chess".into()];
    repo.save_all(&[ann, bob, Person::new("3", "Cid", "Jones", 30), Person::new("4", "Dee", "Brown", 60)])?;
    Ok(repo)
}

fn ids(people: Vec<Person>) -> Vec<String> {
    people.into_iter().map(|p| p.id).collect()
}

#[test]
fn test_derived_equals_criteria_query() {
    run_test(
        create_test_context,
        |ctx| {
            let repo = ctx.repositories().repository::<Person>()?;
            repo.save_all(&generate_people(25))?;
            let sample = repo.find_all()?.remove(0);

            let derived = repo
                .query("find_by_last_name", ReturnShape::Collection)?
                .execute(&params![sample.last_name.as_str()])?
                .into_entities()?;
            let direct: Vec<Person> = repo.operations().find(
                &DocumentQuery::new(Criteria::field("last_name").is(sample.last_name.as_str())),
                repo.container_name(),
            )?;

            let derived: HashSet<String> = derived.into_iter().map(|p| p.id).collect();
            let direct: HashSet<String> = direct.into_iter().map(|p| p.id).collect();
            assert_eq!(derived, direct);
            assert!(derived.contains(&sample.id));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_connectives_and_ordering() {
    run_test(
        create_test_context,
        |ctx| {
            let repo = seeded(&ctx)?;
            let found = repo
                .query("find_by_last_name_and_age_or_age_greater_than_order_by_age_desc", ReturnShape::Collection)?
                .execute(&params!["Smith", 30, 50])?
                .into_entities()?;
            assert_eq!(ids(found), vec!["4", "1"]);

            let found = repo
                .query("find_by_age_between_order_by_first_name_desc", ReturnShape::Collection)?
                .execute(&params![30, 45])?
                .into_entities()?;
            assert_eq!(ids(found), vec!["3", "2", "1"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_collection_and_string_keywords() {
    run_test(
        create_test_context,
        |ctx| {
            let repo = seeded(&ctx)?;
            let chess = repo
                .query("find_by_hobbies_containing_order_by_id", ReturnShape::Collection)?
                .execute(&params!["chess"])?
                .into_entities()?;
            assert_eq!(ids(chess), vec!["1", "2"]);

            let starting = repo
                .query("find_by_first_name_starting_with", ReturnShape::Collection)?
                .execute(&params!["C"])?
                .into_entities()?;
            assert_eq!(ids(starting), vec!["3"]);

            let in_list = repo
                .query("find_by_last_name_in_order_by_id", ReturnShape::Collection)?
                .execute(&params![vec!["Jones", "Brown"]])?
                .into_entities()?;
            assert_eq!(ids(in_list), vec!["3", "4"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_single_exists_and_delete() {
    run_test(
        create_test_context,
        |ctx| {
            let repo = seeded(&ctx)?;
            let one = repo
                .query("find_by_first_name", ReturnShape::Single)?
                .execute(&params!["Dee"])?
                .into_entity()?;
            assert_eq!(one.map(|p| p.id), Some("4".to_string()));

            let err = repo
                .query("find_by_age", ReturnShape::Single)?
                .execute(&params![30])
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IncorrectResultSize { expected: 1, actual: 2 });

            let first = repo
                .query("find_first_by_age_order_by_id", ReturnShape::Single)?
                .execute(&params![30])?
                .into_entity()?;
            assert_eq!(first.map(|p| p.id), Some("1".to_string()));

            assert!(repo
                .query("exists_by_last_name", ReturnShape::Single)?
                .execute(&params!["Jones"])?
                .into_exists()?);

            let deleted = repo
                .query("delete_by_last_name", ReturnShape::Collection)?
                .execute(&params!["Smith"])?
                .into_entities()?;
            assert_eq!(deleted.len(), 2);
            assert_eq!(repo.count()?, 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_paged_derived_query() {
    run_test(
        create_test_context,
        |ctx| {
            let repo = seeded(&ctx)?;
            let query = repo.query("find_by_age_greater_than", ReturnShape::Page)?;

            let accessor = params![0]
                .with_page_request(CosmosPageRequest::first(3)?)
                .with_sort(Sort::by("id"));
            let page = query.execute(&accessor)?.into_page()?;
            assert_eq!(page.number_of_elements(), 3);
            assert!(page.has_next());

            let accessor = params![0]
                .with_page_request(page.next_pageable().unwrap_or_default())
                .with_sort(Sort::by("id"));
            let last = query.execute(&accessor)?.into_page()?;
            assert_eq!(ids(last.into_content()), vec!["4"]);

            let err = query.execute(&params![0]).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidQuery);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_derived_query_on_numeric_id() {
    run_test(
        create_test_context,
        |ctx| {
            let orders = ctx.repositories().repository::<PurchaseOrder>()?;
            let order = PurchaseOrder {
                order_no: 7,
                customer: "acme".into(),
                total: 250,
                cached_summary: None,
            };
            orders.save(&order)?;

            let found = orders
                .query("find_by_order_no", ReturnShape::Single)?
                .execute(&params![7])?
                .into_entity()?;
            assert_eq!(found, Some(order.clone()));

            assert!(orders
                .query("exists_by_order_no", ReturnShape::Single)?
                .execute(&params![7])?
                .into_exists()?);
            assert_eq!(orders.find_by_id(serde_json::Value::from(7))?, Some(order));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_method_names() {
    run_test(
        create_test_context,
        |ctx| {
            let repo = ctx.repositories().repository::<Person>()?;
            for name in ["count_by_age", "find_by_nickname", "find_by_age_and"] {
                let err = repo.query(name, ReturnShape::Collection).err();
                assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::InvalidQuery), "{}", name);
            }

            let missing_parameter = repo
                .query("find_by_age_between", ReturnShape::Collection)?
                .execute(&params![1])
                .unwrap_err();
            assert_eq!(missing_parameter.kind(), &ErrorKind::InvalidQuery);
            Ok(())
        },
        cleanup,
    )
}
